//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Request correlation, merge-send batching and the client engine.
//!
//! The pieces compose bottom-up:
//!
//! - [`FutureTable`] correlates outbound message ids with pending callers.
//! - [`Basket`] / [`BasketMap`] buffer requests per destination.
//! - [`BatchRegistry`] tracks which children travelled in which merged
//!   envelope, scoped by destination for loss cleanup.
//! - The merge-send scheduler drains baskets into merged envelopes.
//! - [`ResponseRouter`] resolves inbound envelopes against the tables and
//!   forwards unsolicited payloads to an [`UnsolicitedHandler`].
//! - [`RemotingClient`] owns all of the above as one instance.

mod basket;
mod batch;
mod client;
mod future;
mod merge;
mod router;

pub use self::basket::{Basket, BasketMap};
pub use self::batch::BatchRegistry;
pub use self::client::RemotingClient;
pub use self::future::{FutureTable, RpcResult};
pub use self::router::{DiscardHandler, ResponseRouter, UnsolicitedHandler};
