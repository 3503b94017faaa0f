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

//! # txrpc - Transaction Coordination Remoting Client
//!
//! `txrpc` is the client-side remoting engine for a distributed transaction
//! coordination protocol. It provides request/response correlation over
//! bidirectional channels, opportunistic merge-send batching, and channel
//! lifecycle supervision (heartbeats, idle recycling, reconnection), all
//! scoped to an explicit engine instance.
//!
//! ## Architecture
//!
//! - [`protocol`] - message ids, envelopes and the merged-batch payload
//!   format.
//! - [`remoting`] - the [`RemotingClient`](remoting::RemotingClient) engine:
//!   pending-future correlation, per-destination baskets, the merge-send
//!   scheduler and inbound routing.
//! - [`channel`] - channel and pool abstractions, lifecycle events, idle
//!   tracking and an in-memory transport for tests.
//! - [`selector`] - destination selection over a service address list.
//! - [`config`] - engine tuning knobs with production defaults.
//! - [`error`] - the remoting error taxonomy.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use txrpc::channel::MemoryChannelPool;
//! use txrpc::config::RemotingConfig;
//! use txrpc::remoting::{DiscardHandler, RemotingClient};
//! use txrpc::selector::StaticAddressSelector;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pool = Arc::new(MemoryChannelPool::new());
//! let (_channel, _outbound) = pool.install("10.0.0.1:8091");
//! let client = RemotingClient::new(
//!     RemotingConfig::default(),
//!     pool,
//!     Arc::new(StaticAddressSelector::single("10.0.0.1:8091")),
//!     Arc::new(DiscardHandler),
//! );
//! client.start();
//! // ... send_sync / process_received ...
//! client.shutdown().await;
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod error;
pub mod protocol;
pub mod remoting;
pub mod selector;

pub use self::config::RemotingConfig;
pub use self::error::RemotingError;
pub use self::remoting::RemotingClient;
