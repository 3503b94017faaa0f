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

//! Wire-level protocol types.
//!
//! This module defines the message shapes the remoting engine routes:
//!
//! - [`Envelope`]: one wire frame (id + type tag + opaque body)
//! - [`Payload`]: the tagged body variant (single / batch / heartbeat)
//! - [`MessageId`] and [`MessageIdGenerator`]: correlation id space
//!
//! Serialization of these types to and from bytes lives behind the external
//! codec boundary; the engine itself only needs the id and kind to route.

mod envelope;
mod id;

pub use envelope::{BatchEntry, Envelope, Heartbeat, MessageKind, Payload};
pub use id::{MessageId, MessageIdGenerator};
