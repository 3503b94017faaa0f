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

//! Channel lifecycle: boundary traits, events, and idle tracking.
//!
//! Connections move through *connecting → active → (idle-reader |
//! idle-writer) → active | closing → closed*. This module provides:
//!
//! - [`ChannelHandle`] / [`ChannelPool`]: the narrow interfaces the engine
//!   consumes connections through (pooling policy itself is external)
//! - [`ChannelEventListener`] / [`ListenerRegistry`]: CONNECTED,
//!   DISCONNECTED, EXCEPTION, and IDLE event dispatch
//! - [`ActivityTracker`]: last-read / last-write instants feeding idle
//!   detection (writer-idle sends a heartbeat, reader-idle invalidates the
//!   channel)
//! - [`MemoryChannel`] / [`MemoryChannelPool`]: in-memory implementations
//!   for tests

mod event;
mod idle;
mod memory;
mod traits;

pub use event::{ChannelEventKind, ChannelEventListener, ListenerRegistry};
pub use idle::{ActivityTracker, IdleKind};
pub use memory::{MemoryChannel, MemoryChannelPool};
pub use traits::{ChannelHandle, ChannelPool};
