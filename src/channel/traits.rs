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

//! Boundary traits for channels and the channel pool.
//!
//! The remoting engine does not own connection establishment, pooling, or
//! eviction policy. It consumes connections through two narrow interfaces:
//!
//! - [`ChannelHandle`]: one logical connection that can carry envelopes
//! - [`ChannelPool`]: acquire / release / invalidate / destroy channels by
//!   destination address
//!
//! Concrete implementations wrap a real transport plus the external codec;
//! [`MemoryChannel`](crate::channel::MemoryChannel) backs the tests.

use crate::error::RemotingError;
use crate::protocol::Envelope;
use async_trait::async_trait;
use std::sync::Arc;

/// One logical connection to a destination address.
///
/// Implementations encode the envelope with the external codec and write the
/// bytes to the underlying transport. The engine only calls
/// [`send`](ChannelHandle::send) and the metadata accessors.
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// A process-unique identifier for this connection.
    fn id(&self) -> u64;

    /// The remote address this channel is bound to.
    fn remote_address(&self) -> String;

    /// Whether the channel currently accepts writes.
    fn is_writable(&self) -> bool;

    /// Encodes and writes one envelope.
    ///
    /// # Errors
    ///
    /// Returns [`RemotingError::ChannelClosed`] when the connection is gone,
    /// or [`RemotingError::Unreachable`] when the write is rejected.
    async fn send(&self, envelope: Envelope) -> Result<(), RemotingError>;
}

/// Pool of channels keyed by destination address.
///
/// Acquire/evict policy is the pool's concern; the engine only signals what
/// it observed: `release` returns a channel after use or on disconnect,
/// `invalidate` marks one unusable (e.g. reader-idle), `destroy` tears one
/// down after a failed write.
#[async_trait]
pub trait ChannelPool: Send + Sync {
    /// Acquires a live channel for `address`, connecting if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`RemotingError::ConnectFailed`] or
    /// [`RemotingError::Unreachable`] when no channel can be provided.
    async fn acquire(&self, address: &str) -> Result<Arc<dyn ChannelHandle>, RemotingError>;

    /// Returns a channel to the pool.
    async fn release(&self, address: &str, channel: Arc<dyn ChannelHandle>);

    /// Marks a channel as unusable so the pool will not hand it out again.
    async fn invalidate(&self, address: &str, channel: Arc<dyn ChannelHandle>);

    /// Tears a channel down immediately.
    async fn destroy(&self, address: &str, channel: Arc<dyn ChannelHandle>);
}
