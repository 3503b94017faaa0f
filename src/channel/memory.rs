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

//! In-memory channel and pool implementations for testing.
//!
//! [`MemoryChannel`] delivers outbound envelopes to an in-process receiver
//! instead of a socket, and [`MemoryChannelPool`] hands them out by address.
//! Tests script failures by toggling writability or leaving an address
//! uninstalled, and observe engine behavior through the outbound receiver
//! and the pool's operation counters.

use crate::channel::{ChannelHandle, ChannelPool};
use crate::error::RemotingError;
use crate::protocol::Envelope;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Global counter for generating unique memory channel ids.
static NEXT_MEMORY_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// An in-memory channel that forwards envelopes to a Tokio receiver.
///
/// # Examples
///
/// ```rust
/// use txrpc::channel::{ChannelHandle, MemoryChannel};
/// use txrpc::protocol::{Envelope, MessageId};
///
/// # async fn example() {
/// let (channel, mut outbound) = MemoryChannel::new("server:8091");
///
/// channel
///     .send(Envelope::oneway_request(MessageId::from(1), b"hi".to_vec()))
///     .await
///     .unwrap();
///
/// let envelope = outbound.recv().await.unwrap();
/// assert_eq!(envelope.id(), MessageId::from(1));
/// # }
/// ```
pub struct MemoryChannel {
    id: u64,
    address: String,
    outbound: mpsc::UnboundedSender<Envelope>,
    writable: AtomicBool,
}

impl MemoryChannel {
    /// Creates a channel bound to `address` plus the receiver observing its
    /// outbound envelopes.
    #[must_use]
    pub fn new(address: impl Into<String>) -> (Arc<Self>, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Arc::new(Self {
            id: NEXT_MEMORY_CHANNEL_ID.fetch_add(1, Ordering::Relaxed),
            address: address.into(),
            outbound: tx,
            writable: AtomicBool::new(true),
        });
        (channel, rx)
    }

    /// Scripts the channel's writability; an unwritable channel rejects
    /// every send with an unreachable error.
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChannelHandle for MemoryChannel {
    fn id(&self) -> u64 {
        self.id
    }

    fn remote_address(&self) -> String {
        self.address.clone()
    }

    fn is_writable(&self) -> bool {
        self.writable.load(Ordering::SeqCst)
    }

    async fn send(&self, envelope: Envelope) -> Result<(), RemotingError> {
        if !self.is_writable() {
            return Err(RemotingError::Unreachable {
                address: self.address.clone(),
            });
        }
        self.outbound
            .send(envelope)
            .map_err(|_| RemotingError::ChannelClosed)
    }
}

#[derive(Default)]
struct PoolInner {
    channels: HashMap<String, Arc<MemoryChannel>>,
    acquires: HashMap<String, usize>,
    releases: HashMap<String, usize>,
    invalidates: HashMap<String, usize>,
    destroys: HashMap<String, usize>,
}

/// An in-memory channel pool keyed by address.
///
/// Only installed addresses are connectable; acquiring anything else fails
/// with a connect error. Every pool operation is counted so tests can assert
/// on reconnect attempts, invalidations, and destroys.
#[derive(Default)]
pub struct MemoryChannelPool {
    inner: Mutex<PoolInner>,
}

impl MemoryChannelPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a connectable channel for `address`, returning the channel
    /// and the receiver observing its outbound envelopes.
    pub fn install(
        &self,
        address: impl Into<String>,
    ) -> (Arc<MemoryChannel>, mpsc::UnboundedReceiver<Envelope>) {
        let address = address.into();
        let (channel, rx) = MemoryChannel::new(address.clone());
        self.inner.lock().channels.insert(address, channel.clone());
        (channel, rx)
    }

    /// Removes the channel for `address`, making it unconnectable again.
    pub fn uninstall(&self, address: &str) {
        self.inner.lock().channels.remove(address);
    }

    /// Number of `acquire` calls observed for `address`.
    #[must_use]
    pub fn acquire_count(&self, address: &str) -> usize {
        self.inner.lock().acquires.get(address).copied().unwrap_or(0)
    }

    /// Number of `release` calls observed for `address`.
    #[must_use]
    pub fn release_count(&self, address: &str) -> usize {
        self.inner.lock().releases.get(address).copied().unwrap_or(0)
    }

    /// Number of `invalidate` calls observed for `address`.
    #[must_use]
    pub fn invalidate_count(&self, address: &str) -> usize {
        self.inner
            .lock()
            .invalidates
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Number of `destroy` calls observed for `address`.
    #[must_use]
    pub fn destroy_count(&self, address: &str) -> usize {
        self.inner.lock().destroys.get(address).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ChannelPool for MemoryChannelPool {
    async fn acquire(&self, address: &str) -> Result<Arc<dyn ChannelHandle>, RemotingError> {
        let mut inner = self.inner.lock();
        *inner.acquires.entry(address.to_string()).or_insert(0) += 1;
        match inner.channels.get(address) {
            Some(channel) => Ok(channel.clone()),
            None => Err(RemotingError::ConnectFailed {
                address: address.to_string(),
                reason: "no route".to_string(),
            }),
        }
    }

    async fn release(&self, address: &str, _channel: Arc<dyn ChannelHandle>) {
        let mut inner = self.inner.lock();
        *inner.releases.entry(address.to_string()).or_insert(0) += 1;
    }

    async fn invalidate(&self, address: &str, channel: Arc<dyn ChannelHandle>) {
        let mut inner = self.inner.lock();
        *inner.invalidates.entry(address.to_string()).or_insert(0) += 1;
        if let Some(known) = inner.channels.get(address) {
            if known.id() == channel.id() {
                inner.channels.remove(address);
            }
        }
    }

    async fn destroy(&self, address: &str, channel: Arc<dyn ChannelHandle>) {
        let mut inner = self.inner.lock();
        *inner.destroys.entry(address.to_string()).or_insert(0) += 1;
        if let Some(known) = inner.channels.get(address) {
            if known.id() == channel.id() {
                inner.channels.remove(address);
            }
        }
    }
}
