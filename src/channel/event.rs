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

//! Channel lifecycle events and listener registration.
//!
//! The engine fires CONNECTED / DISCONNECTED / EXCEPTION / IDLE events to
//! registered listeners as connections come and go. Listener registration is
//! add-if-absent and removal is by identity; a listener that panics is caught
//! and logged, never propagated into the engine.

use crate::channel::ChannelHandle;
use crate::error::RemotingError;
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

/// The kind of lifecycle event observed on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEventKind {
    /// The channel became active.
    Connected,
    /// The channel became inactive.
    Disconnected,
    /// An exception occurred on the channel.
    Exception,
    /// The channel was idle beyond a configured threshold.
    Idle,
}

/// Observer of channel lifecycle events.
///
/// All methods have empty default implementations so a listener only
/// implements the events it cares about.
pub trait ChannelEventListener: Send + Sync {
    /// Called when a channel becomes active.
    fn on_connected(&self, channel: &Arc<dyn ChannelHandle>) {
        let _ = channel;
    }

    /// Called when a channel becomes inactive.
    fn on_disconnected(&self, channel: &Arc<dyn ChannelHandle>) {
        let _ = channel;
    }

    /// Called when an exception occurs on a channel.
    fn on_exception(&self, channel: &Arc<dyn ChannelHandle>, cause: &RemotingError) {
        let _ = (channel, cause);
    }

    /// Called when a channel idles past a configured threshold.
    fn on_idle(&self, channel: &Arc<dyn ChannelHandle>) {
        let _ = channel;
    }
}

/// Registry of channel event listeners.
///
/// Registration is add-if-absent and removal is by identity, both keyed on
/// the listener's `Arc` pointer.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn ChannelEventListener>>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener unless the same instance is already present.
    pub fn register(&self, listener: Arc<dyn ChannelEventListener>) {
        let mut listeners = self.listeners.write();
        if listeners.iter().any(|known| same_listener(known, &listener)) {
            return;
        }
        info!("register channel event listener");
        listeners.push(listener);
    }

    /// Removes a previously registered listener by identity.
    pub fn unregister(&self, listener: &Arc<dyn ChannelEventListener>) {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|known| !same_listener(known, listener));
        if listeners.len() < before {
            info!("unregister channel event listener");
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns true when no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Fires an event to every registered listener.
    ///
    /// A panicking listener is caught and logged; the remaining listeners
    /// still receive the event.
    pub fn fire(
        &self,
        channel: &Arc<dyn ChannelHandle>,
        kind: ChannelEventKind,
        cause: Option<&RemotingError>,
    ) {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            let outcome = catch_unwind(AssertUnwindSafe(|| match kind {
                ChannelEventKind::Connected => listener.on_connected(channel),
                ChannelEventKind::Disconnected => listener.on_disconnected(channel),
                ChannelEventKind::Exception => {
                    let cause = cause.unwrap_or(&RemotingError::ChannelClosed);
                    listener.on_exception(channel, cause);
                }
                ChannelEventKind::Idle => listener.on_idle(channel),
            }));
            if outcome.is_err() {
                warn!(event = ?kind, "channel event listener panicked");
            }
        }
    }
}

/// Identity comparison on the data pointer only.
///
/// `Arc::ptr_eq` on trait objects also compares vtable pointers, which is
/// unreliable across codegen units.
fn same_listener(a: &Arc<dyn ChannelEventListener>, b: &Arc<dyn ChannelEventListener>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
