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

//! Destination address selection.
//!
//! Service discovery and load balancing are external collaborators; the
//! engine only needs "give me an address for the next request" and "give me
//! every address worth keeping a connection to". [`AddressSelector`] is that
//! boundary, and [`StaticAddressSelector`] is the built-in round-robin
//! implementation over a fixed list.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Resolves destination addresses for outbound requests.
///
/// Implementations may wrap a registry lookup, a load balancer, or a static
/// list. Returning `None` from [`select`](AddressSelector::select) makes the
/// caller fail immediately with
/// [`RemotingError::NoAvailableService`](crate::error::RemotingError::NoAvailableService);
/// no future is created.
pub trait AddressSelector: Send + Sync {
    /// Picks the destination for the next request, or `None` when no service
    /// instance is available.
    fn select(&self) -> Option<String>;

    /// Returns every known address, used by the periodic reconnect sweep.
    fn all(&self) -> Vec<String>;
}

/// Round-robin selection over a fixed address list.
///
/// # Example
///
/// ```rust
/// use txrpc::selector::{AddressSelector, StaticAddressSelector};
///
/// let selector = StaticAddressSelector::new(vec![
///     "10.0.0.1:8091".to_string(),
///     "10.0.0.2:8091".to_string(),
/// ]);
/// assert_eq!(selector.select().as_deref(), Some("10.0.0.1:8091"));
/// assert_eq!(selector.select().as_deref(), Some("10.0.0.2:8091"));
/// assert_eq!(selector.select().as_deref(), Some("10.0.0.1:8091"));
/// ```
#[derive(Debug)]
pub struct StaticAddressSelector {
    addresses: Vec<String>,
    next: AtomicUsize,
}

impl StaticAddressSelector {
    /// Creates a selector over the given addresses.
    #[must_use]
    pub fn new(addresses: Vec<String>) -> Self {
        Self {
            addresses,
            next: AtomicUsize::new(0),
        }
    }

    /// Creates a selector for a single address.
    #[must_use]
    pub fn single(address: impl Into<String>) -> Self {
        Self::new(vec![address.into()])
    }
}

impl AddressSelector for StaticAddressSelector {
    fn select(&self) -> Option<String> {
        if self.addresses.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.addresses.len();
        Some(self.addresses[index].clone())
    }

    fn all(&self) -> Vec<String> {
        self.addresses.clone()
    }
}
