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

//! Per-destination baskets: bounded queues awaiting the next merge cycle.
//!
//! Producers enqueue from arbitrary tasks; the merge-send scheduler is the
//! sole drainer. A drain atomically takes the whole current contents in FIFO
//! order, so an enqueue racing a drain simply lands in the next cycle.

use crate::protocol::Envelope;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// A bounded FIFO queue of envelopes for one destination address.
pub struct Basket {
    queue: Mutex<VecDeque<Envelope>>,
    capacity: usize,
}

impl Basket {
    /// Creates a basket holding at most `capacity` envelopes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Enqueues an envelope for the next merge cycle.
    ///
    /// Returns `false` when the basket is at capacity; the caller must
    /// surface that as an immediate saturation failure, never a timeout.
    pub fn push(&self, envelope: Envelope) -> bool {
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            return false;
        }
        queue.push_back(envelope);
        true
    }

    /// Atomically takes the entire current contents, preserving FIFO order.
    #[must_use]
    pub fn drain(&self) -> Vec<Envelope> {
        self.queue.lock().drain(..).collect()
    }

    /// Returns the number of queued envelopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns true when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

/// All baskets, keyed by destination address.
///
/// A basket is created on first use for an address and persists for the
/// engine's lifetime.
pub struct BasketMap {
    baskets: Mutex<HashMap<String, Arc<Basket>>>,
    capacity: usize,
}

impl BasketMap {
    /// Creates an empty map whose baskets hold `capacity` envelopes each.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            baskets: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Returns the basket for `address`, creating it on first use.
    #[must_use]
    pub fn get_or_create(&self, address: &str) -> Arc<Basket> {
        let mut baskets = self.baskets.lock();
        baskets
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(Basket::new(self.capacity)))
            .clone()
    }

    /// Snapshots every destination with a non-empty basket.
    #[must_use]
    pub fn non_empty(&self) -> Vec<(String, Arc<Basket>)> {
        self.baskets
            .lock()
            .iter()
            .filter(|(_, basket)| !basket.is_empty())
            .map(|(address, basket)| (address.clone(), basket.clone()))
            .collect()
    }
}
