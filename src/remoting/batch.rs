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

//! Bookkeeping for outstanding merged envelopes.
//!
//! For every merged envelope in flight, the registry records which child ids
//! it contains, the destination it was sent to, and the reverse child→parent
//! mapping. That is what lets a batched reply (or a dead connection) be
//! resolved back to individual pending futures.
//!
//! Both directions of the mapping live under a single lock: a parent entry
//! and its children's reverse entries are always added and removed together,
//! and a second cleanup attempt on the same ids finds nothing to do.

use crate::protocol::MessageId;
use parking_lot::Mutex;
use std::collections::HashMap;

struct ParentEntry {
    address: String,
    outstanding: Vec<MessageId>,
}

#[derive(Default)]
struct RegistryInner {
    parents: HashMap<MessageId, ParentEntry>,
    child_to_parent: HashMap<MessageId, MessageId>,
}

/// Tracks outstanding batches: parent → children and child → parent.
#[derive(Default)]
pub struct BatchRegistry {
    inner: Mutex<RegistryInner>,
}

impl BatchRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a merged envelope before it is sent.
    ///
    /// Records the parent with its destination address and inserts a reverse
    /// entry for each child.
    pub fn register(&self, parent: MessageId, address: &str, children: &[MessageId]) {
        let mut inner = self.inner.lock();
        for child in children {
            inner.child_to_parent.insert(*child, parent);
        }
        inner.parents.insert(
            parent,
            ParentEntry {
                address: address.to_string(),
                outstanding: children.to_vec(),
            },
        );
    }

    /// Removes one child from the registry, in either the reply path or the
    /// fail-fast path.
    ///
    /// Drops the reverse entry; when this was the parent's last outstanding
    /// child, the parent entry goes with it. Returns `true` if the child was
    /// tracked. Calling this twice for the same child is a harmless no-op.
    pub fn remove_child(&self, child: MessageId) -> bool {
        let mut inner = self.inner.lock();
        let Some(parent) = inner.child_to_parent.remove(&child) else {
            return false;
        };
        if let Some(entry) = inner.parents.get_mut(&parent) {
            entry.outstanding.retain(|id| *id != child);
            if entry.outstanding.is_empty() {
                inner.parents.remove(&parent);
            }
        }
        true
    }

    /// Drains every outstanding child queued for `address`.
    ///
    /// Removes the matching parent entries and all of their reverse entries
    /// in one atomic step, returning the child ids so the caller can fail
    /// their futures. Used by the channel-loss cleanup protocol.
    #[must_use]
    pub fn drain_address(&self, address: &str) -> Vec<MessageId> {
        let mut inner = self.inner.lock();
        let parents: Vec<MessageId> = inner
            .parents
            .iter()
            .filter(|(_, entry)| entry.address == address)
            .map(|(parent, _)| *parent)
            .collect();

        let mut children = Vec::new();
        for parent in parents {
            if let Some(entry) = inner.parents.remove(&parent) {
                for child in entry.outstanding {
                    inner.child_to_parent.remove(&child);
                    children.push(child);
                }
            }
        }
        children
    }

    /// Returns the parent id a child belongs to, if it is outstanding.
    #[must_use]
    pub fn parent_of(&self, child: MessageId) -> Option<MessageId> {
        self.inner.lock().child_to_parent.get(&child).copied()
    }

    /// Returns the number of outstanding children across all batches.
    #[must_use]
    pub fn outstanding_children(&self) -> usize {
        self.inner.lock().child_to_parent.len()
    }

    /// Returns the number of outstanding parent entries.
    #[must_use]
    pub fn outstanding_parents(&self) -> usize {
        self.inner.lock().parents.len()
    }

    /// Returns true when nothing is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock();
        inner.parents.is_empty() && inner.child_to_parent.is_empty()
    }
}
