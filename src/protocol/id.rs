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

//! Message identifier types and generation.
//!
//! Every wire-level envelope carries a numeric id that correlates a request
//! with its eventual reply. Ids are generated from a wrapping atomic counter
//! so concurrent callers never collide without taking a lock.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// A unique identifier for one wire-level message.
///
/// Message ids correlate requests with responses: the sender registers a
/// pending future keyed by the id, and the response router resolves it when
/// a reply carrying the same id arrives.
///
/// # ID Space
///
/// Ids are 32-bit and wrap around; id 0 is reserved for messages that carry
/// no correlation (it is skipped by [`MessageIdGenerator`]). An id is only
/// required to be unique among *in-flight* requests, which the wrap-around
/// space comfortably guarantees.
///
/// # Example
///
/// ```rust
/// use txrpc::protocol::MessageId;
///
/// let id = MessageId::from(42);
/// assert_eq!(id.as_u32(), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u32);

impl MessageId {
    /// Returns the message id as a u32.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for MessageId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates unique message ids for request-response correlation.
///
/// The generator is thread-safe and lock-free; it can be shared across tasks
/// behind an `Arc` or embedded in a larger structure.
///
/// Ids start at 1 and increment monotonically, wrapping around at the end of
/// the u32 space. Id 0 is reserved and skipped on wrap.
///
/// # Example
///
/// ```rust
/// use txrpc::protocol::MessageIdGenerator;
///
/// let generator = MessageIdGenerator::new();
/// let a = generator.next();
/// let b = generator.next();
/// assert_ne!(a, b);
/// assert!(a.as_u32() > 0);
/// ```
#[derive(Debug)]
pub struct MessageIdGenerator {
    next_id: AtomicU32,
}

impl MessageIdGenerator {
    /// Creates a new generator starting at id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU32::new(1),
        }
    }

    /// Generates the next message id.
    ///
    /// Wraps around at the end of the u32 space, skipping the reserved id 0.
    #[must_use]
    pub fn next(&self) -> MessageId {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return MessageId(id);
            }
        }
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
