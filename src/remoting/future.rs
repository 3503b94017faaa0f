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

//! The future table: pending requests awaiting correlated replies.
//!
//! This is the single source of truth for "who is waiting for reply N". A
//! caller registers its message id before sending and awaits the returned
//! receiver; the response router completes the entry when the reply arrives.
//! Completion is strictly once: the entry is removed as it is completed, so
//! a duplicate reply finds nothing and is a logged no-op.

use crate::error::RemotingError;
use crate::protocol::MessageId;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// The terminal outcome delivered to a pending caller.
pub type RpcResult = Result<Vec<u8>, RemotingError>;

/// Tracks pending requests awaiting responses.
///
/// The table maps message ids to oneshot senders, allowing replies to be
/// routed back to the correct caller even when many requests are in flight
/// concurrently and replies arrive out of order.
///
/// # Thread Safety
///
/// The table is thread-safe; producers register and the router completes
/// from different tasks without external locking.
///
/// # Example
///
/// ```rust
/// use txrpc::remoting::FutureTable;
/// use txrpc::protocol::MessageId;
///
/// # async fn example() {
/// let table = FutureTable::new();
///
/// let rx = table.register(MessageId::from(42));
/// assert!(table.complete(MessageId::from(42), Ok(b"done".to_vec())).is_ok());
///
/// let result = rx.await.unwrap();
/// assert_eq!(result.unwrap(), b"done".to_vec());
/// # }
/// ```
#[derive(Default)]
pub struct FutureTable {
    pending: Mutex<HashMap<MessageId, oneshot::Sender<RpcResult>>>,
}

impl FutureTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending request under `id`.
    ///
    /// Returns the receiver the caller awaits for the correlated result. Ids
    /// are not reused while pending; if a stale entry somehow exists it is
    /// dropped (its caller observes a closed channel) and a warning is
    /// logged.
    #[must_use]
    pub fn register(&self, id: MessageId) -> oneshot::Receiver<RpcResult> {
        let (tx, rx) = oneshot::channel();
        if self.pending.lock().insert(id, tx).is_some() {
            warn!(%id, "replaced stale pending future");
        }
        rx
    }

    /// Completes the pending request for `id` with `result`.
    ///
    /// Removes the entry, so every future resolves at most once. When no
    /// entry exists (the request already timed out, was cleaned up, or the
    /// reply is unsolicited) the result is handed back via `Err` so the
    /// caller can decide what to do with it; this is not an error condition.
    pub fn complete(&self, id: MessageId, result: RpcResult) -> Result<(), RpcResult> {
        match self.pending.lock().remove(&id) {
            Some(tx) => {
                if tx.send(result).is_err() {
                    // Receiver already gave up (raced its own timeout).
                    debug!(%id, "pending caller gone before completion");
                }
                Ok(())
            }
            None => Err(result),
        }
    }

    /// Cancels the pending request for `id` (e.g. on timeout).
    ///
    /// Returns `true` if an entry was removed.
    pub fn cancel(&self, id: MessageId) -> bool {
        self.pending.lock().remove(&id).is_some()
    }

    /// Fails every pending request with a clone of `error`.
    ///
    /// Used on shutdown so no caller is left blocking on a future nobody
    /// will resolve. Returns the number of futures failed.
    pub fn fail_all(&self, error: &RemotingError) -> usize {
        let mut pending = self.pending.lock();
        let count = pending.len();
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(error.clone()));
        }
        count
    }

    /// Returns the number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Returns true when no requests are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
