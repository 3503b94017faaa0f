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

//! Inbound envelope routing.
//!
//! Every decoded inbound envelope goes through [`ResponseRouter::route`]:
//!
//! 1. Batch results are unpacked child by child; each child's future is
//!    resolved with its own result and the batch bookkeeping is unwound.
//!    A missing child is logged, never fatal.
//! 2. A single body resolves its pending future if one exists; otherwise it
//!    is an unsolicited message and is forwarded to the external handler
//!    with no caller context.
//! 3. Heartbeat bodies are recognized by their sentinel payload and only
//!    logged; they never touch the future table.

use crate::protocol::{Envelope, MessageId, Payload};
use crate::remoting::{BatchRegistry, FutureTable};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Receiver of inbound payloads that have no pending future.
///
/// The handler is the boundary to the layer that interprets payload
/// contents (e.g. server-initiated protocol requests). There is no caller
/// waiting; the message id is passed through so the handler can answer a
/// server push with
/// [`RemotingClient::send_response_on`](crate::remoting::RemotingClient::send_response_on).
#[async_trait]
pub trait UnsolicitedHandler: Send + Sync {
    /// Called for every inbound payload with no matching pending future.
    async fn on_unsolicited(&self, id: MessageId, payload: Vec<u8>);
}

/// An [`UnsolicitedHandler`] that logs and drops every payload.
#[derive(Debug, Default)]
pub struct DiscardHandler;

#[async_trait]
impl UnsolicitedHandler for DiscardHandler {
    async fn on_unsolicited(&self, id: MessageId, payload: Vec<u8>) {
        debug!(%id, bytes = payload.len(), "discarding unsolicited payload");
    }
}

/// Routes inbound envelopes to pending futures or the unsolicited handler.
pub struct ResponseRouter {
    futures: Arc<FutureTable>,
    batches: Arc<BatchRegistry>,
    handler: Arc<dyn UnsolicitedHandler>,
}

impl ResponseRouter {
    /// Creates a router over the given tables and handler.
    #[must_use]
    pub fn new(
        futures: Arc<FutureTable>,
        batches: Arc<BatchRegistry>,
        handler: Arc<dyn UnsolicitedHandler>,
    ) -> Self {
        Self {
            futures,
            batches,
            handler,
        }
    }

    /// Routes one decoded inbound envelope.
    pub async fn route(&self, envelope: Envelope) {
        let (id, kind, payload) = envelope.into_parts();
        match payload {
            Payload::Heartbeat(beat) => {
                debug!(%id, ?kind, ?beat, "heartbeat received");
            }
            Payload::BatchReply(entries) => {
                for entry in entries {
                    self.batches.remove_child(entry.id);
                    if self.futures.complete(entry.id, Ok(entry.body)).is_err() {
                        warn!(id = %entry.id, "no pending future for batched reply");
                    }
                }
            }
            Payload::Single(body) => {
                match self.futures.complete(id, Ok(body)) {
                    Ok(()) => {
                        // Unwind bookkeeping in case the server answered a
                        // batched child individually.
                        self.batches.remove_child(id);
                    }
                    Err(Ok(body)) => {
                        debug!(%id, "forwarding unsolicited payload");
                        self.handler.on_unsolicited(id, body).await;
                    }
                    Err(Err(_)) => {}
                }
            }
            Payload::Batch(entries) => {
                // A server push may bundle several requests in one frame.
                for entry in entries {
                    self.handler.on_unsolicited(entry.id, entry.body).await;
                }
            }
        }
    }
}
