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

//! Wire-level message envelopes.
//!
//! An [`Envelope`] is the unit the remoting engine routes: a message id, a
//! [`MessageKind`] tag, and an opaque [`Payload`]. The engine never interprets
//! payload bodies; it only needs the id and kind to correlate replies, plus
//! the batch and heartbeat payload shapes to route them. Encoding an envelope
//! into bytes (and decoding inbound frames back into envelopes) is the job of
//! an external codec.

use super::MessageId;

/// The type tag carried by every envelope.
///
/// Kinds mirror the wire protocol's message type byte and determine both
/// routing on the receive path and whether a pending future exists for the
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A request whose sender blocks on a correlated reply.
    SyncRequest,
    /// A reply correlated to an earlier request by id.
    Response,
    /// A fire-and-forget request; no future is ever registered.
    OnewayRequest,
    /// A liveness probe; never touches the future table.
    HeartbeatRequest,
    /// A liveness probe reply; recognized by its sentinel payload and only logged.
    HeartbeatResponse,
}

impl MessageKind {
    /// Returns the wire code for this kind.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::SyncRequest => 0,
            Self::Response => 1,
            Self::OnewayRequest => 2,
            Self::HeartbeatRequest => 3,
            Self::HeartbeatResponse => 4,
        }
    }

    /// Parses a wire code back into a kind.
    ///
    /// Returns `None` for codes outside the protocol.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::SyncRequest),
            1 => Some(Self::Response),
            2 => Some(Self::OnewayRequest),
            3 => Some(Self::HeartbeatRequest),
            4 => Some(Self::HeartbeatResponse),
            _ => None,
        }
    }

    /// Returns true if this kind expects a correlated reply.
    #[must_use]
    pub const fn expects_reply(self) -> bool {
        matches!(self, Self::SyncRequest)
    }
}

/// The heartbeat sentinel body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heartbeat {
    /// Outbound liveness probe.
    Ping,
    /// Inbound liveness acknowledgement.
    Pong,
}

/// One child entry of a batch payload: a child message id and its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// The child message id, correlating this entry to a pending future.
    pub id: MessageId,
    /// The opaque body for this child.
    pub body: Vec<u8>,
}

/// The body of an envelope, resolved once at decode time.
///
/// Modelling the batch / single / heartbeat distinction as a tagged variant
/// means the routing decision is made exactly once, instead of inspecting
/// payload types at every call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// An opaque single body.
    Single(Vec<u8>),
    /// N child requests bundled into one outbound frame.
    Batch(Vec<BatchEntry>),
    /// N child replies bundled into one inbound frame.
    BatchReply(Vec<BatchEntry>),
    /// The heartbeat sentinel.
    Heartbeat(Heartbeat),
}

/// One wire frame: a message id, a type tag, and an opaque body.
///
/// Envelopes are immutable once built. The constructors cover every message
/// shape the engine produces or consumes.
///
/// # Example
///
/// ```rust
/// use txrpc::protocol::{Envelope, MessageId, MessageKind, Payload};
///
/// let envelope = Envelope::sync_request(MessageId::from(7), b"begin".to_vec());
/// assert_eq!(envelope.id(), MessageId::from(7));
/// assert_eq!(envelope.kind(), MessageKind::SyncRequest);
/// assert!(matches!(envelope.payload(), Payload::Single(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    id: MessageId,
    kind: MessageKind,
    payload: Payload,
}

impl Envelope {
    /// Builds a synchronous request whose caller will await a correlated reply.
    #[must_use]
    pub fn sync_request(id: MessageId, body: Vec<u8>) -> Self {
        Self {
            id,
            kind: MessageKind::SyncRequest,
            payload: Payload::Single(body),
        }
    }

    /// Builds a fire-and-forget request.
    #[must_use]
    pub fn oneway_request(id: MessageId, body: Vec<u8>) -> Self {
        Self {
            id,
            kind: MessageKind::OnewayRequest,
            payload: Payload::Single(body),
        }
    }

    /// Builds a heartbeat ping.
    #[must_use]
    pub fn heartbeat_ping(id: MessageId) -> Self {
        Self {
            id,
            kind: MessageKind::HeartbeatRequest,
            payload: Payload::Heartbeat(Heartbeat::Ping),
        }
    }

    /// Builds a heartbeat pong.
    #[must_use]
    pub fn heartbeat_pong(id: MessageId) -> Self {
        Self {
            id,
            kind: MessageKind::HeartbeatResponse,
            payload: Payload::Heartbeat(Heartbeat::Pong),
        }
    }

    /// Builds a single reply correlated to `id`.
    #[must_use]
    pub fn response(id: MessageId, body: Vec<u8>) -> Self {
        Self {
            id,
            kind: MessageKind::Response,
            payload: Payload::Single(body),
        }
    }

    /// Builds a merged envelope bundling `entries` under a fresh parent id.
    ///
    /// The entries keep their enqueue order; each child id stays correlated
    /// to its own pending future.
    #[must_use]
    pub fn batch(parent_id: MessageId, entries: Vec<BatchEntry>) -> Self {
        Self {
            id: parent_id,
            kind: MessageKind::OnewayRequest,
            payload: Payload::Batch(entries),
        }
    }

    /// Builds a batch reply carrying results for previously batched children.
    #[must_use]
    pub fn batch_reply(parent_id: MessageId, entries: Vec<BatchEntry>) -> Self {
        Self {
            id: parent_id,
            kind: MessageKind::Response,
            payload: Payload::BatchReply(entries),
        }
    }

    /// Returns the message id.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the type tag.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns a reference to the payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Consumes the envelope, returning its id, kind, and payload.
    #[must_use]
    pub fn into_parts(self) -> (MessageId, MessageKind, Payload) {
        (self.id, self.kind, self.payload)
    }

    /// Returns the child ids of a batch payload, if this envelope is one.
    #[must_use]
    pub fn child_ids(&self) -> Option<Vec<MessageId>> {
        match &self.payload {
            Payload::Batch(entries) | Payload::BatchReply(entries) => {
                Some(entries.iter().map(|entry| entry.id).collect())
            }
            _ => None,
        }
    }
}
