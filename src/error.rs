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

//! Error types for the remoting engine.
//!
//! The taxonomy distinguishes the failure classes a caller can observe:
//!
//! - **Timeout**: the future was not resolved before its deadline
//! - **No available service**: no address could be resolved before a send
//!   was even attempted; raised immediately, no future is ever created
//! - **Queue full**: the per-destination basket rejected the enqueue; raised
//!   immediately as a distinct class, never confused with a timeout
//! - **Unreachable**: the write was rejected by a closed or unwritable
//!   channel; carries the destination address for diagnostics
//! - **Channel loss**: the connection died while batch-tracked requests were
//!   outstanding; carries the remote address for diagnostics
//!
//! Failures local to one request or batch never abort the merge-send
//! scheduler or other destinations' processing.

use crate::protocol::MessageId;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the remoting engine.
///
/// # Example
///
/// ```rust
/// use txrpc::error::RemotingError;
///
/// let error = RemotingError::QueueFull {
///     address: "10.0.0.1:8091".to_string(),
///     capacity: 2000,
/// };
/// assert!(error.is_queue_full());
/// assert!(!error.is_timeout());
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemotingError {
    /// The pending future exceeded its deadline and was removed from the
    /// future table. A late reply for this id is treated as unsolicited.
    #[error("request {id} timed out after {timeout:?}")]
    Timeout {
        /// The id of the request that timed out.
        id: MessageId,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// No destination address could be resolved for the request.
    ///
    /// Raised before any send is attempted; no future is created.
    #[error("no available service address")]
    NoAvailableService,

    /// The bounded per-destination basket rejected the enqueue.
    ///
    /// Raised immediately; the transiently registered future is removed, so
    /// no future exists for the rejected request. This is a deliberately
    /// distinct failure class from [`RemotingError::Timeout`].
    #[error("send basket for {address} is full (capacity {capacity})")]
    QueueFull {
        /// The destination whose basket is saturated.
        address: String,
        /// The configured basket capacity.
        capacity: usize,
    },

    /// A write was rejected by a closed or unwritable channel, or no channel
    /// could be acquired for the destination. Every batch member affected is
    /// failed together with this error.
    #[error("{address} is unreachable")]
    Unreachable {
        /// The destination that could not be reached.
        address: String,
    },

    /// The channel to the destination disconnected while requests routed
    /// through the basket were still outstanding.
    #[error("channel to {address} disconnected")]
    ChannelLoss {
        /// The remote address of the lost channel.
        address: String,
    },

    /// Failed to establish a connection to the destination.
    #[error("connect to {address} failed: {reason}")]
    ConnectFailed {
        /// The destination that refused the connection.
        address: String,
        /// Description of the connect failure.
        reason: String,
    },

    /// The channel was closed before the operation could run.
    #[error("channel is closed")]
    ChannelClosed,

    /// The remoting engine is shut down; the pending result can no longer
    /// arrive.
    #[error("remoting engine is shut down")]
    Shutdown,
}

impl RemotingError {
    /// Returns true if this error is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if this error is a basket saturation rejection.
    #[must_use]
    pub const fn is_queue_full(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }

    /// Returns true if this error was caused by a lost connection.
    #[must_use]
    pub const fn is_channel_loss(&self) -> bool {
        matches!(self, Self::ChannelLoss { .. })
    }

    /// Returns true if the operation may succeed when retried.
    ///
    /// Timeouts and saturation are transient; an unreachable or lost channel
    /// needs the reconnect path to restore it first.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::QueueFull { .. })
    }

    /// Returns the destination address attached to this error, if any.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::QueueFull { address, .. }
            | Self::Unreachable { address }
            | Self::ChannelLoss { address }
            | Self::ConnectFailed { address, .. } => Some(address),
            _ => None,
        }
    }
}
