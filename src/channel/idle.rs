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

//! Per-channel activity tracking for idle detection.
//!
//! Every active channel gets an activity record holding the instants of its
//! last inbound and outbound traffic. The engine's idle monitor scans these
//! records on a fixed interval:
//!
//! - **writer-idle** (no outbound traffic): send a heartbeat to keep the
//!   path warm and probe liveness
//! - **reader-idle** (no inbound traffic): treat as a liveness failure and
//!   invalidate the channel, triggering the same cleanup as a disconnect

use crate::channel::ChannelHandle;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which direction of a channel went quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleKind {
    /// No inbound traffic for the configured interval.
    Reader,
    /// No outbound traffic for the configured interval.
    Writer,
}

struct ActivityRecord {
    channel: Arc<dyn ChannelHandle>,
    last_read: Instant,
    last_write: Instant,
}

/// Tracks last-read / last-write instants for every active channel.
#[derive(Default)]
pub struct ActivityTracker {
    records: Mutex<HashMap<u64, ActivityRecord>>,
}

impl ActivityTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a channel; both instants start at "now".
    pub fn register(&self, channel: Arc<dyn ChannelHandle>) {
        let now = Instant::now();
        self.records.lock().insert(
            channel.id(),
            ActivityRecord {
                channel,
                last_read: now,
                last_write: now,
            },
        );
    }

    /// Stops tracking a channel.
    pub fn unregister(&self, channel_id: u64) {
        self.records.lock().remove(&channel_id);
    }

    /// Records inbound traffic on a channel.
    pub fn mark_read(&self, channel_id: u64) {
        if let Some(record) = self.records.lock().get_mut(&channel_id) {
            record.last_read = Instant::now();
        }
    }

    /// Records outbound traffic on a channel.
    pub fn mark_write(&self, channel_id: u64) {
        if let Some(record) = self.records.lock().get_mut(&channel_id) {
            record.last_write = Instant::now();
        }
    }

    /// Returns the number of tracked channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true when no channels are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Returns every channel that crossed an idle threshold.
    ///
    /// A reader-idle channel is reported as [`IdleKind::Reader`] even if it
    /// is also writer-idle, because the reader verdict (liveness failure)
    /// subsumes the writer one (send a probe).
    #[must_use]
    pub fn idle_channels(
        &self,
        read_threshold: Duration,
        write_threshold: Duration,
    ) -> Vec<(Arc<dyn ChannelHandle>, IdleKind)> {
        let now = Instant::now();
        let records = self.records.lock();
        let mut idle = Vec::new();
        for record in records.values() {
            if now.duration_since(record.last_read) >= read_threshold {
                idle.push((record.channel.clone(), IdleKind::Reader));
            } else if now.duration_since(record.last_write) >= write_threshold {
                idle.push((record.channel.clone(), IdleKind::Writer));
            }
        }
        idle
    }
}
