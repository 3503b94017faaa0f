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

//! The merge-send scheduler.
//!
//! A single background task periodically drains every non-empty basket into
//! one merged envelope per destination and sends it. The loop sleeps for at
//! most one merge window, or wakes early when a producer enqueues, so
//! batching adds at most one window of latency to any request.
//!
//! A send failure fails every child of that batch immediately: futures are
//! resolved with an unreachable error and the batch bookkeeping is unwound.
//! The scheduler then moves on to the next destination, so nothing a single
//! destination does can block the loop.

use crate::channel::{ActivityTracker, ChannelPool};
use crate::protocol::{BatchEntry, Envelope, MessageId, MessageIdGenerator, Payload};
use crate::remoting::{BatchRegistry, BasketMap, FutureTable};
use crate::error::RemotingError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// The background worker draining baskets into merged envelopes.
pub(crate) struct MergeSendWorker {
    pub(crate) baskets: Arc<BasketMap>,
    pub(crate) futures: Arc<FutureTable>,
    pub(crate) batches: Arc<BatchRegistry>,
    pub(crate) pool: Arc<dyn ChannelPool>,
    pub(crate) ids: Arc<MessageIdGenerator>,
    pub(crate) activity: Arc<ActivityTracker>,
    pub(crate) wake: Arc<Notify>,
    pub(crate) shutdown: watch::Receiver<bool>,
    pub(crate) merge_window: Duration,
}

impl MergeSendWorker {
    /// Runs the scheduler loop until shutdown.
    pub(crate) async fn run(mut self) {
        let mut window = tokio::time::interval(self.merge_window);
        window.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = window.tick() => {}
                _ = self.wake.notified() => {}
                _ = self.shutdown.changed() => {}
            }
            if *self.shutdown.borrow() {
                break;
            }
            self.drain_cycle().await;
        }
        debug!("merge-send scheduler stopped");
    }

    /// Drains every non-empty basket and sends one merged envelope per
    /// destination.
    pub(crate) async fn drain_cycle(&self) {
        for (address, basket) in self.baskets.non_empty() {
            let drained = basket.drain();
            if drained.is_empty() {
                // A concurrent cycle got here first.
                continue;
            }

            let mut entries = Vec::with_capacity(drained.len());
            let mut child_ids = Vec::with_capacity(drained.len());
            for envelope in drained {
                let (id, _, payload) = envelope.into_parts();
                if let Payload::Single(body) = payload {
                    child_ids.push(id);
                    entries.push(BatchEntry { id, body });
                }
            }
            if child_ids.is_empty() {
                continue;
            }
            if child_ids.len() > 1 {
                debug!(address = %address, size = child_ids.len(), "merged outbound batch");
            }

            let parent = self.ids.next();
            self.batches.register(parent, &address, &child_ids);
            let merged = Envelope::batch(parent, entries);

            match self.pool.acquire(&address).await {
                Ok(channel) => match channel.send(merged).await {
                    Ok(()) => self.activity.mark_write(channel.id()),
                    Err(cause) => {
                        error!(address = %address, %cause, "merged send failed, failing batch members");
                        self.pool.destroy(&address, channel).await;
                        self.fail_children(&address, &child_ids);
                    }
                },
                Err(cause) => {
                    error!(address = %address, %cause, "no channel for merged batch, failing batch members");
                    self.fail_children(&address, &child_ids);
                }
            }
        }
    }

    /// Fails every child of an unsendable batch with an unreachable error
    /// and unwinds the batch bookkeeping.
    fn fail_children(&self, address: &str, children: &[MessageId]) {
        for child in children {
            self.batches.remove_child(*child);
            let failure = RemotingError::Unreachable {
                address: address.to_string(),
            };
            if self.futures.complete(*child, Err(failure)).is_err() {
                debug!(id = %child, "no pending future for failed batch member");
            }
        }
    }
}
