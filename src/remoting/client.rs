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

//! The client-side remoting engine.
//!
//! [`RemotingClient`] ties the correlation, batching and channel-lifecycle
//! pieces together behind one instance-scoped facade:
//!
//! - Synchronous sends register a pending future before anything touches a
//!   wire, then either queue into a per-destination basket (batching on) or
//!   write straight onto an acquired channel (batching off).
//! - A background scheduler drains baskets into merged envelopes on a short
//!   window, a reconnect sweep re-acquires every known destination, and an
//!   idle monitor recycles silent channels and probes quiet ones.
//! - Channel lifecycle hooks fan events out to registered listeners and
//!   guarantee that losing a channel fails every batched request that was
//!   routed through it, so no caller blocks past its own timeout.
//!
//! Each client owns its own state; two clients in one process share nothing.

use crate::channel::{
    ActivityTracker, ChannelEventKind, ChannelEventListener, ChannelHandle, ChannelPool, IdleKind,
    ListenerRegistry,
};
use crate::config::RemotingConfig;
use crate::error::RemotingError;
use crate::protocol::{Envelope, MessageId, MessageIdGenerator};
use crate::remoting::merge::MergeSendWorker;
use crate::remoting::{
    BasketMap, BatchRegistry, FutureTable, ResponseRouter, RpcResult, UnsolicitedHandler,
};
use crate::selector::AddressSelector;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Shared state reachable from background tasks.
struct ClientInner {
    config: RemotingConfig,
    ids: Arc<MessageIdGenerator>,
    futures: Arc<FutureTable>,
    batches: Arc<BatchRegistry>,
    baskets: Arc<BasketMap>,
    pool: Arc<dyn ChannelPool>,
    selector: Arc<dyn AddressSelector>,
    listeners: ListenerRegistry,
    activity: Arc<ActivityTracker>,
    router: ResponseRouter,
    merge_wake: Arc<Notify>,
}

impl ClientInner {
    /// Fails every batched request routed through `address` with a channel
    /// loss error. Returns the number of requests failed.
    fn cleanup_for_address(&self, address: &str) -> usize {
        let orphans = self.batches.drain_address(address);
        for id in &orphans {
            let loss = RemotingError::ChannelLoss {
                address: address.to_string(),
            };
            if self.futures.complete(*id, Err(loss)).is_err() {
                debug!(%id, "orphaned batch member already resolved");
            }
        }
        if !orphans.is_empty() {
            info!(
                address = %address,
                count = orphans.len(),
                "failed batched requests after channel loss"
            );
        }
        orphans.len()
    }

    /// One sweep of the reconnect timer: re-acquire every known address so
    /// the pool re-establishes any connection that dropped.
    async fn reconnect_tick(&self) {
        for address in self.selector.all() {
            match self.pool.acquire(&address).await {
                Ok(channel) => self.pool.release(&address, channel).await,
                Err(cause) => warn!(address = %address, %cause, "reconnect attempt failed"),
            }
        }
    }

    /// One sweep of the idle monitor.
    async fn idle_tick(&self) {
        let idle = self.activity.idle_channels(
            self.config.idle_read_threshold,
            self.config.idle_write_threshold,
        );
        for (channel, kind) in idle {
            self.handle_idle(channel, kind).await;
        }
    }

    /// Handles one idle verdict.
    ///
    /// A reader-idle channel has failed liveness: it is recycled and its
    /// batched requests are failed. A writer-idle channel just gets a
    /// heartbeat probe to keep the connection warm.
    async fn handle_idle(&self, channel: Arc<dyn ChannelHandle>, kind: IdleKind) {
        match kind {
            IdleKind::Reader => {
                let address = channel.remote_address();
                warn!(address = %address, "channel reader-idle, recycling");
                self.listeners.fire(&channel, ChannelEventKind::Idle, None);
                self.activity.unregister(channel.id());
                self.cleanup_for_address(&address);
                self.pool.invalidate(&address, channel.clone()).await;
                self.pool.release(&address, channel).await;
            }
            IdleKind::Writer => {
                let ping = Envelope::heartbeat_ping(self.ids.next());
                match channel.send(ping).await {
                    Ok(()) => self.activity.mark_write(channel.id()),
                    Err(cause) => {
                        warn!(address = %channel.remote_address(), %cause, "heartbeat send failed");
                    }
                }
            }
        }
    }
}

/// The client-side remoting engine.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use txrpc::channel::MemoryChannelPool;
/// use txrpc::config::RemotingConfig;
/// use txrpc::remoting::{DiscardHandler, RemotingClient};
/// use txrpc::selector::StaticAddressSelector;
///
/// let pool = Arc::new(MemoryChannelPool::new());
/// let selector = Arc::new(StaticAddressSelector::single("10.0.0.1:8091"));
/// let client = RemotingClient::new(
///     RemotingConfig::default(),
///     pool,
///     selector,
///     Arc::new(DiscardHandler),
/// );
/// assert_eq!(client.pending_requests(), 0);
/// ```
pub struct RemotingClient {
    inner: Arc<ClientInner>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown: watch::Sender<bool>,
    started: AtomicBool,
}

impl RemotingClient {
    /// Creates a client over the given channel pool, address selector and
    /// unsolicited-payload handler. Background tasks do not run until
    /// [`start`](Self::start) is called.
    #[must_use]
    pub fn new(
        config: RemotingConfig,
        pool: Arc<dyn ChannelPool>,
        selector: Arc<dyn AddressSelector>,
        handler: Arc<dyn UnsolicitedHandler>,
    ) -> Self {
        let futures = Arc::new(FutureTable::new());
        let batches = Arc::new(BatchRegistry::new());
        let router = ResponseRouter::new(futures.clone(), batches.clone(), handler);
        let (shutdown, _) = watch::channel(false);
        let inner = Arc::new(ClientInner {
            baskets: Arc::new(BasketMap::new(config.basket_capacity)),
            config,
            ids: Arc::new(MessageIdGenerator::new()),
            futures,
            batches,
            pool,
            selector,
            listeners: ListenerRegistry::new(),
            activity: Arc::new(ActivityTracker::new()),
            router,
            merge_wake: Arc::new(Notify::new()),
        });
        Self {
            inner,
            tasks: Mutex::new(Vec::new()),
            shutdown,
            started: AtomicBool::new(false),
        }
    }

    /// Starts the background tasks: the merge-send scheduler (when batching
    /// is enabled), the reconnect sweep and the idle monitor.
    ///
    /// Calling `start` twice is a no-op.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut tasks = self.tasks.lock();

        if self.inner.config.batch_send_enabled {
            let worker = MergeSendWorker {
                baskets: self.inner.baskets.clone(),
                futures: self.inner.futures.clone(),
                batches: self.inner.batches.clone(),
                pool: self.inner.pool.clone(),
                ids: self.inner.ids.clone(),
                activity: self.inner.activity.clone(),
                wake: self.inner.merge_wake.clone(),
                shutdown: self.shutdown.subscribe(),
                merge_window: self.inner.config.merge_window,
            };
            tasks.push(tokio::spawn(worker.run()));
        }

        let inner = self.inner.clone();
        let mut shutdown = self.shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            let delay = tokio::time::sleep(inner.config.reconnect_delay);
            tokio::pin!(delay);
            tokio::select! {
                _ = &mut delay => {}
                _ = shutdown.changed() => {}
            }
            if *shutdown.borrow() {
                return;
            }
            let mut tick = tokio::time::interval(inner.config.reconnect_interval);
            loop {
                tokio::select! {
                    _ = tick.tick() => inner.reconnect_tick().await,
                    _ = shutdown.changed() => {}
                }
                if *shutdown.borrow() {
                    break;
                }
            }
            debug!("reconnect sweep stopped");
        }));

        let inner = self.inner.clone();
        let mut shutdown = self.shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            let mut tick = tokio::time::interval(inner.config.idle_check_interval);
            loop {
                tokio::select! {
                    _ = tick.tick() => inner.idle_tick().await,
                    _ = shutdown.changed() => {}
                }
                if *shutdown.borrow() {
                    break;
                }
            }
            debug!("idle monitor stopped");
        }));

        info!(
            batching = self.inner.config.batch_send_enabled,
            "remoting client started"
        );
    }

    /// Stops the background tasks and fails every still-pending request
    /// with [`RemotingError::Shutdown`].
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        self.inner.merge_wake.notify_waiters();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }
        let failed = self.inner.futures.fail_all(&RemotingError::Shutdown);
        if failed > 0 {
            warn!(count = failed, "failed pending requests on shutdown");
        }
        info!("remoting client stopped");
    }

    /// Sends a request to a selected destination and waits for its reply.
    ///
    /// With batching enabled the request is queued into the destination's
    /// basket for the merge-send scheduler; a full basket rejects the
    /// request immediately with [`RemotingError::QueueFull`] without
    /// leaking a pending future. With batching disabled the request goes
    /// straight onto an acquired channel.
    ///
    /// Waits at most [`RemotingConfig::request_timeout`].
    pub async fn send_sync(&self, payload: Vec<u8>) -> RpcResult {
        let address = self
            .inner
            .selector
            .select()
            .ok_or(RemotingError::NoAvailableService)?;
        let id = self.inner.ids.next();
        // Register before any send so a fast reply always finds its future.
        let rx = self.inner.futures.register(id);

        if self.inner.config.batch_send_enabled {
            let basket = self.inner.baskets.get_or_create(&address);
            if !basket.push(Envelope::sync_request(id, payload)) {
                self.inner.futures.cancel(id);
                return Err(RemotingError::QueueFull {
                    address,
                    capacity: self.inner.config.basket_capacity,
                });
            }
            self.inner.merge_wake.notify_one();
        } else {
            let channel = match self.inner.pool.acquire(&address).await {
                Ok(channel) => channel,
                Err(cause) => {
                    self.inner.futures.cancel(id);
                    return Err(cause);
                }
            };
            if let Err(cause) = channel.send(Envelope::sync_request(id, payload)).await {
                self.inner.futures.cancel(id);
                return Err(cause);
            }
            self.inner.activity.mark_write(channel.id());
        }
        self.await_result(id, rx).await
    }

    /// Sends a request directly on `channel`, bypassing selection and
    /// batching, and waits for its reply.
    ///
    /// Direct sends are not tracked per destination, so a lost channel does
    /// not fail them early; the caller's own timeout is the only bound.
    pub async fn send_sync_on(
        &self,
        channel: &Arc<dyn ChannelHandle>,
        payload: Vec<u8>,
    ) -> RpcResult {
        let id = self.inner.ids.next();
        let rx = self.inner.futures.register(id);
        if let Err(cause) = channel.send(Envelope::sync_request(id, payload)).await {
            self.inner.futures.cancel(id);
            return Err(cause);
        }
        self.inner.activity.mark_write(channel.id());
        self.await_result(id, rx).await
    }

    /// Sends a fire-and-forget request on `channel`. No future is
    /// registered and no reply is expected.
    pub async fn send_oneway_on(
        &self,
        channel: &Arc<dyn ChannelHandle>,
        payload: Vec<u8>,
    ) -> Result<(), RemotingError> {
        let id = self.inner.ids.next();
        channel.send(Envelope::oneway_request(id, payload)).await?;
        self.inner.activity.mark_write(channel.id());
        Ok(())
    }

    /// Sends the reply for a server-initiated request on `channel`.
    ///
    /// `request_id` is the id the push arrived under, handed to the
    /// unsolicited handler. No future is registered; the reply is
    /// fire-and-forget from this side.
    pub async fn send_response_on(
        &self,
        channel: &Arc<dyn ChannelHandle>,
        request_id: MessageId,
        payload: Vec<u8>,
    ) -> Result<(), RemotingError> {
        channel.send(Envelope::response(request_id, payload)).await?;
        self.inner.activity.mark_write(channel.id());
        Ok(())
    }

    /// Sends a heartbeat ping on `channel`.
    pub async fn send_heartbeat(
        &self,
        channel: &Arc<dyn ChannelHandle>,
    ) -> Result<(), RemotingError> {
        let ping = Envelope::heartbeat_ping(self.inner.ids.next());
        channel.send(ping).await?;
        self.inner.activity.mark_write(channel.id());
        Ok(())
    }

    /// Processes one decoded inbound envelope from `channel_id`.
    ///
    /// Records read activity for the idle monitor, then routes the envelope
    /// to its pending future or the unsolicited handler.
    pub async fn process_received(&self, channel_id: u64, envelope: Envelope) {
        self.inner.activity.mark_read(channel_id);
        self.inner.router.route(envelope).await;
    }

    /// Notifies the engine that `channel` became active.
    pub fn on_channel_active(&self, channel: Arc<dyn ChannelHandle>) {
        debug!(address = %channel.remote_address(), "channel active");
        self.inner.activity.register(channel.clone());
        self.inner
            .listeners
            .fire(&channel, ChannelEventKind::Connected, None);
    }

    /// Notifies the engine that `channel` went away.
    ///
    /// Fires the disconnect event, fails every batched request routed
    /// through the channel's destination and returns the channel to the
    /// pool for teardown.
    pub async fn on_channel_inactive(&self, channel: Arc<dyn ChannelHandle>) {
        let address = channel.remote_address();
        debug!(address = %address, "channel inactive");
        self.inner.activity.unregister(channel.id());
        self.inner
            .listeners
            .fire(&channel, ChannelEventKind::Disconnected, None);
        self.inner.cleanup_for_address(&address);
        self.inner.pool.release(&address, channel).await;
    }

    /// Notifies the engine of a transport error on `channel`.
    ///
    /// Treated like a loss: listeners are told, batched requests through
    /// the destination are failed and the channel is released.
    pub async fn on_channel_exception(
        &self,
        channel: Arc<dyn ChannelHandle>,
        cause: RemotingError,
    ) {
        let address = channel.remote_address();
        warn!(address = %address, %cause, "channel exception");
        self.inner.activity.unregister(channel.id());
        self.inner
            .listeners
            .fire(&channel, ChannelEventKind::Exception, Some(&cause));
        self.inner.cleanup_for_address(&address);
        self.inner.pool.release(&address, channel).await;
    }

    /// Notifies the engine that `channel` crossed an idle threshold, for
    /// transports that detect idleness themselves instead of relying on the
    /// built-in monitor.
    ///
    /// Reader idleness recycles the channel and fails its batched requests;
    /// writer idleness sends a heartbeat probe.
    pub async fn on_channel_idle(&self, channel: Arc<dyn ChannelHandle>, kind: IdleKind) {
        self.inner.handle_idle(channel, kind).await;
    }

    /// Registers a channel event listener. Registering the same listener
    /// twice is a no-op.
    pub fn register_listener(&self, listener: Arc<dyn ChannelEventListener>) {
        self.inner.listeners.register(listener);
    }

    /// Unregisters a previously registered listener.
    pub fn unregister_listener(&self, listener: &Arc<dyn ChannelEventListener>) {
        self.inner.listeners.unregister(listener);
    }

    /// Returns the number of requests still waiting for a reply.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.futures.len()
    }

    /// Awaits the result for `id`, bounding the wait with the configured
    /// request timeout and cleaning up the correlation state on expiry.
    async fn await_result(&self, id: MessageId, rx: oneshot::Receiver<RpcResult>) -> RpcResult {
        let timeout = self.inner.config.request_timeout;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            // Sender dropped without a result: the table entry was replaced
            // or the engine tore down underneath us.
            Ok(Err(_)) => Err(RemotingError::ChannelClosed),
            Err(_) => {
                self.inner.futures.cancel(id);
                self.inner.batches.remove_child(id);
                Err(RemotingError::Timeout { id, timeout })
            }
        }
    }
}
