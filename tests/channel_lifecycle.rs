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

//! Channel lifecycle tests: event fan-out, unsolicited payload forwarding,
//! the reconnect sweep and idle supervision.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use txrpc::channel::{ChannelEventKind, ChannelEventListener, ChannelHandle, MemoryChannelPool};
use txrpc::config::RemotingConfig;
use txrpc::protocol::{Envelope, MessageId, Payload};
use txrpc::remoting::{DiscardHandler, RemotingClient, UnsolicitedHandler};
use txrpc::selector::StaticAddressSelector;
use txrpc::RemotingError;

const ADDRESS: &str = "10.0.0.1:8091";

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn client(config: RemotingConfig, pool: Arc<MemoryChannelPool>) -> Arc<RemotingClient> {
    init_tracing();
    Arc::new(RemotingClient::new(
        config,
        pool,
        Arc::new(StaticAddressSelector::single(ADDRESS)),
        Arc::new(DiscardHandler),
    ))
}

#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<(ChannelEventKind, String)>>,
}

impl ChannelEventListener for RecordingListener {
    fn on_connected(&self, channel: &Arc<dyn ChannelHandle>) {
        self.events
            .lock()
            .push((ChannelEventKind::Connected, channel.remote_address()));
    }

    fn on_disconnected(&self, channel: &Arc<dyn ChannelHandle>) {
        self.events
            .lock()
            .push((ChannelEventKind::Disconnected, channel.remote_address()));
    }

    fn on_exception(&self, channel: &Arc<dyn ChannelHandle>, _cause: &RemotingError) {
        self.events
            .lock()
            .push((ChannelEventKind::Exception, channel.remote_address()));
    }

    fn on_idle(&self, channel: &Arc<dyn ChannelHandle>) {
        self.events
            .lock()
            .push((ChannelEventKind::Idle, channel.remote_address()));
    }
}

#[tokio::test]
async fn test_duplicate_registration_fires_once() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, _outbound) = pool.install(ADDRESS);
    let client = client(RemotingConfig::default(), pool);

    let listener = Arc::new(RecordingListener::default());
    let as_trait: Arc<dyn ChannelEventListener> = listener.clone();
    client.register_listener(as_trait.clone());
    client.register_listener(as_trait.clone());

    client.on_channel_active(channel.clone());
    assert_eq!(
        *listener.events.lock(),
        vec![(ChannelEventKind::Connected, ADDRESS.to_string())]
    );

    // After unregistering, the disconnect is silent but cleanup still runs.
    client.unregister_listener(&as_trait);
    client.on_channel_inactive(channel).await;
    assert_eq!(listener.events.lock().len(), 1);
}

#[tokio::test]
async fn test_exception_fires_listener_and_fails_inflight() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, _outbound) = pool.install(ADDRESS);
    let client = client(RemotingConfig::default(), pool.clone());

    let listener = Arc::new(RecordingListener::default());
    client.register_listener(listener.clone());
    client.start();

    let inflight = {
        let client = client.clone();
        tokio::spawn(async move { client.send_sync(b"begin".to_vec()).await })
    };
    // Let the scheduler put the request on the wire before the error hits.
    tokio::time::sleep(Duration::from_millis(20)).await;

    client
        .on_channel_exception(channel, RemotingError::ChannelClosed)
        .await;

    assert_eq!(
        inflight.await.unwrap().unwrap_err(),
        RemotingError::ChannelLoss {
            address: ADDRESS.to_string(),
        }
    );
    assert_eq!(
        *listener.events.lock(),
        vec![(ChannelEventKind::Exception, ADDRESS.to_string())]
    );
    assert_eq!(pool.release_count(ADDRESS), 1);
    client.shutdown().await;
}

#[derive(Default)]
struct RecordingHandler {
    payloads: Mutex<Vec<(MessageId, Vec<u8>)>>,
}

#[async_trait]
impl UnsolicitedHandler for RecordingHandler {
    async fn on_unsolicited(&self, id: MessageId, payload: Vec<u8>) {
        self.payloads.lock().push((id, payload));
    }
}

#[tokio::test]
async fn test_server_push_reaches_the_handler() {
    init_tracing();
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, _outbound) = pool.install(ADDRESS);
    let handler = Arc::new(RecordingHandler::default());
    let client = RemotingClient::new(
        RemotingConfig::default(),
        pool,
        Arc::new(StaticAddressSelector::single(ADDRESS)),
        handler.clone(),
    );

    client
        .process_received(
            channel.id(),
            Envelope::oneway_request(MessageId::from(901), b"branch-rollback".to_vec()),
        )
        .await;

    assert_eq!(
        *handler.payloads.lock(),
        vec![(MessageId::from(901), b"branch-rollback".to_vec())]
    );
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test]
async fn test_server_push_can_be_answered() {
    init_tracing();
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, mut outbound) = pool.install(ADDRESS);
    let handler = Arc::new(RecordingHandler::default());
    let client = RemotingClient::new(
        RemotingConfig::default(),
        pool,
        Arc::new(StaticAddressSelector::single(ADDRESS)),
        handler.clone(),
    );
    let handle: Arc<dyn ChannelHandle> = channel.clone();

    client
        .process_received(
            channel.id(),
            Envelope::sync_request(MessageId::from(902), b"branch-commit".to_vec()),
        )
        .await;
    let (request_id, _) = handler.payloads.lock()[0].clone();

    client
        .send_response_on(&handle, request_id, b"committed".to_vec())
        .await
        .unwrap();

    let reply = outbound.recv().await.expect("reply on the wire");
    assert_eq!(reply.id(), MessageId::from(902));
    assert_eq!(reply.payload(), &Payload::Single(b"committed".to_vec()));
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_sweep_reacquires_known_addresses() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (_channel, _outbound) = pool.install(ADDRESS);
    let config = RemotingConfig {
        batch_send_enabled: false,
        reconnect_delay: Duration::from_secs(60),
        reconnect_interval: Duration::from_secs(10),
        ..Default::default()
    };
    let client = client(config, pool.clone());
    client.start();

    // Nothing before the initial delay elapses.
    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(pool.acquire_count(ADDRESS), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(pool.acquire_count(ADDRESS), 1);
    assert_eq!(pool.release_count(ADDRESS), 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(pool.acquire_count(ADDRESS), 2);
    client.shutdown().await;
}

#[tokio::test]
async fn test_writer_idle_sends_heartbeat_probe() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, mut outbound) = pool.install(ADDRESS);
    let config = RemotingConfig {
        batch_send_enabled: false,
        idle_read_threshold: Duration::from_secs(60),
        idle_write_threshold: Duration::from_millis(30),
        idle_check_interval: Duration::from_millis(10),
        reconnect_delay: Duration::from_secs(60),
        ..Default::default()
    };
    let client = client(config, pool);
    client.on_channel_active(channel);
    client.start();

    let probe = tokio::time::timeout(Duration::from_secs(5), outbound.recv())
        .await
        .expect("idle monitor never probed")
        .expect("channel closed");
    assert!(matches!(probe.payload(), Payload::Heartbeat(_)));
    client.shutdown().await;
}

#[tokio::test]
async fn test_reader_idle_recycles_the_channel() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, _outbound) = pool.install(ADDRESS);
    let config = RemotingConfig {
        batch_send_enabled: false,
        idle_read_threshold: Duration::from_millis(30),
        idle_write_threshold: Duration::from_millis(10),
        idle_check_interval: Duration::from_millis(10),
        reconnect_delay: Duration::from_secs(60),
        ..Default::default()
    };
    let client = client(config, pool.clone());
    let listener = Arc::new(RecordingListener::default());
    client.register_listener(listener.clone());
    client.on_channel_active(channel);
    client.start();

    // Recycling ends with the release, so waiting for it covers the whole
    // invalidate-then-release sequence.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while pool.release_count(ADDRESS) == 0 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "idle monitor never recycled the channel"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(listener
        .events
        .lock()
        .contains(&(ChannelEventKind::Idle, ADDRESS.to_string())));
    assert_eq!(pool.invalidate_count(ADDRESS), 1);
    client.shutdown().await;
}

#[tokio::test]
async fn test_direct_send_survives_disconnect_until_its_own_timeout() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, mut outbound) = pool.install(ADDRESS);
    let config = RemotingConfig {
        request_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let client = client(config, pool);
    let handle: Arc<dyn ChannelHandle> = channel.clone();

    let inflight = {
        let client = client.clone();
        let handle = handle.clone();
        tokio::spawn(async move { client.send_sync_on(&handle, b"report".to_vec()).await })
    };
    outbound.recv().await.expect("request on the wire");

    // Losing the channel does not fail direct sends early; only their own
    // timeout unblocks them.
    client.on_channel_inactive(channel).await;
    assert_eq!(client.pending_requests(), 1);

    let result = inflight.await.unwrap();
    assert!(matches!(result, Err(RemotingError::Timeout { .. })));
    assert_eq!(client.pending_requests(), 0);
}
