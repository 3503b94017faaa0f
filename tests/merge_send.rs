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

//! End-to-end tests for the merge-send path: concurrent callers batched
//! into merged envelopes, out-of-order batch replies, channel-loss cleanup
//! and basket saturation.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use txrpc::channel::{ChannelHandle, MemoryChannel, MemoryChannelPool};
use txrpc::config::RemotingConfig;
use txrpc::protocol::{BatchEntry, Envelope, Payload};
use txrpc::remoting::{DiscardHandler, RemotingClient};
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

/// Runs a server double: answers every inbound merged envelope with a batch
/// reply echoing each child body prefixed with `re:`.
fn spawn_echo_responder(
    client: Arc<RemotingClient>,
    channel: Arc<MemoryChannel>,
    mut outbound: mpsc::UnboundedReceiver<Envelope>,
) {
    tokio::spawn(async move {
        while let Some(envelope) = outbound.recv().await {
            let (id, _, payload) = envelope.into_parts();
            match payload {
                Payload::Batch(entries) => {
                    let replies = entries
                        .into_iter()
                        .map(|entry| BatchEntry {
                            id: entry.id,
                            body: [b"re:", entry.body.as_slice()].concat(),
                        })
                        .collect();
                    client
                        .process_received(channel.id(), Envelope::batch_reply(id, replies))
                        .await;
                }
                Payload::Single(body) => {
                    client
                        .process_received(
                            channel.id(),
                            Envelope::response(id, [b"re:", body.as_slice()].concat()),
                        )
                        .await;
                }
                Payload::Heartbeat(_) | Payload::BatchReply(_) => {}
            }
        }
    });
}

#[tokio::test]
async fn test_concurrent_senders_all_complete() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, outbound) = pool.install(ADDRESS);
    let client = client(RemotingConfig::default(), pool);
    spawn_echo_responder(client.clone(), channel, outbound);
    client.start();

    let mut senders = Vec::new();
    for n in 0..32u8 {
        let client = client.clone();
        senders.push(tokio::spawn(async move {
            client.send_sync(vec![n]).await
        }));
    }
    for (n, sender) in senders.into_iter().enumerate() {
        let body = sender.await.unwrap().unwrap();
        assert_eq!(body, vec![b'r', b'e', b':', n as u8]);
    }

    assert_eq!(client.pending_requests(), 0);
    client.shutdown().await;
}

#[tokio::test]
async fn test_batch_reply_out_of_order_leaves_no_residue() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, mut outbound) = pool.install(ADDRESS);
    let client = client(RemotingConfig::default(), pool);
    client.start();

    let a = {
        let client = client.clone();
        tokio::spawn(async move { client.send_sync(b"alpha".to_vec()).await })
    };
    let b = {
        let client = client.clone();
        tokio::spawn(async move { client.send_sync(b"beta".to_vec()).await })
    };

    // Collect everything the scheduler put on the wire; the two requests
    // may ride in one merged envelope or two depending on timing.
    let mut entries = Vec::new();
    while entries.len() < 2 {
        let envelope = outbound.recv().await.expect("merged envelope");
        let (_, _, payload) = envelope.into_parts();
        match payload {
            Payload::Batch(batch) => entries.extend(batch),
            other => panic!("expected merged envelope, got {other:?}"),
        }
    }

    // Reply in reverse order, one child per frame.
    entries.reverse();
    for entry in entries {
        let reply = [b"re:", entry.body.as_slice()].concat();
        client
            .process_received(channel.id(), Envelope::response(entry.id, reply))
            .await;
    }

    assert_eq!(a.await.unwrap().unwrap(), b"re:alpha".to_vec());
    assert_eq!(b.await.unwrap().unwrap(), b"re:beta".to_vec());
    assert_eq!(client.pending_requests(), 0);
    client.shutdown().await;
}

#[tokio::test]
async fn test_channel_loss_fails_every_inflight_batch_member() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, mut outbound) = pool.install(ADDRESS);
    let client = client(RemotingConfig::default(), pool.clone());
    client.start();

    let mut senders = Vec::new();
    for n in 0..3u8 {
        let client = client.clone();
        senders.push(tokio::spawn(async move { client.send_sync(vec![n]).await }));
    }

    // Wait until all three are on the wire, then lose the channel without
    // ever replying.
    let mut sent = 0;
    while sent < 3 {
        let envelope = outbound.recv().await.expect("merged envelope");
        sent += envelope.child_ids().map_or(1, |ids| ids.len());
    }
    client.on_channel_inactive(channel).await;

    for sender in senders {
        let failure = sender.await.unwrap().unwrap_err();
        assert_eq!(
            failure,
            RemotingError::ChannelLoss {
                address: ADDRESS.to_string(),
            }
        );
    }
    assert_eq!(client.pending_requests(), 0);
    assert_eq!(pool.release_count(ADDRESS), 1);
    client.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_destination_does_not_block_others() {
    init_tracing();
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, outbound) = pool.install(ADDRESS);
    // Round-robin alternates between a dead address and a live one.
    let selector = Arc::new(StaticAddressSelector::new(vec![
        "10.0.0.9:8091".to_string(),
        ADDRESS.to_string(),
    ]));
    let client = Arc::new(RemotingClient::new(
        RemotingConfig::default(),
        pool,
        selector,
        Arc::new(DiscardHandler),
    ));
    spawn_echo_responder(client.clone(), channel, outbound);
    client.start();

    let dead = client.send_sync(b"lost".to_vec()).await;
    let live = client.send_sync(b"found".to_vec()).await;

    assert_eq!(
        dead.unwrap_err(),
        RemotingError::Unreachable {
            address: "10.0.0.9:8091".to_string(),
        }
    );
    assert_eq!(live.unwrap(), b"re:found".to_vec());
    assert_eq!(client.pending_requests(), 0);
    client.shutdown().await;
}

#[tokio::test]
async fn test_saturated_basket_is_rejected_not_queued() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (_channel, _outbound) = pool.install(ADDRESS);
    let config = RemotingConfig {
        basket_capacity: 2,
        ..Default::default()
    };
    // Never started: nothing drains the basket.
    let client = client(config, pool);

    let slow: Vec<_> = (0..2u8)
        .map(|n| {
            let client = client.clone();
            tokio::spawn(async move { client.send_sync(vec![n]).await })
        })
        .collect();
    tokio::task::yield_now().await;

    let rejected = client.send_sync(b"overflow".to_vec()).await;
    assert_eq!(
        rejected.unwrap_err(),
        RemotingError::QueueFull {
            address: ADDRESS.to_string(),
            capacity: 2,
        }
    );
    // The rejected request left no pending future behind; the queued two
    // are still waiting.
    assert_eq!(client.pending_requests(), 2);
    for task in slow {
        task.abort();
    }
}

#[tokio::test]
async fn test_request_timeout_empties_the_future_table() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (_channel, _outbound) = pool.install(ADDRESS);
    let config = RemotingConfig {
        request_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let client = client(config, pool);
    client.start();

    // Nothing ever replies.
    let result = client.send_sync(b"begin".to_vec()).await;
    assert!(matches!(result, Err(RemotingError::Timeout { .. })));
    assert_eq!(client.pending_requests(), 0);
    client.shutdown().await;
}

#[tokio::test]
async fn test_heartbeats_bypass_correlation() {
    let pool = Arc::new(MemoryChannelPool::new());
    let (channel, mut outbound) = pool.install(ADDRESS);
    let client = client(RemotingConfig::default(), pool);
    let handle: Arc<dyn ChannelHandle> = channel;

    client.send_heartbeat(&handle).await.unwrap();
    let ping = outbound.recv().await.expect("ping on the wire");
    assert!(matches!(ping.payload(), Payload::Heartbeat(_)));
    assert_eq!(client.pending_requests(), 0);

    // A pong for the same id is swallowed by routing, not correlated.
    client
        .process_received(handle.id(), Envelope::heartbeat_pong(ping.id()))
        .await;
    assert_eq!(client.pending_requests(), 0);
}
