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

//! Configuration for the remoting engine.

use std::time::Duration;

/// Configuration for a [`RemotingClient`](crate::remoting::RemotingClient).
///
/// # Examples
///
/// ```rust
/// use txrpc::config::RemotingConfig;
/// use std::time::Duration;
///
/// // Use default configuration
/// let config = RemotingConfig::default();
///
/// // Customize configuration
/// let config = RemotingConfig {
///     batch_send_enabled: true,
///     request_timeout: Duration::from_secs(10),
///     basket_capacity: 500,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct RemotingConfig {
    /// Whether synchronous requests are routed through the per-destination
    /// baskets and merged by the background scheduler.
    ///
    /// When disabled, every synchronous request acquires a channel and is
    /// sent directly.
    ///
    /// Default: true
    pub batch_send_enabled: bool,

    /// The bounded merge window.
    ///
    /// The merge-send scheduler sleeps for at most this long before draining
    /// the baskets, so batching adds at most one window of latency to any
    /// request. An enqueue wakes the scheduler early.
    ///
    /// Default: 1 millisecond
    pub merge_window: Duration,

    /// Capacity of each per-destination basket.
    ///
    /// An enqueue against a full basket is rejected immediately with
    /// [`RemotingError::QueueFull`](crate::error::RemotingError::QueueFull);
    /// it never turns into a timeout.
    ///
    /// Default: 2000
    pub basket_capacity: usize,

    /// Deadline for a synchronous request's reply.
    ///
    /// A future not resolved within this duration is removed from the future
    /// table and the caller observes a timeout failure.
    ///
    /// Default: 30 seconds
    pub request_timeout: Duration,

    /// No inbound traffic for this long is treated as a liveness failure:
    /// the channel is invalidated and released, triggering the same cleanup
    /// as a disconnect.
    ///
    /// Default: 15 seconds
    pub idle_read_threshold: Duration,

    /// No outbound traffic for this long triggers a heartbeat ping to keep
    /// the path warm and probe liveness.
    ///
    /// Default: 5 seconds
    pub idle_write_threshold: Duration,

    /// How often the idle monitor inspects channel activity.
    ///
    /// Default: 1 second
    pub idle_check_interval: Duration,

    /// Interval between reconnection sweeps over all configured addresses.
    ///
    /// Failures are logged and retried on the next tick; there is no backoff
    /// escalation.
    ///
    /// Default: 10 seconds
    pub reconnect_interval: Duration,

    /// Delay before the first reconnection sweep.
    ///
    /// Default: 60 seconds
    pub reconnect_delay: Duration,
}

impl Default for RemotingConfig {
    fn default() -> Self {
        Self {
            batch_send_enabled: true,
            merge_window: Duration::from_millis(1),
            basket_capacity: 2000,
            request_timeout: Duration::from_secs(30),
            idle_read_threshold: Duration::from_secs(15),
            idle_write_threshold: Duration::from_secs(5),
            idle_check_interval: Duration::from_secs(1),
            reconnect_interval: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(60),
        }
    }
}

impl RemotingConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RemotingConfig::default();
        assert!(config.batch_send_enabled);
        assert_eq!(config.merge_window, Duration::from_millis(1));
        assert_eq!(config.basket_capacity, 2000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_override() {
        let config = RemotingConfig {
            basket_capacity: 8,
            ..Default::default()
        };
        assert_eq!(config.basket_capacity, 8);
        assert!(config.batch_send_enabled);
    }
}
