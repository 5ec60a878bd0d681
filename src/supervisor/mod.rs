//! Connection lifecycle: subscribe, heartbeat, reconnect.
//!
//! The supervisor owns the block subscription. The pump and the heartbeat
//! both read through the shared [`BlockSource`] handle, but only the
//! supervisor opens or drops the subscription, and it always drops the old
//! stream before opening a new one, so duplicate handlers cannot accumulate
//! across reconnects.
//!
//! Two distinct failure paths:
//! - transport error / feed close: drop the subscription, cool down, and
//!   resubscribe; retried forever
//! - heartbeat timeout: fatal; the process exits non-zero and an external
//!   supervisor (PM2 or similar) is expected to restart it
//!
//! Block processing runs as its own select branch, one block at a time with
//! a backlog queue, so a slow or hung downstream call never starves the
//! heartbeat: the watchdog keeps ticking and will declare the connection
//! dead even while a block is stuck in flight.

use crate::chain::BlockSource;
use crate::pump::BlockPump;
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{interval_at, sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10);
const RECONNECT_COOLDOWN: Duration = Duration::from_secs(5);

/// Resolves when the in-flight block finishes; pends forever when idle so
/// the select branch simply never fires.
async fn block_done(in_flight: &mut Option<BoxFuture<'static, ()>>) {
    match in_flight {
        Some(task) => task.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Connection lifecycle state. Owned exclusively by the supervisor; the
/// heartbeat only runs while `Active`, which the select loop guarantees
/// structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Disconnected,
    Connecting,
    Active,
    Degraded,
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("liveness probe {0}")]
    LivenessLost(String),
}

pub struct ConnectionSupervisor {
    source: Arc<dyn BlockSource>,
    pump: Arc<BlockPump>,
    state: ConnState,
    heartbeat_interval: Duration,
    heartbeat_timeout: Duration,
    reconnect_cooldown: Duration,
}

impl ConnectionSupervisor {
    pub fn new(source: Arc<dyn BlockSource>, pump: BlockPump) -> Self {
        Self::with_timings(
            source,
            pump,
            HEARTBEAT_INTERVAL,
            HEARTBEAT_TIMEOUT,
            RECONNECT_COOLDOWN,
        )
    }

    pub fn with_timings(
        source: Arc<dyn BlockSource>,
        pump: BlockPump,
        heartbeat_interval: Duration,
        heartbeat_timeout: Duration,
        reconnect_cooldown: Duration,
    ) -> Self {
        Self {
            source,
            pump: Arc::new(pump),
            state: ConnState::Disconnected,
            heartbeat_interval,
            heartbeat_timeout,
            reconnect_cooldown,
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    fn transition(&mut self, next: ConnState) {
        debug!(from = ?self.state, to = ?next, "connection state");
        self.state = next;
    }

    fn start_block(&self, height: u64) -> BoxFuture<'static, ()> {
        let pump = self.pump.clone();
        Box::pin(async move { pump.on_block(height).await })
    }

    /// Run until the heartbeat declares the connection dead. Transport
    /// faults reconnect forever and never surface as errors.
    pub async fn run(&mut self) -> Result<(), SupervisorError> {
        loop {
            self.transition(ConnState::Connecting);

            let mut blocks = match self.source.subscribe_blocks().await {
                Ok(stream) => stream,
                Err(e) => {
                    error!(error = %e, "failed to subscribe to new blocks");
                    self.transition(ConnState::Disconnected);
                    sleep(self.reconnect_cooldown).await;
                    continue;
                }
            };

            self.transition(ConnState::Active);
            info!("block subscription active");

            // First probe one full interval after subscribing, then steady.
            let mut heartbeat =
                interval_at(Instant::now() + self.heartbeat_interval, self.heartbeat_interval);

            // One block in flight at a time, overflow queued, so processing
            // never sits between the heartbeat and the select loop.
            let mut backlog: VecDeque<u64> = VecDeque::new();
            let mut in_flight: Option<BoxFuture<'static, ()>> = None;

            // `Some(reason)` is the fatal liveness path; `None` means the
            // transport dropped and we should reconnect.
            let fatal: Option<String> = loop {
                tokio::select! {
                    notification = blocks.next() => match notification {
                        Some(Ok(height)) => {
                            if in_flight.is_none() {
                                in_flight = Some(self.start_block(height));
                            } else {
                                backlog.push_back(height);
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "block feed transport error");
                            break None;
                        }
                        None => {
                            warn!("block feed closed");
                            break None;
                        }
                    },
                    () = block_done(&mut in_flight) => {
                        in_flight = backlog.pop_front().map(|next| self.start_block(next));
                    }
                    _ = heartbeat.tick() => {
                        match timeout(self.heartbeat_timeout, self.source.block_number()).await {
                            Ok(Ok(height)) => {
                                debug!(block = height, "heartbeat ok");
                            }
                            Ok(Err(e)) => break Some(format!("failed: {e}")),
                            Err(_) => break Some(format!(
                                "timed out after {}s",
                                self.heartbeat_timeout.as_secs()
                            )),
                        }
                    }
                }
            };

            // Fully unsubscribe before reconnecting or exiting.
            drop(blocks);

            if let Some(reason) = fatal {
                self.transition(ConnState::Degraded);
                error!(
                    reason = %reason,
                    "connection liveness lost, exiting for the process supervisor to restart"
                );
                return Err(SupervisorError::LivenessLost(reason));
            }

            self.transition(ConnState::Disconnected);
            info!(
                cooldown_secs = self.reconnect_cooldown.as_secs(),
                "reconnecting after cool-down"
            );
            sleep(self.reconnect_cooldown).await;
        }
    }
}
