//! Simulated SmartHID device.
//!
//! Stands in for the firmware side of the shared store: it publishes
//! `hid/status` heartbeats on a jittered schedule for a fixed lifetime, then
//! goes silent without writing `online: false`, the way a device that lost
//! power would.

use std::{sync::Arc, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use smarthid_core::{SharedStore, StoreError, env::Environment, read_mouse_state};
use smarthid_proto::{HidPath, MouseState};

use crate::SimEnv;

/// Heartbeat schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Nominal time between heartbeats.
    pub heartbeat_interval: Duration,
    /// Maximum extra delay added to each interval.
    pub max_jitter: Duration,
    /// Seed for the jitter RNG.
    pub seed: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self { heartbeat_interval: Duration::from_secs(5), max_jitter: Duration::ZERO, seed: 0 }
    }
}

/// Firmware stand-in writing heartbeats to a store.
#[derive(Debug)]
pub struct SimDevice<S: ?Sized> {
    env: SimEnv,
    store: Arc<S>,
    config: DeviceConfig,
    rng: ChaCha8Rng,
}

impl<S: SharedStore + ?Sized> SimDevice<S> {
    /// Creates a device sharing `env`'s clock.
    pub fn new(env: SimEnv, store: Arc<S>, config: DeviceConfig) -> Self {
        Self { env, store, config, rng: ChaCha8Rng::seed_from_u64(config.seed) }
    }

    /// Writes one `{ online: true, lastSeen: now }` heartbeat.
    pub async fn heartbeat(&self) -> Result<(), StoreError> {
        let last_seen = self.env.unix_now().as_secs();
        self.store.set(HidPath::Status.as_str(), json!({ "online": true, "lastSeen": last_seen })).await
    }

    /// Mouse state as the firmware would read it.
    pub async fn poll_mouse(&self) -> Result<MouseState, StoreError> {
        read_mouse_state(self.store.as_ref()).await
    }

    /// Sends heartbeats until `lifetime` has elapsed, then stops silently.
    ///
    /// Failed heartbeats are skipped, not retried. Returns how many were
    /// written.
    pub async fn run_for(mut self, lifetime: Duration) -> usize {
        let mut sent = 0;
        while self.env.elapsed() < lifetime {
            match self.heartbeat().await {
                Ok(()) => sent += 1,
                Err(e) => tracing::debug!(error = %e, "heartbeat lost"),
            }
            let delay = self.config.heartbeat_interval + self.jitter();
            self.env.sleep(delay).await;
        }
        sent
    }

    fn jitter(&mut self) -> Duration {
        if self.config.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        let max_ms = u64::try_from(self.config.max_jitter.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.rng.gen_range(0..=max_ms))
    }
}
