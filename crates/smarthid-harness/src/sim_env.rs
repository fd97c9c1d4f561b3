//! Virtual-time environment for simulation.
//!
//! Inside a turmoil simulation every host runs on a paused tokio clock that
//! turmoil advances tick by tick, so `tokio::time::Instant` is already
//! virtual. `SimEnv` adds a wall clock derived from it: a fixed epoch plus
//! the virtual time elapsed since the environment was created.

use std::time::Duration;

use smarthid_core::env::Environment;
use tokio::time::Instant;

/// Default wall-clock origin, 2023-11-14T22:13:20Z.
pub const DEFAULT_EPOCH: Duration = Duration::from_secs(1_700_000_000);

/// Simulation environment.
///
/// Clones share the same origin, so a device and a bridge created from one
/// `SimEnv` agree on wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct SimEnv {
    start: Instant,
    epoch: Duration,
}

impl SimEnv {
    /// Creates an environment whose wall clock starts at [`DEFAULT_EPOCH`].
    ///
    /// Must be called inside the simulation so the origin is virtual time.
    pub fn new() -> Self {
        Self::with_epoch(DEFAULT_EPOCH)
    }

    /// Creates an environment whose wall clock starts at `epoch`.
    pub fn with_epoch(epoch: Duration) -> Self {
        Self { start: Instant::now(), epoch }
    }

    /// Virtual time since creation.
    pub fn elapsed(&self) -> Duration {
        Instant::now() - self.start
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_now(&self) -> Duration {
        self.epoch + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
