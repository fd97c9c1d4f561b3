//! Production environment backed by the system clocks.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use smarthid_core::env::Environment;

/// Production environment.
///
/// - Uses `std::time::Instant::now()` for timers
/// - Uses `SystemTime` for comparing against device heartbeats
/// - Uses `tokio::time::sleep()` for async sleeping
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> std::time::Instant {
        std::time::Instant::now()
    }

    fn unix_now(&self) -> Duration {
        // A clock set before 1970 reads as the epoch; every heartbeat then
        // looks fresh rather than the process failing.
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_time_advances() {
        let env = SystemEnv::new();

        let t1 = env.now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = env.now();

        assert!(t2 > t1, "Time should advance");
    }

    #[test]
    fn unix_now_is_after_2020() {
        assert!(SystemEnv::new().unix_now() > Duration::from_secs(1_577_836_800));
    }

    #[tokio::test]
    async fn system_env_sleep_works() {
        let env = SystemEnv::new();

        let start = env.now();
        env.sleep(Duration::from_millis(50)).await;
        let elapsed = env.now() - start;

        assert!(elapsed >= Duration::from_millis(50), "Sleep should wait at least 50ms");
    }
}
