//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples the control plane from system time. This
//! enables:
//!
//! - Deterministic Simulation: the harness runs the driver on a virtual clock,
//!   so coalescing windows and lockout timers are reproducible to the
//!   millisecond.
//!
//! - Production Runtime: `SystemEnv` in the bridge uses the real clock without
//!   any change to the state machines.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Wall clock: `env.unix_now()` may jump (NTP), and is only used to compare
//!   against device heartbeats, never to schedule timers
//! - Isolation: Implementations must not share global state

use std::{
    fmt::Debug,
    ops::{Add, Sub},
    time::Duration,
};

/// Abstract environment providing time and async sleep.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// 1. Time monotonicity: `now()` never goes backwards
/// 2. Infallibility: none of these methods fail or panic
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic instant type.
    ///
    /// Production uses `std::time::Instant`; simulation uses the virtual
    /// clock's instant.
    type Instant: Copy
        + Ord
        + Debug
        + Send
        + Sync
        + Add<Duration, Output = Self::Instant>
        + Sub<Output = Duration>;

    /// Returns the current monotonic time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Wall-clock time since the Unix epoch.
    ///
    /// Heartbeats carry epoch seconds written by the device, so presence
    /// checks need a wall clock rather than a monotonic one.
    fn unix_now(&self) -> Duration;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not state machine logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
