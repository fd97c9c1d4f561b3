//! Session gate.
//!
//! Brute-force-resistant login state machine. Pure: every method takes the
//! current instant, nothing reads the clock itself.
//!
//! ```text
//!            submit(ok)
//! AwaitingInput ─────────▶ Authenticated   (terminal)
//!   │      ▲
//!   │      │ now >= lockout_until
//!   ▼      │
//!  Locked ─┘
//!   (reached when attempts >= max_attempts)
//! ```
//!
//! # Invariants
//!
//! - `attempts` only returns to 0 on a successful login; time alone never
//!   resets it
//! - `lockout_until` is armed exactly when a failure brings `attempts` to the
//!   threshold or beyond
//! - Lockout is checked before the password is looked at, so a locked-out
//!   operator cannot burn or test passwords

use std::{fmt, time::Duration};

use subtle::ConstantTimeEq;

use crate::error::AuthError;

/// Lockout tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failures that trigger a lockout.
    pub max_attempts: u32,
    /// How long a lockout lasts.
    pub duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, duration: Duration::from_secs(300) }
    }
}

/// Observable gate state at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Waiting for a password.
    AwaitingInput,
    /// Refusing submissions until the lockout lifts.
    Locked,
    /// Logged in for the rest of the process lifetime.
    Authenticated,
}

/// Shared secret. `Debug` never prints it.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    /// Wraps the configured password.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<redacted {} bytes>)", self.0.len())
    }
}

/// Login attempt and lockout tracker for one operator session.
#[derive(Debug, Clone)]
pub struct SessionGate<I> {
    secret: Secret,
    policy: LockoutPolicy,
    authenticated: bool,
    attempts: u32,
    lockout_until: Option<I>,
}

impl<I> SessionGate<I>
where
    I: Copy + Ord + std::ops::Add<Duration, Output = I> + std::ops::Sub<Output = Duration>,
{
    /// Creates a gate in `AwaitingInput` with no failed attempts.
    pub fn new(secret: Secret, policy: LockoutPolicy) -> Self {
        Self { secret, policy, authenticated: false, attempts: 0, lockout_until: None }
    }

    /// Failed attempts since the last successful login.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Instant the current (or last) lockout lifts.
    pub fn lockout_until(&self) -> Option<I> {
        self.lockout_until
    }

    /// State as seen at `now`.
    pub fn state(&self, now: I) -> GateState {
        if self.authenticated {
            GateState::Authenticated
        } else if self.lockout_until.is_some_and(|until| now < until) {
            GateState::Locked
        } else {
            GateState::AwaitingInput
        }
    }

    /// Checks access without changing anything.
    ///
    /// # Errors
    ///
    /// `LockedOut` while a lockout is active, otherwise `LoginRequired` until
    /// a password has been accepted.
    pub fn check(&self, now: I) -> Result<(), AuthError> {
        match self.state(now) {
            GateState::Authenticated => Ok(()),
            GateState::Locked => Err(self.locked_out(now)),
            GateState::AwaitingInput => {
                Err(AuthError::LoginRequired { remaining_attempts: self.remaining_attempts() })
            },
        }
    }

    /// Submits a password.
    ///
    /// Submitting while already authenticated is a no-op success.
    ///
    /// # Errors
    ///
    /// `LockedOut` if a lockout is active (the attempt is not counted), or
    /// `WrongPassword` with the attempts left before lockout.
    pub fn submit(&mut self, password: &str, now: I) -> Result<(), AuthError> {
        match self.state(now) {
            GateState::Authenticated => return Ok(()),
            GateState::Locked => return Err(self.locked_out(now)),
            GateState::AwaitingInput => {},
        }

        if self.secret.matches(password) {
            self.authenticated = true;
            self.attempts = 0;
            self.lockout_until = None;
            tracing::info!("operator authenticated");
            return Ok(());
        }

        self.attempts = self.attempts.saturating_add(1);
        if self.attempts >= self.policy.max_attempts {
            self.lockout_until = Some(now + self.policy.duration);
            tracing::warn!(
                attempts = self.attempts,
                lockout_secs = self.policy.duration.as_secs(),
                "too many failed logins, locking out"
            );
        } else {
            tracing::debug!(attempts = self.attempts, "failed login");
        }

        Err(AuthError::WrongPassword { remaining_attempts: self.remaining_attempts() })
    }

    fn remaining_attempts(&self) -> u32 {
        self.policy.max_attempts.saturating_sub(self.attempts)
    }

    fn locked_out(&self, now: I) -> AuthError {
        let remaining = self.lockout_until.map_or(Duration::ZERO, |until| until - now);
        AuthError::LockedOut { remaining_secs: ceil_secs(remaining) }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
