//! Fuzz target for [`SessionGate`]
//!
//! Prevent authentication bypass and lockout evasion
//!
//! # Strategy
//!
//! - Event sequences: arbitrary mixes of correct, wrong and garbage
//!   passwords with time advances and access checks
//! - Oracle: the login-only projection of the harness model world
//!
//! # Invariants
//!
//! - `Authenticated` ONLY reachable via the correct password outside a
//!   lockout
//! - `Authenticated` is terminal
//! - Submissions while `Locked` never change the attempt count
//! - `attempts` only returns to zero on success
//! - NEVER panic on any password bytes

#![no_main]

use std::{
    ops::{Add, Sub},
    time::Duration,
};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use smarthid_core::{AuthError, GateState, LockoutPolicy, Secret, SessionGate};
use smarthid_harness::{ModelWorld, Operation, OperationError, OperationResult, model::PASSWORD};

/// Represents time as Duration since epoch 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FuzzInstant(Duration);

impl Add<Duration> for FuzzInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub for FuzzInstant {
    type Output = Duration;

    fn sub(self, other: Self) -> Duration {
        self.0.saturating_sub(other.0)
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum GateEvent {
    Correct,
    Wrong,
    Garbage(Vec<u8>),
    Advance { secs: u16 },
    Check,
}

fuzz_target!(|events: Vec<GateEvent>| {
    let mut now = FuzzInstant(Duration::ZERO);
    let mut gate = SessionGate::new(Secret::new(PASSWORD), LockoutPolicy::default());
    let mut model = ModelWorld::new();

    for event in events {
        let before = gate.state(now);
        let attempts_before = gate.attempts();

        match event {
            GateEvent::Advance { secs } => {
                now = now + Duration::from_secs(u64::from(secs));
                model.apply(&Operation::AdvanceTime { secs });
            },
            GateEvent::Check => {
                let allowed = gate.check(now).is_ok();
                assert_eq!(allowed, before == GateState::Authenticated);
            },
            GateEvent::Correct | GateEvent::Wrong | GateEvent::Garbage(_) => {
                let password = match &event {
                    GateEvent::Correct => PASSWORD.to_string(),
                    GateEvent::Garbage(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                    _ => format!("{PASSWORD}?"),
                };
                let correct = password == PASSWORD;
                let result = gate.submit(&password, now);
                let expected = model.apply(&Operation::Login { correct });

                match (&result, expected) {
                    (Ok(()), OperationResult::Accepted) => {},
                    (Err(AuthError::WrongPassword { .. }), OperationResult::Rejected(OperationError::WrongPassword)) => {},
                    (Err(AuthError::LockedOut { .. }), OperationResult::Rejected(OperationError::LockedOut)) => {},
                    (real, model) => panic!("gate {real:?} diverged from model {model:?}"),
                }

                if before == GateState::Locked {
                    assert_eq!(gate.attempts(), attempts_before, "locked submission was counted");
                }
                if result.is_ok() {
                    assert!(before != GateState::Locked, "authenticated during lockout");
                    assert!(correct || before == GateState::Authenticated, "authenticated with wrong password");
                }
            },
        }

        if before == GateState::Authenticated {
            assert_eq!(gate.state(now), GateState::Authenticated, "left terminal state");
        }
        if gate.state(now) == GateState::Locked {
            assert!(gate.lockout_until().is_some_and(|until| until > now));
        }
        if gate.attempts() < attempts_before {
            assert_eq!(gate.attempts(), 0);
            assert_eq!(gate.state(now), GateState::Authenticated);
        }
        assert_eq!(gate.attempts(), model.observable_state().attempts);
    }
});
