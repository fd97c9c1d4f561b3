//! Model-based property tests.
//!
//! Random operator sessions are applied to the reference model and to the
//! real `ControlDriver` running in turmoil virtual time; outcomes and
//! observable state must agree after every step.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      ModelWorld    RealWorld      Compare
//!      (reference)   (turmoil)      Results
//! ```

use std::{sync::Arc, time::Duration};

use proptest::prelude::*;
use serde_json::Value;
use smarthid_core::{
    AuthError, ControlConfig, ControlDriver, ControlError, GateState, MemoryStore, Notice, Secret, ValidationError,
    env::Environment,
};
use smarthid_harness::{
    ModelWorld, ObservableState, Operation, OperationError, OperationResult, SimEnv,
    model::{ModelMode, PASSWORD, Payload, StoreSnapshot},
};

/// Real driver wrapped to mirror `ModelWorld`'s interface.
struct RealWorld {
    env: SimEnv,
    store: Arc<MemoryStore>,
    driver: ControlDriver<SimEnv, MemoryStore>,
}

impl RealWorld {
    fn new() -> Self {
        let env = SimEnv::new();
        let store = Arc::new(MemoryStore::new());
        let driver = ControlDriver::new(env, Arc::clone(&store), Secret::new(PASSWORD), ControlConfig::default());
        Self { env, store, driver }
    }

    async fn apply(&mut self, op: &Operation) -> OperationResult {
        let Some(event) = op.to_event() else {
            if let Operation::AdvanceTime { secs } = op {
                tokio::time::sleep(Duration::from_secs(u64::from(*secs))).await;
            }
            return OperationResult::Accepted;
        };
        classify(self.driver.handle(event).await)
    }

    fn observable_state(&self) -> ObservableState {
        let now = self.env.now();
        let gate = self.driver.gate();
        let text = |path: &str| self.store.peek(path).and_then(|v| v.as_str().map(str::to_string));
        let flag = |path: &str| self.store.peek(path).as_ref().and_then(Value::as_bool);

        ObservableState {
            authenticated: gate.state(now) == GateState::Authenticated,
            locked: gate.state(now) == GateState::Locked,
            attempts: gate.attempts(),
            mode: self.driver.router().current_mode(),
            store: StoreSnapshot {
                mode: text("hid/mode"),
                input_text: text("hid/inputText"),
                ducky_script: text("hid/duckyScript"),
                led_color: text("hid/ledColor"),
                scroll: self.store.peek("hid/mouseData/scroll").as_ref().and_then(Value::as_i64),
                left_click: flag("hid/mouseData/leftClick"),
                right_click: flag("hid/mouseData/rightClick"),
            },
            writes: self.store.writes().len(),
        }
    }
}

fn classify(notice: Notice) -> OperationResult {
    let refused = match notice {
        Notice::Authenticated => return OperationResult::Accepted,
        Notice::Published { .. } => return OperationResult::Published,
        Notice::Rejected(ControlError::Auth(AuthError::LoginRequired { .. })) => OperationError::LoginRequired,
        Notice::Rejected(ControlError::Auth(AuthError::WrongPassword { .. })) => OperationError::WrongPassword,
        Notice::Rejected(ControlError::Auth(AuthError::LockedOut { .. })) => OperationError::LockedOut,
        Notice::Rejected(ControlError::Validation(ValidationError::WrongMode { .. })) => OperationError::WrongMode,
        Notice::Rejected(ControlError::Validation(ValidationError::NothingToSend { .. })) => {
            OperationError::NothingToSend
        },
        other => panic!("unexpected notice: {other:?}"),
    };
    OperationResult::Rejected(refused)
}

/// Runs `ops` against both worlds inside one simulation.
fn run_session(ops: Vec<Operation>) -> Result<(), String> {
    let mut sim = turmoil::Builder::new()
        .simulation_duration(Duration::from_secs(50_000))
        .tick_duration(Duration::from_secs(1))
        .build();

    sim.client("operator", async move {
        let mut model = ModelWorld::new();
        let mut real = RealWorld::new();

        for (i, op) in ops.iter().enumerate() {
            let expected = model.apply(op);
            let actual = real.apply(op).await;
            if expected != actual {
                return Err(format!("result divergence at op {i} {op:?}: model {expected:?}, real {actual:?}").into());
            }

            let expected = model.observable_state();
            let actual = real.observable_state();
            if expected != actual {
                return Err(format!("state divergence at op {i} {op:?}:\nmodel {expected:?}\nreal  {actual:?}").into());
            }
        }
        Ok(())
    });

    sim.run().map_err(|e| e.to_string())
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    let mode = prop_oneof![Just(ModelMode::Typing), Just(ModelMode::Mouse), Just(ModelMode::Ducky)];
    let payload = (any::<u8>(), prop::bool::weighted(0.2)).prop_map(|(seed, blank)| Payload { seed, blank });

    prop_oneof![
        // Weight toward login churn so lockouts are reached
        4 => prop::bool::weighted(0.3).prop_map(|correct| Operation::Login { correct }),
        3 => mode.prop_map(|mode| Operation::SetMode { mode }),
        2 => payload.clone().prop_map(|payload| Operation::Text { payload }),
        2 => payload.prop_map(|payload| Operation::Script { payload }),
        1 => any::<u8>().prop_map(|color| Operation::Led { color }),
        2 => any::<bool>().prop_map(|up| Operation::Scroll { up }),
        1 => any::<bool>().prop_map(|right| Operation::Tap { right }),
        2 => (0u16..400).prop_map(|secs| Operation::AdvanceTime { secs }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Outcomes and observable state match the model after every operation.
    #[test]
    fn prop_model_matches_real(ops in prop::collection::vec(operation_strategy(), 0..40)) {
        let result = run_session(ops);
        prop_assert!(result.is_ok(), "{}", result.unwrap_err());
    }

    /// Nothing reaches the store while the operator is not logged in.
    #[test]
    fn prop_no_writes_before_login(ops in prop::collection::vec(operation_strategy(), 0..40)) {
        let mut model = ModelWorld::new();
        for op in &ops {
            let before = model.observable_state();
            let result = model.apply(op);
            if !before.authenticated && !matches!(op, Operation::Login { correct: true }) {
                prop_assert_eq!(model.observable_state().writes, before.writes);
                prop_assert!(!matches!(result, OperationResult::Published));
            }
        }
    }
}

#[test]
fn lockout_session_matches_model() {
    let mut ops = vec![Operation::Login { correct: false }; 5];
    ops.push(Operation::Login { correct: true });
    ops.push(Operation::AdvanceTime { secs: 299 });
    ops.push(Operation::Login { correct: true });
    ops.push(Operation::AdvanceTime { secs: 1 });
    ops.push(Operation::Login { correct: true });
    ops.push(Operation::SetMode { mode: ModelMode::Mouse });
    ops.push(Operation::Scroll { up: true });
    ops.push(Operation::Scroll { up: true });

    run_session(ops).unwrap();
}
