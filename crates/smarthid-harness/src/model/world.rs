//! Model world: the oracle for one operator session.
//!
//! Tracks the gate, the active mode and the store paths the control plane
//! writes, with plain integers for time.

use std::time::Duration;

use smarthid_proto::OperationMode;

use super::operation::{Operation, OperationError, OperationResult, led_input};

/// Failures that trigger a lockout.
pub const MAX_ATTEMPTS: u32 = 5;

/// Lockout length.
pub const LOCKOUT: Duration = Duration::from_secs(300);

/// Store contents the control plane is responsible for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// `hid/mode`
    pub mode: Option<String>,
    /// `hid/inputText`
    pub input_text: Option<String>,
    /// `hid/duckyScript`
    pub ducky_script: Option<String>,
    /// `hid/ledColor`
    pub led_color: Option<String>,
    /// `hid/mouseData/scroll`
    pub scroll: Option<i64>,
    /// `hid/mouseData/leftClick`
    pub left_click: Option<bool>,
    /// `hid/mouseData/rightClick`
    pub right_click: Option<bool>,
}

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Logged in.
    pub authenticated: bool,
    /// Lockout active now.
    pub locked: bool,
    /// Failed attempts since the last success.
    pub attempts: u32,
    /// Locally active mode.
    pub mode: OperationMode,
    /// What the store holds.
    pub store: StoreSnapshot,
    /// Number of writes that reached the store.
    pub writes: usize,
}

/// Reference implementation of the control plane.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    now: Duration,
    authenticated: bool,
    attempts: u32,
    lockout_until: Option<Duration>,
    mode: OperationMode,
    store: StoreSnapshot,
    writes: usize,
}

impl Default for ModelWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelWorld {
    /// Fresh session: typing mode, not logged in, empty store.
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            authenticated: false,
            attempts: 0,
            lockout_until: None,
            mode: OperationMode::Typing,
            store: StoreSnapshot::default(),
            writes: 0,
        }
    }

    /// Model time since the session began.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Applies an operation and returns the expected outcome.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        if let Operation::AdvanceTime { secs } = *op {
            self.now += Duration::from_secs(u64::from(secs));
            return OperationResult::Accepted;
        }

        if let Operation::Login { correct } = *op {
            return self.login(correct);
        }

        if !self.authenticated {
            return if self.locked() {
                OperationResult::Rejected(OperationError::LockedOut)
            } else {
                OperationResult::Rejected(OperationError::LoginRequired)
            };
        }

        match self.command(op) {
            Ok(()) => {
                self.writes += 1;
                OperationResult::Published
            },
            Err(refused) => refused,
        }
    }

    /// Snapshot for comparison against the real driver.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            authenticated: self.authenticated,
            locked: !self.authenticated && self.locked(),
            attempts: self.attempts,
            mode: self.mode,
            store: self.store.clone(),
            writes: self.writes,
        }
    }

    fn command(&mut self, op: &Operation) -> Result<(), OperationResult> {
        match *op {
            Operation::SetMode { mode } => {
                self.mode = mode.into();
                self.store.mode = Some(self.mode.label().to_string());
            },
            Operation::Text { payload } => {
                self.require(OperationMode::Typing)?;
                self.store.input_text = Some(Self::trimmed(&payload.input())?);
            },
            Operation::Script { payload } => {
                self.require(OperationMode::Ducky)?;
                self.store.ducky_script = Some(Self::trimmed(&payload.input())?);
            },
            Operation::Led { color } => {
                let input = led_input(color);
                let stored = if input.starts_with('#') { input } else { input.to_ascii_uppercase() };
                self.store.led_color = Some(stored);
            },
            Operation::Scroll { up } => {
                self.require(OperationMode::Mouse)?;
                self.store.scroll = Some(if up { 1 } else { -1 });
            },
            Operation::Tap { right } => {
                self.require(OperationMode::Mouse)?;
                self.store.left_click = Some(!right);
                self.store.right_click = Some(right);
            },
            Operation::Login { .. } | Operation::AdvanceTime { .. } => {},
        }
        Ok(())
    }

    fn login(&mut self, correct: bool) -> OperationResult {
        if !self.authenticated {
            if self.locked() {
                return OperationResult::Rejected(OperationError::LockedOut);
            }
            if !correct {
                self.attempts += 1;
                if self.attempts >= MAX_ATTEMPTS {
                    self.lockout_until = Some(self.now + LOCKOUT);
                }
                return OperationResult::Rejected(OperationError::WrongPassword);
            }
            self.authenticated = true;
            self.attempts = 0;
            self.lockout_until = None;
        }

        // Every accepted login re-asserts the mode.
        self.store.mode = Some(self.mode.label().to_string());
        self.writes += 1;
        OperationResult::Accepted
    }

    fn locked(&self) -> bool {
        self.lockout_until.is_some_and(|until| self.now < until)
    }

    fn require(&self, mode: OperationMode) -> Result<(), OperationResult> {
        if self.mode == mode { Ok(()) } else { Err(OperationResult::Rejected(OperationError::WrongMode)) }
    }

    fn trimmed(input: &str) -> Result<String, OperationResult> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(OperationResult::Rejected(OperationError::NothingToSend));
        }
        Ok(trimmed.to_string())
    }
}
