//! Mode router.
//!
//! The operator's UI is the only writer of the mode, so the local value is
//! authoritative and the store copy is a downstream mirror for the device.
//! `current_mode()` never consults the store.
//!
//! Every `set_mode` produces a write, even when the mode did not change. The
//! device side treats the mode as an idempotent overwrite, and re-asserting
//! it on each interaction heals a mirror that some other writer clobbered.

use smarthid_proto::{HidPath, OperationMode};

use crate::{
    error::{CommandKind, ValidationError},
    store::StoreWrite,
};

/// Single source of truth for the active operation mode.
#[derive(Debug, Clone, Default)]
pub struct ModeRouter {
    current: OperationMode,
}

impl ModeRouter {
    /// Starts in `initial` without writing anything.
    pub fn new(initial: OperationMode) -> Self {
        Self { current: initial }
    }

    /// Locally active mode.
    pub fn current_mode(&self) -> OperationMode {
        self.current
    }

    /// Switches mode and returns the mirror write, unconditionally.
    pub fn set_mode(&mut self, mode: OperationMode) -> StoreWrite {
        if mode != self.current {
            tracing::info!(from = %self.current, to = %mode, "operation mode changed");
        }
        self.current = mode;
        self.mirror()
    }

    /// Write that re-asserts the current mode in the store.
    pub fn mirror(&self) -> StoreWrite {
        StoreWrite::Set { path: HidPath::Mode, value: serde_json::Value::from(self.current.label()) }
    }

    /// True when a command for `target` may be published now.
    pub fn is_allowed(&self, target: OperationMode) -> bool {
        self.current == target
    }

    /// Like [`ModeRouter::is_allowed`], but yields the operator-facing
    /// rejection.
    ///
    /// # Errors
    ///
    /// `WrongMode` when `target` is not the active mode.
    pub fn require(&self, command: CommandKind, target: OperationMode) -> Result<(), ValidationError> {
        if self.is_allowed(target) {
            return Ok(());
        }
        Err(ValidationError::WrongMode { command, required: target, current: self.current })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_to_typing() {
        assert_eq!(ModeRouter::default().current_mode(), OperationMode::Typing);
    }

    #[test]
    fn set_mode_always_writes() {
        let mut router = ModeRouter::default();

        let first = router.set_mode(OperationMode::Typing);
        let second = router.set_mode(OperationMode::Typing);

        let expected = StoreWrite::Set { path: HidPath::Mode, value: json!("Typing Mode") };
        assert_eq!(first, expected);
        assert_eq!(second, expected);
    }

    #[test]
    fn set_mode_updates_local_state() {
        let mut router = ModeRouter::default();
        router.set_mode(OperationMode::Ducky);
        assert_eq!(router.current_mode(), OperationMode::Ducky);
        assert_eq!(router.mirror(), StoreWrite::Set { path: HidPath::Mode, value: json!("Ducky Mode") });
    }

    #[test]
    fn only_matching_mode_is_allowed() {
        for active in OperationMode::ALL {
            let router = ModeRouter::new(active);
            for target in OperationMode::ALL {
                assert_eq!(router.is_allowed(target), active == target);
            }
        }
    }

    #[test]
    fn require_reports_both_modes() {
        let router = ModeRouter::new(OperationMode::Mouse);
        let err = router.require(CommandKind::Text, OperationMode::Typing);
        assert_eq!(
            err,
            Err(ValidationError::WrongMode {
                command: CommandKind::Text,
                required: OperationMode::Typing,
                current: OperationMode::Mouse,
            })
        );
    }
}
