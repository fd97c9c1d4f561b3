//! Operations for model-based testing.
//!
//! Operations are generated by proptest (or decoded from fuzz input via
//! `Arbitrary`) and applied to both the model and the real driver.

use arbitrary::Arbitrary;
use smarthid_core::ControlEvent;
use smarthid_proto::{MouseButton, OperationMode, ScrollDirection, led::PALETTE};

/// Password the real driver is configured with.
pub const PASSWORD: &str = "open sesame";

/// Operator actions plus the passage of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Submit the right or a wrong password.
    Login {
        /// Whether the password is correct.
        correct: bool,
    },
    /// Select a mode.
    SetMode {
        /// Target mode.
        mode: ModelMode,
    },
    /// Send keyboard text.
    Text {
        /// Payload.
        payload: Payload,
    },
    /// Send a ducky script.
    Script {
        /// Payload.
        payload: Payload,
    },
    /// Set the LED.
    Led {
        /// Color choice, see [`led_input`].
        color: u8,
    },
    /// Scroll pulse.
    Scroll {
        /// Direction.
        up: bool,
    },
    /// Quick-action press.
    Tap {
        /// Right button instead of left.
        right: bool,
    },
    /// Let time pass.
    AdvanceTime {
        /// Seconds to advance.
        secs: u16,
    },
}

/// Mode choice, mirrored so `Arbitrary` can be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelMode {
    /// Typing.
    Typing,
    /// Mouse.
    Mouse,
    /// Ducky.
    Ducky,
}

impl From<ModelMode> for OperationMode {
    fn from(mode: ModelMode) -> Self {
        match mode {
            ModelMode::Typing => Self::Typing,
            ModelMode::Mouse => Self::Mouse,
            ModelMode::Ducky => Self::Ducky,
        }
    }
}

/// Compact text payload: padded content, or whitespace only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct Payload {
    /// Distinguishes payloads.
    pub seed: u8,
    /// Whitespace-only payload.
    pub blank: bool,
}

impl Payload {
    /// Raw operator input, padded so trimming matters.
    pub fn input(&self) -> String {
        if self.blank { " \t \n".to_string() } else { format!("  payload {} \n", self.seed) }
    }
}

/// Operator LED input for `color`: palette tokens in lower case, or a hex
/// color.
pub fn led_input(color: u8) -> String {
    let index = usize::from(color) % (PALETTE.len() + 1);
    match PALETTE.get(index) {
        Some(token) => token.to_ascii_lowercase(),
        None => format!("#{color:02X}A0{color:02x}"),
    }
}

impl Operation {
    /// Control event for the real driver; `None` for time advances.
    pub fn to_event(&self) -> Option<ControlEvent> {
        let event = match *self {
            Self::Login { correct } => ControlEvent::Login {
                password: if correct { PASSWORD.to_string() } else { format!("{PASSWORD}!") },
            },
            Self::SetMode { mode } => ControlEvent::SetMode(mode.into()),
            Self::Text { payload } => ControlEvent::Text(payload.input()),
            Self::Script { payload } => ControlEvent::Script(payload.input()),
            Self::Led { color } => ControlEvent::Led(led_input(color)),
            Self::Scroll { up } => {
                ControlEvent::Scroll(if up { ScrollDirection::Up } else { ScrollDirection::Down })
            },
            Self::Tap { right } => {
                ControlEvent::QuickClick(if right { MouseButton::Right } else { MouseButton::Left })
            },
            Self::AdvanceTime { .. } => return None,
        };
        Some(event)
    }
}

/// Result of applying an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// A write reached the store.
    Published,
    /// Login accepted or time advanced.
    Accepted,
    /// Refused.
    Rejected(OperationError),
}

/// Expected refusals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Not logged in yet.
    LoginRequired,
    /// Wrong password.
    WrongPassword,
    /// Lockout active.
    LockedOut,
    /// Command for another mode.
    WrongMode,
    /// Blank payload.
    NothingToSend,
}
