//! Store paths and first-run defaults.
//!
//! The firmware polls these exact keys. Renaming any of them breaks the
//! device side silently, which is why they are a closed enum rather than
//! free-form strings.

use std::fmt;

use serde_json::{Value, json};

/// Root under which every SmartHID key lives.
pub const ROOT: &str = "hid";

/// Every path the control plane reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HidPath {
    /// Text typed by the device in Typing Mode.
    InputText,
    /// Pointer state consumed in Mouse Mode.
    MouseData,
    /// The `scroll` field of [`HidPath::MouseData`], written on its own.
    MouseScroll,
    /// Ducky script executed in Ducky Mode.
    DuckyScript,
    /// Active operation mode.
    Mode,
    /// Status LED color.
    LedColor,
    /// Device heartbeat, written by the firmware.
    Status,
}

impl HidPath {
    /// Top-level paths that receive a default on first run, in seeding order.
    pub const SEEDED: [Self; 6] = [
        Self::InputText,
        Self::MouseData,
        Self::DuckyScript,
        Self::Mode,
        Self::LedColor,
        Self::Status,
    ];

    /// Full slash-separated store key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputText => "hid/inputText",
            Self::MouseData => "hid/mouseData",
            Self::MouseScroll => "hid/mouseData/scroll",
            Self::DuckyScript => "hid/duckyScript",
            Self::Mode => "hid/mode",
            Self::LedColor => "hid/ledColor",
            Self::Status => "hid/status",
        }
    }

    /// Value written when the path is absent on first run.
    ///
    /// Returns `None` for [`HidPath::MouseScroll`], which is seeded as part of
    /// [`HidPath::MouseData`].
    pub fn default_value(self) -> Option<Value> {
        let value = match self {
            Self::InputText | Self::DuckyScript => json!(""),
            Self::MouseData => json!({
                "x": 0,
                "y": 0,
                "click": false,
                "leftClick": false,
                "rightClick": false,
                "scroll": 0,
            }),
            Self::Mode => json!("Typing Mode"),
            Self::LedColor => json!("OFF"),
            Self::Status => json!({ "online": false }),
            Self::MouseScroll => return None,
        };
        Some(value)
    }
}

impl fmt::Display for HidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
