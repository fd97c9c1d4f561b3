//! Operation mode.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ProtoError;

/// Which command family the device currently accepts.
///
/// Serialized as the human-readable labels the firmware matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperationMode {
    /// Keyboard text entry.
    #[default]
    #[serde(rename = "Typing Mode")]
    Typing,
    /// Pointer control.
    #[serde(rename = "Mouse Mode")]
    Mouse,
    /// Ducky script execution.
    #[serde(rename = "Ducky Mode")]
    Ducky,
}

impl OperationMode {
    /// All modes, in the order the dashboard lists them.
    pub const ALL: [Self; 3] = [Self::Typing, Self::Mouse, Self::Ducky];

    /// Wire label stored at `hid/mode`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Typing => "Typing Mode",
            Self::Mouse => "Mouse Mode",
            Self::Ducky => "Ducky Mode",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the wire label or the short operator spelling (`typing`, `mouse`,
/// `ducky`), case-insensitively.
impl FromStr for OperationMode {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let short = normalized.strip_suffix(" mode").unwrap_or(&normalized);
        match short {
            "typing" => Ok(Self::Typing),
            "mouse" => Ok(Self::Mouse),
            "ducky" => Ok(Self::Ducky),
            _ => Err(ProtoError::UnknownMode(s.to_string())),
        }
    }
}
