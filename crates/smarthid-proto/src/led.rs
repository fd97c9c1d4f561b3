//! LED color command.

use std::{fmt, str::FromStr};

use serde_json::Value;

use crate::ProtoError;

/// Named colors the firmware knows.
pub const PALETTE: [&str; 6] = ["OFF", "RED", "GREEN", "BLUE", "YELLOW", "WHITE"];

/// Value for `hid/ledColor`.
///
/// Palette tokens are normalized to upper case. Hex colors are passed through
/// exactly as entered once they are known to be `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedColor {
    /// One of [`PALETTE`].
    Named(&'static str),
    /// `#RRGGBB`.
    Rgb(String),
}

impl LedColor {
    /// Default color seeded on first run.
    pub const OFF: Self = Self::Named("OFF");

    /// The stored string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(token) => token,
            Self::Rgb(hex) => hex,
        }
    }

    /// Store value.
    pub fn to_value(&self) -> Value {
        Value::String(self.as_str().to_string())
    }
}

impl FromStr for LedColor {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(digits) = trimmed.strip_prefix('#') {
            if digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Ok(Self::Rgb(trimmed.to_string()));
            }
            return Err(ProtoError::InvalidLedColor(s.to_string()));
        }

        PALETTE
            .iter()
            .find(|token| token.eq_ignore_ascii_case(trimmed))
            .map(|token| Self::Named(*token))
            .ok_or_else(|| ProtoError::InvalidLedColor(s.to_string()))
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
