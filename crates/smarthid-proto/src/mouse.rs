//! Pointer state as the device observes it.
//!
//! The control plane never writes the whole `hid/mouseData` object after
//! seeding. It sends top-level partial updates ([`MousePatch`]) and, for
//! scroll, a direct write to the `scroll` child. [`MouseState`] is the
//! defensive read-side view of whatever the store currently holds.

use std::{fmt, str::FromStr};

use serde_json::{Map, Value};

use crate::ProtoError;

/// Physical mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary (context menu) button.
    Right,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

impl FromStr for MouseButton {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Self::Left),
            "right" | "r" => Ok(Self::Right),
            _ => Err(ProtoError::UnknownButton(s.to_string())),
        }
    }
}

/// One scroll notch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Written as `1`.
    Up,
    /// Written as `-1`.
    Down,
}

impl ScrollDirection {
    /// Value stored at `hid/mouseData/scroll`.
    pub const fn delta(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl FromStr for ScrollDirection {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(ProtoError::UnknownScroll(s.to_string())),
        }
    }
}

/// Full pointer state stored at `hid/mouseData`.
///
/// Read field by field with [`MouseState::from_store`] rather than through
/// serde: concurrent partial writers give no shape guarantee, and one
/// mistyped field must fall back to its default without discarding the rest.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouseState {
    /// Horizontal position in canvas pixels.
    pub x: f64,
    /// Vertical position in canvas pixels.
    pub y: f64,
    /// True while either button is down.
    pub click: bool,
    /// Left button state.
    pub left_click: bool,
    /// Right button state.
    pub right_click: bool,
    /// Pending scroll pulse.
    pub scroll: i64,
}

impl MouseState {
    /// Reads a store value, tolerating absent or malformed fields.
    pub fn from_store(value: Option<&Value>) -> Self {
        let Some(Value::Object(fields)) = value else {
            return Self::default();
        };

        let number = |key: &str| fields.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        let flag = |key: &str| fields.get(key).and_then(Value::as_bool).unwrap_or(false);

        Self {
            x: number("x"),
            y: number("y"),
            click: flag("click"),
            left_click: flag("leftClick"),
            right_click: flag("rightClick"),
            scroll: fields.get("scroll").and_then(Value::as_i64).unwrap_or(0),
        }
    }
}

/// Top-level partial update merged into `hid/mouseData`.
///
/// Only the constructors below exist, and each one derives `click` from the
/// button flags it sets, so a patch can never violate
/// `click == leftClick || rightClick`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MousePatch {
    position: Option<(f64, f64)>,
    left_click: bool,
    right_click: bool,
}

impl MousePatch {
    /// Pointer moved; both buttons reported up.
    pub const fn moved(x: f64, y: f64) -> Self {
        Self { position: Some((x, y)), left_click: false, right_click: false }
    }

    /// Button pressed.
    pub const fn pressed(button: MouseButton) -> Self {
        Self {
            position: None,
            left_click: matches!(button, MouseButton::Left),
            right_click: matches!(button, MouseButton::Right),
        }
    }

    /// Both buttons released.
    pub const fn released() -> Self {
        Self { position: None, left_click: false, right_click: false }
    }

    /// Derived `click` flag.
    pub const fn click(&self) -> bool {
        self.left_click || self.right_click
    }

    /// Position carried by this patch, if any.
    pub const fn position(&self) -> Option<(f64, f64)> {
        self.position
    }

    /// Field map for a top-level `update`.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some((x, y)) = self.position {
            fields.insert("x".to_string(), coordinate(x));
            fields.insert("y".to_string(), coordinate(y));
        }
        fields.insert("click".to_string(), Value::Bool(self.click()));
        fields.insert("leftClick".to_string(), Value::Bool(self.left_click));
        fields.insert("rightClick".to_string(), Value::Bool(self.right_click));
        fields
    }
}

/// Whole-pixel coordinates are written as integers; the firmware parses both.
#[allow(clippy::cast_possible_truncation)]
fn coordinate(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        return Value::from(v as i64);
    }
    serde_json::Number::from_f64(v).map_or(Value::from(0), Value::Number)
}
