//! Command publishers.
//!
//! Validate operator input against the active mode and turn it into a
//! [`StoreWrite`]. Nothing here touches the store, so a rejected command is
//! guaranteed to leave it unchanged.
//!
//! Text and script are overwritten whole and trimmed first. The device polls
//! the value, so publishing the same text twice is indistinguishable from
//! publishing it once; an operator who wants it typed again must change it.

use serde_json::Value;
use smarthid_proto::{HidPath, LedColor, MouseButton, MousePatch, MouseState, OperationMode, ScrollDirection};

use crate::{
    coalescer::mouse_write,
    error::{CommandKind, ValidationError},
    router::ModeRouter,
    store::{SharedStore, StoreError, StoreWrite},
};

/// Stateless validators that map commands to store writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandPublisher;

impl CommandPublisher {
    /// Text for the device to type.
    ///
    /// # Errors
    ///
    /// `WrongMode` outside typing mode, `NothingToSend` for blank input.
    pub fn text(router: &ModeRouter, text: &str) -> Result<StoreWrite, ValidationError> {
        Self::payload(router, CommandKind::Text, OperationMode::Typing, HidPath::InputText, text)
    }

    /// Ducky script for the device to execute.
    ///
    /// # Errors
    ///
    /// `WrongMode` outside ducky mode, `NothingToSend` for blank input.
    pub fn script(router: &ModeRouter, script: &str) -> Result<StoreWrite, ValidationError> {
        Self::payload(router, CommandKind::Script, OperationMode::Ducky, HidPath::DuckyScript, script)
    }

    /// LED color. Allowed in every mode.
    ///
    /// # Errors
    ///
    /// `Invalid` when `color` is neither a palette token nor `#RRGGBB`.
    pub fn led(color: &str) -> Result<StoreWrite, ValidationError> {
        let color: LedColor = color.parse()?;
        Ok(StoreWrite::Set { path: HidPath::LedColor, value: color.to_value() })
    }

    /// One scroll pulse. Overwrites the scroll field with ±1.
    ///
    /// # Errors
    ///
    /// `WrongMode` outside mouse mode.
    pub fn scroll(router: &ModeRouter, direction: ScrollDirection) -> Result<StoreWrite, ValidationError> {
        router.require(CommandKind::Scroll, OperationMode::Mouse)?;
        Ok(StoreWrite::Set { path: HidPath::MouseScroll, value: Value::from(direction.delta()) })
    }

    /// Quick-action button press. Unlike a coalesced click, no release is
    /// scheduled; the device consumes the press on its own.
    ///
    /// # Errors
    ///
    /// `WrongMode` outside mouse mode.
    pub fn quick_click(router: &ModeRouter, button: MouseButton) -> Result<StoreWrite, ValidationError> {
        router.require(CommandKind::QuickClick, OperationMode::Mouse)?;
        Ok(mouse_write(MousePatch::pressed(button)))
    }

    fn payload(
        router: &ModeRouter,
        command: CommandKind,
        mode: OperationMode,
        path: HidPath,
        raw: &str,
    ) -> Result<StoreWrite, ValidationError> {
        router.require(command, mode)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::NothingToSend { command });
        }
        Ok(StoreWrite::Set { path, value: Value::from(trimmed) })
    }
}

/// Reads back what the store currently holds for the mouse.
///
/// Missing fields read as their defaults, so a half-written or absent record
/// still yields a usable state.
///
/// # Errors
///
/// Propagates the store read failure.
pub async fn read_mouse_state<S: SharedStore + ?Sized>(store: &S) -> Result<MouseState, StoreError> {
    let value = store.get(HidPath::MouseData.as_str()).await?;
    Ok(MouseState::from_store(value.as_ref()))
}
