//! Line-oriented operator console.
//!
//! One command per line:
//!
//! ```text
//! login <password>        mode typing|mouse|ducky
//! text <text>             script <script>   (\n becomes a newline)
//! led <token|#RRGGBB>     move <x> <y>
//! click left|right        tap left|right
//! scroll up|down          coords
//! status                  help
//! quit
//! ```

use std::str::FromStr;

use smarthid_core::{ControlEvent, Presence};
use smarthid_proto::{MouseButton, OperationMode, ProtoError, ScrollDirection};
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::{mpsc, watch},
};
use tokio_util::sync::CancellationToken;

use crate::error::BridgeError;

/// Usage summary printed for `help` and unknown commands.
pub const USAGE: &str = "commands: login <pw> | mode typing|mouse|ducky | text <s> | script <s> | \
                         led <color> | move <x> <y> | click left|right | tap left|right | \
                         scroll up|down | coords | status | help | quit";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Forward to the control driver.
    Control(ControlEvent),
    /// Report device presence.
    Status,
    /// Show usage.
    Help,
    /// Stop the bridge.
    Quit,
}

/// Console input that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Command word not recognized.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    /// Command needs an argument.
    #[error("{command} expects {expected}")]
    MissingArgument {
        /// Command word.
        command: &'static str,
        /// Argument description.
        expected: &'static str,
    },

    /// Coordinate is not a number.
    #[error("invalid coordinate {0:?}")]
    InvalidNumber(String),

    /// Mode, button or direction not recognized.
    #[error(transparent)]
    Invalid(#[from] ProtoError),
}

impl FromStr for ConsoleCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_start();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let arg = rest.trim();

        let event = match word.to_ascii_lowercase().as_str() {
            // Only the separator is consumed; the password may contain spaces.
            "login" => ControlEvent::Login { password: required(rest, "login", "a password")?.to_string() },
            "mode" => ControlEvent::SetMode(required(arg, "mode", "typing, mouse or ducky")?.parse::<OperationMode>()?),
            "text" => ControlEvent::Text(rest.to_string()),
            "script" => ControlEvent::Script(rest.replace("\\n", "\n")),
            "led" => ControlEvent::Led(required(arg, "led", "a color")?.to_string()),
            "move" => {
                let mut coords = arg.split_whitespace();
                let (Some(x), Some(y)) = (coords.next(), coords.next()) else {
                    return Err(ParseError::MissingArgument { command: "move", expected: "<x> <y>" });
                };
                ControlEvent::PointerMove { x: coordinate(x)?, y: coordinate(y)? }
            },
            "click" => ControlEvent::Click(required(arg, "click", "left or right")?.parse::<MouseButton>()?),
            "tap" => ControlEvent::QuickClick(required(arg, "tap", "left or right")?.parse::<MouseButton>()?),
            "scroll" => ControlEvent::Scroll(required(arg, "scroll", "up or down")?.parse::<ScrollDirection>()?),
            "coords" => ControlEvent::ReadMouse,
            "status" => return Ok(Self::Status),
            "help" | "?" => return Ok(Self::Help),
            "quit" | "exit" => return Ok(Self::Quit),
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };

        Ok(Self::Control(event))
    }
}

fn required<'a>(arg: &'a str, command: &'static str, expected: &'static str) -> Result<&'a str, ParseError> {
    if arg.is_empty() {
        return Err(ParseError::MissingArgument { command, expected });
    }
    Ok(arg)
}

fn coordinate(raw: &str) -> Result<f64, ParseError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber(raw.to_string()))
}

/// Operator-facing presence line.
pub fn describe_presence(presence: &Presence) -> String {
    match presence {
        Presence::Unknown => "device status not polled yet".to_string(),
        Presence::Online { last_seen } => format!("device online (last seen {last_seen})"),
        Presence::Offline { last_seen: Some(last_seen) } => {
            format!("device offline (last seen {last_seen})")
        },
        Presence::Offline { last_seen: None } => "device offline (never seen)".to_string(),
        Presence::Error { reason } => format!("device status unavailable: {reason}"),
    }
}

/// Reads commands from `input` until EOF, `quit`, or `shutdown`.
///
/// Control commands are forwarded to the driver; `quit` cancels `shutdown`
/// so every task winds down.
pub async fn run_console<R>(
    input: R,
    events: mpsc::Sender<ControlEvent>,
    presence: watch::Receiver<Presence>,
    shutdown: CancellationToken,
) -> Result<(), BridgeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            tracing::info!("console input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::Control(event)) => {
                if events.send(event).await.is_err() {
                    tracing::warn!("control driver stopped, closing console");
                    break;
                }
            },
            Ok(ConsoleCommand::Status) => {
                tracing::info!("{}", describe_presence(&presence.borrow()));
            },
            Ok(ConsoleCommand::Help) => tracing::info!("{USAGE}"),
            Ok(ConsoleCommand::Quit) => {
                tracing::info!("quit requested");
                shutdown.cancel();
                break;
            },
            Err(err) => tracing::warn!(error = %err, "{USAGE}"),
        }
    }

    Ok(())
}
