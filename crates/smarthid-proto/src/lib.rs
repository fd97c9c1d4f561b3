//! SmartHID shared-store vocabulary.
//!
//! Everything the device firmware and the control plane agree on lives here:
//! the store paths, the JSON shape of each value, and the defaults seeded on
//! first run. The store is the only transport between the two sides, so these
//! keys and encodings are bit-exact.
//!
//! # Layout
//!
//! ```text
//! hid/
//!   ├─ inputText     string
//!   ├─ mouseData     { x, y, click, leftClick, rightClick, scroll }
//!   ├─ duckyScript   string
//!   ├─ mode          "Typing Mode" | "Mouse Mode" | "Ducky Mode"
//!   ├─ ledColor      palette token | "#RRGGBB"
//!   └─ status        { online, lastSeen }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod heartbeat;
pub mod led;
pub mod mode;
pub mod mouse;
pub mod paths;

pub use error::ProtoError;
pub use heartbeat::HeartbeatStatus;
pub use led::LedColor;
pub use mode::OperationMode;
pub use mouse::{MouseButton, MousePatch, MouseState, ScrollDirection};
pub use paths::HidPath;
