//! SmartHID control plane.
//!
//! Synchronizes operator input with the shared store the SmartHID device
//! polls. The state machines here are Sans-IO: they take the current instant
//! and return [`StoreWrite`]s. Only [`ControlDriver`] and the presence monitor
//! perform I/O, through the [`SharedStore`] and [`Environment`] traits.
//!
//! ## Architecture
//!
//! ```text
//! smarthid-core
//!   ├─ SessionGate        (login attempts + lockout)
//!   ├─ ModeRouter         (active mode, store mirror)
//!   ├─ MouseCoalescer     (move sampling, click release timers)
//!   ├─ CommandPublisher   (text, script, LED, scroll, quick click)
//!   ├─ presence           (heartbeat liveness + polling task)
//!   ├─ ControlDriver      (executes writes in event order)
//!   └─ store              (SharedStore, MemoryStore, ChaoticStore)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod coalescer;
pub mod driver;
pub mod env;
pub mod error;
pub mod gate;
pub mod presence;
pub mod publisher;
pub mod router;
pub mod store;

pub use coalescer::{CoalescerConfig, MouseCoalescer};
pub use driver::{ControlConfig, ControlDriver, ControlEvent, Notice};
pub use env::Environment;
pub use error::{AuthError, CommandKind, ControlError, ErrorKind, ValidationError};
pub use gate::{GateState, LockoutPolicy, Secret, SessionGate};
pub use presence::{Presence, PresenceConfig, STALE_THRESHOLD, is_live, observe, run_presence_monitor};
pub use publisher::{CommandPublisher, read_mouse_state};
pub use router::ModeRouter;
pub use store::{
    ChaoticStore, MemoryStore, SeedReport, SharedStore, StoreError, StoreOp, StoreWrite, seed_defaults,
};
