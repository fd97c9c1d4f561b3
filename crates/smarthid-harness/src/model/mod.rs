//! Reference model for model-based testing.
//!
//! The model captures what one operator session must do to the store without
//! any async machinery: a counter and a deadline for the gate, a field for
//! the mode, and the last value of each path. It is the oracle the real
//! driver is checked against.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Deterministic: Same inputs produce same outputs
//! - Time is explicit: only `AdvanceTime` moves the clock

pub mod operation;
mod world;

pub use operation::{ModelMode, Operation, OperationError, OperationResult, PASSWORD, Payload, led_input};
pub use world::{LOCKOUT, MAX_ATTEMPTS, ModelWorld, ObservableState, StoreSnapshot};
