//! Deterministic simulation harness for the SmartHID control plane.
//!
//! Turmoil drives every host on a virtual clock, so coalescing windows,
//! click releases, lockouts and heartbeat staleness can be exercised to the
//! millisecond without waiting in real time.
//!
//! - [`SimEnv`]: `Environment` on turmoil's virtual clock
//! - [`SimDevice`]: firmware stand-in publishing heartbeats
//! - [`RecordingStore`]: timestamps every store operation
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation. Operations are
//! applied to both the model and the real driver, and their observable
//! states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod device;
pub mod model;
pub mod recording;
pub mod sim_env;

pub use device::{DeviceConfig, SimDevice};
pub use model::{ModelWorld, ObservableState, Operation, OperationError, OperationResult};
pub use recording::{Recorded, RecordingStore};
pub use sim_env::SimEnv;
