//! SmartHID operator bridge.
//!
//! Production wiring for the control plane:
//! - REST transport to the shared store
//! - Tokio runtime and system clocks
//! - Line-oriented operator console
//!
//! ## Architecture
//!
//! ```text
//! smarthid-bridge
//!   ├─ SystemEnv          (production Environment impl)
//!   ├─ RestStore          (GET/PUT/PATCH on <base>/<path>.json)
//!   ├─ console            (stdin commands -> ControlEvent)
//!   ├─ ControlDriver      (from smarthid-core)
//!   └─ presence monitor   (from smarthid-core)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod console;
mod error;
mod rest_store;
mod system_env;

use std::sync::Arc;

pub use config::Args;
pub use console::{ConsoleCommand, ParseError, describe_presence, run_console};
pub use error::BridgeError;
pub use rest_store::RestStore;
use smarthid_core::{ControlDriver, ControlEvent, Notice, Presence, SharedStore, run_presence_monitor, seed_defaults};
pub use system_env::SystemEnv;
use tokio::{
    io::AsyncBufRead,
    sync::{mpsc, watch},
};
use tokio_util::sync::CancellationToken;

/// Seeds the store, starts the presence monitor and control driver, and
/// serves console `input` until it ends or `shutdown` fires.
///
/// Pending click releases are flushed before this returns.
pub async fn serve<S, R>(args: &Args, store: Arc<S>, input: R, shutdown: CancellationToken) -> Result<(), BridgeError>
where
    S: SharedStore + 'static,
    R: AsyncBufRead + Unpin,
{
    let report = seed_defaults(store.as_ref()).await.map_err(BridgeError::Seed)?;
    tracing::info!(seeded = report.seeded.len(), existing = report.existing.len(), "store ready");

    let env = SystemEnv::new();
    let (presence_tx, presence_rx) = watch::channel(Presence::Unknown);
    let monitor = tokio::spawn(run_presence_monitor(
        env,
        Arc::clone(&store),
        args.presence(),
        presence_tx,
        shutdown.clone(),
    ));

    let (event_tx, event_rx) = mpsc::channel::<ControlEvent>(256);
    let (notice_tx, notice_rx) = mpsc::channel::<Notice>(256);
    let driver = ControlDriver::new(env, store, args.secret(), args.control());
    let driver = tokio::spawn(driver.run(event_rx, notice_tx, shutdown.clone()));
    let reporter = tokio::spawn(report_notices(notice_rx));

    let console = run_console(input, event_tx, presence_rx, shutdown.clone()).await;
    shutdown.cancel();

    for (name, task) in [("presence monitor", monitor), ("control driver", driver), ("notice reporter", reporter)] {
        if let Err(e) = task.await {
            tracing::error!(task = name, error = %e, "task ended abnormally");
        }
    }

    console
}

/// Logs each notice at a level matching its outcome.
async fn report_notices(mut notices: mpsc::Receiver<Notice>) {
    while let Some(notice) = notices.recv().await {
        match &notice {
            Notice::Buffered { x, y } => tracing::trace!(x, y, "pointer buffered"),
            // Rejections are already logged by the driver with their kind.
            Notice::Rejected(_) => {},
            _ => tracing::info!("{notice}"),
        }
    }
}
