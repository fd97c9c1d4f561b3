//! SmartHID bridge binary.
//!
//! # Usage
//!
//! ```bash
//! SMARTHID_PASSWORD=... smarthid-bridge \
//!     --database-url https://<db>.firebaseio.com \
//!     --auth-token <token>
//! ```
//!
//! Then type commands on stdin (`help` lists them).

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use smarthid_bridge::{Args, RestStore, serve};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("SmartHID bridge starting");
    tracing::debug!(?args, "configuration");

    let store = match RestStore::new(&args.database_url, args.auth_token.clone(), args.request_timeout()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "cannot start");
            return ExitCode::FAILURE;
        },
    };

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            on_signal.cancel();
        }
    });

    let input = BufReader::new(tokio::io::stdin());
    match serve(&args, store, input, shutdown).await {
        Ok(()) => {
            tracing::info!("SmartHID bridge stopped");
            ExitCode::SUCCESS
        },
        Err(e) if e.is_fatal() => {
            tracing::error!(error = %e, "cannot start");
            ExitCode::FAILURE
        },
        Err(e) => {
            tracing::warn!(error = %e, "console ended");
            ExitCode::SUCCESS
        },
    }
}
