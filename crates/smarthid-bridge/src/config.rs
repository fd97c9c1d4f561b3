//! Command-line and environment configuration.

use std::{fmt, time::Duration};

use clap::Parser;
use smarthid_core::{ControlConfig, LockoutPolicy, PresenceConfig, Secret};

/// SmartHID operator bridge
#[derive(Parser, Clone)]
#[command(name = "smarthid-bridge")]
#[command(about = "Relays operator commands to a SmartHID device through its shared store")]
#[command(version)]
pub struct Args {
    /// Base URL of the shared store (e.g. `https://<db>.firebaseio.com`)
    #[arg(long, env = "SMARTHID_DATABASE_URL")]
    pub database_url: String,

    /// Store auth token, sent as the `auth` query parameter
    #[arg(long, env = "SMARTHID_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Operator password
    #[arg(long, env = "SMARTHID_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Presence poll interval in milliseconds
    #[arg(long, default_value = "2000")]
    pub presence_interval_ms: u64,

    /// Heartbeat age after which the device counts as offline
    #[arg(long, default_value = "15")]
    pub stale_threshold_secs: u64,

    /// Pointer sampling window in milliseconds
    #[arg(long, default_value = "50")]
    pub coalesce_window_ms: u64,

    /// Delay before a click is released, in milliseconds
    #[arg(long, default_value = "100")]
    pub release_delay_ms: u64,

    /// Failed logins before lockout
    #[arg(long, default_value = "5")]
    pub max_attempts: u32,

    /// Lockout duration in seconds
    #[arg(long, default_value = "300")]
    pub lockout_secs: u64,

    /// Per-request timeout for store calls, in milliseconds
    #[arg(long, default_value = "5000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("database_url", &self.database_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("password", &"<redacted>")
            .field("presence_interval_ms", &self.presence_interval_ms)
            .field("stale_threshold_secs", &self.stale_threshold_secs)
            .field("coalesce_window_ms", &self.coalesce_window_ms)
            .field("release_delay_ms", &self.release_delay_ms)
            .field("max_attempts", &self.max_attempts)
            .field("lockout_secs", &self.lockout_secs)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Args {
    /// Driver tuning.
    pub fn control(&self) -> ControlConfig {
        ControlConfig {
            coalesce_window: Duration::from_millis(self.coalesce_window_ms),
            release_delay: Duration::from_millis(self.release_delay_ms),
            lockout: LockoutPolicy {
                max_attempts: self.max_attempts,
                duration: Duration::from_secs(self.lockout_secs),
            },
        }
    }

    /// Presence polling tuning.
    pub fn presence(&self) -> PresenceConfig {
        PresenceConfig {
            poll_interval: Duration::from_millis(self.presence_interval_ms),
            stale_threshold: Duration::from_secs(self.stale_threshold_secs),
        }
    }

    /// Store request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Operator password.
    pub fn secret(&self) -> Secret {
        Secret::new(self.password.clone())
    }
}
