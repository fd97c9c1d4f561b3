//! Presence detector.
//!
//! The device writes `hid/status = { online, lastSeen }` on its own schedule.
//! Whether it is alive is a function of that record *and* our clock, so the
//! answer changes with time even when nothing is written. The detector is
//! therefore re-evaluated on every poll and owns no state of its own.
//!
//! Three outcomes are kept distinct, because they call for different operator
//! action:
//!
//! - `Online`: heartbeat claims online and is fresh
//! - `Offline`: no record, device says offline, or heartbeat is stale
//! - `Error`: the store itself could not be read
//!
//! # Clock skew
//!
//! `lastSeen` comes from the device clock. A timestamp ahead of ours counts
//! as age zero rather than as an error; a device clock running far behind
//! shows up as offline.

use std::{sync::Arc, time::Duration};

use smarthid_proto::{HeartbeatStatus, HidPath};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{env::Environment, store::SharedStore};

/// Heartbeats older than this mean the device is gone.
pub const STALE_THRESHOLD: Duration = Duration::from_secs(15);

/// Presence polling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceConfig {
    /// Time between polls.
    pub poll_interval: Duration,
    /// Maximum heartbeat age still considered live.
    pub stale_threshold: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(2), stale_threshold: STALE_THRESHOLD }
    }
}

/// Latest presence observation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Presence {
    /// Not polled yet.
    #[default]
    Unknown,
    /// Fresh heartbeat with `online: true`.
    Online {
        /// Last heartbeat, epoch seconds.
        last_seen: u64,
    },
    /// Device absent, offline, or stale.
    Offline {
        /// Last heartbeat, if one was ever recorded.
        last_seen: Option<u64>,
    },
    /// The store read failed.
    Error {
        /// Transport failure description.
        reason: String,
    },
}

impl Presence {
    /// True only for `Online`.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online { .. })
    }

    fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// `online && now - last_seen < stale_threshold`.
///
/// `now` is wall-clock time since the Unix epoch. A record without
/// `last_seen` cannot be shown to be fresh, so it is not live.
pub fn is_live(status: &HeartbeatStatus, now: Duration, stale_threshold: Duration) -> bool {
    if !status.online {
        return false;
    }
    let Some(last_seen) = status.last_seen else {
        return false;
    };
    now.saturating_sub(Duration::from_secs(last_seen)) < stale_threshold
}

/// Classifies a decoded heartbeat record at `now`.
pub fn classify(status: Option<HeartbeatStatus>, now: Duration, stale_threshold: Duration) -> Presence {
    match status {
        None => Presence::Offline { last_seen: None },
        Some(status) => match status.last_seen {
            Some(last_seen) if is_live(&status, now, stale_threshold) => Presence::Online { last_seen },
            last_seen => Presence::Offline { last_seen },
        },
    }
}

/// Reads `hid/status` once and classifies it.
///
/// Store failures become [`Presence::Error`], never `Offline`.
pub async fn observe<S: SharedStore + ?Sized>(
    store: &S,
    now: Duration,
    stale_threshold: Duration,
) -> Presence {
    match store.get(HidPath::Status.as_str()).await {
        Ok(value) => classify(HeartbeatStatus::from_store(value.as_ref()), now, stale_threshold),
        Err(e) => Presence::Error { reason: e.to_string() },
    }
}

/// Polls presence until `shutdown` fires, publishing every observation.
///
/// Transitions between online, offline and error are logged; repeated
/// identical observations are not.
pub async fn run_presence_monitor<E, S>(
    env: E,
    store: Arc<S>,
    config: PresenceConfig,
    presence: watch::Sender<Presence>,
    shutdown: CancellationToken,
) where
    E: Environment,
    S: SharedStore + ?Sized,
{
    tracing::info!(interval = ?config.poll_interval, "presence monitor started");

    loop {
        let observed = observe(store.as_ref(), env.unix_now(), config.stale_threshold).await;

        presence.send_if_modified(|current| {
            if !current.same_kind(&observed) {
                match &observed {
                    Presence::Online { last_seen } => tracing::info!(last_seen, "device online"),
                    Presence::Offline { last_seen } => tracing::warn!(?last_seen, "device offline"),
                    Presence::Error { reason } => tracing::error!(%reason, "device status unavailable"),
                    Presence::Unknown => {},
                }
            }
            if *current == observed {
                return false;
            }
            *current = observed;
            true
        });

        tokio::select! {
            () = shutdown.cancelled() => break,
            () = env.sleep(config.poll_interval) => {},
        }
    }

    tracing::info!("presence monitor stopped");
}
