//! Mouse event coalescer.
//!
//! Pointer moves arrive far faster than the store or the device poll loop can
//! absorb. The coalescer samples them at a fixed rate instead:
//!
//! ```text
//! moves:   m1 m2 m3 m4 ........ m5 m6 ...
//!          |<---- W ---->|      |<---- W ---->|
//! writes:                m4                    m6
//! ```
//!
//! The first move while idle arms a single timer for `W`. Moves during the
//! window only replace the latest sample; they neither re-arm nor extend the
//! timer. When it fires, the latest sample is published with both buttons up.
//!
//! Clicks bypass sampling: the press is published immediately and a release
//! is scheduled `R` later. Releases are never cancelled by later input; a
//! second click schedules its own release.
//!
//! Leaving mouse mode cancels a pending sample, since a write to
//! `hid/mouseData` would then belong to a mode that is no longer active.
//!
//! This type is Sans-IO. It hands back [`StoreWrite`]s and deadlines; the
//! driver owns the clock and the store.
//!
//! # Invariants
//!
//! - At most one sample timer is armed at any time
//! - At most one movement write per window, so movement writes per second are
//!   bounded by `1000 / W_ms` regardless of input rate
//! - Every press is followed by exactly one scheduled release

use std::{collections::VecDeque, time::Duration};

use smarthid_proto::{HidPath, MouseButton, MousePatch};

use crate::store::StoreWrite;

/// Coalescer timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerConfig {
    /// Sampling window for pointer moves.
    pub window: Duration,
    /// Delay between a click's press and its automatic release.
    pub release_delay: Duration,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self { window: Duration::from_millis(50), release_delay: Duration::from_millis(100) }
    }
}

/// Fixed-rate sampler for pointer moves plus click auto-release scheduler.
#[derive(Debug, Clone)]
pub struct MouseCoalescer<I> {
    config: CoalescerConfig,
    /// Latest local pointer position, for immediate cursor rendering.
    cursor: Option<(f64, f64)>,
    /// When the armed sample timer fires.
    sample_due: Option<I>,
    /// Pending click releases, earliest first.
    releases: VecDeque<I>,
}

impl<I> MouseCoalescer<I>
where
    I: Copy + Ord + std::ops::Add<Duration, Output = I>,
{
    /// Creates an idle coalescer.
    pub fn new(config: CoalescerConfig) -> Self {
        Self { config, cursor: None, sample_due: None, releases: VecDeque::new() }
    }

    /// Timing in effect.
    pub fn config(&self) -> CoalescerConfig {
        self.config
    }

    /// Latest local position, updated on every move without any write.
    pub fn cursor(&self) -> Option<(f64, f64)> {
        self.cursor
    }

    /// True while a sample timer is armed.
    pub fn sample_pending(&self) -> bool {
        self.sample_due.is_some()
    }

    /// Releases scheduled but not yet due.
    pub fn pending_releases(&self) -> usize {
        self.releases.len()
    }

    /// Records a pointer move.
    ///
    /// Returns the deadline when this move armed the timer, `None` when it was
    /// absorbed into an already armed window.
    pub fn on_move(&mut self, x: f64, y: f64, now: I) -> Option<I> {
        self.cursor = Some((x, y));
        if self.sample_due.is_some() {
            return None;
        }
        let due = now + self.config.window;
        self.sample_due = Some(due);
        Some(due)
    }

    /// Disarms the sample timer without publishing. Scheduled releases stay
    /// armed so no button is left pressed.
    ///
    /// Returns whether a sample was pending.
    pub fn cancel_sample(&mut self) -> bool {
        self.sample_due.take().is_some()
    }

    /// Records a click. Returns the press to publish right away and schedules
    /// the release.
    pub fn on_click(&mut self, button: MouseButton, now: I) -> StoreWrite {
        let due = now + self.config.release_delay;
        let at = self.releases.partition_point(|pending| *pending <= due);
        self.releases.insert(at, due);
        mouse_write(MousePatch::pressed(button))
    }

    /// Earliest instant at which [`MouseCoalescer::poll`] has work.
    pub fn next_deadline(&self) -> Option<I> {
        match (self.sample_due, self.releases.front().copied()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fires every timer due at or before `now`, in deadline order.
    pub fn poll(&mut self, now: I) -> Vec<StoreWrite> {
        let mut due: Vec<(I, StoreWrite)> = Vec::new();

        if let Some(at) = self.sample_due.filter(|at| *at <= now) {
            self.sample_due = None;
            if let Some((x, y)) = self.cursor {
                due.push((at, mouse_write(MousePatch::moved(x, y))));
            }
        }

        while let Some(at) = self.releases.front().copied().filter(|at| *at <= now) {
            self.releases.pop_front();
            due.push((at, mouse_write(MousePatch::released())));
        }

        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, write)| write).collect()
    }
}

/// Partial update of `hid/mouseData`.
pub(crate) fn mouse_write(patch: MousePatch) -> StoreWrite {
    StoreWrite::Update { path: HidPath::MouseData, fields: patch.to_fields() }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Instant;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn coalescer() -> MouseCoalescer<Instant> {
        MouseCoalescer::new(CoalescerConfig::default())
    }

    fn fields(write: &StoreWrite) -> &serde_json::Map<String, serde_json::Value> {
        match write {
            StoreWrite::Update { fields, .. } => fields,
            StoreWrite::Set { .. } => panic!("expected update, got {write:?}"),
        }
    }

    #[test]
    fn move_updates_cursor_without_writing() {
        let t0 = Instant::now();
        let mut c = coalescer();

        let armed = c.on_move(10.0, 20.0, t0);

        assert_eq!(armed, Some(t0 + ms(50)));
        assert_eq!(c.cursor(), Some((10.0, 20.0)));
        assert!(c.poll(t0).is_empty());
    }

    #[test]
    fn burst_within_window_yields_one_sample_with_last_position() {
        let t0 = Instant::now();
        let mut c = coalescer();

        for i in 0u32..30 {
            c.on_move(f64::from(i), f64::from(i * 2), t0 + ms(u64::from(i)));
        }
        let writes = c.poll(t0 + ms(50));

        assert_eq!(writes.len(), 1);
        let f = fields(&writes[0]);
        assert_eq!(f["x"], json!(29));
        assert_eq!(f["y"], json!(58));
        assert_eq!(f["click"], json!(false));
        assert!(!c.sample_pending());
    }

    #[test]
    fn moves_inside_window_do_not_extend_it() {
        let t0 = Instant::now();
        let mut c = coalescer();

        c.on_move(1.0, 1.0, t0);
        assert_eq!(c.on_move(2.0, 2.0, t0 + ms(49)), None);

        assert_eq!(c.next_deadline(), Some(t0 + ms(50)));
    }

    #[test]
    fn next_move_after_fire_arms_new_window() {
        let t0 = Instant::now();
        let mut c = coalescer();

        c.on_move(1.0, 1.0, t0);
        c.poll(t0 + ms(50));
        let armed = c.on_move(5.0, 5.0, t0 + ms(70));

        assert_eq!(armed, Some(t0 + ms(120)));
    }

    #[test]
    fn click_publishes_immediately_and_schedules_release() {
        let t0 = Instant::now();
        let mut c = coalescer();

        let press = c.on_click(MouseButton::Left, t0);

        assert_eq!(fields(&press)["leftClick"], json!(true));
        assert_eq!(fields(&press)["click"], json!(true));
        assert_eq!(c.next_deadline(), Some(t0 + ms(100)));
        assert!(c.poll(t0 + ms(99)).is_empty());

        let release = c.poll(t0 + ms(100));
        assert_eq!(release.len(), 1);
        assert_eq!(fields(&release[0])["leftClick"], json!(false));
        assert_eq!(fields(&release[0])["rightClick"], json!(false));
        assert_eq!(c.pending_releases(), 0);
    }

    #[test]
    fn click_then_moves_gives_press_sample_release() {
        let t0 = Instant::now();
        let mut c = coalescer();

        let _press = c.on_click(MouseButton::Right, t0);
        for i in 1u32..=10 {
            c.on_move(f64::from(i), 0.0, t0 + ms(u64::from(i)));
        }

        let mut timeline = Vec::new();
        let mut now = t0;
        while let Some(deadline) = c.next_deadline() {
            now = now.max(deadline);
            timeline.extend(c.poll(now));
        }

        assert_eq!(timeline.len(), 2, "one sample then one release");
        assert!(fields(&timeline[0]).contains_key("x"));
        assert!(!fields(&timeline[1]).contains_key("x"));
    }

    #[test]
    fn second_click_keeps_first_release() {
        let t0 = Instant::now();
        let mut c = coalescer();

        c.on_click(MouseButton::Left, t0);
        c.on_click(MouseButton::Left, t0 + ms(60));

        assert_eq!(c.pending_releases(), 2);
        assert_eq!(c.poll(t0 + ms(100)).len(), 1);
        assert_eq!(c.poll(t0 + ms(160)).len(), 1);
    }

    #[test]
    fn cancel_sample_keeps_releases() {
        let t0 = Instant::now();
        let mut c = coalescer();

        c.on_click(MouseButton::Right, t0);
        c.on_move(5.0, 5.0, t0 + ms(10));

        assert!(c.cancel_sample());
        assert!(!c.cancel_sample());
        assert_eq!(c.next_deadline(), Some(t0 + ms(100)));

        let writes = c.poll(t0 + ms(500));
        assert_eq!(writes.len(), 1);
        assert!(!fields(&writes[0]).contains_key("x"));
        assert_eq!(fields(&writes[0])["rightClick"], json!(false));
    }

    #[test]
    fn late_poll_fires_in_deadline_order() {
        let t0 = Instant::now();
        let mut c = coalescer();

        c.on_click(MouseButton::Left, t0);
        c.on_move(3.0, 4.0, t0 + ms(10));

        let writes = c.poll(t0 + ms(500));

        assert_eq!(writes.len(), 2);
        assert!(fields(&writes[0]).contains_key("x"), "sample due at 60ms comes first");
    }

    proptest! {
        /// However dense the input, movement writes never exceed one per
        /// window.
        #[test]
        fn movement_writes_bounded_by_window(
            gaps in prop::collection::vec(0u64..30, 1..300)
        ) {
            let t0 = Instant::now();
            let mut c = coalescer();
            let mut now = t0;
            let mut sample_times = Vec::new();

            for gap in gaps {
                now += ms(gap);
                let due = c.poll(now);
                if !due.is_empty() {
                    sample_times.push(now);
                }
                c.on_move(1.0, 1.0, now);
            }
            if let Some(deadline) = c.next_deadline() {
                if !c.poll(deadline).is_empty() {
                    sample_times.push(deadline);
                }
            }

            for pair in sample_times.windows(2) {
                prop_assert!(pair[1] - pair[0] >= ms(50));
            }
        }
    }
}
