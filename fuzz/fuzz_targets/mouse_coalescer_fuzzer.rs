//! Fuzz target for [`MouseCoalescer`]
//!
//! Keep pointer writes rate-limited and clicks balanced under any input
//! timing
//!
//! # Invariants
//!
//! - Position writes are at least one window apart
//! - `poll` never fires a timer before its deadline
//! - Every press gets exactly one release once all timers drain
//! - The published position is always the latest one recorded

#![no_main]

use std::{
    ops::{Add, Sub},
    time::Duration,
};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use smarthid_core::{CoalescerConfig, MouseCoalescer, StoreWrite};
use smarthid_proto::MouseButton;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FuzzInstant(Duration);

impl Add<Duration> for FuzzInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub for FuzzInstant {
    type Output = Duration;

    fn sub(self, other: Self) -> Duration {
        self.0.saturating_sub(other.0)
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum PointerEvent {
    Move { x: i16, y: i16, gap_ms: u8 },
    Click { right: bool, gap_ms: u8 },
    Poll { gap_ms: u8 },
}

fn is_sample(write: &StoreWrite) -> bool {
    matches!(write, StoreWrite::Update { fields, .. } if fields.contains_key("x"))
}

fn is_press(write: &StoreWrite) -> bool {
    matches!(write, StoreWrite::Update { fields, .. } if fields.get("click").and_then(|v| v.as_bool()) == Some(true))
}

fn is_release(write: &StoreWrite) -> bool {
    !is_sample(write) && !is_press(write)
}

fuzz_target!(|events: Vec<PointerEvent>| {
    let config = CoalescerConfig::default();
    let mut coalescer = MouseCoalescer::new(config);
    let mut now = FuzzInstant(Duration::ZERO);
    let mut last_sample: Option<FuzzInstant> = None;
    let mut presses = 0usize;
    let mut releases = 0usize;

    let mut check = |writes: Vec<StoreWrite>, at: FuzzInstant, cursor: Option<(f64, f64)>| {
        for write in writes {
            if is_sample(&write) {
                if let Some(previous) = last_sample {
                    assert!(at - previous >= config.window, "samples {:?} apart", at - previous);
                }
                last_sample = Some(at);
                if let (StoreWrite::Update { fields, .. }, Some((x, y))) = (&write, cursor) {
                    assert_eq!(fields["x"].as_f64(), Some(x));
                    assert_eq!(fields["y"].as_f64(), Some(y));
                }
            } else if is_release(&write) {
                releases += 1;
            }
        }
    };

    for event in events {
        let gap = match event {
            PointerEvent::Move { gap_ms, .. } | PointerEvent::Click { gap_ms, .. } | PointerEvent::Poll { gap_ms } => {
                Duration::from_millis(u64::from(gap_ms))
            },
        };
        now = now + gap;

        if let Some(deadline) = coalescer.next_deadline() {
            let due = coalescer.poll(now);
            if deadline > now {
                assert!(due.is_empty(), "fired before deadline");
            }
            check(due, now, coalescer.cursor());
        }

        match event {
            PointerEvent::Move { x, y, .. } => {
                coalescer.on_move(f64::from(x), f64::from(y), now);
            },
            PointerEvent::Click { right, .. } => {
                let button = if right { MouseButton::Right } else { MouseButton::Left };
                assert!(is_press(&coalescer.on_click(button, now)));
                presses += 1;
            },
            PointerEvent::Poll { .. } => {},
        }
    }

    while let Some(deadline) = coalescer.next_deadline() {
        let due = coalescer.poll(deadline);
        assert!(!due.is_empty(), "deadline with nothing due");
        check(due, deadline, coalescer.cursor());
    }
    drop(check);

    assert_eq!(presses, releases, "unbalanced clicks");
    assert!(!coalescer.sample_pending());
    assert_eq!(coalescer.pending_releases(), 0);
});
