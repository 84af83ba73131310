use std::sync::atomic::{AtomicI32, Ordering};

/// One standard wheel notch as reported by Windows (WHEEL_DELTA).
pub const NOTCH: f32 = 120.0;

/// Wheel input drained for one frame, in notches per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelSnapshot {
    pub vertical: f32,
    pub horizontal: f32,
}

impl WheelSnapshot {
    pub fn is_zero(&self) -> bool {
        self.vertical == 0.0 && self.horizontal == 0.0
    }
}

/// Cross-thread sink for raw wheel steps.
///
/// `record` runs on whatever thread pumps the hooked window's messages;
/// `drain` runs once per frame on the update loop. Each axis is a single
/// atomic counter of raw steps swapped to zero at the drain boundary, so an
/// event lands in exactly one snapshot even when both sides race.
pub struct WheelAccumulator {
    vertical: AtomicI32,
    horizontal: AtomicI32,
}

impl WheelAccumulator {
    pub const fn new() -> Self {
        Self {
            vertical: AtomicI32::new(0),
            horizontal: AtomicI32::new(0),
        }
    }

    pub fn record(&self, steps: i16, is_horizontal: bool) {
        let axis = if is_horizontal {
            &self.horizontal
        } else {
            &self.vertical
        };
        axis.fetch_add(steps as i32, Ordering::Relaxed);
    }

    /// Returns everything recorded since the previous drain and resets both
    /// axes. Raw steps are only converted to notches here, so sub-notch
    /// touchpad deltas accumulate without float rounding.
    pub fn drain(&self) -> WheelSnapshot {
        WheelSnapshot {
            vertical: self.vertical.swap(0, Ordering::Relaxed) as f32 / NOTCH,
            horizontal: self.horizontal.swap(0, Ordering::Relaxed) as f32 / NOTCH,
        }
    }
}

/// Global sink the window hook records into; drained once per frame.
pub static WHEEL_SINK: WheelAccumulator = WheelAccumulator::new();

/// Hook listener: forwards one decoded wheel event into the global sink.
pub fn record_raw(steps: i16, is_horizontal: bool) {
    WHEEL_SINK.record(steps, is_horizontal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_sums_per_axis() {
        let acc = WheelAccumulator::new();
        acc.record(120, false);
        acc.record(-240, false);
        acc.record(360, true);
        let snap = acc.drain();
        assert_eq!(snap.vertical, -1.0);
        assert_eq!(snap.horizontal, 3.0);
    }

    #[test]
    fn test_drain_resets_to_zero() {
        let acc = WheelAccumulator::new();
        acc.record(120, false);
        acc.record(120, true);
        assert!(!acc.drain().is_zero());
        let empty = acc.drain();
        assert_eq!(empty, WheelSnapshot::default());
        assert!(empty.is_zero());
    }

    #[test]
    fn test_sub_notch_steps_accumulate_exactly() {
        // Precision touchpads report fractions of WHEEL_DELTA per event
        let acc = WheelAccumulator::new();
        for _ in 0..4 {
            acc.record(30, false);
        }
        assert_eq!(acc.drain().vertical, 1.0);
    }

    #[test]
    fn test_record_is_safe_across_threads() {
        let acc = WheelAccumulator::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        acc.record(3, false);
                        acc.record(-1, true);
                    }
                });
            }
        });
        let snap = acc.drain();
        assert_eq!(snap.vertical, 12000.0 / NOTCH);
        assert_eq!(snap.horizontal, -4000.0 / NOTCH);
    }
}
