//! Clock and timing utilities for playback and export.
//!
//! Scene time is measured in milliseconds (`f64`), encoder time in
//! microseconds, and container time in milliseconds. This module owns the
//! conversions between those domains plus:
//! - A wall-clock anchored epoch for realtime capture
//! - Frame slots that pace realtime capture at a fixed FPS

use std::ops::Range;
use std::time::Instant;

/// A capture clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment a realtime export started).
#[derive(Debug, Clone)]
pub struct CaptureClock {
    /// The instant capture started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl CaptureClock {
    /// Create a new capture clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get nanoseconds elapsed since capture start.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Get milliseconds elapsed since capture start.
    pub fn elapsed_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Get seconds elapsed since capture start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at capture start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// The underlying epoch instant.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

/// Scene time of frame `index` at `fps`, in milliseconds.
pub fn frame_time_ms(index: u64, fps: u32) -> f64 {
    index as f64 * (1000.0 / fps.max(1) as f64)
}

/// Encoder timestamp of frame `index` at `fps`, in microseconds.
pub fn frame_timestamp_us(index: u64, fps: u32) -> u64 {
    (index as f64 * 1_000_000.0 / fps.max(1) as f64).round() as u64
}

/// Nominal duration of one frame at `fps`, in microseconds.
pub fn frame_duration_us(fps: u32) -> u64 {
    (1_000_000.0 / fps.max(1) as f64).round() as u64
}

/// Convert an encoder-domain timestamp to the container's millisecond
/// domain. Rounds to nearest and never goes negative.
pub fn us_to_ms(timestamp_us: i64) -> u64 {
    (timestamp_us as f64 / 1000.0).round().max(0.0) as u64
}

/// Fixed-rate frame slots for realtime capture.
///
/// Slot `n` is due at `n / fps` seconds after the first capture. A sample
/// covers every slot up to the one nearest to it, so late wake-ups repeat
/// the current picture instead of dropping slots, and early ones within half
/// an interval still count.
#[derive(Debug)]
pub struct FrameSlots {
    fps: u32,
    next_index: u64,
}

impl FrameSlots {
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            next_index: 0,
        }
    }

    /// Slots to fill for a sample taken `elapsed_ns` after the first one.
    /// Empty when the nearest slot has already been filled.
    pub fn due(&mut self, elapsed_ns: u64) -> Range<u64> {
        let nearest = (elapsed_ns as f64 * self.fps as f64 / 1e9).round() as u64;
        let first = self.next_index;
        if nearest < first {
            return first..first;
        }
        self.next_index = nearest + 1;
        first..self.next_index
    }

    /// Container timestamp of slot `index`, in milliseconds.
    pub fn timestamp_ms(&self, index: u64) -> u64 {
        us_to_ms(frame_timestamp_us(index, self.fps) as i64)
    }

    /// Slots filled so far.
    pub fn filled(&self) -> u64 {
        self.next_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = CaptureClock::start();
        assert!(clock.elapsed_ns() < 1_000_000_000);
        assert!(!clock.epoch_wall().is_empty());
    }

    #[test]
    fn test_frame_timestamps_at_30fps() {
        assert_eq!(frame_timestamp_us(0, 30), 0);
        assert_eq!(frame_timestamp_us(1, 30), 33_333);
        assert_eq!(frame_timestamp_us(2, 30), 66_667);
        assert_eq!(frame_timestamp_us(30, 30), 1_000_000);
        assert!((frame_time_ms(15, 30) - 500.0).abs() < 1e-9);
        assert_eq!(frame_duration_us(30), 33_333);
    }

    #[test]
    fn test_us_to_ms_rounds_and_clamps() {
        assert_eq!(us_to_ms(33_333), 33);
        assert_eq!(us_to_ms(66_667), 67);
        assert_eq!(us_to_ms(-400), 0);
    }

    #[test]
    fn test_frame_slots_tolerate_jitter() {
        let mut slots = FrameSlots::new(30);
        assert_eq!(slots.due(0), 0..1);
        // A wake-up 1 ms early still lands on slot 1.
        assert_eq!(slots.due(32_300_000), 1..2);
        // A second sample in the same slot adds nothing.
        assert_eq!(slots.due(40_000_000), 2..2);
        // A wake-up 1 ms late covers slot 2 only.
        assert_eq!(slots.due(67_700_000), 2..3);
        assert_eq!(slots.filled(), 3);
    }

    #[test]
    fn test_frame_slots_fill_stalls() {
        let mut slots = FrameSlots::new(30);
        assert_eq!(slots.due(1_000_000), 0..1);
        // 100 ms without a sample covers three slots at once.
        assert_eq!(slots.due(101_000_000), 1..4);
        assert_eq!(slots.timestamp_ms(0), 0);
        assert_eq!(slots.timestamp_ms(1), 33);
        assert_eq!(slots.timestamp_ms(3), 100);
    }

    #[test]
    fn test_frame_slots_count_matches_duration() {
        // Samples every ~33 ms with +/-3 ms of jitter over two seconds.
        let mut slots = FrameSlots::new(30);
        let mut total = 0;
        for i in 0..=60u64 {
            let jitter: i64 = [0, 3_000_000, -3_000_000, 2_000_000][(i % 4) as usize];
            let at = (i as i64 * 33_333_333 + jitter).max(0) as u64;
            total += slots.due(at).count();
        }
        assert_eq!(total, 61);
    }
}
