use super::clock::{Clock, MonotonicClock};
use crate::error::{Result, StereoError};
use crate::registry::CAMERA_COUNT;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Frames per estimation window
pub const STATS_WINDOW_FRAMES: u32 = 100;

/// Longest estimation window
pub const STATS_WINDOW_DURATION: Duration = Duration::from_secs(5);

/// Rolling acquisition statistics for one camera
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceStats {
    pub target_fps: f32,
    pub frame_interval_ms: u32,
    /// Successful captures since the stats were initialised
    pub total_frame_count: u64,
    pub dropped_frame_count: u32,
    /// Rate measured over the last completed window
    pub actual_fps: f32,
    pub window_start_us: u64,
    pub frames_in_window: u32,
    pub last_frame_number: Option<u64>,
}

impl PerformanceStats {
    fn reset(&mut self, target_fps: f32, now_us: u64) {
        *self = Self {
            target_fps,
            frame_interval_ms: frame_interval_ms(target_fps),
            window_start_us: now_us,
            ..Self::default()
        };
    }
}

fn frame_interval_ms(target_fps: f32) -> u32 {
    if target_fps > 0.0 {
        (1000.0 / target_fps) as u32
    } else {
        0
    }
}

/// Per-camera frame counters and windowed frame-rate estimates.
///
/// Each camera's window is timed independently; no clock alignment between
/// cameras is assumed.
pub struct PerformanceTracker {
    stats: [PerformanceStats; CAMERA_COUNT],
    clock: Arc<dyn Clock>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            stats: Default::default(),
            clock,
        }
    }

    fn stats_mut(&mut self, slot: usize) -> Result<&mut PerformanceStats> {
        self.stats
            .get_mut(slot)
            .ok_or_else(|| StereoError::invalid_argument(format!("camera slot {} out of range", slot)))
    }

    /// Reset the slot's counters and start a fresh window
    pub fn init_stats(&mut self, slot: usize, target_fps: f32) -> Result<()> {
        if !(target_fps > 0.0) {
            return Err(StereoError::invalid_argument(format!(
                "target frame rate must be positive, got {}",
                target_fps
            )));
        }
        let now = self.clock.now_us();
        let stats = self.stats_mut(slot)?;
        stats.reset(target_fps, now);

        debug!(
            "Initialized stats for camera slot {} - target {} fps (interval {} ms)",
            slot, target_fps, stats.frame_interval_ms
        );
        Ok(())
    }

    /// Change the target rate while keeping the counters
    pub fn set_target_fps(&mut self, slot: usize, target_fps: f32) -> Result<()> {
        let stats = self.stats_mut(slot)?;
        stats.target_fps = target_fps;
        stats.frame_interval_ms = frame_interval_ms(target_fps);
        Ok(())
    }

    /// Count one successful capture and close the window when it is full or old enough
    pub fn record_frame(&mut self, slot: usize) -> Result<()> {
        let now = self.clock.now_us();
        let stats = self.stats_mut(slot)?;

        stats.total_frame_count += 1;
        stats.frames_in_window += 1;

        let elapsed_us = now.saturating_sub(stats.window_start_us);
        let window_full = stats.frames_in_window >= STATS_WINDOW_FRAMES;
        let window_expired = elapsed_us >= STATS_WINDOW_DURATION.as_micros() as u64;

        if (window_full || window_expired) && elapsed_us > 0 {
            stats.actual_fps = (stats.frames_in_window as f64 * 1_000_000.0 / elapsed_us as f64) as f32;
            trace!(
                "Camera slot {} window closed: {} frames in {} us -> {:.2} fps",
                slot,
                stats.frames_in_window,
                elapsed_us,
                stats.actual_fps
            );
            stats.window_start_us = now;
            stats.frames_in_window = 0;
        }

        Ok(())
    }

    /// Record a capture carrying the device frame number, counting any gap as dropped frames
    pub fn record_frame_number(&mut self, slot: usize, frame_number: u64) -> Result<()> {
        let stats = self.stats_mut(slot)?;
        if let Some(previous) = stats.last_frame_number {
            if frame_number > previous + 1 {
                let gap = frame_number - previous - 1;
                stats.dropped_frame_count = stats
                    .dropped_frame_count
                    .saturating_add(u32::try_from(gap).unwrap_or(u32::MAX));
                warn!(
                    "Camera slot {} dropped {} frame(s) between {} and {}",
                    slot, gap, previous, frame_number
                );
            }
        }
        stats.last_frame_number = Some(frame_number);
        self.record_frame(slot)
    }

    /// Actual frame rate and dropped-frame count
    pub fn status(&self, slot: usize) -> Result<(f32, u32)> {
        self.stats(slot)
            .map(|stats| (stats.actual_fps, stats.dropped_frame_count))
            .ok_or_else(|| StereoError::invalid_argument(format!("camera slot {} out of range", slot)))
    }

    pub fn stats(&self, slot: usize) -> Option<&PerformanceStats> {
        self.stats.get(slot)
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}
