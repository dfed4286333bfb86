use super::tracker::PerformanceStats;
use crate::registry::CameraPosition;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Acquisition health of one camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    NotRunning,
    Normal,
    Low,
    Running,
}

/// Point-in-time performance report for one camera
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSnapshot {
    pub slot: usize,
    pub position: CameraPosition,
    pub target_fps: f32,
    pub actual_fps: f32,
    pub dropped_frames: u32,
    pub total_frames: u64,
    pub status: HealthStatus,
}

impl PerformanceSnapshot {
    pub fn new(slot: usize, position: CameraPosition, stats: &PerformanceStats) -> Self {
        Self {
            slot,
            position,
            target_fps: stats.target_fps,
            actual_fps: stats.actual_fps,
            dropped_frames: stats.dropped_frame_count,
            total_frames: stats.total_frame_count,
            status: classify(stats.actual_fps, stats.target_fps),
        }
    }

    /// Actual rate as a percentage of the target, capped at 100
    pub fn accuracy_percentage(&self) -> f32 {
        if self.target_fps <= 0.0 {
            return 0.0;
        }
        (self.actual_fps / self.target_fps * 100.0).min(100.0)
    }

    /// Running within 10% of the target rate
    pub fn is_healthy(&self) -> bool {
        self.actual_fps > 0.0 && (self.actual_fps - self.target_fps).abs() <= self.target_fps * 0.1
    }
}

impl std::fmt::Display for PerformanceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Camera {} ({}) - Target: {}fps, Actual: {:.2}fps, Dropped: {}, Total: {}, Status: {:?} ({:.1}%)",
            self.slot,
            self.position,
            self.target_fps,
            self.actual_fps,
            self.dropped_frames,
            self.total_frames,
            self.status,
            self.accuracy_percentage()
        )
    }
}

fn classify(actual_fps: f32, target_fps: f32) -> HealthStatus {
    if actual_fps == 0.0 {
        HealthStatus::NotRunning
    } else if (actual_fps - target_fps).abs() <= 0.1 {
        HealthStatus::Normal
    } else if actual_fps < target_fps * 0.9 {
        HealthStatus::Low
    } else {
        HealthStatus::Running
    }
}

/// Combined report for both cameras
#[derive(Debug, Clone, Serialize)]
pub struct RigHealth {
    pub cameras: Vec<PerformanceSnapshot>,
    pub healthy: bool,
    pub timestamp: DateTime<Utc>,
}

impl RigHealth {
    pub fn new(cameras: Vec<PerformanceSnapshot>) -> Self {
        let healthy = !cameras.is_empty() && cameras.iter().all(PerformanceSnapshot::is_healthy);
        Self {
            cameras,
            healthy,
            timestamp: Utc::now(),
        }
    }
}
