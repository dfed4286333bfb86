mod clock;
mod health;
mod tracker;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use health::{HealthStatus, PerformanceSnapshot, RigHealth};
pub use tracker::{PerformanceStats, PerformanceTracker, STATS_WINDOW_DURATION, STATS_WINDOW_FRAMES};
