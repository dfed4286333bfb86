//! Lifecycle management and synchronized frame-pair capture for a fixed
//! left/right pair of industrial cameras.

pub mod config;
pub mod error;
pub mod frame;
pub mod registry;
pub mod rig;
pub mod sdk;
pub mod stats;
pub mod worker;

pub use config::StereoConfig;
pub use error::{Result, StereoError};
pub use frame::StereoFrame;
pub use registry::{CameraPosition, CameraSlot, DeviceRegistry, CAMERA_COUNT};
pub use rig::{RigState, StereoRig, StereoRigBuilder, WorkflowStage};
pub use sdk::{CameraSdk, VendorFrame};
pub use stats::{HealthStatus, PerformanceSnapshot, PerformanceTracker, RigHealth};
pub use worker::RigWorker;
