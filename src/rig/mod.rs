//! Lifecycle controller and synchronized capture engine for the camera pair.

mod builder;
mod capture;
mod identify;
mod lifecycle;
mod negotiate;
mod params;
mod release;
mod stage;
mod state;
#[cfg(test)]
mod tests;

pub use builder::StereoRigBuilder;
pub use identify::{identify, SerialPair, LEFT_CAMERA_SERIAL, RIGHT_CAMERA_SERIAL};
pub use lifecycle::StereoRig;
pub use negotiate::{frame_size, reconcile_frame_sizes};
pub use params::TriggerMode;
pub use release::{ReleaseReport, StepOutcome};
pub use stage::WorkflowStage;
pub use state::RigState;

use crate::sdk::TransportLayer;
use std::time::Duration;

/// Longest wait for one camera's frame during a paired capture
pub const ACQUISITION_TIMEOUT: Duration = Duration::from_millis(1000);

/// Interface family the rig enumerates
pub const TRANSPORT: TransportLayer = TransportLayer::Usb3;
