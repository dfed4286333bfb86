use super::lifecycle::StereoRig;
use super::params::TriggerMode;
use crate::error::{Result, StereoError};
use crate::registry::CAMERA_COUNT;
use crate::sdk::CameraSdk;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn};

/// Named operating stages of the calibration workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStage {
    /// Free-running at the preview frame rate
    Preview,
    /// One frame per software trigger
    Detection,
    /// Software triggered with a short exposure
    Alignment,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Preview => "preview",
            WorkflowStage::Detection => "detection",
            WorkflowStage::Alignment => "alignment",
        }
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        match self {
            WorkflowStage::Preview => TriggerMode::Continuous,
            WorkflowStage::Detection | WorkflowStage::Alignment => TriggerMode::Software,
        }
    }
}

impl FromStr for WorkflowStage {
    type Err = StereoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preview" => Ok(WorkflowStage::Preview),
            "detection" => Ok(WorkflowStage::Detection),
            "alignment" => Ok(WorkflowStage::Alignment),
            _ => Err(StereoError::UnknownStage(s.to_string())),
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<S: CameraSdk> StereoRig<S> {
    /// Apply the parameter set of a named stage
    pub fn configure_for_stage(&mut self, stage_name: &str) -> Result<()> {
        let stage = stage_name.parse::<WorkflowStage>()?;
        self.apply_stage(stage);
        Ok(())
    }

    /// Apply a stage to every open camera.
    ///
    /// A slot whose trigger mode is rejected keeps its previous settings;
    /// other rejected writes are logged and skipped.
    pub fn apply_stage(&mut self, stage: WorkflowStage) {
        info!("Configuring cameras for {} stage", stage);
        let stages = self.stages.clone();

        for slot in 0..CAMERA_COUNT {
            if self.open_handle(slot).is_err() {
                continue;
            }

            if let Err(error) = self.set_trigger_mode(slot, stage.trigger_mode()) {
                warn!("Camera slot {} {} stage skipped: {}", slot, stage, error);
                continue;
            }

            let result = match stage {
                WorkflowStage::Preview => self.set_frame_rate(slot, stages.preview_frame_rate),
                WorkflowStage::Detection => Ok(()),
                WorkflowStage::Alignment => self.set_exposure_time(slot, stages.alignment_exposure_us),
            };
            if let Err(error) = result {
                warn!("Camera slot {} {} stage setting skipped: {}", slot, stage, error);
            }
        }
    }
}
