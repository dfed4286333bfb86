use super::identify::SerialPair;
use super::lifecycle::StereoRig;
use crate::config::{AcquisitionConfig, StageConfig, StereoConfig};
use crate::error::{Result, StereoError};
use crate::sdk::CameraSdk;
use crate::stats::Clock;
use std::sync::Arc;

/// Builder for a [`StereoRig`]
pub struct StereoRigBuilder<S: CameraSdk> {
    sdk: Option<S>,
    acquisition: AcquisitionConfig,
    stages: StageConfig,
    serials: SerialPair,
    clock: Option<Arc<dyn Clock>>,
}

impl<S: CameraSdk> StereoRigBuilder<S> {
    pub fn new() -> Self {
        Self {
            sdk: None,
            acquisition: AcquisitionConfig::default(),
            stages: StageConfig::default(),
            serials: SerialPair::BUILT_IN,
            clock: None,
        }
    }

    pub fn sdk(mut self, sdk: S) -> Self {
        self.sdk = Some(sdk);
        self
    }

    /// Take the acquisition and stage sections of a loaded configuration
    pub fn config(mut self, config: &StereoConfig) -> Self {
        self.acquisition = config.acquisition.clone();
        self.stages = config.stages.clone();
        self
    }

    pub fn acquisition(mut self, acquisition: AcquisitionConfig) -> Self {
        self.acquisition = acquisition;
        self
    }

    pub fn stages(mut self, stages: StageConfig) -> Self {
        self.stages = stages;
        self
    }

    pub fn serials(mut self, serials: SerialPair) -> Self {
        self.serials = serials;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<StereoRig<S>> {
        let sdk = self
            .sdk
            .ok_or_else(|| StereoError::invalid_argument("Camera SDK must be specified"))?;
        if self.serials.left == self.serials.right {
            return Err(StereoError::invalid_argument(format!(
                "left and right cameras need distinct serials, both are {}",
                self.serials.left
            )));
        }

        let mut rig = match self.clock {
            Some(clock) => StereoRig::with_clock(sdk, self.acquisition, self.stages, clock),
            None => StereoRig::new(sdk, self.acquisition, self.stages),
        };
        rig.serials = self.serials;
        Ok(rig)
    }
}

impl<S: CameraSdk> Default for StereoRigBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
