use super::lifecycle::StereoRig;
use crate::error::{Result, StereoError};
use crate::sdk::{params, CameraSdk, DeviceHandle, SdkResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Acquisition trigger selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    /// Free-running acquisition
    Continuous,
    Software,
    Hardware,
}

impl TriggerMode {
    fn mode_value(&self) -> u32 {
        match self {
            TriggerMode::Continuous => 0,
            TriggerMode::Software | TriggerMode::Hardware => 1,
        }
    }

    fn source_value(&self) -> Option<u32> {
        match self {
            TriggerMode::Continuous => None,
            TriggerMode::Software => Some(7),
            TriggerMode::Hardware => Some(0),
        }
    }
}

impl<S: CameraSdk> StereoRig<S> {
    pub(super) fn open_handle(&self, slot: usize) -> Result<DeviceHandle> {
        self.registry
            .slot(slot)
            .ok_or_else(|| StereoError::invalid_argument(format!("camera slot {} out of range", slot)))?
            .open_handle()
            .ok_or(StereoError::CameraNotOpen { slot })
    }

    fn write_param<F>(&self, slot: usize, parameter: &str, write: F) -> Result<()>
    where
        F: FnOnce(&S, DeviceHandle) -> SdkResult<()>,
    {
        let handle = self.open_handle(slot)?;
        write(&self.sdk, handle).map_err(|source| StereoError::ParameterAccess {
            slot,
            parameter: parameter.to_string(),
            source,
        })?;
        debug!("Camera slot {} parameter {} written", slot, parameter);
        Ok(())
    }

    pub fn set_trigger_mode(&mut self, slot: usize, mode: TriggerMode) -> Result<()> {
        self.write_param(slot, params::TRIGGER_MODE, |sdk, handle| {
            sdk.set_enum_param(handle, params::TRIGGER_MODE, mode.mode_value())
        })?;
        if let Some(source) = mode.source_value() {
            self.write_param(slot, params::TRIGGER_SOURCE, |sdk, handle| {
                sdk.set_enum_param(handle, params::TRIGGER_SOURCE, source)
            })?;
        }
        if let Some(entry) = self.registry.slot_mut(slot) {
            entry.trigger_mode = mode;
        }
        Ok(())
    }

    pub fn set_frame_rate_enable(&mut self, slot: usize, enabled: bool) -> Result<()> {
        self.write_param(slot, params::ACQUISITION_FRAME_RATE_ENABLE, |sdk, handle| {
            sdk.set_bool_param(handle, params::ACQUISITION_FRAME_RATE_ENABLE, enabled)
        })
    }

    /// Set the hardware frame rate and retarget the slot's statistics
    pub fn set_frame_rate(&mut self, slot: usize, fps: f32) -> Result<()> {
        if !(fps > 0.0) {
            return Err(StereoError::invalid_argument(format!(
                "frame rate must be positive, got {}",
                fps
            )));
        }
        self.write_param(slot, params::ACQUISITION_FRAME_RATE, |sdk, handle| {
            sdk.set_float_param(handle, params::ACQUISITION_FRAME_RATE, fps)
        })?;
        if let Some(entry) = self.registry.slot_mut(slot) {
            entry.frame_rate = fps;
        }
        self.tracker.set_target_fps(slot, fps)
    }

    /// Exposure time in microseconds
    pub fn set_exposure_time(&mut self, slot: usize, exposure_us: f32) -> Result<()> {
        self.write_param(slot, params::EXPOSURE_TIME, |sdk, handle| {
            sdk.set_float_param(handle, params::EXPOSURE_TIME, exposure_us)
        })
    }

    pub fn set_gain_auto(&mut self, slot: usize, enabled: bool) -> Result<()> {
        let value = if enabled { "Continuous" } else { "Off" };
        self.write_param(slot, params::GAIN_AUTO, |sdk, handle| {
            sdk.set_enum_param_by_str(handle, params::GAIN_AUTO, value)
        })
    }

    pub fn set_gain(&mut self, slot: usize, gain: f32) -> Result<()> {
        self.write_param(slot, params::GAIN, |sdk, handle| {
            sdk.set_float_param(handle, params::GAIN, gain)
        })
    }

    /// Fire one software trigger on every camera.
    ///
    /// Slots still holding an unconsumed trigger from an earlier partial
    /// attempt are skipped, so a retry never gives one camera an extra frame.
    pub fn trigger_software(&mut self) -> Result<()> {
        let handles = [self.open_handle(0)?, self.open_handle(1)?];

        for (slot, handle) in handles.into_iter().enumerate() {
            if self.registry.slots()[slot].trigger_pending {
                debug!("Camera slot {} already holds a pending trigger", slot);
                continue;
            }
            self.sdk
                .execute_command(handle, params::TRIGGER_SOFTWARE)
                .map_err(|source| StereoError::ParameterAccess {
                    slot,
                    parameter: params::TRIGGER_SOFTWARE.to_string(),
                    source,
                })?;
            if let Some(entry) = self.registry.slot_mut(slot) {
                entry.trigger_pending = true;
            }
        }
        Ok(())
    }

    /// Apply the startup parameter set to every slot.
    ///
    /// Individual parameter failures are logged and kept as warnings; the
    /// device defaults stay in effect for that parameter.
    pub(super) fn apply_startup_configuration(&mut self) -> Result<()> {
        let acquisition = self.acquisition.clone();
        self.configuration_warnings.clear();

        for slot in 0..self.registry.slots().len() {
            let results = [
                self.set_trigger_mode(slot, TriggerMode::Continuous),
                self.set_frame_rate_enable(slot, true),
                self.set_frame_rate(slot, acquisition.frame_rate),
                self.set_exposure_time(slot, acquisition.exposure_time_us),
                self.set_gain_auto(slot, false),
                self.set_gain(slot, acquisition.gain),
            ];

            for result in results {
                if let Err(error) = result {
                    let warning = match error {
                        StereoError::ParameterAccess {
                            slot,
                            parameter,
                            source,
                        } => StereoError::ConfigurationWarning {
                            slot,
                            parameter,
                            source,
                        },
                        other => other,
                    };
                    warn!("Camera slot {} configuration warning: {}", slot, warning);
                    self.configuration_warnings.push(warning);
                }
            }

            if let Some(entry) = self.registry.slot_mut(slot) {
                entry.frame_rate = acquisition.frame_rate;
            }
            self.tracker.init_stats(slot, acquisition.frame_rate)?;
        }

        Ok(())
    }
}
