use super::lifecycle::StereoRig;
use super::state::RigState;
use crate::error::{ReleaseStep, Result, StereoError};
use crate::sdk::{CameraSdk, SdkResult};
use tracing::{debug, info, warn};

/// Result of one teardown step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step: ReleaseStep,
    /// Camera slot, `None` for SDK-wide steps
    pub slot: Option<usize>,
    pub result: SdkResult<()>,
}

impl StepOutcome {
    /// Call-order failures are expected during teardown and never propagate
    pub fn is_suppressed(&self) -> bool {
        matches!(self.result, Err(error) if error.is_call_order())
    }

    pub fn is_failure(&self) -> bool {
        self.result.is_err() && !self.is_suppressed()
    }
}

/// Every step attempted by one release, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseReport {
    outcomes: Vec<StepOutcome>,
}

impl ReleaseReport {
    pub fn record(&mut self, step: ReleaseStep, slot: Option<usize>, result: SdkResult<()>) {
        match &result {
            Ok(()) => debug!("Release: {} on slot {:?} succeeded", step, slot),
            Err(error) if error.is_call_order() => {
                debug!("Release: {} on slot {:?} out of order (ignored)", step, slot)
            }
            Err(error) => warn!("Release: {} on slot {:?} failed: {}", step, slot, error),
        }
        self.outcomes.push(StepOutcome { step, slot, result });
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    /// Suppressed call-order failures
    pub fn warnings(&self) -> Vec<StereoError> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_suppressed())
            .map(|outcome| StereoError::CallOrderWarning {
                slot: outcome.slot,
                step: outcome.step,
            })
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_failure())
    }

    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    /// The last failure that is not suppressed, as an error
    pub fn to_result(&self) -> Result<()> {
        match self.failures().last() {
            Some(StepOutcome {
                step,
                slot,
                result: Err(source),
            }) => Err(StereoError::ReleaseFailed {
                step: *step,
                slot: *slot,
                source: *source,
            }),
            _ => Ok(()),
        }
    }
}

impl<S: CameraSdk> StereoRig<S> {
    /// Stop, close and destroy every held device, then finalize the SDK.
    ///
    /// Every step is attempted regardless of earlier failures. The registry
    /// is reset to empty whatever the outcome; call-order failures are
    /// recorded but never reported. Safe to call repeatedly.
    pub fn release(&mut self) -> Result<()> {
        let report = self.release_devices();
        let result = report.to_result();
        self.last_release = Some(report);
        result
    }

    /// Report of the most recent release
    pub fn last_release(&self) -> Option<&ReleaseReport> {
        self.last_release.as_ref()
    }

    pub(super) fn release_devices(&mut self) -> ReleaseReport {
        if self.state != RigState::Teardown && self.state.holds_devices() {
            self.state = RigState::Stopping;
        }
        info!("Releasing camera resources ({})", self.state);

        let mut report = ReleaseReport::default();
        for (index, slot) in self.registry.slots().iter().enumerate() {
            let Some(handle) = slot.handle else {
                continue;
            };
            if slot.opened {
                report.record(
                    ReleaseStep::StopGrabbing,
                    Some(index),
                    self.sdk.stop_grabbing(handle),
                );
                report.record(
                    ReleaseStep::CloseDevice,
                    Some(index),
                    self.sdk.close_device(handle),
                );
            }
            report.record(
                ReleaseStep::DestroyHandle,
                Some(index),
                self.sdk.destroy_handle(handle),
            );
        }
        report.record(ReleaseStep::Finalize, None, self.sdk.finalize());

        self.registry.reset();
        self.frame_buffer_size = 0;
        self.state = RigState::Released;

        let failures = report.failures().count();
        if failures == 0 {
            info!(
                "Camera resources released ({} call-order warning(s))",
                report.warnings().len()
            );
        } else {
            warn!("Camera release completed with {} failure(s)", failures);
        }
        report
    }
}

