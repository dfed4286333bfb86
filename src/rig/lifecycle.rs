use super::identify::{identify, SerialPair};
use super::release::ReleaseReport;
use super::state::RigState;
use super::TRANSPORT;
use crate::config::{AcquisitionConfig, StageConfig};
use crate::error::{Result, StereoError};
use crate::registry::{CameraPosition, DeviceRegistry, CAMERA_COUNT};
use crate::sdk::{params, AccessMode, CameraSdk};
use crate::stats::{Clock, PerformanceSnapshot, PerformanceStats, PerformanceTracker, RigHealth};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Owner of the two camera registrations and their vendor resources.
///
/// All operations take `&mut self`; callers that share a rig between
/// threads must serialize access themselves (see [`RigWorker`](crate::worker::RigWorker)).
pub struct StereoRig<S: CameraSdk> {
    pub(super) sdk: S,
    pub(super) serials: SerialPair,
    pub(super) acquisition: AcquisitionConfig,
    pub(super) stages: StageConfig,
    pub(super) registry: DeviceRegistry,
    pub(super) frame_buffer_size: usize,
    pub(super) tracker: PerformanceTracker,
    pub(super) state: RigState,
    pub(super) configuration_warnings: Vec<StereoError>,
    pub(super) last_release: Option<ReleaseReport>,
    pub(super) capture_sequence: u64,
}

impl<S: CameraSdk> StereoRig<S> {
    pub fn new(sdk: S, acquisition: AcquisitionConfig, stages: StageConfig) -> Self {
        Self::with_tracker(sdk, acquisition, stages, PerformanceTracker::new())
    }

    /// Rig whose frame-rate estimator reads the given clock
    pub fn with_clock(
        sdk: S,
        acquisition: AcquisitionConfig,
        stages: StageConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_tracker(sdk, acquisition, stages, PerformanceTracker::with_clock(clock))
    }

    fn with_tracker(
        sdk: S,
        acquisition: AcquisitionConfig,
        stages: StageConfig,
        tracker: PerformanceTracker,
    ) -> Self {
        Self {
            sdk,
            serials: SerialPair::BUILT_IN,
            acquisition,
            stages,
            registry: DeviceRegistry::new(),
            frame_buffer_size: 0,
            tracker,
            state: RigState::Uninit,
            configuration_warnings: Vec::new(),
            last_release: None,
            capture_sequence: 0,
        }
    }

    /// Bring both cameras up from nothing to ready-to-capture.
    ///
    /// Any fatal failure releases everything acquired so far before the
    /// error is returned, so a failed call never leaves a device open.
    pub fn initialize(&mut self) -> Result<()> {
        if !self.state.can_initialize() {
            return Err(StereoError::InvalidState {
                operation: "initialize",
                state: self.state.to_string(),
            });
        }

        info!("Initializing stereo camera rig");
        match self.bring_up() {
            Ok(()) => {
                info!(
                    "Stereo camera rig ready ({} bytes per frame, {} configuration warning(s))",
                    self.frame_buffer_size,
                    self.configuration_warnings.len()
                );
                Ok(())
            }
            Err(e) => {
                error!("Stereo camera rig initialization failed: {}", e);
                self.state = RigState::Teardown;
                let report = self.release_devices();
                if let Err(release_error) = report.to_result() {
                    warn!("Cleanup after failed initialization reported: {}", release_error);
                }
                self.last_release = Some(report);
                Err(e)
            }
        }
    }

    fn bring_up(&mut self) -> Result<()> {
        self.sdk
            .initialize()
            .map_err(|source| StereoError::SdkUnavailable { source })?;
        self.state = RigState::SdkReady;

        let devices = self
            .sdk
            .enumerate_devices(TRANSPORT)
            .map_err(|source| StereoError::SdkUnavailable { source })?;
        info!("Found {} {:?} device(s)", devices.len(), TRANSPORT);
        if devices.len() != CAMERA_COUNT {
            return Err(StereoError::DeviceCountMismatch {
                found: devices.len(),
            });
        }
        self.state = RigState::Enumerated;

        for device in &devices {
            debug!(
                "Device {}: serial {} model {} ({:?})",
                device.device_number, device.serial, device.model, device.transport
            );
        }

        let serials: Vec<&str> = devices.iter().map(|d| d.serial.as_str()).collect();
        let positions = identify(&serials, &self.serials)?;
        self.registry
            .assign([devices[0].serial.clone(), devices[1].serial.clone()], positions);
        self.state = RigState::Identified;
        info!(
            "Identified cameras: slot 0 = {} ({}), slot 1 = {} ({})",
            positions[0], devices[0].serial, positions[1], devices[1].serial
        );

        for (slot, device) in devices.iter().enumerate() {
            let handle = self
                .sdk
                .create_handle(device)
                .map_err(|source| StereoError::HandleCreationFailed { slot, source })?;
            if let Some(entry) = self.registry.slot_mut(slot) {
                entry.handle = Some(handle);
            }
        }
        self.state = RigState::HandlesCreated;

        for (slot, entry) in self.registry.slots_mut().iter_mut().enumerate() {
            let Some(handle) = entry.handle else {
                continue;
            };
            self.sdk
                .open_device(handle, AccessMode::Exclusive)
                .map_err(|source| StereoError::OpenFailed { slot, source })?;
            entry.opened = true;
            debug!("Opened camera slot {} ({})", slot, entry.serial);
        }
        self.state = RigState::Opened;

        self.apply_startup_configuration()?;
        self.state = RigState::Configured;

        self.negotiate_frame_buffer_size()?;
        self.capture_sequence = 0;
        self.state = RigState::Ready;
        Ok(())
    }

    /// Start continuous acquisition on both cameras
    pub fn start_grabbing(&mut self) -> Result<()> {
        if self.state != RigState::Ready {
            return Err(StereoError::InvalidState {
                operation: "start grabbing",
                state: self.state.to_string(),
            });
        }

        for slot in 0..CAMERA_COUNT {
            let handle = self.open_handle(slot)?;
            if let Err(source) = self.sdk.start_grabbing(handle) {
                error!("Failed to start grabbing on camera slot {}: {}", slot, source);
                for started in 0..slot {
                    if let Ok(handle) = self.open_handle(started) {
                        if let Err(e) = self.sdk.stop_grabbing(handle) {
                            debug!("Stop after failed start on slot {}: {}", started, e);
                        }
                    }
                }
                return Err(StereoError::AcquisitionFailed { slot, source });
            }
        }

        self.state = RigState::Grabbing;
        info!("Acquisition started on both cameras");
        Ok(())
    }

    /// Stop acquisition and return to ready
    pub fn stop_grabbing(&mut self) -> Result<()> {
        if self.state != RigState::Grabbing {
            return Err(StereoError::InvalidState {
                operation: "stop grabbing",
                state: self.state.to_string(),
            });
        }

        let mut outcome = Ok(());
        for slot in 0..CAMERA_COUNT {
            let handle = self.open_handle(slot)?;
            match self.sdk.stop_grabbing(handle) {
                Ok(()) => {}
                Err(e) if e.is_call_order() => debug!("Camera slot {} was not grabbing", slot),
                Err(source) => {
                    warn!("Failed to stop grabbing on camera slot {}: {}", slot, source);
                    outcome = Err(StereoError::AcquisitionFailed { slot, source });
                }
            }
        }

        self.state = RigState::Ready;
        info!("Acquisition stopped");
        outcome
    }

    /// Measured frame rate and dropped-frame count of an open camera
    pub fn get_status(&self, slot: usize) -> Result<(f32, u32)> {
        let handle = self.open_handle(slot)?;

        match self.sdk.get_float_param(handle, params::ACQUISITION_FRAME_RATE) {
            Ok(hardware_fps) => debug!(
                "Camera slot {} hardware frame rate {:.2} fps",
                slot, hardware_fps
            ),
            Err(e) => debug!("Camera slot {} frame rate unavailable: {}", slot, e),
        }

        self.tracker.status(slot)
    }

    pub fn snapshot(&self, slot: usize) -> Result<PerformanceSnapshot> {
        self.open_handle(slot)?;
        let stats = self
            .tracker
            .stats(slot)
            .ok_or_else(|| StereoError::invalid_argument(format!("camera slot {} out of range", slot)))?;
        let position = self
            .registry
            .slot(slot)
            .map(|entry| entry.position)
            .unwrap_or(CameraPosition::Uninitialized);
        Ok(PerformanceSnapshot::new(slot, position, stats))
    }

    /// Snapshots of every open camera
    pub fn health(&self) -> RigHealth {
        let cameras = (0..CAMERA_COUNT)
            .filter_map(|slot| self.snapshot(slot).ok())
            .collect();
        RigHealth::new(cameras)
    }

    /// Negotiated bytes per frame, 0 until initialization succeeds
    pub fn frame_buffer_size(&self) -> usize {
        self.frame_buffer_size
    }

    pub fn state(&self) -> RigState {
        self.state
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Parameter writes rejected during the last initialization
    pub fn configuration_warnings(&self) -> &[StereoError] {
        &self.configuration_warnings
    }

    pub fn stats(&self, slot: usize) -> Option<&PerformanceStats> {
        self.tracker.stats(slot)
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }
}

impl<S: CameraSdk> Drop for StereoRig<S> {
    fn drop(&mut self) {
        if !self.state.holds_devices() {
            return;
        }
        debug!("Dropping stereo rig in state {}, releasing", self.state);
        if let Err(e) = self.release() {
            warn!("Release on drop failed: {}", e);
        }
    }
}

impl<S: CameraSdk> std::fmt::Debug for StereoRig<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StereoRig")
            .field("state", &self.state)
            .field("registry", &self.registry)
            .field("frame_buffer_size", &self.frame_buffer_size)
            .finish_non_exhaustive()
    }
}

