use crate::sdk::SdkError;
use thiserror::Error;

/// Teardown step that produced a release outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    StopGrabbing,
    CloseDevice,
    DestroyHandle,
    Finalize,
}

impl std::fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReleaseStep::StopGrabbing => "stop grabbing",
            ReleaseStep::CloseDevice => "close device",
            ReleaseStep::DestroyHandle => "destroy handle",
            ReleaseStep::Finalize => "finalize sdk",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum StereoError {
    #[error("Camera SDK unavailable: {source}")]
    SdkUnavailable { source: SdkError },

    #[error("Expected 2 cameras, found {found}")]
    DeviceCountMismatch { found: usize },

    #[error("Camera serials {serials:?} do not match the configured left/right pair")]
    IdentificationFailed { serials: Vec<String> },

    #[error("Failed to create handle for camera slot {slot}: {source}")]
    HandleCreationFailed { slot: usize, source: SdkError },

    #[error("Failed to open camera slot {slot}: {source}")]
    OpenFailed { slot: usize, source: SdkError },

    #[error("Camera slot {slot} rejected parameter {parameter}: {source}")]
    ConfigurationWarning {
        slot: usize,
        parameter: String,
        source: SdkError,
    },

    #[error("Parameter {parameter} on camera slot {slot} failed: {source}")]
    ParameterAccess {
        slot: usize,
        parameter: String,
        source: SdkError,
    },

    #[error("Camera frame buffer sizes differ ({first} vs {second} bytes)")]
    BufferSizeMismatch { first: usize, second: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Camera slot {slot} timed out waiting for a frame")]
    AcquisitionTimeout { slot: usize },

    #[error("Frame acquisition failed on camera slot {slot}: {source}")]
    AcquisitionFailed { slot: usize, source: SdkError },

    #[error("Call order warning during {step} on camera slot {slot:?}")]
    CallOrderWarning {
        slot: Option<usize>,
        step: ReleaseStep,
    },

    #[error("Release failed during {step} on camera slot {slot:?}: {source}")]
    ReleaseFailed {
        step: ReleaseStep,
        slot: Option<usize>,
        source: SdkError,
    },

    #[error("Camera slot {slot} is not open")]
    CameraNotOpen { slot: usize },

    #[error("Cannot {operation} while rig is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("Unknown workflow stage '{0}'")]
    UnknownStage(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker error: {message}")]
    Worker { message: String },
}

impl StereoError {
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn worker<S: Into<String>>(message: S) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// Map a vendor acquisition failure for `slot` onto the timeout or generic kind
    pub fn acquisition(slot: usize, source: SdkError) -> Self {
        if source.is_timeout() {
            Self::AcquisitionTimeout { slot }
        } else {
            Self::AcquisitionFailed { slot, source }
        }
    }

    /// Whether this error only signals a non-fatal condition
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationWarning { .. } | Self::CallOrderWarning { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StereoError>;
