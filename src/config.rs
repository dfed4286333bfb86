use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StereoConfig {
    pub acquisition: AcquisitionConfig,
    pub stages: StageConfig,
    pub capture: CaptureConfig,
}

/// Parameter set written to both cameras at startup
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AcquisitionConfig {
    /// Target acquisition rate in frames per second
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,

    /// Exposure time in microseconds
    #[serde(default = "default_exposure_time_us")]
    pub exposure_time_us: f32,

    /// Analog gain with auto gain disabled
    #[serde(default = "default_gain")]
    pub gain: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StageConfig {
    /// Frame rate used while previewing
    #[serde(default = "default_preview_frame_rate")]
    pub preview_frame_rate: f32,

    /// Short exposure used while aligning, in microseconds
    #[serde(default = "default_alignment_exposure_us")]
    pub alignment_exposure_us: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Directory for raw frame dumps
    #[serde(default = "default_capture_path")]
    pub path: String,
}

impl StereoConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("acquisition.frame_rate", default_frame_rate() as f64)?
            .set_default(
                "acquisition.exposure_time_us",
                default_exposure_time_us() as f64,
            )?
            .set_default("acquisition.gain", default_gain() as f64)?
            .set_default(
                "stages.preview_frame_rate",
                default_preview_frame_rate() as f64,
            )?
            .set_default(
                "stages.alignment_exposure_us",
                default_alignment_exposure_us() as f64,
            )?
            .set_default("capture.path", default_capture_path())?
            .add_source(File::with_name(&path_str).required(false))
            // STEREOCAM_ACQUISITION__FRAME_RATE -> acquisition.frame_rate
            .add_source(
                Environment::with_prefix("STEREOCAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: StereoConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("acquisition.frame_rate", self.acquisition.frame_rate),
            ("acquisition.exposure_time_us", self.acquisition.exposure_time_us),
            ("stages.preview_frame_rate", self.stages.preview_frame_rate),
            ("stages.alignment_exposure_us", self.stages.alignment_exposure_us),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::Message(format!(
                    "{} must be greater than 0, got {}",
                    name, value
                )));
            }
        }

        if !(self.acquisition.gain >= 0.0) || !self.acquisition.gain.is_finite() {
            return Err(ConfigError::Message(format!(
                "acquisition.gain must not be negative, got {}",
                self.acquisition.gain
            )));
        }

        if self.capture.path.trim().is_empty() {
            return Err(ConfigError::Message(
                "capture.path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory raw frames are written to when no explicit one is given
    pub fn capture_dir(&self) -> PathBuf {
        PathBuf::from(self.capture.path.trim())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Message(e.to_string()))
    }

    /// The built-in defaults as a TOML document
    pub fn default_toml() -> Result<String, ConfigError> {
        Self::default().to_toml()
    }
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig::default(),
            stages: StageConfig::default(),
            capture: CaptureConfig {
                path: default_capture_path(),
            },
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            exposure_time_us: default_exposure_time_us(),
            gain: default_gain(),
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            preview_frame_rate: default_preview_frame_rate(),
            alignment_exposure_us: default_alignment_exposure_us(),
        }
    }
}

// Default value functions
fn default_frame_rate() -> f32 {
    10.0
}
fn default_exposure_time_us() -> f32 {
    90_000.0
}
fn default_gain() -> f32 {
    5.0
}

fn default_preview_frame_rate() -> f32 {
    10.0
}
fn default_alignment_exposure_us() -> f32 {
    10_000.0
}

fn default_capture_path() -> String {
    "./captures".to_string()
}
