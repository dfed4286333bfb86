use serde::{Deserialize, Serialize};
use std::fmt;

/// Vendor status code returned by a failed SDK call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SdkError(pub u32);

impl SdkError {
    pub const HANDLE: SdkError = SdkError(0x8000_0000);
    pub const UNSUPPORTED: SdkError = SdkError(0x8000_0001);
    pub const BUFFER_OVERFLOW: SdkError = SdkError(0x8000_0002);
    pub const CALL_ORDER: SdkError = SdkError(0x8000_0003);
    pub const PARAMETER: SdkError = SdkError(0x8000_0004);
    pub const RESOURCE: SdkError = SdkError(0x8000_0006);
    pub const NO_DATA: SdkError = SdkError(0x8000_0007);
    pub const UNKNOWN: SdkError = SdkError(0x8000_00FF);
    pub const ACCESS_DENIED: SdkError = SdkError(0x8000_0203);

    pub fn code(&self) -> u32 {
        self.0
    }

    /// Operation issued in the wrong device state, e.g. stopping a device that never started
    pub fn is_call_order(&self) -> bool {
        *self == Self::CALL_ORDER
    }

    /// No frame arrived within the requested wait
    pub fn is_timeout(&self) -> bool {
        *self == Self::NO_DATA
    }
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sdk error 0x{:x}", self.0)
    }
}

impl std::error::Error for SdkError {}

pub type SdkResult<T> = std::result::Result<T, SdkError>;

/// Physical interface family used when enumerating devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportLayer {
    Usb3,
    GigE,
}

/// Device open mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// No other process may open the device
    Exclusive,
    Control,
    Monitor,
}

/// Opaque ownership token for one opened physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u64);

/// Enumerated device description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub serial: String,
    pub model: String,
    pub user_defined_name: String,
    pub device_number: u32,
    pub transport: TransportLayer,
}

/// GenICam feature names used by the rig
pub mod params {
    pub const WIDTH: &str = "Width";
    pub const HEIGHT: &str = "Height";
    pub const PIXEL_SIZE: &str = "PixelSize";
    pub const TRIGGER_MODE: &str = "TriggerMode";
    pub const TRIGGER_SOURCE: &str = "TriggerSource";
    pub const TRIGGER_SOFTWARE: &str = "TriggerSoftware";
    pub const ACQUISITION_FRAME_RATE_ENABLE: &str = "AcquisitionFrameRateEnable";
    pub const ACQUISITION_FRAME_RATE: &str = "AcquisitionFrameRate";
    pub const EXPOSURE_TIME: &str = "ExposureTime";
    pub const GAIN_AUTO: &str = "GainAuto";
    pub const GAIN: &str = "Gain";
}
