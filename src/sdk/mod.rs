//! Contract the rig expects from the vendor camera SDK.
//!
//! The vendor binding itself lives outside this crate; hosts implement
//! [`CameraSdk`] over it and hand the implementation to
//! [`StereoRig`](crate::rig::StereoRig). [`MockSdk`] is an in-memory
//! implementation used by the tests and the simulator binary.

mod mock;
mod types;

pub use mock::{MockDevice, MockFrame, MockSdk, ParamValue, SdkOp};
pub use types::{params, AccessMode, DeviceHandle, DeviceInfo, SdkError, SdkResult, TransportLayer};

use std::time::Duration;

/// A vendor-owned frame buffer handed out by [`CameraSdk::get_image_buffer`].
///
/// The buffer stays valid until it is passed back to
/// [`CameraSdk::free_image_buffer`].
pub trait VendorFrame {
    /// Frame length reported by the device, in bytes
    fn frame_len(&self) -> usize;

    /// Device-side sequence number of this frame
    fn frame_number(&self) -> u64;

    /// Frame payload
    fn data(&self) -> &[u8];
}

/// Operations the rig needs from the vendor hardware layer.
///
/// All calls are synchronous. Handles are exclusively owned by the caller
/// between `create_handle` and `destroy_handle`.
pub trait CameraSdk: Send {
    type Frame: VendorFrame;

    fn initialize(&self) -> SdkResult<()>;
    fn finalize(&self) -> SdkResult<()>;

    fn enumerate_devices(&self, transport: TransportLayer) -> SdkResult<Vec<DeviceInfo>>;

    fn create_handle(&self, device: &DeviceInfo) -> SdkResult<DeviceHandle>;
    fn destroy_handle(&self, handle: DeviceHandle) -> SdkResult<()>;

    fn open_device(&self, handle: DeviceHandle, access: AccessMode) -> SdkResult<()>;
    fn close_device(&self, handle: DeviceHandle) -> SdkResult<()>;

    fn start_grabbing(&self, handle: DeviceHandle) -> SdkResult<()>;
    fn stop_grabbing(&self, handle: DeviceHandle) -> SdkResult<()>;

    /// Wait up to `timeout` for the next frame
    fn get_image_buffer(&self, handle: DeviceHandle, timeout: Duration) -> SdkResult<Self::Frame>;
    fn free_image_buffer(&self, handle: DeviceHandle, frame: Self::Frame) -> SdkResult<()>;

    fn get_int_param(&self, handle: DeviceHandle, key: &str) -> SdkResult<i64>;
    fn get_enum_param(&self, handle: DeviceHandle, key: &str) -> SdkResult<u32>;
    fn get_float_param(&self, handle: DeviceHandle, key: &str) -> SdkResult<f32>;

    fn set_float_param(&self, handle: DeviceHandle, key: &str, value: f32) -> SdkResult<()>;
    fn set_enum_param(&self, handle: DeviceHandle, key: &str, value: u32) -> SdkResult<()>;
    fn set_enum_param_by_str(&self, handle: DeviceHandle, key: &str, value: &str) -> SdkResult<()>;
    fn set_bool_param(&self, handle: DeviceHandle, key: &str, value: bool) -> SdkResult<()>;

    fn execute_command(&self, handle: DeviceHandle, key: &str) -> SdkResult<()>;
}
