use super::types::{params, AccessMode, DeviceHandle, DeviceInfo, SdkError, SdkResult, TransportLayer};
use super::{CameraSdk, VendorFrame};
use crate::rig::{LEFT_CAMERA_SERIAL, RIGHT_CAMERA_SERIAL};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// SDK operations that can carry an injected fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkOp {
    Initialize,
    Finalize,
    Enumerate,
    CreateHandle,
    DestroyHandle,
    OpenDevice,
    CloseDevice,
    StartGrabbing,
    StopGrabbing,
    GetImageBuffer,
    FreeImageBuffer,
    GetParam,
    SetParam,
    ExecuteCommand,
}

/// Stored parameter value on a simulated device
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f32),
    Enum(u32),
    EnumStr(String),
    Bool(bool),
}

/// Simulated physical camera
#[derive(Debug, Clone)]
pub struct MockDevice {
    pub info: DeviceInfo,
    pub width: i64,
    pub height: i64,
    pub pixel_bits: u32,
    /// Reported frame length; defaults to the geometry-derived size
    pub frame_len: Option<usize>,
    /// Byte every payload is filled with
    pub fill: u8,
}

impl MockDevice {
    /// A 2448x2048 Mono8 USB3 camera
    pub fn new(serial: &str) -> Self {
        Self {
            info: DeviceInfo {
                serial: serial.to_string(),
                model: "MV-CS050-10UM".to_string(),
                user_defined_name: String::new(),
                device_number: 0,
                transport: TransportLayer::Usb3,
            },
            width: 2448,
            height: 2048,
            pixel_bits: 8,
            frame_len: None,
            fill: 0x5A,
        }
    }

    pub fn with_geometry(mut self, width: i64, height: i64, pixel_bits: u32) -> Self {
        self.width = width;
        self.height = height;
        self.pixel_bits = pixel_bits;
        self
    }

    pub fn with_frame_len(mut self, frame_len: usize) -> Self {
        self.frame_len = Some(frame_len);
        self
    }

    pub fn with_fill(mut self, fill: u8) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_transport(mut self, transport: TransportLayer) -> Self {
        self.info.transport = transport;
        self
    }

    fn payload_len(&self) -> usize {
        self.frame_len.unwrap_or_else(|| {
            let bytes_per_pixel = self.pixel_bits.div_ceil(8) as usize;
            self.width.max(0) as usize * self.height.max(0) as usize * bytes_per_pixel
        })
    }
}

/// Frame buffer handed out by [`MockSdk`]
#[derive(Debug)]
pub struct MockFrame {
    buffer_id: u64,
    frame_number: u64,
    frame_len: usize,
    data: Vec<u8>,
}

impl VendorFrame for MockFrame {
    fn frame_len(&self) -> usize {
        self.frame_len
    }

    fn frame_number(&self) -> u64 {
        self.frame_number
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Clone)]
struct Fault {
    op: SdkOp,
    device: Option<usize>,
    key: Option<String>,
    error: SdkError,
}

#[derive(Debug)]
struct HandleState {
    device: usize,
    opened: bool,
    grabbing: bool,
    pending_triggers: u32,
}

#[derive(Debug, Default)]
struct MockState {
    initialized: bool,
    devices: Vec<MockDevice>,
    handles: HashMap<u64, HandleState>,
    next_handle: u64,
    next_buffer: u64,
    next_frame_number: HashMap<usize, u64>,
    skipped_frames: HashMap<usize, u64>,
    outstanding: HashMap<u64, usize>,
    acquisitions: HashMap<usize, usize>,
    frees: HashMap<usize, usize>,
    device_params: HashMap<usize, HashMap<String, ParamValue>>,
    faults: Vec<Fault>,
    calls: HashMap<SdkOp, usize>,
}

impl MockState {
    /// Record the call and return any injected fault that matches it
    fn check(&mut self, op: SdkOp, device: Option<usize>, key: Option<&str>) -> SdkResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;
        let fault = self.faults.iter().find(|fault| {
            fault.op == op
                && (fault.device.is_none() || fault.device == device)
                && (fault.key.is_none() || fault.key.as_deref() == key)
        });
        match fault {
            Some(fault) => {
                trace!("Mock SDK injecting {} for {:?} on device {:?}", fault.error, op, device);
                Err(fault.error)
            }
            None => Ok(()),
        }
    }

    fn device_of(&self, handle: DeviceHandle) -> SdkResult<usize> {
        self.handles
            .get(&handle.0)
            .map(|state| state.device)
            .ok_or(SdkError::HANDLE)
    }

    fn handle_mut(&mut self, handle: DeviceHandle) -> SdkResult<&mut HandleState> {
        self.handles.get_mut(&handle.0).ok_or(SdkError::HANDLE)
    }

    fn require_open(&self, handle: DeviceHandle) -> SdkResult<usize> {
        let state = self.handles.get(&handle.0).ok_or(SdkError::HANDLE)?;
        if state.opened {
            Ok(state.device)
        } else {
            Err(SdkError::CALL_ORDER)
        }
    }

    fn store_param(&mut self, handle: DeviceHandle, key: &str, value: ParamValue) -> SdkResult<()> {
        let device = self.require_open(handle)?;
        self.check(SdkOp::SetParam, Some(device), Some(key))?;
        self.device_params
            .entry(device)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn stored_param(&self, device: usize, key: &str) -> Option<&ParamValue> {
        self.device_params.get(&device).and_then(|params| params.get(key))
    }
}

/// In-memory vendor layer with fault injection and call accounting.
///
/// Clones share state, so a test can keep one clone for inspection after
/// handing another to a rig.
#[derive(Debug, Clone)]
pub struct MockSdk {
    state: Arc<Mutex<MockState>>,
}

impl MockSdk {
    /// Simulated SDK exposing the given devices in enumeration order
    pub fn new(devices: Vec<MockDevice>) -> Self {
        let devices = devices
            .into_iter()
            .enumerate()
            .map(|(index, mut device)| {
                device.info.device_number = index as u32;
                device
            })
            .collect();

        Self {
            state: Arc::new(Mutex::new(MockState {
                devices,
                next_handle: 1,
                next_buffer: 1,
                ..MockState::default()
            })),
        }
    }

    /// The built-in left/right pair, enumerated left first
    pub fn stereo_pair() -> Self {
        Self::new(vec![
            MockDevice::new(LEFT_CAMERA_SERIAL).with_fill(0x11),
            MockDevice::new(RIGHT_CAMERA_SERIAL).with_fill(0x22),
        ])
    }

    /// Fail every call of `op` with `error`
    pub fn fail(&self, op: SdkOp, error: SdkError) {
        self.state.lock().faults.push(Fault {
            op,
            device: None,
            key: None,
            error,
        });
    }

    /// Fail calls of `op` on the device at enumeration index `device`
    pub fn fail_on(&self, op: SdkOp, device: usize, error: SdkError) {
        self.state.lock().faults.push(Fault {
            op,
            device: Some(device),
            key: None,
            error,
        });
    }

    /// Fail every write of the named parameter
    pub fn fail_param(&self, key: &str, error: SdkError) {
        self.state.lock().faults.push(Fault {
            op: SdkOp::SetParam,
            device: None,
            key: Some(key.to_string()),
            error,
        });
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Make the next frame on `device` jump ahead by `count` frame numbers
    pub fn skip_frames(&self, device: usize, count: u64) {
        *self.state.lock().skipped_frames.entry(device).or_insert(0) += count;
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    pub fn live_handles(&self) -> usize {
        self.state.lock().handles.len()
    }

    pub fn open_devices(&self) -> usize {
        self.state.lock().handles.values().filter(|h| h.opened).count()
    }

    pub fn is_grabbing(&self, device: usize) -> bool {
        self.state
            .lock()
            .handles
            .values()
            .any(|h| h.device == device && h.grabbing)
    }

    /// Frame buffers acquired but not yet freed
    pub fn outstanding_buffers(&self) -> usize {
        self.state.lock().outstanding.len()
    }

    pub fn acquisitions(&self, device: usize) -> usize {
        self.state.lock().acquisitions.get(&device).copied().unwrap_or(0)
    }

    pub fn frees(&self, device: usize) -> usize {
        self.state.lock().frees.get(&device).copied().unwrap_or(0)
    }

    pub fn calls(&self, op: SdkOp) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn param(&self, device: usize, key: &str) -> Option<ParamValue> {
        self.state.lock().stored_param(device, key).cloned()
    }
}

impl Default for MockSdk {
    fn default() -> Self {
        Self::stereo_pair()
    }
}

impl CameraSdk for MockSdk {
    type Frame = MockFrame;

    fn initialize(&self) -> SdkResult<()> {
        let mut state = self.state.lock();
        state.check(SdkOp::Initialize, None, None)?;
        state.initialized = true;
        debug!("Mock SDK initialized");
        Ok(())
    }

    fn finalize(&self) -> SdkResult<()> {
        let mut state = self.state.lock();
        state.check(SdkOp::Finalize, None, None)?;
        if !state.initialized {
            return Err(SdkError::CALL_ORDER);
        }
        state.initialized = false;
        debug!("Mock SDK finalized");
        Ok(())
    }

    fn enumerate_devices(&self, transport: TransportLayer) -> SdkResult<Vec<DeviceInfo>> {
        let mut state = self.state.lock();
        state.check(SdkOp::Enumerate, None, None)?;
        if !state.initialized {
            return Err(SdkError::CALL_ORDER);
        }
        Ok(state
            .devices
            .iter()
            .filter(|device| device.info.transport == transport)
            .map(|device| device.info.clone())
            .collect())
    }

    fn create_handle(&self, device: &DeviceInfo) -> SdkResult<DeviceHandle> {
        let mut state = self.state.lock();
        let index = state
            .devices
            .iter()
            .position(|candidate| candidate.info.serial == device.serial)
            .ok_or(SdkError::PARAMETER)?;
        state.check(SdkOp::CreateHandle, Some(index), None)?;
        if !state.initialized {
            return Err(SdkError::CALL_ORDER);
        }

        let id = state.next_handle;
        state.next_handle += 1;
        state.handles.insert(
            id,
            HandleState {
                device: index,
                opened: false,
                grabbing: false,
                pending_triggers: 0,
            },
        );
        Ok(DeviceHandle(id))
    }

    fn destroy_handle(&self, handle: DeviceHandle) -> SdkResult<()> {
        let mut state = self.state.lock();
        let device = state.device_of(handle)?;
        state.check(SdkOp::DestroyHandle, Some(device), None)?;
        state.handles.remove(&handle.0);
        Ok(())
    }

    fn open_device(&self, handle: DeviceHandle, access: AccessMode) -> SdkResult<()> {
        let mut state = self.state.lock();
        let device = state.device_of(handle)?;
        state.check(SdkOp::OpenDevice, Some(device), None)?;

        let taken = state
            .handles
            .iter()
            .any(|(id, other)| *id != handle.0 && other.device == device && other.opened);
        if taken && access == AccessMode::Exclusive {
            return Err(SdkError::ACCESS_DENIED);
        }

        let entry = state.handle_mut(handle)?;
        if entry.opened {
            return Err(SdkError::CALL_ORDER);
        }
        entry.opened = true;
        Ok(())
    }

    fn close_device(&self, handle: DeviceHandle) -> SdkResult<()> {
        let mut state = self.state.lock();
        let device = state.device_of(handle)?;
        state.check(SdkOp::CloseDevice, Some(device), None)?;
        let entry = state.handle_mut(handle)?;
        if !entry.opened {
            return Err(SdkError::CALL_ORDER);
        }
        entry.opened = false;
        entry.grabbing = false;
        Ok(())
    }

    fn start_grabbing(&self, handle: DeviceHandle) -> SdkResult<()> {
        let mut state = self.state.lock();
        let device = state.require_open(handle)?;
        state.check(SdkOp::StartGrabbing, Some(device), None)?;
        let entry = state.handle_mut(handle)?;
        if entry.grabbing {
            return Err(SdkError::CALL_ORDER);
        }
        entry.grabbing = true;
        Ok(())
    }

    fn stop_grabbing(&self, handle: DeviceHandle) -> SdkResult<()> {
        let mut state = self.state.lock();
        let device = state.device_of(handle)?;
        state.check(SdkOp::StopGrabbing, Some(device), None)?;
        let entry = state.handle_mut(handle)?;
        if !entry.grabbing {
            return Err(SdkError::CALL_ORDER);
        }
        entry.grabbing = false;
        Ok(())
    }

    fn get_image_buffer(&self, handle: DeviceHandle, _timeout: Duration) -> SdkResult<MockFrame> {
        let mut state = self.state.lock();
        let device = state.device_of(handle)?;
        state.check(SdkOp::GetImageBuffer, Some(device), None)?;

        let software_triggered = matches!(
            state.stored_param(device, params::TRIGGER_MODE),
            Some(ParamValue::Enum(1))
        );
        let entry = state.handle_mut(handle)?;
        if !entry.grabbing {
            return Err(SdkError::CALL_ORDER);
        }
        if software_triggered {
            if entry.pending_triggers == 0 {
                return Err(SdkError::NO_DATA);
            }
            entry.pending_triggers -= 1;
        }

        let skipped = state.skipped_frames.remove(&device).unwrap_or(0);
        let counter = state.next_frame_number.entry(device).or_insert(0);
        *counter += skipped;
        let frame_number = *counter;
        *counter += 1;

        let (frame_len, fill) = {
            let model = &state.devices[device];
            (model.payload_len(), model.fill)
        };

        let buffer_id = state.next_buffer;
        state.next_buffer += 1;
        state.outstanding.insert(buffer_id, device);
        *state.acquisitions.entry(device).or_insert(0) += 1;

        trace!("Mock SDK frame {} from device {} ({} bytes)", frame_number, device, frame_len);
        Ok(MockFrame {
            buffer_id,
            frame_number,
            frame_len,
            data: vec![fill; frame_len],
        })
    }

    fn free_image_buffer(&self, handle: DeviceHandle, frame: MockFrame) -> SdkResult<()> {
        let mut state = self.state.lock();
        let device = state.device_of(handle)?;
        state.check(SdkOp::FreeImageBuffer, Some(device), None)?;
        if state.outstanding.remove(&frame.buffer_id).is_none() {
            return Err(SdkError::PARAMETER);
        }
        *state.frees.entry(device).or_insert(0) += 1;
        Ok(())
    }

    fn get_int_param(&self, handle: DeviceHandle, key: &str) -> SdkResult<i64> {
        let mut state = self.state.lock();
        let device = state.device_of(handle)?;
        state.check(SdkOp::GetParam, Some(device), Some(key))?;
        match key {
            params::WIDTH => Ok(state.devices[device].width),
            params::HEIGHT => Ok(state.devices[device].height),
            _ => match state.stored_param(device, key) {
                Some(ParamValue::Int(value)) => Ok(*value),
                _ => Err(SdkError::PARAMETER),
            },
        }
    }

    fn get_enum_param(&self, handle: DeviceHandle, key: &str) -> SdkResult<u32> {
        let mut state = self.state.lock();
        let device = state.device_of(handle)?;
        state.check(SdkOp::GetParam, Some(device), Some(key))?;
        match key {
            params::PIXEL_SIZE => Ok(state.devices[device].pixel_bits),
            _ => match state.stored_param(device, key) {
                Some(ParamValue::Enum(value)) => Ok(*value),
                _ => Err(SdkError::PARAMETER),
            },
        }
    }

    fn get_float_param(&self, handle: DeviceHandle, key: &str) -> SdkResult<f32> {
        let mut state = self.state.lock();
        let device = state.device_of(handle)?;
        state.check(SdkOp::GetParam, Some(device), Some(key))?;
        match state.stored_param(device, key) {
            Some(ParamValue::Float(value)) => Ok(*value),
            _ => Err(SdkError::PARAMETER),
        }
    }

    fn set_float_param(&self, handle: DeviceHandle, key: &str, value: f32) -> SdkResult<()> {
        self.state.lock().store_param(handle, key, ParamValue::Float(value))
    }

    fn set_enum_param(&self, handle: DeviceHandle, key: &str, value: u32) -> SdkResult<()> {
        self.state.lock().store_param(handle, key, ParamValue::Enum(value))
    }

    fn set_enum_param_by_str(&self, handle: DeviceHandle, key: &str, value: &str) -> SdkResult<()> {
        self.state
            .lock()
            .store_param(handle, key, ParamValue::EnumStr(value.to_string()))
    }

    fn set_bool_param(&self, handle: DeviceHandle, key: &str, value: bool) -> SdkResult<()> {
        self.state.lock().store_param(handle, key, ParamValue::Bool(value))
    }

    fn execute_command(&self, handle: DeviceHandle, key: &str) -> SdkResult<()> {
        let mut state = self.state.lock();
        let device = state.require_open(handle)?;
        state.check(SdkOp::ExecuteCommand, Some(device), Some(key))?;
        if key != params::TRIGGER_SOFTWARE {
            return Err(SdkError::UNSUPPORTED);
        }
        let entry = state.handle_mut(handle)?;
        if !entry.grabbing {
            return Err(SdkError::CALL_ORDER);
        }
        entry.pending_triggers += 1;
        Ok(())
    }
}
