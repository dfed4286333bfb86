use super::lifecycle::StereoRig;
use super::ACQUISITION_TIMEOUT;
use crate::error::{Result, StereoError};
use crate::frame::StereoFrame;
use crate::registry::{CameraPosition, CAMERA_COUNT};
use crate::sdk::{CameraSdk, DeviceHandle, VendorFrame};
use chrono::Utc;
use tracing::{debug, trace, warn};

/// Bytes written and device frame number for one camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CopiedFrame {
    written: usize,
    frame_number: u64,
}

impl<S: CameraSdk> StereoRig<S> {
    /// Grab one frame from each camera into caller-owned buffers.
    ///
    /// Destinations are indexed by slot and must each hold at least
    /// [`frame_buffer_size`](Self::frame_buffer_size) bytes. Either both
    /// frames are copied or neither destination is touched. Frames larger
    /// than the negotiated size are truncated without error.
    pub fn capture_frame_pair(&mut self, destinations: [&mut [u8]; CAMERA_COUNT]) -> Result<[usize; CAMERA_COUNT]> {
        let copied = self.capture_into(destinations)?;
        Ok(copied.map(|frame| frame.written))
    }

    /// Capture a pair into freshly allocated buffers, ordered left then right
    pub fn capture_stereo_frame(&mut self) -> Result<StereoFrame> {
        let (_, size) = self.capture_preconditions()?;
        let mut first = vec![0u8; size];
        let mut second = vec![0u8; size];

        let copied = self.capture_into([first.as_mut_slice(), second.as_mut_slice()])?;
        first.truncate(copied[0].written);
        second.truncate(copied[1].written);

        let left_slot = self
            .registry
            .index_of(CameraPosition::Left)
            .ok_or_else(|| StereoError::InvalidState {
                operation: "order captured frames",
                state: self.state.to_string(),
            })?;
        let (left, right, left_number, right_number) = if left_slot == 0 {
            (first, second, copied[0].frame_number, copied[1].frame_number)
        } else {
            (second, first, copied[1].frame_number, copied[0].frame_number)
        };

        self.capture_sequence += 1;
        Ok(StereoFrame {
            sequence: self.capture_sequence,
            left,
            right,
            left_frame_number: left_number,
            right_frame_number: right_number,
            timestamp: Utc::now(),
        })
    }

    /// Both open handles and the negotiated frame size
    fn capture_preconditions(&self) -> Result<([DeviceHandle; CAMERA_COUNT], usize)> {
        let handles = [self.open_handle(0)?, self.open_handle(1)?];
        if self.frame_buffer_size == 0 {
            return Err(StereoError::InvalidState {
                operation: "capture",
                state: self.state.to_string(),
            });
        }
        Ok((handles, self.frame_buffer_size))
    }

    fn capture_into(&mut self, destinations: [&mut [u8]; CAMERA_COUNT]) -> Result<[CopiedFrame; CAMERA_COUNT]> {
        let (handles, size) = self.capture_preconditions()?;

        for (slot, destination) in destinations.iter().enumerate() {
            if destination.len() < size {
                return Err(StereoError::invalid_argument(format!(
                    "destination for camera slot {} holds {} bytes, need {}",
                    slot,
                    destination.len(),
                    size
                )));
            }
        }

        let mut acquired: Vec<(DeviceHandle, S::Frame)> = Vec::with_capacity(CAMERA_COUNT);
        for (slot, handle) in handles.iter().enumerate() {
            match self.sdk.get_image_buffer(*handle, ACQUISITION_TIMEOUT) {
                Ok(frame) => {
                    acquired.push((*handle, frame));
                    if let Some(entry) = self.registry.slot_mut(slot) {
                        entry.trigger_pending = false;
                    }
                }
                Err(source) => {
                    warn!("Camera slot {} acquisition failed: {}", slot, source);
                    self.free_frames(acquired);
                    return Err(StereoError::acquisition(slot, source));
                }
            }
        }

        let mut copied = [CopiedFrame {
            written: 0,
            frame_number: 0,
        }; CAMERA_COUNT];
        for (slot, ((_, frame), destination)) in acquired.iter().zip(destinations).enumerate() {
            let data = frame.data();
            let copy_len = frame.frame_len().min(size).min(data.len());
            if frame.frame_len() > size {
                debug!(
                    "Camera slot {} frame of {} bytes truncated to {}",
                    slot,
                    frame.frame_len(),
                    size
                );
            }
            destination[..copy_len].copy_from_slice(&data[..copy_len]);
            copied[slot] = CopiedFrame {
                written: copy_len,
                frame_number: frame.frame_number(),
            };
            trace!(
                "Camera slot {} frame {} copied ({} bytes)",
                slot,
                frame.frame_number(),
                copy_len
            );
        }

        self.free_frames(acquired);

        for (slot, frame) in copied.iter().enumerate() {
            self.tracker.record_frame_number(slot, frame.frame_number)?;
        }

        Ok(copied)
    }

    fn free_frames(&self, acquired: Vec<(DeviceHandle, S::Frame)>) {
        for (handle, frame) in acquired {
            if let Err(e) = self.sdk.free_image_buffer(handle, frame) {
                warn!("Failed to free frame buffer on handle {:?}: {}", handle, e);
            }
        }
    }
}
