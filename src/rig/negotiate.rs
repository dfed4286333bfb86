use super::lifecycle::StereoRig;
use crate::error::{Result, StereoError};
use crate::registry::CAMERA_COUNT;
use crate::sdk::{params, CameraSdk};
use tracing::{debug, error, info};

/// Bytes in one frame: `width * height * ceil(pixel_bits / 8)`.
///
/// `None` for empty geometry or a size that does not fit in memory.
pub fn frame_size(width: i64, height: i64, pixel_bits: u32) -> Option<usize> {
    if width <= 0 || height <= 0 || pixel_bits == 0 {
        return None;
    }
    let bytes_per_pixel = u64::from(pixel_bits.div_ceil(8));
    let total = (width as u64)
        .checked_mul(height as u64)?
        .checked_mul(bytes_per_pixel)?;
    usize::try_from(total).ok()
}

/// Both cameras must agree on the frame size
pub fn reconcile_frame_sizes(sizes: [usize; CAMERA_COUNT]) -> Result<usize> {
    let [first, second] = sizes;
    if first != second {
        return Err(StereoError::BufferSizeMismatch { first, second });
    }
    Ok(first)
}

impl<S: CameraSdk> StereoRig<S> {
    fn read_frame_size(&self, slot: usize) -> Result<usize> {
        let handle = self.open_handle(slot)?;
        let read_error = |parameter: &str| {
            let parameter = parameter.to_string();
            move |source| StereoError::ParameterAccess {
                slot,
                parameter,
                source,
            }
        };

        let width = self
            .sdk
            .get_int_param(handle, params::WIDTH)
            .map_err(read_error(params::WIDTH))?;
        let height = self
            .sdk
            .get_int_param(handle, params::HEIGHT)
            .map_err(read_error(params::HEIGHT))?;
        let pixel_bits = self
            .sdk
            .get_enum_param(handle, params::PIXEL_SIZE)
            .map_err(read_error(params::PIXEL_SIZE))?;

        debug!(
            "Camera slot {} geometry {}x{} @ {} bits per pixel",
            slot, width, height, pixel_bits
        );

        frame_size(width, height, pixel_bits).ok_or_else(|| {
            StereoError::invalid_argument(format!(
                "camera slot {} reports unusable geometry {}x{} @ {} bits",
                slot, width, height, pixel_bits
            ))
        })
    }

    /// Compute the shared frame buffer size from both cameras' geometry
    pub(super) fn negotiate_frame_buffer_size(&mut self) -> Result<usize> {
        self.frame_buffer_size = 0;

        let sizes = [self.read_frame_size(0)?, self.read_frame_size(1)?];
        let size = reconcile_frame_sizes(sizes).map_err(|e| {
            error!("Camera frame buffer sizes differ: {}", e);
            e
        })?;

        self.frame_buffer_size = size;
        info!("Negotiated frame buffer size: {} bytes", size);
        Ok(size)
    }
}
