use crate::error::Result;
use crate::registry::CameraPosition;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One synchronized capture from both cameras, ordered by mounting position
#[derive(Debug, Clone, Serialize)]
pub struct StereoFrame {
    /// Capture counter since the rig was initialized, starting at 1
    pub sequence: u64,
    #[serde(skip)]
    pub left: Vec<u8>,
    #[serde(skip)]
    pub right: Vec<u8>,
    pub left_frame_number: u64,
    pub right_frame_number: u64,
    pub timestamp: DateTime<Utc>,
}

impl StereoFrame {
    pub fn image(&self, position: CameraPosition) -> Option<&[u8]> {
        match position {
            CameraPosition::Left => Some(self.left.as_slice()),
            CameraPosition::Right => Some(self.right.as_slice()),
            CameraPosition::Uninitialized => None,
        }
    }

    /// File name for one side, e.g. `frame_1700000000_000042_L.raw`
    pub fn raw_file_name(&self, position: CameraPosition) -> String {
        format!(
            "frame_{}_{:06}_{}.raw",
            self.timestamp.timestamp(),
            self.sequence,
            position.suffix()
        )
    }

    /// Write both images as raw dumps into `dir`, creating it if needed
    pub fn save_raw<P: AsRef<Path>>(&self, dir: P) -> Result<[PathBuf; 2]> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let left_path = dir.join(self.raw_file_name(CameraPosition::Left));
        let right_path = dir.join(self.raw_file_name(CameraPosition::Right));
        std::fs::write(&left_path, &self.left)?;
        std::fs::write(&right_path, &self.right)?;

        debug!(
            "Saved frame {} to {} and {}",
            self.sequence,
            left_path.display(),
            right_path.display()
        );
        Ok([left_path, right_path])
    }
}
