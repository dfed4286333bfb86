use crate::error::{Result, StereoError};
use crate::registry::{CameraPosition, CAMERA_COUNT};

/// Serial of the camera mounted on the left, fixed at build time
pub const LEFT_CAMERA_SERIAL: &str = match option_env!("STEREOCAM_LEFT_SERIAL") {
    Some(serial) => serial,
    None => "DA6869958",
};

/// Serial of the camera mounted on the right, fixed at build time
pub const RIGHT_CAMERA_SERIAL: &str = match option_env!("STEREOCAM_RIGHT_SERIAL") {
    Some(serial) => serial,
    None => "DA6869956",
};

/// Reference serials for the two mounting positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialPair {
    pub left: &'static str,
    pub right: &'static str,
}

impl SerialPair {
    pub const BUILT_IN: SerialPair = SerialPair {
        left: LEFT_CAMERA_SERIAL,
        right: RIGHT_CAMERA_SERIAL,
    };
}

impl Default for SerialPair {
    fn default() -> Self {
        Self::BUILT_IN
    }
}

/// Map enumerated serials onto mounting positions.
///
/// Either enumeration order is accepted. Anything other than exactly one
/// left and one right match fails, as does a reference pair naming the same
/// serial twice; no partial mapping is ever produced.
pub fn identify<S: AsRef<str>>(serials: &[S], reference: &SerialPair) -> Result<[CameraPosition; CAMERA_COUNT]> {
    let failed = || StereoError::IdentificationFailed {
        serials: serials.iter().map(|s| s.as_ref().to_string()).collect(),
    };

    let [first, second] = serials else {
        return Err(failed());
    };
    let (first, second) = (first.as_ref(), second.as_ref());
    if reference.left == reference.right {
        return Err(failed());
    }

    if first == reference.left && second == reference.right {
        Ok([CameraPosition::Left, CameraPosition::Right])
    } else if first == reference.right && second == reference.left {
        Ok([CameraPosition::Right, CameraPosition::Left])
    } else {
        Err(failed())
    }
}
