use crate::rig::TriggerMode;
use crate::sdk::DeviceHandle;
use serde::{Deserialize, Serialize};

/// Number of cameras in the rig
pub const CAMERA_COUNT: usize = 2;

/// Logical mounting position of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraPosition {
    Left,
    Right,
    Uninitialized,
}

impl CameraPosition {
    pub fn suffix(&self) -> &'static str {
        match self {
            CameraPosition::Left => "L",
            CameraPosition::Right => "R",
            CameraPosition::Uninitialized => "?",
        }
    }
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CameraPosition::Left => "left",
            CameraPosition::Right => "right",
            CameraPosition::Uninitialized => "uninitialized",
        };
        f.write_str(name)
    }
}

/// One of the two camera registrations
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSlot {
    /// Device handle, present between handle creation and teardown
    pub handle: Option<DeviceHandle>,
    /// Serial number matched during identification
    pub serial: String,
    /// Device opened for exclusive access
    pub opened: bool,
    pub position: CameraPosition,
    pub trigger_mode: TriggerMode,
    /// Software trigger sent and not yet consumed by a capture
    pub trigger_pending: bool,
    /// Target acquisition rate in frames per second
    pub frame_rate: f32,
}

impl CameraSlot {
    pub fn empty() -> Self {
        Self {
            handle: None,
            serial: String::new(),
            opened: false,
            position: CameraPosition::Uninitialized,
            trigger_mode: TriggerMode::Continuous,
            trigger_pending: false,
            frame_rate: 0.0,
        }
    }

    /// Handle of an opened device
    pub fn open_handle(&self) -> Option<DeviceHandle> {
        if self.opened {
            self.handle
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }
}

impl Default for CameraSlot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Fixed table of the two camera slots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceRegistry {
    slots: [CameraSlot; CAMERA_COUNT],
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, index: usize) -> Option<&CameraSlot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut CameraSlot> {
        self.slots.get_mut(index)
    }

    pub fn slots(&self) -> &[CameraSlot; CAMERA_COUNT] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [CameraSlot; CAMERA_COUNT] {
        &mut self.slots
    }

    /// Slot index currently mapped to `position`
    pub fn index_of(&self, position: CameraPosition) -> Option<usize> {
        self.slots.iter().position(|slot| slot.position == position)
    }

    /// Record identification results for every slot at once
    pub(crate) fn assign(&mut self, serials: [String; CAMERA_COUNT], positions: [CameraPosition; CAMERA_COUNT]) {
        for ((slot, serial), position) in self.slots.iter_mut().zip(serials).zip(positions) {
            slot.serial = serial;
            slot.position = position;
        }
    }

    pub fn all_open(&self) -> bool {
        self.slots.iter().all(|slot| slot.open_handle().is_some())
    }

    /// Positions are either both uninitialized or exactly one left and one right
    pub fn positions_consistent(&self) -> bool {
        let [first, second] = [self.slots[0].position, self.slots[1].position];
        matches!(
            (first, second),
            (CameraPosition::Uninitialized, CameraPosition::Uninitialized)
                | (CameraPosition::Left, CameraPosition::Right)
                | (CameraPosition::Right, CameraPosition::Left)
        )
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(CameraSlot::is_empty)
    }

    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = CameraSlot::empty();
        }
    }
}
