/// Lifecycle states of a [`StereoRig`](super::StereoRig)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigState {
    Uninit,
    SdkReady,
    Enumerated,
    Identified,
    HandlesCreated,
    Opened,
    Configured,
    Ready,
    Grabbing,
    /// Rolling back a failed initialization
    Teardown,
    Stopping,
    Released,
}

impl RigState {
    /// States from which `initialize` may run
    pub fn can_initialize(&self) -> bool {
        matches!(self, RigState::Uninit | RigState::Released)
    }

    /// Whether devices may still be held
    pub fn holds_devices(&self) -> bool {
        !matches!(self, RigState::Uninit | RigState::Released)
    }
}

impl std::fmt::Display for RigState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RigState::Uninit => "uninitialized",
            RigState::SdkReady => "sdk ready",
            RigState::Enumerated => "enumerated",
            RigState::Identified => "identified",
            RigState::HandlesCreated => "handles created",
            RigState::Opened => "opened",
            RigState::Configured => "configured",
            RigState::Ready => "ready",
            RigState::Grabbing => "grabbing",
            RigState::Teardown => "tearing down",
            RigState::Stopping => "stopping",
            RigState::Released => "released",
        };
        f.write_str(name)
    }
}
