use super::*;
use crate::config::StereoConfig;
use crate::error::{ReleaseStep, StereoError};
use crate::registry::CameraPosition;
use crate::sdk::{params, MockDevice, MockSdk, ParamValue, SdkError, SdkOp};
use crate::stats::ManualClock;
use std::sync::Arc;
use std::time::Duration;

const LEFT_FILL: u8 = 0x11;
const RIGHT_FILL: u8 = 0x22;

fn left_camera() -> MockDevice {
    MockDevice::new(LEFT_CAMERA_SERIAL)
        .with_geometry(100, 10, 8)
        .with_fill(LEFT_FILL)
}

fn right_camera() -> MockDevice {
    MockDevice::new(RIGHT_CAMERA_SERIAL)
        .with_geometry(100, 10, 8)
        .with_fill(RIGHT_FILL)
}

fn rig_for(sdk: &MockSdk) -> (StereoRig<MockSdk>, ManualClock) {
    let clock = ManualClock::new();
    let rig = StereoRigBuilder::new()
        .sdk(sdk.clone())
        .config(&StereoConfig::default())
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    (rig, clock)
}

fn ready_rig() -> (StereoRig<MockSdk>, MockSdk, ManualClock) {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    let (mut rig, clock) = rig_for(&sdk);
    rig.initialize().unwrap();
    (rig, sdk, clock)
}

fn assert_fully_released(rig: &StereoRig<MockSdk>, sdk: &MockSdk) {
    assert_eq!(rig.state(), RigState::Released);
    assert!(rig.registry().is_empty());
    assert_eq!(rig.frame_buffer_size(), 0);
    assert_eq!(sdk.live_handles(), 0);
    assert_eq!(sdk.open_devices(), 0);
    assert!(!sdk.is_initialized());
}

#[test]
fn test_builder_requires_sdk() {
    let result = StereoRigBuilder::<MockSdk>::new().build();
    assert!(matches!(result, Err(StereoError::InvalidArgument(_))));
}

#[test]
fn test_builder_rejects_duplicate_serials() {
    let result = StereoRigBuilder::new()
        .sdk(MockSdk::stereo_pair())
        .serials(SerialPair {
            left: LEFT_CAMERA_SERIAL,
            right: LEFT_CAMERA_SERIAL,
        })
        .build();
    assert!(matches!(result, Err(StereoError::InvalidArgument(_))));
}

#[test]
fn test_initialize_left_first() {
    let (rig, sdk, _clock) = ready_rig();

    assert_eq!(rig.state(), RigState::Ready);
    assert_eq!(rig.frame_buffer_size(), 1000);
    assert_eq!(sdk.open_devices(), 2);
    assert!(rig.registry().all_open());
    assert!(rig.configuration_warnings().is_empty());

    let slots = rig.registry().slots();
    assert_eq!(slots[0].position, CameraPosition::Left);
    assert_eq!(slots[0].serial, LEFT_CAMERA_SERIAL);
    assert_eq!(slots[1].position, CameraPosition::Right);
    assert_eq!(slots[1].serial, RIGHT_CAMERA_SERIAL);
}

#[test]
fn test_initialize_right_first() {
    let sdk = MockSdk::new(vec![right_camera(), left_camera()]);
    let (mut rig, _clock) = rig_for(&sdk);
    rig.initialize().unwrap();

    let slots = rig.registry().slots();
    assert_eq!(slots[0].position, CameraPosition::Right);
    assert_eq!(slots[0].serial, RIGHT_CAMERA_SERIAL);
    assert_eq!(slots[1].position, CameraPosition::Left);
    assert!(rig.registry().positions_consistent());

    rig.start_grabbing().unwrap();
    let frame = rig.capture_stereo_frame().unwrap();
    assert!(frame.left.iter().all(|b| *b == LEFT_FILL));
    assert!(frame.right.iter().all(|b| *b == RIGHT_FILL));
}

#[test]
fn test_startup_configuration_written() {
    let (_rig, sdk, _clock) = ready_rig();

    for device in 0..2 {
        assert_eq!(sdk.param(device, params::TRIGGER_MODE), Some(ParamValue::Enum(0)));
        assert_eq!(
            sdk.param(device, params::ACQUISITION_FRAME_RATE_ENABLE),
            Some(ParamValue::Bool(true))
        );
        assert_eq!(
            sdk.param(device, params::ACQUISITION_FRAME_RATE),
            Some(ParamValue::Float(10.0))
        );
        assert_eq!(
            sdk.param(device, params::EXPOSURE_TIME),
            Some(ParamValue::Float(90_000.0))
        );
        assert_eq!(
            sdk.param(device, params::GAIN_AUTO),
            Some(ParamValue::EnumStr("Off".to_string()))
        );
        assert_eq!(sdk.param(device, params::GAIN), Some(ParamValue::Float(5.0)));
    }
}

#[test]
fn test_identification_failure_leaves_slots_uninitialized() {
    let cases = vec![
        vec![MockDevice::new("DA0000001"), right_camera()],
        vec![MockDevice::new("DA0000001"), MockDevice::new("DA0000002")],
        vec![left_camera(), left_camera()],
    ];

    for devices in cases {
        let sdk = MockSdk::new(devices);
        let (mut rig, _clock) = rig_for(&sdk);

        let err = rig.initialize().unwrap_err();
        assert!(matches!(err, StereoError::IdentificationFailed { .. }), "{}", err);
        assert!(rig
            .registry()
            .slots()
            .iter()
            .all(|slot| slot.position == CameraPosition::Uninitialized));
        assert_fully_released(&rig, &sdk);
    }
}

#[test]
fn test_device_count_mismatch() {
    for devices in [
        vec![],
        vec![left_camera()],
        vec![left_camera(), right_camera(), MockDevice::new("DA0000003")],
    ] {
        let expected = devices.len();
        let sdk = MockSdk::new(devices);
        let (mut rig, _clock) = rig_for(&sdk);

        match rig.initialize() {
            Err(StereoError::DeviceCountMismatch { found }) => assert_eq!(found, expected),
            other => panic!("unexpected result {:?}", other),
        }
        assert_fully_released(&rig, &sdk);
    }
}

#[test]
fn test_gige_devices_are_not_counted() {
    let sdk = MockSdk::new(vec![
        left_camera(),
        right_camera().with_transport(crate::sdk::TransportLayer::GigE),
    ]);
    let (mut rig, _clock) = rig_for(&sdk);

    assert!(matches!(
        rig.initialize(),
        Err(StereoError::DeviceCountMismatch { found: 1 })
    ));
}

#[test]
fn test_sdk_init_failure() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    sdk.fail(SdkOp::Initialize, SdkError::RESOURCE);
    let (mut rig, _clock) = rig_for(&sdk);

    assert!(matches!(
        rig.initialize(),
        Err(StereoError::SdkUnavailable { source: SdkError::RESOURCE })
    ));
    assert_fully_released(&rig, &sdk);
}

#[test]
fn test_handle_creation_failure_tears_down() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    sdk.fail_on(SdkOp::CreateHandle, 1, SdkError::RESOURCE);
    let (mut rig, _clock) = rig_for(&sdk);

    assert!(matches!(
        rig.initialize(),
        Err(StereoError::HandleCreationFailed { slot: 1, .. })
    ));
    assert_fully_released(&rig, &sdk);
    assert_eq!(sdk.calls(SdkOp::DestroyHandle), 1);
}

#[test]
fn test_open_failure_tears_down() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    sdk.fail_on(SdkOp::OpenDevice, 1, SdkError::ACCESS_DENIED);
    let (mut rig, _clock) = rig_for(&sdk);

    let err = rig.initialize().unwrap_err();
    assert!(matches!(
        err,
        StereoError::OpenFailed {
            slot: 1,
            source: SdkError::ACCESS_DENIED
        }
    ));
    assert_fully_released(&rig, &sdk);

    let report = rig.last_release().unwrap();
    assert_eq!(sdk.calls(SdkOp::CloseDevice), 1);
    assert_eq!(sdk.calls(SdkOp::DestroyHandle), 2);
    assert!(report.to_result().is_ok());
}

#[test]
fn test_buffer_size_mismatch_is_fatal() {
    let sdk = MockSdk::new(vec![
        left_camera(),
        right_camera().with_geometry(100, 10, 16),
    ]);
    let (mut rig, _clock) = rig_for(&sdk);

    assert!(matches!(
        rig.initialize(),
        Err(StereoError::BufferSizeMismatch {
            first: 1000,
            second: 2000
        })
    ));
    assert_fully_released(&rig, &sdk);
}

#[test]
fn test_different_geometry_with_equal_size_is_accepted() {
    let sdk = MockSdk::new(vec![
        left_camera().with_geometry(100, 20, 8),
        right_camera().with_geometry(200, 10, 8),
    ]);
    let (mut rig, _clock) = rig_for(&sdk);

    rig.initialize().unwrap();
    assert_eq!(rig.state(), RigState::Ready);
    assert_eq!(rig.frame_buffer_size(), 2000);
}

#[test]
fn test_geometry_read_failure_is_fatal() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera().with_geometry(0, 10, 8)]);
    let (mut rig, _clock) = rig_for(&sdk);

    assert!(rig.initialize().is_err());
    assert_fully_released(&rig, &sdk);
}

#[test]
fn test_configuration_warnings_are_not_fatal() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    sdk.fail_param(params::GAIN, SdkError::PARAMETER);
    let (mut rig, _clock) = rig_for(&sdk);

    rig.initialize().unwrap();

    let warnings = rig.configuration_warnings();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(StereoError::is_warning));
    assert!(warnings.iter().all(|w| matches!(
        w,
        StereoError::ConfigurationWarning { parameter, .. } if parameter == params::GAIN
    )));
    assert_eq!(sdk.param(0, params::GAIN), None);
    assert_eq!(sdk.param(0, params::EXPOSURE_TIME), Some(ParamValue::Float(90_000.0)));
}

#[test]
fn test_initialize_twice_is_rejected() {
    let (mut rig, _sdk, _clock) = ready_rig();

    assert!(matches!(
        rig.initialize(),
        Err(StereoError::InvalidState { operation: "initialize", .. })
    ));
    assert_eq!(rig.state(), RigState::Ready);
}

#[test]
fn test_reinitialize_after_release() {
    let (mut rig, sdk, _clock) = ready_rig();
    rig.release().unwrap();

    rig.initialize().unwrap();
    assert_eq!(rig.state(), RigState::Ready);
    assert_eq!(sdk.open_devices(), 2);
}

#[test]
fn test_capture_pair() {
    let (mut rig, sdk, _clock) = ready_rig();
    rig.start_grabbing().unwrap();
    assert_eq!(rig.state(), RigState::Grabbing);

    let mut first = vec![0u8; 1000];
    let mut second = vec![0u8; 1000];
    let written = rig
        .capture_frame_pair([first.as_mut_slice(), second.as_mut_slice()])
        .unwrap();

    assert_eq!(written, [1000, 1000]);
    assert!(first.iter().all(|b| *b == LEFT_FILL));
    assert!(second.iter().all(|b| *b == RIGHT_FILL));
    assert_eq!(sdk.outstanding_buffers(), 0);
    assert_eq!(sdk.frees(0), 1);
    assert_eq!(sdk.frees(1), 1);
}

#[test]
fn test_capture_is_all_or_nothing() {
    let (mut rig, sdk, _clock) = ready_rig();
    rig.start_grabbing().unwrap();
    sdk.fail_on(SdkOp::GetImageBuffer, 1, SdkError::UNKNOWN);

    let mut first = vec![0xEEu8; 1000];
    let mut second = vec![0xEEu8; 1000];
    let err = rig
        .capture_frame_pair([first.as_mut_slice(), second.as_mut_slice()])
        .unwrap_err();

    assert!(matches!(
        err,
        StereoError::AcquisitionFailed {
            slot: 1,
            source: SdkError::UNKNOWN
        }
    ));
    assert!(first.iter().all(|b| *b == 0xEE));
    assert!(second.iter().all(|b| *b == 0xEE));
    assert_eq!(sdk.acquisitions(0), 1);
    assert_eq!(sdk.frees(0), 1);
    assert_eq!(sdk.outstanding_buffers(), 0);
    assert_eq!(rig.stats(0).unwrap().total_frame_count, 0);
}

#[test]
fn test_capture_timeout() {
    let (mut rig, sdk, _clock) = ready_rig();
    rig.start_grabbing().unwrap();
    sdk.fail_on(SdkOp::GetImageBuffer, 0, SdkError::NO_DATA);

    assert!(matches!(
        rig.capture_stereo_frame(),
        Err(StereoError::AcquisitionTimeout { slot: 0 })
    ));
    assert_eq!(sdk.acquisitions(1), 0);
}

#[test]
fn test_oversized_frames_are_truncated() {
    let sdk = MockSdk::new(vec![
        left_camera().with_frame_len(1200),
        right_camera().with_frame_len(1200),
    ]);
    let (mut rig, _clock) = rig_for(&sdk);
    rig.initialize().unwrap();
    rig.start_grabbing().unwrap();
    assert_eq!(rig.frame_buffer_size(), 1000);

    let mut first = vec![0u8; 1200];
    let mut second = vec![0u8; 1200];
    let written = rig
        .capture_frame_pair([first.as_mut_slice(), second.as_mut_slice()])
        .unwrap();

    assert_eq!(written, [1000, 1000]);
    assert!(first[..1000].iter().all(|b| *b == LEFT_FILL));
    assert!(first[1000..].iter().all(|b| *b == 0));
    assert_eq!(sdk.outstanding_buffers(), 0);
}

#[test]
fn test_short_destination_is_rejected() {
    let (mut rig, sdk, _clock) = ready_rig();
    rig.start_grabbing().unwrap();

    let mut first = vec![0u8; 999];
    let mut second = vec![0u8; 1000];
    assert!(matches!(
        rig.capture_frame_pair([first.as_mut_slice(), second.as_mut_slice()]),
        Err(StereoError::InvalidArgument(_))
    ));
    assert_eq!(sdk.calls(SdkOp::GetImageBuffer), 0);
}

#[test]
fn test_capture_requires_open_cameras() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    let (mut rig, _clock) = rig_for(&sdk);

    assert!(matches!(
        rig.capture_stereo_frame(),
        Err(StereoError::CameraNotOpen { slot: 0 })
    ));
}

#[test]
fn test_capture_updates_statistics() {
    let (mut rig, sdk, clock) = ready_rig();
    rig.start_grabbing().unwrap();

    for _ in 0..60 {
        clock.advance(Duration::from_millis(100));
        rig.capture_stereo_frame().unwrap();
    }
    sdk.skip_frames(0, 2);
    clock.advance(Duration::from_millis(100));
    let frame = rig.capture_stereo_frame().unwrap();
    assert_eq!(frame.sequence, 61);
    assert_eq!(frame.left_frame_number, 62);
    assert_eq!(frame.right_frame_number, 60);

    let (left_fps, left_dropped) = rig.get_status(0).unwrap();
    let (_, right_dropped) = rig.get_status(1).unwrap();
    assert!((left_fps - 10.0).abs() < 0.01, "fps was {}", left_fps);
    assert_eq!(left_dropped, 2);
    assert_eq!(right_dropped, 0);
    assert_eq!(rig.stats(0).unwrap().total_frame_count, 61);

    let health = rig.health();
    assert_eq!(health.cameras.len(), 2);
    assert!(health.healthy);
}

#[test]
fn test_get_status_checks_slot() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    let (mut rig, _clock) = rig_for(&sdk);

    assert!(matches!(rig.get_status(0), Err(StereoError::CameraNotOpen { slot: 0 })));

    rig.initialize().unwrap();
    assert_eq!(rig.get_status(1).unwrap(), (0.0, 0));
    assert!(matches!(rig.get_status(2), Err(StereoError::InvalidArgument(_))));
}

#[test]
fn test_release_is_idempotent() {
    let (mut rig, sdk, _clock) = ready_rig();
    rig.start_grabbing().unwrap();

    rig.release().unwrap();
    assert_fully_released(&rig, &sdk);
    assert!(rig.last_release().unwrap().is_clean());

    rig.release().unwrap();
    assert_fully_released(&rig, &sdk);
}

#[test]
fn test_release_without_devices() {
    let sdk = MockSdk::new(vec![]);
    let (mut rig, _clock) = rig_for(&sdk);

    rig.release().unwrap();
    assert!(rig.registry().is_empty());

    assert!(rig.initialize().is_err());
    rig.release().unwrap();
    rig.release().unwrap();
    assert!(rig.registry().is_empty());
}

#[test]
fn test_call_order_warnings_do_not_fail_release() {
    let (mut rig, _sdk, _clock) = ready_rig();

    rig.release().unwrap();

    let report = rig.last_release().unwrap();
    let warnings = report.warnings();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| matches!(
        w,
        StereoError::CallOrderWarning {
            step: ReleaseStep::StopGrabbing,
            ..
        }
    )));
}

#[test]
fn test_release_failure_still_cleans_up() {
    let (mut rig, sdk, _clock) = ready_rig();
    sdk.fail_on(SdkOp::CloseDevice, 0, SdkError::RESOURCE);

    let err = rig.release().unwrap_err();
    assert!(matches!(
        err,
        StereoError::ReleaseFailed {
            step: ReleaseStep::CloseDevice,
            slot: Some(0),
            source: SdkError::RESOURCE
        }
    ));
    assert!(rig.registry().is_empty());
    assert_eq!(sdk.live_handles(), 0);
    assert!(!sdk.is_initialized());
}

#[test]
fn test_release_report_suppression() {
    let mut report = ReleaseReport::default();
    report.record(ReleaseStep::StopGrabbing, Some(0), Err(SdkError::CALL_ORDER));
    assert!(report.to_result().is_ok());
    assert!(!report.is_clean());

    report.record(ReleaseStep::CloseDevice, Some(0), Err(SdkError::RESOURCE));
    report.record(ReleaseStep::Finalize, None, Err(SdkError::UNKNOWN));
    assert!(matches!(
        report.to_result(),
        Err(StereoError::ReleaseFailed {
            step: ReleaseStep::Finalize,
            slot: None,
            ..
        })
    ));
    assert_eq!(report.failures().count(), 2);
    assert_eq!(report.warnings().len(), 1);
}

#[test]
fn test_drop_releases_devices() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    {
        let (mut rig, _clock) = rig_for(&sdk);
        rig.initialize().unwrap();
        rig.start_grabbing().unwrap();
        assert!(sdk.is_grabbing(0));
    }

    assert_eq!(sdk.live_handles(), 0);
    assert!(!sdk.is_grabbing(0));
    assert!(!sdk.is_initialized());
}

#[test]
fn test_start_grabbing_requires_ready() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    let (mut rig, _clock) = rig_for(&sdk);

    assert!(matches!(
        rig.start_grabbing(),
        Err(StereoError::InvalidState { .. })
    ));
}

#[test]
fn test_start_grabbing_failure_stops_started_camera() {
    let (mut rig, sdk, _clock) = ready_rig();
    sdk.fail_on(SdkOp::StartGrabbing, 1, SdkError::RESOURCE);

    assert!(matches!(
        rig.start_grabbing(),
        Err(StereoError::AcquisitionFailed { slot: 1, .. })
    ));
    assert!(!sdk.is_grabbing(0));
    assert_eq!(rig.state(), RigState::Ready);
}

#[test]
fn test_stop_grabbing_returns_to_ready() {
    let (mut rig, sdk, _clock) = ready_rig();
    rig.start_grabbing().unwrap();

    rig.stop_grabbing().unwrap();
    assert_eq!(rig.state(), RigState::Ready);
    assert!(!sdk.is_grabbing(1));
}

#[test]
fn test_stage_configuration() {
    let (mut rig, sdk, _clock) = ready_rig();

    rig.configure_for_stage("alignment").unwrap();
    for device in 0..2 {
        assert_eq!(sdk.param(device, params::TRIGGER_MODE), Some(ParamValue::Enum(1)));
        assert_eq!(sdk.param(device, params::TRIGGER_SOURCE), Some(ParamValue::Enum(7)));
        assert_eq!(
            sdk.param(device, params::EXPOSURE_TIME),
            Some(ParamValue::Float(10_000.0))
        );
    }
    assert_eq!(rig.registry().slots()[0].trigger_mode, TriggerMode::Software);

    rig.configure_for_stage("Preview").unwrap();
    assert_eq!(sdk.param(1, params::TRIGGER_MODE), Some(ParamValue::Enum(0)));
    assert_eq!(rig.registry().slots()[1].trigger_mode, TriggerMode::Continuous);

    assert!(matches!(
        rig.configure_for_stage("focus"),
        Err(StereoError::UnknownStage(name)) if name == "focus"
    ));
}

#[test]
fn test_stage_setter_failures_are_skipped() {
    let (mut rig, sdk, _clock) = ready_rig();
    sdk.fail_param(params::EXPOSURE_TIME, SdkError::PARAMETER);

    rig.configure_for_stage("alignment").unwrap();
    assert_eq!(sdk.param(0, params::TRIGGER_MODE), Some(ParamValue::Enum(1)));
    assert_eq!(
        sdk.param(0, params::EXPOSURE_TIME),
        Some(ParamValue::Float(90_000.0))
    );
}

#[test]
fn test_stage_trigger_failure_skips_slot() {
    let (mut rig, sdk, _clock) = ready_rig();
    sdk.fail_param(params::TRIGGER_MODE, SdkError::ACCESS_DENIED);

    rig.configure_for_stage("alignment").unwrap();
    for device in 0..2 {
        assert_eq!(sdk.param(device, params::TRIGGER_MODE), Some(ParamValue::Enum(0)));
        assert_eq!(
            sdk.param(device, params::EXPOSURE_TIME),
            Some(ParamValue::Float(90_000.0))
        );
    }
    assert_eq!(rig.registry().slots()[0].trigger_mode, TriggerMode::Continuous);
}

#[test]
fn test_stage_on_closed_rig_is_noop() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    let (mut rig, _clock) = rig_for(&sdk);

    rig.configure_for_stage("detection").unwrap();
    assert_eq!(sdk.calls(SdkOp::SetParam), 0);
}

#[test]
fn test_software_trigger_capture() {
    let (mut rig, _sdk, _clock) = ready_rig();
    rig.start_grabbing().unwrap();
    rig.configure_for_stage("detection").unwrap();

    assert!(matches!(
        rig.capture_stereo_frame(),
        Err(StereoError::AcquisitionTimeout { slot: 0 })
    ));

    rig.trigger_software().unwrap();
    let frame = rig.capture_stereo_frame().unwrap();
    assert_eq!(frame.left.len(), 1000);
}

#[test]
fn test_partial_trigger_retry_keeps_pair_in_step() {
    let (mut rig, sdk, _clock) = ready_rig();
    rig.start_grabbing().unwrap();
    rig.configure_for_stage("detection").unwrap();

    sdk.fail_on(SdkOp::ExecuteCommand, 1, SdkError::RESOURCE);
    assert!(matches!(
        rig.trigger_software(),
        Err(StereoError::ParameterAccess { slot: 1, .. })
    ));
    assert!(rig.registry().slots()[0].trigger_pending);
    assert!(!rig.registry().slots()[1].trigger_pending);

    sdk.clear_faults();
    rig.trigger_software().unwrap();
    assert_eq!(sdk.calls(SdkOp::ExecuteCommand), 3);

    rig.capture_stereo_frame().unwrap();
    assert!(rig.registry().slots().iter().all(|slot| !slot.trigger_pending));

    // Neither camera holds a leftover frame
    assert!(matches!(
        rig.capture_stereo_frame(),
        Err(StereoError::AcquisitionTimeout { slot: 0 })
    ));
    assert_eq!(sdk.outstanding_buffers(), 0);

    rig.trigger_software().unwrap();
    rig.capture_stereo_frame().unwrap();
}

#[test]
fn test_trigger_requires_both_cameras_open() {
    let sdk = MockSdk::new(vec![left_camera(), right_camera()]);
    let (mut rig, _clock) = rig_for(&sdk);

    assert!(matches!(
        rig.trigger_software(),
        Err(StereoError::CameraNotOpen { slot: 0 })
    ));
    assert_eq!(sdk.calls(SdkOp::ExecuteCommand), 0);
}

#[test]
fn test_set_frame_rate_retargets_stats() {
    let (mut rig, sdk, _clock) = ready_rig();

    rig.set_frame_rate(0, 20.0).unwrap();
    assert_eq!(rig.stats(0).unwrap().target_fps, 20.0);
    assert_eq!(rig.stats(0).unwrap().frame_interval_ms, 50);
    assert_eq!(rig.registry().slots()[0].frame_rate, 20.0);
    assert_eq!(
        sdk.param(0, params::ACQUISITION_FRAME_RATE),
        Some(ParamValue::Float(20.0))
    );

    assert!(matches!(
        rig.set_frame_rate(0, 0.0),
        Err(StereoError::InvalidArgument(_))
    ));
    assert!(matches!(
        rig.set_gain(5, 1.0),
        Err(StereoError::InvalidArgument(_))
    ));
}

#[test]
fn test_setter_failure_is_parameter_access() {
    let (mut rig, sdk, _clock) = ready_rig();
    sdk.fail_param(params::GAIN_AUTO, SdkError::UNSUPPORTED);

    assert!(matches!(
        rig.set_gain_auto(1, true),
        Err(StereoError::ParameterAccess { slot: 1, .. })
    ));
}

#[test]
fn test_frame_size() {
    assert_eq!(frame_size(2448, 2048, 8), Some(2448 * 2048));
    assert_eq!(frame_size(10, 10, 12), Some(200));
    assert_eq!(frame_size(10, 10, 24), Some(300));
    assert_eq!(frame_size(0, 10, 8), None);
    assert_eq!(frame_size(10, -1, 8), None);
    assert_eq!(frame_size(10, 10, 0), None);
    assert_eq!(frame_size(i64::MAX, i64::MAX, 8), None);
}

#[test]
fn test_reconcile_frame_sizes() {
    assert_eq!(reconcile_frame_sizes([4096, 4096]).unwrap(), 4096);
    assert!(matches!(
        reconcile_frame_sizes([4096, 4095]),
        Err(StereoError::BufferSizeMismatch {
            first: 4096,
            second: 4095
        })
    ));
}

#[test]
fn test_identify_accepts_both_orders() {
    let pair = SerialPair::BUILT_IN;
    assert_eq!(
        identify(&[LEFT_CAMERA_SERIAL, RIGHT_CAMERA_SERIAL], &pair).unwrap(),
        [CameraPosition::Left, CameraPosition::Right]
    );
    assert_eq!(
        identify(&[RIGHT_CAMERA_SERIAL, LEFT_CAMERA_SERIAL], &pair).unwrap(),
        [CameraPosition::Right, CameraPosition::Left]
    );
}

#[test]
fn test_identify_rejects_everything_else() {
    let pair = SerialPair {
        left: "L1",
        right: "R1",
    };
    for serials in [
        vec!["L1", "X"],
        vec!["X", "R1"],
        vec!["X", "Y"],
        vec!["L1", "L1"],
        vec!["R1", "R1"],
        vec!["L1"],
        vec!["L1", "R1", "X"],
    ] {
        assert!(
            matches!(
                identify(&serials, &pair),
                Err(StereoError::IdentificationFailed { .. })
            ),
            "{:?} was accepted",
            serials
        );
    }
}

#[test]
fn test_identify_rejects_duplicate_reference() {
    let pair = SerialPair {
        left: "S1",
        right: "S1",
    };
    assert!(matches!(
        identify(&["S1", "S1"], &pair),
        Err(StereoError::IdentificationFailed { .. })
    ));
}

#[test]
fn test_workflow_stage_parsing() {
    assert_eq!("preview".parse::<WorkflowStage>().unwrap(), WorkflowStage::Preview);
    assert_eq!(" Detection ".parse::<WorkflowStage>().unwrap(), WorkflowStage::Detection);
    assert_eq!(WorkflowStage::Alignment.to_string(), "alignment");
    assert!("calibration".parse::<WorkflowStage>().is_err());
}
