//! End-to-end tests over the mock camera
//!
//! Drives a full session the way the RPC layer would: configure, ingest
//! frames through the callback path, capture snapshots, stream to
//! subscriptions, adjust parameters, tear down.

use std::sync::Arc;

use bytes::Bytes;

use thermocam::capture::CaptureError;
use thermocam::device::{
    CameraConfig, CameraSession, DeviceError, DeviceIdentity, FrameEvent, FrameStatus, MockCamera,
    NodeMap, STATUS_TRAILING_BUFFER,
};
use thermocam::frame::{ImageEncoding, PixelDepth};
use thermocam::params::{ParamError, ParamValue};
use thermocam::stream::{ChannelKind, StreamError};

fn identity() -> DeviceIdentity {
    DeviceIdentity::new("FLIR Systems", "ThermoVision A320", "70500123")
}

fn start_session() -> (Arc<MockCamera>, Arc<CameraSession>) {
    let camera = MockCamera::a320();
    let session = CameraSession::start(camera.clone(), identity(), CameraConfig::default())
        .expect("session starts against the mock");
    assert!(camera.is_continuous());
    assert!(camera.is_acquiring());
    (camera, session)
}

fn gradient(width: u32, height: u32) -> Vec<u16> {
    (0..width * height).map(|i| (i * 97) as u16).collect()
}

#[test]
fn capture_before_first_frame_fails() {
    let (_camera, session) = start_session();
    assert!(matches!(
        session.capture_frame(),
        Err(CaptureError::NoFrame)
    ));
    assert!(matches!(
        session.capture_frame_compressed(),
        Err(CaptureError::NoFrame)
    ));
}

#[test]
fn capture_returns_latest_frame_dimensions() {
    let (camera, session) = start_session();

    camera.emit_mono16(8, 6, &gradient(8, 6));
    let image = session.capture_frame().unwrap();
    assert_eq!((image.width, image.height), (8, 6));
    assert_eq!(image.encoding, ImageEncoding::Mono16);
    assert_eq!(image.step, 8);
    assert_eq!(image.metadata.seqno, 1);
    assert_eq!(image.metadata.device, "ThermoVision A320 (70500123)");

    // A newer frame replaces the cached one
    camera.emit_mono16(4, 4, &gradient(4, 4));
    let newer = session.capture_frame().unwrap();
    assert_eq!((newer.width, newer.height), (4, 4));
    assert_eq!(newer.metadata.seqno, 2);
}

#[test]
fn compressed_capture_is_decodable_png() {
    let (camera, session) = start_session();
    camera.emit_mono16(16, 12, &gradient(16, 12));

    let image = session.capture_frame_compressed().unwrap();
    assert_eq!(image.encoding, ImageEncoding::Compressed);
    assert_eq!(image.step, 0);

    let decoded = image::load_from_memory(&image.data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 12));
}

#[test]
fn streaming_state_transitions() {
    let (_camera, session) = start_session();

    session.start_streaming().unwrap();
    assert!(session.is_streaming());
    assert_eq!(
        session.start_streaming(),
        Err(StreamError::AlreadyStreaming)
    );
    assert!(session.is_streaming());

    session.stop_streaming().unwrap();
    assert!(!session.is_streaming());
    assert_eq!(session.stop_streaming(), Err(StreamError::NotStreaming));
    assert!(!session.is_streaming());
}

#[tokio::test]
async fn frames_fan_out_to_all_channels() {
    let (camera, session) = start_session();

    let mut raw = session.attach(ChannelKind::Raw);
    let mut full = session.attach(ChannelKind::Compressed);
    let mut preview = session.attach(ChannelKind::Preview);

    session.start_streaming().unwrap();
    camera.emit_mono16(8, 8, &gradient(8, 8));

    let raw_image = raw.recv().await.unwrap();
    assert_eq!(raw_image.encoding, ImageEncoding::Mono16);
    assert_eq!(raw_image.metadata.seqno, 1);

    let full_image = full.recv().await.unwrap();
    assert_eq!(full_image.encoding, ImageEncoding::Compressed);

    let preview_image = preview.recv().await.unwrap();
    assert_eq!(preview_image.encoding, ImageEncoding::Compressed);
    // The preview is a real PNG too, just encoded with less effort
    let decoded = image::load_from_memory(&preview_image.data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (8, 8));
}

#[tokio::test]
async fn no_frames_distributed_while_idle() {
    let (camera, session) = start_session();
    let mut raw = session.attach(ChannelKind::Raw);

    camera.emit_mono16(4, 4, &gradient(4, 4));
    assert!(raw.try_recv().is_none());

    // The capture cache still observed the frame
    assert!(session.capture_frame().is_ok());
}

#[tokio::test]
async fn backlog_sheds_oldest_keeps_newest() {
    let (camera, session) = start_session();
    let mut raw = session.attach(ChannelKind::Raw); // default capacity 2

    session.start_streaming().unwrap();
    for _ in 0..5 {
        camera.emit_mono16(4, 4, &gradient(4, 4));
    }

    // Only the two newest packets survive, in order, and the count never
    // exceeded the capacity
    assert_eq!(raw.recv().await.unwrap().metadata.seqno, 4);
    assert_eq!(raw.recv().await.unwrap().metadata.seqno, 5);
    assert!(raw.try_recv().is_none());

    let stats = raw.stats();
    assert_eq!(stats.dropped, 3);
    assert_eq!(stats.delivered, 2);
}

#[tokio::test]
async fn downsampled_subscription_sees_every_nth_frame() {
    let (camera, session) = start_session();
    let mut dense = session.attach_with_capacity(ChannelKind::Raw, 16);
    let mut sparse = session.attach_with_capacity(ChannelKind::Raw, 16);
    sparse.set_downsample(2);

    session.start_streaming().unwrap();
    for _ in 0..6 {
        camera.emit_mono16(4, 4, &gradient(4, 4));
    }

    let mut dense_count = 0;
    while dense.try_recv().is_some() {
        dense_count += 1;
    }
    assert_eq!(dense_count, 6);

    let mut sparse_seqnos = Vec::new();
    while let Some(image) = sparse.try_recv() {
        sparse_seqnos.push(image.metadata.seqno);
    }
    assert_eq!(sparse_seqnos, vec![2, 4, 6]);
}

#[test]
fn incomplete_frames_are_dropped_silently() {
    let (camera, session) = start_session();

    camera.emit(FrameEvent {
        data: Bytes::from(vec![0u8; 32]),
        width: 4,
        height: 4,
        depth: PixelDepth::Mono16,
        status: FrameStatus::Incomplete(3),
    });

    assert!(matches!(
        session.capture_frame(),
        Err(CaptureError::NoFrame)
    ));
    let stats = session.stats();
    assert_eq!(stats.frames_received, 1);
    assert_eq!(stats.frames_dropped_incomplete, 1);
    assert_eq!(stats.frames_published, 0);
}

#[test]
fn trailing_buffer_status_is_tolerated() {
    let (camera, session) = start_session();

    camera.emit(FrameEvent {
        data: Bytes::from(vec![0u8; 32]),
        width: 4,
        height: 4,
        depth: PixelDepth::Mono16,
        status: FrameStatus::Incomplete(STATUS_TRAILING_BUFFER),
    });

    // Treated as complete: cached and counted as published
    assert!(session.capture_frame().is_ok());
    let stats = session.stats();
    assert_eq!(stats.frames_tolerated_trailing, 1);
    assert_eq!(stats.frames_published, 1);
}

#[test]
fn mono8_frames_widen_to_canonical_depth() {
    let (camera, session) = start_session();

    camera.emit(FrameEvent {
        data: Bytes::from(vec![0xFFu8; 16]),
        width: 4,
        height: 4,
        depth: PixelDepth::Mono8,
        status: FrameStatus::Complete,
    });

    let image = session.capture_frame().unwrap();
    assert_eq!(image.encoding, ImageEncoding::Mono16);
    assert_eq!(image.data.len(), 4 * 4 * 2);
    let first = u16::from_ne_bytes([image.data[0], image.data[1]]);
    assert_eq!(first, 0xFF00);
}

#[test]
fn undersized_buffers_are_dropped() {
    let (camera, session) = start_session();

    camera.emit(FrameEvent {
        data: Bytes::from(vec![0u8; 7]),
        width: 4,
        height: 4,
        depth: PixelDepth::Mono16,
        status: FrameStatus::Complete,
    });

    assert!(matches!(
        session.capture_frame(),
        Err(CaptureError::NoFrame)
    ));
    assert_eq!(session.stats().frames_dropped_incomplete, 1);
}

#[test]
fn direct_parameters_round_trip() {
    let (_camera, session) = start_session();

    session
        .set_param("object_emissivity", ParamValue::Double(0.87))
        .unwrap();
    assert_eq!(
        session.get_param("object_emissivity").unwrap(),
        ParamValue::Double(0.87)
    );

    // Integer input widens into double-typed parameters
    session
        .set_param("object_distance", ParamValue::Int32(3))
        .unwrap();
    assert_eq!(
        session.get_param("object_distance").unwrap(),
        ParamValue::Double(3.0)
    );

    session
        .set_param("current_case", ParamValue::Int32(2))
        .unwrap();
    assert_eq!(
        session.get_param("current_case").unwrap(),
        ParamValue::Int32(2)
    );
}

#[test]
fn type_mismatch_is_rejected_without_write() {
    let (camera, session) = start_session();

    let err = session
        .set_param("focus_pos", ParamValue::Double(1.5))
        .unwrap_err();
    assert!(matches!(err, ParamError::TypeMismatch { .. }));

    // Device state unchanged
    assert_eq!(
        camera.nodes().read("FocusPos"),
        Some(thermocam::device::NodeValue::Int(0))
    );
}

#[test]
fn unknown_parameter_is_reported() {
    let (_camera, session) = start_session();
    assert!(matches!(
        session.get_param("nonexistent_param"),
        Err(ParamError::Unsupported(_))
    ));
    assert!(matches!(
        session.set_param("nonexistent_param", ParamValue::Double(1.0)),
        Err(ParamError::Unsupported(_))
    ));
}

#[test]
fn fps_set_matches_discrete_rates_only() {
    let (_camera, session) = start_session();

    // Initial rate comes from the discrete rate register label
    assert_eq!(session.get_param("fps").unwrap(), ParamValue::Double(30.0));

    session.set_param("fps", ParamValue::Double(15.0)).unwrap();
    assert_eq!(session.get_param("fps").unwrap(), ParamValue::Double(15.0));

    // An unsupported rate is rejected and the prior rate kept
    let err = session
        .set_param("fps", ParamValue::Double(13.37))
        .unwrap_err();
    match err {
        ParamError::UnsupportedValue { available, .. } => {
            assert_eq!(available, vec!["15", "30", "60"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.get_param("fps").unwrap(), ParamValue::Double(15.0));
}

#[test]
fn fps_read_reports_unrecognized_labels() {
    let camera = MockCamera::a320();
    camera
        .nodes()
        .insert_enum("IRFrameRate", &["FastMode"], "FastMode");
    let session =
        CameraSession::start(camera.clone(), identity(), CameraConfig::default()).unwrap();

    assert!(matches!(
        session.get_param("fps"),
        Err(ParamError::UnrecognizedRateLabel(_))
    ));
}

#[test]
fn ir_format_changes_subsequent_frame_metadata() {
    let (camera, session) = start_session();

    camera.emit_mono16(4, 4, &gradient(4, 4));
    let before = session.capture_frame().unwrap();
    assert_eq!(before.metadata.ir_format(), Some("radiometric"));

    session
        .set_param(
            "ir_format",
            ParamValue::Str("temperature_linear_100mK".to_string()),
        )
        .unwrap();

    camera.emit_mono16(4, 4, &gradient(4, 4));
    let after = session.capture_frame().unwrap();
    assert_eq!(after.metadata.ir_format(), Some("temperature_linear_100mK"));

    // An invalid mode is rejected and the previous label kept
    let err = session
        .set_param("ir_format", ParamValue::Str("not_a_real_mode".to_string()))
        .unwrap_err();
    assert!(matches!(err, ParamError::UnsupportedValue { .. }));

    camera.emit_mono16(4, 4, &gradient(4, 4));
    let unchanged = session.capture_frame().unwrap();
    assert_eq!(
        unchanged.metadata.ir_format(),
        Some("temperature_linear_100mK")
    );
}

#[test]
fn ir_format_get_reflects_device_state() {
    let (_camera, session) = start_session();
    assert_eq!(
        session.get_param("ir_format").unwrap(),
        ParamValue::Str("radiometric".to_string())
    );
    session
        .set_param(
            "ir_format",
            ParamValue::Str("temperature_linear_10mK".to_string()),
        )
        .unwrap();
    assert_eq!(
        session.get_param("ir_format").unwrap(),
        ParamValue::Str("temperature_linear_10mK".to_string())
    );
}

#[test]
fn unavailable_register_reads_as_unavailable() {
    let camera = MockCamera::a320();
    camera.nodes().set_readable("ObjectEmissivity", false);
    let session = CameraSession::start(camera, identity(), CameraConfig::default()).unwrap();

    assert!(matches!(
        session.get_param("object_emissivity"),
        Err(ParamError::Unavailable(_))
    ));
}

#[test]
fn startup_failure_is_fatal_and_undoes_handler() {
    let camera = MockCamera::a320();
    camera.fail_step("begin_acquisition");

    let result = CameraSession::start(camera.clone(), identity(), CameraConfig::default());
    assert!(result.is_err());
    assert!(!camera.handler_registered());
}

#[test]
fn teardown_attempts_every_step() {
    let (camera, session) = start_session();
    camera.fail_step("end_acquisition");

    let err = session.close().unwrap_err();
    match err {
        DeviceError::Teardown(failures) => assert_eq!(failures.len(), 1),
        other => panic!("unexpected error: {other}"),
    }

    // Later steps still ran despite the first one failing
    let calls = camera.calls();
    let teardown: Vec<_> = calls
        .iter()
        .filter(|c| ["end_acquisition", "deregister_handler", "release"].contains(c))
        .collect();
    assert_eq!(
        teardown,
        vec![&"end_acquisition", &"deregister_handler", &"release"]
    );
    assert!(!camera.handler_registered());
    assert!(camera.is_released());
}

#[tokio::test]
async fn close_wakes_blocked_consumers() {
    let (camera, session) = start_session();
    let mut raw = session.attach(ChannelKind::Raw);

    session.start_streaming().unwrap();
    camera.emit_mono16(4, 4, &gradient(4, 4));

    let waiter = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(image) = raw.recv().await {
            seen.push(image.metadata.seqno);
        }
        seen
    });

    tokio::task::yield_now().await;
    session.close().unwrap();

    // Queued packets drain before the subscription reports closed
    assert_eq!(waiter.await.unwrap(), vec![1]);
}
