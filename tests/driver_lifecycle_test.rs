//! Driver lifecycle against a stand-in encoder.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{driver_args, removals, simple_config, wait_for_state, FailingSink, FakeEncoder};
use livecam::driver::{CameraDriver, FfmpegSimpleDriver, SimpleDriver};
use livecam::sink::{MemorySink, SinkOp};
use livecam_av::endpoint::SUFFIX_LEN;
use livecam_core::{ConfigNode, DriverState, Error};

fn simple_driver(encoder: &FakeEncoder) -> (SimpleDriver, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let driver = SimpleDriver::new(simple_config(&encoder.path), &driver_args(sink.clone()));
    (driver, sink)
}

fn put(key: &str, value: &str) -> SinkOp {
    SinkOp::Put {
        key: key.into(),
        value: value.into(),
    }
}

#[tokio::test]
async fn start_publishes_and_stop_retracts() {
    let encoder = FakeEncoder::long_running();
    let (driver, sink) = simple_driver(&encoder);

    driver.start().unwrap();
    assert_eq!(driver.state(), DriverState::On);

    let endpoint = sink.get("rtmp").expect("endpoint published");
    let suffix = endpoint.strip_prefix("rtmp://r/app/").unwrap();
    assert_eq!(suffix.len(), SUFFIX_LEN);
    assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(sink.get("state").as_deref(), Some("on"));

    let args = encoder.recorded_args().await;
    assert_eq!(
        args,
        format!("-y -f v4l2 -i /dev/video0 -c:v h264 -an -f flv {endpoint}")
    );

    driver.stop().unwrap();
    assert_eq!(driver.state(), DriverState::Off);
    assert_eq!(sink.get("rtmp"), None);
    assert_eq!(sink.get("state").as_deref(), Some("off"));

    // The exit watcher must not reset a second time.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        sink.history(),
        vec![
            SinkOp::Remove { key: "rtmp".into() },
            put("state", "off"),
            put("rtmp", &endpoint),
            put("state", "on"),
            SinkOp::Remove { key: "rtmp".into() },
            put("state", "off"),
        ]
    );
}

#[tokio::test]
async fn double_start_is_rejected() {
    let encoder = FakeEncoder::long_running();
    let (driver, sink) = simple_driver(&encoder);

    driver.start().unwrap();
    let endpoint = sink.get("rtmp");
    sink.clear_history();

    assert_matches!(driver.start(), Err(Error::NotStartable));
    assert_eq!(driver.state(), DriverState::On);
    assert_eq!(sink.get("rtmp"), endpoint);
    assert!(sink.history().is_empty());

    driver.stop().unwrap();
}

#[tokio::test]
async fn stop_while_off_is_rejected() {
    let encoder = FakeEncoder::long_running();
    let (driver, sink) = simple_driver(&encoder);
    sink.clear_history();

    assert_matches!(driver.stop(), Err(Error::NotStoppable));
    assert_eq!(driver.state(), DriverState::Off);
    assert!(sink.history().is_empty());
}

#[tokio::test]
async fn spontaneous_exit_resets_driver() {
    for code in [0, 1] {
        let encoder = FakeEncoder::exiting(code);
        let (driver, sink) = simple_driver(&encoder);

        driver.start().unwrap();
        wait_for_state(&driver, DriverState::Off).await;

        assert_eq!(sink.get("rtmp"), None);
        assert_eq!(sink.get("state").as_deref(), Some("off"));
        assert_eq!(removals(&sink, "rtmp"), 2, "initial reset plus exit");
        assert_matches!(driver.stop(), Err(Error::NotStoppable));

        // The driver can be started again after the encoder went away.
        driver.start().unwrap();
        assert_eq!(driver.state(), DriverState::On);
        wait_for_state(&driver, DriverState::Off).await;
    }
}

#[tokio::test]
async fn consecutive_starts_use_distinct_endpoints() {
    let encoder = FakeEncoder::long_running();
    let (driver, sink) = simple_driver(&encoder);

    driver.start().unwrap();
    let first = sink.get("rtmp").unwrap();
    driver.stop().unwrap();

    driver.start().unwrap();
    let second = sink.get("rtmp").unwrap();
    driver.stop().unwrap();

    assert_ne!(first, second);
    assert!(second.starts_with("rtmp://r/app/"));
}

#[tokio::test]
async fn missing_field_spawns_nothing() {
    let encoder = FakeEncoder::long_running();
    let sink = Arc::new(MemorySink::new());
    let mut config = simple_config(&encoder.path);
    config.overlay("framework.video.codec.name", serde_json::Value::Null);
    let driver = SimpleDriver::new(config, &driver_args(sink.clone()));
    sink.clear_history();

    let err = driver.start().unwrap_err();
    assert_matches!(err, Error::Config { ref path, .. } if path == "video.codec.name");
    assert_eq!(driver.state(), DriverState::Off);
    assert!(sink.history().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!encoder.was_invoked());
}

#[tokio::test]
async fn spawn_failure_leaves_driver_off() {
    let sink = Arc::new(MemorySink::new());
    let config = simple_config(std::path::Path::new("/nonexistent/fake-ffmpeg"));
    let driver = SimpleDriver::new(config, &driver_args(sink.clone()));
    sink.clear_history();

    assert_matches!(driver.start(), Err(Error::Spawn { .. }));
    assert_eq!(driver.state(), DriverState::Off);
    assert!(sink.history().is_empty());
}

#[tokio::test]
async fn stop_racing_exit_resets_once_per_run() {
    let encoder = FakeEncoder::exiting(0);
    let (driver, sink) = simple_driver(&encoder);
    sink.clear_history();

    let runs = 4;
    for i in 0..runs {
        driver.start().unwrap();
        // Land the stop around the moment the encoder exits by itself.
        tokio::time::sleep(Duration::from_millis(250 + 25 * i)).await;
        match driver.stop() {
            Ok(()) | Err(Error::NotStoppable) => {}
            Err(e) => panic!("unexpected stop error: {e}"),
        }
        wait_for_state(&driver, DriverState::Off).await;
    }

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(removals(&sink, "rtmp"), runs as usize);
    assert_eq!(sink.get("state").as_deref(), Some("off"));
}

#[tokio::test]
async fn template_driver_lifecycle() {
    let encoder = FakeEncoder::long_running();
    let sink = Arc::new(MemorySink::new());
    let config = ConfigNode::from_pairs([
        ("ffmpeg_file", encoder.path_str()),
        ("video_input.format", "v4l2"),
        ("video_input.file", "/dev/video0"),
        ("video_input.frame_size", "640x480"),
        ("video_input.frame_rate", "30"),
        ("video_input.codec.name", "h264_omx"),
        ("video_input.codec.bit_rate", "2000k"),
        ("output.format", "flv"),
        ("output.file_prefix", "rtmp://r/live"),
    ]);
    let driver = FfmpegSimpleDriver::new(&config, &driver_args(sink.clone())).unwrap();

    driver.start().unwrap();
    let endpoint = sink.get("rtmp").unwrap();
    assert!(endpoint.starts_with("rtmp://r/live/"));
    assert_eq!(sink.get("state").as_deref(), Some("on"));

    let args = encoder.recorded_args().await;
    assert_eq!(
        args,
        format!(
            "-y -f v4l2 -i /dev/video0 -s 640x480 -r 30 -c:v h264_omx -b:v 2000k -f flv {endpoint}"
        )
    );

    assert_matches!(driver.start(), Err(Error::NotStartable));
    driver.stop().unwrap();
    assert_eq!(sink.get("rtmp"), None);
    assert_eq!(sink.get("state").as_deref(), Some("off"));
}

#[tokio::test]
async fn sink_failures_do_not_change_driver_state() {
    let encoder = FakeEncoder::long_running();
    let driver = SimpleDriver::new(
        simple_config(&encoder.path),
        &driver_args(Arc::new(FailingSink)),
    );

    driver.start().unwrap();
    assert_eq!(driver.state(), DriverState::On);
    encoder.recorded_args().await;

    driver.stop().unwrap();
    assert_eq!(driver.state(), DriverState::Off);
}

#[tokio::test]
async fn exit_resets_driver_despite_failing_sink() {
    let encoder = FakeEncoder::exiting(0);
    let driver = SimpleDriver::new(
        simple_config(&encoder.path),
        &driver_args(Arc::new(FailingSink)),
    );

    driver.start().unwrap();
    assert_eq!(driver.state(), DriverState::On);
    wait_for_state(&driver, DriverState::Off).await;
    assert_matches!(driver.stop(), Err(Error::NotStoppable));
}

#[tokio::test]
async fn dropping_running_driver_stops_encoder() {
    let encoder = FakeEncoder::long_running();
    let (driver, sink) = simple_driver(&encoder);

    driver.start().unwrap();
    encoder.recorded_args().await;
    let pid = encoder.recorded_pid();
    assert!(sink.get("rtmp").is_some());
    sink.clear_history();

    drop(driver);
    FakeEncoder::wait_for_exit(pid).await;
    assert_eq!(sink.get("rtmp"), None);
    assert_eq!(sink.get("state").as_deref(), Some("off"));
    assert_eq!(removals(&sink, "rtmp"), 1);
}

