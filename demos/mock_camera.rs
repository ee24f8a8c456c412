//! Mock camera streaming example
//!
//! Run with: cargo run --example mock_camera
//!
//! Drives a full session against the in-memory mock device: starts
//! acquisition, attaches a raw and a preview subscription (the preview
//! downsampled to every 3rd frame), streams a handful of synthetic frames,
//! flips the thermal format mid-stream, and tears the session down.

use std::sync::Arc;
use std::time::Duration;

use thermocam::device::{CameraConfig, CameraSession, DeviceIdentity, MockCamera};
use thermocam::params::ParamValue;
use thermocam::stream::ChannelKind;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

/// Synthetic thermal scene: a warm blob drifting across a cool background
fn synthetic_frame(tick: u32) -> Vec<u16> {
    let cx = (tick * 8) % WIDTH;
    let cy = HEIGHT / 2;
    let mut samples = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let dx = x.abs_diff(cx) as f64;
            let dy = y.abs_diff(cy) as f64;
            let dist = (dx * dx + dy * dy).sqrt();
            let warm = (8000.0 * (-dist / 40.0).exp()) as u16;
            samples.push(29315 + warm); // ~293.15 K background in 10 mK counts
        }
    }
    samples
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let camera = MockCamera::a320();
    let identity = DeviceIdentity::new("FLIR Systems", "ThermoVision A320", "70500123");
    let session = CameraSession::start(camera.clone(), identity, CameraConfig::default())?;
    println!("Session started: {} @ {} fps", session.identity(), session.fps());

    let mut raw = session.attach(ChannelKind::Raw);
    let mut preview = session.attach(ChannelKind::Preview);
    preview.set_downsample(3);

    let raw_task = tokio::spawn(async move {
        while let Some(image) = raw.recv().await {
            println!(
                "raw      frame {:>3}  {}x{}  {} bytes  ir_format={}",
                image.metadata.seqno,
                image.width,
                image.height,
                image.data.len(),
                image.metadata.ir_format().unwrap_or("?"),
            );
        }
    });

    let preview_task = tokio::spawn(async move {
        while let Some(image) = preview.recv().await {
            println!(
                "preview  frame {:>3}  {} PNG bytes",
                image.metadata.seqno,
                image.data.len()
            );
        }
    });

    session.start_streaming()?;

    // Producer side: emit frames the way the hardware callback would
    let producer_camera = Arc::clone(&camera);
    let producer = tokio::task::spawn_blocking(move || {
        for tick in 0..12 {
            producer_camera.emit_mono16(WIDTH, HEIGHT, &synthetic_frame(tick));
            std::thread::sleep(Duration::from_millis(33));
        }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    session.set_param(
        "ir_format",
        ParamValue::Str("temperature_linear_100mK".to_string()),
    )?;

    producer.await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let one_shot = session.capture_frame_compressed()?;
    println!(
        "on-demand capture: {} PNG bytes, seqno {}",
        one_shot.data.len(),
        one_shot.metadata.seqno
    );

    session.stop_streaming()?;
    session.close()?;

    let stats = session.stats();
    println!(
        "ingested {} frames, published {}, dropped {}",
        stats.frames_received, stats.frames_published, stats.frames_dropped_incomplete
    );

    raw_task.await?;
    preview_task.await?;
    Ok(())
}
