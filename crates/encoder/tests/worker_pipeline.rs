use std::sync::Arc;

use scenecast_common::{frame_timestamp_us, SceneCastError, SceneCastResult};
use scenecast_encoder::{
    inspect, EncodeWorker, EncoderConfig, FailureClass, MjpegEncoderFactory, VideoEncoder,
    WorkerLink, WorkerRequest, WorkerResponse, PROTOCOL_VERSION,
};
use scenecast_render_engine::Frame;

async fn drain_until_terminal(worker: &mut EncodeWorker) -> (Vec<WorkerResponse>, WorkerResponse) {
    let mut progress = Vec::new();
    while let Some(msg) = worker.recv().await {
        if msg.is_terminal() {
            return (progress, msg);
        }
        progress.push(msg);
    }
    panic!("worker exited without a terminal message");
}

#[tokio::test]
async fn one_second_at_30fps_produces_31_monotonic_blocks() {
    let mut worker = EncodeWorker::spawn(Arc::new(MjpegEncoderFactory { quality: 60 }), 8).unwrap();
    worker
        .send(WorkerRequest::Config {
            width: 32,
            height: 18,
            fps: 30,
            bitrate: 2_000_000,
            protocol_version: PROTOCOL_VERSION,
        })
        .await
        .unwrap();
    assert_eq!(worker.recv().await, Some(WorkerResponse::Ready));

    for i in 0..=30u64 {
        let shade = (i * 8) as u8;
        worker
            .send(WorkerRequest::EncodeFrame {
                frame: Frame::solid(32, 18, [shade, shade, shade, 255]),
                timestamp_us: frame_timestamp_us(i, 30) as i64,
                is_key_frame: i % 30 == 0,
                duration_us: None,
            })
            .await
            .unwrap();
    }
    worker.send(WorkerRequest::Finalize).await.unwrap();

    let (progress, terminal) = drain_until_terminal(&mut worker).await;
    let WorkerResponse::Complete { buffer } = terminal else {
        panic!("expected COMPLETE, got {terminal:?}");
    };
    // One report after each encode and one after each muxed chunk.
    assert_eq!(progress.len(), 62);
    assert!(matches!(
        progress.last(),
        Some(WorkerResponse::Progress {
            queue_depth: 0,
            frames_received: 31
        })
    ));

    let summary = inspect(&buffer).unwrap();
    assert_eq!(summary.codec_id, "V_MJPEG");
    assert_eq!((summary.width, summary.height), (32, 18));
    assert_eq!(summary.blocks.len(), 31);
    assert!(summary.is_monotonic());
    assert_eq!(summary.blocks[0].timestamp_ms, 0);
    assert_eq!(summary.blocks[1].timestamp_ms, 33);
    assert_eq!(summary.blocks[30].timestamp_ms, 1000);
    assert_eq!(worker.messages_sent(), 33);
}

#[tokio::test]
async fn failing_encoder_configuration_reports_encoder_error() {
    let factory = |_: &EncoderConfig| -> SceneCastResult<Box<dyn VideoEncoder>> {
        Err(SceneCastError::encoder("codec not supported"))
    };
    let mut worker = EncodeWorker::spawn(Arc::new(factory), 4).unwrap();
    worker
        .send(WorkerRequest::Config {
            width: 16,
            height: 16,
            fps: 24,
            bitrate: 1_000_000,
            protocol_version: PROTOCOL_VERSION,
        })
        .await
        .unwrap();

    let Some(WorkerResponse::Error { class, message }) = worker.recv().await else {
        panic!("expected ERROR");
    };
    assert_eq!(class, FailureClass::Encoder);
    let err = class.into_error(message);
    assert!(err.is_encoder_class());
    assert!(err.to_string().contains("codec not supported"));
}
