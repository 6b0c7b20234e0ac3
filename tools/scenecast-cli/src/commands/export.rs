//! Export a scene to video.

use std::io::Write;
use std::path::PathBuf;

use scenecast_common::{AppConfig, CancelToken, ExportMode};
use scenecast_encoder::inspect;
use scenecast_engine::ExportProgress;

use super::load_engine;

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    mode: ExportMode,
    fps: Option<u32>,
    duration_ms: Option<f64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Exporting scene at: {}", path.display());

    let (mut engine, _doc) = load_engine(&path, config)?;
    let fps = fps.unwrap_or(config.export.fps);
    let duration_ms = duration_ms.unwrap_or_else(|| engine.total_duration_ms());

    println!("  Mode: {:?}", mode);
    println!(
        "  Canvas: {}x{} @ {}fps",
        engine.scene().width,
        engine.scene().height,
        fps
    );
    println!("  Duration: {:.1}s", duration_ms / 1000.0);
    tracing::debug!(?mode, fps, duration_ms, "Export requested");

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let progress_cb: Box<dyn Fn(ExportProgress) + Send> = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
        std::io::stdout().flush().ok();
    });

    match engine
        .export_video(duration_ms, fps, mode, Some(progress_cb), &cancel)
        .await
    {
        Ok(blob) => {
            let output_path =
                output.unwrap_or_else(|| path.with_extension(blob.extension()));
            blob.save(&output_path)?;
            println!(
                "\nExport complete: {} ({} bytes, {})",
                output_path.display(),
                blob.len(),
                blob.mime_type
            );
            if let Ok(summary) = inspect(&blob.bytes) {
                println!(
                    "  Container: {} {} {}x{}, {} frames, {:.0}ms",
                    summary.doc_type,
                    summary.codec_id,
                    summary.width,
                    summary.height,
                    summary.blocks.len(),
                    summary.duration_ms
                );
            }
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            println!("\nExport cancelled.");
            Ok(())
        }
        Err(e) => {
            println!("\nExport failed: {e}");
            Err(e.into())
        }
    }
}
