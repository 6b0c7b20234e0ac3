//! Check system capabilities.

use scenecast_common::{config_file_path, AppConfig};
use scenecast_encoder::{FfmpegStreamRecorder, StreamRecorder};
use scenecast_render_engine::GlyphRasterizer;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("SceneCast System Check");
    println!("{}", "=".repeat(50));

    let path = config_file_path();
    if path.exists() {
        println!("[OK] Config: {}", path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", path.display());
    }

    match GlyphRasterizer::from_config(&config.render) {
        Ok(glyphs) if glyphs.has_font() => println!("[OK] Font: loaded"),
        Ok(_) => println!("[WARN] Font: none configured, text renders as blocks"),
        Err(e) => println!("[FAIL] Font: {e}"),
    }

    println!("[OK] Offline export: MJPEG in Matroska (in-process)");

    let ffmpeg = FfmpegStreamRecorder::new();
    if ffmpeg.is_available() {
        println!("[OK] Realtime export: ffmpeg VP9/WebM");
    } else {
        println!("[WARN] Realtime export: ffmpeg not found, using MJPEG/Matroska");
    }

    println!();
    println!(
        "Export defaults: {:?} @ {}fps, {} kbps, queue threshold {}",
        config.export.mode,
        config.export.fps,
        config.export.bitrate_bps / 1000,
        config.export.max_queue_depth
    );
    println!("SceneCast is ready.");

    Ok(())
}
