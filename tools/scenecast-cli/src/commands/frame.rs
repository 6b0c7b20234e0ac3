//! Render one frame to PNG.

use std::path::PathBuf;

use scenecast_common::AppConfig;

use super::load_engine;

pub fn run(
    path: PathBuf,
    time_ms: f64,
    output: Option<PathBuf>,
    size: Option<(u32, u32)>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let (mut engine, _doc) = load_engine(&path, config)?;
    engine.set_overlays_enabled(false);
    if let Some((width, height)) = size {
        engine.resize(width, height)?;
    }
    engine.seek(time_ms);

    let output = output.unwrap_or_else(|| path.with_extension("png"));
    engine.frame()?.save_png(&output)?;

    println!(
        "Rendered {:.0}ms at {}x{} to {}",
        engine.current_time_ms(),
        engine.scene().width,
        engine.scene().height,
        output.display()
    );
    Ok(())
}
