//! Write a sample scene document.

use std::path::PathBuf;

use scenecast_scene_model::SceneDocument;

pub fn run(path: PathBuf, width: u32, height: u32) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    let mut doc = SceneDocument::sample(width, height);
    doc.save(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write scene: {e}"))?;

    println!("Scene created at {}", path.display());
    println!("  Canvas: {}x{}", width, height);
    println!("  Duration: {:.1}s", doc.playback.total_duration_ms / 1000.0);
    println!("  Objects:");
    for obj in &doc.objects {
        println!("    - {} ({})", obj.name, obj.kind().label());
    }

    Ok(())
}
