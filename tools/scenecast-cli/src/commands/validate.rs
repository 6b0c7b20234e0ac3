//! Validate a scene document.

use std::path::PathBuf;

use scenecast_scene_model::SceneDocument;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating scene at: {}", path.display());

    let doc = SceneDocument::load(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load scene: {e}"))?;

    println!("  Name: {}", doc.name);
    println!("  Version: {}", doc.version);
    println!("  Canvas: {}x{}", doc.width, doc.height);
    println!("  Objects: {}", doc.objects.len());

    let errors = doc.validate();
    if errors.is_empty() {
        println!("\nScene is valid.");
        Ok(())
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        anyhow::bail!("{} issue(s) found", errors.len())
    }
}
