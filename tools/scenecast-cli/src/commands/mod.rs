pub mod check;
pub mod export;
pub mod frame;
pub mod info;
pub mod init;
pub mod validate;

use std::path::Path;

use scenecast_common::AppConfig;
use scenecast_engine::{Engine, EngineConfig};
use scenecast_scene_model::SceneDocument;

/// Load a scene file into a fresh engine sized to the document.
pub(crate) fn load_engine(path: &Path, config: &AppConfig) -> anyhow::Result<(Engine, SceneDocument)> {
    let doc = SceneDocument::load(path)
        .map_err(|e| anyhow::anyhow!("Failed to load scene {}: {e}", path.display()))?;
    let scene = doc
        .to_scene()
        .map_err(|e| anyhow::anyhow!("Scene is not usable: {e}"))?;

    let mut engine = Engine::new(EngineConfig::from_app_config(config, doc.width, doc.height))?;
    engine.load_scene(scene)?;
    engine.apply_playback(doc.playback)?;
    Ok((engine, doc))
}
