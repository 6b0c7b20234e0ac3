//! Show scene information.

use std::path::PathBuf;

use scenecast_common::AppConfig;

use super::load_engine;

pub fn run(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let (engine, doc) = load_engine(&path, config)?;

    println!("Scene: {}", doc.name);
    println!("  Version: {}", doc.version);
    println!("  Created: {}", doc.created_at);
    println!("  Modified: {}", doc.modified_at);
    println!();

    let playback = engine.playback_settings();
    println!("Canvas:");
    println!("  Size: {}x{}", doc.width, doc.height);
    println!("  Guides: {:?}", doc.guides);
    println!();

    println!("Playback:");
    println!("  Duration: {:.1}s", playback.total_duration_ms / 1000.0);
    println!("  Looping: {}", playback.looping);
    println!("  Rate: {}x", playback.playback_rate);
    println!();

    println!("Objects (back to front):");
    for obj in engine.scene().objects() {
        println!(
            "  {:<14} {:<12} at ({:.0}, {:.0}) {:.0}x{:.0}{}{}",
            obj.name,
            obj.kind().label(),
            obj.x,
            obj.y,
            obj.width,
            obj.height,
            if obj.visible { "" } else { " hidden" },
            if obj.locked { " locked" } else { "" },
        );
        if obj.animation.duration_ms > 0.0 {
            println!(
                "  {:<14} {:?} {:.0}ms after {:.0}ms",
                "",
                obj.animation.kind,
                obj.animation.duration_ms,
                obj.animation.delay_ms
            );
        }
    }

    Ok(())
}
