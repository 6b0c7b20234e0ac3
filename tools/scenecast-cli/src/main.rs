//! SceneCast command-line tool.
//!
//! Usage:
//!   scenecast init <PATH>        Write a sample scene document
//!   scenecast info <PATH>        Show scene information
//!   scenecast validate <PATH>    Validate a scene document
//!   scenecast frame <PATH>       Render one frame to PNG
//!   scenecast export <PATH>      Export a scene to video
//!   scenecast check              Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use scenecast_common::{AppConfig, ExportMode};

mod commands;

#[derive(Parser)]
#[command(
    name = "scenecast",
    about = "Animated scenes rendered and exported to video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Offline,
    Realtime,
}

impl From<ModeArg> for ExportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Offline => ExportMode::Offline,
            ModeArg::Realtime => ExportMode::Realtime,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample scene using every object kind
    Init {
        /// Output scene file
        path: PathBuf,

        /// Canvas width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Canvas height
        #[arg(long, default_value = "1080")]
        height: u32,
    },

    /// Show scene information
    Info {
        /// Path to the scene file
        path: PathBuf,
    },

    /// Validate a scene document
    Validate {
        /// Path to the scene file
        path: PathBuf,
    },

    /// Render the scene at one point in time to PNG
    Frame {
        /// Path to the scene file
        path: PathBuf,

        /// Timeline position in milliseconds
        #[arg(short, long, default_value = "0")]
        time: f64,

        /// Output PNG path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Resize the canvas before rendering, as WIDTHxHEIGHT
        #[arg(long)]
        size: Option<String>,
    },

    /// Export a scene to video
    Export {
        /// Path to the scene file
        path: PathBuf,

        /// Output file path (extension follows the container)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export pipeline (defaults to the configured mode)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Frames per second (defaults to the configured fps)
        #[arg(long)]
        fps: Option<u32>,

        /// Duration in milliseconds (defaults to the scene's duration)
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Check system capabilities
    Check,
}

fn parse_size(size: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = size
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("Size must look like 1280x720, got {size}"))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    scenecast_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Init {
            path,
            width,
            height,
        } => commands::init::run(path, width, height),
        Commands::Info { path } => commands::info::run(path, &config),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Frame {
            path,
            time,
            output,
            size,
        } => {
            let size = size.as_deref().map(parse_size).transpose()?;
            commands::frame::run(path, time, output, size, &config)
        }
        Commands::Export {
            path,
            output,
            mode,
            fps,
            duration,
        } => {
            let mode = mode.map(ExportMode::from).unwrap_or(config.export.mode);
            commands::export::run(path, output, mode, fps, duration, &config).await
        }
        Commands::Check => commands::check::run(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size("64X36").unwrap(), (64, 36));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_cli_parses_export() {
        let cli = Cli::try_parse_from([
            "scenecast",
            "export",
            "scene.json",
            "--mode",
            "realtime",
            "--fps",
            "24",
        ])
        .unwrap();
        match cli.command {
            Commands::Export { mode, fps, .. } => {
                assert!(matches!(mode, Some(ModeArg::Realtime)));
                assert_eq!(fps, Some(24));
            }
            _ => panic!("expected export"),
        }
    }
}
