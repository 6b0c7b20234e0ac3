//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default export settings.
    #[serde(default)]
    pub export: ExportDefaults,

    /// Default playback settings for new engines.
    #[serde(default)]
    pub playback: PlaybackDefaults,

    /// Rasterization settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which export pipeline to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Seek-driven, frame-exact encoding on an isolated worker.
    #[default]
    Offline,
    /// Live playback capture into a streaming recorder.
    Realtime,
}

/// Default export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Default FPS.
    pub fps: u32,

    /// Target video bitrate in bits per second.
    pub bitrate_bps: u32,

    /// Default pipeline.
    pub mode: ExportMode,

    /// Encoder queue depth above which the offline producer stalls.
    pub max_queue_depth: usize,

    /// JPEG quality for the in-process MJPEG encoder (1-100).
    pub jpeg_quality: u8,

    /// Realtime progress polling interval in milliseconds.
    pub progress_poll_ms: u64,
}

/// Default playback parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackDefaults {
    /// Timeline length in milliseconds.
    pub total_duration_ms: f64,

    /// Whether playback wraps to zero at the end.
    pub looping: bool,

    /// Playback speed multiplier.
    pub playback_rate: f64,
}

/// Rasterization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Optional TTF/OTF font used for text. Block glyphs are used without it.
    pub font_path: Option<PathBuf>,

    /// Default canvas background color (`#rrggbb`).
    pub background: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "scenecast=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            fps: 30,
            bitrate_bps: 5_000_000,
            mode: ExportMode::Offline,
            max_queue_depth: 10,
            jpeg_quality: 90,
            progress_poll_ms: 100,
        }
    }
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            total_duration_ms: 10_000.0,
            looping: false,
            playback_rate: 1.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            background: "#111827".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("scenecast").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"export":{"fps":60,"mode":"realtime"}}"#).unwrap();
        assert_eq!(config.export.fps, 60);
        assert_eq!(config.export.mode, ExportMode::Realtime);
        assert_eq!(config.export.max_queue_depth, 10);
        assert_eq!(config.playback.playback_rate, 1.0);
        assert_eq!(config.logging.level, "info");
    }
}
