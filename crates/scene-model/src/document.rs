//! Scene documents: the on-disk form of a scene (`*.scene.json`).
//!
//! A document carries the canvas settings, the objects in z-order and the
//! playback settings the scene was authored with.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use scenecast_common::{SceneCastError, SceneCastResult};

use crate::animation::{Animation, AnimationKind};
use crate::geometry::Rgba;
use crate::kinds::*;
use crate::object::SceneObject;
use crate::scene::{GuideOverlay, Scene};

/// Current document schema version.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Playback settings stored with a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    pub total_duration_ms: f64,
    #[serde(default)]
    pub looping: bool,
    #[serde(default = "default_rate")]
    pub playback_rate: f64,
}

fn default_rate() -> f64 {
    1.0
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            total_duration_ms: 10_000.0,
            looping: false,
            playback_rate: 1.0,
        }
    }
}

/// Serialized scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Schema version.
    pub version: String,

    /// Human-readable scene name.
    pub name: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,

    pub width: u32,
    pub height: u32,
    pub background: Rgba,

    #[serde(default)]
    pub guides: GuideOverlay,

    #[serde(default)]
    pub playback: PlaybackSettings,

    /// Objects back to front.
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

impl SceneDocument {
    /// Empty document for a canvas of the given size.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: DOCUMENT_VERSION.to_string(),
            name: name.into(),
            created_at: now.clone(),
            modified_at: now,
            width,
            height,
            background: Rgba::rgb(17, 24, 39),
            guides: GuideOverlay::None,
            playback: PlaybackSettings::default(),
            objects: Vec::new(),
        }
    }

    /// Capture a scene and its playback settings.
    pub fn from_scene(name: impl Into<String>, scene: &Scene, playback: PlaybackSettings) -> Self {
        let mut doc = Self::new(name, scene.width, scene.height);
        doc.background = scene.background;
        doc.guides = scene.guides;
        doc.playback = playback;
        doc.objects = scene.objects().to_vec();
        doc
    }

    /// Build a scene. Fails on structural problems reported by [`validate`].
    ///
    /// [`validate`]: SceneDocument::validate
    pub fn to_scene(&self) -> SceneCastResult<Scene> {
        let problems = self.validate();
        if !problems.is_empty() {
            return Err(SceneCastError::scene(problems.join("; ")));
        }
        let mut scene = Scene::new(self.width, self.height);
        scene.background = self.background;
        scene.guides = self.guides;
        for obj in &self.objects {
            let mut obj = obj.clone();
            // Stored sizes of content-sized kinds are only a hint.
            obj.mark_content_changed();
            scene.add(obj)?;
        }
        Ok(scene)
    }

    /// Structural problems, empty when the document is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.version != DOCUMENT_VERSION {
            errors.push(format!("unsupported document version {}", self.version));
        }
        if self.width == 0 || self.height == 0 {
            errors.push(format!(
                "canvas must have positive size, got {}x{}",
                self.width, self.height
            ));
        }
        if self.playback.total_duration_ms <= 0.0 {
            errors.push("total duration must be positive".to_string());
        }
        if self.playback.playback_rate <= 0.0 {
            errors.push("playback rate must be positive".to_string());
        }

        let mut seen = HashSet::new();
        for obj in &self.objects {
            if !seen.insert(obj.id) {
                errors.push(format!("duplicate object id {}", obj.id));
            }
            if !(0.0..=1.0).contains(&obj.opacity) {
                errors.push(format!("{}: opacity {} out of range", obj.name, obj.opacity));
            }
            if obj.animation.duration_ms < 0.0 || obj.animation.delay_ms < 0.0 {
                errors.push(format!("{}: negative animation timing", obj.name));
            }
            if let ObjectKind::BarChartRace(race) = obj.kind() {
                if race
                    .keyframes
                    .windows(2)
                    .any(|w| w[1].time_ms < w[0].time_ms)
                {
                    errors.push(format!("{}: race keyframes out of order", obj.name));
                }
            }
        }

        errors
    }

    pub fn load(path: impl AsRef<Path>) -> SceneCastResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SceneCastError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write to `path`, bumping `modified_at`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> SceneCastResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.modified_at = chrono::Utc::now().to_rfc3339();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// A small scene using every object kind.
    pub fn sample(width: u32, height: u32) -> Self {
        let mut doc = Self::new("Sample", width, height);
        doc.playback.total_duration_ms = 6_000.0;
        let w = width as f64;
        let h = height as f64;
        let unit = (w.min(h) / 1080.0).max(0.1);

        let title = SceneObject::new(ObjectKind::Text(TextProps {
            text: "SceneCast".to_string(),
            font_size: 72.0 * unit,
            color: Rgba::WHITE,
            background: None,
            padding: 12.0 * unit,
            line_height: 1.2,
            align: TextAlign::Left,
        }))
        .with_position(w * 0.06, h * 0.06)
        .with_animation(Animation::new(AnimationKind::SlideUp, 800.0, 0.0));

        let code = SceneObject::new(ObjectKind::CodeBlock(CodeBlockProps {
            code: "fn main() {\n    println!(\"hello\");\n}".to_string(),
            language: "rust".to_string(),
            theme: CodeTheme::Dark,
            font_size: 28.0 * unit,
            padding: 20.0 * unit,
            line_numbers: true,
        }))
        .with_position(w * 0.06, h * 0.3)
        .with_animation(Animation::new(AnimationKind::Typewriter, 1500.0, 500.0));

        let chart = SceneObject::new(ObjectKind::Chart(ChartProps {
            chart_type: ChartType::Bar,
            series: [("Q1", 12.0), ("Q2", 19.0), ("Q3", 7.0), ("Q4", 24.0)]
                .into_iter()
                .map(|(label, value)| DataPoint {
                    label: label.to_string(),
                    value,
                    color: None,
                })
                .collect(),
            color: Rgba::rgb(59, 130, 246),
            axis_color: Rgba::rgb(156, 163, 175),
            font_size: 20.0 * unit,
            bar_gap: 12.0 * unit,
            padding: 16.0 * unit,
            show_labels: true,
        }))
        .with_position(w * 0.55, h * 0.08)
        .with_size(w * 0.38, h * 0.35)
        .with_animation(Animation::new(AnimationKind::Grow, 1200.0, 300.0));

        let race = SceneObject::new(ObjectKind::BarChartRace(BarRaceProps {
            title: "Stars".to_string(),
            keyframes: vec![
                RaceKeyframe {
                    time_ms: 0.0,
                    values: BTreeMap::from([
                        ("alpha".to_string(), 10.0),
                        ("beta".to_string(), 30.0),
                        ("gamma".to_string(), 20.0),
                    ]),
                },
                RaceKeyframe {
                    time_ms: 5_000.0,
                    values: BTreeMap::from([
                        ("alpha".to_string(), 80.0),
                        ("beta".to_string(), 45.0),
                        ("gamma".to_string(), 60.0),
                    ]),
                },
            ],
            colors: BTreeMap::new(),
            visible_bars: 3,
            font_size: 20.0 * unit,
            bar_gap: 8.0 * unit,
            padding: 12.0 * unit,
            label_color: Rgba::WHITE,
        }))
        .with_position(w * 0.55, h * 0.5)
        .with_size(w * 0.38, h * 0.3);

        let particles = SceneObject::new(ObjectKind::ParticleText(ParticleTextProps {
            text: "HELLO".to_string(),
            font_size: 64.0 * unit,
            color: Rgba::rgb(250, 204, 21),
            particle_size: 3.0 * unit,
            seed: 7,
            assemble_ms: 2_000.0,
        }))
        .with_position(w * 0.06, h * 0.7);

        let character = SceneObject::new(ObjectKind::Character(CharacterProps {
            skin_color: Rgba::rgb(240, 200, 160),
            body_color: Rgba::rgb(16, 185, 129),
            bob_amplitude: 6.0 * unit,
            bob_period_ms: 1_200.0,
        }))
        .with_position(w * 0.4, h * 0.62)
        .with_size(120.0 * unit, 200.0 * unit)
        .with_animation(Animation::new(AnimationKind::FadeIn, 600.0, 1_000.0));

        let logo = SceneObject::new(ObjectKind::Logo(LogoProps {
            label: "SC".to_string(),
            background: Rgba::rgb(37, 99, 235),
            foreground: Rgba::WHITE,
            corner_radius: 24.0 * unit,
            font_size: 48.0 * unit,
        }))
        .with_position(w * 0.86, h * 0.82)
        .with_size(120.0 * unit, 120.0 * unit)
        .with_animation(Animation::new(AnimationKind::ScaleIn, 700.0, 200.0));

        doc.objects = vec![title, code, chart, race, particles, character, logo];
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_valid_and_builds() {
        let doc = SceneDocument::sample(1280, 720);
        assert!(doc.validate().is_empty(), "{:?}", doc.validate());
        let scene = doc.to_scene().unwrap();
        assert_eq!(scene.len(), 7);
        assert_eq!((scene.width, scene.height), (1280, 720));
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut doc = SceneDocument::sample(0, 720);
        let dup = doc.objects[0].clone();
        doc.objects.push(dup);
        doc.playback.total_duration_ms = 0.0;

        let errors = doc.validate();
        assert!(errors.iter().any(|e| e.contains("positive size")));
        assert!(errors.iter().any(|e| e.contains("duplicate object id")));
        assert!(errors.iter().any(|e| e.contains("total duration")));
        assert!(doc.to_scene().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("scenecast_test_document");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("demo.scene.json");

        let mut doc = SceneDocument::sample(640, 360);
        doc.save(&path).unwrap();

        let loaded = SceneDocument::load(&path).unwrap();
        assert_eq!(loaded.name, "Sample");
        assert_eq!(loaded.objects.len(), doc.objects.len());
        assert_eq!(loaded.objects[2].id, doc.objects[2].id);
        assert_eq!(loaded.objects[2].kind().label(), "Chart");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let err = SceneDocument::load("/nonexistent/scene.json").unwrap_err();
        assert!(matches!(err, SceneCastError::FileNotFound { .. }));
    }

    #[test]
    fn test_legacy_document_defaults_playback() {
        let mut value = serde_json::to_value(SceneDocument::new("Old", 100, 100)).unwrap();
        value.as_object_mut().unwrap().remove("playback");
        value.as_object_mut().unwrap().remove("guides");
        let parsed: SceneDocument = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.playback, PlaybackSettings::default());
        assert_eq!(parsed.guides, GuideOverlay::None);
    }
}
