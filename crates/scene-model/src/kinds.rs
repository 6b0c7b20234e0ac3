//! Kind-specific payloads for scene objects.
//!
//! The engine only needs three things from a kind: whether its size is
//! content-derived, which of its fields are "size-like" (scaled uniformly on
//! canvas resize), and sensible defaults for new objects. Everything else is
//! drawing detail.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Rgba;

/// Discriminated union of object kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectKind {
    Text(TextProps),
    CodeBlock(CodeBlockProps),
    Chart(ChartProps),
    BarChartRace(BarRaceProps),
    ParticleText(ParticleTextProps),
    Character(CharacterProps),
    Logo(LogoProps),
}

/// Horizontal text alignment inside the object's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextProps {
    pub text: String,
    pub font_size: f64,
    pub color: Rgba,
    #[serde(default)]
    pub background: Option<Rgba>,
    #[serde(default)]
    pub padding: f64,
    /// Line height as a multiple of `font_size`.
    pub line_height: f64,
    #[serde(default)]
    pub align: TextAlign,
}

/// Color theme for code blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeTheme {
    #[default]
    Dark,
    Light,
    Monokai,
}

/// Resolved palette for a code theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemePalette {
    pub background: Rgba,
    pub foreground: Rgba,
    pub gutter: Rgba,
    pub keyword: Rgba,
    pub string: Rgba,
    pub comment: Rgba,
}

impl CodeTheme {
    pub fn palette(self) -> ThemePalette {
        match self {
            CodeTheme::Dark => ThemePalette {
                background: Rgba::rgb(30, 30, 46),
                foreground: Rgba::rgb(205, 214, 244),
                gutter: Rgba::rgb(108, 112, 134),
                keyword: Rgba::rgb(203, 166, 247),
                string: Rgba::rgb(166, 227, 161),
                comment: Rgba::rgb(127, 132, 156),
            },
            CodeTheme::Light => ThemePalette {
                background: Rgba::rgb(250, 250, 250),
                foreground: Rgba::rgb(56, 58, 66),
                gutter: Rgba::rgb(160, 161, 167),
                keyword: Rgba::rgb(166, 38, 164),
                string: Rgba::rgb(80, 161, 79),
                comment: Rgba::rgb(160, 161, 167),
            },
            CodeTheme::Monokai => ThemePalette {
                background: Rgba::rgb(39, 40, 34),
                foreground: Rgba::rgb(248, 248, 242),
                gutter: Rgba::rgb(117, 113, 94),
                keyword: Rgba::rgb(249, 38, 114),
                string: Rgba::rgb(230, 219, 116),
                comment: Rgba::rgb(117, 113, 94),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlockProps {
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub theme: CodeTheme,
    pub font_size: f64,
    pub padding: f64,
    #[serde(default = "default_true")]
    pub line_numbers: bool,
}

/// Chart rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
}

/// One labelled value in a chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: f64,
    #[serde(default)]
    pub color: Option<Rgba>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartProps {
    #[serde(default)]
    pub chart_type: ChartType,
    pub series: Vec<DataPoint>,
    pub color: Rgba,
    pub axis_color: Rgba,
    pub font_size: f64,
    pub bar_gap: f64,
    pub padding: f64,
    #[serde(default = "default_true")]
    pub show_labels: bool,
}

/// Values of every race entry at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceKeyframe {
    pub time_ms: f64,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRaceProps {
    #[serde(default)]
    pub title: String,
    /// Keyframes sorted by `time_ms`.
    pub keyframes: Vec<RaceKeyframe>,
    #[serde(default)]
    pub colors: BTreeMap<String, Rgba>,
    pub visible_bars: usize,
    pub font_size: f64,
    pub bar_gap: f64,
    pub padding: f64,
    pub label_color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleTextProps {
    pub text: String,
    pub font_size: f64,
    pub color: Rgba,
    pub particle_size: f64,
    /// Seed for the scattered start positions.
    #[serde(default)]
    pub seed: u64,
    /// Milliseconds the particles take to assemble.
    pub assemble_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterProps {
    pub skin_color: Rgba,
    pub body_color: Rgba,
    /// Vertical idle bob distance in pixels.
    pub bob_amplitude: f64,
    /// Idle bob period in milliseconds (0 disables the bob).
    pub bob_period_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoProps {
    pub label: String,
    pub background: Rgba,
    pub foreground: Rgba,
    pub corner_radius: f64,
    pub font_size: f64,
}

fn default_true() -> bool {
    true
}

impl ObjectKind {
    /// Short user-facing kind name, used for default object names.
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Text(_) => "Text",
            ObjectKind::CodeBlock(_) => "Code",
            ObjectKind::Chart(_) => "Chart",
            ObjectKind::BarChartRace(_) => "Bar Race",
            ObjectKind::ParticleText(_) => "Particles",
            ObjectKind::Character(_) => "Character",
            ObjectKind::Logo(_) => "Logo",
        }
    }

    /// Kinds whose width/height are measured from content at draw time.
    pub fn is_content_sized(&self) -> bool {
        matches!(
            self,
            ObjectKind::Text(_) | ObjectKind::CodeBlock(_) | ObjectKind::ParticleText(_)
        )
    }

    /// Initial size for a freshly created object.
    pub fn default_size(&self) -> (f64, f64) {
        match self {
            ObjectKind::Text(_) => (200.0, 60.0),
            ObjectKind::CodeBlock(_) => (480.0, 240.0),
            ObjectKind::Chart(_) => (480.0, 300.0),
            ObjectKind::BarChartRace(_) => (640.0, 400.0),
            ObjectKind::ParticleText(_) => (320.0, 90.0),
            ObjectKind::Character(_) => (120.0, 200.0),
            ObjectKind::Logo(_) => (160.0, 160.0),
        }
    }

    /// Uniformly scale every size-like field (fonts, padding, gaps, radii).
    pub fn scale_sizes(&mut self, s: f64) {
        match self {
            ObjectKind::Text(p) => {
                p.font_size *= s;
                p.padding *= s;
            }
            ObjectKind::CodeBlock(p) => {
                p.font_size *= s;
                p.padding *= s;
            }
            ObjectKind::Chart(p) => {
                p.font_size *= s;
                p.bar_gap *= s;
                p.padding *= s;
            }
            ObjectKind::BarChartRace(p) => {
                p.font_size *= s;
                p.bar_gap *= s;
                p.padding *= s;
            }
            ObjectKind::ParticleText(p) => {
                p.font_size *= s;
                p.particle_size *= s;
            }
            ObjectKind::Character(p) => {
                p.bob_amplitude *= s;
            }
            ObjectKind::Logo(p) => {
                p.corner_radius *= s;
                p.font_size *= s;
            }
        }
    }

    /// Font size, for kinds that carry text.
    pub fn font_size(&self) -> Option<f64> {
        match self {
            ObjectKind::Text(p) => Some(p.font_size),
            ObjectKind::CodeBlock(p) => Some(p.font_size),
            ObjectKind::Chart(p) => Some(p.font_size),
            ObjectKind::BarChartRace(p) => Some(p.font_size),
            ObjectKind::ParticleText(p) => Some(p.font_size),
            ObjectKind::Logo(p) => Some(p.font_size),
            ObjectKind::Character(_) => None,
        }
    }

    pub fn font_size_mut(&mut self) -> Option<&mut f64> {
        match self {
            ObjectKind::Text(p) => Some(&mut p.font_size),
            ObjectKind::CodeBlock(p) => Some(&mut p.font_size),
            ObjectKind::Chart(p) => Some(&mut p.font_size),
            ObjectKind::BarChartRace(p) => Some(&mut p.font_size),
            ObjectKind::ParticleText(p) => Some(&mut p.font_size),
            ObjectKind::Logo(p) => Some(&mut p.font_size),
            ObjectKind::Character(_) => None,
        }
    }

    /// Primary text content, for kinds that have one.
    pub fn text(&self) -> Option<&str> {
        match self {
            ObjectKind::Text(p) => Some(&p.text),
            ObjectKind::CodeBlock(p) => Some(&p.code),
            ObjectKind::ParticleText(p) => Some(&p.text),
            ObjectKind::Logo(p) => Some(&p.label),
            ObjectKind::BarChartRace(p) => Some(&p.title),
            ObjectKind::Chart(_) | ObjectKind::Character(_) => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            ObjectKind::Text(p) => Some(&mut p.text),
            ObjectKind::CodeBlock(p) => Some(&mut p.code),
            ObjectKind::ParticleText(p) => Some(&mut p.text),
            ObjectKind::Logo(p) => Some(&mut p.label),
            ObjectKind::BarChartRace(p) => Some(&mut p.title),
            ObjectKind::Chart(_) | ObjectKind::Character(_) => None,
        }
    }

    /// Primary foreground color slot. Code blocks take colors from their theme.
    pub fn color_mut(&mut self) -> Option<&mut Rgba> {
        match self {
            ObjectKind::Text(p) => Some(&mut p.color),
            ObjectKind::Chart(p) => Some(&mut p.color),
            ObjectKind::BarChartRace(p) => Some(&mut p.label_color),
            ObjectKind::ParticleText(p) => Some(&mut p.color),
            ObjectKind::Character(p) => Some(&mut p.body_color),
            ObjectKind::Logo(p) => Some(&mut p.background),
            ObjectKind::CodeBlock(_) => None,
        }
    }
}

impl BarRaceProps {
    /// Interpolated values at `time_ms`, sorted descending by value.
    ///
    /// Before the first keyframe the first keyframe's values hold; after the
    /// last keyframe the last values hold. Entries missing from a keyframe
    /// count as zero.
    pub fn ranking_at(&self, time_ms: f64) -> Vec<(String, f64)> {
        let Some(first) = self.keyframes.first() else {
            return Vec::new();
        };
        let last = self.keyframes.last().unwrap_or(first);

        let values: BTreeMap<String, f64> = if time_ms <= first.time_ms {
            first.values.clone()
        } else if time_ms >= last.time_ms {
            last.values.clone()
        } else {
            let idx = self
                .keyframes
                .windows(2)
                .position(|w| time_ms >= w[0].time_ms && time_ms < w[1].time_ms)
                .unwrap_or(0);
            let a = &self.keyframes[idx];
            let b = &self.keyframes[idx + 1];
            let span = (b.time_ms - a.time_ms).max(f64::EPSILON);
            let t = ((time_ms - a.time_ms) / span).clamp(0.0, 1.0);
            a.values
                .keys()
                .chain(b.values.keys())
                .map(|label| {
                    let va = a.values.get(label).copied().unwrap_or(0.0);
                    let vb = b.values.get(label).copied().unwrap_or(0.0);
                    (label.clone(), va + (vb - va) * t)
                })
                .collect()
        };

        let mut ranking: Vec<(String, f64)> = values.into_iter().collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn race() -> BarRaceProps {
        let kf = |t: f64, pairs: &[(&str, f64)]| RaceKeyframe {
            time_ms: t,
            values: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        };
        BarRaceProps {
            title: "Languages".to_string(),
            keyframes: vec![
                kf(0.0, &[("rust", 10.0), ("go", 30.0)]),
                kf(1000.0, &[("rust", 50.0), ("go", 40.0)]),
            ],
            colors: BTreeMap::new(),
            visible_bars: 5,
            font_size: 18.0,
            bar_gap: 6.0,
            padding: 12.0,
            label_color: Rgba::WHITE,
        }
    }

    #[test]
    fn test_ranking_interpolates_and_reorders() {
        let race = race();
        let start = race.ranking_at(0.0);
        assert_eq!(start[0].0, "go");

        let mid = race.ranking_at(500.0);
        assert_eq!(mid[0].0, "go");
        assert!((mid[0].1 - 35.0).abs() < 1e-9);
        assert!((mid[1].1 - 30.0).abs() < 1e-9);

        let end = race.ranking_at(5000.0);
        assert_eq!(end[0].0, "rust");
        assert_eq!(end[0].1, 50.0);
    }

    #[test]
    fn test_scale_sizes_touches_only_size_fields() {
        let mut kind = ObjectKind::Text(TextProps {
            text: "hi".to_string(),
            font_size: 40.0,
            color: Rgba::WHITE,
            background: None,
            padding: 8.0,
            line_height: 1.2,
            align: TextAlign::Left,
        });
        kind.scale_sizes(0.5);
        let ObjectKind::Text(p) = kind else {
            panic!("kind changed");
        };
        assert_eq!(p.font_size, 20.0);
        assert_eq!(p.padding, 4.0);
        assert_eq!(p.line_height, 1.2);
    }
}
