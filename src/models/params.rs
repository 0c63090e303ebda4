use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Seeds produced by "randomize" fall in `0..SEED_RANGE`.
pub const SEED_RANGE: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:2")]
    Photo,
    #[serde(rename = "2:3")]
    Tall,
    #[serde(rename = "16:10")]
    Widescreen,
    #[serde(rename = "3:1")]
    Panorama,
    #[serde(rename = "1:3")]
    Vertical,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 9] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Standard,
        AspectRatio::Photo,
        AspectRatio::Tall,
        AspectRatio::Widescreen,
        AspectRatio::Panorama,
        AspectRatio::Vertical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Standard => "4:3",
            AspectRatio::Photo => "3:2",
            AspectRatio::Tall => "2:3",
            AspectRatio::Widescreen => "16:10",
            AspectRatio::Panorama => "3:1",
            AspectRatio::Vertical => "1:3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Square => "Square (1:1)",
            AspectRatio::Landscape => "Landscape (16:9)",
            AspectRatio::Portrait => "Portrait (9:16)",
            AspectRatio::Standard => "Standard (4:3)",
            AspectRatio::Photo => "Photo (3:2)",
            AspectRatio::Tall => "Tall (2:3)",
            AspectRatio::Widescreen => "Widescreen (16:10)",
            AspectRatio::Panorama => "Panorama (3:1)",
            AspectRatio::Vertical => "Vertical (1:3)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AspectRatio::Square => "Perfect for profile pictures and Instagram posts",
            AspectRatio::Landscape => "Ideal for YouTube thumbnails and banners",
            AspectRatio::Portrait => "Great for Stories and TikTok",
            AspectRatio::Standard => "Classic format for presentations",
            AspectRatio::Photo => "Traditional photography ratio",
            AspectRatio::Tall => "Good for Pinterest and posters",
            AspectRatio::Widescreen => "Common laptop screen ratio",
            AspectRatio::Panorama => "Wide banner for websites",
            AspectRatio::Vertical => "Tall format for side banners",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownAspectRatio(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Style {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "general")]
    General,
    #[serde(rename = "realistic")]
    Realistic,
    #[serde(rename = "design")]
    Design,
    #[serde(rename = "render_3D")]
    Render3D,
    #[serde(rename = "anime")]
    Anime,
}

impl Style {
    pub const ALL: [Style; 6] = [
        Style::Auto,
        Style::General,
        Style::Realistic,
        Style::Design,
        Style::Render3D,
        Style::Anime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Auto => "auto",
            Style::General => "general",
            Style::Realistic => "realistic",
            Style::Design => "design",
            Style::Render3D => "render_3D",
            Style::Anime => "anime",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Style::Auto => "Auto",
            Style::General => "General",
            Style::Realistic => "Realistic",
            Style::Design => "Design",
            Style::Render3D => "3D Render",
            Style::Anime => "Anime",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Style::Auto => "Let AI choose the best style",
            Style::General => "Balanced, versatile style",
            Style::Realistic => "Photorealistic imagery",
            Style::Design => "Graphic design aesthetic",
            Style::Render3D => "3D rendered visuals",
            Style::Anime => "Japanese anime style",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Style::ALL
            .into_iter()
            .find(|style| style.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownStyle(s.to_string()))
    }
}

/// Validated input for one generation request. Serializes to the service's
/// input object with unset optionals omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub style: Style,
    pub expand_prompt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

/// Editable form contents, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub prompt: String,
    pub negative_prompt: String,
    pub aspect_ratio: AspectRatio,
    pub style: Style,
    pub expand_prompt: bool,
    pub seed: Option<i64>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            negative_prompt: String::new(),
            aspect_ratio: AspectRatio::default(),
            style: Style::default(),
            expand_prompt: true,
            seed: None,
        }
    }
}

impl FormState {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_expand_prompt(mut self, enabled: bool) -> Self {
        self.expand_prompt = enabled;
        self
    }

    pub fn with_seed(mut self, seed: Option<i64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn randomize_seed(&mut self) -> i64 {
        let seed = rand::thread_rng().gen_range(0..SEED_RANGE);
        self.seed = Some(seed);
        seed
    }

    pub fn clear_seed(&mut self) {
        self.seed = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
