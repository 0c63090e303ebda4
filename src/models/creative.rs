use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::params::{AspectRatio, Style};

/// A retained snapshot of a successful result and the parameters behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCreative {
    pub id: Uuid,
    pub image_url: String,
    pub prompt_text: String,
    pub aspect_ratio: AspectRatio,
    pub style: Style,
    pub saved_at: DateTime<Utc>,
}

impl SavedCreative {
    pub fn new(
        image_url: impl Into<String>,
        prompt_text: impl Into<String>,
        aspect_ratio: AspectRatio,
        style: Style,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_url: image_url.into(),
            prompt_text: prompt_text.into(),
            aspect_ratio,
            style,
            saved_at: Utc::now(),
        }
    }
}
