use crate::models::SavedCreative;
use crate::session::{GenerationSession, SessionStatus};

/// Saved creatives for the lifetime of the controller. Nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct CreativeGallery {
    items: Vec<SavedCreative>,
}

impl CreativeGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot of a succeeded session. Any other session is ignored.
    pub fn save(&mut self, session: &GenerationSession) -> Option<&SavedCreative> {
        if session.status() != SessionStatus::Succeeded {
            log::debug!("Ignoring save for session in state {:?}", session.status());
            return None;
        }
        let (Some(url), Some(params)) = (session.result_image_url(), session.parameters()) else {
            return None;
        };

        self.items.push(SavedCreative::new(
            url,
            params.prompt.clone(),
            params.aspect_ratio,
            params.style,
        ));
        log::info!("Saved creative #{}", self.items.len());
        self.items.last()
    }

    pub fn delete(&mut self, index: usize) -> Option<SavedCreative> {
        if index >= self.items.len() {
            log::warn!(
                "No saved creative at index {} (gallery has {})",
                index,
                self.items.len()
            );
            return None;
        }
        Some(self.items.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&SavedCreative> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedCreative> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
