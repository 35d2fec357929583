use crate::models::image::{GeneratedImage, ImageSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One successful generation, kept for the lifetime of the session only.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub prompt: String,
    #[serde(skip)]
    pub image: Vec<u8>,
    pub source: ImageSource,
    pub revised_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(prompt: String, generated: GeneratedImage) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt,
            image: generated.bytes,
            source: generated.source,
            revised_prompt: generated.revised_prompt,
            created_at: Utc::now(),
        }
    }

    /// The URL the image was downloaded from, for fetched results.
    pub fn url(&self) -> Option<&str> {
        match &self.source {
            ImageSource::Fetched { url } => Some(url),
            ImageSource::Embedded => None,
        }
    }
}
