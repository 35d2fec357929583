use crate::{
    error::Result,
    models::{ImageApiResponse, ImageGenerationRequest},
};
use async_trait::async_trait;

/// The remote image generation endpoint.
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn create_image(&self, request: &ImageGenerationRequest) -> Result<ImageApiResponse>;
}

/// Raw outcome of a GET. Status interpretation is left to the caller.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl FetchedBody {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Downloads images that the service returned by URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedBody>;
}
