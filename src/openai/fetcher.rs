use crate::{
    error::{ImageGenError, Result},
    openai::traits::{FetchedBody, ImageFetcher},
};
use async_trait::async_trait;
use reqwest::Client;

/// Plain GET for images the service only returned by URL.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedBody> {
        log::debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            ImageGenError::GenerationFailure(format!("Image download failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            // Error pages are not worth downloading.
            return Ok(FetchedBody {
                status: status.as_u16(),
                bytes: Vec::new(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            ImageGenError::GenerationFailure(format!("Failed to read image body: {}", e))
        })?;

        Ok(FetchedBody {
            status: status.as_u16(),
            bytes: bytes.to_vec(),
        })
    }
}
