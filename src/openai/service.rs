use crate::{
    config::OpenAiConfig,
    error::{ImageGenError, Result},
    models::{ImageApiResponse, ImageGenerationRequest},
    openai::traits::ImageGenerationService,
};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;

/// `POST <base_url>/images/generations` over reqwest.
pub struct OpenAiImageService {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiImageService {
    pub fn new(client: Client, config: &OpenAiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url().to_string(),
        })
    }

    fn build_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        let bearer = format!("Bearer {}", self.api_key)
            .parse::<header::HeaderValue>()
            .map_err(|_| ImageGenError::ConfigError("API key contains invalid characters".into()))?;
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    fn endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }
}

#[async_trait]
impl ImageGenerationService for OpenAiImageService {
    async fn create_image(&self, request: &ImageGenerationRequest) -> Result<ImageApiResponse> {
        log::debug!(
            "POST {} (model={}, size={}, quality={}, n={})",
            self.endpoint(),
            request.model,
            request.size,
            request.quality,
            request.n
        );

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailure(format!("OpenAI API error: {}", e)))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ImageGenError::GenerationFailure(format!("Failed to read response body: {}", e))
        })?;

        parse_generation_response(status, &body)
    }
}

/// Any non-2xx status or an unparsable body is a failed generation.
pub(crate) fn parse_generation_response(status: u16, body: &str) -> Result<ImageApiResponse> {
    if !(200..300).contains(&status) {
        log::error!("Images API returned {}: {}", status, body);
        return Err(ImageGenError::GenerationFailure(format!(
            "OpenAI API error ({}): {}",
            status,
            api_error_message(body)
        )));
    }

    serde_json::from_str(body)
        .map_err(|e| ImageGenError::GenerationFailure(format!("Malformed response body: {}", e)))
}

/// Pulls `error.message` out of an error body, falling back to the raw text.
pub(crate) fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
