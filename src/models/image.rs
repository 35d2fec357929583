use crate::error::{ImageGenError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_VARIANTS: u8 = 1;
pub const MAX_VARIANTS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    #[default]
    Square,
    Landscape,
    Portrait,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Landscape => "1792x1024",
            ImageSize::Portrait => "1024x1792",
        }
    }
}

impl FromStr for ImageSize {
    type Err = ImageGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" | "1024x1024" => Ok(ImageSize::Square),
            "landscape" | "1792x1024" => Ok(ImageSize::Landscape),
            "portrait" | "1024x1792" => Ok(ImageSize::Portrait),
            other => Err(ImageGenError::ValidationError(format!(
                "Unsupported image size '{}' (expected square, landscape or portrait)",
                other
            ))),
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    High,
}

impl Quality {
    /// Value understood by the images endpoint.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::High => "hd",
        }
    }
}

impl FromStr for Quality {
    type Err = ImageGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Quality::Standard),
            "high" | "hd" => Ok(Quality::High),
            other => Err(ImageGenError::ValidationError(format!(
                "Unsupported quality '{}' (expected standard or high)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub size: ImageSize,
    pub quality: Quality,
    pub variants: u8,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            size: ImageSize::Square,
            quality: Quality::Standard,
            variants: 1,
        }
    }
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_variants(mut self, variants: u8) -> Self {
        self.variants = variants;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_VARIANTS..=MAX_VARIANTS).contains(&self.variants) {
            return Err(ImageGenError::ValidationError(format!(
                "Variant count must be between {} and {}, got {}",
                MIN_VARIANTS, MAX_VARIANTS, self.variants
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Url,
    B64Json,
}

impl FromStr for ResponseFormat {
    type Err = ImageGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "url" => Ok(ResponseFormat::Url),
            "b64_json" => Ok(ResponseFormat::B64Json),
            other => Err(ImageGenError::ConfigError(format!(
                "Unsupported response format '{}' (expected url or b64_json)",
                other
            ))),
        }
    }
}

/// Body of `POST /images/generations`.
#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u8,
    pub size: &'static str,
    pub quality: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageApiResponse {
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub data: Vec<ImageData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

/// The two response shapes the images endpoint can produce for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    Embedded(String),
    Remote(String),
}

impl ImageData {
    /// An embedded payload wins over a URL when both are present.
    pub fn payload(&self) -> Option<ImagePayload> {
        if let Some(b64) = self.b64_json.as_ref().filter(|s| !s.is_empty()) {
            return Some(ImagePayload::Embedded(b64.clone()));
        }
        self.url
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(|url| ImagePayload::Remote(url.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImageSource {
    Embedded,
    Fetched { url: String },
}

impl ImageSource {
    pub fn tag(&self) -> &'static str {
        match self {
            ImageSource::Embedded => "embedded",
            ImageSource::Fetched { .. } => "fetched",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub source: ImageSource,
    pub revised_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_parsing_accepts_names_and_dimensions() {
        assert_eq!("square".parse::<ImageSize>().unwrap(), ImageSize::Square);
        assert_eq!("1792x1024".parse::<ImageSize>().unwrap(), ImageSize::Landscape);
        assert_eq!(" Portrait ".parse::<ImageSize>().unwrap(), ImageSize::Portrait);
        assert!(matches!(
            "512x512".parse::<ImageSize>(),
            Err(ImageGenError::ValidationError(_))
        ));
    }

    #[test]
    fn test_variant_count_is_bounded() {
        assert!(GenerationOptions::new().with_variants(4).validate().is_ok());
        assert!(GenerationOptions::new().with_variants(0).validate().is_err());
        assert!(GenerationOptions::new().with_variants(5).validate().is_err());
    }

    #[test]
    fn test_request_serialization() {
        let request = ImageGenerationRequest {
            model: "dall-e-3".to_string(),
            prompt: "Subject: a fox".to_string(),
            n: 1,
            size: ImageSize::Portrait.as_str(),
            quality: Quality::High.as_api_str(),
            response_format: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["size"], "1024x1792");
        assert_eq!(value["quality"], "hd");
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_payload_prefers_embedded() {
        let item = ImageData {
            b64_json: Some("aGk=".into()),
            url: Some("https://example.com/a.png".into()),
            revised_prompt: None,
        };
        assert_eq!(item.payload(), Some(ImagePayload::Embedded("aGk=".into())));
        assert_eq!(ImageData::default().payload(), None);
    }
}
