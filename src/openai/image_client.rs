use crate::{
    config::OpenAiConfig,
    error::{ImageGenError, Result},
    logger,
    models::{
        GeneratedImage, GenerationOptions, ImageGenerationRequest, ImagePayload, ImageSource,
        ResponseFormat,
    },
    openai::{
        fetcher::HttpFetcher,
        service::OpenAiImageService,
        traits::{ImageFetcher, ImageGenerationService},
    },
    prompt::PromptBuilder,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use std::sync::Arc;

/// Stateless wrapper around the generation call: every `generate` is
/// independent and resolves the response shape into raw image bytes.
#[derive(Clone)]
pub struct ImageClient {
    service: Arc<dyn ImageGenerationService>,
    fetcher: Arc<dyn ImageFetcher>,
    model: String,
    response_format: Option<ResponseFormat>,
}

impl ImageClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let client = Client::new();
        let service = OpenAiImageService::new(client.clone(), config)?;

        log::info!(
            "Image client ready: model={}, endpoint={}, key={}",
            config.model(),
            config.base_url(),
            config.masked_api_key()
        );

        Ok(Self {
            service: Arc::new(service),
            fetcher: Arc::new(HttpFetcher::new(client)),
            model: config.model().to_string(),
            response_format: config.response_format,
        })
    }

    pub fn with_backends(
        service: Arc<dyn ImageGenerationService>,
        fetcher: Arc<dyn ImageFetcher>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            service,
            fetcher,
            model: model.into(),
            response_format: None,
        }
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GeneratedImage> {
        PromptBuilder::ensure_not_empty(prompt)?;
        options.validate()?;

        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: options.variants,
            size: options.size.as_str(),
            quality: options.quality.as_api_str(),
            response_format: self.response_format,
        };

        log::info!(
            "Requesting image ({} chars, size={}, quality={}, n={})",
            prompt.chars().count(),
            request.size,
            request.quality,
            request.n
        );
        let _timer = logger::timer("image generation");

        let response = self.service.create_image(&request).await?;

        let Some(first) = response.data.first() else {
            return Err(ImageGenError::UnrecognizedResponseFormat(
                "response contained no image items".into(),
            ));
        };
        if response.data.len() > 1 {
            log::debug!(
                "Service returned {} items, using the first",
                response.data.len()
            );
        }

        let revised_prompt = first.revised_prompt.clone();
        if let Some(revised) = &revised_prompt {
            log::debug!("Service revised the prompt: {}", revised);
        }

        let payload = first.payload().ok_or_else(|| {
            ImageGenError::UnrecognizedResponseFormat(
                "first item has neither b64_json nor url".into(),
            )
        })?;

        let (bytes, source) = self.resolve(payload).await?;

        log::info!("Image ready: {} bytes ({})", bytes.len(), source.tag());
        Ok(GeneratedImage {
            bytes,
            source,
            revised_prompt,
        })
    }

    async fn resolve(&self, payload: ImagePayload) -> Result<(Vec<u8>, ImageSource)> {
        match payload {
            ImagePayload::Embedded(b64) => {
                let bytes = STANDARD.decode(b64.trim()).map_err(|e| {
                    ImageGenError::GenerationFailure(format!(
                        "Embedded image is not valid base64: {}",
                        e
                    ))
                })?;
                Ok((bytes, ImageSource::Embedded))
            }
            ImagePayload::Remote(url) => {
                let body = self.fetcher.fetch(&url).await?;
                if !body.is_success() {
                    log::warn!("Image download from {} returned {}", url, body.status);
                    return Err(ImageGenError::FetchError {
                        status: body.status,
                    });
                }
                Ok((body.bytes, ImageSource::Fetched { url }))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ImageApiResponse, ImageData, ImageSize, Quality};
    use crate::openai::traits::FetchedBody;
    use async_trait::async_trait;
    use std::sync::Mutex;

    pub(crate) struct FakeService {
        pub response: Mutex<Option<Result<ImageApiResponse>>>,
        pub requests: Mutex<Vec<ImageGenerationRequest>>,
    }

    impl FakeService {
        pub fn returning(response: Result<ImageApiResponse>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn with_item(item: ImageData) -> Arc<Self> {
            Self::returning(Ok(ImageApiResponse {
                created: Some(1_700_000_000),
                data: vec![item],
            }))
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageGenerationService for FakeService {
        async fn create_image(
            &self,
            request: &ImageGenerationRequest,
        ) -> Result<ImageApiResponse> {
            self.requests.lock().unwrap().push(request.clone());
            // A single canned response that repeats for every call.
            match self.response.lock().unwrap().as_ref() {
                Some(Ok(response)) => Ok(response.clone()),
                Some(Err(e)) => Err(ImageGenError::GenerationFailure(e.to_string())),
                None => Err(ImageGenError::GenerationFailure("no response".into())),
            }
        }
    }

    pub(crate) struct FakeFetcher {
        pub status: u16,
        pub bytes: Vec<u8>,
        pub urls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn new(status: u16, bytes: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                status,
                bytes: bytes.to_vec(),
                urls: Mutex::new(Vec::new()),
            })
        }

        pub fn fetched(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedBody> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(FetchedBody {
                status: self.status,
                bytes: self.bytes.clone(),
            })
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl ImageFetcher for FailingFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedBody> {
            Err(ImageGenError::GenerationFailure(
                "Image download failed: connection refused".into(),
            ))
        }
    }

    fn client(service: Arc<FakeService>, fetcher: Arc<dyn ImageFetcher>) -> ImageClient {
        ImageClient::with_backends(service, fetcher, "dall-e-3")
    }

    #[tokio::test]
    async fn test_embedded_payload_is_decoded_without_fetch() {
        let service = FakeService::with_item(ImageData {
            b64_json: Some(STANDARD.encode(b"\x89PNG fake")),
            url: None,
            revised_prompt: Some("A red bicycle, watercolor".into()),
        });
        let fetcher = FakeFetcher::new(200, b"unused");
        let image = client(service.clone(), fetcher.clone())
            .generate("Subject: a red bicycle", &GenerationOptions::new())
            .await
            .unwrap();

        assert_eq!(image.bytes, b"\x89PNG fake");
        assert_eq!(image.source, ImageSource::Embedded);
        assert_eq!(image.revised_prompt.as_deref(), Some("A red bicycle, watercolor"));
        assert!(fetcher.fetched().is_empty());
        assert_eq!(service.request_count(), 1);
    }

    #[tokio::test]
    async fn test_url_payload_is_fetched_once() {
        let url = "https://images.example.com/abc.png";
        let service = FakeService::with_item(ImageData {
            b64_json: None,
            url: Some(url.into()),
            revised_prompt: None,
        });
        let fetcher = FakeFetcher::new(200, b"remote bytes");
        let image = client(service, fetcher.clone())
            .generate("Subject: a fox", &GenerationOptions::new())
            .await
            .unwrap();

        assert_eq!(image.bytes, b"remote bytes");
        assert_eq!(image.source, ImageSource::Fetched { url: url.into() });
        assert_eq!(fetcher.fetched(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn test_url_not_found_is_fetch_error() {
        let service = FakeService::with_item(ImageData {
            b64_json: None,
            url: Some("https://images.example.com/gone.png".into()),
            revised_prompt: None,
        });
        let fetcher = FakeFetcher::new(404, b"not found");
        let err = client(service, fetcher.clone())
            .generate("Subject: a fox", &GenerationOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ImageGenError::FetchError { status: 404 }));
        assert_eq!(fetcher.fetched().len(), 1);
    }

    #[tokio::test]
    async fn test_item_without_image_is_unrecognized() {
        let service = FakeService::with_item(ImageData {
            revised_prompt: Some("only text".into()),
            ..Default::default()
        });
        let fetcher = FakeFetcher::new(200, b"");
        let err = client(service, fetcher.clone())
            .generate("Subject: a fox", &GenerationOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ImageGenError::UnrecognizedResponseFormat(_)));
        assert!(fetcher.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_empty_data_is_unrecognized() {
        let service = FakeService::returning(Ok(ImageApiResponse {
            created: None,
            data: vec![],
        }));
        let err = client(service, FakeFetcher::new(200, b""))
            .generate("Subject: a fox", &GenerationOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ImageGenError::UnrecognizedResponseFormat(_)));
    }

    #[tokio::test]
    async fn test_invalid_base64_is_generation_failure() {
        let service = FakeService::with_item(ImageData {
            b64_json: Some("***not base64***".into()),
            url: None,
            revised_prompt: None,
        });
        let err = client(service, FakeFetcher::new(200, b""))
            .generate("Subject: a fox", &GenerationOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ImageGenError::GenerationFailure(_)));
    }

    #[tokio::test]
    async fn test_transport_failures_surface_as_generation_failure() {
        let service = FakeService::returning(Err(ImageGenError::GenerationFailure(
            "OpenAI API error: operation timed out".into(),
        )));
        let err = client(service, FakeFetcher::new(200, b""))
            .generate("Subject: a fox", &GenerationOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ImageGenError::GenerationFailure(_)));

        let service = FakeService::with_item(ImageData {
            b64_json: None,
            url: Some("https://images.example.com/a.png".into()),
            revised_prompt: None,
        });
        let err = client(service, Arc::new(FailingFetcher))
            .generate("Subject: a fox", &GenerationOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ImageGenError::GenerationFailure(_)));
    }

    #[tokio::test]
    async fn test_invalid_input_sends_nothing() {
        let service = FakeService::with_item(ImageData::default());
        let client = client(service.clone(), FakeFetcher::new(200, b""));

        let err = client
            .generate("   ", &GenerationOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ImageGenError::ValidationError(_)));

        let err = client
            .generate("Subject: a fox", &GenerationOptions::new().with_variants(9))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageGenError::ValidationError(_)));
        assert_eq!(service.request_count(), 0);
    }

    #[tokio::test]
    async fn test_options_reach_the_request() {
        let service = FakeService::with_item(ImageData {
            b64_json: Some(STANDARD.encode(b"x")),
            url: None,
            revised_prompt: None,
        });
        let client = client(service.clone(), FakeFetcher::new(200, b""))
            .with_response_format(ResponseFormat::B64Json);
        let options = GenerationOptions::new()
            .with_size(ImageSize::Landscape)
            .with_quality(Quality::High)
            .with_variants(3);
        client.generate("Subject: a fox", &options).await.unwrap();

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests[0].size, "1792x1024");
        assert_eq!(requests[0].quality, "hd");
        assert_eq!(requests[0].n, 3);
        assert_eq!(requests[0].model, "dall-e-3");
        assert_eq!(requests[0].response_format, Some(ResponseFormat::B64Json));
    }
}
