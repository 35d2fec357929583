pub mod fetcher;
pub mod image_client;
pub mod service;
pub mod traits;

pub use fetcher::HttpFetcher;
pub use image_client::ImageClient;
pub use service::OpenAiImageService;
pub use traits::{FetchedBody, ImageFetcher, ImageGenerationService};
