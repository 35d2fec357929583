//! Form-driven prompt assembly and image generation against the OpenAI
//! Images API.
//!
//! [`PromptBuilder`] flattens [`PromptFields`] into a prompt, [`ImageClient`]
//! turns a prompt into image bytes regardless of whether the service answered
//! with an embedded payload or a URL, and [`Session`] keeps the per-user
//! history of a run.

pub mod config;
pub mod download;
pub mod error;
pub mod logger;
pub mod models;
pub mod openai;
pub mod prompt;
pub mod session;

pub use config::{Config, DownloadConfig, OpenAiConfig};
pub use download::{DownloadVariant, OutputFormat, SavedImage};
pub use error::{ImageGenError, Result};
pub use models::*;
pub use openai::{ImageClient, ImageFetcher, ImageGenerationService};
pub use prompt::PromptBuilder;
pub use session::Session;
