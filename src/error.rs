use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageGenError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Error downloading image from URL: HTTP {status}")]
    FetchError { status: u16 },

    #[error("Unrecognized response format from the image API: {0}")]
    UnrecognizedResponseFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ImageGenError {
    /// Only a missing or broken configuration stops the application.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ImageGenError::ConfigError(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ImageGenError::ConfigError(_) => "configuration",
            ImageGenError::ValidationError(_) => "validation",
            ImageGenError::GenerationFailure(_) => "generation",
            ImageGenError::FetchError { .. } => "fetch",
            ImageGenError::UnrecognizedResponseFormat(_) => "response-format",
            ImageGenError::IoError(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, ImageGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message_carries_status() {
        let err = ImageGenError::FetchError { status: 404 };
        assert_eq!(err.to_string(), "Error downloading image from URL: HTTP 404");
        assert_eq!(err.kind(), "fetch");
    }

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(!ImageGenError::ConfigError("missing key".into()).is_recoverable());
        assert!(ImageGenError::ValidationError("empty".into()).is_recoverable());
        assert!(ImageGenError::GenerationFailure("timeout".into()).is_recoverable());
        assert!(ImageGenError::UnrecognizedResponseFormat("{}".into()).is_recoverable());
    }
}
