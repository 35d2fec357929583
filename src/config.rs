use crate::{
    error::{ImageGenError, Result},
    models::ResponseFormat,
};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_FILE_PREFIX: &str = "ai_image";
pub const DEFAULT_SECRETS_FILE: &str = ".secrets.json";
pub const DEFAULT_HISTORY_DISPLAY_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub output_dir: Option<PathBuf>,
    pub file_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub download: DownloadConfig,
    pub history_display_limit: usize,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        OpenAiConfig {
            api_key: None,
            base_url: None,
            model: None,
            response_format: None,
        }
    }
}

impl OpenAiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the process environment first, then the secrets map.
    pub fn from_sources(secrets: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), secrets)
    }

    /// A blank value in `env` counts as unset and falls through to `secrets`.
    pub fn from_lookup<F>(env: F, secrets: &HashMap<String, String>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: &String| !v.trim().is_empty();
        let lookup = |key: &str| {
            env(key)
                .filter(non_empty)
                .or_else(|| secrets.get(key).cloned().filter(non_empty))
        };

        let response_format = lookup("OPENAI_IMAGE_RESPONSE_FORMAT")
            .map(|v| v.parse::<ResponseFormat>())
            .transpose()?;

        Ok(OpenAiConfig {
            api_key: lookup("OPENAI_API_KEY"),
            base_url: lookup("OPENAI_BASE_URL"),
            model: lookup("OPENAI_IMAGE_MODEL"),
            response_format,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            ImageGenError::ConfigError(
                "Missing OpenAI API key. Set the OPENAI_API_KEY environment variable or add it to the secrets file."
                    .into(),
            )
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }

    /// First characters of the key, for log output.
    pub fn masked_api_key(&self) -> String {
        match &self.api_key {
            Some(key) => format!("{}...", key.chars().take(5).collect::<String>()),
            None => "<unset>".to_string(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        DownloadConfig {
            output_dir: None,
            file_prefix: None,
        }
    }
}

impl DownloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let output_dir = env::var("PROMPTCANVAS_OUTPUT_DIR").ok().map(PathBuf::from);
        let file_prefix = env::var("PROMPTCANVAS_FILE_PREFIX").ok();

        DownloadConfig {
            output_dir,
            file_prefix,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = Some(prefix.into());
        self
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or_else(|| Path::new("."))
    }

    pub fn file_prefix(&self) -> &str {
        self.file_prefix.as_deref().unwrap_or(DEFAULT_FILE_PREFIX)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            openai: OpenAiConfig::default(),
            download: DownloadConfig::default(),
            history_display_limit: DEFAULT_HISTORY_DISPLAY_LIMIT,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `.env`, then the JSON secrets file, then the environment, and
    /// fails when no API key could be resolved.
    pub fn load() -> Result<Self> {
        match dotenv::dotenv() {
            Ok(path) => log::debug!(".env loaded from {}", path.display()),
            Err(_) => log::debug!("No .env file found, using process environment"),
        }

        let secrets_path = env::var("PROMPTCANVAS_SECRETS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_FILE));
        let secrets = load_secrets_file(&secrets_path)?;

        let config = Config {
            openai: OpenAiConfig::from_sources(&secrets)?,
            download: DownloadConfig::from_env(),
            history_display_limit: DEFAULT_HISTORY_DISPLAY_LIMIT,
        };
        config.openai.require_api_key()?;
        Ok(config)
    }

    pub fn with_openai(mut self, config: OpenAiConfig) -> Self {
        self.openai = config;
        self
    }

    pub fn with_download(mut self, config: DownloadConfig) -> Self {
        self.download = config;
        self
    }
}

/// A flat JSON object of string values. A missing file is not an error.
pub fn load_secrets_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        ImageGenError::ConfigError(format!(
            "Secrets file {} is not a JSON object of strings: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = OpenAiConfig::new();
        assert!(matches!(
            config.require_api_key(),
            Err(ImageGenError::ConfigError(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = OpenAiConfig::new().with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
        assert_eq!(config.model(), DEFAULT_IMAGE_MODEL);

        let download = DownloadConfig::new();
        assert_eq!(download.file_prefix(), "ai_image");
        assert_eq!(download.output_dir(), Path::new("."));
    }

    #[test]
    fn test_masked_api_key() {
        let config = OpenAiConfig::new().with_api_key("sk-abcdef123456");
        assert_eq!(config.masked_api_key(), "sk-ab...");
        assert_eq!(OpenAiConfig::new().with_api_key("sk").masked_api_key(), "sk...");
    }

    fn secrets_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_environment_wins_over_secrets() {
        let secrets = secrets_map(&[("OPENAI_API_KEY", "sk-from-secrets")]);
        let env = |key: &str| (key == "OPENAI_API_KEY").then(|| "sk-from-env".to_string());

        let config = OpenAiConfig::from_lookup(env, &secrets).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-from-env"));
    }

    #[test]
    fn test_secrets_fill_in_unset_environment() {
        let secrets = secrets_map(&[
            ("OPENAI_API_KEY", "sk-from-secrets"),
            ("OPENAI_IMAGE_MODEL", "dall-e-2"),
            ("OPENAI_IMAGE_RESPONSE_FORMAT", "b64_json"),
        ]);

        let config = OpenAiConfig::from_lookup(|_| None, &secrets).unwrap();
        assert_eq!(config.require_api_key().unwrap(), "sk-from-secrets");
        assert_eq!(config.model(), "dall-e-2");
        assert_eq!(config.response_format, Some(ResponseFormat::B64Json));
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_blank_environment_value_falls_back_to_secrets() {
        let secrets = secrets_map(&[("OPENAI_API_KEY", "sk-from-secrets")]);
        let env = |key: &str| (key == "OPENAI_API_KEY").then(|| "  ".to_string());

        let config = OpenAiConfig::from_lookup(env, &secrets).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-from-secrets"));

        let blank_everywhere = secrets_map(&[("OPENAI_API_KEY", "")]);
        let config = OpenAiConfig::from_lookup(env, &blank_everywhere).unwrap();
        assert!(matches!(
            config.require_api_key(),
            Err(ImageGenError::ConfigError(_))
        ));
    }

    #[test]
    fn test_bad_response_format_is_config_error() {
        let secrets = secrets_map(&[("OPENAI_IMAGE_RESPONSE_FORMAT", "png")]);
        assert!(matches!(
            OpenAiConfig::from_lookup(|_| None, &secrets),
            Err(ImageGenError::ConfigError(_))
        ));
    }

    #[test]
    fn test_secrets_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"OPENAI_API_KEY": "sk-from-file"}}"#).unwrap();

        let secrets = load_secrets_file(&path).unwrap();
        assert_eq!(secrets.get("OPENAI_API_KEY").unwrap(), "sk-from-file");

        assert!(load_secrets_file(&dir.path().join("absent.json"))
            .unwrap()
            .is_empty());

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            load_secrets_file(&path),
            Err(ImageGenError::ConfigError(_))
        ));
    }
}
