use crate::error::{ImageGenError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ImageGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            other => Err(ImageGenError::ValidationError(format!(
                "Unsupported download format '{}' (expected png or jpg)",
                other
            ))),
        }
    }
}

/// Both variants write the bytes of the image that was already generated;
/// "HD" only changes the file name. No second generation call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadVariant {
    #[default]
    Standard,
    Hd,
}

impl DownloadVariant {
    pub fn suffix(&self) -> &'static str {
        match self {
            DownloadVariant::Standard => "",
            DownloadVariant::Hd => "_hd",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedImage {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub bytes_written: usize,
}

/// `<prefix>_<timestamp><suffix>.<ext>`
pub fn file_name(
    prefix: &str,
    at: DateTime<Utc>,
    format: OutputFormat,
    variant: DownloadVariant,
) -> String {
    format!(
        "{}_{}{}.{}",
        prefix,
        at.format("%Y%m%d_%H%M%S"),
        variant.suffix(),
        format.extension()
    )
}

pub fn save(
    dir: &Path,
    prefix: &str,
    bytes: &[u8],
    format: OutputFormat,
    variant: DownloadVariant,
) -> Result<SavedImage> {
    if bytes.is_empty() {
        return Err(ImageGenError::ValidationError("No image to save".into()));
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(file_name(prefix, Utc::now(), format, variant));
    fs::write(&path, bytes)?;

    log::info!("Image saved to: {} ({})", path.display(), format.content_type());
    Ok(SavedImage {
        path,
        content_type: format.content_type(),
        bytes_written: bytes.len(),
    })
}
