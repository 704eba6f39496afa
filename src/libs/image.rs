use super::generation::{GenerationError, InlineImage};
use base64::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// A reference photo read from disk, ready to be attached to a generation
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// MIME type for the image formats the model accepts.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

impl ImageFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GenerationError> {
        let path = path.as_ref();
        let image_error = |reason: String| GenerationError::Image {
            path: path.display().to_string(),
            reason,
        };
        let mime_type = mime_type_for(path).ok_or_else(|| image_error("unsupported image type".to_string()))?;
        let bytes = fs::read(path).map_err(|e| image_error(e.to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    pub fn to_inline(&self) -> InlineImage {
        InlineImage {
            mime_type: self.mime_type.clone(),
            data: BASE64_STANDARD.encode(&self.bytes),
        }
    }
}
