//! Uploaded image handling: validation, storage and the analyse-then-persist pipeline

pub mod dispatcher;
pub mod storage;
pub mod summary;

use bytes::Bytes;
use thiserror::Error;

use crate::gateway::GatewayError;

pub use dispatcher::{AnalysisRecorder, AnalyzedImage, ImageAnalysisService};
pub use storage::{MediaStore, StoredImage};

/// MIME type used when neither the upload nor its filename says what it is
pub const FALLBACK_MIME: &str = "image/jpeg";

const GENERIC_MIME: &str = "application/octet-stream";

/// Failures of the image pipeline
#[derive(Debug, Error)]
pub enum ImagingError {
    /// Rejected before any model call or side effect
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Analysis(#[from] GatewayError),

    #[error("Failed to store image: {0}")]
    Storage(#[from] std::io::Error),

    #[error(transparent)]
    Persistence(#[from] crate::store::Error),
}

/// A file received from a multipart form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Bytes,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

impl ImageUpload {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
            filename: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Effective MIME type of the upload
    ///
    /// A missing or generic declared type is replaced by a guess from the
    /// filename, then by `image/jpeg`.
    pub fn resolve_mime(&self) -> String {
        // Parameters such as `; charset=binary` are not part of the type
        let essence = self
            .content_type
            .as_deref()
            .and_then(|declared| declared.split(';').next())
            .map(str::trim);
        match essence {
            Some(declared)
                if !declared.is_empty() && !declared.eq_ignore_ascii_case(GENERIC_MIME) =>
            {
                declared.to_ascii_lowercase()
            }
            _ => self
                .filename
                .as_deref()
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|mime| mime.essence_str().to_string())
                .unwrap_or_else(|| FALLBACK_MIME.to_string()),
        }
    }

    /// Check the upload is a non-empty image and return its MIME type
    pub fn validate(&self) -> Result<String, ImagingError> {
        let mime = self.resolve_mime();
        if !mime.starts_with("image/") {
            return Err(ImagingError::InvalidInput("File must be an image".to_string()));
        }
        if self.data.is_empty() {
            return Err(ImagingError::InvalidInput("Image file is empty".to_string()));
        }
        Ok(mime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_wins() {
        let upload = ImageUpload::new(vec![1u8])
            .with_content_type("image/PNG")
            .with_filename("meal.jpg");
        assert_eq!(upload.resolve_mime(), "image/png");
    }

    #[test]
    fn test_declared_type_parameters_are_dropped() {
        let upload = ImageUpload::new(vec![1u8]).with_content_type("Image/PNG; charset=binary");
        assert_eq!(upload.resolve_mime(), "image/png");
        assert!(upload.validate().is_ok());

        let generic = ImageUpload::new(vec![1u8])
            .with_content_type("application/octet-stream; x=1")
            .with_filename("meter.webp");
        assert_eq!(generic.resolve_mime(), "image/webp");
    }

    #[test]
    fn test_generic_type_falls_back_to_filename() {
        let upload = ImageUpload::new(vec![1u8])
            .with_content_type("application/octet-stream")
            .with_filename("meter.png");
        assert_eq!(upload.resolve_mime(), "image/png");
    }

    #[test]
    fn test_unknown_everything_defaults_to_jpeg() {
        let upload = ImageUpload::new(vec![1u8]).with_filename("blob");
        assert_eq!(upload.resolve_mime(), FALLBACK_MIME);
        assert_eq!(ImageUpload::new(vec![1u8]).resolve_mime(), FALLBACK_MIME);
    }

    #[test]
    fn test_validate_rejects_non_images() {
        let upload = ImageUpload::new(vec![1u8]).with_content_type("text/plain");
        let err = upload.validate().unwrap_err();
        assert!(matches!(err, ImagingError::InvalidInput(_)));
        assert_eq!(err.to_string(), "File must be an image");

        let upload = ImageUpload::new(vec![1u8]).with_filename("notes.txt");
        assert!(upload.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_file() {
        let upload = ImageUpload::new(Vec::<u8>::new()).with_content_type("image/jpeg");
        assert_eq!(upload.validate().unwrap_err().to_string(), "Image file is empty");
    }

    #[test]
    fn test_validate_ok() {
        let upload = ImageUpload::new(vec![0xFFu8, 0xD8]).with_filename("photo.jpeg");
        assert_eq!(upload.validate().unwrap(), "image/jpeg");
    }
}
