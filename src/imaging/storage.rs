use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const IMAGE_DIR: &str = "chat_images";

/// URL prefix under which the media root is served
pub const MEDIA_URL_PREFIX: &str = "media";

/// A saved upload
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    /// Location on disk
    pub path: PathBuf,
    /// `media/chat_images/<uuid>.<ext>`, as stored in the database
    pub relative_path: String,
}

/// Writes uploaded images below a media root
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save under a fresh unique name
    pub async fn save(&self, data: &Bytes, mime_type: &str) -> io::Result<StoredImage> {
        let dir = self.root.join(IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension_for(mime_type));
        let path = dir.join(&file_name);
        tokio::fs::write(&path, data).await?;

        debug!(path = %path.display(), bytes = data.len(), "Stored image");
        Ok(StoredImage {
            path,
            relative_path: format!("{}/{}/{}", MEDIA_URL_PREFIX, IMAGE_DIR, file_name),
        })
    }

    /// Best-effort delete
    pub async fn remove(&self, image: &StoredImage) {
        if let Err(e) = tokio::fs::remove_file(&image.path).await {
            warn!(path = %image.path.display(), error = %e, "Failed to remove stored image");
        }
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "image/heif" => "heif",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("jpg"),
    }
}
