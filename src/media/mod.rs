mod cloudinary;
mod local;

pub use cloudinary::CloudinaryStore;
pub use local::LocalMediaStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::storage::models::ImageHandle;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid public id: {0}")]
    InvalidPublicId(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// One image as received from the client, before it is stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
            file_name: None,
        }
    }

    /// MIME type from the part's Content-Type, or guessed from the file name.
    pub fn mime_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| ct != "application/octet-stream")
            .or_else(|| {
                self.file_name
                    .as_deref()
                    .and_then(|n| mime_guess::from_path(n).first())
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

/// Remote host for place images.
///
/// `upload` hands back the handle that must be persisted to delete the image
/// later. Deleting an image the host no longer has is not an error.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<ImageHandle, MediaError>;
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_prefers_content_type() {
        let mut image = ImageUpload::new(Bytes::from_static(b"x"));
        image.content_type = Some("image/webp".to_string());
        image.file_name = Some("photo.png".to_string());
        assert_eq!(image.mime_type(), "image/webp");
    }

    #[test]
    fn test_mime_type_falls_back_to_file_name() {
        let mut image = ImageUpload::new(Bytes::from_static(b"x"));
        image.content_type = Some("application/octet-stream".to_string());
        image.file_name = Some("photo.jpg".to_string());
        assert_eq!(image.mime_type(), "image/jpeg");

        let bare = ImageUpload::new(Bytes::from_static(b"x"));
        assert_eq!(bare.mime_type(), "application/octet-stream");
    }
}
