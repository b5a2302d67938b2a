use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use super::{ImageUpload, MediaError, MediaStore};
use crate::storage::models::ImageHandle;

/// Local filesystem media store for development and testing.
///
/// Images land under `<base_path>/<folder>/` and are expected to be served by
/// the HTTP layer under `/media/`.
pub struct LocalMediaStore {
    base_path: PathBuf,
    folder: String,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new<P: AsRef<Path>>(
        base_path: P,
        folder: &str,
        public_base_url: &str,
    ) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        let folder = folder.trim_matches('/').to_string();
        std::fs::create_dir_all(base_path.join(&folder))?;
        Ok(Self {
            base_path,
            folder,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Whether an image with this public id is currently stored.
    pub fn contains(&self, public_id: &str) -> bool {
        self.object_path(public_id)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Resolve a public id to a path, refusing anything that escapes the base directory.
    fn object_path(&self, public_id: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(public_id);
        let safe = !public_id.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(MediaError::InvalidPublicId(public_id.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

fn extension_for(image: &ImageUpload) -> String {
    image
        .file_name
        .as_deref()
        .and_then(|n| Path::new(n).extension())
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .or_else(|| match image.mime_type().as_str() {
            "application/octet-stream" => None,
            mime => mime_guess::get_mime_extensions_str(mime)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string()),
        })
        .unwrap_or_else(|| "bin".to_string())
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, image: ImageUpload) -> Result<ImageHandle, MediaError> {
        let public_id = format!(
            "{}/{}.{}",
            self.folder,
            uuid::Uuid::new_v4(),
            extension_for(&image)
        );
        let path = self.object_path(&public_id)?;
        tokio::fs::write(&path, &image.data).await?;

        tracing::debug!(public_id = %public_id, bytes = image.data.len(), "Stored image locally");

        Ok(ImageHandle {
            url: format!("{}/media/{}", self.public_base_url, public_id),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let path = self.object_path(public_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
