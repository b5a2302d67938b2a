use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;

use super::repository::{PlaceRepository, RepositoryError};
use crate::media::{ImageUpload, MediaError, MediaStore};
use crate::storage::models::{ImageHandle, Place, PlaceAttributes, PlaceChanges};

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 50;

#[derive(Debug, Error)]
pub enum PlaceError {
    #[error("Place not found: {0}")]
    NotFound(String),
    #[error("Image upload failed: {0}")]
    UploadFailed(#[source] MediaError),
    #[error("Failed to delete {failed} of {total} images: {source}")]
    DeleteFailed {
        failed: usize,
        total: usize,
        #[source]
        source: MediaError,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One page of places plus the clamped request that produced it.
#[derive(Debug, Serialize)]
pub struct PlacePage {
    pub items: Vec<Place>,
    pub limit: u32,
    pub page: u32,
    pub total: u64,
}

/// Page number and size after clamping: `page >= 1`, `1 <= limit <= 50`.
pub fn clamp_page(page: Option<i64>, limit: Option<i64>) -> (u32, u32) {
    let page = page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
    let limit = limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT) as u32;
    (page, limit)
}

/// Orchestrates place writes across the media host and the place repository.
///
/// Each group of media calls runs concurrently on the caller's task and is
/// awaited as a whole before results are inspected. Uploads that succeed
/// alongside a failed one are deleted again before the error is returned.
/// Deletes cannot be undone: a failed delete group leaves the record as is,
/// with some of its images possibly gone.
pub struct PlaceService {
    media: Arc<dyn MediaStore>,
    places: Arc<dyn PlaceRepository>,
}

impl PlaceService {
    pub fn new(media: Arc<dyn MediaStore>, places: Arc<dyn PlaceRepository>) -> Self {
        Self { media, places }
    }

    pub async fn get(&self, id: &str) -> Result<Place, PlaceError> {
        self.places
            .find(id)
            .await?
            .ok_or_else(|| PlaceError::NotFound(id.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Place>, PlaceError> {
        Ok(self.places.list().await?)
    }

    pub async fn list_page(&self, page: u32, limit: u32) -> Result<PlacePage, PlaceError> {
        let all = self.places.list().await?;
        let total = all.len() as u64;
        let skip = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
        let items = all.into_iter().skip(skip).take(limit as usize).collect();

        Ok(PlacePage {
            items,
            limit,
            page,
            total,
        })
    }

    /// Upload all images, then insert the place. Images keep their input order.
    pub async fn create(
        &self,
        attributes: PlaceAttributes,
        uploads: Vec<ImageUpload>,
    ) -> Result<Place, PlaceError> {
        let images = self.upload_all(uploads).await?;
        let place = Place::new(uuid::Uuid::new_v4().to_string(), attributes, images.clone());
        let id = place.id.clone();

        match self.places.insert(place).await {
            Ok(place) => {
                tracing::debug!(place_id = %id, images = place.images.len(), "Created place");
                Ok(place)
            }
            Err(e) => {
                self.discard(&images).await;
                Err(e.into())
            }
        }
    }

    /// Apply attribute changes. A non-empty `uploads` replaces the image set:
    /// the current images are deleted first, then the new ones are uploaded.
    pub async fn update(
        &self,
        id: &str,
        changes: PlaceChanges,
        uploads: Vec<ImageUpload>,
    ) -> Result<Place, PlaceError> {
        let place = self
            .places
            .find(id)
            .await?
            .ok_or_else(|| PlaceError::NotFound(id.to_string()))?;

        let images = if uploads.is_empty() {
            None
        } else {
            self.delete_all(&place.images).await?;
            Some(self.upload_all(uploads).await?)
        };

        let result = self.places.update(id, changes, images.clone()).await;
        let fresh = images.as_deref().unwrap_or_default();

        match result {
            Ok(Some(place)) => {
                tracing::debug!(
                    place_id = %id,
                    images_replaced = images.is_some(),
                    "Updated place"
                );
                Ok(place)
            }
            Ok(None) => {
                // Removed by a concurrent delete while we were uploading
                self.discard(fresh).await;
                Err(PlaceError::NotFound(id.to_string()))
            }
            Err(e) => {
                self.discard(fresh).await;
                Err(e.into())
            }
        }
    }

    /// Delete all of the place's images, then the record itself.
    pub async fn delete(&self, id: &str) -> Result<(), PlaceError> {
        let place = self
            .places
            .find(id)
            .await?
            .ok_or_else(|| PlaceError::NotFound(id.to_string()))?;

        self.delete_all(&place.images).await?;

        if !self.places.remove(id).await? {
            tracing::debug!(place_id = %id, "Place already removed");
        }

        tracing::debug!(place_id = %id, images = place.images.len(), "Deleted place");
        Ok(())
    }

    async fn upload_all(&self, uploads: Vec<ImageUpload>) -> Result<Vec<ImageHandle>, PlaceError> {
        let results = join_all(uploads.into_iter().map(|image| self.media.upload(image))).await;

        let mut handles = Vec::with_capacity(results.len());
        let mut first_error = None;
        let mut failed = 0usize;
        for result in results {
            match result {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            None => Ok(handles),
            Some(e) => {
                tracing::warn!(
                    failed,
                    succeeded = handles.len(),
                    error = %e,
                    "Image upload failed, discarding the uploads that succeeded"
                );
                self.discard(&handles).await;
                Err(PlaceError::UploadFailed(e))
            }
        }
    }

    async fn delete_all(&self, images: &[ImageHandle]) -> Result<(), PlaceError> {
        let results = join_all(images.iter().map(|img| self.media.delete(&img.public_id))).await;

        let total = results.len();
        let mut errors = results.into_iter().filter_map(Result::err);
        match errors.next() {
            None => Ok(()),
            Some(source) => {
                let failed = 1 + errors.count();
                tracing::warn!(failed, total, error = %source, "Image delete failed");
                Err(PlaceError::DeleteFailed {
                    failed,
                    total,
                    source,
                })
            }
        }
    }

    /// Best-effort removal of images nothing references.
    async fn discard(&self, images: &[ImageHandle]) {
        let results = join_all(images.iter().map(|img| self.media.delete(&img.public_id))).await;

        for (image, result) in images.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(
                    public_id = %image.public_id,
                    error = %e,
                    "Failed to discard orphaned image"
                );
            }
        }
    }
}
