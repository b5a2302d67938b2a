use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::state_machine::PlaceStateMachine;
use crate::storage::models::{ImageHandle, Place, PlaceChanges, WriteOp};
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Replication error: {0}")]
    Replication(#[from] muster::MusterError),
}

/// Persistence seen by the place workflows.
///
/// Lookups return `Ok(None)` for a missing place; absence is not an error here.
#[async_trait]
pub trait PlaceRepository: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<Place>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Place>, RepositoryError>;
    async fn insert(&self, place: Place) -> Result<Place, RepositoryError>;
    /// `images: Some(..)` replaces the stored image set wholesale.
    async fn update(
        &self,
        id: &str,
        changes: PlaceChanges,
        images: Option<Vec<ImageHandle>>,
    ) -> Result<Option<Place>, RepositoryError>;
    async fn remove(&self, id: &str) -> Result<bool, RepositoryError>;
}

/// Reads from the local redb copy, writes through the muster log.
pub struct ReplicatedPlaceRepository {
    db: Database,
    node: Arc<muster::RedbNode<PlaceStateMachine>>,
}

impl ReplicatedPlaceRepository {
    pub fn new(db: Database, node: Arc<muster::RedbNode<PlaceStateMachine>>) -> Self {
        Self { db, node }
    }
}

#[async_trait]
impl PlaceRepository for ReplicatedPlaceRepository {
    async fn find(&self, id: &str) -> Result<Option<Place>, RepositoryError> {
        Ok(self.db.get_place(id)?)
    }

    async fn list(&self) -> Result<Vec<Place>, RepositoryError> {
        Ok(self.db.list_places()?)
    }

    async fn insert(&self, place: Place) -> Result<Place, RepositoryError> {
        self.node
            .replicate(WriteOp::CreatePlace(place.clone()))
            .await?;
        Ok(place)
    }

    async fn update(
        &self,
        id: &str,
        changes: PlaceChanges,
        images: Option<Vec<ImageHandle>>,
    ) -> Result<Option<Place>, RepositoryError> {
        let operation = WriteOp::UpdatePlace {
            id: id.to_string(),
            changes,
            images,
        };
        self.node.replicate(operation).await?;

        Ok(self.db.get_place(id)?)
    }

    async fn remove(&self, id: &str) -> Result<bool, RepositoryError> {
        if self.db.get_place(id)?.is_none() {
            return Ok(false);
        }

        self.node
            .replicate(WriteOp::DeletePlace { id: id.to_string() })
            .await?;
        Ok(true)
    }
}
