//! places-api - REST API for places of interest and their images
//!
//! This crate provides place CRUD with image handling:
//! - Swappable media hosts for images (local filesystem, Cloudinary)
//! - Place records replicated via muster (Raft-like clustering)
//! - redb embedded database for place records (ACID, MVCC, crash-safe)
//! - REST API with multipart upload support

pub mod api;
pub mod config;
pub mod media;
pub mod places;
pub mod state_machine;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use places::PlaceService;
use state_machine::PlaceStateMachine;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub node: Arc<muster::RedbNode<PlaceStateMachine>>,
    pub places: PlaceService,
}
