mod admin;
mod places;

use crate::api::response::ApiError;
use crate::places::{PlaceError, RepositoryError};

pub use admin::{admin_purge, cluster_status, health};
pub use places::{
    create_place, delete_place, get_place, list_places, list_places_paginated, update_place,
};

/// Map a MusterError to an ApiError
fn replication_error(e: muster::MusterError) -> ApiError {
    match e {
        muster::MusterError::NotLeader { .. } => {
            ApiError::unavailable("No leader available, retry shortly")
        }
        muster::MusterError::NoQuorum => {
            ApiError::unavailable("Failed to reach quorum for replication")
        }
        _ => ApiError::internal(e.to_string()),
    }
}

/// Map a workflow error to an ApiError. Media failures carry no partial-state detail.
fn place_error(e: PlaceError) -> ApiError {
    match e {
        PlaceError::NotFound(_) => ApiError::not_found("Place not found"),
        PlaceError::UploadFailed(_) => {
            tracing::error!(error = %e, "Image upload failed");
            ApiError::bad_gateway("Failed to upload images")
        }
        PlaceError::DeleteFailed { .. } => {
            tracing::error!(error = %e, "Image delete failed");
            ApiError::bad_gateway("Failed to delete images")
        }
        PlaceError::Repository(RepositoryError::Replication(e)) => replication_error(e),
        PlaceError::Repository(RepositoryError::Database(e)) => ApiError::internal(e.to_string()),
    }
}
