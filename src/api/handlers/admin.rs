use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ClusterStatusResponse {
    pub cluster_info: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub places_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn cluster_status(
    State(state): State<Arc<AppState>>,
) -> Json<JSend<ClusterStatusResponse>> {
    let info = state.node.cluster_info().await;
    let peers: Vec<serde_json::Value> = info
        .peers
        .iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id,
                "address": p.address,
                "status": format!("{:?}", p.status),
                "sequence": p.sequence,
            })
        })
        .collect();

    JSend::success(ClusterStatusResponse {
        cluster_info: serde_json::json!({
            "node_id": info.node_id,
            "role": format!("{:?}", info.role),
            "term": info.term,
            "leader_id": info.leader_id,
            "peers": peers,
            "sequence": info.sequence,
        }),
    })
}

pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let stats = state
        .db
        .purge_all()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::warn!(places = stats.places, "Purged all places");

    Ok(JSend::success(PurgeResponse {
        places_deleted: stats.places,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{Place, PlaceAttributes, PlaceType};
    use crate::testutil::{test_state, MemoryPlaceRepository, RecordingMediaStore};

    #[tokio::test]
    async fn test_health_reports_version() {
        let Json(body) = health().await;
        assert_eq!(body.data.status, "ok");
        assert_eq!(body.data.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_purge_clears_places() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(
            &dir,
            Arc::new(RecordingMediaStore::new()),
            Arc::new(MemoryPlaceRepository::default()),
        );
        let attributes = PlaceAttributes {
            name: "Pousada".to_string(),
            place_type: PlaceType::Hotel,
            phone: "(88) 3333-3333".to_string(),
            latitude: -2.9,
            longitude: -40.1,
        };
        state
            .db
            .put_place(&Place::new("h1".to_string(), attributes, Vec::new()))
            .unwrap();

        let Json(body) = admin_purge(State(state.clone())).await.unwrap();

        assert_eq!(body.data.places_deleted, 1);
        assert!(state.db.list_places().unwrap().is_empty());
    }
}
