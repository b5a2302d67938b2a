//! Shared test helpers: an app state on temp dirs and in-memory collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{ClusterConfig, Config, MediaConfig, NodeConfig};
use crate::media::{ImageUpload, MediaError, MediaStore};
use crate::places::{PlaceRepository, PlaceService, RepositoryError};
use crate::state_machine::PlaceStateMachine;
use crate::storage::models::{ImageHandle, Place, PlaceChanges};
use crate::storage::{Database, DatabaseError};
use crate::AppState;

/// Create a test AppState with a temporary database and the given collaborators.
pub fn test_state(
    temp_dir: &tempfile::TempDir,
    media: Arc<dyn MediaStore>,
    repo: Arc<dyn PlaceRepository>,
) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");

    let config = Config {
        node: NodeConfig {
            id: uuid::Uuid::new_v4().to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        cluster: ClusterConfig::default(),
        media: MediaConfig {
            local_media_path: temp_dir.path().join("media").to_string_lossy().to_string(),
            ..Default::default()
        },
        cors_origin: "*".to_string(),
        test_mode: true,
        max_upload_size: 1024, // 1KB for tests
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");

    let muster_storage =
        muster::RedbStorage::new(db.inner()).expect("Failed to create muster storage");
    let state_machine = PlaceStateMachine::new(db.clone());
    let muster_config = muster::Config {
        node_id: config.node.id.clone(),
        cluster_port: 0,
        heartbeat_interval_ms: 300,
        election_timeout_ms: 3000,
        discovery: muster::DiscoveryConfig {
            dns_name: None,
            peers: vec![],
            poll_interval_secs: 5,
        },
    };
    let node = muster::MusterNode::new(muster_config, muster_storage, state_machine)
        .expect("Failed to create muster node");

    Arc::new(AppState {
        config,
        db,
        node: Arc::clone(&node),
        places: PlaceService::new(media, repo),
    })
}

// ============================================================================
// Media store fake
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCall {
    /// Upload of a blob, recorded by its UTF-8 content
    Upload(String),
    Delete(String),
}

#[derive(Default)]
struct MediaState {
    calls: Vec<MediaCall>,
    delays_ms: HashMap<String, u64>,
    failing_uploads: HashSet<String>,
    failing_deletes: HashSet<String>,
}

/// Media store that records every call. An upload of blob `x` yields
/// `{url: "https://media.test/x", public_id: "pub_x"}`.
#[derive(Default)]
pub struct RecordingMediaStore {
    state: Mutex<MediaState>,
}

impl RecordingMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay the upload of the blob with this content.
    pub fn set_delay(&self, content: &str, millis: u64) {
        self.lock().delays_ms.insert(content.to_string(), millis);
    }

    pub fn fail_upload(&self, content: &str) {
        self.lock().failing_uploads.insert(content.to_string());
    }

    pub fn fail_delete(&self, public_id: &str) {
        self.lock().failing_deletes.insert(public_id.to_string());
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        self.lock().calls.clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MediaCall::Upload(content) => Some(content),
                MediaCall::Delete(_) => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MediaCall::Delete(public_id) => Some(public_id),
                MediaCall::Upload(_) => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MediaState> {
        self.state.lock().expect("media state poisoned")
    }
}

#[async_trait]
impl MediaStore for RecordingMediaStore {
    async fn upload(&self, image: ImageUpload) -> Result<ImageHandle, MediaError> {
        let content = String::from_utf8_lossy(&image.data).to_string();
        let (delay, fails) = {
            let mut state = self.lock();
            state.calls.push(MediaCall::Upload(content.clone()));
            (
                state.delays_ms.get(&content).copied(),
                state.failing_uploads.contains(&content),
            )
        };

        if let Some(millis) = delay {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        if fails {
            return Err(MediaError::Backend(format!("upload of {content} rejected")));
        }

        Ok(ImageHandle {
            url: format!("https://media.test/{content}"),
            public_id: format!("pub_{content}"),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let mut state = self.lock();
        state.calls.push(MediaCall::Delete(public_id.to_string()));
        if state.failing_deletes.contains(public_id) {
            return Err(MediaError::Backend(format!("delete of {public_id} rejected")));
        }
        Ok(())
    }
}

// ============================================================================
// Place repository fake
// ============================================================================

#[derive(Default)]
pub struct MemoryPlaceRepository {
    places: Mutex<HashMap<String, Place>>,
    fail_writes: AtomicBool,
}

impl MemoryPlaceRepository {
    /// Make every subsequent write fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            let io = std::io::Error::other("writes disabled");
            return Err(RepositoryError::Database(DatabaseError::Io(io)));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Place>> {
        self.places.lock().expect("place map poisoned")
    }
}

#[async_trait]
impl PlaceRepository for MemoryPlaceRepository {
    async fn find(&self, id: &str) -> Result<Option<Place>, RepositoryError> {
        Ok(self.lock().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Place>, RepositoryError> {
        let mut places: Vec<Place> = self.lock().values().cloned().collect();
        places.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(places)
    }

    async fn insert(&self, place: Place) -> Result<Place, RepositoryError> {
        self.check_writable()?;
        self.lock().insert(place.id.clone(), place.clone());
        Ok(place)
    }

    async fn update(
        &self,
        id: &str,
        changes: PlaceChanges,
        images: Option<Vec<ImageHandle>>,
    ) -> Result<Option<Place>, RepositoryError> {
        self.check_writable()?;
        let mut places = self.lock();
        Ok(places.get_mut(id).map(|place| {
            place.apply(&changes, images.as_deref());
            place.clone()
        }))
    }

    async fn remove(&self, id: &str) -> Result<bool, RepositoryError> {
        self.check_writable()?;
        Ok(self.lock().remove(id).is_some())
    }
}
