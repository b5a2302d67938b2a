//! Place state machine for muster cluster replication.

use serde::{Deserialize, Serialize};

use crate::storage::models::{Place, WriteOp};
use crate::storage::Database;

/// The places state machine, replicated by muster.
pub struct PlaceStateMachine {
    db: Database,
}

impl PlaceStateMachine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Full state snapshot for syncing lagging followers.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceSnapshot {
    pub places: Vec<Place>,
}

impl muster::StateMachine for PlaceStateMachine {
    type WriteOp = WriteOp;
    type Snapshot = PlaceSnapshot;

    fn apply(&self, op: &WriteOp) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match op {
            WriteOp::CreatePlace(place) => {
                self.db.put_place(place)?;
            }
            WriteOp::DeletePlace { id } => {
                self.db.delete_place(id)?;
            }
            WriteOp::UpdatePlace {
                id,
                changes,
                images,
            } => {
                self.db.update_place(id, changes, images.as_deref())?;
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<PlaceSnapshot, Box<dyn std::error::Error + Send + Sync>> {
        let places = self.db.list_places()?;
        Ok(PlaceSnapshot { places })
    }

    fn restore(
        &self,
        snapshot: PlaceSnapshot,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.db.purge_all()?;
        for place in &snapshot.places {
            self.db.put_place(place)?;
        }
        Ok(())
    }
}
