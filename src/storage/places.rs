use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{ImageHandle, Place, PlaceChanges};
use super::tables::*;

impl Database {
    // ========================================================================
    // Place operations
    // ========================================================================

    /// Store a place record, replacing any record with the same id
    pub fn put_place(&self, place: &Place) -> Result<(), DatabaseError> {
        debug_assert!(!place.id.is_empty(), "place id must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(PLACES)?;
            let data = rmp_serde::to_vec_named(place)?;
            table.insert(place.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a place by its UUID
    pub fn get_place(&self, id: &str) -> Result<Option<Place>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PLACES)?;

        match table.get(id)? {
            Some(data) => {
                let place: Place = rmp_serde::from_slice(data.value())?;
                Ok(Some(place))
            }
            None => Ok(None),
        }
    }

    /// Apply attribute changes and an optional image-set replacement in one transaction
    pub fn update_place(
        &self,
        id: &str,
        changes: &PlaceChanges,
        images: Option<&[ImageHandle]>,
    ) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(PLACES)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let place: Place = rmp_serde::from_slice(data.value())?;
                    Some(place)
                }
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut place) => {
                place.apply(changes, images);

                let serialized = rmp_serde::to_vec_named(&place)?;
                let mut table = write_txn.open_table(PLACES)?;
                table.insert(id, serialized.as_slice())?;
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a place by its UUID
    pub fn delete_place(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(PLACES)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// All places, oldest first
    pub fn list_places(&self) -> Result<Vec<Place>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PLACES)?;

        let mut places = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let place: Place = rmp_serde::from_slice(value.value())?;
            places.push(place);
        }

        places.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(places)
    }
}
