// src/database/memory.rs
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::BoatStore;
use crate::{
    errors::BoatsApiError,
    models::{Boat, BoatKey, BoatPatch, NewBoat, RecordId},
};

/// Process-local boat store
///
/// Records live only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    boats: RwLock<Vec<Boat>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoatStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Boat>, BoatsApiError> {
        Ok(self.boats.read().await.clone())
    }

    async fn get(&self, key: &BoatKey) -> Result<Option<Boat>, BoatsApiError> {
        let boats = self.boats.read().await;
        Ok(boats.iter().find(|boat| key.matches(boat)).cloned())
    }

    async fn insert(&self, boat: NewBoat) -> Result<Boat, BoatsApiError> {
        let boat = boat.into_boat(RecordId::new());
        debug!("Inserting boat {} into memory store", boat.record_id);
        self.boats.write().await.push(boat.clone());
        Ok(boat)
    }

    async fn update(
        &self,
        key: &BoatKey,
        patch: &BoatPatch,
    ) -> Result<Option<Boat>, BoatsApiError> {
        let mut boats = self.boats.write().await;
        Ok(boats.iter_mut().find(|boat| key.matches(boat)).map(|boat| {
            boat.apply(patch);
            boat.clone()
        }))
    }

    async fn delete(&self, key: &BoatKey) -> Result<Option<Boat>, BoatsApiError> {
        let mut boats = self.boats.write().await;
        Ok(boats
            .iter()
            .position(|boat| key.matches(boat))
            .map(|index| boats.remove(index)))
    }
}
