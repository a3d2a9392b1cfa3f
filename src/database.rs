// src/database.rs
//! Boat persistence.
//!
//! Every backend exposes the same collection semantics: natural (insertion)
//! order for listing, and first-match-in-order when a request addresses
//! records by their custom `id`.

mod memory;
mod models;
mod mongo;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::StoreBackend,
    errors::BoatsApiError,
    models::{Boat, BoatKey, BoatPatch, NewBoat},
};

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use postgres::PostgresStore;

/// A collection of boat records
#[async_trait]
pub trait BoatStore: Send + Sync {
    /// All records in storage order
    async fn list(&self) -> Result<Vec<Boat>, BoatsApiError>;

    async fn get(&self, key: &BoatKey) -> Result<Option<Boat>, BoatsApiError>;

    /// Persist a new record, returning it with its assigned record id
    async fn insert(&self, boat: NewBoat) -> Result<Boat, BoatsApiError>;

    /// Apply `patch` to the first record matching `key` and return the result
    async fn update(&self, key: &BoatKey, patch: &BoatPatch)
        -> Result<Option<Boat>, BoatsApiError>;

    /// Remove the first record matching `key`, returning what was removed
    async fn delete(&self, key: &BoatKey) -> Result<Option<Boat>, BoatsApiError>;
}

/// Open the configured store
pub async fn connect(backend: &StoreBackend) -> Result<Arc<dyn BoatStore>, BoatsApiError> {
    match backend {
        StoreBackend::Mongo { uri, database } => {
            let store = MongoStore::from_uri(uri, database.as_deref()).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Postgres { url } => {
            let store = PostgresStore::from_url(url).await?;
            Ok(Arc::new(store))
        }
    }
}
