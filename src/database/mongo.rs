// src/database/mongo.rs
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    options::ReturnDocument,
    Client, Collection,
};
use tracing::{debug, error, info};

use super::{
    models::{to_bson_datetime, BoatDocument},
    BoatStore,
};
use crate::{
    errors::BoatsApiError,
    models::{Boat, BoatKey, BoatPatch, NewBoat},
};

const COLLECTION: &str = "boats";
const DEFAULT_DATABASE: &str = "test";

/// Boat store backed by a MongoDB collection
#[derive(Debug, Clone)]
pub struct MongoStore {
    collection: Collection<BoatDocument>,
}

impl MongoStore {
    /// Connect to MongoDB
    ///
    /// The database named in the URI is used, then `database`, then `test`.
    /// An unreachable server is logged but does not fail startup; requests
    /// fail until it becomes reachable.
    pub async fn from_uri(uri: &str, database: Option<&str>) -> Result<Self, BoatsApiError> {
        let client = Client::with_uri_str(uri).await?;
        let db = client
            .default_database()
            .unwrap_or_else(|| client.database(database.unwrap_or(DEFAULT_DATABASE)));

        info!("Using MongoDB database {}", db.name());
        match db.run_command(doc! { "ping": 1 }).await {
            Ok(_) => info!("MongoDB connected"),
            Err(e) => error!("MongoDB error: {}", e),
        }

        Ok(Self {
            collection: db.collection(COLLECTION),
        })
    }

    fn filter(key: &BoatKey) -> Document {
        match key {
            BoatKey::CustomId(id) => doc! { "id": id.as_str() },
            BoatKey::RecordId(record_id) => doc! { "_id": record_id.object_id() },
        }
    }

    /// Translate a patch into `$set` / `$unset` operators
    fn update_document(patch: &BoatPatch) -> Document {
        let mut set = Document::new();
        let mut unset = Document::new();

        if let Some(id) = &patch.id {
            set.insert("id", id.as_str());
        }
        if let Some(name) = &patch.name {
            set.insert("name", name.as_str());
        }
        for (reading, value) in &patch.readings {
            match value {
                Some(value) => set.insert(reading.key(), Bson::Double(*value)),
                None => unset.insert(reading.key(), ""),
            };
        }
        if let Some(status) = patch.status {
            set.insert("status", status.as_str());
        }
        if let Some(timestamp) = patch.timestamp {
            set.insert("timestamp", to_bson_datetime(timestamp));
        }

        let mut update = Document::new();
        if !set.is_empty() {
            update.insert("$set", set);
        }
        if !unset.is_empty() {
            update.insert("$unset", unset);
        }
        update
    }
}

#[async_trait]
impl BoatStore for MongoStore {
    async fn list(&self) -> Result<Vec<Boat>, BoatsApiError> {
        let cursor = self.collection.find(doc! {}).await?;
        let documents: Vec<BoatDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Boat::from).collect())
    }

    async fn get(&self, key: &BoatKey) -> Result<Option<Boat>, BoatsApiError> {
        let document = self.collection.find_one(Self::filter(key)).await?;
        Ok(document.map(Boat::from))
    }

    async fn insert(&self, boat: NewBoat) -> Result<Boat, BoatsApiError> {
        let document = BoatDocument::new(ObjectId::new(), boat);
        self.collection.insert_one(&document).await?;
        debug!("Inserted boat {}", document.oid);
        Ok(Boat::from(document))
    }

    async fn update(
        &self,
        key: &BoatKey,
        patch: &BoatPatch,
    ) -> Result<Option<Boat>, BoatsApiError> {
        // An empty update document is rejected by the server
        if patch.is_empty() {
            return self.get(key).await;
        }

        let document = self
            .collection
            .find_one_and_update(Self::filter(key), Self::update_document(patch))
            .return_document(ReturnDocument::After)
            .await?;
        Ok(document.map(Boat::from))
    }

    async fn delete(&self, key: &BoatKey) -> Result<Option<Boat>, BoatsApiError> {
        let document = self.collection.find_one_and_delete(Self::filter(key)).await?;
        Ok(document.map(Boat::from))
    }
}
