// src/database/postgres.rs
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

use super::{models::BoatRow, BoatStore};
use crate::{
    errors::BoatsApiError,
    models::{Boat, BoatKey, BoatPatch, NewBoat, RecordId},
};

const COLUMNS: &str = r#"oid, id, name, lat, lon, ph, tds, turbidity, voltage, "current", status, "timestamp""#;

/// Boat store backed by a PostgreSQL table
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn from_url(url: &str) -> Result<Self, BoatsApiError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        info!("Connected to PostgreSQL");

        Self::new(pool).await
    }

    /// Wrap an existing pool, running pending migrations
    pub async fn new(pool: PgPool) -> Result<Self, BoatsApiError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// SQL condition selecting `key`, with the value to bind as `$1`
    fn condition(key: &BoatKey) -> (&'static str, String) {
        match key {
            BoatKey::CustomId(id) => ("id = $1", id.clone()),
            BoatKey::RecordId(record_id) => ("oid = $1", record_id.to_string()),
        }
    }
}

#[async_trait]
impl BoatStore for PostgresStore {
    async fn list(&self) -> Result<Vec<Boat>, BoatsApiError> {
        let rows = sqlx::query_as::<_, BoatRow>(&format!(
            "SELECT {} FROM boats ORDER BY seq",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Boat::try_from).collect()
    }

    async fn get(&self, key: &BoatKey) -> Result<Option<Boat>, BoatsApiError> {
        let (condition, value) = Self::condition(key);
        let row = sqlx::query_as::<_, BoatRow>(&format!(
            "SELECT {} FROM boats WHERE {} ORDER BY seq LIMIT 1",
            COLUMNS, condition
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Boat::try_from).transpose()
    }

    async fn insert(&self, boat: NewBoat) -> Result<Boat, BoatsApiError> {
        let record_id = RecordId::new();
        let row = sqlx::query_as::<_, BoatRow>(&format!(
            r#"INSERT INTO boats (
                oid, id, name, lat, lon, ph, tds,
                turbidity, voltage, "current", status, "timestamp"
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}"#,
            COLUMNS
        ))
        .bind(record_id.to_string())
        .bind(&boat.id)
        .bind(&boat.name)
        .bind(boat.readings.lat)
        .bind(boat.readings.lon)
        .bind(boat.readings.ph)
        .bind(boat.readings.tds)
        .bind(boat.readings.turbidity)
        .bind(boat.readings.voltage)
        .bind(boat.readings.current)
        .bind(boat.status.as_str())
        .bind(boat.timestamp)
        .fetch_one(&self.pool)
        .await?;

        debug!("Inserted boat {}", record_id);
        Boat::try_from(row)
    }

    async fn update(
        &self,
        key: &BoatKey,
        patch: &BoatPatch,
    ) -> Result<Option<Boat>, BoatsApiError> {
        let (condition, value) = Self::condition(key);
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, BoatRow>(&format!(
            "SELECT {} FROM boats WHERE {} ORDER BY seq LIMIT 1 FOR UPDATE",
            COLUMNS, condition
        ))
        .bind(value)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut boat = Boat::try_from(row)?;
        boat.apply(patch);

        let row = sqlx::query_as::<_, BoatRow>(&format!(
            r#"UPDATE boats SET
                id = $2, name = $3, lat = $4, lon = $5, ph = $6, tds = $7,
                turbidity = $8, voltage = $9, "current" = $10, status = $11, "timestamp" = $12
            WHERE oid = $1
            RETURNING {}"#,
            COLUMNS
        ))
        .bind(boat.record_id.to_string())
        .bind(&boat.id)
        .bind(&boat.name)
        .bind(boat.readings.lat)
        .bind(boat.readings.lon)
        .bind(boat.readings.ph)
        .bind(boat.readings.tds)
        .bind(boat.readings.turbidity)
        .bind(boat.readings.voltage)
        .bind(boat.readings.current)
        .bind(boat.status.as_str())
        .bind(boat.timestamp)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Boat::try_from(row).map(Some)
    }

    async fn delete(&self, key: &BoatKey) -> Result<Option<Boat>, BoatsApiError> {
        let (condition, value) = Self::condition(key);
        let row = sqlx::query_as::<_, BoatRow>(&format!(
            "DELETE FROM boats WHERE oid = (
                SELECT oid FROM boats WHERE {} ORDER BY seq LIMIT 1
            ) RETURNING {}",
            condition, COLUMNS
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Boat::try_from).transpose()
    }
}
