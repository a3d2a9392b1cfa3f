// src/database/models.rs
use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::{
    errors::BoatsApiError,
    models::{Boat, BoatStatus, NewBoat, RecordId, Readings},
};

/// Row of the `boats` table
#[derive(Debug, sqlx::FromRow)]
pub(super) struct BoatRow {
    pub oid: String,
    pub id: Option<String>,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub ph: Option<f64>,
    pub tds: Option<f64>,
    pub turbidity: Option<f64>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<BoatRow> for Boat {
    type Error = BoatsApiError;

    fn try_from(row: BoatRow) -> Result<Self, Self::Error> {
        let record_id = RecordId::try_from(row.oid.as_str())
            .map_err(|_| BoatsApiError::InvalidStoredRecord(format!("oid {}", row.oid)))?;
        let status = row
            .status
            .parse::<BoatStatus>()
            .map_err(|s| BoatsApiError::InvalidStoredRecord(format!("status {}", s)))?;

        Ok(Boat {
            record_id,
            id: row.id,
            name: row.name,
            readings: Readings {
                lat: row.lat,
                lon: row.lon,
                ph: row.ph,
                tds: row.tds,
                turbidity: row.turbidity,
                voltage: row.voltage,
                current: row.current,
            },
            status,
            timestamp: row.timestamp,
        })
    }
}

/// Document of the `boats` collection
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct BoatDocument {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(rename = "pH", default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turbidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default)]
    pub status: BoatStatus,
    pub timestamp: bson::DateTime,
}

impl BoatDocument {
    pub fn new(oid: ObjectId, boat: NewBoat) -> Self {
        Self {
            oid,
            id: boat.id,
            name: boat.name,
            lat: boat.readings.lat,
            lon: boat.readings.lon,
            ph: boat.readings.ph,
            tds: boat.readings.tds,
            turbidity: boat.readings.turbidity,
            voltage: boat.readings.voltage,
            current: boat.readings.current,
            status: boat.status,
            timestamp: to_bson_datetime(boat.timestamp),
        }
    }
}

impl From<BoatDocument> for Boat {
    fn from(document: BoatDocument) -> Self {
        Boat {
            record_id: RecordId::from(document.oid),
            id: document.id,
            name: document.name,
            readings: Readings {
                lat: document.lat,
                lon: document.lon,
                ph: document.ph,
                tds: document.tds,
                turbidity: document.turbidity,
                voltage: document.voltage,
                current: document.current,
            },
            status: document.status,
            timestamp: DateTime::from_timestamp_millis(document.timestamp.timestamp_millis())
                .unwrap_or_default(),
        }
    }
}

pub(super) fn to_bson_datetime(timestamp: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(timestamp.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn document_roundtrip_keeps_millisecond_precision() {
        let timestamp = Utc.timestamp_millis_opt(1714564800123).unwrap();
        let oid = ObjectId::new();
        let mut boat = NewBoat::new("Alpha").with_id("b1");
        boat.timestamp = timestamp;
        boat.readings.ph = Some(7.1);

        let document = BoatDocument::new(oid, boat);
        let bson_doc = bson::to_document(&document).unwrap();
        assert_eq!(bson_doc.get_object_id("_id").unwrap(), oid);
        assert_eq!(bson_doc.get_f64("pH").unwrap(), 7.1);
        assert!(!bson_doc.contains_key("lat"));
        assert_eq!(bson_doc.get_str("status").unwrap(), "online");

        let decoded: BoatDocument = bson::from_document(bson_doc).unwrap();
        let boat = Boat::from(decoded);
        assert_eq!(boat.record_id.object_id(), oid);
        assert_eq!(boat.timestamp, timestamp);
        assert_eq!(boat.readings.ph, Some(7.1));
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        let row = BoatRow {
            oid: ObjectId::new().to_hex(),
            id: None,
            name: "Alpha".to_string(),
            lat: None,
            lon: None,
            ph: None,
            tds: None,
            turbidity: None,
            voltage: None,
            current: None,
            status: "sunk".to_string(),
            timestamp: Utc::now(),
        };

        assert!(matches!(
            Boat::try_from(row),
            Err(BoatsApiError::InvalidStoredRecord(_))
        ));
    }
}
