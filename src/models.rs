//! Data models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::errors::BoatsApiError;
use serde_helpers::*;

/// Store-assigned record identifier
///
/// Serialized as the 24 character hex form of a MongoDB ObjectId, whichever
/// backend holds the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(ObjectId);

impl RecordId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Get the raw ObjectId
    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for RecordId {
    fn from(value: ObjectId) -> Self {
        Self(value)
    }
}

impl TryFrom<&str> for RecordId {
    type Error = BoatsApiError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ObjectId::parse_str(value)
            .map(Self)
            .map_err(|_| BoatsApiError::InvalidRecordId(value.to_string()))
    }
}

impl FromStr for RecordId {
    type Err = BoatsApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Connection status of a boat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoatStatus {
    #[default]
    Online,
    Offline,
}

impl BoatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoatStatus::Online => "online",
            BoatStatus::Offline => "offline",
        }
    }
}

impl FromStr for BoatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(BoatStatus::Online),
            "offline" => Ok(BoatStatus::Offline),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for BoatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the optional numeric sensor readings carried by a boat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reading {
    Lat,
    Lon,
    Ph,
    Tds,
    Turbidity,
    Voltage,
    Current,
}

impl Reading {
    /// All readings, in schema order
    pub const ALL: [Reading; 7] = [
        Reading::Lat,
        Reading::Lon,
        Reading::Ph,
        Reading::Tds,
        Reading::Turbidity,
        Reading::Voltage,
        Reading::Current,
    ];

    /// Field name as it appears in JSON bodies and stored documents
    pub fn key(&self) -> &'static str {
        match self {
            Reading::Lat => "lat",
            Reading::Lon => "lon",
            Reading::Ph => "pH",
            Reading::Tds => "tds",
            Reading::Turbidity => "turbidity",
            Reading::Voltage => "voltage",
            Reading::Current => "current",
        }
    }
}

/// Position, water quality and power telemetry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Readings {
    /// Latitude in decimal degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Longitude in decimal degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(rename = "pH", default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    /// Total dissolved solids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turbidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
}

impl Readings {
    pub fn get(&self, reading: Reading) -> Option<f64> {
        match reading {
            Reading::Lat => self.lat,
            Reading::Lon => self.lon,
            Reading::Ph => self.ph,
            Reading::Tds => self.tds,
            Reading::Turbidity => self.turbidity,
            Reading::Voltage => self.voltage,
            Reading::Current => self.current,
        }
    }

    pub fn set(&mut self, reading: Reading, value: Option<f64>) {
        let slot = match reading {
            Reading::Lat => &mut self.lat,
            Reading::Lon => &mut self.lon,
            Reading::Ph => &mut self.ph,
            Reading::Tds => &mut self.tds,
            Reading::Turbidity => &mut self.turbidity,
            Reading::Voltage => &mut self.voltage,
            Reading::Current => &mut self.current,
        };
        *slot = value;
    }
}

/// A boat record as stored and returned by the API
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boat {
    /// Store-assigned identifier
    #[serde(rename = "_id")]
    #[serde_as(as = "DisplayFromStr")]
    pub record_id: RecordId,
    /// Application-assigned identifier, not necessarily unique
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub readings: Readings,
    pub status: BoatStatus,
    /// Time of the snapshot, defaults to record creation time
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: DateTime<Utc>,
}

impl Boat {
    /// Replace the fields present in `patch`, leaving the rest untouched
    pub fn apply(&mut self, patch: &BoatPatch) {
        if let Some(id) = &patch.id {
            self.id = Some(id.clone());
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        for (reading, value) in &patch.readings {
            self.readings.set(*reading, *value);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(timestamp) = patch.timestamp {
            self.timestamp = timestamp;
        }
    }
}

/// A validated create request with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct NewBoat {
    pub id: Option<String>,
    pub name: String,
    pub readings: Readings,
    pub status: BoatStatus,
    pub timestamp: DateTime<Utc>,
}

impl NewBoat {
    /// Minimal record: a name and everything else defaulted
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            readings: Readings::default(),
            status: BoatStatus::default(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach the store-assigned identifier
    pub fn into_boat(self, record_id: RecordId) -> Boat {
        Boat {
            record_id,
            id: self.id,
            name: self.name,
            readings: self.readings,
            status: self.status,
            timestamp: self.timestamp,
        }
    }
}

/// A validated update request
///
/// Only fields that were present in the request body are set. A reading
/// mapped to `None` is cleared.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoatPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub readings: Vec<(Reading, Option<f64>)>,
    pub status: Option<BoatStatus>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl BoatPatch {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.readings.is_empty()
            && self.status.is_none()
            && self.timestamp.is_none()
    }
}

/// How a request addresses a single boat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoatKey {
    /// First record, in storage order, whose `id` field matches
    CustomId(String),
    /// The record with this store-assigned identifier
    RecordId(RecordId),
}

impl BoatKey {
    /// Whether `boat` is addressed by this key
    pub fn matches(&self, boat: &Boat) -> bool {
        match self {
            BoatKey::CustomId(id) => boat.id.as_deref() == Some(id.as_str()),
            BoatKey::RecordId(record_id) => boat.record_id == *record_id,
        }
    }
}

/// Custom serializers
mod serde_helpers {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    /// RFC 3339 with exactly millisecond precision, whatever the store kept
    pub fn serialize_millis<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}
