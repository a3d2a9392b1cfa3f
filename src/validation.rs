//! Casting and validation of boat request bodies.
//!
//! Bodies arrive as untyped JSON. Every known field is cast to its schema
//! type, required fields are checked, and all failures are collected into a
//! single [`ValidationError`] so the client sees every problem at once.
//! Unknown keys are ignored.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{BoatPatch, BoatStatus, NewBoat, Reading, Readings};

/// Which operation a body is validated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Create,
    Update,
}

/// Why a field failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// The value could not be converted to the field's type
    Cast,
    Required,
    /// The value is outside an enumeration
    Enum,
    /// The body is not a JSON object
    Body,
}

/// A single failing field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub path: String,
    pub kind: FieldErrorKind,
    pub message: String,
}

/// All field failures of one request body
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    operation: Operation,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    fn not_an_object(operation: Operation) -> Self {
        Self {
            operation,
            errors: vec![FieldError {
                path: "body".to_string(),
                kind: FieldErrorKind::Body,
                message: "Request body must be a JSON object".to_string(),
            }],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Operation::Create => f.write_str("Boat validation failed: ")?,
            Operation::Update => {
                // Updates stop at the first value that cannot be cast
                let cast = self
                    .errors
                    .iter()
                    .find(|error| error.kind == FieldErrorKind::Cast);
                if let Some(error) = cast {
                    return write!(f, "{} for model \"Boat\"", error.message);
                }
                f.write_str("Validation failed: ")?
            }
        }
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", error.path, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validate a create body, applying schema defaults
///
/// `require_custom_id` makes the application `id` field mandatory.
pub fn new_boat_from_json(
    body: &Value,
    require_custom_id: bool,
) -> Result<NewBoat, ValidationError> {
    let fields = body
        .as_object()
        .ok_or_else(|| ValidationError::not_an_object(Operation::Create))?;
    let mut cast = Caster::new(fields);

    let id = if require_custom_id {
        cast.required_string("id")
    } else {
        cast.string("id").flatten()
    };
    let name = cast.required_string("name");
    let mut readings = Readings::default();
    for reading in Reading::ALL {
        if let Some(value) = cast.number(reading.key()) {
            readings.set(reading, value);
        }
    }
    let status = cast.status().flatten().unwrap_or_default();
    let timestamp = cast.timestamp().flatten().unwrap_or_else(Utc::now);

    cast.finish(Operation::Create)?;
    Ok(NewBoat {
        id,
        // Only absent when an error was recorded above
        name: name.unwrap_or_default(),
        readings,
        status,
        timestamp,
    })
}

/// Validate an update body
///
/// Fields are optional, but a present `id` or `name` must not be empty.
pub fn patch_from_json(body: &Value) -> Result<BoatPatch, ValidationError> {
    let fields = body
        .as_object()
        .ok_or_else(|| ValidationError::not_an_object(Operation::Update))?;
    let mut cast = Caster::new(fields);

    let id = fields
        .contains_key("id")
        .then(|| cast.required_string("id"))
        .flatten();
    let name = fields
        .contains_key("name")
        .then(|| cast.required_string("name"))
        .flatten();
    let readings = Reading::ALL
        .into_iter()
        .filter_map(|reading| cast.number(reading.key()).map(|value| (reading, value)))
        .collect();
    let status = cast.status().flatten();
    let timestamp = cast.timestamp().flatten();

    cast.finish(Operation::Update)?;
    Ok(BoatPatch {
        id,
        name,
        readings,
        status,
        timestamp,
    })
}

/// Field-by-field caster over a JSON object
///
/// Getters return `None` when the key is absent and `Some(None)` when it is
/// present but null (or empty, for numbers). Failures are recorded and
/// reported by [`Caster::finish`].
struct Caster<'a> {
    fields: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Caster<'a> {
    fn new(fields: &'a Map<String, Value>) -> Self {
        Self {
            fields,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, path: &str, kind: FieldErrorKind, message: String) {
        self.errors.push(FieldError {
            path: path.to_string(),
            kind,
            message,
        });
    }

    fn cast_failed(&mut self, path: &str, kind: &str, value: &Value) {
        self.fail(
            path,
            FieldErrorKind::Cast,
            format!(
                "Cast to {} failed for value {} (type {}) at path \"{}\"",
                kind,
                value,
                type_name(value),
                path
            ),
        );
    }

    fn string(&mut self, path: &str) -> Option<Option<String>> {
        let value = self.fields.get(path)?;
        match value {
            Value::Null => Some(None),
            Value::String(s) => Some(Some(s.clone())),
            Value::Number(n) => Some(Some(n.to_string())),
            Value::Bool(b) => Some(Some(b.to_string())),
            Value::Array(_) | Value::Object(_) => {
                self.cast_failed(path, "string", value);
                None
            }
        }
    }

    fn required_string(&mut self, path: &str) -> Option<String> {
        let before = self.errors.len();
        match self.string(path) {
            Some(Some(s)) if !s.is_empty() => Some(s),
            _ => {
                // A cast failure already explains the problem
                if self.errors.len() == before {
                    self.fail(
                        path,
                        FieldErrorKind::Required,
                        format!("Path `{}` is required.", path),
                    );
                }
                None
            }
        }
    }

    fn number(&mut self, path: &str) -> Option<Option<f64>> {
        let value = self.fields.get(path)?;
        let cast = match value {
            Value::Null => Some(None),
            Value::Number(n) => n.as_f64().map(Some),
            Value::Bool(b) => Some(Some(if *b { 1.0 } else { 0.0 })),
            Value::String(s) if s.trim().is_empty() => Some(None),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()).map(Some),
            Value::Array(_) | Value::Object(_) => None,
        };
        if cast.is_none() {
            self.cast_failed(path, "Number", value);
        }
        cast
    }

    fn status(&mut self) -> Option<Option<BoatStatus>> {
        let value = self.fields.get("status")?;
        match value {
            Value::Null => Some(None),
            Value::String(s) => match s.parse::<BoatStatus>() {
                Ok(status) => Some(Some(status)),
                Err(other) => {
                    self.fail(
                        "status",
                        FieldErrorKind::Enum,
                        format!("`{}` is not a valid enum value for path `status`.", other),
                    );
                    None
                }
            },
            other => {
                self.cast_failed("status", "string", other);
                None
            }
        }
    }

    fn timestamp(&mut self) -> Option<Option<DateTime<Utc>>> {
        let value = self.fields.get("timestamp")?;
        let cast = match value {
            Value::Null => Some(None),
            Value::String(s) => parse_date(s).map(Some),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .map(Some),
            _ => None,
        };
        if cast.is_none() {
            self.cast_failed("timestamp", "date", value);
        }
        cast
    }

    fn finish(self, operation: Operation) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                operation,
                errors: self.errors,
            })
        }
    }
}

/// Parse the string forms accepted for dates
///
/// RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` and `YYYY-MM-DD` without an offset
/// (read as UTC), or epoch milliseconds.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    s.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn create_applies_defaults() {
        let before = Utc::now();
        let boat = new_boat_from_json(
            &json!({"id": "b1", "name": "Alpha", "lat": 1.0, "lon": 2.0}),
            true,
        )
        .unwrap();

        assert_eq!(boat.id.as_deref(), Some("b1"));
        assert_eq!(boat.name, "Alpha");
        assert_eq!(boat.readings.lat, Some(1.0));
        assert_eq!(boat.readings.lon, Some(2.0));
        assert_eq!(boat.readings.ph, None);
        assert_eq!(boat.status, BoatStatus::Online);
        assert!(boat.timestamp >= before);
    }

    #[test]
    fn create_requires_name_and_id() {
        let err = new_boat_from_json(&json!({"lat": 1.0}), true).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Boat validation failed: id: Path `id` is required., name: Path `name` is required."
        );
    }

    #[test]
    fn create_without_custom_id() {
        let boat = new_boat_from_json(&json!({"name": "Alpha"}), false).unwrap();
        assert_eq!(boat.id, None);

        let err = new_boat_from_json(&json!({"id": "b1"}), false).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].path, "name");
    }

    #[test]
    fn create_rejects_empty_name() {
        let err = new_boat_from_json(&json!({"id": "b1", "name": ""}), true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Boat validation failed: name: Path `name` is required."
        );
    }

    #[test]
    fn casts_loose_values() {
        let boat = new_boat_from_json(
            &json!({
                "id": 7,
                "name": "Alpha",
                "pH": "7.25",
                "tds": " 310 ",
                "voltage": "",
                "current": null,
                "timestamp": 1714564800000i64
            }),
            true,
        )
        .unwrap();

        assert_eq!(boat.id.as_deref(), Some("7"));
        assert_eq!(boat.readings.ph, Some(7.25));
        assert_eq!(boat.readings.tds, Some(310.0));
        assert_eq!(boat.readings.voltage, None);
        assert_eq!(boat.readings.current, None);
        assert_eq!(
            boat.timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_mistyped_fields() {
        let err = new_boat_from_json(
            &json!({
                "id": "b1",
                "name": {"first": "Alpha"},
                "lat": "north",
                "status": "sunk",
                "timestamp": "yesterday"
            }),
            true,
        )
        .unwrap_err();

        let paths: Vec<_> = err.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "lat", "status", "timestamp"]);
        assert_eq!(
            err.errors[1].message,
            "Cast to Number failed for value \"north\" (type string) at path \"lat\""
        );
        assert_eq!(
            err.errors[2].message,
            "`sunk` is not a valid enum value for path `status`."
        );
    }

    #[test]
    fn rejects_non_object_body() {
        assert!(new_boat_from_json(&json!([1, 2]), true).is_err());
        assert!(patch_from_json(&json!("lat")).is_err());
    }

    #[test]
    fn patch_contains_only_present_fields() {
        let patch = patch_from_json(&json!({"lat": 3.0, "turbidity": null, "unknown": 1})).unwrap();

        assert_eq!(
            patch,
            BoatPatch {
                readings: vec![(Reading::Lat, Some(3.0)), (Reading::Turbidity, None)],
                ..Default::default()
            }
        );
    }

    #[test]
    fn patch_cannot_clear_required_fields() {
        let err = patch_from_json(&json!({"name": null})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: name: Path `name` is required."
        );
    }

    #[test]
    fn patch_status_and_timestamp() {
        let patch = patch_from_json(&json!({
            "status": "offline",
            "timestamp": "2024-05-01T14:00:00+02:00"
        }))
        .unwrap();

        assert_eq!(patch.status, Some(BoatStatus::Offline));
        assert_eq!(
            patch.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn accepts_date_forms() {
        let cases = [
            ("2024-05-01", Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
            (
                "2024-05-01T12:00:00",
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            ),
            (
                "2024-05-01T12:00:00.250",
                Utc.timestamp_millis_opt(1714564800250).unwrap(),
            ),
            (
                " 1714564800000 ",
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            ),
            (
                "2024-05-01T12:00:00Z",
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            ),
        ];

        for (input, expected) in cases {
            let boat =
                new_boat_from_json(&json!({"id": "b1", "name": "A", "timestamp": input}), true)
                    .unwrap_or_else(|e| panic!("{}: {}", input, e));
            assert_eq!(boat.timestamp, expected, "{}", input);
        }
    }

    #[test]
    fn create_null_status_and_timestamp_use_defaults() {
        let before = Utc::now();
        let boat = new_boat_from_json(
            &json!({"id": "b1", "name": "Alpha", "status": null, "timestamp": null}),
            true,
        )
        .unwrap();

        assert_eq!(boat.status, BoatStatus::Online);
        assert!(boat.timestamp >= before);
    }

    #[test]
    fn patch_null_status_and_timestamp_are_ignored() {
        let patch = patch_from_json(&json!({"status": null, "timestamp": null})).unwrap();

        assert_eq!(patch.status, None);
        assert_eq!(patch.timestamp, None);
        assert!(patch.is_empty());
    }

    #[test]
    fn patch_cast_failure_message() {
        let err = patch_from_json(&json!({"voltage": "high", "name": ""})).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Cast to Number failed for value \"high\" (type string) at path \"voltage\" for model \"Boat\""
        );
    }

    #[test]
    fn patch_enum_failure_message() {
        let err = patch_from_json(&json!({"status": "sunk"})).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Validation failed: status: `sunk` is not a valid enum value for path `status`."
        );
    }

    #[test]
    fn empty_patch() {
        assert!(patch_from_json(&json!({})).unwrap().is_empty());
    }
}
