//! EV boats API
//!
//! A JSON REST API over a single collection of boat telemetry snapshots,
//! stored in MongoDB or PostgreSQL.

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod models;
pub mod validation;

pub use crate::config::{ApiVersion, AppConfig};
pub use crate::errors::BoatsApiError;
