//! Application configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::errors::BoatsApiError;

/// Variant of the HTTP API to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// `/boats`, records addressed by their custom `id` field
    #[default]
    V1,
    /// `/api/boats`, records addressed by their store-assigned id
    V2,
}

impl ApiVersion {
    pub fn default_port(&self) -> u16 {
        match self {
            ApiVersion::V1 => 3000,
            ApiVersion::V2 => 4000,
        }
    }

    /// Whether a create request must carry the custom `id` field
    pub fn requires_custom_id(&self) -> bool {
        matches!(self, ApiVersion::V1)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api_version: ApiVersion,
    /// Listen port, defaults per API version
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub mongo_uri: Option<String>,
    /// Database used when the MongoDB URI names none
    pub mongo_database: Option<String>,
    /// PostgreSQL connection string, used when no MongoDB URI is set
    pub database_url: Option<String>,
}

/// Store selected by the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo {
        uri: String,
        database: Option<String>,
    },
    Postgres {
        url: String,
    },
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), BoatsApiError> {
        self.http_addr()?;
        self.store_backend()?;
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.api_version.default_port())
    }

    pub fn http_addr(&self) -> Result<SocketAddr, BoatsApiError> {
        let host = match self.bind_address.as_deref() {
            None | Some("") => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            Some(address) => {
                address
                    .parse()
                    .map_err(|_| BoatsApiError::ConfigurationError {
                        message: format!("Invalid bind address: {}", address),
                    })?
            }
        };
        Ok(SocketAddr::new(host, self.port()))
    }

    /// MongoDB wins when both stores are configured
    pub fn store_backend(&self) -> Result<StoreBackend, BoatsApiError> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

        if let Some(uri) = non_empty(&self.mongo_uri) {
            return Ok(StoreBackend::Mongo {
                uri,
                database: non_empty(&self.mongo_database),
            });
        }
        if let Some(url) = non_empty(&self.database_url) {
            return Ok(StoreBackend::Postgres { url });
        }
        Err(BoatsApiError::ConfigurationError {
            message: "Either MONGO_URI or DATABASE_URL must be set".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_load_config() {
        env::set_var("API_VERSION", "v2");
        env::set_var("PORT", "4100");
        env::set_var("MONGO_URI", "mongodb://localhost:27017/fleet");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.api_version, ApiVersion::V2);
        assert_eq!(config.port(), 4100);
        assert_eq!(
            config.store_backend().unwrap(),
            StoreBackend::Mongo {
                uri: "mongodb://localhost:27017/fleet".to_string(),
                database: None,
            }
        );

        env::remove_var("API_VERSION");
        env::remove_var("PORT");
        env::remove_var("MONGO_URI");
    }

    #[test]
    fn test_default_ports() {
        let v1 = AppConfig::default();
        assert_eq!(v1.port(), 3000);

        let v2 = AppConfig {
            api_version: ApiVersion::V2,
            ..Default::default()
        };
        assert_eq!(v2.port(), 4000);
        assert_eq!(
            v2.http_addr().unwrap(),
            "0.0.0.0:4000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_store_backend_fallback() {
        let config = AppConfig {
            mongo_uri: Some(" ".to_string()),
            database_url: Some("postgres://localhost/boats".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.store_backend().unwrap(),
            StoreBackend::Postgres {
                url: "postgres://localhost/boats".to_string()
            }
        );
    }

    #[test]
    fn test_validate_without_store() {
        assert!(AppConfig::default().validate().is_err());
    }

    #[test]
    fn test_validate_invalid_bind_address() {
        let config = AppConfig {
            bind_address: Some("not-an-ip".to_string()),
            mongo_uri: Some("mongodb://localhost".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
