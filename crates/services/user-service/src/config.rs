//! User service configuration.
//!
//! Values come from environment variables, falling back to a JSON settings file
//! (`appsettings.json` by default) and finally to built-in defaults.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use common::{AppResult, MongoConfig, ServiceConfig};
use domain::PasswordHasher;

/// Environment variable naming the settings file
pub const CONFIG_FILE_ENV: &str = "USER_SERVICE_CONFIG_FILE";

/// Settings file read when `USER_SERVICE_CONFIG_FILE` is unset
pub const DEFAULT_CONFIG_FILE: &str = "appsettings.json";

const CONNECTION_STRING_VARS: &[&str] = &["MONGO_CONNECTION_STRING", "MongoConnectionString"];
const DATABASE_NAME_VARS: &[&str] = &["DATABASE_NAME", "DatabaseName"];
const COLLECTION_NAME_VARS: &[&str] = &["COLLECTION_NAME", "CollectionName"];
const REQUEST_TIMEOUT_VAR: &str = "USER_SERVICE_REQUEST_TIMEOUT_MS";
const PASSWORD_SALT_VAR: &str = "USER_SERVICE_PASSWORD_SALT";
const LOG_LEVEL_VAR: &str = "RUST_LOG";

/// Keys read from the settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SettingsFile {
    pub mongo_connection_string: Option<String>,
    pub database_name: Option<String>,
    pub collection_name: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub password_salt: Option<String>,
}

impl SettingsFile {
    /// Parse settings from JSON. Unknown keys are ignored.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Read settings from a file, returning empty settings if it is missing or invalid.
    pub fn read(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("No settings file at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::parse(&content) {
            Ok(settings) => {
                tracing::debug!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// User service configuration.
#[derive(Clone)]
pub struct UserServiceConfig {
    pub service: ServiceConfig,
    pub mongo: MongoConfig,
    /// Base64 override of the shared password salt
    password_salt: Option<String>,
}

impl std::fmt::Debug for UserServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserServiceConfig")
            .field("service", &self.service)
            .field("mongo", &self.mongo)
            .field("password_salt", &self.password_salt.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for UserServiceConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            mongo: MongoConfig::default(),
            password_salt: None,
        }
    }
}

impl UserServiceConfig {
    /// Load configuration: `.env`, then the settings file, then environment overrides.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        let path = env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(SettingsFile::read(Path::new(&path)))
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Self {
        Self::from_sources(SettingsFile::default())
    }

    /// Merge environment variables over the given file settings.
    pub fn from_sources(file: SettingsFile) -> Self {
        let defaults = Self::default();

        let mongo = MongoConfig {
            connection_string: first_var(CONNECTION_STRING_VARS)
                .or(file.mongo_connection_string)
                .unwrap_or(defaults.mongo.connection_string),
            database_name: first_var(DATABASE_NAME_VARS)
                .or(file.database_name)
                .unwrap_or(defaults.mongo.database_name),
            collection_name: first_var(COLLECTION_NAME_VARS)
                .or(file.collection_name)
                .unwrap_or(defaults.mongo.collection_name),
            request_timeout_ms: parse_var(REQUEST_TIMEOUT_VAR)
                .or(file.request_timeout_ms)
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.mongo.request_timeout_ms),
            ..defaults.mongo
        };

        let service = ServiceConfig {
            log_level: first_var(&[LOG_LEVEL_VAR]).unwrap_or(defaults.service.log_level),
            ..defaults.service
        };

        Self {
            service,
            mongo,
            password_salt: first_var(&[PASSWORD_SALT_VAR]).or(file.password_salt),
        }
    }

    /// Timeout applied to every collection call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.mongo.request_timeout_ms)
    }

    /// Password hasher using the configured salt, or the built-in one.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the configured salt is not 16 bytes of base64.
    pub fn password_hasher(&self) -> AppResult<PasswordHasher> {
        match &self.password_salt {
            Some(salt) => Ok(PasswordHasher::from_base64_salt(salt)?),
            None => Ok(PasswordHasher::new()),
        }
    }

    /// Override the password salt (base64).
    pub fn with_password_salt(mut self, salt: impl Into<String>) -> Self {
        self.password_salt = Some(salt.into());
        self
    }
}

/// First non-empty value among the given environment variables.
fn first_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Parse a numeric environment variable, warning on garbage.
fn parse_var(name: &str) -> Option<u64> {
    let raw = first_var(&[name])?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a number", name, raw);
            None
        }
    }
}
