//! User Service Library
//!
//! User records over a MongoDB collection: sequential customer numbers,
//! PBKDF2 credential hashing and login verification. The binary wraps it in an
//! operator CLI; other hosts can embed it through [`build_service`].

pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use common::{AppResult, MongoConfig};
use domain::{User, FIELD_CUSTOMER_NUMBER};

use crate::config::UserServiceConfig;
use crate::infra::Database;
use crate::repository::{DocumentCollection, UnavailableCollection, UserStore};
use crate::service::{UserManager, UserService};

/// Wire config, collection, repository and service together.
///
/// A store that cannot be reached does not fail construction; every
/// operation then reports `StorageUnavailable`.
pub async fn build_service(config: &UserServiceConfig) -> AppResult<Arc<dyn UserService>> {
    // Reject a bad salt before touching the network
    config.password_hasher()?;
    let collection = connect_collection(&config.mongo).await;
    service_with_collection(collection, config)
}

/// Service over an already built collection, e.g. an in-memory one.
pub fn service_with_collection(
    collection: Arc<dyn DocumentCollection<User>>,
    config: &UserServiceConfig,
) -> AppResult<Arc<dyn UserService>> {
    let hasher = config.password_hasher()?;
    let repo = Arc::new(UserStore::new(collection).with_timeout(config.request_timeout()));
    Ok(Arc::new(UserManager::with_hasher(repo, hasher)))
}

async fn connect_collection(config: &MongoConfig) -> Arc<dyn DocumentCollection<User>> {
    let db = match Database::connect(config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(
                url = %config.redacted_connection_string(),
                "Failed to connect to MongoDB: {}",
                e
            );
            return Arc::new(UnavailableCollection::new(e.to_string()));
        }
    };

    if let Err(e) = db.ensure_indexes().await {
        tracing::warn!(
            field = FIELD_CUSTOMER_NUMBER,
            "Could not ensure unique index: {}",
            e
        );
    }

    Arc::new(db.users())
}

/// Check that the configured store answers.
pub async fn ping(config: &MongoConfig) -> AppResult<()> {
    Database::connect(config).await?;
    info!("MongoDB is reachable");
    Ok(())
}

/// Build and host information.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub host_name: String,
}

/// Describe this build and the host it runs on.
pub fn service_info(config: &UserServiceConfig) -> ServiceInfo {
    ServiceInfo {
        service: config.service.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        host_name: whoami::fallible::hostname().unwrap_or_else(|_| "unknown".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCollection;
    use domain::Login;

    #[test]
    fn test_service_info() {
        let info = service_info(&UserServiceConfig::default());
        assert_eq!(info.service, "user-service");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.host_name.is_empty());

        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("hostName").is_some());
    }

    #[tokio::test]
    async fn test_service_with_collection() {
        let collection = Arc::new(InMemoryCollection::<User>::new());
        let service = service_with_collection(collection, &UserServiceConfig::default()).unwrap();

        let created = service
            .create_user(User {
                email_address: Some("a@b.com".to_string()),
                password: Some("secret".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.customer_number, 1);

        let result = service.login(&Login::new("a@b.com", "secret")).await.unwrap();
        assert!(result.matched);
    }

    #[tokio::test]
    async fn test_invalid_salt_rejected() {
        let config = UserServiceConfig::default().with_password_salt("short");
        let collection = Arc::new(InMemoryCollection::<User>::new());
        assert!(service_with_collection(collection, &config).is_err());
    }
}
