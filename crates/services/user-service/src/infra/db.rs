//! MongoDB connection and initialization.

use std::time::Duration;

use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, IndexModel};

use common::{AppResult, MongoConfig};
use domain::{User, FIELD_CUSTOMER_NUMBER};

use crate::repository::MongoCollection;

const CUSTOMER_NUMBER_INDEX: &str = "customer_number_unique";

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    database: mongodb::Database,
    config: MongoConfig,
}

impl Database {
    /// Build a client from the configuration and verify the server answers.
    pub async fn connect(config: &MongoConfig) -> AppResult<Self> {
        tracing::info!(
            url = %config.redacted_connection_string(),
            database = %config.database_name,
            collection = %config.collection_name,
            "Connecting to MongoDB"
        );

        let mut options = ClientOptions::parse(&config.connection_string).await?;
        options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        options.server_selection_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options)?;
        let database = client.database(&config.database_name);

        let db = Self {
            database,
            config: config.clone(),
        };
        db.ping().await?;

        tracing::info!("Connected to MongoDB");
        Ok(db)
    }

    /// Typed handle on the users collection.
    pub fn users(&self) -> MongoCollection<User> {
        MongoCollection::new(self.database.collection::<User>(&self.config.collection_name))
    }

    /// Create the unique index backing customer number allocation.
    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let mut keys = Document::new();
        keys.insert(FIELD_CUSTOMER_NUMBER, 1);

        let index = IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(CUSTOMER_NUMBER_INDEX.to_string())
                    .build(),
            )
            .build();

        self.users().inner().create_index(index).await?;
        tracing::debug!(index = CUSTOMER_NUMBER_INDEX, "Index ensured");
        Ok(())
    }

    /// Round-trip a `ping` command to the server.
    pub async fn ping(&self) -> AppResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
