//! MongoDB implementation of DocumentCollection.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Collection;
use serde::de::DeserializeOwned;
use serde::Serialize;

use common::AppResult;

use super::collection::{DocumentCollection, Filter};

/// Document collection backed by a MongoDB collection.
pub struct MongoCollection<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T: Send + Sync> MongoCollection<T> {
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.collection
    }
}

/// Build a MongoDB filter document.
pub(crate) fn filter_document(filter: &Filter) -> Document {
    match filter {
        Filter::All => doc! {},
        Filter::Eq(field, value) => {
            let mut document = Document::new();
            document.insert(*field, value.as_str());
            document
        }
    }
}

#[async_trait]
impl<T> DocumentCollection<T> for MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + 'static,
{
    async fn insert_one(&self, record: T) -> AppResult<()> {
        self.collection.insert_one(&record).await?;
        Ok(())
    }

    async fn find_one(&self, filter: Filter) -> AppResult<Option<T>> {
        let record = self.collection.find_one(filter_document(&filter)).await?;
        Ok(record)
    }

    async fn find_many(&self, filter: Filter) -> AppResult<Vec<T>> {
        let cursor = self.collection.find(filter_document(&filter)).await?;
        let records: Vec<T> = cursor.try_collect().await?;
        Ok(records)
    }

    async fn find_top_one_sorted_descending(&self, field: &'static str) -> AppResult<Option<T>> {
        let mut sort = Document::new();
        sort.insert(field, -1);

        let record = self.collection.find_one(doc! {}).sort(sort).await?;
        Ok(record)
    }

    async fn replace_one(&self, filter: Filter, record: T) -> AppResult<u64> {
        let result = self
            .collection
            .replace_one(filter_document(&filter), &record)
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_one(&self, filter: Filter) -> AppResult<u64> {
        let result = self.collection.delete_one(filter_document(&filter)).await?;
        Ok(result.deleted_count)
    }
}
