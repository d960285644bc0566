//! Collection handle used when the store could not be reached at startup.

use async_trait::async_trait;

use common::{AppError, AppResult};

use super::collection::{DocumentCollection, Filter};

/// Fails every call with `StorageUnavailable`.
#[derive(Debug, Clone)]
pub struct UnavailableCollection {
    reason: String,
}

impl UnavailableCollection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<R>(&self) -> AppResult<R> {
        Err(AppError::storage_unavailable(self.reason.clone()))
    }
}

#[async_trait]
impl<T> DocumentCollection<T> for UnavailableCollection
where
    T: Send + Sync + 'static,
{
    async fn insert_one(&self, _record: T) -> AppResult<()> {
        self.fail()
    }

    async fn find_one(&self, _filter: Filter) -> AppResult<Option<T>> {
        self.fail()
    }

    async fn find_many(&self, _filter: Filter) -> AppResult<Vec<T>> {
        self.fail()
    }

    async fn find_top_one_sorted_descending(&self, _field: &'static str) -> AppResult<Option<T>> {
        self.fail()
    }

    async fn replace_one(&self, _filter: Filter, _record: T) -> AppResult<u64> {
        self.fail()
    }

    async fn delete_one(&self, _filter: Filter) -> AppResult<u64> {
        self.fail()
    }
}
