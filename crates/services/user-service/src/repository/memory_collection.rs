//! In-memory implementation of DocumentCollection.
//!
//! Documents are kept as JSON values in insertion order, so filters and sorting
//! work on the serialized element names just like the real store. Unique fields
//! are enforced on insert and replace.

use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use common::{AppError, AppResult};
use domain::FIELD_ID;

use super::collection::{DocumentCollection, Filter};

/// Document collection held in process memory.
pub struct InMemoryCollection<T> {
    documents: Mutex<Vec<Value>>,
    unique_fields: Vec<&'static str>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Default for InMemoryCollection<T> {
    fn default() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            unique_fields: vec![FIELD_ID],
            _record: PhantomData,
        }
    }
}

impl<T> InMemoryCollection<T> {
    /// Empty collection with a unique `_id`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unique constraint on another field.
    pub fn with_unique_field(mut self, field: &'static str) -> Self {
        if !self.unique_fields.contains(&field) {
            self.unique_fields.push(field);
        }
        self
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        // A poisoned lock only means another test thread panicked mid-call
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// First unique field whose value in `candidate` is already used by another document.
    fn violated_field(
        &self,
        documents: &[Value],
        candidate: &Value,
        skip: Option<usize>,
    ) -> Option<&'static str> {
        self.unique_fields.iter().copied().find(|field| {
            let Some(value) = candidate.get(*field).filter(|v| !v.is_null()) else {
                return false;
            };
            documents
                .iter()
                .enumerate()
                .filter(|(index, _)| Some(*index) != skip)
                .any(|(_, existing)| existing.get(*field) == Some(value))
        })
    }
}

fn matches(filter: &Filter, document: &Value) -> bool {
    match filter {
        Filter::All => true,
        Filter::Eq(field, expected) => document.get(*field).and_then(Value::as_str) == Some(expected),
    }
}

/// Order JSON values the way a descending sort needs them: numbers, then strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, _) => Ordering::Less,
        (_, Some(Value::Null) | None) => Ordering::Greater,
        (Some(Value::Number(_)), _) => Ordering::Less,
        (_, Some(Value::Number(_))) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn to_document<T: Serialize>(record: &T) -> AppResult<Value> {
    serde_json::to_value(record)
        .map_err(|e| AppError::internal(format!("Failed to serialize document: {}", e)))
}

fn from_document<T: DeserializeOwned>(document: &Value) -> AppResult<T> {
    serde_json::from_value(document.clone())
        .map_err(|e| AppError::internal(format!("Failed to deserialize document: {}", e)))
}

#[async_trait]
impl<T> DocumentCollection<T> for InMemoryCollection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn insert_one(&self, record: T) -> AppResult<()> {
        let document = to_document(&record)?;
        let mut documents = self.lock();

        if let Some(field) = self.violated_field(&documents, &document, None) {
            return Err(AppError::conflict(field));
        }

        documents.push(document);
        Ok(())
    }

    async fn find_one(&self, filter: Filter) -> AppResult<Option<T>> {
        let documents = self.lock();
        documents
            .iter()
            .find(|document| matches(&filter, document))
            .map(from_document)
            .transpose()
    }

    async fn find_many(&self, filter: Filter) -> AppResult<Vec<T>> {
        let documents = self.lock();
        documents
            .iter()
            .filter(|document| matches(&filter, document))
            .map(from_document)
            .collect()
    }

    async fn find_top_one_sorted_descending(&self, field: &'static str) -> AppResult<Option<T>> {
        let documents = self.lock();
        documents
            .iter()
            .max_by(|a, b| compare_values(a.get(field), b.get(field)))
            .map(from_document)
            .transpose()
    }

    async fn replace_one(&self, filter: Filter, record: T) -> AppResult<u64> {
        let replacement = to_document(&record)?;
        let mut documents = self.lock();

        let Some(index) = documents.iter().position(|document| matches(&filter, document)) else {
            return Ok(0);
        };

        if documents[index] == replacement {
            return Ok(0);
        }

        if let Some(field) = self.violated_field(&documents, &replacement, Some(index)) {
            return Err(AppError::conflict(field));
        }

        documents[index] = replacement;
        Ok(1)
    }

    async fn delete_one(&self, filter: Filter) -> AppResult<u64> {
        let mut documents = self.lock();

        match documents.iter().position(|document| matches(&filter, document)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
