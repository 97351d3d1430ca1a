//! Test utilities shared by unit tests (in `src/`) and integration tests
//! (in `tests/`).
//!
//! Compiled for unit tests and when the `test-support` feature is enabled.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use mongodb::bson::{Bson, Document, oid::ObjectId};

use crate::domain::ports::{DocumentStore, FindWindow, Query, StoreError};

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, Vec<Document>>,
    insert_failures: HashMap<String, StoreError>,
    upsert_failures: HashMap<String, StoreError>,
    insert_calls: Vec<(String, usize)>,
    unique_fields: HashMap<String, Vec<String>>,
}

impl State {
    /// Reject `document` when it repeats a unique value held by another
    /// document of `collection`.
    fn check_unique(&self, collection: &str, document: &Document) -> Result<(), StoreError> {
        let Some(fields) = self.unique_fields.get(collection) else {
            return Ok(());
        };
        let id = document.get("_id");
        let stored = self.collections.get(collection).into_iter().flatten();
        for existing in stored.filter(|existing| existing.get("_id") != id) {
            let repeated = fields.iter().find_map(|field| {
                document
                    .get(field)
                    .filter(|value| existing.get(field) == Some(*value))
                    .map(|value| format!("{collection}.{field} {value}"))
            });
            if let Some(message) = repeated {
                return Err(StoreError::duplicate_key(message));
            }
        }
        Ok(())
    }
}

/// [`DocumentStore`] keeping documents in memory.
///
/// Filters support top-level equality only, updates support `$set`, and
/// pipelines support `$match`, `$skip` and `$limit`. Batch inserts are
/// recorded, and inserts and upserts can be made to fail per collection.
/// Unique fields declared with [`InMemoryDocumentStore::unique_index`] are
/// enforced on every write.
///
/// # Examples
/// ```
/// use accounts::domain::ports::{DocumentStore, FindWindow};
/// use accounts::test_support::InMemoryDocumentStore;
/// use mongodb::bson::doc;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let store = InMemoryDocumentStore::default();
/// store.insert_many("user", vec![doc! { "email": "ada@example.com" }]).await?;
/// let found = store.find("user", doc! {}, FindWindow::default()).await?;
/// assert_eq!(found.len(), 1);
/// assert_eq!(store.insert_calls(), vec![("user".to_owned(), 1)]);
/// # Ok::<(), accounts::domain::ports::StoreError>(())
/// # }).expect("in-memory store");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    state: Mutex<State>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later batch insert into `collection` fail with `error`.
    pub fn fail_inserts_into(&self, collection: &str, error: StoreError) {
        if let Ok(mut state) = self.state.lock() {
            state.insert_failures.insert(collection.to_owned(), error);
        }
    }

    /// Make every later upsert into `collection` fail with `error`.
    pub fn fail_upserts_into(&self, collection: &str, error: StoreError) {
        if let Ok(mut state) = self.state.lock() {
            state.upsert_failures.insert(collection.to_owned(), error);
        }
    }

    /// Reject writes repeating a value of `field` within `collection`.
    pub fn unique_index(&self, collection: &str, field: &str) {
        if let Ok(mut state) = self.state.lock() {
            state
                .unique_fields
                .entry(collection.to_owned())
                .or_default()
                .push(field.to_owned());
        }
    }

    /// `(collection, document count)` for every batch insert attempted.
    pub fn insert_calls(&self) -> Vec<(String, usize)> {
        self.state
            .lock()
            .map(|state| state.insert_calls.clone())
            .unwrap_or_default()
    }

    /// Snapshot of a collection's documents in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.collections.get(collection).cloned())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::connection("in-memory store lock poisoned"))
    }
}

fn matches(document: &Document, filter: &Query) -> bool {
    filter
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

fn windowed(documents: impl Iterator<Item = Document>, window: FindWindow) -> Vec<Document> {
    let skipped = documents.skip(usize::try_from(window.skip.unwrap_or(0)).unwrap_or(usize::MAX));
    match window.limit {
        Some(limit) => skipped
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect(),
        None => skipped.collect(),
    }
}

fn stage_count(value: &Bson) -> Result<u64, StoreError> {
    let count = match value {
        Bson::Int32(n) => i64::from(*n),
        Bson::Int64(n) => *n,
        other => return Err(StoreError::query(format!("expected an integer, got {other}"))),
    };
    u64::try_from(count).map_err(|_| StoreError::query("stage count must not be negative"))
}

fn apply_update(document: &mut Document, update: &Document) -> Result<(), StoreError> {
    for (operator, fields) in update {
        match (operator.as_str(), fields) {
            ("$set", Bson::Document(fields)) => {
                for (key, value) in fields {
                    document.insert(key.clone(), value.clone());
                }
            }
            _ => {
                return Err(StoreError::query(format!(
                    "unsupported update operator {operator}"
                )));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: Query,
        window: FindWindow,
    ) -> Result<Vec<Document>, StoreError> {
        let state = self.lock()?;
        let documents = state.collections.get(collection).into_iter().flatten();
        Ok(windowed(
            documents.filter(|document| matches(document, &filter)).cloned(),
            window,
        ))
    }

    async fn find_one(&self, collection: &str, filter: Query) -> Result<Document, StoreError> {
        self.find(collection, filter, FindWindow::single_at(0))
            .await?
            .into_iter()
            .next()
            .ok_or_else(StoreError::not_found)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, StoreError> {
        let mut documents = self.find(collection, Document::new(), FindWindow::default()).await?;
        for stage in &pipeline {
            let Some((name, argument)) = stage.iter().next() else {
                return Err(StoreError::query("empty pipeline stage"));
            };
            documents = match (name.as_str(), argument) {
                ("$match", Bson::Document(filter)) => documents
                    .into_iter()
                    .filter(|document| matches(document, filter))
                    .collect(),
                ("$skip", count) => windowed(
                    documents.into_iter(),
                    FindWindow {
                        limit: None,
                        skip: Some(stage_count(count)?),
                    },
                ),
                ("$limit", count) => windowed(
                    documents.into_iter(),
                    FindWindow {
                        limit: Some(stage_count(count)?),
                        skip: None,
                    },
                ),
                _ => return Err(StoreError::query(format!("unsupported stage {name}"))),
            };
        }
        Ok(documents)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state
            .insert_calls
            .push((collection.to_owned(), documents.len()));
        if let Some(error) = state.insert_failures.get(collection) {
            return Err(error.clone());
        }
        for mut document in documents {
            let id = document
                .get("_id")
                .cloned()
                .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));
            let mut stored = state.collections.get(collection).into_iter().flatten();
            if stored.any(|existing| existing.get("_id") == Some(&id)) {
                return Err(StoreError::duplicate_key(format!("{collection}._id {id}")));
            }
            document.insert("_id", id);
            state.check_unique(collection, &document)?;
            state
                .collections
                .entry(collection.to_owned())
                .or_default()
                .push(document);
        }
        Ok(())
    }

    async fn upsert_by_id(
        &self,
        collection: &str,
        id: Bson,
        mut document: Document,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if let Some(error) = state.upsert_failures.get(collection) {
            return Err(error.clone());
        }
        document.insert("_id", id.clone());
        state.check_unique(collection, &document)?;
        let stored = state.collections.entry(collection.to_owned()).or_default();
        match stored
            .iter_mut()
            .find(|existing| existing.get("_id") == Some(&id))
        {
            Some(existing) => *existing = document,
            None => stored.push(document),
        }
        Ok(())
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Query,
        update: Document,
    ) -> Result<Document, StoreError> {
        let mut state = self.lock()?;
        let document = state
            .collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|doc| matches(doc, &filter)))
            .ok_or_else(StoreError::not_found)?;
        apply_update(document, &update)?;
        Ok(document.clone())
    }

    async fn delete_many(&self, collection: &str, filter: Query) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        let Some(documents) = state.collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|document| !matches(document, &filter));
        Ok(u64::try_from(before - documents.len()).unwrap_or(u64::MAX))
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let state = self.lock()?;
        let len = state.collections.get(collection).map_or(0, Vec::len);
        Ok(u64::try_from(len).unwrap_or(u64::MAX))
    }
}
