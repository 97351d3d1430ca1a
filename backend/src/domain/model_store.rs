//! Typed facade over a [`DocumentStore`].
//!
//! Collection names come from an explicit per-type declaration
//! ([`Model::COLLECTION`]) rather than from the runtime type name. Results are
//! decoded into the requested model type; inputs are encoded from it.
//!
//! Every operation is a single remote call (two for
//! [`ModelStore::get_random_one_model`]) and propagates the store error
//! unchanged. The only exception is [`ModelStore::insert_models`], which keeps
//! going past unencodable models and failed collection groups and reports
//! every failure at once.

use std::sync::Arc;

use mongodb::bson::{self, Bson, Document};
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ports::{AggregateError, DocumentStore, FindWindow, Query, StoreError};

/// A persisted entity type and the collection holding it.
pub trait Model: Serialize + DeserializeOwned + Send + Sync {
    /// Collection every value of this type is read from and written to.
    const COLLECTION: &'static str;
}

/// Object-safe view of a model used for heterogeneous batch inserts.
pub trait StoredModel: Send + Sync {
    /// Collection this value is written to.
    fn collection_name(&self) -> &'static str;

    /// Encode the value as a BSON document.
    fn to_document(&self) -> Result<Document, StoreError>;
}

impl<T: Model> StoredModel for T {
    fn collection_name(&self) -> &'static str {
        T::COLLECTION
    }

    fn to_document(&self) -> Result<Document, StoreError> {
        encode(self)
    }
}

fn encode<T: Serialize + ?Sized>(model: &T) -> Result<Document, StoreError> {
    bson::to_document(model).map_err(|err| StoreError::serialization(err.to_string()))
}

fn decode<T: Model>(document: Document) -> Result<T, StoreError> {
    bson::from_document(document).map_err(|err| StoreError::serialization(err.to_string()))
}

fn decode_all<T: Model>(documents: Vec<Document>) -> Result<Vec<T>, StoreError> {
    documents.into_iter().map(decode).collect()
}

/// Shared, cheaply cloneable handle resolving model types to collections.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use accounts::domain::ModelStore;
/// use accounts::test_support::InMemoryDocumentStore;
///
/// let store = ModelStore::new(Arc::new(InMemoryDocumentStore::default()));
/// let _shared = store.clone();
/// ```
#[derive(Clone)]
pub struct ModelStore {
    store: Arc<dyn DocumentStore>,
}

impl ModelStore {
    /// Wrap a document store adapter.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch every `T` matching `query`.
    ///
    /// `limit <= 0` means unbounded and `skip <= 0` means no offset.
    pub async fn get_models<T: Model>(
        &self,
        query: Query,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<T>, StoreError> {
        let window = FindWindow::from_bounds(limit, skip);
        debug!(collection = T::COLLECTION, ?window, "fetching models");
        let documents = self.store.find(T::COLLECTION, query, window).await?;
        decode_all(documents)
    }

    /// Fetch the first `T` matching `query`, or [`StoreError::NotFound`].
    pub async fn get_one_model<T: Model>(&self, query: Query) -> Result<T, StoreError> {
        let document = self.store.find_one(T::COLLECTION, query).await?;
        decode(document)
    }

    /// Run an aggregation pipeline and decode each output document as `T`.
    ///
    /// The pipeline runs against `collection` when given and non-empty,
    /// otherwise against `T`'s collection.
    pub async fn aggregate_models<T: Model>(
        &self,
        pipeline: Vec<Document>,
        collection: Option<&str>,
    ) -> Result<Vec<T>, StoreError> {
        let collection = collection
            .filter(|name| !name.is_empty())
            .unwrap_or(T::COLLECTION);
        let documents = self.store.aggregate(collection, pipeline).await?;
        decode_all(documents)
    }

    /// Insert models of any type, one batch call per collection.
    ///
    /// Groups are formed in order of first appearance. A model that fails to
    /// encode is left out of its group, and a failing group does not stop the
    /// remaining groups. When anything fails the returned
    /// [`StoreError::Aggregate`] lists encoding failures in input order
    /// followed by group failures in group order.
    pub async fn insert_models(&self, models: &[&dyn StoredModel]) -> Result<(), StoreError> {
        let mut failures = AggregateError::default();
        let mut groups: Vec<(&'static str, Vec<Document>)> = Vec::new();
        for model in models {
            let collection = model.collection_name();
            let document = match model.to_document() {
                Ok(document) => document,
                Err(error) => {
                    warn!(collection, %error, "model skipped, encoding failed");
                    failures.push(error);
                    continue;
                }
            };
            match groups.iter_mut().find(|(name, _)| *name == collection) {
                Some((_, documents)) => documents.push(document),
                None => groups.push((collection, vec![document])),
            }
        }

        for (collection, documents) in groups {
            let count = documents.len();
            match self.store.insert_many(collection, documents).await {
                Ok(()) => debug!(collection, count, "inserted batch"),
                Err(error) => {
                    warn!(collection, count, %error, "batch insert failed");
                    failures.push(error);
                }
            }
        }
        failures.into_result()
    }

    /// Replace the `T` stored under `id`, creating it when absent.
    pub async fn update_model_id<T: Model>(
        &self,
        id: impl Into<Bson> + Send,
        model: &T,
    ) -> Result<(), StoreError> {
        let document = encode(model)?;
        self.store
            .upsert_by_id(T::COLLECTION, id.into(), document)
            .await
    }

    /// Apply `patch` to the first `T` matching `filter` and return the result.
    ///
    /// Never upserts; [`StoreError::NotFound`] when nothing matched.
    pub async fn update<T: Model>(&self, filter: Query, patch: Document) -> Result<T, StoreError> {
        let document = self
            .store
            .find_one_and_update(T::COLLECTION, filter, patch)
            .await?;
        decode(document)
    }

    /// Remove every `T` matching `query`, returning the removed count.
    pub async fn remove_models<T: Model>(&self, query: Query) -> Result<u64, StoreError> {
        self.store.delete_many(T::COLLECTION, query).await
    }

    /// Pick a uniformly random `T`.
    ///
    /// Counts the collection, draws an offset in `[0, count)` and reads the
    /// document at that offset. The two calls are not atomic: if the
    /// collection shrinks in between, the offset can fall past the end
    /// ([`StoreError::NotFound`]) or land on a different document than the
    /// one drawn. The skip costs O(offset) in the store, so this is only
    /// suitable for small collections.
    pub async fn get_random_one_model<T: Model>(&self) -> Result<T, StoreError> {
        let count = self.store.count(T::COLLECTION).await?;
        if count == 0 {
            return Err(StoreError::not_found());
        }
        let offset = rand::thread_rng().gen_range(0..count);
        let documents = self
            .store
            .find(T::COLLECTION, Document::new(), FindWindow::single_at(offset))
            .await?;
        let document = documents
            .into_iter()
            .next()
            .ok_or_else(StoreError::not_found)?;
        decode(document)
    }
}
