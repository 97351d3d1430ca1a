//! MongoDB adapter for the [`DocumentStore`] port.
//!
//! One [`mongodb::Client`] is shared by every request; the driver owns
//! connection pooling, timeouts and server selection. Filters, updates and
//! pipelines are handed to the driver untouched.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info};

use super::mongo_error_mapping::map_mongo_error;
use crate::domain::USER_COLLECTION;
use crate::domain::ports::{DocumentStore, FindWindow, Query, StoreError};

/// [`DocumentStore`] backed by a MongoDB database.
#[derive(Clone, Debug)]
pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    /// Connect to `uri`, select `database`, verify the server answers a
    /// `ping` and make sure account emails are unique.
    ///
    /// # Errors
    /// [`StoreError::Connection`] when the URI is invalid or the server
    /// cannot be reached. Index creation fails with
    /// [`StoreError::DuplicateKey`] when stored accounts already share an
    /// email.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await.map_err(map_mongo_error)?;
        let store = Self::from_database(client.database(database));
        store.ping().await?;
        store.ensure_unique_index(USER_COLLECTION, "email").await?;
        info!(database, "connected to mongodb");
        Ok(store)
    }

    /// Create an ascending unique index on `field` unless it already exists.
    pub async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let mut keys = Document::new();
        keys.insert(field, 1_i32);
        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let created = self
            .collection(collection)
            .create_index(index)
            .await
            .map_err(map_mongo_error)?;
        debug!(collection, index = %created.index_name, "unique index ready");
        Ok(())
    }

    /// Wrap an already configured database handle.
    pub fn from_database(database: Database) -> Self {
        Self { database }
    }

    /// Round-trip a `ping` command to the server.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|err| match map_mongo_error(err) {
                StoreError::Query { message } => StoreError::connection(message),
                other => other,
            })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }
}

fn to_driver_limit(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: Query,
        window: FindWindow,
    ) -> Result<Vec<Document>, StoreError> {
        debug!(collection, ?filter, ?window, "find");
        let coll = self.collection(collection);
        let mut action = coll.find(filter);
        if let Some(limit) = window.limit {
            action = action.limit(to_driver_limit(limit));
        }
        if let Some(skip) = window.skip {
            action = action.skip(skip);
        }
        let cursor = action.await.map_err(map_mongo_error)?;
        cursor.try_collect().await.map_err(map_mongo_error)
    }

    async fn find_one(&self, collection: &str, filter: Query) -> Result<Document, StoreError> {
        debug!(collection, ?filter, "find one");
        self.collection(collection)
            .find_one(filter)
            .await
            .map_err(map_mongo_error)?
            .ok_or_else(StoreError::not_found)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, StoreError> {
        debug!(collection, stages = pipeline.len(), "aggregate");
        let cursor = self
            .collection(collection)
            .aggregate(pipeline)
            .await
            .map_err(map_mongo_error)?;
        cursor.try_collect().await.map_err(map_mongo_error)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<(), StoreError> {
        debug!(collection, count = documents.len(), "insert many");
        self.collection(collection)
            .insert_many(documents)
            .await
            .map(|_| ())
            .map_err(map_mongo_error)
    }

    async fn upsert_by_id(
        &self,
        collection: &str,
        id: Bson,
        document: Document,
    ) -> Result<(), StoreError> {
        debug!(collection, %id, "upsert by id");
        self.collection(collection)
            .replace_one(doc! { "_id": id }, document)
            .upsert(true)
            .await
            .map(|_| ())
            .map_err(map_mongo_error)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Query,
        update: Document,
    ) -> Result<Document, StoreError> {
        debug!(collection, ?filter, "find one and update");
        self.collection(collection)
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .upsert(false)
            .await
            .map_err(map_mongo_error)?
            .ok_or_else(StoreError::not_found)
    }

    async fn delete_many(&self, collection: &str, filter: Query) -> Result<u64, StoreError> {
        debug!(collection, ?filter, "delete many");
        self.collection(collection)
            .delete_many(filter)
            .await
            .map(|result| result.deleted_count)
            .map_err(map_mongo_error)
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        self.collection(collection)
            .count_documents(Document::new())
            .await
            .map_err(map_mongo_error)
    }
}
