//! MongoDB persistence adapter.

mod mongo_document_store;
mod mongo_error_mapping;

pub use mongo_document_store::MongoDocumentStore;
