//! Port describing the raw operations of a document database.
//!
//! Adapters only ever see collection names and BSON documents. Resolving a
//! collection from a model type and (de)serialising documents happens in
//! [`ModelStore`](crate::domain::ModelStore), which sits on top of this trait.

use std::fmt;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use super::define_port_error;

/// Field-match criteria passed through to the store untouched.
///
/// Any nested value and the store's native operators (`$in`, `$gt`, ...) are
/// allowed; this layer places no restriction on the shape.
pub type Query = Document;

define_port_error! {
    /// Errors surfaced by document store adapters.
    pub enum StoreError {
        /// No document matched the query.
        NotFound => "not found",
        /// The server no longer knows the cursor a read was iterating.
        InvalidCursor => "invalid cursor",
        /// The store could not be reached.
        Connection { message: String } => "document store connection failed: {message}",
        /// A write would repeat a value held under a unique index.
        DuplicateKey { message: String } => "duplicate key: {message}",
        /// The store rejected or failed the operation.
        Query { message: String } => "document store query failed: {message}",
        /// A model could not be converted to or from a BSON document.
        Serialization { message: String } => "document conversion failed: {message}",
        /// One or more groups of a batched insert failed.
        Aggregate { errors: AggregateError } => "{errors}",
    }
}

impl StoreError {
    /// True when the error means "no match" rather than a store failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// True when a unique index rejected the write, directly or in any
    /// member of an aggregate.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            Self::DuplicateKey { .. } => true,
            Self::Aggregate { errors } => errors.errors().iter().any(Self::is_duplicate_key),
            _ => false,
        }
    }
}

impl From<AggregateError> for StoreError {
    fn from(errors: AggregateError) -> Self {
        Self::Aggregate { errors }
    }
}

/// Ordered collection of independent failures from one batched operation.
///
/// # Examples
/// ```
/// use accounts::domain::ports::{AggregateError, StoreError};
///
/// let mut errors = AggregateError::default();
/// errors.push(StoreError::query("duplicate key"));
/// assert_eq!(errors.len(), 1);
/// assert!(errors.into_result().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateError {
    errors: Vec<StoreError>,
}

impl AggregateError {
    /// Record one more failure.
    pub fn push(&mut self, error: StoreError) {
        self.errors.push(error);
    }

    /// Failures in the order they were recorded.
    pub fn errors(&self) -> &[StoreError] {
        &self.errors
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when nothing failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when empty, otherwise the aggregate wrapped in a [`StoreError`].
    pub fn into_result(self) -> Result<(), StoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} batch operation(s) failed", self.errors.len())?;
        for (index, error) in self.errors.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Window applied to a find operation.
///
/// `None` means "unbounded" for the limit and "no offset" for the skip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindWindow {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

impl FindWindow {
    /// Build a window from caller bounds where values `<= 0` mean "unset".
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::ports::FindWindow;
    ///
    /// let window = FindWindow::from_bounds(0, 5);
    /// assert_eq!(window.limit, None);
    /// assert_eq!(window.skip, Some(5));
    /// ```
    pub fn from_bounds(limit: i64, skip: i64) -> Self {
        Self {
            limit: positive(limit),
            skip: positive(skip),
        }
    }

    /// A window returning at most one document after `skip` documents.
    pub fn single_at(skip: u64) -> Self {
        Self {
            limit: Some(1),
            skip: (skip > 0).then_some(skip),
        }
    }
}

fn positive(value: i64) -> Option<u64> {
    u64::try_from(value).ok().filter(|value| *value > 0)
}

/// Raw document database operations keyed by collection name.
///
/// Implementations must be safe to share across request handlers; no
/// operation retries or recovers, every failure is returned as-is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return every document matching `filter` inside `window`.
    async fn find(
        &self,
        collection: &str,
        filter: Query,
        window: FindWindow,
    ) -> Result<Vec<Document>, StoreError>;

    /// Return the first document matching `filter` or [`StoreError::NotFound`].
    async fn find_one(&self, collection: &str, filter: Query) -> Result<Document, StoreError>;

    /// Run a multi-stage aggregation pipeline.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Insert all documents in one batch call.
    async fn insert_many(&self, collection: &str, documents: Vec<Document>)
    -> Result<(), StoreError>;

    /// Replace the document with `_id == id`, creating it when absent.
    async fn upsert_by_id(
        &self,
        collection: &str,
        id: Bson,
        document: Document,
    ) -> Result<(), StoreError>;

    /// Apply `update` to the first match and return the post-update document.
    ///
    /// Never upserts; returns [`StoreError::NotFound`] when nothing matched.
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Query,
        update: Document,
    ) -> Result<Document, StoreError>;

    /// Delete every matching document and return how many were removed.
    async fn delete_many(&self, collection: &str, filter: Query) -> Result<u64, StoreError>;

    /// Count every document in the collection.
    async fn count(&self, collection: &str) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, None, None)]
    #[case(-3, -1, None, None)]
    #[case(10, 0, Some(10), None)]
    #[case(0, 5, None, Some(5))]
    #[case(10, 5, Some(10), Some(5))]
    fn window_treats_non_positive_bounds_as_unset(
        #[case] limit: i64,
        #[case] skip: i64,
        #[case] expected_limit: Option<u64>,
        #[case] expected_skip: Option<u64>,
    ) {
        let window = FindWindow::from_bounds(limit, skip);
        assert_eq!(window.limit, expected_limit);
        assert_eq!(window.skip, expected_skip);
    }

    #[rstest]
    fn single_window_omits_zero_offset() {
        assert_eq!(
            FindWindow::single_at(0),
            FindWindow {
                limit: Some(1),
                skip: None
            }
        );
        assert_eq!(FindWindow::single_at(4).skip, Some(4));
    }

    #[rstest]
    fn aggregate_lists_every_failure_in_order() {
        let mut errors = AggregateError::default();
        errors.push(StoreError::query("duplicate key"));
        errors.push(StoreError::connection("reset by peer"));

        assert_eq!(
            errors.to_string(),
            "2 batch operation(s) failed: document store query failed: duplicate key; \
             document store connection failed: reset by peer"
        );
    }

    #[rstest]
    fn empty_aggregate_is_success() {
        assert_eq!(AggregateError::default().into_result(), Ok(()));
    }

    #[rstest]
    fn not_found_is_distinguishable() {
        assert!(StoreError::not_found().is_not_found());
        assert!(!StoreError::invalid_cursor().is_not_found());
    }

    #[rstest]
    #[case(StoreError::duplicate_key("user.email"), true)]
    #[case(StoreError::query("user.email"), false)]
    #[case(
        StoreError::from({
            let mut errors = AggregateError::default();
            errors.push(StoreError::connection("reset"));
            errors.push(StoreError::duplicate_key("user.email"));
            errors
        }),
        true
    )]
    #[case(
        StoreError::from({
            let mut errors = AggregateError::default();
            errors.push(StoreError::connection("reset"));
            errors
        }),
        false
    )]
    fn duplicate_keys_are_found_inside_aggregates(#[case] err: StoreError, #[case] expected: bool) {
        assert_eq!(err.is_duplicate_key(), expected);
    }
}
