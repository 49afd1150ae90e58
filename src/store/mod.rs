//! Document store backends
//!
//! A [`DocumentStore`] executes a [`PageQuery`] and returns raw documents in
//! store key order. Two backends are provided:
//! - `mongo`: [`MongoStore`], backed by the MongoDB driver
//! - `memory`: [`MemoryStore`], an in-process store for tests and fakes

pub mod memory;
pub mod mongo;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::query::PageQuery;
use crate::record::RawDocument;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Query executor consumed by the paged reader.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Execute `query`, returning at most `query.limit` documents ordered by
    /// key, starting after `query.start_after` when set.
    async fn run_query(&self, query: &PageQuery) -> Result<Vec<RawDocument>, StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    async fn run_query(&self, query: &PageQuery) -> Result<Vec<RawDocument>, StoreError> {
        (**self).run_query(query).await
    }
}
