//! Paginated readers
//!
//! [`PagedReader`] offers two ways to read a collection page by page:
//! - [`PagedReader::fetch_accumulating`]: appends one page per call to an
//!   observable [`ReadState`], tracking the cursor and whether more pages exist
//! - [`PagedReader::fetch_page`]: returns one [`Page`] and the cursor for the
//!   next one, leaving the reader's state untouched
//!
//! # Example
//!
//! ```rust,no_run
//! use docpager::query::Filter;
//! use docpager::reader::{PageRequest, PagedReader};
//! use docpager::store::MemoryStore;
//! use bson::Document;
//!
//! # async fn run() -> docpager::Result<()> {
//! let reader: PagedReader<Document, _> = PagedReader::new(MemoryStore::new());
//!
//! reader.fetch_accumulating("users", 20, &[Filter::eq("status", "active")]).await;
//! println!("{} loaded, more: {}", reader.items().len(), reader.has_more());
//!
//! let page = reader
//!     .fetch_page::<Document>(PageRequest::new("orders").page_size(5))
//!     .await?;
//! println!("next: {:?}", page.next_cursor);
//! # Ok(())
//! # }
//! ```

mod signal;
mod state;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{ExecutionError, PagerError, Result};
use crate::query::{DEFAULT_PAGE_SIZE, Filter, PageQuery};
use crate::record::{Cursor, Page, Record, decode_batch};
use crate::store::DocumentStore;

pub use signal::Signal;
pub use state::{Phase, ReadState};

/// Parameters of a stateless page fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub page_size: u32,
    pub cursor: Option<Cursor>,
}

impl PageRequest {
    /// Request the first page of `collection` with the default page size.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            cursor: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Resume after `cursor`; `None` starts from the beginning.
    pub fn after(mut self, cursor: Option<Cursor>) -> Self {
        self.cursor = cursor;
        self
    }
}

/// Paginated reader over a [`DocumentStore`], generic over the record shape
/// `T` accumulated by the stateful mode.
pub struct PagedReader<T, S> {
    store: S,
    state: Signal<ReadState<T>>,
    _record: PhantomData<fn() -> T>,
}

impl<T, S> PagedReader<T, S>
where
    T: DeserializeOwned,
    S: DocumentStore,
{
    /// Create a reader in the initial `Loading` state.
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: Signal::new(ReadState::initial()),
            _record: PhantomData,
        }
    }

    /// Fetch the next page and append it to the accumulated state.
    ///
    /// Does nothing once `has_more` is false. Failures are stored in the
    /// state (`phase = Error`) and never returned; items, cursor and
    /// `has_more` keep their previous values.
    ///
    /// Overlapping calls are not serialized: each reads the cursor before
    /// querying and appends its page when the query completes.
    pub async fn fetch_accumulating(&self, collection: &str, page_size: u32, filters: &[Filter]) {
        let (has_more, cursor) = self.state.with(|s| (s.has_more, s.cursor.clone()));
        if !has_more {
            debug!("No more pages for collection '{}', skipping fetch", collection);
            return;
        }

        if page_size == 0 {
            warn!("Rejected accumulating fetch on '{}' with page size 0", collection);
            self.state
                .update(|s| s.apply_error(ExecutionError::InvalidPageSize(page_size).into()));
            return;
        }

        let query = PageQuery::new(collection, page_size)
            .with_filters(filters.iter().cloned())
            .with_start_after(cursor);

        match self.run::<T>(&query).await {
            Ok((records, last)) => {
                info!(
                    "Fetched {} record(s) from '{}' (page size {})",
                    records.len(),
                    collection,
                    page_size
                );
                self.state
                    .update(|s| s.apply_page(records, last, page_size));
            }
            Err(e) => {
                error!("Failed to fetch documents from '{}': {}", collection, e);
                self.state.update(|s| s.apply_error(e));
            }
        }
    }

    /// Fetch one page without touching the reader's state.
    ///
    /// `U` is chosen per call and need not match the reader's `T`. Failures
    /// are logged and returned as is.
    pub async fn fetch_page<U: DeserializeOwned>(&self, request: PageRequest) -> Result<Page<U>> {
        if request.page_size == 0 {
            let e = PagerError::from(ExecutionError::InvalidPageSize(0));
            error!("Page fetch on '{}' failed: {}", request.collection, e);
            return Err(e);
        }

        let query = PageQuery::new(request.collection, request.page_size)
            .with_filters(request.filters)
            .with_start_after(request.cursor);

        match self.run::<U>(&query).await {
            Ok((data, next_cursor)) => {
                debug!(
                    "Page of {} record(s) from '{}', next cursor: {:?}",
                    data.len(),
                    query.collection,
                    next_cursor.as_ref().map(Cursor::id)
                );
                Ok(Page { data, next_cursor })
            }
            Err(e) => {
                error!("Page fetch on '{}' failed: {}", query.collection, e);
                Err(e)
            }
        }
    }

    async fn run<U: DeserializeOwned>(
        &self,
        query: &PageQuery,
    ) -> Result<(Vec<Record<U>>, Option<Cursor>)> {
        let docs = self.store.run_query(query).await?;
        decode_batch(docs)
    }
}

impl<T, S> PagedReader<T, S> {
    /// Observable accumulated state.
    pub fn state(&self) -> &Signal<ReadState<T>> {
        &self.state
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ReadState<T>> {
        self.state.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.state.with(|s| s.phase)
    }

    pub fn has_more(&self) -> bool {
        self.state.with(|s| s.has_more)
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.state.with(|s| s.cursor.clone())
    }

    pub fn error(&self) -> Option<Arc<PagerError>> {
        self.state.with(|s| s.error.clone())
    }

    /// Drop everything accumulated and return to the initial state.
    pub fn reset(&self) {
        self.state.set(ReadState::initial());
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<T: Clone, S> PagedReader<T, S> {
    /// Clone of the accumulated items.
    pub fn items(&self) -> Vec<Record<T>> {
        self.state.with(|s| s.items.clone())
    }
}

impl<T: std::fmt::Debug, S> std::fmt::Debug for PagedReader<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedReader")
            .field("state", &self.state)
            .field("store", &"<DocumentStore>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::record::RawDocument;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use bson::{Document, doc};
    use serde::Deserialize;
    use tokio::sync::Barrier;

    /// Holds every query at a barrier so concurrent fetches overlap.
    struct GatedStore {
        inner: MemoryStore,
        gate: Barrier,
    }

    #[async_trait]
    impl DocumentStore for GatedStore {
        async fn run_query(
            &self,
            query: &PageQuery,
        ) -> std::result::Result<Vec<RawDocument>, StoreError> {
            self.gate.wait().await;
            self.inner.run_query(query).await
        }
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Item {
        status: String,
    }

    fn five_docs() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_many(
            "items",
            ["a", "b", "c", "d", "e"]
                .into_iter()
                .map(|id| (id, doc! { "status": "active" })),
        );
        store
    }

    fn ids<T>(records: &[Record<T>]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_accumulates_pages_until_short_page() {
        let store = five_docs();
        let reader: PagedReader<Item, _> = PagedReader::new(store.clone());

        reader.fetch_accumulating("items", 2, &[]).await;
        assert_eq!(ids(&reader.items()), ["a", "b"]);
        assert!(reader.has_more());
        assert_eq!(reader.phase(), Phase::Success);

        reader.fetch_accumulating("items", 2, &[]).await;
        assert_eq!(ids(&reader.items()), ["a", "b", "c", "d"]);
        assert!(reader.has_more());

        reader.fetch_accumulating("items", 2, &[]).await;
        assert_eq!(ids(&reader.items()), ["a", "b", "c", "d", "e"]);
        assert!(!reader.has_more());
        assert_eq!(reader.cursor().as_ref().map(Cursor::id), Some("e"));

        reader.fetch_accumulating("items", 2, &[]).await;
        assert_eq!(reader.items().len(), 5);
        assert_eq!(store.query_count(), 3);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_one_empty_page() {
        let store = MemoryStore::new();
        store.insert_many("items", [("a", doc! {}), ("b", doc! {})]);
        let reader: PagedReader<Document, _> = PagedReader::new(store.clone());

        reader.fetch_accumulating("items", 2, &[]).await;
        assert!(reader.has_more());

        reader.fetch_accumulating("items", 2, &[]).await;
        assert!(!reader.has_more());
        assert_eq!(reader.items().len(), 2);
        assert_eq!(reader.cursor().as_ref().map(Cursor::id), Some("b"));
        assert_eq!(reader.phase(), Phase::Success);
    }

    #[tokio::test]
    async fn test_failure_keeps_accumulated_items() {
        let store = five_docs();
        let reader: PagedReader<Item, _> = PagedReader::new(store.clone());

        reader.fetch_accumulating("items", 2, &[]).await;
        store.fail_next(StoreError::PermissionDenied("rules".into()));
        reader.fetch_accumulating("items", 2, &[]).await;

        assert_eq!(reader.phase(), Phase::Error);
        assert!(matches!(
            reader.error().as_deref(),
            Some(PagerError::Store(StoreError::PermissionDenied(_)))
        ));
        assert_eq!(ids(&reader.items()), ["a", "b"]);
        assert!(reader.has_more());
        assert_eq!(reader.cursor().as_ref().map(Cursor::id), Some("b"));

        // Retrying the same call resumes from the same position.
        reader.fetch_accumulating("items", 2, &[]).await;
        assert_eq!(reader.phase(), Phase::Success);
        assert!(reader.error().is_none());
        assert_eq!(ids(&reader.items()), ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_decode_failure_is_reported_in_state() {
        let store = MemoryStore::new();
        store.insert("items", "a", doc! { "status": 5 });
        let reader: PagedReader<Item, _> = PagedReader::new(store);

        reader.fetch_accumulating("items", 2, &[]).await;
        assert_eq!(reader.phase(), Phase::Error);
        assert!(matches!(
            reader.error().as_deref(),
            Some(PagerError::Decode(_))
        ));
        assert!(reader.items().is_empty());
        assert!(reader.has_more());
    }

    #[tokio::test]
    async fn test_zero_page_size_never_queries() {
        let store = five_docs();
        let reader: PagedReader<Item, _> = PagedReader::new(store.clone());

        reader.fetch_accumulating("items", 0, &[]).await;
        assert_eq!(reader.phase(), Phase::Error);
        assert!(matches!(
            reader.error().as_deref(),
            Some(PagerError::Execution(ExecutionError::InvalidPageSize(0)))
        ));

        let result = reader
            .fetch_page::<Item>(PageRequest::new("items").page_size(0))
            .await;
        assert!(result.is_err());
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_filters_apply_to_accumulating_reads() {
        let store = MemoryStore::new();
        store.insert_many(
            "items",
            [
                ("a", doc! { "status": "active" }),
                ("b", doc! { "status": "idle" }),
                ("c", doc! { "status": "active" }),
            ],
        );
        let reader: PagedReader<Item, _> = PagedReader::new(store);

        reader
            .fetch_accumulating("items", 5, &[Filter::eq("status", "active")])
            .await;
        assert_eq!(ids(&reader.items()), ["a", "c"]);
        assert!(!reader.has_more());
    }

    #[tokio::test]
    async fn test_fetch_page_returns_cursor_of_last_record() {
        let store = MemoryStore::new();
        store.insert_many(
            "users",
            [
                ("u1", doc! { "status": "active" }),
                ("u2", doc! { "status": "banned" }),
                ("u3", doc! { "status": "active" }),
                ("u4", doc! { "status": "active" }),
            ],
        );
        let reader: PagedReader<Document, _> = PagedReader::new(store);

        let page = reader
            .fetch_page::<Item>(
                PageRequest::new("users").filter(Filter::eq("status", "active")),
            )
            .await
            .unwrap();

        assert_eq!(page.len(), 3);
        assert_eq!(ids(&page.data), ["u1", "u3", "u4"]);
        assert_eq!(page.next_cursor.as_ref().map(Cursor::id), Some("u4"));
    }

    #[tokio::test]
    async fn test_fetch_page_follows_cursor_and_is_repeatable() {
        let store = five_docs();
        let reader: PagedReader<Item, _> = PagedReader::new(store);

        let first = reader
            .fetch_page::<Item>(PageRequest::new("items").page_size(3))
            .await
            .unwrap();
        let again = reader
            .fetch_page::<Item>(PageRequest::new("items").page_size(3))
            .await
            .unwrap();
        assert_eq!(first, again);

        let second = reader
            .fetch_page::<Item>(
                PageRequest::new("items")
                    .page_size(3)
                    .after(first.next_cursor.clone()),
            )
            .await
            .unwrap();
        assert_eq!(ids(&second.data), ["d", "e"]);

        let third = reader
            .fetch_page::<Item>(
                PageRequest::new("items")
                    .page_size(3)
                    .after(second.next_cursor.clone()),
            )
            .await
            .unwrap();
        assert!(third.is_empty());
        assert!(third.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_fetch_page_leaves_state_untouched() {
        let store = five_docs();
        let reader: PagedReader<Item, _> = PagedReader::new(store.clone());
        let rx = reader.subscribe();

        reader
            .fetch_page::<Item>(PageRequest::new("items"))
            .await
            .unwrap();
        store.fail_next(StoreError::Unavailable("offline".into()));
        let err = reader
            .fetch_page::<Item>(PageRequest::new("items"))
            .await
            .unwrap_err();

        assert!(matches!(err, PagerError::Store(StoreError::Unavailable(_))));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(reader.phase(), Phase::Loading);
        assert!(reader.items().is_empty());
        assert!(reader.error().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_observe_fetches() {
        let store = five_docs();
        let reader: PagedReader<Item, _> = PagedReader::new(store);
        let mut rx = reader.subscribe();

        reader.fetch_accumulating("items", 2, &[]).await;
        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.phase, Phase::Success);
    }

    #[tokio::test]
    async fn test_reset_restores_initial_state() {
        let store = five_docs();
        let reader: PagedReader<Item, _> = PagedReader::new(store);

        for _ in 0..3 {
            reader.fetch_accumulating("items", 2, &[]).await;
        }
        assert!(!reader.has_more());

        reader.reset();
        assert!(reader.items().is_empty());
        assert!(reader.has_more());
        assert!(reader.cursor().is_none());
        assert_eq!(reader.phase(), Phase::Loading);

        reader.fetch_accumulating("items", 2, &[]).await;
        assert_eq!(ids(&reader.items()), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_overlapping_fetches_share_the_same_cursor() {
        let store = five_docs();
        let reader: PagedReader<Item, _> = PagedReader::new(GatedStore {
            inner: store.clone(),
            gate: Barrier::new(2),
        });

        tokio::join!(
            reader.fetch_accumulating("items", 2, &[]),
            reader.fetch_accumulating("items", 2, &[])
        );

        assert_eq!(ids(&reader.items()), ["a", "b", "a", "b"]);
        assert_eq!(reader.cursor().as_ref().map(Cursor::id), Some("b"));
        assert!(reader.has_more());
        assert_eq!(reader.phase(), Phase::Success);
        assert_eq!(store.query_count(), 2);
    }

    #[test]
    fn test_page_request_defaults() {
        let request = PageRequest::new("users");
        assert_eq!(request.page_size, DEFAULT_PAGE_SIZE);
        assert!(request.filters.is_empty());
        assert!(request.cursor.is_none());
    }
}
