//! In-process document store
//!
//! Collections live in memory, keyed and ordered by string id. Filters are
//! evaluated with MongoDB-like comparison semantics so readers can be
//! exercised without a server. Failures can be injected per query.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bson::{Bson, Document};
use tracing::debug;

use super::DocumentStore;
use crate::error::StoreError;
use crate::query::{Filter, FilterOp, PageQuery};
use crate::record::RawDocument;

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Document>>,
    pending_failures: VecDeque<StoreError>,
    queries: usize,
}

/// Cloneable handle to a shared in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the document with `id` in `collection`.
    pub fn insert(&self, collection: &str, id: impl Into<String>, document: Document) {
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.into(), document);
    }

    /// Insert several `(id, document)` pairs into `collection`.
    pub fn insert_many<I, K>(&self, collection: &str, documents: I)
    where
        I: IntoIterator<Item = (K, Document)>,
        K: Into<String>,
    {
        let mut inner = self.lock();
        let coll = inner.collections.entry(collection.to_string()).or_default();
        for (id, document) in documents {
            coll.insert(id.into(), document);
        }
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Make the next query fail with `error`. Queued failures are consumed
    /// one per query, in order.
    pub fn fail_next(&self, error: StoreError) {
        self.lock().pending_failures.push_back(error);
    }

    /// Number of queries executed so far, failed ones included.
    pub fn query_count(&self) -> usize {
        self.lock().queries
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the maps intact.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn run_query(&self, query: &PageQuery) -> Result<Vec<RawDocument>, StoreError> {
        let mut inner = self.lock();
        inner.queries += 1;

        if let Some(error) = inner.pending_failures.pop_front() {
            debug!("Injected failure for query on '{}'", query.collection);
            return Err(error);
        }

        let Some(coll) = inner.collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let after = query
            .start_after
            .as_ref()
            .map(|cursor| key_as_id(cursor.key()));

        let page = coll
            .iter()
            .filter(|(id, _)| after.as_deref().is_none_or(|after| id.as_str() > after))
            .filter(|(_, document)| query.filters.iter().all(|f| matches(document, f)))
            .take(query.limit as usize)
            .map(|(id, document)| RawDocument {
                id: id.clone(),
                key: Bson::String(id.clone()),
                data: document.clone(),
            })
            .collect::<Vec<_>>();

        debug!(
            "Memory query on '{}' returned {} document(s)",
            query.collection,
            page.len()
        );
        Ok(page)
    }
}

fn key_as_id(key: &Bson) -> String {
    match key {
        Bson::String(s) => s.clone(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

/// Resolve a dotted path such as `address.city`.
fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Scalar operators match an array field when the whole array or any of its
/// elements matches, as MongoDB does. `!=` and `not-in` are the negations.
fn matches(document: &Document, filter: &Filter) -> bool {
    let field = lookup(document, &filter.field);
    let value = &filter.value;
    let equal = |candidate: &Bson| values_equal(candidate, value);
    let member = |candidate: &Bson| list(value).iter().any(|v| values_equal(candidate, v));

    match filter.op {
        FilterOp::Eq => field.is_some_and(|f| any_value(f, equal)),
        FilterOp::Ne => !field.is_some_and(|f| any_value(f, equal)),
        FilterOp::Lt => ordered(field, value, |o| o == Ordering::Less),
        FilterOp::Lte => ordered(field, value, |o| o != Ordering::Greater),
        FilterOp::Gt => ordered(field, value, |o| o == Ordering::Greater),
        FilterOp::Gte => ordered(field, value, |o| o != Ordering::Less),
        FilterOp::In => field.is_some_and(|f| any_value(f, member)),
        FilterOp::NotIn => !field.is_some_and(|f| any_value(f, member)),
        FilterOp::ArrayContains => match field {
            Some(Bson::Array(items)) => items.iter().any(equal),
            _ => false,
        },
        FilterOp::ArrayContainsAny => match field {
            Some(Bson::Array(items)) => items.iter().any(member),
            _ => false,
        },
    }
}

fn any_value(field: &Bson, predicate: impl Fn(&Bson) -> bool) -> bool {
    if predicate(field) {
        return true;
    }
    match field {
        Bson::Array(items) => items.iter().any(predicate),
        _ => false,
    }
}

fn ordered(field: Option<&Bson>, value: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    field.is_some_and(|f| any_value(f, |candidate| compare(candidate, value).is_some_and(&accept)))
}

fn list(value: &Bson) -> &[Bson] {
    match value {
        Bson::Array(items) => items,
        _ => &[],
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Order two values of the same kind; numbers compare across widths.
/// Values of different kinds are not comparable.
fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.cmp(y)),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match compare(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}
