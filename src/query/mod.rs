//! Query construction for paginated reads
//!
//! A [`PageQuery`] is the single query shape handed to a store: a collection,
//! a conjunctive list of [`Filter`]s, a result limit and an optional cursor to
//! resume after. Results are ordered by store key ascending.

pub mod filter;

use bson::{Bson, Document, doc};

use crate::record::Cursor;

pub use filter::{Filter, FilterOp};

/// Store key field, also the sort key for pagination.
pub const ID_FIELD: &str = "_id";

/// Page size used when a stateless request does not set one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A bounded, resumable query against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    /// Collection name
    pub collection: String,

    /// Conjunctive filters
    pub filters: Vec<Filter>,

    /// Maximum number of documents to return
    pub limit: u32,

    /// Resume after this record
    pub start_after: Option<Cursor>,
}

impl PageQuery {
    pub fn new(collection: impl Into<String>, limit: u32) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            limit,
            start_after: None,
        }
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn with_start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.start_after = cursor;
        self
    }

    /// Build the MongoDB filter document for this query.
    ///
    /// Each filter becomes its own clause, plus one `_id > key` clause when
    /// resuming after a cursor. Two or more clauses are wrapped in `$and` so
    /// repeated fields keep all of their constraints.
    ///
    /// MongoDB only matches `$gt` against keys of the cursor key's BSON type.
    /// In a collection with mixed `_id` types, pagination ends at the last
    /// key of the first type.
    pub fn to_mongo_filter(&self) -> Document {
        let mut clauses: Vec<Document> = self.filters.iter().map(filter_clause).collect();

        if let Some(cursor) = &self.start_after {
            clauses.push(doc! { "_id": { "$gt": cursor.key().clone() } });
        }

        match clauses.len() {
            0 => Document::new(),
            1 => clauses.remove(0),
            _ => doc! {
                "$and": clauses.into_iter().map(Bson::Document).collect::<Vec<_>>()
            },
        }
    }

    /// Sort document matching the cursor semantics.
    pub fn mongo_sort() -> Document {
        doc! { "_id": 1 }
    }
}

/// Translate one filter into a MongoDB query clause.
fn filter_clause(filter: &Filter) -> Document {
    let field = filter.field.as_str();
    let value = filter.value.clone();

    let condition = match filter.op {
        FilterOp::Eq => doc! { "$eq": value },
        FilterOp::Ne => doc! { "$ne": value },
        FilterOp::Lt => doc! { "$lt": value },
        FilterOp::Lte => doc! { "$lte": value },
        FilterOp::Gt => doc! { "$gt": value },
        FilterOp::Gte => doc! { "$gte": value },
        FilterOp::In => doc! { "$in": value },
        FilterOp::NotIn => doc! { "$nin": value },
        FilterOp::ArrayContains => doc! { "$elemMatch": { "$eq": value } },
        FilterOp::ArrayContainsAny => doc! { "$elemMatch": { "$in": value } },
    };

    let mut clause = Document::new();
    clause.insert(field, condition);
    clause
}
