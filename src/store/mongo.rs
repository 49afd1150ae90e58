//! MongoDB-backed document store

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::Document;
use mongodb::{Collection, Database};
use tracing::debug;

use super::DocumentStore;
use crate::error::{StoreError, classify};
use crate::query::{ID_FIELD, PageQuery};
use crate::record::{RawDocument, key_to_id};

/// Document store reading from one MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Create a store over an open database handle
    ///
    /// # Arguments
    /// * `database` - Database handle from a connected client
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Name of the database queries run against
    pub fn database_name(&self) -> &str {
        self.database.name()
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn run_query(&self, query: &PageQuery) -> Result<Vec<RawDocument>, StoreError> {
        let filter = query.to_mongo_filter();
        debug!(
            "Executing page query on collection '{}' with filter: {:?}, limit: {}",
            query.collection, filter, query.limit
        );

        let coll: Collection<Document> = self.database.collection(&query.collection);

        let mut find_options = mongodb::options::FindOptions::default();
        find_options.sort = Some(PageQuery::mongo_sort());
        find_options.limit = Some(i64::from(query.limit));

        let cursor = coll
            .find(filter)
            .with_options(find_options)
            .await
            .map_err(classify)?;
        let documents: Vec<Document> = cursor.try_collect().await.map_err(classify)?;

        documents.into_iter().map(into_raw_document).collect()
    }
}

/// Split the key off a fetched document.
fn into_raw_document(mut document: Document) -> Result<RawDocument, StoreError> {
    let key = document.remove(ID_FIELD).ok_or_else(|| {
        StoreError::MalformedDocument(format!("document has no '{ID_FIELD}' field"))
    })?;

    Ok(RawDocument {
        id: key_to_id(&key),
        key,
        data: document,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{Bson, doc, oid::ObjectId};

    #[test]
    fn test_into_raw_document_strips_id() {
        let oid = ObjectId::new();
        let raw = into_raw_document(doc! { "_id": oid, "name": "Ada" }).unwrap();
        assert_eq!(raw.id, oid.to_hex());
        assert_eq!(raw.key, Bson::ObjectId(oid));
        assert_eq!(raw.data, doc! { "name": "Ada" });
    }

    #[test]
    fn test_into_raw_document_requires_id() {
        let err = into_raw_document(doc! { "name": "Ada" }).unwrap_err();
        assert!(matches!(err, StoreError::MalformedDocument(_)));
    }
}
