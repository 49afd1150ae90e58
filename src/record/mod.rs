//! Typed records, pagination cursors and pages.
//!
//! A [`Record`] pairs the store-assigned identifier with the caller's data.
//! A [`Cursor`] marks the last record of a page so the next query can resume
//! after it. A [`Page`] is one bounded batch of records plus that cursor.

use std::fmt;
use std::ops::Deref;

use bson::oid::ObjectId;
use bson::{Bson, Document};
use serde::de::DeserializeOwned;
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};

use crate::error::Result;

/// Store document decorated with its identifier.
///
/// `data` never contains the identifier field of the underlying store.
/// Serializes as one flat map: `id` first, then the fields of `data`, where
/// an `id` field of `data` is replaced by the record id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    /// Store-assigned document identifier
    pub id: String,

    /// Decoded document body
    pub data: T,
}

impl<T> Record<T> {
    pub fn new(id: impl Into<String>, data: T) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Consume the record and return its data.
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: Serialize> Serialize for Record<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let body = bson::to_document(&self.data).map_err(S::Error::custom)?;
        let field_count = body.keys().filter(|key| key.as_str() != "id").count();
        let fields = body.iter().filter(|(key, _)| key.as_str() != "id");

        let mut map = serializer.serialize_map(Some(field_count + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

/// Opaque pagination marker meaning "resume after this record".
///
/// Holds the record's identifier together with the raw store key used to
/// position the next query.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    id: String,
    key: Bson,
}

impl Cursor {
    /// Build a cursor from a record identifier and its raw store key.
    ///
    /// Intended for [`DocumentStore`](crate::store::DocumentStore)
    /// implementations; readers obtain cursors from fetched pages.
    pub fn new(id: impl Into<String>, key: Bson) -> Self {
        Self { id: id.into(), key }
    }

    /// Rebuild a cursor from an identifier string.
    ///
    /// A 24 character hex string is read as an `ObjectId` key, anything else
    /// as a string key. Use [`Cursor::from_string_id`] for string ids that
    /// look like an `ObjectId`.
    pub fn from_id_str(id: &str) -> Self {
        let key = match ObjectId::parse_str(id) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => Bson::String(id.to_string()),
        };
        Self::new(id, key)
    }

    /// Rebuild a cursor for a string key, whatever its shape.
    pub fn from_string_id(id: &str) -> Self {
        Self::new(id, Bson::String(id.to_string()))
    }

    /// Identifier of the record this cursor points at.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw store key of the record this cursor points at.
    pub fn key(&self) -> &Bson {
        &self.key
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// One page of a stateless read.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<U> {
    /// Records in store key order
    pub data: Vec<Record<U>>,

    /// Cursor of the last record, `None` when the page is empty
    pub next_cursor: Option<Cursor>,
}

impl<U> Page<U> {
    /// Number of records in the page.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Document as returned by a store, before decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Identifier rendered as a string
    pub id: String,

    /// Raw store key, used to resume after this document
    pub key: Bson,

    /// Document body without the identifier field
    pub data: Document,
}

impl RawDocument {
    /// Cursor pointing at this document.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.id.clone(), self.key.clone())
    }

    /// Decode the body into `T` and attach the identifier.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Record<T>> {
        let data = bson::from_document::<T>(self.data)?;
        Ok(Record { id: self.id, data })
    }
}

/// Render a store key as a record identifier.
///
/// `ObjectId` keys become their hex form and strings are used verbatim.
/// Other key types fall back to relaxed extended JSON.
pub fn key_to_id(key: &Bson) -> String {
    match key {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        other => other.clone().into_relaxed_extjson().to_string(),
    }
}

/// Decode a batch of raw documents, returning the records and the cursor of
/// the last one.
pub(crate) fn decode_batch<T: DeserializeOwned>(
    docs: Vec<RawDocument>,
) -> Result<(Vec<Record<T>>, Option<Cursor>)> {
    let last = docs.last().map(RawDocument::cursor);
    let records = docs
        .into_iter()
        .map(RawDocument::decode)
        .collect::<Result<Vec<_>>>()?;
    Ok((records, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: i32,
    }

    #[test]
    fn test_key_to_id() {
        let oid = ObjectId::new();
        assert_eq!(key_to_id(&Bson::ObjectId(oid)), oid.to_hex());
        assert_eq!(key_to_id(&Bson::String("u1".into())), "u1");
        assert_eq!(key_to_id(&Bson::Int64(42)), "42");
    }

    #[test]
    fn test_cursor_from_id_str() {
        let oid = ObjectId::new();
        let cursor = Cursor::from_id_str(&oid.to_hex());
        assert_eq!(cursor.key(), &Bson::ObjectId(oid));

        let cursor = Cursor::from_string_id(&oid.to_hex());
        assert_eq!(cursor.key(), &Bson::String(oid.to_hex()));

        let cursor = Cursor::from_id_str("user-7");
        assert_eq!(cursor.key(), &Bson::String("user-7".into()));
        assert_eq!(cursor.id(), "user-7");
    }

    #[test]
    fn test_decode_attaches_id() {
        let raw = RawDocument {
            id: "u1".into(),
            key: Bson::String("u1".into()),
            data: doc! { "name": "Ada", "age": 36 },
        };
        let record: Record<User> = raw.decode().unwrap();
        assert_eq!(record.id, "u1");
        assert_eq!(record.name, "Ada");
    }

    #[test]
    fn test_decode_failure_is_decode_error() {
        let raw = RawDocument {
            id: "u1".into(),
            key: Bson::String("u1".into()),
            data: doc! { "name": "Ada" },
        };
        let err = raw.decode::<User>().unwrap_err();
        assert!(matches!(err, crate::error::PagerError::Decode(_)));
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = Record::new(
            "u1",
            User {
                name: "Ada".into(),
                age: 36,
            },
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"id": "u1", "name": "Ada", "age": 36}));
    }

    #[test]
    fn test_record_id_replaces_body_id() {
        #[derive(Serialize)]
        struct Tagged {
            id: u32,
            label: &'static str,
        }

        let record = Record::new("u9", Tagged { id: 7, label: "x" });
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"id":"u9","label":"x"}"#
        );
    }

    #[test]
    fn test_decode_batch_cursor_is_last() {
        let docs = vec![
            RawDocument {
                id: "a".into(),
                key: Bson::String("a".into()),
                data: doc! {},
            },
            RawDocument {
                id: "b".into(),
                key: Bson::String("b".into()),
                data: doc! {},
            },
        ];
        let (records, cursor) = decode_batch::<Document>(docs).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(cursor.unwrap().id(), "b");

        let (records, cursor) = decode_batch::<Document>(Vec::new()).unwrap();
        assert!(records.is_empty());
        assert!(cursor.is_none());
    }
}
