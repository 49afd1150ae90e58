//! docpager
//!
//! Cursor-paginated reads over document collections. A [`PagedReader`] offers
//! two read modes over a [`DocumentStore`](store::DocumentStore):
//! - a stateful reader that accumulates pages into observable state
//! - a stateless fetch that returns one page and the cursor for the next
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: MongoDB connection management
//! - `error`: Error types and handling
//! - `formatter`: Output formatting of records
//! - `query`: Filters and page queries
//! - `reader`: Paginated readers and their observable state
//! - `record`: Records, cursors and pages
//! - `store`: Document store backends (MongoDB, in-memory)
//!
//! # Example
//!
//! ```no_run
//! use docpager::{ConnectionManager, PagedReader, config::Config};
//! use docpager::query::Filter;
//! use docpager::reader::PageRequest;
//! use docpager::store::MongoStore;
//! use bson::Document;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let mut manager = ConnectionManager::new(
//!         "mongodb://localhost:27017".to_string(),
//!         config.connection,
//!     );
//!     manager.connect().await?;
//!
//!     let reader: PagedReader<Document, _> =
//!         PagedReader::new(MongoStore::new(manager.database("shop")?));
//!     let page = reader
//!         .fetch_page::<Document>(
//!             PageRequest::new("users").filter(Filter::eq("status", "active")),
//!         )
//!         .await?;
//!     println!("{} users, next: {:?}", page.len(), page.next_cursor);
//!
//!     manager.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod formatter;
pub mod query;
pub mod reader;
pub mod record;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use connection::ConnectionManager;
pub use error::{PagerError, Result, StoreError};
pub use query::{Filter, FilterOp};
pub use reader::{PageRequest, PagedReader, Phase, ReadState};
pub use record::{Cursor, Page, Record};
pub use store::{DocumentStore, MemoryStore, MongoStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
