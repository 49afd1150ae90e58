//! Error handling for paginated reads.
//!
//! This module provides:
//! - A crate-wide [`PagerError`] and `Result` alias
//! - [`StoreError`], the tagged union of failures a document store can report
//! - Classification of MongoDB driver errors into store failure kinds
//!
//! # Example
//!
//! ```rust,no_run
//! use docpager::error::{PagerError, StoreError};
//!
//! fn describe(err: &PagerError) -> &'static str {
//!     match err {
//!         PagerError::Store(StoreError::PermissionDenied(_)) => "not allowed",
//!         PagerError::Store(StoreError::Unavailable(_)) => "offline",
//!         _ => "other",
//!     }
//! }
//! ```

pub mod kinds;
pub mod mongo;

pub use kinds::{
    ConfigError, ConnectionError, ExecutionError, PagerError, ParseError, Result, StoreError,
};
pub use mongo::{ErrorInfo, classify};
