use std::{fmt, io};

use crate::error::mongo::format_mongodb_error;

/// Crate-wide `Result` type using [`PagerError`] as the error.
pub type Result<T> = std::result::Result<T, PagerError>;

/// Top-level error type for docpager operations.
#[derive(Debug)]
pub enum PagerError {
    /// Failure reported by the document store.
    Store(StoreError),

    /// A stored document could not be decoded into the requested record shape.
    Decode(String),

    /// Connection-related errors.
    Connection(ConnectionError),

    /// Invalid read parameters.
    Execution(ExecutionError),

    /// Filter or argument parsing errors.
    Parse(ParseError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Failures surfaced by a [`DocumentStore`](crate::store::DocumentStore).
///
/// The named variants cover the failure kinds callers usually branch on.
/// Anything the driver reports that does not fit one of them is carried
/// untouched in [`StoreError::Driver`].
#[derive(Debug)]
pub enum StoreError {
    /// The store could not be reached (server selection, network, pool).
    Unavailable(String),

    /// The caller is not allowed to read the collection.
    PermissionDenied(String),

    /// The store rejected the query (bad operator value, malformed filter).
    InvalidQuery(String),

    /// The query exceeded the store's time limit.
    Timeout(String),

    /// The collection or database does not exist.
    NamespaceNotFound(String),

    /// A returned document lacks the fields needed to build a record.
    MalformedDocument(String),

    /// Unclassified MongoDB driver error.
    Driver(mongodb::error::Error),
}

/// Connection-specific errors.
#[derive(Debug)]
pub enum ConnectionError {
    /// Failed to establish a connection.
    ConnectionFailed(String),

    /// Invalid connection URI.
    InvalidUri(String),

    /// Not currently connected to MongoDB.
    NotConnected,

    /// Ping command failed.
    PingFailed(String),
}

/// Errors in the parameters of a read.
#[derive(Debug)]
pub enum ExecutionError {
    /// Page size must be at least one.
    InvalidPageSize(u32),

    /// Invalid operation parameters.
    InvalidParameters(String),
}

/// Parsing-specific errors.
#[derive(Debug)]
pub enum ParseError {
    /// Operator token is not one of the supported comparison operators.
    UnknownOperator(String),

    /// Filter expression is not of the form `FIELD OP VALUE`.
    InvalidFilter(String),

    /// A filter value could not be represented as BSON.
    InvalidValue(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required field.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for PagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagerError::Store(e) => write!(f, "Store error: {e}"),
            PagerError::Decode(msg) => write!(f, "Decode error: {msg}"),
            PagerError::Connection(e) => write!(f, "Connection error: {e}"),
            PagerError::Execution(e) => write!(f, "Execution error: {e}"),
            PagerError::Parse(e) => write!(f, "{e}"),
            PagerError::Config(e) => write!(f, "Configuration error: {e}"),
            PagerError::Io(e) => write!(f, "I/O error: {e}"),
            PagerError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
            StoreError::PermissionDenied(msg) => write!(f, "Permission denied: {msg}"),
            StoreError::InvalidQuery(msg) => write!(f, "Invalid query: {msg}"),
            StoreError::Timeout(msg) => write!(f, "Query timed out: {msg}"),
            StoreError::NamespaceNotFound(ns) => write!(f, "Namespace not found: {ns}"),
            StoreError::MalformedDocument(msg) => write!(f, "Malformed document: {msg}"),
            StoreError::Driver(e) => format_mongodb_error(f, e),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::InvalidUri(uri) => write!(f, "Invalid connection URI: {uri}"),
            ConnectionError::NotConnected => write!(f, "Not connected to MongoDB"),
            ConnectionError::PingFailed(msg) => write!(f, "Ping failed: {msg}"),
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::InvalidPageSize(size) => {
                write!(f, "Invalid page size {size}: must be greater than zero")
            }
            ExecutionError::InvalidParameters(msg) => write!(f, "Invalid parameters: {msg}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownOperator(op) => write!(f, "Unknown filter operator: '{op}'"),
            ParseError::InvalidFilter(expr) => {
                write!(f, "Invalid filter '{expr}': expected FIELD OP VALUE")
            }
            ParseError::InvalidValue(msg) => write!(f, "Invalid filter value: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for PagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PagerError::Store(e) => Some(e),
            PagerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Driver(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConnectionError {}
impl std::error::Error for ExecutionError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to PagerError ========================= */

impl From<io::Error> for PagerError {
    fn from(err: io::Error) -> Self {
        PagerError::Io(err)
    }
}

impl From<StoreError> for PagerError {
    fn from(err: StoreError) -> Self {
        PagerError::Store(err)
    }
}

impl From<mongodb::error::Error> for PagerError {
    fn from(err: mongodb::error::Error) -> Self {
        PagerError::Store(crate::error::mongo::classify(err))
    }
}

impl From<bson::de::Error> for PagerError {
    fn from(err: bson::de::Error) -> Self {
        PagerError::Decode(err.to_string())
    }
}

impl From<ConnectionError> for PagerError {
    fn from(err: ConnectionError) -> Self {
        PagerError::Connection(err)
    }
}

impl From<ExecutionError> for PagerError {
    fn from(err: ExecutionError) -> Self {
        PagerError::Execution(err)
    }
}

impl From<ParseError> for PagerError {
    fn from(err: ParseError) -> Self {
        PagerError::Parse(err)
    }
}

impl From<ConfigError> for PagerError {
    fn from(err: ConfigError) -> Self {
        PagerError::Config(err)
    }
}

impl From<String> for PagerError {
    fn from(msg: String) -> Self {
        PagerError::Generic(msg)
    }
}

impl From<&str> for PagerError {
    fn from(msg: &str) -> Self {
        PagerError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::PermissionDenied("read on users".into());
        assert_eq!(err.to_string(), "Permission denied: read on users");

        let wrapped: PagerError = err.into();
        assert_eq!(
            wrapped.to_string(),
            "Store error: Permission denied: read on users"
        );
    }

    #[test]
    fn test_page_size_error_display() {
        let err: PagerError = ExecutionError::InvalidPageSize(0).into();
        assert!(err.to_string().contains("must be greater than zero"));
    }

    #[test]
    fn test_store_error_is_source() {
        use std::error::Error;

        let err: PagerError = StoreError::Unavailable("offline".into()).into();
        assert!(err.source().is_some());
    }
}
