use std::fmt;

use serde::{Deserialize, Serialize};

use super::kinds::StoreError;

/// Structured error information extracted from MongoDB errors.
///
/// This is intended to be serialized to JSON and consumed by logging.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub(crate) error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
}

impl ErrorInfo {
    /// Convert error info to pretty-printed JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Convert error info to compact JSON string (single line).
    pub fn to_json_compact(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Format a driver error as pretty JSON wrapped in an `error` field.
///
/// Used by the `Display` implementation of [`StoreError::Driver`].
pub fn format_mongodb_error(
    f: &mut fmt::Formatter<'_>,
    error: &mongodb::error::Error,
) -> fmt::Result {
    let info = extract_error_info(error);
    let wrapper = serde_json::json!({ "error": info });
    let json_output = serde_json::to_string_pretty(&wrapper).map_err(|_| fmt::Error)?;
    write!(f, "\n{json_output}")
}

/// Extract structured information from a MongoDB error using the driver API.
pub fn extract_error_info(error: &mongodb::error::Error) -> ErrorInfo {
    use mongodb::error::ErrorKind;

    let mut info = ErrorInfo::default();

    match error.kind.as_ref() {
        ErrorKind::Command(command_error) => {
            info.error_type = Some("mongo.command_error".to_string());
            info.code = Some(command_error.code);
            info.message = Some(command_error.message.clone());
            info.name = get_error_name(command_error.code);
        }
        ErrorKind::Authentication { message, .. } => {
            info.error_type = Some("mongo.authentication_error".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::InvalidArgument { message, .. } => {
            info.error_type = Some("mongo.invalid_argument".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::ServerSelection { message, .. } => {
            info.error_type = Some("mongo.server_selection_error".to_string());
            info.message = Some(message.clone());
        }
        _ => {
            info.message = Some(error.to_string());
        }
    }

    info
}

/// Sort a driver error into one of the known [`StoreError`] kinds.
///
/// Errors that match none of the known kinds are kept whole in
/// [`StoreError::Driver`].
pub fn classify(error: mongodb::error::Error) -> StoreError {
    use mongodb::error::ErrorKind;

    match error.kind.as_ref() {
        ErrorKind::Authentication { message, .. } => {
            StoreError::PermissionDenied(message.clone())
        }
        ErrorKind::ServerSelection { message, .. }
        | ErrorKind::ConnectionPoolCleared { message, .. } => {
            StoreError::Unavailable(message.clone())
        }
        ErrorKind::Io(io_err) => StoreError::Unavailable(io_err.to_string()),
        ErrorKind::InvalidArgument { message, .. } => StoreError::InvalidQuery(message.clone()),
        ErrorKind::Command(command_error) => match classify_code(command_error.code) {
            Some(CodeClass::Unauthorized) => {
                StoreError::PermissionDenied(command_error.message.clone())
            }
            Some(CodeClass::BadQuery) => StoreError::InvalidQuery(command_error.message.clone()),
            Some(CodeClass::TimeLimit) => StoreError::Timeout(command_error.message.clone()),
            Some(CodeClass::Namespace) => {
                StoreError::NamespaceNotFound(command_error.message.clone())
            }
            None => StoreError::Driver(error),
        },
        _ => StoreError::Driver(error),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeClass {
    Unauthorized,
    BadQuery,
    TimeLimit,
    Namespace,
}

fn classify_code(code: i32) -> Option<CodeClass> {
    match code {
        13 | 18 => Some(CodeClass::Unauthorized),
        2 | 9 => Some(CodeClass::BadQuery),
        50 => Some(CodeClass::TimeLimit),
        26 => Some(CodeClass::Namespace),
        _ => None,
    }
}

/// Get a human-readable error name from a MongoDB error code.
fn get_error_name(code: i32) -> Option<String> {
    let name = match code {
        2 => "BadValue",
        9 => "FailedToParse",
        13 => "Unauthorized",
        18 => "AuthenticationFailed",
        26 => "NamespaceNotFound",
        50 => "MaxTimeMSExpired",
        _ => return None,
    };

    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names() {
        assert_eq!(get_error_name(13).as_deref(), Some("Unauthorized"));
        assert_eq!(get_error_name(50).as_deref(), Some("MaxTimeMSExpired"));
        assert_eq!(get_error_name(12345), None);
    }

    #[test]
    fn test_code_classes() {
        assert_eq!(classify_code(13), Some(CodeClass::Unauthorized));
        assert_eq!(classify_code(2), Some(CodeClass::BadQuery));
        assert_eq!(classify_code(26), Some(CodeClass::Namespace));
        assert_eq!(classify_code(11000), None);
    }

    #[test]
    fn test_error_info_skips_empty_fields() {
        let info = ErrorInfo {
            message: Some("boom".into()),
            ..Default::default()
        };
        assert_eq!(info.to_json_compact().unwrap(), r#"{"message":"boom"}"#);
    }
}
