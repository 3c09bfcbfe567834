//! Error types for the moderator dashboard

use std::{error::Error as StdError, fmt};

/// Main error type shared by the store, API and dashboard
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Configuration error
    Configuration {
        /// Error message
        message: String,
    },

    /// Validation error
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// The backing record store could not be opened or queried
    StorageUnavailable {
        /// Driver or filesystem message
        message: String,
    },

    /// Not found error
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// A caller-supplied value could not be parsed
    MalformedInput {
        /// Parameter that was malformed
        field: String,
        /// Why it was rejected
        message: String,
    },

    /// Transport failure or unexpected response from the Query API
    NetworkFailure {
        /// Failure message
        message: String,
    },

    /// Serialization error
    Serialization(serde_json::Error),

    /// Other error
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for [`Error::StorageUnavailable`]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::MalformedInput`]
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NetworkFailure`]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            message: message.into(),
        }
    }

    /// Whether the error came from the record store
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::Validation { field, message } => {
                write!(f, "Validation error: {field} - {message}")
            }
            Self::StorageUnavailable { message } => write!(f, "Storage unavailable: {message}"),
            Self::NotFound { resource } => write!(f, "Resource not found: {resource}"),
            Self::MalformedInput { field, message } => {
                write!(f, "Malformed input: {field} - {message}")
            }
            Self::NetworkFailure { message } => write!(f, "Network failure: {message}"),
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(ToString::to_string))
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("record".to_string(), errors.to_string()));

        Self::Validation { field, message }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
#[allow(clippy::uninlined_format_args)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let app_error = Error::from(io_error);

        assert!(matches!(app_error, Error::Io(_)));
        assert!(format!("{}", app_error).contains("I/O error"));
        assert!(app_error.source().is_some());
    }

    #[test]
    fn test_storage_unavailable_display() {
        let error = Error::storage("unable to open database file");

        assert!(error.is_storage());
        assert_eq!(
            error.to_string(),
            "Storage unavailable: unable to open database file"
        );
    }

    #[test]
    fn test_malformed_input_display() {
        let error = Error::malformed("id", "must be a positive integer");
        assert_eq!(
            error.to_string(),
            "Malformed input: id - must be a positive integer"
        );
        assert!(!error.is_storage());
    }

    #[test]
    fn test_not_found_display() {
        let error = Error::NotFound {
            resource: "Moderator 99".to_string(),
        };
        assert_eq!(error.to_string(), "Resource not found: Moderator 99");
    }

    #[test]
    fn test_network_failure_display() {
        let error = Error::network("connection refused");
        assert_eq!(error.to_string(), "Network failure: connection refused");
    }

    #[test]
    fn test_serialization_error_source() {
        let json_error = serde_json::from_str::<serde_json::Value>("{oops}").unwrap_err();
        let app_error = Error::from(json_error);

        assert!(matches!(app_error, Error::Serialization(_)));
        assert!(app_error.source().is_some());
    }

    #[test]
    fn test_error_source_for_plain_variants() {
        let errors = vec![
            Error::Configuration {
                message: "test".to_string(),
            },
            Error::storage("test"),
            Error::malformed("metric", "test"),
            Error::Other("test".to_string()),
        ];

        for error in errors {
            assert!(error.source().is_none(), "{error} should have no source");
        }
    }

    #[test]
    fn test_validation_errors_conversion() {
        use validator::Validate;

        #[derive(Validate)]
        struct Named {
            #[validate(length(min = 1, message = "name must not be empty"))]
            name: String,
        }

        let errors = Named {
            name: String::new(),
        }
        .validate()
        .unwrap_err();

        match Error::from(errors) {
            Error::Validation { field, message } => {
                assert_eq!(field, "name");
                assert_eq!(message, "name must not be empty");
            }
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
