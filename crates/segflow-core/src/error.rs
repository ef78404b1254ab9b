use std::fmt;

/// Main error type for segflow
#[derive(Debug)]
pub enum Error {
    /// Configuration errors
    Config(String),

    /// Database errors (SQLx wrapped)
    Database(sqlx::Error),

    /// Database connection refused / timed out
    DatabaseUnavailable(String),

    /// Validation errors (bad id format, missing field, invalid enum value)
    Validation(String),

    /// Not found errors
    NotFound(String),

    /// Domain entity in a state that forbids the requested action
    Conflict(String),

    /// Template loading / rendering failures
    Template(String),

    /// Scheduler command transport failures (command missing, timeout)
    Scheduler(String),

    /// Job submission failures (non-zero sbatch exit, unparseable job id)
    Submission(String),

    /// Serialization/deserialization errors
    Serialization(serde_json::Error),

    /// IO errors
    Io(std::io::Error),

    /// Generic errors with description
    Other(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Database(e) => write!(f, "Database error: {}", e),
            Error::DatabaseUnavailable(msg) => write!(f, "Database unavailable: {}", msg),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Error::Template(msg) => write!(f, "Template error: {}", msg),
            Error::Scheduler(msg) => write!(f, "Scheduler error: {}", msg),
            Error::Submission(msg) => write!(f, "Submission failed: {}", msg),
            Error::Serialization(e) => write!(f, "Serialization error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(e) => Some(e),
            Error::Serialization(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

// Conversions from external error types
impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Error::DatabaseUnavailable(error.to_string())
            }
            sqlx::Error::Io(_) => Error::DatabaseUnavailable(error.to_string()),
            _ => Error::Database(error),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Serialization(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Config(error.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(error: uuid::Error) -> Self {
        Error::Validation(format!("Invalid UUID: {}", error))
    }
}

// Common error constructors
impl Error {
    /// Create a new configuration error
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Error::Config(msg.into())
    }

    /// Create a new validation error
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a new not found error
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a new conflict error
    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        Error::Conflict(msg.into())
    }

    /// Create a new template error
    pub fn template<T: Into<String>>(msg: T) -> Self {
        Error::Template(msg.into())
    }

    /// Create a new scheduler transport error
    pub fn scheduler<T: Into<String>>(msg: T) -> Self {
        Error::Scheduler(msg.into())
    }

    /// Create a new submission error
    pub fn submission<T: Into<String>>(msg: T) -> Self {
        Error::Submission(msg.into())
    }
}

impl Error {
    /// Get HTTP status code for error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            Error::DatabaseUnavailable(_) => 503,
            Error::Config(_) => 500,
            Error::Database(_) => 500,
            Error::Template(_) => 500,
            Error::Scheduler(_) => 500,
            Error::Submission(_) => 500,
            Error::Serialization(_) => 500,
            Error::Io(_) => 500,
            Error::Other(_) => 500,
        }
    }

    /// Get error category for monitoring
    pub fn category(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Database(_) => "database",
            Error::DatabaseUnavailable(_) => "database_unavailable",
            Error::Validation(_) => "validation",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Template(_) => "template",
            Error::Scheduler(_) => "scheduler",
            Error::Submission(_) => "submission",
            Error::Serialization(_) => "serialization",
            Error::Io(_) => "io",
            Error::Other(_) => "other",
        }
    }

    /// Whether the error message matches a connection-loss pattern.
    ///
    /// The reconciliation engine uses this to decide when a reconnect attempt
    /// is worth making before the next tick.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::DatabaseUnavailable(_) => true,
            Error::Database(e) => {
                let msg = e.to_string().to_lowercase();
                msg.contains("connection") || msg.contains("closed") || msg.contains("broken pipe")
            }
            _ => false,
        }
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = http::StatusCode::from_u16(self.status_code())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = serde_json::json!({
            "error": {
                "category": self.category(),
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::validation("bad id").status_code(), 400);
        assert_eq!(Error::not_found("nope").status_code(), 404);
        assert_eq!(Error::conflict("busy").status_code(), 409);
        assert_eq!(Error::DatabaseUnavailable("refused".into()).status_code(), 503);
        assert_eq!(Error::template("missing").status_code(), 500);
        assert_eq!(Error::submission("sbatch failed").status_code(), 500);
    }

    #[test]
    fn test_categories() {
        assert_eq!(Error::scheduler("timeout").category(), "scheduler");
        assert_eq!(Error::template("x").category(), "template");
        assert_eq!(Error::Other("x".into()).category(), "other");
    }

    #[test]
    fn test_connection_error_detection() {
        assert!(Error::DatabaseUnavailable("pool timed out".into()).is_connection_error());
        assert!(!Error::validation("bad").is_connection_error());
        assert!(!Error::not_found("gone").is_connection_error());
    }

    #[test]
    fn test_pool_errors_map_to_unavailable() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, Error::DatabaseUnavailable(_)));
        let err: Error = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, Error::DatabaseUnavailable(_)));
    }
}
