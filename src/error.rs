//! Error types for the MySQL MCP Server.
//!
//! This module defines all error types using `thiserror`. Every variant is
//! rendered to the caller as an `Error: <message>` text block, so the
//! `Display` output is the message the caller sees.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to connect to MySQL: {message}")]
    Connection { message: String },

    /// Driver message, propagated verbatim.
    #[error("{message}")]
    Query {
        message: String,
        /// e.g., "42S02" for unknown table
        sql_state: Option<String>,
    },

    #[error("Unknown tool: {name}")]
    UnknownOperation { name: String },

    #[error("Invalid arguments for '{operation}': {message}")]
    InvalidArguments { operation: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with optional SQL state.
    pub fn query(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql_state,
        }
    }

    /// Create an unknown operation error.
    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::UnknownOperation { name: name.into() }
    }

    /// Create an invalid arguments error.
    pub fn invalid_arguments(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map an error raised while opening a connection.
    ///
    /// Server-side rejections (bad credentials, unknown database) keep only the
    /// server's message; everything else uses the driver's own description.
    pub fn from_connect_error(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbError::connection(db_err.message()),
            other => DbError::connection(other.to_string()),
        }
    }

    /// SQLSTATE reported by the server, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Query { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Short label used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::Query { .. } => "query",
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Convert sqlx errors raised while executing a statement.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::query(db_err.message(), code)
            }
            sqlx::Error::Io(io_err) => DbError::query(format!("I/O error: {}", io_err), None),
            sqlx::Error::Protocol(msg) => DbError::query(format!("Protocol error: {}", msg), None),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::query(format!("Failed to decode column {}: {}", index, source), None)
            }
            sqlx::Error::Decode(source) => DbError::query(format!("Decode error: {}", source), None),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            other => DbError::query(other.to_string(), None),
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::internal(format!("Failed to serialize result: {}", err))
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let err = DbError::connection("Access denied for user 'bob'@'localhost'");
        assert_eq!(
            err.to_string(),
            "Failed to connect to MySQL: Access denied for user 'bob'@'localhost'"
        );
    }

    #[test]
    fn test_query_error_is_verbatim() {
        let err = DbError::query(
            "Table 'shop.nope' doesn't exist",
            Some("42S02".to_string()),
        );
        assert_eq!(err.to_string(), "Table 'shop.nope' doesn't exist");
        assert_eq!(err.sql_state(), Some("42S02"));
    }

    #[test]
    fn test_unknown_operation_display() {
        let err = DbError::unknown_operation("drop_everything");
        assert_eq!(err.to_string(), "Unknown tool: drop_everything");
        assert_eq!(err.kind(), "unknown_operation");
    }

    #[test]
    fn test_invalid_arguments_display() {
        let err = DbError::invalid_arguments("run_query", "missing field `query`");
        assert_eq!(
            err.to_string(),
            "Invalid arguments for 'run_query': missing field `query`"
        );
    }

    #[test]
    fn test_connect_io_error_maps_to_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = DbError::from_connect_error(sqlx::Error::Io(io));
        assert!(matches!(err, DbError::Connection { .. }));
        assert!(err.to_string().starts_with("Failed to connect to MySQL: "));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_execute_io_error_maps_to_query() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = DbError::from(sqlx::Error::Io(io));
        assert!(matches!(err, DbError::Query { .. }));
        assert!(err.to_string().contains("pipe closed"));
        assert_eq!(err.sql_state(), None);
    }
}
