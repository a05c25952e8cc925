use thiserror::Error;

/// Result type for persistence operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for persistence operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input data or configuration
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Database unreachable or authentication failure
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Row doesn't exist
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// SQL errors, constraint violations
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Connection pool issues
    #[error("Pool error: {0}")]
    PoolError(String),

    /// Begin/commit failures
    #[error("Transaction error: {0}")]
    TransactionError(String),
}

/// Convert tokio-postgres errors, keeping the SQLSTATE when the server sent one
impl From<tokio_postgres::Error> for Error {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_error) = err.as_db_error() {
            return Error::DatabaseError(format!(
                "{}: {}",
                db_error.code().code(),
                db_error.message()
            ));
        }

        Error::DatabaseError(format!("{:?}", err))
    }
}

impl From<deadpool_postgres::PoolError> for Error {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Error::PoolError(err.to_string())
    }
}

impl From<deadpool_postgres::BuildError> for Error {
    fn from(err: deadpool_postgres::BuildError) -> Self {
        Error::ConnectionError(err.to_string())
    }
}
