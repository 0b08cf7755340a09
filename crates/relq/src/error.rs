//! Error types for relq

use thiserror::Error;

/// Result type alias for relq operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for query construction and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// A select-one query matched no rows
    #[error("No result found")]
    NoResultFound,

    /// A select-one query matched more than one row
    #[error("Too many results found (expected exactly one)")]
    TooManyResultsFound,

    /// Lookup of a relation name the catalog does not list
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Lookup of a column the table does not declare
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// A join that cannot be built (no selections, clashing output names, ...)
    #[error("Invalid join: {0}")]
    InvalidJoin(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error raised by the bundled SQLite driver, passed through unchanged
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Error raised by any other driver, passed through unchanged
    #[error("Driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid join error
    pub fn invalid_join(message: impl Into<String>) -> Self {
        Self::InvalidJoin(message.into())
    }

    /// Wrap an error coming from a custom driver
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }

    /// Check if this is a "no result" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoResultFound)
    }

    /// Check if this is a "too many results" error
    pub fn is_too_many(&self) -> bool {
        matches!(self, Self::TooManyResultsFound)
    }

    /// Check if this is an invalid join error
    pub fn is_invalid_join(&self) -> bool {
        matches!(self, Self::InvalidJoin(_))
    }

    /// Check if the driver reported a constraint violation (unique, foreign key, check, ...).
    ///
    /// The error itself is not translated; this only inspects it.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}
