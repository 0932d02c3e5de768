//! Error types for archive operations

use thiserror::Error;

/// Errors that can occur during archive operations
///
/// Data-shape problems (a table that vanished, a column the engine refuses to
/// compare) are not represented here: they are absorbed into empty results or a
/// [`Lookup::Failed`]. Only caller mistakes and resource-level failures surface.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl ArchiveError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_condition(msg: impl Into<String>) -> Self {
        Self::InvalidCondition(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Whether a driver error stems from the shape of the data rather than from
/// the store itself being unreachable.
pub fn is_data_shape(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(_)
            | sqlx::Error::RowNotFound
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
    )
}

/// Outcome of a best-effort catalog or data lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// The table exists and the query succeeded
    Found(T),
    /// The table is not in the catalog
    Missing,
    /// The table exists but the query failed on its data
    Failed(String),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Lookup::Missing)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Lookup::Failed(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Missing => Lookup::Missing,
            Lookup::Failed(msg) => Lookup::Failed(msg),
        }
    }

    /// Collapse Missing and Failed into the type's empty value
    pub fn or_default(self) -> T
    where
        T: Default,
    {
        self.found().unwrap_or_default()
    }

    /// Turn a driver result into a lookup, absorbing data-shape failures
    ///
    /// Resource-level failures are still returned as errors.
    pub(crate) fn absorb(result: std::result::Result<T, sqlx::Error>, table: &str) -> Result<Self> {
        match result {
            Ok(value) => Ok(Lookup::Found(value)),
            Err(err) if is_data_shape(&err) => {
                tracing::warn!(table, error = %err, "query failed, treating table as empty");
                Ok(Lookup::Failed(err.to_string()))
            }
            Err(err) => Err(ArchiveError::Sql(err)),
        }
    }
}
