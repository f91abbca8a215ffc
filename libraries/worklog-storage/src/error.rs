/// Storage-specific errors
use thiserror::Error;
use worklog_core::{DomainError, ErrorKind};

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// A translated, caller-facing failure (not found, integrity violation, bad row)
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The SQL text and the bound parameters disagree
    #[error("SQL has {markers} placeholders but {params} parameters were given")]
    ParameterMismatch { markers: usize, params: usize },

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Database error from `SQLx`, passed through unmodified
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// The domain tag, if this error carries one
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            StorageError::Domain(err) => Some(err.kind()),
            _ => None,
        }
    }
}

impl From<ErrorKind> for StorageError {
    fn from(kind: ErrorKind) -> Self {
        StorageError::Domain(DomainError::new(kind))
    }
}

/// Integrity categories a write can trip over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
}

/// Category of a raw database error, if it is an integrity violation
pub(crate) fn violation(err: &StorageError) -> Option<Violation> {
    let StorageError::Database(sqlx::Error::Database(db_err)) = err else {
        return None;
    };
    match db_err.kind() {
        sqlx::error::ErrorKind::UniqueViolation => Some(Violation::Unique),
        sqlx::error::ErrorKind::ForeignKeyViolation => Some(Violation::ForeignKey),
        _ => None,
    }
}

/// Replace integrity violations with domain tags, leave everything else alone
pub(crate) fn translate(
    err: StorageError,
    on_unique: Option<ErrorKind>,
    on_foreign_key: Option<ErrorKind>,
) -> StorageError {
    let mapped = match violation(&err) {
        Some(Violation::Unique) => on_unique,
        Some(Violation::ForeignKey) => on_foreign_key,
        None => None,
    };

    match mapped {
        Some(kind) => {
            tracing::debug!(error = %err, tag = kind.as_str(), "Translated integrity violation");
            StorageError::from(kind)
        }
        None => err,
    }
}
