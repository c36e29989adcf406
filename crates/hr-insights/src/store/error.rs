use rusqlite::ErrorCode;
use std::path::PathBuf;

/// Failures raised by the bootstrapper and the repository.
///
/// Nothing in the store layer retries or recovers; every variant is surfaced
/// to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },
    #[error("failed to write store {}: {reason}", path.display())]
    StoreWriteError { path: PathBuf, reason: String },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

impl StoreError {
    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::StoreWriteError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Maps a SQLite failure raised while running a caller-supplied statement.
    ///
    /// A missing `employees` table is an unusable store, not a bad statement.
    pub(crate) fn from_statement(err: rusqlite::Error) -> Self {
        if is_missing_table(&err) {
            return Self::StoreUnavailable(err.to_string());
        }

        if let Some(code) = err.sqlite_error_code() {
            return match code {
                ErrorCode::ConstraintViolation
                | ErrorCode::TypeMismatch
                | ErrorCode::ParameterOutOfRange
                | ErrorCode::TooBig
                | ErrorCode::Unknown => Self::ConstraintViolation(err.to_string()),
                _ => Self::StoreUnavailable(err.to_string()),
            };
        }

        match err {
            rusqlite::Error::InvalidParameterCount(..)
            | rusqlite::Error::InvalidParameterName(_)
            | rusqlite::Error::ToSqlConversionFailure(_)
            | rusqlite::Error::ExecuteReturnedResults
            | rusqlite::Error::MultipleStatement
            | rusqlite::Error::SqlInputError { .. } => Self::ConstraintViolation(err.to_string()),
            other => Self::StoreUnavailable(other.to_string()),
        }
    }

    pub(crate) fn unavailable(err: impl ToString) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

fn is_missing_table(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message))
        | rusqlite::Error::SqlInputError { msg: message, .. } => {
            message.starts_with("no such table")
        }
        _ => false,
    }
}
