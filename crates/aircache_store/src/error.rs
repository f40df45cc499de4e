//! Error types for record store operations.

use crate::model::PassengerId;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A passenger row.
    Passenger,
    /// A booking row.
    Booking,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Passenger => f.write_str("passenger"),
            RecordKind::Booking => f.write_str("booking"),
        }
    }
}

/// Errors that can occur during record store operations.
///
/// A failed operation never leaves a partial write behind.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database failed.
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),

    /// No record with the given identity.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of record requested.
        kind: RecordKind,
        /// Requested identity.
        id: i64,
    },

    /// A booking referenced a passenger that does not exist.
    #[error("passenger {passenger_id} does not exist")]
    ReferentialViolation {
        /// The missing parent identity.
        passenger_id: PassengerId,
    },

    /// A record with the same identity already exists.
    #[error("{kind} {id} already exists")]
    Conflict {
        /// Kind of record inserted.
        kind: RecordKind,
        /// Conflicting identity.
        id: i64,
    },

    /// An operation that needs an identity was given a record without one.
    #[error("{0} record has no identity")]
    MissingId(RecordKind),

    /// Stored data could not be interpreted.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Returns true if the error was raised by a constraint check.
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            StoreError::ReferentialViolation { .. } | StoreError::Conflict { .. }
        )
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
                StoreError::Corrupted(format!("column {column}: {source}"))
            }
            rusqlite::Error::InvalidColumnType(column, name, ty) => {
                StoreError::Corrupted(format!("column {column} ({name}) has type {ty}"))
            }
            other => StoreError::Sqlite(other),
        }
    }
}

/// Returns true if `err` is a foreign key constraint failure.
pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

/// Returns true if `err` is a primary key or unique constraint failure.
pub(crate) fn is_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
    )
}
