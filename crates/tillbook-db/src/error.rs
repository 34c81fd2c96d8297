//! # Database and Ledger Error Types
//!
//! Error types for database operations and ledger engine operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerError (this module) ← Operation-level taxonomy the admin        │
//! │       │                       backend matches on                        │
//! │       ▼                                                                 │
//! │  Operator-facing message (out of scope here)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use tillbook_core::CoreError;

// =============================================================================
// Database Error
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    /// - Soft-deleted record
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate entry id
    /// - Second opening snapshot for the same (day, channel)
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// CHECK constraint violation.
    ///
    /// ## When This Occurs
    /// - A non-positive amount or unknown enum value reaches the database
    ///   despite application validation
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // CHECK constraint:  "CHECK constraint failed: <detail>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Ledger Error
// =============================================================================

/// Ledger engine operation errors.
///
/// This is the taxonomy callers (the sale/purchase/expense flows) match on:
///
/// | Variant                  | Caller action                              |
/// |--------------------------|--------------------------------------------|
/// | `Core(InvalidAmount)`    | Fix input, no retry                        |
/// | `UnknownChannel`         | Fix input, no retry                        |
/// | `AlreadyReversed`        | Nothing to do, no retry                    |
/// | `DocumentNotFound`       | Nothing to reverse, no retry               |
/// | `ConcurrentModification` | Retry the whole business operation         |
/// | `Core(Inconsistency)`    | Stop; manual investigation required        |
/// | `Db(_)`                  | Infrastructure failure                     |
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The referenced cash/bank channel does not exist or is inactive.
    #[error("Unknown channel: {channel}")]
    UnknownChannel { channel: String },

    /// The per-channel posting lock could not be acquired within the
    /// configured wait. The caller retries the whole business operation;
    /// the engine never retries internally.
    #[error("Concurrent modification on channel {channel}")]
    ConcurrentModification { channel: String },

    /// Every payment of the document is already paired with a refund.
    #[error("Document {document_id} is already reversed")]
    AlreadyReversed { document_id: String },

    /// No payment-type ledger entries exist for the document.
    #[error("No reversible ledger entries for document {document_id}")]
    DocumentNotFound { document_id: String },

    /// Domain rule violation (invalid amount, ledger inconsistency,
    /// validation failure).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl LedgerError {
    /// Whether the caller may retry the business operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ConcurrentModification { .. })
    }
}

/// Result type for ledger engine operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================
