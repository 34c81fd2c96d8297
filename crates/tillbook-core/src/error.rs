//! # Error Types
//!
//! Domain-specific error types for tillbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tillbook-core errors (this file)                                      │
//! │  ├── CoreError        - Ledger domain errors                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tillbook-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - Posting/reversal operation failures            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → API layer           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (channel, entry id, balances)
//! 3. Errors are enum variants, never String
//! 4. Inconsistency errors are surfaced, never auto-corrected

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger domain errors.
///
/// These errors represent violated ledger rules. They are surfaced to the
/// caller untouched; in particular [`CoreError::Inconsistency`] must never
/// be swallowed or "fixed" by overwriting history.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entry amount must be strictly positive.
    ///
    /// ## When This Occurs
    /// - A zero or negative amount reaches the posting engine
    /// - Direction is what encodes sign; amounts never carry one
    #[error("Invalid amount: {amount_cents} cents (must be positive)")]
    InvalidAmount { amount_cents: i64 },

    /// A replayed balance does not match the balance stored on an entry.
    ///
    /// ## When This Occurs
    /// - The day fold recomputes a channel's running balance and an entry's
    ///   stored before/after balance disagrees with the chain
    ///
    /// This indicates data corruption (or an out-of-band write) and
    /// requires manual investigation. It is a hard failure by design.
    #[error(
        "Ledger inconsistency on {channel}: entry {entry_id} stored {stored_cents} but replay expected {expected_cents}"
    )]
    Inconsistency {
        channel: String,
        entry_id: String,
        expected_cents: i64,
        stored_cents: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any balance is read.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
