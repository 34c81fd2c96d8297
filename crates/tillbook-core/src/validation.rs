//! # Validation Module
//!
//! Input validation for the posting engine and the bank-account registry.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin backend (request parsing)                              │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (ledger rules)                                   │
//! │  ├── Positive amounts, bounded descriptions                            │
//! │  └── Runs before any balance is read                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── UNIQUE / CHECK constraints                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use tillbook_core::validation::validate_recorded_by;
//!
//! validate_recorded_by("user-7").unwrap();
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{NewEntry, MAX_DESCRIPTION_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates the acting-user identifier on an entry.
///
/// ## Rules
/// - Must not be empty (every posting is attributable)
/// - Must be at most 100 characters
pub fn validate_recorded_by(recorded_by: &str) -> ValidationResult<()> {
    let recorded_by = recorded_by.trim();

    if recorded_by.is_empty() {
        return Err(ValidationError::Required {
            field: "recorded_by".to_string(),
        });
    }

    if recorded_by.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "recorded_by".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates an optional free-text description.
pub fn validate_description(description: Option<&str>) -> ValidationResult<()> {
    if let Some(description) = description {
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong {
                field: "description".to_string(),
                max: MAX_DESCRIPTION_LEN,
            });
        }
    }

    Ok(())
}

/// Validates a bank account display name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_account_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Entry Validation
// =============================================================================

/// Validates a [`NewEntry`] before the posting engine reads any balance.
///
/// ## Checks
/// - `amount_cents > 0` (direction carries the sign, amounts never do)
/// - `recorded_by` present and bounded
/// - `description` bounded
///
/// Channel existence is NOT checked here: that requires the bank-account
/// registry and stays in the database layer.
pub fn validate_new_entry(entry: &NewEntry) -> CoreResult<()> {
    if entry.amount_cents <= 0 {
        return Err(CoreError::InvalidAmount {
            amount_cents: entry.amount_cents,
        });
    }

    validate_recorded_by(&entry.recorded_by)?;
    validate_description(entry.description.as_deref())?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
