//! # tillbook-core: Pure Ledger Logic for Tillbook
//!
//! This crate is the **heart** of the Tillbook balance ledger. It contains
//! all ledger rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tillbook Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Admin Backend (REST/CRUD layer)                  │   │
//! │  │   sale payment recorded ─► expense recorded ─► sale cancelled   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tillbook-db (Ledger Engine)                  │   │
//! │  │   post ─ resolve_opening ─ compute_closing ─ reverse_document   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tillbook-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ reconcile │  │ validation│  │   │
//! │  │   │  Channel  │  │   Money   │  │ day fold  │  │   rules   │  │   │
//! │  │   │  Entry    │  │  applied  │  │ chain     │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Channel, LedgerEntry, snapshots, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Entry and registry input validation
//! - [`reconcile`] - The pure day reconciliation fold
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Append-Only**: Entries are immutable; corrections are new entries
//!
//! ## Example Usage
//!
//! ```rust
//! use tillbook_core::money::Money;
//! use tillbook_core::types::EntryDirection;
//!
//! // Create money from cents (never from floats!)
//! let opening = Money::from_cents(100_000); // 1,000.00
//!
//! // Apply a directional entry amount
//! let after = opening.applied(EntryDirection::Income, Money::from_cents(50_000));
//! assert_eq!(after.cents(), 150_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tillbook_core::Money` instead of
// `use tillbook_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use reconcile::{reconcile_day, verify_chain, OpeningReset};
pub use types::*;
