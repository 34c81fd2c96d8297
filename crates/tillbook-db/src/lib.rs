//! # tillbook-db: Database Layer for Tillbook
//!
//! This crate provides database access and the ledger engine for the
//! Tillbook balance ledger. It uses SQLite for local storage with sqlx for
//! async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tillbook Data Flow                               │
//! │                                                                         │
//! │  Admin backend (sale paid / expense recorded / day report)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tillbook-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Ledger     │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (ledger/)    │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ post          │───►│ EntryRepo     │    │ 001_init.sql │  │   │
//! │  │   │ reverse       │    │ SnapshotRepo  │    │ ...          │  │   │
//! │  │   │ compute_close │    │ AccountRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Repository implementations
//! - [`ledger`] - The posting/reconciliation engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tillbook_db::{Database, DbConfig};
//! use tillbook_core::{Channel, EntryDirection, EntrySource, NewEntry};
//!
//! let db = Database::new(DbConfig::new("path/to/tillbook.db")).await?;
//! let ledger = db.ledger();
//!
//! // record a cash sale payment
//! let entry = ledger.post(NewEntry {
//!     channel: Channel::Cash,
//!     direction: EntryDirection::Income,
//!     source: EntrySource::Sale,
//!     source_document_id: Some(sale_id),
//!     amount_cents: 50_000,
//!     occurred_at: chrono::Utc::now(),
//!     recorded_by: cashier_id,
//!     description: None,
//! }).await?;
//!
//! // end of day
//! let closing = ledger.compute_closing(ledger.today()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use ledger::{Ledger, LedgerConfig};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::bank_account::BankAccountRepository;
pub use repository::confirmation::ConfirmationRepository;
pub use repository::entry::EntryRepository;
pub use repository::snapshot::SnapshotRepository;
