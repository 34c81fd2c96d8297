//! # Repository Module
//!
//! Database repository implementations for Tillbook.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Ledger Engine                                                         │
//! │       │                                                                 │
//! │       │  db.entries().latest_for_channel(&channel)                     │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  EntryRepository                                                       │
//! │  ├── insert_on(&mut conn, entry)                                       │
//! │  ├── latest_for_channel(&channel)                                      │
//! │  ├── list_for_day(day, channel)                                        │
//! │  └── query(&entry_query)                                               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Methods ending in `_on` take a `&mut SqliteConnection` so the         │
//! │  posting engine can run them inside its own transaction.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`bank_account::BankAccountRepository`] - Channel registry
//! - [`entry::EntryRepository`] - Append-only ledger entry store
//! - [`snapshot::SnapshotRepository`] - Opening/closing balance snapshots
//! - [`confirmation::ConfirmationRepository`] - Daily confirmation flags

pub mod bank_account;
pub mod confirmation;
pub mod entry;
pub mod snapshot;
