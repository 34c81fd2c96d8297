//! # Ledger Engine
//!
//! The single write path for channel balances, and the reconciliation
//! surface built around it.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Ledger Engine Data Flow                           │
//! │                                                                         │
//! │  business document mutation (sale paid / expense recorded / cancel)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ledger::post ──────────────► ledger_entries (append-only)             │
//! │  Ledger::reverse_document ──► compensating entries via post            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ledger::compute_closing ───► closing_balances (replace per day)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ledger::query_entries / day_summaries ──► reporting                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`locks`] - per-channel posting locks
//! - `poster` - the Balance Poster (4.1 of the daily book design)
//! - `opening` - the Opening Balance Resolver
//! - `closing` - the Closing Balance Calculator
//! - `reversal` - the document Reversal Handler
//!
//! The Daily Confirmation Gate and the read-only query surface are thin
//! and live directly on [`Ledger`] below.

mod closing;
pub(crate) mod locks;
mod opening;
mod poster;
mod reversal;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::error::{LedgerError, LedgerResult};
use crate::repository::bank_account::BankAccountRepository;
use crate::repository::confirmation::ConfirmationRepository;
use crate::repository::entry::EntryRepository;
use crate::repository::snapshot::SnapshotRepository;
use locks::ChannelLocks;
use tillbook_core::validation::{validate_description, validate_recorded_by};
use tillbook_core::{
    Channel, ConfirmationStatus, CoreError, DaySummary, EntryQuery, LedgerEntry, Money,
    OpeningBalance,
};

// =============================================================================
// Configuration
// =============================================================================

/// Ledger engine configuration.
///
/// ## Example
/// ```rust,ignore
/// let ledger = db.ledger_with(
///     LedgerConfig::default()
///         .max_lookback_days(30)
///         .day_offset_minutes(5 * 60), // store runs on UTC+5 days
/// );
/// ```
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// How many days the opening-balance resolver walks backward looking
    /// for a closing snapshot before giving up with a zero opening.
    /// Default: 90
    pub max_lookback_days: u32,

    /// Bounded wait for a channel's posting lock.
    /// Default: 5 seconds
    pub lock_wait: Duration,

    /// Fixed UTC offset, in minutes, that defines the store's calendar day
    /// for bucketing entries. Default: 0 (UTC days)
    pub day_offset_minutes: i32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            max_lookback_days: 90,
            lock_wait: Duration::from_secs(5),
            day_offset_minutes: 0,
        }
    }
}

impl LedgerConfig {
    /// Sets the opening-resolution lookback bound.
    pub fn max_lookback_days(mut self, days: u32) -> Self {
        self.max_lookback_days = days;
        self
    }

    /// Sets the bounded wait for channel locks.
    pub fn lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Sets the store's day offset from UTC, in minutes.
    pub fn day_offset_minutes(mut self, minutes: i32) -> Self {
        self.day_offset_minutes = minutes;
        self
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// The ledger engine: the only component allowed to mutate a channel's
/// balance, plus the resolver/calculator/reversal/confirmation surface
/// around the entry store.
///
/// Cheap to clone; clones share the pool and the channel-lock registry.
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
    locks: Arc<ChannelLocks>,
    config: LedgerConfig,
}

impl Ledger {
    /// Creates a ledger engine over an existing pool and lock registry.
    ///
    /// Use [`crate::Database::ledger`] instead of calling this directly,
    /// so every engine in the process shares one lock registry.
    pub(crate) fn new(pool: SqlitePool, locks: Arc<ChannelLocks>, config: LedgerConfig) -> Self {
        Ledger {
            pool,
            locks,
            config,
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // =========================================================================
    // Day Bucketing
    // =========================================================================

    /// Maps a timestamp to the store's calendar day.
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match FixedOffset::east_opt(self.config.day_offset_minutes * 60) {
            Some(offset) => at.with_timezone(&offset).date_naive(),
            None => at.date_naive(),
        }
    }

    /// The store's current calendar day.
    pub fn today(&self) -> NaiveDate {
        self.day_of(Utc::now())
    }

    // =========================================================================
    // Running Balance Helper
    // =========================================================================

    /// A channel's balance right now: the latest entry's after balance, or
    /// the resolved opening for today when the channel has never moved.
    ///
    /// Backs the "current running balance" readout in the admin UI.
    pub async fn current_balance(&self, channel: &Channel) -> LedgerResult<Money> {
        match self.entries().latest_for_channel(channel).await? {
            Some(entry) => Ok(entry.after_balance()),
            None => {
                let opening = self.resolve_opening(self.today(), channel).await?;
                Ok(opening.amount())
            }
        }
    }

    // =========================================================================
    // Opening Balance Snapshots (operator surface)
    // =========================================================================

    /// Stores or updates the opening balance for a (day, channel).
    ///
    /// The snapshot is authoritative from the moment it is written: entries
    /// posted after it base on it, already-written balances stand.
    pub async fn set_opening_balance(
        &self,
        day: NaiveDate,
        channel: &Channel,
        amount_cents: i64,
        notes: Option<&str>,
        recorded_by: &str,
    ) -> LedgerResult<OpeningBalance> {
        validate_recorded_by(recorded_by).map_err(CoreError::from)?;
        validate_description(notes).map_err(CoreError::from)?;
        self.ensure_known_channel(channel).await?;

        let snapshot = self
            .snapshots()
            .upsert_opening(day, channel, amount_cents, notes, recorded_by)
            .await?;

        Ok(snapshot)
    }

    // =========================================================================
    // Daily Confirmation Gate
    // =========================================================================

    /// Confirms today's books for the acting user. Idempotent.
    ///
    /// Advisory only: a confirmed day still accepts postings. The flag is
    /// a completeness signal for the reporting layer.
    pub async fn confirm_day(&self, user: &str) -> LedgerResult<ConfirmationStatus> {
        self.confirm_day_on(self.today(), user).await
    }

    /// Confirms a specific day for the acting user. Idempotent.
    pub async fn confirm_day_on(
        &self,
        day: NaiveDate,
        user: &str,
    ) -> LedgerResult<ConfirmationStatus> {
        validate_recorded_by(user).map_err(CoreError::from)?;
        Ok(self.confirmations().confirm(day, user, Utc::now()).await?)
    }

    /// Reads the confirmation status for a day (today when `None`),
    /// creating the unconfirmed row on first sight.
    pub async fn confirmation_status(
        &self,
        day: Option<NaiveDate>,
        user: &str,
    ) -> LedgerResult<ConfirmationStatus> {
        let day = day.unwrap_or_else(|| self.today());
        Ok(self.confirmations().status(day, user).await?)
    }

    // =========================================================================
    // Query Surface (reporting)
    // =========================================================================

    /// Ordered, filtered entry listing for the reporting aggregator.
    pub async fn query_entries(&self, query: &EntryQuery) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self.entries().query(query).await?)
    }

    /// Per-(day, channel) movement totals for a day range.
    pub async fn day_summaries(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<DaySummary>> {
        Ok(self.entries().summaries(from, to).await?)
    }

    // =========================================================================
    // Channel Checks
    // =========================================================================

    /// A channel that may receive new postings: cash, or an active bank
    /// account. Card channels are legacy and always rejected.
    pub(crate) async fn ensure_postable_channel(&self, channel: &Channel) -> LedgerResult<()> {
        match channel {
            Channel::Cash => Ok(()),
            Channel::Bank(id) => match self.bank_accounts().get_by_id(id).await? {
                Some(account) if account.is_active => Ok(()),
                _ => Err(LedgerError::UnknownChannel {
                    channel: channel.to_string(),
                }),
            },
            Channel::Card(_) => Err(LedgerError::UnknownChannel {
                channel: channel.to_string(),
            }),
        }
    }

    /// A channel that may carry snapshots: cash, any registered bank
    /// account (active or not, for historical reconciliation), or a legacy
    /// card channel.
    pub(crate) async fn ensure_known_channel(&self, channel: &Channel) -> LedgerResult<()> {
        match channel {
            Channel::Cash | Channel::Card(_) => Ok(()),
            Channel::Bank(id) => match self.bank_accounts().get_by_id(id).await? {
                Some(_) => Ok(()),
                None => Err(LedgerError::UnknownChannel {
                    channel: channel.to_string(),
                }),
            },
        }
    }

    // =========================================================================
    // Repository Accessors
    // =========================================================================

    pub(crate) fn entries(&self) -> EntryRepository {
        EntryRepository::new(self.pool.clone())
    }

    pub(crate) fn snapshots(&self) -> SnapshotRepository {
        SnapshotRepository::new(self.pool.clone())
    }

    pub(crate) fn bank_accounts(&self) -> BankAccountRepository {
        BankAccountRepository::new(self.pool.clone())
    }

    pub(crate) fn confirmations(&self) -> ConfirmationRepository {
        ConfirmationRepository::new(self.pool.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use tillbook_core::{EntryDirection, EntrySource, NewEntry};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_day_bucketing_follows_offset() {
        let db = test_db().await;
        // 23:30 UTC on Jan 1 is already Jan 2 in a UTC+5 store
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();

        let utc_store = db.ledger();
        assert_eq!(utc_store.day_of(at), day(1));

        let offset_store = db.ledger_with(LedgerConfig::default().day_offset_minutes(5 * 60));
        assert_eq!(offset_store.day_of(at), day(2));
    }

    #[tokio::test]
    async fn test_current_balance_with_no_entries_uses_opening() {
        let db = test_db().await;
        let ledger = db.ledger();

        ledger
            .set_opening_balance(ledger.today(), &Channel::Cash, 100_000, None, "user-1")
            .await
            .unwrap();

        let balance = ledger.current_balance(&Channel::Cash).await.unwrap();
        assert_eq!(balance.cents(), 100_000);
    }

    #[tokio::test]
    async fn test_current_balance_follows_latest_entry() {
        let db = test_db().await;
        let ledger = db.ledger();

        ledger
            .post(NewEntry {
                channel: Channel::Cash,
                direction: EntryDirection::Income,
                source: EntrySource::Sale,
                source_document_id: Some("sale-1".to_string()),
                amount_cents: 4_200,
                occurred_at: Utc::now(),
                recorded_by: "user-1".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let balance = ledger.current_balance(&Channel::Cash).await.unwrap();
        assert_eq!(balance.cents(), 4_200);
    }

    #[tokio::test]
    async fn test_set_opening_balance_rejects_unregistered_bank() {
        let db = test_db().await;
        let ledger = db.ledger();

        let err = ledger
            .set_opening_balance(
                day(1),
                &Channel::Bank("ghost".to_string()),
                100,
                None,
                "user-1",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownChannel { .. }));
    }

    #[tokio::test]
    async fn test_confirmation_gate_round_trip() {
        let db = test_db().await;
        let ledger = db.ledger();

        let before = ledger
            .confirmation_status(Some(day(1)), "user-1")
            .await
            .unwrap();
        assert!(!before.confirmed);

        let confirmed = ledger.confirm_day_on(day(1), "user-1").await.unwrap();
        assert!(confirmed.confirmed);

        // idempotent: same state on repeat
        let again = ledger.confirm_day_on(day(1), "user-1").await.unwrap();
        assert_eq!(again.confirmed_at, confirmed.confirmed_at);
    }

    #[tokio::test]
    async fn test_confirmed_day_still_accepts_postings() {
        let db = test_db().await;
        let ledger = db.ledger();

        ledger.confirm_day("user-1").await.unwrap();

        // the gate is advisory, not an enforcement mechanism
        let posted = ledger
            .post(NewEntry {
                channel: Channel::Cash,
                direction: EntryDirection::Income,
                source: EntrySource::ManualAdd,
                source_document_id: None,
                amount_cents: 100,
                occurred_at: Utc::now(),
                recorded_by: "user-1".to_string(),
                description: Some("post after confirmation".to_string()),
            })
            .await;
        assert!(posted.is_ok());
    }
}
