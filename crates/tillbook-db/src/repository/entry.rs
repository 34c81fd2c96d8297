//! # Ledger Entry Repository
//!
//! The append-only store for balance-affecting events.
//!
//! ## Append-Only Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Ledger Entry Lifecycle                              │
//! │                                                                         │
//! │  1. POST (engine)                                                      │
//! │     └── insert_on() inside the posting transaction                     │
//! │                                                                         │
//! │  2. READ (everyone)                                                    │
//! │     ├── latest_for_channel() → current running balance                 │
//! │     ├── list_for_day()       → closing calculation input               │
//! │     ├── by_document()        → reversal candidates                     │
//! │     ├── query()              → reporting listings                      │
//! │     └── summaries()          → day/channel grouping                    │
//! │                                                                         │
//! │  There is NO update and NO delete. Corrections are new entries.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries are totally ordered per channel by (occurred_at, seq); every
//! read in this repository respects that order.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tillbook_core::{Channel, ChannelKind, DaySummary, EntryQuery, LedgerEntry};
use chrono::NaiveDate;

/// Column list shared by every entry SELECT, in struct field order.
const ENTRY_COLUMNS: &str = "seq, id, channel_kind, bank_account_id, direction, source, \
     source_document_id, amount_cents, occurred_at, occurred_on, \
     before_balance_cents, after_balance_cents, recorded_by, description, created_at";

/// Repository for ledger entry database operations.
#[derive(Debug, Clone)]
pub struct EntryRepository {
    pool: SqlitePool,
}

impl EntryRepository {
    /// Creates a new EntryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EntryRepository { pool }
    }

    /// Inserts an entry inside the caller's transaction and returns the
    /// assigned insertion sequence.
    ///
    /// The posting engine is the only caller: the insert must share a
    /// transaction with the balance read that produced the entry's
    /// before/after pair.
    pub async fn insert_on(
        &self,
        conn: &mut SqliteConnection,
        entry: &LedgerEntry,
    ) -> DbResult<i64> {
        debug!(
            id = %entry.id,
            channel = %entry.channel(),
            amount_cents = entry.amount_cents,
            "Inserting ledger entry"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, channel_kind, bank_account_id, direction, source,
                source_document_id, amount_cents, occurred_at, occurred_on,
                before_balance_cents, after_balance_cents, recorded_by,
                description, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12,
                ?13, ?14
            )
            "#,
        )
        .bind(&entry.id)
        .bind(entry.channel_kind)
        .bind(&entry.bank_account_id)
        .bind(entry.direction)
        .bind(entry.source)
        .bind(&entry.source_document_id)
        .bind(entry.amount_cents)
        .bind(entry.occurred_at)
        .bind(entry.occurred_on)
        .bind(entry.before_balance_cents)
        .bind(entry.after_balance_cents)
        .bind(&entry.recorded_by)
        .bind(&entry.description)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent entry for a channel by the (occurred_at, seq) order,
    /// read inside the caller's transaction.
    pub async fn latest_for_channel_on(
        &self,
        conn: &mut SqliteConnection,
        channel: &Channel,
    ) -> DbResult<Option<LedgerEntry>> {
        let (kind, account_id) = channel.columns();

        let entry = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger_entries
            WHERE channel_kind = ?1 AND bank_account_id IS ?2
            ORDER BY occurred_at DESC, seq DESC
            LIMIT 1
            "#
        ))
        .bind(kind)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// Most recent entry for a channel, pool variant.
    pub async fn latest_for_channel(&self, channel: &Channel) -> DbResult<Option<LedgerEntry>> {
        let mut conn = self.pool.acquire().await?;
        self.latest_for_channel_on(&mut *conn, channel).await
    }

    /// All entries for one day, optionally restricted to one channel,
    /// ordered chronologically.
    pub async fn list_for_day(
        &self,
        day: NaiveDate,
        channel: Option<&Channel>,
    ) -> DbResult<Vec<LedgerEntry>> {
        let entries = match channel {
            Some(channel) => {
                let (kind, account_id) = channel.columns();
                sqlx::query_as::<_, LedgerEntry>(&format!(
                    r#"
                    SELECT {ENTRY_COLUMNS}
                    FROM ledger_entries
                    WHERE occurred_on = ?1 AND channel_kind = ?2 AND bank_account_id IS ?3
                    ORDER BY occurred_at, seq
                    "#
                ))
                .bind(day)
                .bind(kind)
                .bind(account_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, LedgerEntry>(&format!(
                    r#"
                    SELECT {ENTRY_COLUMNS}
                    FROM ledger_entries
                    WHERE occurred_on = ?1
                    ORDER BY occurred_at, seq
                    "#
                ))
                .bind(day)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(entries)
    }

    /// Distinct channels that have entries on the given day.
    ///
    /// Includes deactivated banks and legacy card channels, so closing
    /// calculation never drops a channel that moved money.
    pub async fn channels_on(&self, day: NaiveDate) -> DbResult<Vec<(ChannelKind, Option<String>)>> {
        let channels = sqlx::query_as::<_, (ChannelKind, Option<String>)>(
            r#"
            SELECT DISTINCT channel_kind, bank_account_id
            FROM ledger_entries
            WHERE occurred_on = ?1
            "#,
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }

    /// All entries referencing a business document, in insertion order.
    pub async fn by_document(&self, document_id: &str) -> DbResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger_entries
            WHERE source_document_id = ?1
            ORDER BY seq
            "#
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Ordered, filtered entry listing for the reporting layer.
    pub async fn query(&self, query: &EntryQuery) -> DbResult<Vec<LedgerEntry>> {
        let mut builder = sqlx::QueryBuilder::new(format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE occurred_on >= "
        ));
        builder.push_bind(query.from);
        builder.push(" AND occurred_on <= ");
        builder.push_bind(query.to);

        if let Some(channel) = &query.channel {
            let (kind, account_id) = channel.columns();
            builder.push(" AND channel_kind = ");
            builder.push_bind(kind);
            builder.push(" AND bank_account_id IS ");
            builder.push_bind(account_id);
        }

        if let Some(source) = query.source {
            builder.push(" AND source = ");
            builder.push_bind(source);
        }

        builder.push(" ORDER BY occurred_at, seq");

        let entries = builder
            .build_query_as::<LedgerEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Per-(day, channel) movement totals for a day range.
    pub async fn summaries(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<DaySummary>> {
        let summaries = sqlx::query_as::<_, DaySummary>(
            r#"
            SELECT
                occurred_on AS day,
                channel_kind,
                bank_account_id,
                COALESCE(SUM(CASE WHEN direction = 'income' THEN amount_cents ELSE 0 END), 0)
                    AS income_cents,
                COALESCE(SUM(CASE WHEN direction = 'expense' THEN amount_cents ELSE 0 END), 0)
                    AS expense_cents,
                COUNT(*) AS entry_count
            FROM ledger_entries
            WHERE occurred_on >= ?1 AND occurred_on <= ?2
            GROUP BY occurred_on, channel_kind, bank_account_id
            ORDER BY occurred_on, channel_kind, bank_account_id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
