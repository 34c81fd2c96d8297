//! # Snapshot Repository
//!
//! Persistence for opening-balance snapshots (operator-stored) and
//! closing-balance rows (derived by the calculator).
//!
//! ## Snapshot Semantics
//! - Opening snapshots are authoritative: at most one per (day, channel),
//!   upserted by the operator, never merged with computed values.
//! - Closing rows are derived: recomputation replaces the whole day's row
//!   set in one transaction, so repeated calculation never accumulates.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tillbook_core::{Channel, ChannelClose, OpeningBalance};

/// Repository for opening/closing balance snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    /// Creates a new SnapshotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SnapshotRepository { pool }
    }

    // =========================================================================
    // Opening Balances
    // =========================================================================

    /// The stored opening snapshot for a (day, channel), read inside the
    /// caller's transaction.
    pub async fn opening_for_on(
        &self,
        conn: &mut SqliteConnection,
        day: NaiveDate,
        channel: &Channel,
    ) -> DbResult<Option<OpeningBalance>> {
        let (kind, account_id) = channel.columns();

        let snapshot = sqlx::query_as::<_, OpeningBalance>(
            r#"
            SELECT id, day, channel_kind, bank_account_id, amount_cents,
                   notes, recorded_by, created_at, updated_at
            FROM opening_balances
            WHERE day = ?1 AND channel_kind = ?2 AND bank_account_id IS ?3
            "#,
        )
        .bind(day)
        .bind(kind)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(snapshot)
    }

    /// The stored opening snapshot for a (day, channel), pool variant.
    pub async fn opening_for(
        &self,
        day: NaiveDate,
        channel: &Channel,
    ) -> DbResult<Option<OpeningBalance>> {
        let mut conn = self.pool.acquire().await?;
        self.opening_for_on(&mut *conn, day, channel).await
    }

    /// Creates or updates the opening snapshot for a (day, channel).
    ///
    /// `updated_at` is refreshed on every edit; the posting engine uses it
    /// as the operator's reset time for mid-day overrides.
    pub async fn upsert_opening(
        &self,
        day: NaiveDate,
        channel: &Channel,
        amount_cents: i64,
        notes: Option<&str>,
        recorded_by: &str,
    ) -> DbResult<OpeningBalance> {
        let (kind, account_id) = channel.columns();
        let now = Utc::now();

        debug!(%day, channel = %channel, amount_cents, "Storing opening balance");

        let mut tx = self.pool.begin().await?;

        let existing = self.opening_for_on(&mut tx, day, channel).await?;

        let snapshot = match existing {
            Some(mut snapshot) => {
                sqlx::query(
                    r#"
                    UPDATE opening_balances SET
                        amount_cents = ?2,
                        notes = ?3,
                        recorded_by = ?4,
                        updated_at = ?5
                    WHERE id = ?1
                    "#,
                )
                .bind(&snapshot.id)
                .bind(amount_cents)
                .bind(notes)
                .bind(recorded_by)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                snapshot.amount_cents = amount_cents;
                snapshot.notes = notes.map(str::to_string);
                snapshot.recorded_by = recorded_by.to_string();
                snapshot.updated_at = now;
                snapshot
            }
            None => {
                let snapshot = OpeningBalance {
                    id: Uuid::new_v4().to_string(),
                    day,
                    channel_kind: kind,
                    bank_account_id: account_id,
                    amount_cents,
                    notes: notes.map(str::to_string),
                    recorded_by: recorded_by.to_string(),
                    created_at: now,
                    updated_at: now,
                };

                sqlx::query(
                    r#"
                    INSERT INTO opening_balances (
                        id, day, channel_kind, bank_account_id, amount_cents,
                        notes, recorded_by, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                )
                .bind(&snapshot.id)
                .bind(snapshot.day)
                .bind(snapshot.channel_kind)
                .bind(&snapshot.bank_account_id)
                .bind(snapshot.amount_cents)
                .bind(&snapshot.notes)
                .bind(&snapshot.recorded_by)
                .bind(snapshot.created_at)
                .bind(snapshot.updated_at)
                .execute(&mut *tx)
                .await?;

                snapshot
            }
        };

        tx.commit().await?;

        Ok(snapshot)
    }

    // =========================================================================
    // Closing Balances
    // =========================================================================

    /// The most recent closing row for a channel within `[from, to]`,
    /// read inside the caller's transaction.
    ///
    /// This is the resolver's backward walk collapsed into one query:
    /// "the nearest prior day that has a computed closing".
    pub async fn closing_latest_in_on(
        &self,
        conn: &mut SqliteConnection,
        channel: &Channel,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Option<ChannelClose>> {
        let (kind, account_id) = channel.columns();

        let row = sqlx::query_as::<_, ChannelClose>(
            r#"
            SELECT day, channel_kind, bank_account_id, opening_cents,
                   income_cents, expense_cents, closing_cents, computed_at
            FROM closing_balances
            WHERE channel_kind = ?1 AND bank_account_id IS ?2
              AND day >= ?3 AND day <= ?4
            ORDER BY day DESC
            LIMIT 1
            "#,
        )
        .bind(kind)
        .bind(account_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    /// The most recent closing row for a channel within `[from, to]`,
    /// pool variant.
    pub async fn closing_latest_in(
        &self,
        channel: &Channel,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Option<ChannelClose>> {
        let mut conn = self.pool.acquire().await?;
        self.closing_latest_in_on(&mut *conn, channel, from, to)
            .await
    }

    /// Replaces all closing rows for a day with the given set.
    ///
    /// DELETE + INSERT in one transaction keeps recomputation idempotent:
    /// running the calculator twice leaves the same rows, never duplicates.
    pub async fn replace_closings(&self, day: NaiveDate, rows: &[ChannelClose]) -> DbResult<()> {
        debug!(%day, channels = rows.len(), "Replacing closing balances");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM closing_balances WHERE day = ?1")
            .bind(day)
            .execute(&mut *tx)
            .await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO closing_balances (
                    id, day, channel_kind, bank_account_id, opening_cents,
                    income_cents, expense_cents, closing_cents, computed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(row.day)
            .bind(row.channel_kind)
            .bind(&row.bank_account_id)
            .bind(row.opening_cents)
            .bind(row.income_cents)
            .bind(row.expense_cents)
            .bind(row.closing_cents)
            .bind(row.computed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// All closing rows persisted for a day.
    pub async fn closing_rows(&self, day: NaiveDate) -> DbResult<Vec<ChannelClose>> {
        let rows = sqlx::query_as::<_, ChannelClose>(
            r#"
            SELECT day, channel_kind, bank_account_id, opening_cents,
                   income_cents, expense_cents, closing_cents, computed_at
            FROM closing_balances
            WHERE day = ?1
            ORDER BY channel_kind, bank_account_id
            "#,
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
