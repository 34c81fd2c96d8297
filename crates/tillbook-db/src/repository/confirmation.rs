//! # Daily Confirmation Repository
//!
//! Per-(day, user) advisory confirmation flags.
//!
//! ## Lifecycle
//! ```text
//! (first status query) ──► row created as unconfirmed
//! Unconfirmed ──(confirm)──► Confirmed
//! ```
//! There is no transition back: "unconfirming" a day is a superseding
//! admin action outside this engine.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tillbook_core::ConfirmationStatus;

/// Repository for daily confirmation flags.
#[derive(Debug, Clone)]
pub struct ConfirmationRepository {
    pool: SqlitePool,
}

impl ConfirmationRepository {
    /// Creates a new ConfirmationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConfirmationRepository { pool }
    }

    /// Reads the confirmation status for a (day, user), creating the
    /// unconfirmed row on first sight.
    pub async fn status(&self, day: NaiveDate, user: &str) -> DbResult<ConfirmationStatus> {
        self.ensure_row(day, user).await?;
        self.fetch(day, user).await
    }

    /// Marks a (day, user) as confirmed.
    ///
    /// Idempotent: confirming an already-confirmed day leaves the original
    /// confirmation timestamp and user untouched and returns success.
    pub async fn confirm(
        &self,
        day: NaiveDate,
        user: &str,
        confirmed_at: DateTime<Utc>,
    ) -> DbResult<ConfirmationStatus> {
        self.ensure_row(day, user).await?;

        let result = sqlx::query(
            r#"
            UPDATE daily_confirmations SET
                confirmed = 1,
                confirmed_at = ?3,
                confirmed_by = ?2
            WHERE day = ?1 AND user_id = ?2 AND confirmed = 0
            "#,
        )
        .bind(day)
        .bind(user)
        .bind(confirmed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!(%day, user, "Day confirmed");
        }

        self.fetch(day, user).await
    }

    async fn ensure_row(&self, day: NaiveDate, user: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO daily_confirmations (
                day, user_id, confirmed, created_at
            ) VALUES (?1, ?2, 0, ?3)
            "#,
        )
        .bind(day)
        .bind(user)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, day: NaiveDate, user: &str) -> DbResult<ConfirmationStatus> {
        let status = sqlx::query_as::<_, ConfirmationStatus>(
            r#"
            SELECT day, confirmed, confirmed_at, confirmed_by
            FROM daily_confirmations
            WHERE day = ?1 AND user_id = ?2
            "#,
        )
        .bind(day)
        .bind(user)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Daily confirmation", format!("{day}/{user}")))?;

        Ok(status)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
