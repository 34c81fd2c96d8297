//! # Opening Balance Resolver
//!
//! Answers "what did this channel start the day with" for any date.
//!
//! ## Two-Tier Resolution
//! ```text
//! resolve_opening(day, channel)
//!        │
//!        ├── 1. stored snapshot for (day, channel)?  → authoritative
//!        │
//!        ├── 2. nearest prior closing within the lookback window
//!        │      [day - max_lookback_days, day - 1]   → carried forward
//!        │
//!        └── 3. nothing found → zero, flagged LookbackExhausted
//! ```
//!
//! The resolver is pure given the stored data: no caching between calls,
//! because operators can edit snapshots after the fact.

use chrono::{Days, NaiveDate};
use sqlx::SqliteConnection;
use tracing::warn;

use crate::error::{DbError, LedgerResult};
use tillbook_core::{Channel, OpeningBasis, ResolvedOpening};

use super::Ledger;

impl Ledger {
    /// Resolves the opening balance for a (day, channel).
    ///
    /// Returns the amount together with its basis, so callers can warn the
    /// operator when the zero fallback was used.
    pub async fn resolve_opening(
        &self,
        day: NaiveDate,
        channel: &Channel,
    ) -> LedgerResult<ResolvedOpening> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        self.resolve_opening_on(&mut *conn, day, channel).await
    }

    /// Resolver variant running on the caller's connection/transaction.
    pub(crate) async fn resolve_opening_on(
        &self,
        conn: &mut SqliteConnection,
        day: NaiveDate,
        channel: &Channel,
    ) -> LedgerResult<ResolvedOpening> {
        if let Some(snapshot) = self.snapshots().opening_for_on(conn, day, channel).await? {
            return Ok(ResolvedOpening {
                amount_cents: snapshot.amount_cents,
                basis: OpeningBasis::Snapshot,
            });
        }

        self.carry_forward_on(conn, day, channel).await
    }

    /// The fallback tier: nearest prior closing within the lookback
    /// window, else the flagged zero.
    pub(crate) async fn carry_forward_on(
        &self,
        conn: &mut SqliteConnection,
        day: NaiveDate,
        channel: &Channel,
    ) -> LedgerResult<ResolvedOpening> {
        let exhausted = ResolvedOpening {
            amount_cents: 0,
            basis: OpeningBasis::LookbackExhausted,
        };

        let Some(prev) = day.pred_opt() else {
            return Ok(exhausted);
        };
        let floor = day
            .checked_sub_days(Days::new(u64::from(self.config.max_lookback_days)))
            .unwrap_or(NaiveDate::MIN);

        if let Some(closing) = self
            .snapshots()
            .closing_latest_in_on(conn, channel, floor, prev)
            .await?
        {
            return Ok(ResolvedOpening {
                amount_cents: closing.closing_cents,
                basis: OpeningBasis::PriorClosing { day: closing.day },
            });
        }

        warn!(
            %day,
            channel = %channel,
            lookback_days = self.config.max_lookback_days,
            "Opening balance lookback exhausted, assuming zero"
        );
        Ok(exhausted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
