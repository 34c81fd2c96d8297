//! # Closing Balance Calculator
//!
//! Derives and persists a day's closing balances, one row per channel.
//!
//! ## Calculation
//! ```text
//! for each channel (cash, active banks, plus any channel with entries):
//!     opening  = resolve_opening(day, channel)
//!     entries  = day's entries in (occurred_at, seq) order
//!     replay   = reconcile_day(...)   ← verifies every stored balance
//!     closing  = replay result
//! persist: DELETE day's rows + INSERT the new set (one transaction)
//! ```
//!
//! Recomputation replaces, never accumulates: the scheduled daily cutover
//! and the on-demand report path may both run for the same day without
//! drift. A replay mismatch is surfaced as `LedgerInconsistency` and the
//! day's stored rows are left untouched.

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::error::{DbError, LedgerResult};
use tillbook_core::{
    reconcile_day, Channel, ChannelClose, ClosingBalanceSnapshot, OpeningBasis, OpeningReset,
    ResolvedOpening,
};

use super::Ledger;

impl Ledger {
    /// Computes the day's closing balances and persists them, replacing
    /// any prior snapshot for the day. Idempotent.
    pub async fn compute_closing(&self, day: NaiveDate) -> LedgerResult<ClosingBalanceSnapshot> {
        let snapshot = self.assemble_closing(day).await?;
        self.snapshots()
            .replace_closings(day, &snapshot.channels)
            .await?;

        info!(
            %day,
            channels = snapshot.channels.len(),
            total_cents = snapshot.total_cents,
            "Closing balance computed"
        );

        Ok(snapshot)
    }

    /// The same computation as [`Ledger::compute_closing`] without
    /// persistence: "what would the closing balance be right now".
    pub async fn preview_closing(&self, day: NaiveDate) -> LedgerResult<ClosingBalanceSnapshot> {
        self.assemble_closing(day).await
    }

    /// Reads the persisted closing snapshot for a day, if one exists.
    pub async fn closing_snapshot(
        &self,
        day: NaiveDate,
    ) -> LedgerResult<Option<ClosingBalanceSnapshot>> {
        let rows = self.snapshots().closing_rows(day).await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let computed_at = rows
            .iter()
            .map(|row| row.computed_at)
            .max()
            .unwrap_or_else(Utc::now);
        Ok(Some(ClosingBalanceSnapshot::from_rows(day, computed_at, rows)))
    }

    /// Builds the day's per-channel rows by replaying every channel.
    async fn assemble_closing(&self, day: NaiveDate) -> LedgerResult<ClosingBalanceSnapshot> {
        let computed_at = Utc::now();

        // Cash and every active bank always get a row; channels that moved
        // money that day (deactivated banks, legacy cards) are added so no
        // movement is dropped from the day's book.
        let mut channels: Vec<Channel> = vec![Channel::Cash];
        for account in self.bank_accounts().list_active().await? {
            channels.push(Channel::Bank(account.id));
        }
        for (kind, account_id) in self.entries().channels_on(day).await? {
            let channel = Channel::from_columns(kind, account_id);
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }

        let mut rows = Vec::with_capacity(channels.len());
        for channel in &channels {
            rows.push(self.reconcile_channel(day, channel, computed_at).await?);
        }

        Ok(ClosingBalanceSnapshot::from_rows(day, computed_at, rows))
    }

    /// Replays one channel's day and returns its closing row.
    async fn reconcile_channel(
        &self,
        day: NaiveDate,
        channel: &Channel,
        computed_at: chrono::DateTime<Utc>,
    ) -> LedgerResult<ChannelClose> {
        let stored = self.snapshots().opening_for(day, channel).await?;

        let opening = match &stored {
            Some(snapshot) => ResolvedOpening {
                amount_cents: snapshot.amount_cents,
                basis: OpeningBasis::Snapshot,
            },
            None => {
                let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
                self.carry_forward_on(&mut *conn, day, channel).await?
            }
        };

        let entries = self.entries().list_for_day(day, Some(channel)).await?;
        let reset = stored.as_ref().map(|snapshot| OpeningReset {
            amount_cents: snapshot.amount_cents,
            recorded_at: snapshot.updated_at,
        });

        let totals = reconcile_day(channel, opening.amount_cents, reset.as_ref(), &entries)?;

        let (channel_kind, bank_account_id) = channel.columns();
        Ok(ChannelClose {
            day,
            channel_kind,
            bank_account_id,
            opening_cents: totals.opening_cents,
            income_cents: totals.income_cents,
            expense_cents: totals.expense_cents,
            closing_cents: totals.closing_cents,
            computed_at,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
