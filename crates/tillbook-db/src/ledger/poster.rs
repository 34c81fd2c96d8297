//! # Balance Poster
//!
//! The single write path all callers use to record a channel-affecting
//! event. Nothing else in the system mutates a channel's balance.
//!
//! ## Posting Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       One Post, Step By Step                            │
//! │                                                                         │
//! │  1. validate input           amount > 0, user present                  │
//! │  2. check channel            cash, or active bank account              │
//! │  3. acquire channel lock     bounded wait → ConcurrentModification     │
//! │  4. BEGIN                                                              │
//! │  5. read base balance        latest entry / day snapshot / resolver    │
//! │  6. compute after balance    base ± amount per direction               │
//! │  7. INSERT entry             before and after captured together        │
//! │  8. COMMIT                                                             │
//! │                                                                         │
//! │  Exactly one new row. No other state changes.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The base balance is the channel's balance *as of now*, not as of the
//! entry's `occurred_at`: a backdated payment still moves today's running
//! balance.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, LedgerResult};
use tillbook_core::validation::validate_new_entry;
use tillbook_core::{LedgerEntry, Money, NewEntry};

use super::Ledger;

impl Ledger {
    /// Posts a balance-affecting event and returns the written entry.
    ///
    /// ## Errors
    /// - `Core(InvalidAmount)` when `amount_cents <= 0`
    /// - `UnknownChannel` when the channel is not cash or an active bank
    /// - `ConcurrentModification` when the channel lock wait expires
    ///
    /// ## Contract
    /// Callers invoke this exactly once per logical payment event; the
    /// engine does not deduplicate repeated posts of the same payment.
    pub async fn post(&self, input: NewEntry) -> LedgerResult<LedgerEntry> {
        validate_new_entry(&input)?;
        self.ensure_postable_channel(&input.channel).await?;

        // Serialize against other posts to the same channel. Posts to other
        // channels proceed in parallel.
        let _guard = self
            .locks
            .acquire(&input.channel, self.config.lock_wait)
            .await?;

        let day = self.day_of(input.occurred_at);
        let now = Utc::now();
        let entries = self.entries();

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Base balance and insert share this transaction, so the captured
        // before/after pair can never be computed from a stale read.
        let before_cents = {
            let latest = entries
                .latest_for_channel_on(&mut tx, &input.channel)
                .await?;
            let snapshot = self
                .snapshots()
                .opening_for_on(&mut tx, day, &input.channel)
                .await?;

            match &latest {
                // Channel has never moved: the entry's own day decides.
                None => match &snapshot {
                    Some(snapshot) => snapshot.amount_cents,
                    None => {
                        self.carry_forward_on(&mut tx, day, &input.channel)
                            .await?
                            .amount_cents
                    }
                },
                // First post of a new day: a stored snapshot for the day
                // wins, otherwise the balance carries across the gap.
                Some(latest) if latest.occurred_on < day => snapshot
                    .as_ref()
                    .map(|s| s.amount_cents)
                    .unwrap_or(latest.after_balance_cents),
                // Same day: an operator snapshot recorded after the latest
                // entry is a mid-day reset and becomes the new base.
                Some(latest) if latest.occurred_on == day => match &snapshot {
                    Some(snapshot) if snapshot.updated_at > latest.created_at => {
                        snapshot.amount_cents
                    }
                    _ => latest.after_balance_cents,
                },
                // Backdated post: the current balance still rules.
                Some(latest) => latest.after_balance_cents,
            }
        };

        let after_cents = Money::from_cents(before_cents)
            .applied(input.direction, input.amount())
            .cents();

        let (channel_kind, bank_account_id) = input.channel.columns();
        let mut entry = LedgerEntry {
            seq: 0,
            id: Uuid::new_v4().to_string(),
            channel_kind,
            bank_account_id,
            direction: input.direction,
            source: input.source,
            source_document_id: input.source_document_id.clone(),
            amount_cents: input.amount_cents,
            occurred_at: input.occurred_at,
            occurred_on: day,
            before_balance_cents: before_cents,
            after_balance_cents: after_cents,
            recorded_by: input.recorded_by.clone(),
            description: input.description.clone(),
            created_at: now,
        };

        entry.seq = entries.insert_on(&mut tx, &entry).await?;

        tx.commit().await.map_err(DbError::from)?;

        debug!(
            id = %entry.id,
            channel = %entry.channel(),
            source = ?entry.source,
            before_cents = entry.before_balance_cents,
            after_cents = entry.after_balance_cents,
            "Posted ledger entry"
        );

        Ok(entry)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::ledger::LedgerConfig;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration as ChronoDuration;
    use std::collections::HashSet;
    use std::time::Duration;
    use tillbook_core::{Channel, CoreError, EntryDirection, EntrySource};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_entry(
        channel: &Channel,
        direction: EntryDirection,
        amount_cents: i64,
        document: Option<&str>,
    ) -> NewEntry {
        NewEntry {
            channel: channel.clone(),
            direction,
            source: match direction {
                EntryDirection::Income => EntrySource::Sale,
                EntryDirection::Expense => EntrySource::Expense,
            },
            source_document_id: document.map(str::to_string),
            amount_cents,
            occurred_at: Utc::now(),
            recorded_by: "user-1".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_post_chains_before_and_after() {
        let db = test_db().await;
        let ledger = db.ledger();
        let today = ledger.today();

        ledger
            .set_opening_balance(today, &Channel::Cash, 1000, None, "user-1")
            .await
            .unwrap();

        let sale = ledger
            .post(new_entry(
                &Channel::Cash,
                EntryDirection::Income,
                500,
                Some("sale-1"),
            ))
            .await
            .unwrap();
        assert_eq!(sale.before_balance_cents, 1000);
        assert_eq!(sale.after_balance_cents, 1500);

        let expense = ledger
            .post(new_entry(&Channel::Cash, EntryDirection::Expense, 200, None))
            .await
            .unwrap();
        assert_eq!(expense.before_balance_cents, 1500);
        assert_eq!(expense.after_balance_cents, 1300);
    }

    #[tokio::test]
    async fn test_first_post_with_no_data_starts_at_zero() {
        let db = test_db().await;
        let ledger = db.ledger();

        let entry = ledger
            .post(new_entry(&Channel::Cash, EntryDirection::Income, 750, None))
            .await
            .unwrap();
        assert_eq!(entry.before_balance_cents, 0);
        assert_eq!(entry.after_balance_cents, 750);
    }

    #[tokio::test]
    async fn test_post_rejects_non_positive_amount() {
        let db = test_db().await;
        let ledger = db.ledger();

        let err = ledger
            .post(new_entry(&Channel::Cash, EntryDirection::Income, 0, None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InvalidAmount { amount_cents: 0 })
        ));
    }

    #[tokio::test]
    async fn test_post_rejects_unknown_and_inactive_banks() {
        let db = test_db().await;
        let ledger = db.ledger();

        let err = ledger
            .post(new_entry(
                &Channel::Bank("ghost".to_string()),
                EntryDirection::Income,
                100,
                None,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownChannel { .. }));

        let account = db.bank_accounts().insert("Main", None).await.unwrap();
        let bank = Channel::Bank(account.id.clone());
        assert!(ledger
            .post(new_entry(&bank, EntryDirection::Income, 100, None))
            .await
            .is_ok());

        db.bank_accounts().deactivate(&account.id).await.unwrap();
        let err = ledger
            .post(new_entry(&bank, EntryDirection::Income, 100, None))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownChannel { .. }));
    }

    #[tokio::test]
    async fn test_post_rejects_legacy_card_channel() {
        let db = test_db().await;
        let ledger = db.ledger();

        let err = ledger
            .post(new_entry(
                &Channel::Card("card-1".to_string()),
                EntryDirection::Income,
                100,
                None,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownChannel { .. }));
    }

    /// Two concurrent cash posts of 100 against an empty channel must end
    /// up with the pairs {0→100} and {100→200} in some order, never twice
    /// {0→100}.
    #[tokio::test]
    async fn test_concurrent_posts_never_share_a_base() {
        let db = test_db().await;
        let ledger = db.ledger();

        let a = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .post(new_entry(&Channel::Cash, EntryDirection::Income, 100, None))
                    .await
                    .unwrap()
            })
        };
        let b = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .post(new_entry(&Channel::Cash, EntryDirection::Income, 100, None))
                    .await
                    .unwrap()
            })
        };

        let first = a.await.unwrap();
        let second = b.await.unwrap();

        let pairs: HashSet<(i64, i64)> = [first, second]
            .iter()
            .map(|e| (e.before_balance_cents, e.after_balance_cents))
            .collect();
        let expected: HashSet<(i64, i64)> = [(0, 100), (100, 200)].into_iter().collect();
        assert_eq!(pairs, expected);
    }

    #[tokio::test]
    async fn test_lock_timeout_fails_with_concurrent_modification() {
        let db = test_db().await;
        let ledger = db.ledger_with(LedgerConfig::default().lock_wait(Duration::from_millis(10)));

        let _held = ledger
            .locks
            .acquire(&Channel::Cash, Duration::from_secs(1))
            .await
            .unwrap();

        let err = ledger
            .post(new_entry(&Channel::Cash, EntryDirection::Income, 100, None))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConcurrentModification { .. }));
        assert!(err.is_retryable());
    }

    /// A payment logged late still moves the current balance, while its
    /// day bucket follows occurred_at.
    #[tokio::test]
    async fn test_backdated_post_uses_current_balance() {
        let db = test_db().await;
        let ledger = db.ledger();

        ledger
            .post(new_entry(&Channel::Cash, EntryDirection::Income, 500, None))
            .await
            .unwrap();

        let mut backdated = new_entry(&Channel::Cash, EntryDirection::Expense, 100, None);
        backdated.occurred_at = Utc::now() - ChronoDuration::days(1);
        let entry = ledger.post(backdated).await.unwrap();

        assert_eq!(entry.before_balance_cents, 500);
        assert_eq!(entry.after_balance_cents, 400);
        assert_eq!(entry.occurred_on, ledger.today().pred_opt().unwrap());
    }

    /// An opening snapshot stored after the day already has entries becomes
    /// the base for later posts; earlier balances stand.
    #[tokio::test]
    async fn test_mid_day_snapshot_resets_the_base() {
        let db = test_db().await;
        let ledger = db.ledger();
        let today = ledger.today();

        let first = ledger
            .post(new_entry(&Channel::Cash, EntryDirection::Income, 500, None))
            .await
            .unwrap();
        assert_eq!(first.before_balance_cents, 0);

        ledger
            .set_opening_balance(today, &Channel::Cash, 2000, Some("recount"), "user-1")
            .await
            .unwrap();

        let second = ledger
            .post(new_entry(&Channel::Cash, EntryDirection::Income, 100, None))
            .await
            .unwrap();
        assert_eq!(second.before_balance_cents, 2000);
        assert_eq!(second.after_balance_cents, 2100);
    }
}
