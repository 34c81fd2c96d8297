//! # Day Reconciliation
//!
//! The pure fold behind the closing-balance calculator: replays one
//! channel's entries for one day from a resolved opening balance, verifies
//! the stored before/after chain, and produces the day's totals.
//!
//! ## The Chain
//! ```text
//! opening ──► entry 1 ──► entry 2 ──► ... ──► entry n ──► closing
//!             before/after pairs must agree at every link:
//!
//!             after[i]    == before[i] ± amount[i]
//!             before[i+1] == after[i]
//! ```
//!
//! A mismatch is a [`CoreError::Inconsistency`]: the fold surfaces it and
//! never corrects stored balances.
//!
//! ## Opening Resets
//! An operator may store an opening-balance snapshot for a day that already
//! has entries. Entries posted before the snapshot was recorded keep their
//! balances; entries posted after it base on the snapshot amount. The fold
//! therefore verifies two chains split at the snapshot's recording time.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::{Channel, DayTotals, EntryDirection, LedgerEntry};

// =============================================================================
// Opening Reset
// =============================================================================

/// A stored opening-balance snapshot viewed as a mid-day chain reset.
///
/// `recorded_at` is the snapshot's last edit time; entries created at or
/// after it base their balance on `amount_cents`.
#[derive(Debug, Clone, Copy)]
pub struct OpeningReset {
    pub amount_cents: i64,
    pub recorded_at: DateTime<Utc>,
}

// =============================================================================
// Reconciliation Fold
// =============================================================================

/// Replays one channel's entries for one day and returns the day totals.
///
/// ## Arguments
/// * `channel` - the channel being reconciled (for error context)
/// * `opening_cents` - the resolved opening balance for the day
/// * `reset` - the day's stored opening snapshot, if any, as a chain reset
/// * `entries` - the day's entries in (occurred_at, seq) order
///
/// ## Errors
/// [`CoreError::Inconsistency`] when any entry's stored arithmetic or the
/// chain continuity fails to replay. Never silently corrected.
pub fn reconcile_day(
    channel: &Channel,
    opening_cents: i64,
    reset: Option<&OpeningReset>,
    entries: &[LedgerEntry],
) -> CoreResult<DayTotals> {
    let mut income_cents: i64 = 0;
    let mut expense_cents: i64 = 0;

    for entry in entries {
        check_arithmetic(channel, entry)?;
        match entry.direction {
            EntryDirection::Income => income_cents += entry.amount_cents,
            EntryDirection::Expense => expense_cents += entry.amount_cents,
        }
    }

    // Split the day at the snapshot's recording time. With no snapshot the
    // pre-chain is empty and everything replays from the opening balance.
    let boundary = match reset {
        Some(reset) => entries
            .iter()
            .position(|e| e.created_at >= reset.recorded_at)
            .unwrap_or(entries.len()),
        None => 0,
    };
    let (pre, post) = entries.split_at(boundary);

    // Entries posted before the snapshot keep the base they were written
    // with; only their internal continuity is checked.
    if let Some(first) = pre.first() {
        check_chain(channel, first.before_balance_cents, pre)?;
    }

    let post_base = match reset {
        Some(reset) => reset.amount_cents,
        None => opening_cents,
    };
    check_chain(channel, post_base, post)?;

    let closing_cents = match (post.last(), reset) {
        (Some(last), _) => last.after_balance_cents,
        (None, Some(reset)) => reset.amount_cents,
        (None, None) => match pre.last() {
            Some(last) => last.after_balance_cents,
            None => opening_cents,
        },
    };

    Ok(DayTotals {
        opening_cents,
        income_cents,
        expense_cents,
        closing_cents,
    })
}

/// Verifies the stored before/after continuity of a contiguous entry run.
///
/// Starts from the first entry's own base, so it can be applied to any
/// slice of a channel's history regardless of day boundaries.
pub fn verify_chain(channel: &Channel, entries: &[LedgerEntry]) -> CoreResult<()> {
    for entry in entries {
        check_arithmetic(channel, entry)?;
    }
    if let Some(first) = entries.first() {
        check_chain(channel, first.before_balance_cents, entries)?;
    }
    Ok(())
}

/// `after == before ± amount` for a single entry.
fn check_arithmetic(channel: &Channel, entry: &LedgerEntry) -> CoreResult<()> {
    let expected = entry
        .before_balance()
        .applied(entry.direction, entry.amount())
        .cents();
    if entry.after_balance_cents != expected {
        return Err(CoreError::Inconsistency {
            channel: channel.to_string(),
            entry_id: entry.id.clone(),
            expected_cents: expected,
            stored_cents: entry.after_balance_cents,
        });
    }
    Ok(())
}

/// `before[i] == running` for every entry in the run, starting from `base`.
fn check_chain(channel: &Channel, base_cents: i64, entries: &[LedgerEntry]) -> CoreResult<()> {
    let mut running = base_cents;
    for entry in entries {
        if entry.before_balance_cents != running {
            return Err(CoreError::Inconsistency {
                channel: channel.to_string(),
                entry_id: entry.id.clone(),
                expected_cents: running,
                stored_cents: entry.before_balance_cents,
            });
        }
        running = entry.after_balance_cents;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelKind, EntrySource};
    use chrono::{NaiveDate, TimeZone};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn entry(
        seq: i64,
        direction: EntryDirection,
        amount: i64,
        before: i64,
        after: i64,
        hour: u32,
    ) -> LedgerEntry {
        LedgerEntry {
            seq,
            id: format!("e-{seq}"),
            channel_kind: ChannelKind::Cash,
            bank_account_id: None,
            direction,
            source: EntrySource::Sale,
            source_document_id: None,
            amount_cents: amount,
            occurred_at: at(hour),
            occurred_on: day(),
            before_balance_cents: before,
            after_balance_cents: after,
            recorded_by: "user-1".to_string(),
            description: None,
            created_at: at(hour),
        }
    }

    #[test]
    fn test_empty_day_closes_at_opening() {
        let totals = reconcile_day(&Channel::Cash, 1000, None, &[]).unwrap();
        assert_eq!(totals.opening_cents, 1000);
        assert_eq!(totals.income_cents, 0);
        assert_eq!(totals.expense_cents, 0);
        assert_eq!(totals.closing_cents, 1000);
    }

    /// Opening 1000, income 500, expense 200: closes at 1300 with
    /// closing == opening + income - expense.
    #[test]
    fn test_clean_day_replays_to_closing() {
        let entries = [
            entry(1, EntryDirection::Income, 500, 1000, 1500, 9),
            entry(2, EntryDirection::Expense, 200, 1500, 1300, 11),
        ];
        let totals = reconcile_day(&Channel::Cash, 1000, None, &entries).unwrap();
        assert_eq!(totals.income_cents, 500);
        assert_eq!(totals.expense_cents, 200);
        assert_eq!(totals.closing_cents, 1300);
        assert_eq!(
            totals.closing_cents,
            totals.opening_cents + totals.income_cents - totals.expense_cents
        );
    }

    #[test]
    fn test_fold_is_deterministic() {
        let entries = [
            entry(1, EntryDirection::Income, 500, 1000, 1500, 9),
            entry(2, EntryDirection::Expense, 200, 1500, 1300, 11),
        ];
        let first = reconcile_day(&Channel::Cash, 1000, None, &entries).unwrap();
        let second = reconcile_day(&Channel::Cash, 1000, None, &entries).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bad_arithmetic_is_surfaced() {
        // stored after balance disagrees with before + amount
        let entries = [entry(1, EntryDirection::Income, 500, 1000, 1400, 9)];
        let err = reconcile_day(&Channel::Cash, 1000, None, &entries).unwrap_err();
        match err {
            CoreError::Inconsistency {
                expected_cents,
                stored_cents,
                ..
            } => {
                assert_eq!(expected_cents, 1500);
                assert_eq!(stored_cents, 1400);
            }
            other => panic!("expected Inconsistency, got {other:?}"),
        }
    }

    #[test]
    fn test_chain_break_is_surfaced() {
        // second entry's before balance skips 100 cents
        let entries = [
            entry(1, EntryDirection::Income, 500, 1000, 1500, 9),
            entry(2, EntryDirection::Income, 100, 1600, 1700, 10),
        ];
        let err = reconcile_day(&Channel::Cash, 1000, None, &entries).unwrap_err();
        assert!(matches!(err, CoreError::Inconsistency { .. }));
    }

    #[test]
    fn test_opening_mismatch_is_surfaced() {
        let entries = [entry(1, EntryDirection::Income, 500, 900, 1400, 9)];
        let err = reconcile_day(&Channel::Cash, 1000, None, &entries).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Inconsistency {
                expected_cents: 1000,
                stored_cents: 900,
                ..
            }
        ));
    }

    /// An operator stores a snapshot at 11:00 for a day that already has
    /// a 09:00 entry. The earlier entry keeps its base; the later entry
    /// bases on the snapshot.
    #[test]
    fn test_mid_day_reset_splits_the_chain() {
        let entries = [
            entry(1, EntryDirection::Income, 500, 0, 500, 9),
            entry(2, EntryDirection::Income, 600, 2000, 2600, 12),
        ];
        let reset = OpeningReset {
            amount_cents: 2000,
            recorded_at: at(11),
        };
        let totals = reconcile_day(&Channel::Cash, 2000, Some(&reset), &entries).unwrap();
        assert_eq!(totals.income_cents, 1100);
        assert_eq!(totals.closing_cents, 2600);
    }

    #[test]
    fn test_reset_recorded_before_all_entries_is_the_plain_chain() {
        let entries = [entry(1, EntryDirection::Income, 500, 2000, 2500, 9)];
        let reset = OpeningReset {
            amount_cents: 2000,
            recorded_at: at(0),
        };
        let totals = reconcile_day(&Channel::Cash, 2000, Some(&reset), &entries).unwrap();
        assert_eq!(totals.closing_cents, 2500);
    }

    #[test]
    fn test_reset_after_all_entries_sets_the_closing() {
        let entries = [entry(1, EntryDirection::Income, 500, 0, 500, 9)];
        let reset = OpeningReset {
            amount_cents: 3000,
            recorded_at: at(17),
        };
        let totals = reconcile_day(&Channel::Cash, 3000, Some(&reset), &entries).unwrap();
        // the operator's late snapshot is the base going forward
        assert_eq!(totals.closing_cents, 3000);
    }

    #[test]
    fn test_verify_chain_accepts_contiguous_run() {
        let entries = [
            entry(1, EntryDirection::Income, 500, 1000, 1500, 9),
            entry(2, EntryDirection::Expense, 200, 1500, 1300, 11),
            entry(3, EntryDirection::Income, 50, 1300, 1350, 12),
        ];
        assert!(verify_chain(&Channel::Cash, &entries).is_ok());
    }

    #[test]
    fn test_verify_chain_rejects_gap() {
        let entries = [
            entry(1, EntryDirection::Income, 500, 1000, 1500, 9),
            entry(2, EntryDirection::Income, 200, 1400, 1600, 11),
        ];
        assert!(verify_chain(&Channel::Cash, &entries).is_err());
    }
}
