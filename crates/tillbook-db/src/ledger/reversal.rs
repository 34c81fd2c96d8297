//! # Reversal Handler
//!
//! Compensates a cancelled document's payments. History is never deleted:
//! each payment entry gets a new opposite-direction entry on the same
//! channel, and both stay in the book.
//!
//! ## Pairing Guard
//! ```text
//! payments(doc)  = entries with source in {sale, purchase_payment}
//! refunds(doc)   = entries with source in {sale_refund, purchase_refund}
//!
//! pair each payment with an unconsumed refund of equal (channel, amount):
//!   every payment paired  → AlreadyReversed (no entries posted)
//!   some unpaired         → reverse exactly the unpaired remainder
//! ```
//! The remainder rule is what makes a partial reversal retryable: a second
//! call touches only the channels that failed the first time.
//!
//! ## Partial Failure
//! Reversal of a multi-channel document is not atomic across channels.
//! Every channel is attempted; failures (say, a bank account deactivated
//! since the payment) are reported per channel in the outcome instead of
//! aborting the rest.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use tillbook_core::{Channel, FailedReversal, LedgerEntry, NewEntry, ReversalOutcome};

use super::Ledger;

impl Ledger {
    /// Reverses the payments of a cancelled sale/purchase document.
    ///
    /// ## Arguments
    /// * `document_id` - the cancelled document
    /// * `channel_hint` - restrict the reversal to one channel (used when
    ///   retrying a failed channel of an earlier partial reversal)
    /// * `cancelled_at` - when the cancellation happened; compensating
    ///   entries carry this as their `occurred_at`, not the original
    ///   payment time
    /// * `recorded_by` - the acting user
    ///
    /// ## Errors
    /// - `DocumentNotFound` when no payment-type entries reference the id
    /// - `AlreadyReversed` when every payment is already compensated
    ///
    /// Per-channel posting failures are NOT errors: they come back in
    /// [`ReversalOutcome::failed`] so the caller can retry just those.
    pub async fn reverse_document(
        &self,
        document_id: &str,
        channel_hint: Option<&Channel>,
        cancelled_at: DateTime<Utc>,
        recorded_by: &str,
    ) -> LedgerResult<ReversalOutcome> {
        let linked = self.entries().by_document(document_id).await?;

        let matches_hint = |entry: &LedgerEntry| match channel_hint {
            Some(channel) => entry.channel() == *channel,
            None => true,
        };

        let payments: Vec<&LedgerEntry> = linked
            .iter()
            .filter(|entry| entry.source.is_payment())
            .filter(|entry| matches_hint(entry))
            .collect();

        if payments.is_empty() {
            return Err(LedgerError::DocumentNotFound {
                document_id: document_id.to_string(),
            });
        }

        // Refunds already posted for this document, consumable once each.
        let mut refunds: Vec<(Channel, i64)> = linked
            .iter()
            .filter(|entry| entry.source.is_refund())
            .filter(|entry| matches_hint(entry))
            .map(|entry| (entry.channel(), entry.amount_cents))
            .collect();

        let mut pending: Vec<&LedgerEntry> = Vec::new();
        for payment in payments {
            let paired = refunds.iter().position(|(channel, amount)| {
                *channel == payment.channel() && *amount == payment.amount_cents
            });
            match paired {
                Some(index) => {
                    refunds.remove(index);
                }
                None => pending.push(payment),
            }
        }

        if pending.is_empty() {
            return Err(LedgerError::AlreadyReversed {
                document_id: document_id.to_string(),
            });
        }

        debug!(
            document_id,
            pending = pending.len(),
            "Reversing document payments"
        );

        let mut reversed = Vec::new();
        let mut failed = Vec::new();

        for payment in pending {
            let Some(refund_source) = payment.source.refund_source() else {
                continue;
            };

            let compensation = NewEntry {
                channel: payment.channel(),
                direction: payment.direction.opposite(),
                source: refund_source,
                source_document_id: payment.source_document_id.clone(),
                amount_cents: payment.amount_cents,
                occurred_at: cancelled_at,
                recorded_by: recorded_by.to_string(),
                description: Some(format!("Reversal of entry {}", payment.id)),
            };

            match self.post(compensation).await {
                Ok(entry) => reversed.push(entry),
                Err(error) => {
                    warn!(
                        document_id,
                        channel = %payment.channel(),
                        %error,
                        "Channel reversal failed, continuing with remaining channels"
                    );
                    failed.push(FailedReversal {
                        channel: payment.channel(),
                        amount_cents: payment.amount_cents,
                        reason: error.to_string(),
                    });
                }
            }
        }

        Ok(ReversalOutcome {
            document_id: document_id.to_string(),
            reversed,
            failed,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use tillbook_core::{EntryDirection, EntryQuery, EntrySource};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn payment(channel: &Channel, source: EntrySource, amount_cents: i64, doc: &str) -> NewEntry {
        NewEntry {
            channel: channel.clone(),
            direction: match source {
                EntrySource::PurchasePayment => EntryDirection::Expense,
                _ => EntryDirection::Income,
            },
            source,
            source_document_id: Some(doc.to_string()),
            amount_cents,
            occurred_at: Utc::now(),
            recorded_by: "user-1".to_string(),
            description: None,
        }
    }

    /// Round trip: reversing a single cash payment restores the balance
    /// that held immediately before the payment.
    #[tokio::test]
    async fn test_single_payment_round_trip() {
        let db = test_db().await;
        let ledger = db.ledger();

        ledger
            .set_opening_balance(ledger.today(), &Channel::Cash, 1000, None, "user-1")
            .await
            .unwrap();
        let original = ledger
            .post(payment(&Channel::Cash, EntrySource::Sale, 500, "sale-1"))
            .await
            .unwrap();

        let outcome = ledger
            .reverse_document("sale-1", None, Utc::now(), "user-2")
            .await
            .unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.reversed.len(), 1);

        let refund = &outcome.reversed[0];
        assert_eq!(refund.source, EntrySource::SaleRefund);
        assert_eq!(refund.direction, EntryDirection::Expense);
        assert_eq!(refund.amount_cents, 500);
        assert_eq!(refund.after_balance_cents, original.before_balance_cents);
        assert_eq!(refund.source_document_id.as_deref(), Some("sale-1"));
    }

    #[tokio::test]
    async fn test_reversal_carries_cancellation_time() {
        let db = test_db().await;
        let ledger = db.ledger();

        ledger
            .post(payment(&Channel::Cash, EntrySource::Sale, 500, "sale-1"))
            .await
            .unwrap();

        let cancelled_at = Utc::now();
        let outcome = ledger
            .reverse_document("sale-1", None, cancelled_at, "user-1")
            .await
            .unwrap();
        assert_eq!(outcome.reversed[0].occurred_at, cancelled_at);
    }

    #[tokio::test]
    async fn test_purchase_payment_reverses_as_income() {
        let db = test_db().await;
        let ledger = db.ledger();

        ledger
            .post(payment(
                &Channel::Cash,
                EntrySource::PurchasePayment,
                300,
                "purchase-1",
            ))
            .await
            .unwrap();

        let outcome = ledger
            .reverse_document("purchase-1", None, Utc::now(), "user-1")
            .await
            .unwrap();

        let refund = &outcome.reversed[0];
        assert_eq!(refund.source, EntrySource::PurchaseRefund);
        assert_eq!(refund.direction, EntryDirection::Income);
    }

    #[tokio::test]
    async fn test_double_reversal_is_rejected_and_posts_nothing() {
        let db = test_db().await;
        let ledger = db.ledger();

        ledger
            .post(payment(&Channel::Cash, EntrySource::Sale, 500, "sale-1"))
            .await
            .unwrap();
        ledger
            .reverse_document("sale-1", None, Utc::now(), "user-1")
            .await
            .unwrap();

        let err = ledger
            .reverse_document("sale-1", None, Utc::now(), "user-1")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyReversed { .. }));

        let entries = ledger.entries().by_document("sale-1").await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_document_is_not_found() {
        let db = test_db().await;
        let ledger = db.ledger();

        let err = ledger
            .reverse_document("no-such-doc", None, Utc::now(), "user-1")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DocumentNotFound { .. }));
    }

    /// Split payment across cash and a bank; the bank is deactivated before
    /// cancellation. The cash side must still reverse, with the bank side
    /// reported as failed - and a retry must not touch cash again.
    #[tokio::test]
    async fn test_partial_reversal_reports_failed_channels() {
        let db = test_db().await;
        let ledger = db.ledger();

        let account = db.bank_accounts().insert("Main", None).await.unwrap();
        let bank = Channel::Bank(account.id.clone());

        ledger
            .post(payment(&Channel::Cash, EntrySource::Sale, 600, "sale-1"))
            .await
            .unwrap();
        ledger
            .post(payment(&bank, EntrySource::Sale, 400, "sale-1"))
            .await
            .unwrap();

        db.bank_accounts().deactivate(&account.id).await.unwrap();

        let outcome = ledger
            .reverse_document("sale-1", None, Utc::now(), "user-1")
            .await
            .unwrap();
        assert!(outcome.is_partial());
        assert_eq!(outcome.reversed.len(), 1);
        assert_eq!(outcome.reversed[0].channel(), Channel::Cash);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].channel, bank);
        assert_eq!(outcome.failed[0].amount_cents, 400);

        // retry: the cash refund already pairs, only the bank is attempted
        let retry = ledger
            .reverse_document("sale-1", None, Utc::now(), "user-1")
            .await
            .unwrap();
        assert!(retry.reversed.is_empty());
        assert_eq!(retry.failed.len(), 1);

        let entries = ledger.entries().by_document("sale-1").await.unwrap();
        let refunds = entries.iter().filter(|e| e.source.is_refund()).count();
        assert_eq!(refunds, 1);
    }

    #[tokio::test]
    async fn test_channel_hint_limits_the_reversal() {
        let db = test_db().await;
        let ledger = db.ledger();

        let account = db.bank_accounts().insert("Main", None).await.unwrap();
        let bank = Channel::Bank(account.id.clone());

        ledger
            .post(payment(&Channel::Cash, EntrySource::Sale, 600, "sale-1"))
            .await
            .unwrap();
        ledger
            .post(payment(&bank, EntrySource::Sale, 400, "sale-1"))
            .await
            .unwrap();

        let outcome = ledger
            .reverse_document("sale-1", Some(&Channel::Cash), Utc::now(), "user-1")
            .await
            .unwrap();
        assert_eq!(outcome.reversed.len(), 1);
        assert_eq!(outcome.reversed[0].channel(), Channel::Cash);

        // the bank payment is still unreversed
        let refunds = ledger
            .query_entries(
                &EntryQuery::day(ledger.today()).source(EntrySource::SaleRefund),
            )
            .await
            .unwrap();
        assert_eq!(refunds.len(), 1);
    }

    /// Two partial cash payments of equal amount against one document:
    /// each reversal call compensates exactly one of them.
    #[tokio::test]
    async fn test_equal_amount_payments_pair_one_to_one() {
        let db = test_db().await;
        let ledger = db.ledger();

        ledger
            .post(payment(&Channel::Cash, EntrySource::Sale, 250, "sale-1"))
            .await
            .unwrap();
        ledger
            .post(payment(&Channel::Cash, EntrySource::Sale, 250, "sale-1"))
            .await
            .unwrap();

        let first = ledger
            .reverse_document("sale-1", None, Utc::now(), "user-1")
            .await
            .unwrap();
        assert_eq!(first.reversed.len(), 2);

        let err = ledger
            .reverse_document("sale-1", None, Utc::now(), "user-1")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyReversed { .. }));
    }
}
