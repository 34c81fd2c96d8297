//! # Domain Types
//!
//! Core domain types for the Tillbook balance ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   LedgerEntry   │   │ OpeningBalance  │   │  ChannelClose   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  day            │   │  day            │       │
//! │  │  channel        │   │  channel        │   │  channel        │       │
//! │  │  direction      │   │  amount_cents   │   │  opening_cents  │       │
//! │  │  amount_cents   │   │  recorded_by    │   │  income_cents   │       │
//! │  │  before/after   │   └─────────────────┘   │  closing_cents  │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Channel      │   │ EntryDirection  │   │   EntrySource   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Cash           │   │  Income         │   │  Sale           │       │
//! │  │  Bank(id)       │   │  Expense        │   │  SaleRefund     │       │
//! │  │  Card(id)†      │   └─────────────────┘   │  Expense, ...   │       │
//! │  └─────────────────┘     † legacy, read-only └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Ledger entries have:
//! - `id`: UUID v4 - immutable, used for references
//! - `seq`: monotonic insertion sequence - chronological tie-breaker

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Maximum length of a ledger entry description.
pub const MAX_DESCRIPTION_LEN: usize = 500;

// =============================================================================
// Channel
// =============================================================================

/// Storage discriminant for [`Channel`].
///
/// Persisted as TEXT next to an optional account id column, so a channel is
/// always the pair (`channel_kind`, `bank_account_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// The single physical cash drawer.
    Cash,
    /// A specific bank account.
    Bank,
    /// Legacy card channel. Appears in historical entries and closing
    /// snapshots only; new postings are rejected.
    Card,
}

/// Identifies where money lives: the cash drawer or a specific bank account.
///
/// Channels are not created or destroyed by the ledger; bank channels
/// reference the bank-account registry by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Channel {
    Cash,
    Bank(String),
    Card(String),
}

impl Channel {
    /// Returns the storage discriminant for this channel.
    pub fn kind(&self) -> ChannelKind {
        match self {
            Channel::Cash => ChannelKind::Cash,
            Channel::Bank(_) => ChannelKind::Bank,
            Channel::Card(_) => ChannelKind::Card,
        }
    }

    /// Returns the account id for bank/card channels.
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Channel::Cash => None,
            Channel::Bank(id) | Channel::Card(id) => Some(id.as_str()),
        }
    }

    /// Splits the channel into its persisted column pair.
    pub fn columns(&self) -> (ChannelKind, Option<String>) {
        (self.kind(), self.account_id().map(str::to_string))
    }

    /// Rebuilds a channel from its persisted column pair.
    ///
    /// A bank/card row with a missing account id is collapsed to an empty
    /// id rather than panicking; the registry lookup will reject it.
    pub fn from_columns(kind: ChannelKind, account_id: Option<String>) -> Channel {
        match kind {
            ChannelKind::Cash => Channel::Cash,
            ChannelKind::Bank => Channel::Bank(account_id.unwrap_or_default()),
            ChannelKind::Card => Channel::Card(account_id.unwrap_or_default()),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Cash => write!(f, "cash"),
            Channel::Bank(id) => write!(f, "bank:{id}"),
            Channel::Card(id) => write!(f, "card:{id}"),
        }
    }
}

// =============================================================================
// Entry Direction
// =============================================================================

/// The direction of a ledger entry relative to its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    /// Money entered the channel.
    Income,
    /// Money left the channel.
    Expense,
}

impl EntryDirection {
    /// The opposite direction; used when posting compensating entries.
    pub fn opposite(&self) -> EntryDirection {
        match self {
            EntryDirection::Income => EntryDirection::Expense,
            EntryDirection::Expense => EntryDirection::Income,
        }
    }
}

// =============================================================================
// Entry Source
// =============================================================================

/// The business origin of a ledger entry.
///
/// A closed enumeration: the ledger never stores free-form source strings.
/// The UI labels for each source live in [`EntrySource::label`], the single
/// mapping table at the presentation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    /// A sale payment received.
    Sale,
    /// Compensation for a cancelled sale's payment.
    SaleRefund,
    /// A payment made against a purchase.
    PurchasePayment,
    /// Compensation for a cancelled purchase's payment.
    PurchaseRefund,
    /// A recorded business expense.
    Expense,
    /// Operator addition on top of a day's opening balance.
    OpeningBalanceAddition,
    /// Operator deduction from a day's opening balance.
    OpeningBalanceDeduction,
    /// A manual correction with no originating document.
    ManualAdd,
}

impl EntrySource {
    /// Operator-facing label for this source.
    ///
    /// ## Why a single table?
    /// The original admin screens re-derived these strings in half a dozen
    /// places. Keeping one mapping here means reporting, receipts, and the
    /// daily book all agree on wording.
    pub fn label(&self) -> &'static str {
        match self {
            EntrySource::Sale => "Sale payment",
            EntrySource::SaleRefund => "Sale refund",
            EntrySource::PurchasePayment => "Purchase payment",
            EntrySource::PurchaseRefund => "Purchase refund",
            EntrySource::Expense => "Expense",
            EntrySource::OpeningBalanceAddition => "Opening balance addition",
            EntrySource::OpeningBalanceDeduction => "Opening balance deduction",
            EntrySource::ManualAdd => "Manual adjustment",
        }
    }

    /// Whether this source is a payment against a business document.
    ///
    /// Only payment-type entries are candidates for document reversal.
    pub fn is_payment(&self) -> bool {
        matches!(self, EntrySource::Sale | EntrySource::PurchasePayment)
    }

    /// Whether this source is a compensating refund entry.
    pub fn is_refund(&self) -> bool {
        matches!(self, EntrySource::SaleRefund | EntrySource::PurchaseRefund)
    }

    /// The refund source that compensates this payment source.
    ///
    /// Returns `None` for sources that are not reversible payments.
    pub fn refund_source(&self) -> Option<EntrySource> {
        match self {
            EntrySource::Sale => Some(EntrySource::SaleRefund),
            EntrySource::PurchasePayment => Some(EntrySource::PurchaseRefund),
            _ => None,
        }
    }
}

// =============================================================================
// Ledger Entry
// =============================================================================

/// One immutable record of a balance-affecting event.
///
/// ## Immutability
/// Entries are created once by the posting engine and never updated or
/// deleted. Reversals add new compensating entries referencing the same
/// `source_document_id`.
///
/// ## Balance Capture
/// `before_balance_cents` and `after_balance_cents` are captured in the
/// same transaction as the balance read, so for any channel the entries
/// form a verifiable chain:
/// ```text
/// after[i] == before[i] ± amount[i]      (per direction)
/// before[i+1] == after[i]                (no intervening opening reset)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LedgerEntry {
    /// Monotonic insertion sequence; chronological tie-breaker.
    pub seq: i64,
    /// Unique identifier (UUID v4).
    pub id: String,
    pub channel_kind: ChannelKind,
    /// Account id for bank/card channels.
    pub bank_account_id: Option<String>,
    pub direction: EntryDirection,
    pub source: EntrySource,
    /// Link to the originating sale/purchase/expense record.
    /// `None` for pure corrections.
    pub source_document_id: Option<String>,
    /// Non-negative monetary value in cents.
    pub amount_cents: i64,
    /// When the money actually moved. Used for day-bucketing and ordering;
    /// distinct from `created_at` since a payment may be logged later than
    /// the underlying document.
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
    /// Day bucket derived from `occurred_at` in the ledger's local offset.
    #[ts(as = "String")]
    pub occurred_on: NaiveDate,
    /// Channel balance immediately before this entry.
    pub before_balance_cents: i64,
    /// Channel balance immediately after this entry.
    pub after_balance_cents: i64,
    /// Identifier of the acting user.
    pub recorded_by: String,
    pub description: Option<String>,
    /// When the entry row was written.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the channel this entry moved money through.
    pub fn channel(&self) -> Channel {
        Channel::from_columns(self.channel_kind, self.bank_account_id.clone())
    }

    /// Returns the entry amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Returns the captured balance before this entry.
    #[inline]
    pub fn before_balance(&self) -> Money {
        Money::from_cents(self.before_balance_cents)
    }

    /// Returns the captured balance after this entry.
    #[inline]
    pub fn after_balance(&self) -> Money {
        Money::from_cents(self.after_balance_cents)
    }
}

/// Input to the posting engine: everything the caller knows about a
/// balance-affecting event, before balances are captured.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewEntry {
    pub channel: Channel,
    pub direction: EntryDirection,
    pub source: EntrySource,
    pub source_document_id: Option<String>,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
    pub recorded_by: String,
    pub description: Option<String>,
}

impl NewEntry {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Bank Account
// =============================================================================

/// A bank account channel registered with the ledger.
///
/// Accounts are managed by the admin layer; the ledger only consults this
/// registry to answer "does this channel exist and is it active".
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BankAccount {
    pub id: String,
    pub name: String,
    pub account_number: Option<String>,
    /// Soft delete flag. Inactive accounts reject new postings but keep
    /// their history.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Opening Balance
// =============================================================================

/// A manually stored opening-balance snapshot for one (day, channel) pair.
///
/// Authoritative when present: the resolver never merges it with computed
/// values.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OpeningBalance {
    pub id: String,
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub channel_kind: ChannelKind,
    pub bank_account_id: Option<String>,
    pub amount_cents: i64,
    pub notes: Option<String>,
    pub recorded_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Last time the operator edited the stored amount. The posting engine
    /// compares this against entry creation times to honour mid-day resets.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl OpeningBalance {
    /// Returns the channel this snapshot belongs to.
    pub fn channel(&self) -> Channel {
        Channel::from_columns(self.channel_kind, self.bank_account_id.clone())
    }

    /// Returns the stored amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// How an opening balance was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum OpeningBasis {
    /// A stored snapshot for the requested day was found.
    Snapshot,
    /// Carried forward from the closing balance of an earlier day.
    PriorClosing {
        #[ts(as = "String")]
        day: NaiveDate,
    },
    /// The lookback bound was reached with no data; resolved as zero.
    /// Callers should warn the operator.
    LookbackExhausted,
}

/// The result of opening-balance resolution: an amount plus where it came
/// from, so callers can distinguish "stored", "carried" and "assumed zero".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedOpening {
    pub amount_cents: i64,
    pub basis: OpeningBasis,
}

impl ResolvedOpening {
    /// Returns the resolved amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Closing Balances
// =============================================================================

/// Totals produced by replaying one channel's entries for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DayTotals {
    pub opening_cents: i64,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub closing_cents: i64,
}

impl DayTotals {
    /// Returns the closing balance as Money.
    #[inline]
    pub fn closing(&self) -> Money {
        Money::from_cents(self.closing_cents)
    }
}

/// One persisted closing-balance row: a (day, channel) pair with its
/// opening, movement and closing amounts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ChannelClose {
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub channel_kind: ChannelKind,
    pub bank_account_id: Option<String>,
    pub opening_cents: i64,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub closing_cents: i64,
    #[ts(as = "String")]
    pub computed_at: DateTime<Utc>,
}

impl ChannelClose {
    /// Returns the channel this row belongs to.
    pub fn channel(&self) -> Channel {
        Channel::from_columns(self.channel_kind, self.bank_account_id.clone())
    }

    /// Returns the closing balance as Money.
    #[inline]
    pub fn closing(&self) -> Money {
        Money::from_cents(self.closing_cents)
    }
}

/// Closing balance of one bank/card account within a day snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccountBalance {
    pub account_id: String,
    pub closing_cents: i64,
}

/// The assembled closing-balance snapshot for one day across all channels.
///
/// `cards` carries balances for the legacy card channel so historical days
/// keep totalling correctly.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClosingBalanceSnapshot {
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub cash_cents: i64,
    pub banks: Vec<AccountBalance>,
    pub cards: Vec<AccountBalance>,
    /// Sum of all channel closing balances for the day.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub computed_at: DateTime<Utc>,
    /// The per-channel rows this snapshot was assembled from.
    pub channels: Vec<ChannelClose>,
}

impl ClosingBalanceSnapshot {
    /// Assembles the aggregate view from per-channel rows.
    pub fn from_rows(day: NaiveDate, computed_at: DateTime<Utc>, rows: Vec<ChannelClose>) -> Self {
        let mut cash_cents = 0;
        let mut banks = Vec::new();
        let mut cards = Vec::new();
        let mut total_cents = 0;

        for row in &rows {
            total_cents += row.closing_cents;
            match row.channel_kind {
                ChannelKind::Cash => cash_cents = row.closing_cents,
                ChannelKind::Bank => banks.push(AccountBalance {
                    account_id: row.bank_account_id.clone().unwrap_or_default(),
                    closing_cents: row.closing_cents,
                }),
                ChannelKind::Card => cards.push(AccountBalance {
                    account_id: row.bank_account_id.clone().unwrap_or_default(),
                    closing_cents: row.closing_cents,
                }),
            }
        }

        ClosingBalanceSnapshot {
            day,
            cash_cents,
            banks,
            cards,
            total_cents,
            computed_at,
            channels: rows,
        }
    }

    /// Returns the day total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Daily Confirmation
// =============================================================================

/// Advisory per-(day, user) state marking a day's books as reviewed.
///
/// The flag never blocks posting; it is a completeness signal consumed by
/// the reporting layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ConfirmationStatus {
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub confirmed: bool,
    #[ts(as = "Option<String>")]
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<String>,
}

// =============================================================================
// Reversal
// =============================================================================

/// One channel whose compensation could not be posted during a document
/// reversal.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FailedReversal {
    pub channel: Channel,
    pub amount_cents: i64,
    /// Rendered ledger error for the operator-facing report.
    pub reason: String,
}

/// The outcome of reversing a document's payments.
///
/// Reversal of a multi-channel document is not atomic across channels:
/// every channel is attempted, and the ones that failed are reported here
/// so the caller can retry just those.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReversalOutcome {
    pub document_id: String,
    /// Compensating entries that were posted.
    pub reversed: Vec<LedgerEntry>,
    /// Channels whose compensation failed.
    pub failed: Vec<FailedReversal>,
}

impl ReversalOutcome {
    /// True when at least one channel succeeded and at least one failed.
    pub fn is_partial(&self) -> bool {
        !self.reversed.is_empty() && !self.failed.is_empty()
    }

    /// True when every candidate channel was compensated.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// =============================================================================
// Query Surface
// =============================================================================

/// Filter for the read-only entry listing consumed by reporting.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EntryQuery {
    #[ts(as = "String")]
    pub from: NaiveDate,
    /// Inclusive end of the range.
    #[ts(as = "String")]
    pub to: NaiveDate,
    pub channel: Option<Channel>,
    pub source: Option<EntrySource>,
}

impl EntryQuery {
    /// Query covering a day range with no channel/source filter.
    pub fn range(from: NaiveDate, to: NaiveDate) -> Self {
        EntryQuery {
            from,
            to,
            channel: None,
            source: None,
        }
    }

    /// Query covering a single day.
    pub fn day(day: NaiveDate) -> Self {
        Self::range(day, day)
    }

    /// Restricts the query to one channel.
    pub fn channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Restricts the query to one source.
    pub fn source(mut self, source: EntrySource) -> Self {
        self.source = Some(source);
        self
    }
}

/// Per-(day, channel) movement totals, grouped for the reporting screens.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DaySummary {
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub channel_kind: ChannelKind,
    pub bank_account_id: Option<String>,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub entry_count: i64,
}

impl DaySummary {
    /// Net movement for the group (income − expense).
    #[inline]
    pub fn net(&self) -> Money {
        Money::from_cents(self.income_cents - self.expense_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_columns_round_trip() {
        let channels = [
            Channel::Cash,
            Channel::Bank("acct-1".to_string()),
            Channel::Card("card-9".to_string()),
        ];
        for channel in channels {
            let (kind, id) = channel.columns();
            assert_eq!(Channel::from_columns(kind, id), channel);
        }
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::Cash.to_string(), "cash");
        assert_eq!(Channel::Bank("a1".into()).to_string(), "bank:a1");
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(EntryDirection::Income.opposite(), EntryDirection::Expense);
        assert_eq!(EntryDirection::Expense.opposite(), EntryDirection::Income);
    }

    #[test]
    fn test_source_classification() {
        assert!(EntrySource::Sale.is_payment());
        assert!(EntrySource::PurchasePayment.is_payment());
        assert!(!EntrySource::Expense.is_payment());
        assert!(!EntrySource::SaleRefund.is_payment());

        assert!(EntrySource::SaleRefund.is_refund());
        assert!(EntrySource::PurchaseRefund.is_refund());
        assert!(!EntrySource::ManualAdd.is_refund());
    }

    #[test]
    fn test_refund_source_mapping() {
        assert_eq!(
            EntrySource::Sale.refund_source(),
            Some(EntrySource::SaleRefund)
        );
        assert_eq!(
            EntrySource::PurchasePayment.refund_source(),
            Some(EntrySource::PurchaseRefund)
        );
        assert_eq!(EntrySource::Expense.refund_source(), None);
        assert_eq!(EntrySource::SaleRefund.refund_source(), None);
    }

    #[test]
    fn test_source_labels_are_distinct() {
        let sources = [
            EntrySource::Sale,
            EntrySource::SaleRefund,
            EntrySource::PurchasePayment,
            EntrySource::PurchaseRefund,
            EntrySource::Expense,
            EntrySource::OpeningBalanceAddition,
            EntrySource::OpeningBalanceDeduction,
            EntrySource::ManualAdd,
        ];
        let labels: std::collections::HashSet<&str> =
            sources.iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), sources.len());
    }

    #[test]
    fn test_closing_snapshot_assembly() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let now = Utc::now();
        let rows = vec![
            ChannelClose {
                day,
                channel_kind: ChannelKind::Cash,
                bank_account_id: None,
                opening_cents: 100_000,
                income_cents: 50_000,
                expense_cents: 20_000,
                closing_cents: 130_000,
                computed_at: now,
            },
            ChannelClose {
                day,
                channel_kind: ChannelKind::Bank,
                bank_account_id: Some("acct-1".to_string()),
                opening_cents: 0,
                income_cents: 7_500,
                expense_cents: 0,
                closing_cents: 7_500,
                computed_at: now,
            },
        ];

        let snapshot = ClosingBalanceSnapshot::from_rows(day, now, rows);
        assert_eq!(snapshot.cash_cents, 130_000);
        assert_eq!(snapshot.banks.len(), 1);
        assert_eq!(snapshot.banks[0].closing_cents, 7_500);
        assert!(snapshot.cards.is_empty());
        assert_eq!(snapshot.total_cents, 137_500);
    }

    #[test]
    fn test_entry_query_builders() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let query = EntryQuery::day(day)
            .channel(Channel::Cash)
            .source(EntrySource::Sale);
        assert_eq!(query.from, day);
        assert_eq!(query.to, day);
        assert_eq!(query.channel, Some(Channel::Cash));
        assert_eq!(query.source, Some(EntrySource::Sale));
    }

    #[test]
    fn test_serde_snake_case_sources() {
        let json = serde_json::to_string(&EntrySource::OpeningBalanceAddition).unwrap();
        assert_eq!(json, "\"opening_balance_addition\"");
    }
}
