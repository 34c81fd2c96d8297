//! # Seed Data Generator
//!
//! Populates a database with demo ledger traffic for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p tillbook-db --bin seed
//!
//! # Specify database path and number of trading days
//! cargo run -p tillbook-db --bin seed -- --db ./data/tillbook.db --days 5
//! ```
//!
//! ## Generated Data
//! - Two bank accounts
//! - A stored cash opening balance for the first day
//! - A run of trading days, each with sale payments, an expense, and a
//!   purchase payment spread across cash and bank
//! - One cancelled sale, reversed through the engine
//! - A computed closing balance per day, confirmed by the demo operator
//!
//! Prints a JSON day-summary report at the end.

use std::env;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tillbook_core::validation::validate_account_name;
use tillbook_core::{Channel, EntryDirection, EntrySource, NewEntry};
use tillbook_db::{Database, DbConfig};

const SEED_USER: &str = "seed-operator";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let db_path = arg_value(&args, "--db").unwrap_or_else(|| "./tillbook.db".to_string());
    let days: i64 = arg_value(&args, "--days")
        .and_then(|value| value.parse().ok())
        .unwrap_or(3);

    info!(db_path = %db_path, days, "Seeding demo ledger data");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let ledger = db.ledger();

    // Channel registry
    validate_account_name("Main Checking")?;
    validate_account_name("Card Settlement")?;
    let checking = db
        .bank_accounts()
        .insert("Main Checking", Some("001"))
        .await?;
    let settlement = db
        .bank_accounts()
        .insert("Card Settlement", Some("002"))
        .await?;
    let bank_a = Channel::Bank(checking.id.clone());
    let bank_b = Channel::Bank(settlement.id.clone());

    let start = ledger.today() - Duration::days(days);
    ledger
        .set_opening_balance(start, &Channel::Cash, 100_000, Some("seed float"), SEED_USER)
        .await?;

    for offset in 0..days {
        let day = start + Duration::days(offset);

        let sale_doc = format!("seed-sale-{offset}");
        ledger
            .post(entry(
                &Channel::Cash,
                EntryDirection::Income,
                EntrySource::Sale,
                45_000,
                &sale_doc,
                seed_time(day, 10),
            ))
            .await?;
        ledger
            .post(entry(
                &bank_a,
                EntryDirection::Income,
                EntrySource::Sale,
                82_500,
                &sale_doc,
                seed_time(day, 11),
            ))
            .await?;
        ledger
            .post(entry(
                &bank_b,
                EntryDirection::Income,
                EntrySource::Sale,
                19_900,
                &format!("seed-sale-{offset}b"),
                seed_time(day, 12),
            ))
            .await?;
        ledger
            .post(entry(
                &Channel::Cash,
                EntryDirection::Expense,
                EntrySource::Expense,
                12_000,
                &format!("seed-expense-{offset}"),
                seed_time(day, 14),
            ))
            .await?;
        ledger
            .post(entry(
                &bank_a,
                EntryDirection::Expense,
                EntrySource::PurchasePayment,
                30_000,
                &format!("seed-purchase-{offset}"),
                seed_time(day, 16),
            ))
            .await?;

        // one cancellation on the first seeded day
        if offset == 0 {
            let outcome = ledger
                .reverse_document(&sale_doc, None, seed_time(day, 17), SEED_USER)
                .await?;
            info!(
                document = sale_doc,
                reversed = outcome.reversed.len(),
                failed = outcome.failed.len(),
                "Seeded a cancelled sale"
            );
        }

        let closing = ledger.compute_closing(day).await?;
        ledger.confirm_day_on(day, SEED_USER).await?;
        info!(%day, total_cents = closing.total_cents, "Seeded day closed");
    }

    let summaries = ledger.day_summaries(start, ledger.today()).await?;
    println!("{}", serde_json::to_string_pretty(&summaries)?);

    info!("Seed complete");
    Ok(())
}

/// A fixed in-day timestamp; falls back to now for an out-of-range hour.
fn seed_time(day: NaiveDate, hour: u32) -> DateTime<Utc> {
    match day.and_hms_opt(hour, 0, 0) {
        Some(naive) => naive.and_utc(),
        None => Utc::now(),
    }
}

fn entry(
    channel: &Channel,
    direction: EntryDirection,
    source: EntrySource,
    amount_cents: i64,
    document: &str,
    occurred_at: DateTime<Utc>,
) -> NewEntry {
    NewEntry {
        channel: channel.clone(),
        direction,
        source,
        source_document_id: Some(document.to_string()),
        amount_cents,
        occurred_at,
        recorded_by: SEED_USER.to_string(),
        description: None,
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .cloned()
}
