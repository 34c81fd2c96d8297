//! # Bank Account Repository
//!
//! The channel registry. The ledger never creates or destroys channels; it
//! consults this table to decide whether a bank channel exists and accepts
//! postings. Account management (naming, numbering, activation) belongs to
//! the admin layer.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tillbook_core::BankAccount;

/// Repository for bank account database operations.
#[derive(Debug, Clone)]
pub struct BankAccountRepository {
    pool: SqlitePool,
}

impl BankAccountRepository {
    /// Creates a new BankAccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BankAccountRepository { pool }
    }

    /// Inserts a new bank account and returns it.
    pub async fn insert(&self, name: &str, account_number: Option<&str>) -> DbResult<BankAccount> {
        let account = BankAccount {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            account_number: account_number.map(str::to_string),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        debug!(id = %account.id, name = %account.name, "Inserting bank account");

        sqlx::query(
            r#"
            INSERT INTO bank_accounts (
                id, name, account_number, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&account.id)
        .bind(&account.name)
        .bind(&account.account_number)
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    /// Gets a bank account by ID (active or not).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<BankAccount>> {
        let account = sqlx::query_as::<_, BankAccount>(
            r#"
            SELECT id, name, account_number, is_active, created_at, updated_at
            FROM bank_accounts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Lists all active bank accounts, ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<BankAccount>> {
        let accounts = sqlx::query_as::<_, BankAccount>(
            r#"
            SELECT id, name, account_number, is_active, created_at, updated_at
            FROM bank_accounts
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    /// Deactivates a bank account (soft delete).
    ///
    /// The account's ledger history is untouched; only new postings are
    /// rejected from here on.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bank_accounts SET
                is_active = 0,
                updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bank account (active)", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.bank_accounts();

        let account = repo.insert("Main Checking", Some("PK-001")).await.unwrap();
        assert!(account.is_active);

        let fetched = repo.get_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Main Checking");
        assert_eq!(fetched.account_number.as_deref(), Some("PK-001"));
    }

    #[tokio::test]
    async fn test_list_active_excludes_deactivated() {
        let db = test_db().await;
        let repo = db.bank_accounts();

        let keep = repo.insert("Keep", None).await.unwrap();
        let drop = repo.insert("Drop", None).await.unwrap();

        repo.deactivate(&drop.id).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.id);

        // history stays readable
        let dropped = repo.get_by_id(&drop.id).await.unwrap().unwrap();
        assert!(!dropped.is_active);
    }

    #[tokio::test]
    async fn test_deactivate_twice_is_not_found() {
        let db = test_db().await;
        let repo = db.bank_accounts();

        let account = repo.insert("Once", None).await.unwrap();
        repo.deactivate(&account.id).await.unwrap();
        assert!(repo.deactivate(&account.id).await.is_err());
    }
}
