use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    NewTransaction, NewUser, RepoError, Transaction, TransactionRepo, User, UserChanges, UserRepo,
};
use crate::transactions::range::DateRange;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    // insertion order doubles as creation order
    transactions: Vec<Transaction>,
}

/// Process-local repository with the same semantics as the Postgres schema:
/// unique emails, cascading user deletes and inclusive date ranges.
#[derive(Clone, Default)]
pub struct MemoryRepo {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryRepo {
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(RepoError::Conflict);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            password_hash: new_user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        tables.transactions.retain(|t| t.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl TransactionRepo for MemoryRepo {
    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == new_transaction.user_id) {
            // Mirrors the foreign key on transactions.user_id.
            return Err(RepoError::Database(sqlx::Error::RowNotFound));
        }
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: new_transaction.user_id,
            amount: new_transaction.amount,
            date: new_transaction.date,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<Transaction>, RepoError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Transaction> = tables
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id && range.contains(t.date))
            .cloned()
            .collect();
        // stable, so equal dates keep creation order
        rows.sort_by_key(|t| t.date);
        Ok(rows)
    }

    async fn sum_by_user(&self, user_id: Uuid, range: DateRange) -> Result<Decimal, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id && range.contains(t.date))
            .map(|t| t.amount)
            .sum())
    }

    async fn update_amount(
        &self,
        id: Uuid,
        amount: Decimal,
    ) -> Result<Option<Transaction>, RepoError> {
        let mut tables = self.tables.write().await;
        let Some(transaction) = tables.transactions.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        transaction.amount = amount;
        Ok(Some(transaction.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.transactions.len();
        tables.transactions.retain(|t| t.id != id);
        Ok(tables.transactions.len() != before)
    }
}
