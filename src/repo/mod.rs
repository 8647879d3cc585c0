//! Persistence seams. Handlers only ever talk to the traits in this module,
//! so the same router runs against Postgres in production and against
//! [`MemoryRepo`] in development and tests.

mod memory;
mod postgres;
mod types;

pub use memory::MemoryRepo;
pub use postgres::PgRepo;
pub use types::{NewTransaction, NewUser, Transaction, User, UserChanges};

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::transactions::range::DateRange;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A unique constraint rejected the write.
    #[error("record already exists")]
    Conflict,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a new user. Fails with [`RepoError::Conflict`] if the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError>;
    /// Delete a user and every transaction they own. Returns `false` if there was no such user.
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait TransactionRepo: Send + Sync {
    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, RepoError>;
    /// The user's transactions inside `range`, oldest date first.
    async fn list_by_user(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<Transaction>, RepoError>;
    /// Sum of amounts of the user's transactions inside `range`; zero when nothing matches.
    async fn sum_by_user(&self, user_id: Uuid, range: DateRange) -> Result<Decimal, RepoError>;
    async fn update_amount(
        &self,
        id: Uuid,
        amount: Decimal,
    ) -> Result<Option<Transaction>, RepoError>;
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}
