use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    NewTransaction, NewUser, RepoError, Transaction, TransactionRepo, User, UserChanges, UserRepo,
};
use crate::transactions::range::DateRange;

/// sqlx-backed repository. Cascades and uniqueness are enforced by the schema in `migrations/`.
#[derive(Clone)]
pub struct PgRepo {
    db: PgPool,
}

impl PgRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_unique_violation(e: sqlx::Error) -> RepoError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => RepoError::Conflict,
        _ => RepoError::Database(e),
    }
}

#[async_trait]
impl UserRepo for PgRepo {
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, first_name, last_name, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name)
            WHERE id = $1
            RETURNING id, email, first_name, last_name, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TransactionRepo for PgRepo {
    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction, RepoError> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (id, user_id, amount, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, amount, date, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_transaction.user_id)
        .bind(new_transaction.amount)
        .bind(new_transaction.date)
        .fetch_one(&self.db)
        .await?;
        Ok(transaction)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, RepoError> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, amount, date, created_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(transaction)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, amount, date, created_at
            FROM transactions
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn sum_by_user(&self, user_id: Uuid, range: DateRange) -> Result<Decimal, RepoError> {
        let sum = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;
        Ok(sum)
    }

    async fn update_amount(
        &self,
        id: Uuid,
        amount: Decimal,
    ) -> Result<Option<Transaction>, RepoError> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET amount = $2
            WHERE id = $1
            RETURNING id, user_id, amount, date, created_at
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.db)
        .await?;
        Ok(transaction)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM transactions WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
