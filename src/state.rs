use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::repo::{MemoryRepo, PgRepo, TransactionRepo, UserRepo};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub transactions: Arc<dyn TransactionRepo>,
}

impl AppState {
    /// Connect to Postgres and run pending migrations, or fall back to the
    /// in-memory repository when no `DATABASE_URL` is configured.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let Some(database_url) = config.database_url.clone() else {
            tracing::warn!("DATABASE_URL not set; using the in-memory repository, data will not persist");
            return Ok(Self::in_memory(config));
        };

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run database migrations")?;

        let repo = Arc::new(PgRepo::new(db));
        Ok(Self {
            config: Arc::new(config),
            users: repo.clone(),
            transactions: repo,
        })
    }

    pub fn in_memory(config: AppConfig) -> Self {
        let repo = Arc::new(MemoryRepo::new());
        Self {
            config: Arc::new(config),
            users: repo.clone(),
            transactions: repo,
        }
    }
}
