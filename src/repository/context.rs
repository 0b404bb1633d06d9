//! Database context: one entry point for every repository.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;
use tracing::info;

use super::clients::ClientRepository;
use super::contracts::ContractRepository;
use super::pool::{DbError, SqlitePool};
use super::testimonials::TestimonialRepository;
use super::vault::VaultRepository;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    email TEXT,
    company TEXT,
    notes TEXT,
    sentiment_score INTEGER,
    sentiment_status TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_clients_user ON clients(user_id, created_at);

CREATE TABLE IF NOT EXISTS contracts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    client_id TEXT REFERENCES clients(id) ON DELETE SET NULL,
    title TEXT NOT NULL,
    content TEXT,
    status TEXT NOT NULL DEFAULT 'draft',
    risk_score INTEGER,
    analysis TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_contracts_user ON contracts(user_id, created_at);

CREATE TABLE IF NOT EXISTS testimonials (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    client_name TEXT NOT NULL,
    client_email TEXT NOT NULL,
    project TEXT,
    token TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'pending',
    content TEXT,
    video_url TEXT,
    expires_at TEXT NOT NULL,
    submitted_at TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_testimonials_user ON testimonials(user_id, created_at);

CREATE TABLE IF NOT EXISTS vault (
    user_id TEXT PRIMARY KEY,
    currency TEXT NOT NULL DEFAULT 'USD',
    hourly_rate DOUBLE NOT NULL DEFAULT 0,
    ai_tone TEXT NOT NULL DEFAULT 'professional',
    updated_at TEXT NOT NULL
);
"#;

/// Create one context per process and hand out repositories from it.
///
/// ```ignore
/// let ctx = DbContext::new("sovereign.db");
/// ctx.init_schema().await?;
/// let contracts = ctx.contracts().list(&user_id).await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: SqlitePool,
}

impl DbContext {
    pub fn new(database_url: &str) -> Self {
        Self {
            pool: SqlitePool::new(database_url),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self {
            pool: SqlitePool::from_path(path),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute("PRAGMA journal_mode = WAL;").await?;
        conn.batch_execute(SCHEMA_SQL).await?;
        info!("Database schema ready at {}", self.pool.database_url());
        Ok(())
    }

    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone())
    }

    pub fn contracts(&self) -> ContractRepository {
        ContractRepository::new(self.pool.clone())
    }

    pub fn testimonials(&self) -> TestimonialRepository {
        TestimonialRepository::new(self.pool.clone())
    }

    pub fn vault(&self) -> VaultRepository {
        VaultRepository::new(self.pool.clone())
    }
}
