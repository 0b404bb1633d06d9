//! Vault (user settings) repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::VaultRecord;
use super::pool::{DbError, SqlitePool};
use super::util::parse_datetime;
use crate::models::Vault;
use crate::schema::vault;

impl From<VaultRecord> for Vault {
    fn from(record: VaultRecord) -> Self {
        Vault {
            user_id: record.user_id,
            currency: record.currency,
            hourly_rate: record.hourly_rate,
            ai_tone: record.ai_tone,
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

#[derive(Clone)]
pub struct VaultRepository {
    pool: SqlitePool,
}

impl VaultRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The user's settings, or defaults if none were saved.
    pub async fn get(&self, user_id: &str) -> Result<Vault, DbError> {
        let mut conn = self.pool.get().await?;
        vault::table
            .find(user_id)
            .select(VaultRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Vault::from).unwrap_or_else(|| Vault::defaults_for(user_id)))
    }

    pub async fn save(&self, settings: &Vault) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::replace_into(vault::table)
            .values(VaultRecord {
                user_id: settings.user_id.clone(),
                currency: settings.currency.clone(),
                hourly_rate: settings.hourly_rate,
                ai_tone: settings.ai_tone.clone(),
                updated_at: settings.updated_at.to_rfc3339(),
            })
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
