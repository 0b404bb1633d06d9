//! Contract repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use super::models::ContractRecord;
use super::pool::{DbError, SqlitePool};
use super::util::{parse_datetime, score_from_db, to_diesel_error};
use crate::models::{Contract, ContractStatus};
use crate::schema::contracts;

impl From<ContractRecord> for Contract {
    fn from(record: ContractRecord) -> Self {
        let analysis = record.analysis.as_deref().and_then(|json| {
            serde_json::from_str(json)
                .map_err(|e| warn!("Unreadable analysis on contract {}: {}", record.id, e))
                .ok()
        });
        Contract {
            status: ContractStatus::from_str(&record.status).unwrap_or(ContractStatus::Draft),
            risk_score: score_from_db(record.risk_score),
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
            analysis,
            id: record.id,
            user_id: record.user_id,
            client_id: record.client_id,
            title: record.title,
            content: record.content,
        }
    }
}

impl TryFrom<&Contract> for ContractRecord {
    type Error = DbError;

    fn try_from(contract: &Contract) -> Result<Self, DbError> {
        let analysis = contract
            .analysis
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(to_diesel_error)?;
        Ok(ContractRecord {
            id: contract.id.clone(),
            user_id: contract.user_id.clone(),
            client_id: contract.client_id.clone(),
            title: contract.title.clone(),
            content: contract.content.clone(),
            status: contract.status.as_str().to_string(),
            risk_score: contract.risk_score.map(i32::from),
            analysis,
            created_at: contract.created_at.to_rfc3339(),
            updated_at: contract.updated_at.to_rfc3339(),
        })
    }
}

#[derive(Clone)]
pub struct ContractRepository {
    pool: SqlitePool,
}

impl ContractRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, contract: &Contract) -> Result<(), DbError> {
        let record = ContractRecord::try_from(contract)?;
        let mut conn = self.pool.get().await?;
        diesel::insert_into(contracts::table)
            .values(record)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<Contract>, DbError> {
        let mut conn = self.pool.get().await?;
        contracts::table
            .find(id)
            .filter(contracts::user_id.eq(user_id))
            .select(ContractRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Contract::from))
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Contract>, DbError> {
        let mut conn = self.pool.get().await?;
        contracts::table
            .filter(contracts::user_id.eq(user_id))
            .order(contracts::created_at.desc())
            .select(ContractRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Contract::from).collect())
    }

    /// Overwrite a contract (last write wins). Returns false if it is gone.
    pub async fn save(&self, contract: &Contract) -> Result<bool, DbError> {
        let record = ContractRecord::try_from(contract)?;
        let mut conn = self.pool.get().await?;
        let rows = diesel::update(
            contracts::table
                .find(&contract.id)
                .filter(contracts::user_id.eq(&contract.user_id)),
        )
        .set(&record)
        .execute(&mut conn)
        .await?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Clause, ContractAnalysis, RiskLevel};
    use crate::models::NewContract;
    use crate::repository::test_support::setup_test_db;

    fn contract(user: &str) -> Contract {
        Contract::new(
            user,
            NewContract {
                title: "Retainer".to_string(),
                client_id: None,
                content: Some("Payment due Net-90.".to_string()),
            },
        )
    }

    #[tokio::test]
    async fn test_analysis_persists_as_json() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.contracts();
        let mut c = contract("u1");
        repo.create(&c).await.unwrap();

        c.record_analysis(ContractAnalysis {
            risk_score: 81,
            summary: "Client-favourable.".to_string(),
            payment_terms: "Net-90".to_string(),
            clauses: vec![Clause {
                title: "Payment".to_string(),
                quoted_text: "Payment due Net-90.".to_string(),
                risk: RiskLevel::High,
                explanation: String::new(),
                suggested_fix: "Net-15".to_string(),
            }],
            negotiation_email: String::new(),
        });
        assert!(repo.save(&c).await.unwrap());

        let fetched = repo.get("u1", &c.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, ContractStatus::Analyzed);
        assert_eq!(fetched.risk_score, Some(81));
        assert_eq!(fetched.analysis, c.analysis);
    }

    #[tokio::test]
    async fn test_other_users_contract_invisible() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.contracts();
        let mut c = contract("u1");
        repo.create(&c).await.unwrap();

        assert!(repo.get("u2", &c.id).await.unwrap().is_none());
        assert!(repo.list("u2").await.unwrap().is_empty());

        c.user_id = "u2".to_string();
        assert!(!repo.save(&c).await.unwrap());
    }
}
