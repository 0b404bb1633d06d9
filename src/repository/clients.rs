//! Client repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::ClientRecord;
use super::pool::{DbError, SqlitePool};
use super::util::{parse_datetime, score_from_db};
use crate::analysis::SentimentStatus;
use crate::models::Client;
use crate::schema::clients;

impl From<ClientRecord> for Client {
    fn from(record: ClientRecord) -> Self {
        Client {
            id: record.id,
            user_id: record.user_id,
            name: record.name,
            email: record.email,
            company: record.company,
            notes: record.notes,
            sentiment_score: score_from_db(record.sentiment_score),
            sentiment_status: record.sentiment_status,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

impl From<&Client> for ClientRecord {
    fn from(client: &Client) -> Self {
        ClientRecord {
            id: client.id.clone(),
            user_id: client.user_id.clone(),
            name: client.name.clone(),
            email: client.email.clone(),
            company: client.company.clone(),
            notes: client.notes.clone(),
            sentiment_score: client.sentiment_score.map(i32::from),
            sentiment_status: client.sentiment_status.clone(),
            created_at: client.created_at.to_rfc3339(),
            updated_at: client.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, client: &Client) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::insert_into(clients::table)
            .values(ClientRecord::from(client))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Get a client owned by `user_id`.
    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<Client>, DbError> {
        let mut conn = self.pool.get().await?;
        clients::table
            .find(id)
            .filter(clients::user_id.eq(user_id))
            .select(ClientRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Client::from))
    }

    /// All of a user's clients, newest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Client>, DbError> {
        let mut conn = self.pool.get().await?;
        clients::table
            .filter(clients::user_id.eq(user_id))
            .order(clients::created_at.desc())
            .select(ClientRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Client::from).collect())
    }

    /// Store a Radar result. Returns false if the client is not the user's.
    pub async fn update_sentiment(
        &self,
        user_id: &str,
        id: &str,
        score: u8,
        status: SentimentStatus,
    ) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;
        let now = chrono::Utc::now().to_rfc3339();
        let rows = diesel::update(
            clients::table
                .find(id)
                .filter(clients::user_id.eq(user_id)),
        )
        .set((
            clients::sentiment_score.eq(Some(i32::from(score.min(100)))),
            clients::sentiment_status.eq(Some(status.as_str())),
            clients::updated_at.eq(&now),
        ))
        .execute(&mut conn)
        .await?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewClient;
    use crate::repository::test_support::setup_test_db;

    fn new_client(user: &str, name: &str) -> Client {
        Client::new(
            user,
            NewClient {
                name: name.to_string(),
                email: Some(format!("{}@example.com", name.to_lowercase())),
                company: None,
                notes: Some("Pays on time".to_string()),
            },
        )
    }

    #[tokio::test]
    async fn test_client_crud_is_scoped_by_user() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.clients();

        let client = new_client("u1", "Acme");
        repo.create(&client).await.unwrap();
        repo.create(&new_client("u2", "Other")).await.unwrap();

        let fetched = repo.get("u1", &client.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Acme");
        assert_eq!(fetched.notes.as_deref(), Some("Pays on time"));

        assert!(repo.get("u2", &client.id).await.unwrap().is_none());
        assert_eq!(repo.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_sentiment() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.clients();
        let client = new_client("u1", "Acme");
        repo.create(&client).await.unwrap();

        assert!(repo
            .update_sentiment("u1", &client.id, 35, SentimentStatus::AtRisk)
            .await
            .unwrap());
        assert!(!repo
            .update_sentiment("u2", &client.id, 99, SentimentStatus::Happy)
            .await
            .unwrap());

        let fetched = repo.get("u1", &client.id).await.unwrap().unwrap();
        assert_eq!(fetched.sentiment_score, Some(35));
        assert_eq!(fetched.sentiment_status.as_deref(), Some("AtRisk"));
    }
}
