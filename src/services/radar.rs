//! Radar: client sentiment across a user's book of business.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use super::ServiceError;
use crate::analysis::{AnalysisPipeline, SentimentRadar, SentimentStatus};
use crate::models::{Client, NewClient, ValidationError};
use crate::notify::{EventName, Notifier};
use crate::repository::DbContext;

pub struct RadarService {
    db: DbContext,
    pipeline: AnalysisPipeline,
    notifier: Arc<Notifier>,
}

impl RadarService {
    pub fn new(db: DbContext, pipeline: AnalysisPipeline, notifier: Arc<Notifier>) -> Self {
        Self {
            db,
            pipeline,
            notifier,
        }
    }

    pub async fn add_client(&self, user_id: &str, input: NewClient) -> Result<Client, ServiceError> {
        input.validate()?;
        let client = Client::new(user_id, input);
        self.db.clients().create(&client).await?;
        self.notifier
            .notify_user(
                user_id,
                EventName::ClientUpdated,
                json!({ "client_id": client.id, "name": client.name }),
            )
            .await;
        Ok(client)
    }

    pub async fn list_clients(&self, user_id: &str) -> Result<Vec<Client>, ServiceError> {
        Ok(self.db.clients().list(user_id).await?)
    }

    /// Score every client of `user_id`, store the scores and publish
    /// `client-updated` for each one the model reported on.
    pub async fn scan(
        &self,
        user_id: &str,
        notes: Option<&str>,
    ) -> Result<SentimentRadar, ServiceError> {
        let clients = self.db.clients().list(user_id).await?;
        if clients.is_empty() {
            return Err(ValidationError("no clients to analyze".to_string()).into());
        }

        let mut content: String = clients
            .iter()
            .map(|c| c.radar_line())
            .collect::<Vec<_>>()
            .join("\n");
        if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
            content.push_str("\n\nAdditional notes:\n");
            content.push_str(notes);
        }

        let radar: SentimentRadar = self.pipeline.run_typed(&content, &[]).await?;

        let known: HashSet<&str> = clients.iter().map(|c| c.id.as_str()).collect();
        for entry in &radar.clients {
            if !known.contains(entry.client_id.as_str()) {
                debug!("Radar returned unknown client id {:?}", entry.client_id);
                continue;
            }
            let updated = self
                .db
                .clients()
                .update_sentiment(user_id, &entry.client_id, entry.sentiment_score, entry.status)
                .await?;
            if !updated {
                continue;
            }

            self.notifier
                .notify_user(
                    user_id,
                    EventName::ClientUpdated,
                    json!({
                        "client_id": entry.client_id,
                        "sentiment_score": entry.sentiment_score,
                        "status": entry.status,
                    }),
                )
                .await;

            if entry.status == SentimentStatus::AtRisk {
                self.notifier
                    .notify_user(
                        user_id,
                        EventName::NotificationNew,
                        json!({
                            "kind": "client-at-risk",
                            "client_id": entry.client_id,
                            "message": format!("{} may be at risk", entry.name),
                            "recommended_action": entry.recommended_action,
                        }),
                    )
                    .await;
            }
        }
        Ok(radar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup_test_db;
    use crate::services::test_support::{scripted_pipeline, RecordingPublisher};

    fn client(name: &str) -> NewClient {
        NewClient {
            name: name.to_string(),
            email: None,
            company: None,
            notes: Some("Slow to reply lately".to_string()),
        }
    }

    #[tokio::test]
    async fn test_scan_updates_known_clients() {
        let (db, _dir) = setup_test_db().await;
        let recorder = Arc::new(RecordingPublisher::default());
        let notifier = Arc::new(Notifier::with_publisher(recorder.clone()));

        let (setup_pipeline, _) = scripted_pipeline(Ok("{}"));
        let setup = RadarService::new(db.clone(), setup_pipeline, notifier.clone());
        let acme = setup.add_client("u1", client("Acme")).await.unwrap();

        let reply = format!(
            r#"{{"clients": [
                {{"client_id": "{}", "name": "Acme", "sentiment_score": 22, "status": "At Risk"}},
                {{"client_id": "ghost", "name": "Ghost", "sentiment_score": 90, "status": "Happy"}}
            ]}}"#,
            acme.id
        );
        let (pipeline, backend) = scripted_pipeline(Ok(&reply));
        let radar = RadarService::new(db.clone(), pipeline, notifier);

        let result = radar.scan("u1", Some("Missed two calls")).await.unwrap();
        assert_eq!(result.clients.len(), 2);
        assert!(backend.prompts.lock().unwrap()[0].contains("Missed two calls"));

        let stored = db.clients().get("u1", &acme.id).await.unwrap().unwrap();
        assert_eq!(stored.sentiment_score, Some(22));
        assert_eq!(stored.sentiment_status.as_deref(), Some("AtRisk"));
        assert_eq!(
            recorder.events(),
            vec![
                EventName::ClientUpdated,
                EventName::ClientUpdated,
                EventName::NotificationNew
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_without_clients() {
        let (db, _dir) = setup_test_db().await;
        let (pipeline, backend) = scripted_pipeline(Ok("{}"));
        let radar = RadarService::new(
            db,
            pipeline,
            Arc::new(Notifier::with_publisher(Arc::new(RecordingPublisher::default()))),
        );
        assert!(matches!(
            radar.scan("u1", None).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(backend.prompts.lock().unwrap().is_empty());
    }
}
