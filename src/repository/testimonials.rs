//! Testimonial repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::TestimonialRecord;
use super::pool::{DbError, SqlitePool};
use super::util::{parse_datetime, parse_datetime_opt};
use crate::models::{Testimonial, TestimonialStatus};
use crate::schema::testimonials;

impl From<TestimonialRecord> for Testimonial {
    fn from(record: TestimonialRecord) -> Self {
        Testimonial {
            status: TestimonialStatus::from_str(&record.status)
                .unwrap_or(TestimonialStatus::Pending),
            expires_at: parse_datetime(&record.expires_at),
            submitted_at: parse_datetime_opt(record.submitted_at),
            created_at: parse_datetime(&record.created_at),
            id: record.id,
            user_id: record.user_id,
            client_name: record.client_name,
            client_email: record.client_email,
            project: record.project,
            token: record.token,
            content: record.content,
            video_url: record.video_url,
        }
    }
}

impl From<&Testimonial> for TestimonialRecord {
    fn from(t: &Testimonial) -> Self {
        TestimonialRecord {
            id: t.id.clone(),
            user_id: t.user_id.clone(),
            client_name: t.client_name.clone(),
            client_email: t.client_email.clone(),
            project: t.project.clone(),
            token: t.token.clone(),
            status: t.status.as_str().to_string(),
            content: t.content.clone(),
            video_url: t.video_url.clone(),
            expires_at: t.expires_at.to_rfc3339(),
            submitted_at: t.submitted_at.map(|dt| dt.to_rfc3339()),
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

#[derive(Clone)]
pub struct TestimonialRepository {
    pool: SqlitePool,
}

impl TestimonialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, testimonial: &Testimonial) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::insert_into(testimonials::table)
            .values(TestimonialRecord::from(testimonial))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<Testimonial>, DbError> {
        let mut conn = self.pool.get().await?;
        testimonials::table
            .find(id)
            .filter(testimonials::user_id.eq(user_id))
            .select(TestimonialRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Testimonial::from))
    }

    /// Look up by magic-link token (no owner scope).
    pub async fn get_by_token(&self, token: &str) -> Result<Option<Testimonial>, DbError> {
        let mut conn = self.pool.get().await?;
        testimonials::table
            .filter(testimonials::token.eq(token))
            .select(TestimonialRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Testimonial::from))
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Testimonial>, DbError> {
        let mut conn = self.pool.get().await?;
        testimonials::table
            .filter(testimonials::user_id.eq(user_id))
            .order(testimonials::created_at.desc())
            .select(TestimonialRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Testimonial::from).collect())
    }

    /// Write a state change only if the stored row is still in `expected`.
    ///
    /// Returns false when another request moved it first, which keeps the
    /// token single use under concurrent submissions.
    pub async fn transition(
        &self,
        testimonial: &Testimonial,
        expected: TestimonialStatus,
    ) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;
        let record = TestimonialRecord::from(testimonial);
        let rows = diesel::update(
            testimonials::table
                .find(&testimonial.id)
                .filter(testimonials::status.eq(expected.as_str())),
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
    use crate::models::{NewTestimonial, TestimonialSubmission};
    use crate::repository::test_support::setup_test_db;
    use chrono::Utc;

    fn issue(user: &str) -> Testimonial {
        Testimonial::issue(
            user,
            NewTestimonial {
                client_name: "Dana".to_string(),
                client_email: "dana@studio.io".to_string(),
                project: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_lookup_by_token() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.testimonials();
        let t = issue("u1");
        repo.create(&t).await.unwrap();

        let found = repo.get_by_token(&t.token).await.unwrap().unwrap();
        assert_eq!(found.id, t.id);
        assert_eq!(found.status, TestimonialStatus::Pending);
        assert!(repo.get_by_token("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.testimonials();
        let mut t = issue("u1");
        repo.create(&t).await.unwrap();

        t.submit(
            TestimonialSubmission::Text {
                content: "Excellent".to_string(),
            },
            Utc::now(),
        )
        .unwrap();
        assert!(repo.transition(&t, TestimonialStatus::Pending).await.unwrap());
        // The stored row has left pending; a second writer loses.
        assert!(!repo.transition(&t, TestimonialStatus::Pending).await.unwrap());

        let stored = repo.get("u1", &t.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TestimonialStatus::Text);
        assert_eq!(stored.content.as_deref(), Some("Excellent"));
        assert!(stored.submitted_at.is_some());
    }
}
