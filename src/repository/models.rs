//! Row types for the diesel schema.

use diesel::prelude::*;

use crate::schema;

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = schema::clients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ClientRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
    pub sentiment_score: Option<i32>,
    pub sentiment_status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = schema::contracts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ContractRecord {
    pub id: String,
    pub user_id: String,
    pub client_id: Option<String>,
    pub title: String,
    pub content: Option<String>,
    pub status: String,
    pub risk_score: Option<i32>,
    pub analysis: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = schema::testimonials)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct TestimonialRecord {
    pub id: String,
    pub user_id: String,
    pub client_name: String,
    pub client_email: String,
    pub project: Option<String>,
    pub token: String,
    pub status: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub expires_at: String,
    pub submitted_at: Option<String>,
    pub created_at: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::vault)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VaultRecord {
    pub user_id: String,
    pub currency: String,
    pub hourly_rate: f64,
    pub ai_tone: String,
    pub updated_at: String,
}
