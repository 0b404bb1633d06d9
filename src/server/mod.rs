//! HTTP API for the Sovereign engines.
//!
//! Every `/api` response is JSON, including errors, unknown routes and
//! panics. Callers are identified by the `x-user-id` header set by the
//! identity proxy in front of the service.

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::{AuthUser, MaybeUser, USER_ID_HEADER};
pub use error::{ApiError, ApiJson};
pub use routes::{create_router, MAX_UPLOAD_BYTES};

use std::sync::Arc;

use crate::analysis::AnalysisPipeline;
use crate::config::Config;
use crate::email::EmailSender;
use crate::llm::LlmClient;
use crate::notify::Notifier;
use crate::repository::DbContext;
use crate::services::{ForgeService, RadarService, ShieldService};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub db: DbContext,
    pub pipeline: AnalysisPipeline,
    pub notifier: Arc<Notifier>,
    pub shield: Arc<ShieldService>,
    pub radar: Arc<RadarService>,
    pub forge: Arc<ForgeService>,
}

impl AppState {
    pub fn new(
        db: DbContext,
        llm: Arc<LlmClient>,
        notifier: Arc<Notifier>,
        mailer: Arc<dyn EmailSender>,
        public_url: &str,
    ) -> Self {
        let pipeline = AnalysisPipeline::new(llm);
        Self {
            shield: Arc::new(ShieldService::new(
                db.clone(),
                pipeline.clone(),
                notifier.clone(),
            )),
            radar: Arc::new(RadarService::new(
                db.clone(),
                pipeline.clone(),
                notifier.clone(),
            )),
            forge: Arc::new(ForgeService::new(
                db.clone(),
                notifier.clone(),
                mailer,
                public_url,
            )),
            db,
            pipeline,
            notifier,
        }
    }

    /// Open the database and initialize the process-wide clients.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let settings = config.to_settings();
        settings.ensure_directories()?;
        let db = settings.create_db_context();
        db.init_schema().await?;

        let llm = crate::llm::init(config.llm.clone())?;
        let notifier = crate::notify::init(&config.notify)?;
        let mailer = config.email.build_sender()?;

        Ok(Self::new(db, llm, notifier, mailer, &settings.public_url))
    }
}

/// Start the web server and run until Ctrl-C.
pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::email::LogMailer;
    use crate::models::{generate_token, NewContract, NewTestimonial, Testimonial};
    use crate::notify::{EventPublisher, LogPublisher};
    use crate::repository::test_support::setup_test_db;
    use crate::services::test_support::{scripted_llm, FailingPublisher};

    const SAMPLE_CLAUSE: &str = "The Contractor agrees to unlimited revisions until the Client \
        is satisfied. Payment is due Net-90 after final approval. All intellectual property \
        transfers to the Client upon signing.";

    const ANALYSIS_REPLY: &str = r#"```json
{
  "risk_score": 85,
  "summary": "Unlimited revisions, slow payment and IP transfer before payment.",
  "payment_terms": "Net-90 after final approval",
  "clauses": [
    {"title": "Revisions", "quoted_text": "unlimited revisions", "risk": "High",
     "explanation": "No cap on unpaid work.", "suggested_fix": "Limit to two rounds."},
    {"title": "IP transfer", "quoted_text": "transfers to the Client upon signing", "risk": "Medium",
     "explanation": "IP moves before payment.", "suggested_fix": "Transfer on final payment."}
  ]
}
```"#;

    async fn setup_app_with(
        reply: Result<&str, &str>,
        publisher: Arc<dyn EventPublisher>,
    ) -> (axum::Router, AppState, tempfile::TempDir) {
        let (db, dir) = setup_test_db().await;
        let (llm, _) = scripted_llm(reply);
        let notifier =
            Arc::new(Notifier::with_publisher(publisher).with_credentials("app-key", "app-secret"));
        let state = AppState::new(
            db,
            llm,
            notifier,
            Arc::new(LogMailer),
            "https://sovereign.test",
        );
        (create_router(state.clone()), state, dir)
    }

    async fn setup_app(reply: Result<&str, &str>) -> (axum::Router, AppState, tempfile::TempDir) {
        setup_app_with(reply, Arc::new(LogPublisher)).await
    }

    fn json_request(method: &str, uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _, _dir) = setup_app(Ok("{}")).await;
        let (status, body) = send(
            &app,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_contract_end_to_end() {
        let (app, _, _dir) = setup_app(Ok(ANALYSIS_REPLY)).await;
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/analyze-contract",
                None,
                json!({ "content": SAMPLE_CLAUSE }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["risk_score"].is_u64());
        assert!(body["summary"].is_string());
        let clauses = body["clauses"].as_array().unwrap();
        assert!(!clauses.is_empty());
        for clause in clauses {
            assert!(["High", "Medium", "Low"].contains(&clause["risk"].as_str().unwrap()));
        }
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_analysis() {
        let (app, state, _dir) =
            setup_app_with(Ok(ANALYSIS_REPLY), Arc::new(FailingPublisher)).await;
        let contract = state
            .shield
            .create_contract(
                "u1",
                NewContract {
                    title: "Website".to_string(),
                    client_id: None,
                    content: None,
                },
            )
            .await
            .unwrap();

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/analyze-contract",
                Some("u1"),
                json!({ "content": SAMPLE_CLAUSE, "contract_id": contract.id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["risk_score"], 85);

        let (_, stored) = send(
            &app,
            Request::builder()
                .uri(format!("/api/contracts/{}", contract.id))
                .header(USER_ID_HEADER, "u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(stored["status"], "analyzed");
    }

    #[tokio::test]
    async fn test_invalid_model_reply_is_bad_gateway() {
        let (app, _, _dir) = setup_app(Ok("hello")).await;
        let (status, body) = send(
            &app,
            json_request("POST", "/api/analyze-contract", None, json!({ "content": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_model_unavailable() {
        let (app, _, _dir) = setup_app(Err("GEMINI_API_KEY is not set")).await;
        let (status, _) = send(
            &app,
            json_request("POST", "/api/analyze-contract", None, json!({ "content": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (app, _, _dir) = setup_app(Ok(ANALYSIS_REPLY)).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze-contract")
            .header("content-type", "application/json")
            .body(Body::from("{\"content\": "))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let (app, _, _dir) = setup_app(Ok("{}")).await;
        let (status, body) = send(
            &app,
            Request::builder().uri("/api/vault").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_route_and_method_are_json() {
        let (app, _, _dir) = setup_app(Ok("{}")).await;
        let (status, body) = send(
            &app,
            Request::builder().uri("/api/nope").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "route not found");

        let (status, body) = send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri("/api/vault")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_contracts_are_scoped_to_owner() {
        let (app, _, _dir) = setup_app(Ok("{}")).await;
        let (status, created) = send(
            &app,
            json_request("POST", "/api/contracts", Some("u1"), json!({ "title": "Retainer" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created.get("user_id").is_none());

        let id = created["id"].as_str().unwrap();
        let (status, _) = send(
            &app,
            Request::builder()
                .uri(format!("/api/contracts/{}", id))
                .header(USER_ID_HEADER, "u2")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, listed) = send(
            &app,
            Request::builder()
                .uri("/api/contracts")
                .header(USER_ID_HEADER, "u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_contract_over_http() {
        let (app, _, _dir) = setup_app(Ok("{}")).await;
        let (_, created) = send(
            &app,
            json_request("POST", "/api/contracts", Some("u1"), json!({ "title": "Retainer" })),
        )
        .await;
        let uri = format!("/api/contracts/{}/sign", created["id"].as_str().unwrap());

        let (status, signed) = send(&app, json_request("POST", &uri, Some("u1"), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(signed["status"], "signed");

        let (status, _) = send(&app, json_request("POST", &uri, Some("u1"), json!({}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let (app, state, _dir) = setup_app(Ok(ANALYSIS_REPLY)).await;
        let contract = state
            .shield
            .create_contract(
                "u1",
                NewContract {
                    title: "Logo".to_string(),
                    client_id: None,
                    content: None,
                },
            )
            .await
            .unwrap();

        let boundary = "sovereign-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"scan.png\"\r\n\
             Content-Type: image/png\r\n\r\n\u{89}PNG data\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/contracts/{}/upload", contract.id))
            .header(USER_ID_HEADER, "u1")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["error"].as_str().unwrap().contains("image/png"));
    }

    #[tokio::test]
    async fn test_upload_plain_text_contract() {
        let (app, state, _dir) = setup_app(Ok(ANALYSIS_REPLY)).await;
        let contract = state
            .shield
            .create_contract(
                "u1",
                NewContract {
                    title: "Logo".to_string(),
                    client_id: None,
                    content: None,
                },
            )
            .await
            .unwrap();

        let boundary = "sovereign-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"contract.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n{text}\r\n--{b}--\r\n",
            b = boundary,
            text = SAMPLE_CLAUSE
        );
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/contracts/{}/upload", contract.id))
            .header(USER_ID_HEADER, "u1")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "analyzed");
        assert_eq!(body["content"], SAMPLE_CLAUSE);
    }

    #[tokio::test]
    async fn test_testimonial_lifecycle_over_http() {
        let (app, state, _dir) = setup_app(Ok("{}")).await;
        let (status, issued) = send(
            &app,
            json_request(
                "POST",
                "/api/testimonials/request",
                Some("u1"),
                json!({ "client_name": "Dana", "client_email": "dana@studio.io" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let link = issued["magic_link"].as_str().unwrap();
        let token = link.rsplit('/').next().unwrap().to_string();
        assert!(issued["testimonial"].get("token").is_none());

        let magic = format!("/api/testimonials/magic/{}", token);
        let (status, invite) = send(
            &app,
            Request::builder().uri(&magic).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(invite["client_name"], "Dana");

        let submission = json!({ "kind": "text", "content": "Delivered early and on budget." });
        let (status, receipt) = send(&app, json_request("POST", &magic, None, submission.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt["status"], "text");

        let (status, _) = send(&app, json_request("POST", &magic, None, submission.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let unknown = format!("/api/testimonials/magic/{}", "z".repeat(32));
        let (status, _) = send(&app, json_request("POST", &unknown, None, submission.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut stale = Testimonial::issue(
            "u1",
            NewTestimonial {
                client_name: "Sam".to_string(),
                client_email: "sam@example.com".to_string(),
                project: None,
            },
            chrono::Utc::now() - chrono::Duration::days(31),
        );
        stale.token = generate_token();
        state.db.testimonials().create(&stale).await.unwrap();
        let expired = format!("/api/testimonials/magic/{}", stale.token);
        let (status, _) = send(&app, json_request("POST", &expired, None, submission)).await;
        assert_eq!(status, StatusCode::GONE);

        let id = issued["testimonial"]["id"].as_str().unwrap();
        let (status, approved) = send(
            &app,
            json_request(
                "POST",
                &format!("/api/testimonials/{}/approve", id),
                Some("u1"),
                json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["status"], "approved");
    }

    #[tokio::test]
    async fn test_realtime_auth() {
        let (app, _, _dir) = setup_app(Ok("{}")).await;
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/realtime/auth",
                Some("u1"),
                json!({ "socket_id": "123.456", "channel_name": "private-user-u1" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["auth"].as_str().unwrap().starts_with("app-key:"));

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/realtime/auth",
                Some("u1"),
                json!({ "socket_id": "123.456", "channel_name": "private-user-u2" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_rnd_audit_falls_back_with_ok() {
        let (app, _, _dir) = setup_app(Err("quota exceeded")).await;
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/finance/rnd-audit",
                Some("u1"),
                json!({ "content": "Prototyped a new compression scheme" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["eligible"], false);
        assert_eq!(body["estimated_credit"], 0.0);
        assert!(body["error"].as_str().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_radar_body_is_optional_but_must_decode() {
        let (app, _, _dir) = setup_app(Ok(r#"{"clients": []}"#)).await;
        let (status, _) = send(
            &app,
            json_request("POST", "/api/clients", Some("u1"), json!({ "name": "Acme" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            json_request("POST", "/api/radar", Some("u1"), json!({ "notes": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/api/radar")
                .header(USER_ID_HEADER, "u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["clients"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vault_defaults_and_update() {
        let (app, _, _dir) = setup_app(Ok("{}")).await;
        let (status, vault) = send(
            &app,
            Request::builder()
                .uri("/api/vault")
                .header(USER_ID_HEADER, "u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(vault["currency"], "USD");
        assert_eq!(vault["ai_tone"], "professional");

        let (status, vault) = send(
            &app,
            json_request(
                "PUT",
                "/api/vault",
                Some("u1"),
                json!({ "currency": "eur", "hourly_rate": 95.0 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(vault["currency"], "EUR");

        let (status, _) = send(
            &app,
            json_request("PUT", "/api/vault", Some("u1"), json!({ "hourly_rate": -1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
