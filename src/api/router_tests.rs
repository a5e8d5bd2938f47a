//! Router-level tests: the full middleware stack driven with `oneshot`.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;

use crate::app_state::AppState;
use crate::auth::JwtKeys;
use crate::build_app;
use crate::config::{AppConfig, LogFormat};
use crate::domain::{
    Investment, InvestmentEvent, InvestmentStatus, Offer, OfferId, Role, UploadPolicy, UserId,
    UserProfile,
};
use crate::service::{EventSink, InvestmentService};
use crate::store::{BlobStore, InvestmentRepository, MemoryBlobStore, MemoryStore};

const BOUNDARY: &str = "portal-test-boundary";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    keys: Arc<JwtKeys>,
    events: mpsc::Receiver<InvestmentEvent>,
    admin: UserId,
    owner: UserId,
    stranger: UserId,
    offer: OfferId,
}

fn test_config() -> AppConfig {
    AppConfig {
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        persistence_enabled: false,
        database_url: String::new(),
        database_max_connections: 1,
        database_min_connections: 0,
        database_connect_timeout_secs: 1,
        jwt_secret: "router-test-secret".to_string(),
        file_storage_root: PathBuf::from("unused"),
        max_upload_bytes: 1024,
        event_log_enabled: false,
        event_log_capacity: 64,
        request_timeout_secs: 5,
        log_format: LogFormat::Pretty,
    }
}

async fn app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let (sink, events) = EventSink::channel(config.event_log_capacity);

    let admin = UserId::new();
    let owner = UserId::new();
    let stranger = UserId::new();
    for (id, role) in [
        (admin, Role::Admin),
        (owner, Role::Signer),
        (stranger, Role::Signer),
    ] {
        store
            .insert_user(UserProfile {
                id,
                email: format!("{id}@example.com"),
                first_name: Some("Jan".to_string()),
                last_name: Some("Kowalski".to_string()),
                role,
            })
            .await;
    }
    let offer = OfferId::new();
    let now = Utc::now();
    store
        .insert_offer(Offer {
            id: offer,
            name: "Osiedle Zielone".to_string(),
            description: "Budowa osiedla".to_string(),
            target_amount: 100_000_000,
            min_investment: 100_000,
            status: "active".to_string(),
            end_at: now,
            created_at: now,
            updated_at: now,
        })
        .await;

    let repo: Arc<dyn InvestmentRepository> = Arc::clone(&store) as _;
    let service = InvestmentService::new(
        repo,
        blobs,
        sink,
        UploadPolicy::with_max_bytes(config.max_upload_bytes),
    );
    let keys = Arc::new(JwtKeys::from_secret(config.jwt_secret.as_bytes()));
    let state = AppState {
        investment_service: Arc::new(service),
        auth: Arc::clone(&keys),
    };

    TestApp {
        router: build_app(state, &config),
        store,
        keys,
        events,
        admin,
        owner,
        stranger,
        offer,
    }
}

impl TestApp {
    async fn seed(&self, status: InvestmentStatus) -> String {
        let mut investment = Investment::new(self.owner, self.offer, 250_000);
        investment.status = status;
        let id = investment.id.to_string();
        self.store.insert_investment(investment).await;
        id
    }

    fn token(&self, user: UserId) -> String {
        let Ok(token) = self.keys.issue(user, chrono::Duration::minutes(5)) else {
            panic!("token issue failed");
        };
        token
    }

    async fn send(&self, request: Request<Body>) -> Response {
        let Ok(response) = self.router.clone().oneshot(request).await else {
            panic!("router is infallible");
        };
        response
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        user: Option<UserId>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", self.token(user)));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let Ok(request) = builder.body(body) else {
            panic!("request build failed");
        };
        let response = self.send(request).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    async fn upload(
        &self,
        investment: &str,
        user: UserId,
        file_name: &str,
        mime: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let Ok(request) = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/investments/{investment}/files"))
            .header(AUTHORIZATION, format!("Bearer {}", self.token(user)))
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
        else {
            panic!("request build failed");
        };
        let response = self.send(request).await;
        let status = response.status();
        (status, json_body(response).await)
    }
}

async fn json_body(response: Response) -> Value {
    let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body read failed");
    };
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn detail_fields(body: &Value) -> Vec<&str> {
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .filter_map(|d| d["field"].as_str())
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn unauthenticated_requests_get_401_before_validation() {
    let app = app().await;
    let (status, body) = app
        .call(
            Method::PUT,
            "/api/investments/not-a-uuid",
            None,
            Some(json!({ "status": 42 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app
        .call(Method::GET, "/api/investments/not-a-uuid/files", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_profile_and_forged_token_are_unauthorized() {
    let app = app().await;
    let id = app.seed(InvestmentStatus::Pending).await;
    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/investments/{id}"),
            Some(UserId::new()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = JwtKeys::from_secret(b"someone-else");
    let Ok(token) = forged.issue(app.admin, chrono::Duration::minutes(5)) else {
        panic!("token issue failed");
    };
    let Ok(request) = Request::builder()
        .uri(format!("/api/investments/{id}"))
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
    else {
        panic!("request build failed");
    };
    assert_eq!(app.send(request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_mismatch_is_403_before_body_validation() {
    let app = app().await;
    let (status, body) = app
        .call(
            Method::PUT,
            "/api/investments/not-a-uuid",
            Some(app.owner),
            Some(json!({ "status": 42 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/investments/not-a-uuid/cancel",
            Some(app.admin),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_id_and_body_are_reported_together() {
    let app = app().await;
    let (status, body) = app
        .call(
            Method::PUT,
            "/api/investments/not-a-uuid",
            Some(app.admin),
            Some(json!({ "status": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["id", "body"]);

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/investments/not-a-uuid/cancel",
            Some(app.owner),
            Some(json!({ "reason": ["lista", "zamiast", "tekstu"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["id", "body"]);
}

#[tokio::test]
async fn validation_reports_field_details() {
    let app = app().await;
    let (status, body) = app
        .call(
            Method::PUT,
            "/api/investments/not-a-uuid",
            Some(app.admin),
            Some(json!({ "status": "rejected", "reason": "krótko" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(detail_fields(&body), vec!["id", "reason"]);

    let id = app.seed(InvestmentStatus::Pending).await;
    for payload in [
        json!({}),
        json!({ "status": "unknown" }),
        json!({ "status": "pending" }),
        json!({ "status": "cancelled", "reason": "to jest wystarczający powód" }),
    ] {
        let (status, body) = app
            .call(
                Method::PUT,
                &format!("/api/investments/{id}"),
                Some(app.admin),
                Some(payload),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail_fields(&body), vec!["status"]);
    }
}

#[tokio::test]
async fn ownership_is_checked_after_validation() {
    let app = app().await;
    let id = app.seed(InvestmentStatus::Pending).await;

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/investments/{id}/cancel"),
            Some(app.stranger),
            Some(json!({ "reason": "krótko" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/investments/{id}/cancel"),
            Some(app.stranger),
            Some(json!({ "reason": "nie moja inwestycja, ale próbuję" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/investments/{id}"),
            Some(app.stranger),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_accepts_pending_investment() {
    let mut app = app().await;
    let id = app.seed(InvestmentStatus::Pending).await;

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/investments/{id}"),
            Some(app.admin),
            Some(json!({ "status": "accepted" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "accepted");
    assert_eq!(body["data"]["status_badge"]["label"], "Zaakceptowana");
    assert_eq!(body["message"], "Inwestycja została zaakceptowana");

    let Ok(event) = app.events.try_recv() else {
        panic!("status change must be published");
    };
    assert_eq!(event.event_type_str(), "status_changed");

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/investments/{id}"),
            Some(app.admin),
            Some(json!({ "status": "accepted" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "accepted → accepted is illegal");
}

#[tokio::test]
async fn completing_pending_is_rejected() {
    let app = app().await;
    let id = app.seed(InvestmentStatus::Pending).await;
    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/investments/{id}"),
            Some(app.admin),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["status"]);
}

#[tokio::test]
async fn owner_cancels_with_reason() {
    let app = app().await;
    let id = app.seed(InvestmentStatus::Pending).await;
    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/investments/{id}/cancel"),
            Some(app.owner),
            Some(json!({ "reason": "  Rezygnuję z inwestycji  " })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(body["data"]["reason"], "Rezygnuję z inwestycji");
    assert_eq!(body["message"], "Inwestycja została anulowana");
}

#[tokio::test]
async fn detail_shows_owner_only_to_admin() {
    let app = app().await;
    let id = app.seed(InvestmentStatus::Pending).await;

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/investments/{id}"),
            Some(app.admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["owner"]["role"], "signer");
    assert_eq!(body["data"]["offer"]["name"], "Osiedle Zielone");
    assert_eq!(body["data"]["available_actions"], json!(["accept", "reject"]));
    assert_eq!(body["data"]["files"]["can_view"], false);

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/investments/{id}"),
            Some(app.owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("owner").is_none());
    assert_eq!(body["data"]["available_actions"], json!(["cancel"]));
}

#[tokio::test]
async fn missing_investment_is_404() {
    let app = app().await;
    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/investments/{}", uuid::Uuid::new_v4()),
            Some(app.admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Nie znaleziono inwestycji");
}

#[tokio::test]
async fn file_lifecycle_on_accepted_investment() {
    let app = app().await;
    let id = app.seed(InvestmentStatus::Accepted).await;

    let (status, body) = app
        .upload(&id, app.admin, "umowa.pdf", "application/pdf", b"%PDF-1.7")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Plik został przesłany");
    let Some(file_id) = body["data"]["id"].as_str().map(str::to_string) else {
        panic!("upload must return the file id");
    };
    assert!(body["data"].get("storage_path").is_none());

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/investments/{id}/files"),
            Some(app.owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let Ok(request) = Request::builder()
        .uri(format!("/api/investments/{id}/files/{file_id}"))
        .header(AUTHORIZATION, format!("Bearer {}", app.token(app.owner)))
        .body(Body::empty())
    else {
        panic!("request build failed");
    };
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("application/pdf")
    );
    assert_eq!(
        headers.get(CONTENT_LENGTH).and_then(|v| v.to_str().ok()),
        Some("8")
    );
    assert!(
        headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("attachment;"))
    );

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/investments/{id}/files/{file_id}"),
            Some(app.owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "signers never delete");

    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/investments/{id}/files/{file_id}"),
            Some(app.admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], file_id.as_str());

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/investments/{id}/files/{file_id}"),
            Some(app.admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn files_are_gated_by_status() {
    let app = app().await;
    let pending = app.seed(InvestmentStatus::Pending).await;
    let completed = app.seed(InvestmentStatus::Completed).await;

    let (status, _) = app
        .upload(&pending, app.admin, "umowa.pdf", "application/pdf", b"%PDF")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .upload(&completed, app.admin, "umowa.pdf", "application/pdf", b"%PDF")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/investments/{pending}/files"),
            Some(app.owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/investments/{completed}/files"),
            Some(app.owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .upload(&pending, app.owner, "umowa.pdf", "application/pdf", b"%PDF")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "role gate for signers");
}

#[tokio::test]
async fn upload_validation_rejects_bad_files() {
    let app = app().await;
    let id = app.seed(InvestmentStatus::Accepted).await;

    let (status, body) = app
        .upload(&id, app.admin, "program.exe", "application/x-msdownload", b"MZ")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["file"]);

    let (status, _) = app
        .upload(&id, app.admin, "pusty.pdf", "application/pdf", b"")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let oversized = vec![b'a'; 2048];
    let (status, _) = app
        .upload(&id, app.admin, "duzy.txt", "text/plain", &oversized)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_is_scoped_to_caller() {
    let app = app().await;
    app.seed(InvestmentStatus::Pending).await;
    app.seed(InvestmentStatus::Accepted).await;
    let mut foreign = Investment::new(app.stranger, app.offer, 1_000);
    foreign.status = InvestmentStatus::Pending;
    app.store.insert_investment(foreign).await;

    let (status, body) = app
        .call(Method::GET, "/api/investments", Some(app.owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);

    let (status, body) = app
        .call(
            Method::GET,
            "/api/investments?status=pending",
            Some(app.admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);

    let (status, _) = app
        .call(
            Method::GET,
            "/api/investments?status=archived",
            Some(app.admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn system_routes_are_public() {
    let app = app().await;
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.call(Method::GET, "/config/statuses", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(5));
    assert_eq!(body[0]["status"], "pending");
    assert_eq!(
        body[0]["transitions"],
        json!(["accepted", "rejected", "cancelled"])
    );

    let (status, body) = app
        .call(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/investments/{id}").is_some());
}
