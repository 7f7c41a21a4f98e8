//! Integration tests for the users console.
//!
//! Each test starts an in-process fake of the users API on a random local
//! port and talks to it through the real reqwest client.
//!
//! Run with: cargo test --test integration

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use url::Url;

use users_console::controller::{FetchOutcome, SubmitOutcome, SyncController, SyncSettings};
use users_console::error::ErrorKind;
use users_console::render::HtmlSurface;
use users_console::users::{FormInput, HttpUsersApi, User, UsersApi};
use users_console::view::{HealthState, GENERIC_CREATE_ERROR};
use users_console::ApiError;

/// How the fake server misbehaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    UsersBroken,
    UsersMalformed,
    UsersFieldMissing,
    CreateRejectedAsHtml,
    CreateAcceptedMalformed,
    HealthDown,
    HealthWithoutStatus,
}

#[derive(Clone, Default)]
struct FakeServer {
    users: Arc<Mutex<Vec<User>>>,
    posted: Arc<Mutex<Vec<Value>>>,
    mode: Arc<Mutex<Mode>>,
}

impl FakeServer {
    fn seeded() -> Self {
        let server = Self::default();
        server.users.lock().unwrap().extend([
            User {
                id: 1,
                name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
            },
            User {
                id: 2,
                name: "Jane Smith".to_string(),
                email: "jane@example.com".to_string(),
            },
        ]);
        server
    }

    fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    fn mode(&self) -> Mode {
        *self.mode.lock().unwrap()
    }
}

async fn list_users(State(server): State<FakeServer>) -> Response {
    match server.mode() {
        Mode::UsersBroken => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "database offline"})),
        )
            .into_response(),
        Mode::UsersMalformed => (StatusCode::OK, "<html>oops</html>").into_response(),
        Mode::UsersFieldMissing => Json(json!({"count": 0})).into_response(),
        _ => {
            let users = server.users.lock().unwrap().clone();
            Json(json!({ "users": users })).into_response()
        }
    }
}

async fn create_user(State(server): State<FakeServer>, Json(body): Json<Value>) -> Response {
    server.posted.lock().unwrap().push(body.clone());

    match server.mode() {
        Mode::CreateRejectedAsHtml => {
            return (StatusCode::BAD_REQUEST, "<html>bad</html>").into_response();
        }
        Mode::CreateAcceptedMalformed => {
            return (StatusCode::CREATED, Json(json!({"ok": true}))).into_response();
        }
        _ => {}
    }

    let name = body["name"].as_str().unwrap_or_default().to_string();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if name.is_empty() || email.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Name and email are required"})),
        )
            .into_response();
    }

    let mut users = server.users.lock().unwrap();
    let user = User {
        id: users.len() as i64 + 1,
        name,
        email,
    };
    users.push(user.clone());

    (StatusCode::CREATED, Json(user)).into_response()
}

async fn show_user(State(server): State<FakeServer>, Path(id): Path<i64>) -> Response {
    let users = server.users.lock().unwrap();
    match users.iter().find(|u| u.id == id) {
        Some(user) => Json(user.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "User not found"})),
        )
            .into_response(),
    }
}

async fn health(State(server): State<FakeServer>) -> Response {
    match server.mode() {
        Mode::HealthDown => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        Mode::HealthWithoutStatus => Json(json!({})).into_response(),
        _ => Json(json!({"status": "healthy"})).into_response(),
    }
}

/// Serve `server` on a random port and return its base URL.
async fn spawn_server(server: FakeServer) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/:id", get(show_user))
        .route("/api/health", get(health))
        .with_state(server);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Url::parse(&format!("http://{}", addr)).unwrap()
}

async fn client_for(server: FakeServer) -> HttpUsersApi {
    HttpUsersApi::with_client(reqwest::Client::new(), spawn_server(server).await)
}

async fn controller_for(server: FakeServer) -> SyncController<HttpUsersApi, HtmlSurface> {
    SyncController::new(
        client_for(server).await,
        HtmlSurface::new(),
        SyncSettings::default(),
    )
}

#[tokio::test]
async fn test_list_users() {
    let api = client_for(FakeServer::seeded()).await;

    let users = api.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].name, "John Doe");
    assert_eq!(users[1].email, "jane@example.com");
}

#[tokio::test]
async fn test_missing_users_field_is_empty() {
    let server = FakeServer::seeded();
    server.set_mode(Mode::UsersFieldMissing);
    let controller = controller_for(server).await;

    assert!(matches!(
        controller.fetch_users().await,
        FetchOutcome::Applied(0)
    ));
    let surface = controller.surface();
    let surface = surface.lock().await;
    assert_eq!(surface.row_count(), 0);
    assert!(surface.users_list().contains("Aucun utilisateur pour le moment"));
}

#[tokio::test]
async fn test_server_error_shows_placeholder() {
    let server = FakeServer::seeded();
    let controller = controller_for(server.clone()).await;
    controller.fetch_users().await;
    assert_eq!(controller.surface().lock().await.row_count(), 2);

    server.set_mode(Mode::UsersBroken);
    let FetchOutcome::Failed(err) = controller.fetch_users().await else {
        panic!("expected a failed fetch");
    };
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    assert!(matches!(err, ApiError::Status { status: 500, .. }));

    let surface = controller.surface();
    let surface = surface.lock().await;
    assert_eq!(surface.row_count(), 0);
    assert!(surface
        .users_list()
        .contains("Erreur lors du chargement des utilisateurs"));
}

#[tokio::test]
async fn test_malformed_body_is_reported() {
    let server = FakeServer::seeded();
    server.set_mode(Mode::UsersMalformed);
    let api = client_for(server).await;

    let err = api.list_users().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_submit_posts_trimmed_values() {
    let server = FakeServer::seeded();
    let controller = controller_for(server.clone()).await;
    controller
        .fill_form(FormInput::new("  Alice  ", " a@b.com "))
        .await;

    let outcome = controller.submit_user().await;
    assert!(matches!(outcome, SubmitOutcome::Created(ref u) if u.id == 3));
    assert_eq!(
        server.posted.lock().unwrap().clone(),
        vec![json!({"name": "Alice", "email": "a@b.com"})]
    );

    assert!(controller.form().await.is_empty());
    let surface = controller.surface();
    let surface = surface.lock().await;
    assert_eq!(surface.row_count(), 3);
    assert!(surface.notices_markup().contains("Alice"));
}

#[tokio::test]
async fn test_rejected_submit_shows_server_message() {
    let server = FakeServer::seeded();
    let controller = controller_for(server).await;
    controller.fill_form(FormInput::new("   ", "a@b.com")).await;

    assert_eq!(
        controller.submit_user().await,
        SubmitOutcome::Rejected("Name and email are required".to_string())
    );
    assert_eq!(controller.form().await, FormInput::new("   ", "a@b.com"));
    assert_eq!(
        controller.surface().lock().await.notices_markup(),
        r#"<div class="error">Erreur: Name and email are required</div>"#
    );
}

#[tokio::test]
async fn test_unparseable_error_body_uses_generic_message() {
    let server = FakeServer::seeded();
    server.set_mode(Mode::CreateRejectedAsHtml);
    let controller = controller_for(server.clone()).await;
    controller.fill_form(FormInput::new("Alice", "a@b.com")).await;

    assert_eq!(
        controller.submit_user().await,
        SubmitOutcome::Rejected(GENERIC_CREATE_ERROR.to_string())
    );
    assert_eq!(controller.form().await, FormInput::new("Alice", "a@b.com"));
    assert_eq!(server.posted.lock().unwrap().len(), 1);
    assert_eq!(
        controller.surface().lock().await.notices_markup(),
        r#"<div class="error">Erreur: Failed to create user</div>"#
    );
}

#[tokio::test]
async fn test_malformed_created_user_is_rejected() {
    let server = FakeServer::seeded();
    server.set_mode(Mode::CreateAcceptedMalformed);
    let controller = controller_for(server).await;
    controller.fill_form(FormInput::new("Alice", "a@b.com")).await;

    assert_eq!(
        controller.submit_user().await,
        SubmitOutcome::Rejected(GENERIC_CREATE_ERROR.to_string())
    );
    assert_eq!(controller.form().await, FormInput::new("Alice", "a@b.com"));
    let surface = controller.surface();
    let surface = surface.lock().await;
    assert_eq!(surface.notice_count(), 1);
    assert!(surface.notices_markup().starts_with(r#"<div class="error">"#));
}

#[tokio::test]
async fn test_get_user() {
    let api = client_for(FakeServer::seeded()).await;

    let user = api.get_user(2).await.unwrap();
    assert_eq!(user.name, "Jane Smith");

    let err = api.get_user(99).await.unwrap_err();
    assert_eq!(err.server_message(), Some("User not found"));
}

#[tokio::test]
async fn test_health_cycle() {
    let server = FakeServer::seeded();
    let controller = controller_for(server.clone()).await;

    assert_eq!(controller.check_health().await, HealthState::Healthy);
    assert_eq!(
        controller.surface().lock().await.status_text(),
        "Statut: healthy"
    );

    server.set_mode(Mode::HealthWithoutStatus);
    assert_eq!(controller.check_health().await, HealthState::Healthy);
    assert_eq!(
        controller.surface().lock().await.status_text(),
        "Statut: healthy"
    );

    server.set_mode(Mode::HealthDown);
    assert_eq!(controller.check_health().await, HealthState::Unhealthy);
    let surface = controller.surface();
    let surface = surface.lock().await;
    assert_eq!(surface.indicator_class(), "status-indicator unhealthy");
    assert_eq!(surface.status_text(), "Statut: unhealthy");
}

#[tokio::test]
async fn test_hostile_names_are_escaped() {
    let server = FakeServer::default();
    server.users.lock().unwrap().push(User {
        id: 1,
        name: "<script>alert('x')</script>".to_string(),
        email: "a&b@<evil>.com".to_string(),
    });
    let controller = controller_for(server).await;

    controller.fetch_users().await;
    let surface = controller.surface();
    let surface = surface.lock().await;
    let html = surface.users_list();
    assert!(!html.contains("<script"));
    assert!(!html.contains("<evil>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("a&amp;b@&lt;evil&gt;.com"));
}
