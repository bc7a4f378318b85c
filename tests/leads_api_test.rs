use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use http_body_util::BodyExt;
use lead_intake_backend::config::AppConfig;
use lead_intake_backend::entities::{prelude::*, *};
use lead_intake_backend::{AppState, create_app};
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tower::ServiceExt;
use uuid::Uuid;

async fn setup() -> (Router, DatabaseConnection, tempfile::TempDir) {
    let _ = tracing_subscriber::fmt::try_init();
    let db = Database::connect("sqlite::memory:").await.unwrap();
    lead_intake_backend::infrastructure::database::run_migrations(&db)
        .await
        .unwrap();

    let upload_dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        upload_base_dir: upload_dir.path().to_string_lossy().to_string(),
        file_upload_secret: "test-upload-secret".to_string(),
        jwt_secret: "test-jwt-secret".to_string(),
        ..AppConfig::default()
    };

    let state = AppState::new(db.clone(), config);
    (create_app(state), db, upload_dir)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_user(db: &DatabaseConnection, email: &str, password: &str, role: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set("Test Person".to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(role.to_string()),
        created_at: Set(Utc::now()),
    };
    user.insert(db).await.unwrap().id
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "email": email, "password": password }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["token"].as_str().unwrap().to_string()
}

async fn submit_lead(app: &Router, goal: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/project-intake")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "goal": goal,
                        "contactName": "Ada Lovelace",
                        "contactEmail": "ada@example.com",
                        "budgetMax": 20000,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["leadId"].as_str().unwrap().to_string()
}

fn patch_lead(lead_id: &str, token: &str, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(format!("/api/leads/{}", lead_id))
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_admin_listing_requires_auth_and_role() {
    let (app, db, _dir) = setup().await;
    create_user(&db, "admin@example.com", "admin123", "admin").await;
    create_user(&db, "user@example.com", "user123", "user").await;

    // No token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/leads")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Non-admin token
    let user_token = login(&app, "user@example.com", "user123").await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/leads")
                .header("Authorization", format!("Bearer {}", user_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["code"], "FORBIDDEN");

    // Admin token
    let admin_token = login(&app, "admin@example.com", "admin123").await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/leads")
                .header("Authorization", format!("Bearer {}", admin_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_listing_meta_and_counts() {
    let (app, db, _dir) = setup().await;
    create_user(&db, "admin@example.com", "admin123", "admin").await;
    let token = login(&app, "admin@example.com", "admin123").await;

    submit_lead(&app, "First project").await;
    submit_lead(&app, "Second project").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/leads?page=1&pageSize=1")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["pageSize"], 1);
    assert_eq!(body["meta"]["totalPages"], 2);
    assert_eq!(body["meta"]["statusCounts"]["new"], 2);
}

#[tokio::test]
async fn test_status_updates_append_history_without_transition_graph() {
    let (app, db, _dir) = setup().await;
    create_user(&db, "admin@example.com", "admin123", "admin").await;
    let token = login(&app, "admin@example.com", "admin123").await;
    let lead_id = submit_lead(&app, "Pipeline test").await;

    // new -> won
    let response = app
        .clone()
        .oneshot(patch_lead(&lead_id, &token, serde_json::json!({"status": "won"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "won");

    // won -> lost is permitted; no transition graph is enforced
    let response = app
        .clone()
        .oneshot(patch_lead(
            &lead_id,
            &token,
            serde_json::json!({"status": "lost", "note": "budget evaporated"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "lost");

    // Newest first: lost<-won, won<-new, creation marker
    let history = body["statusHistory"].as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["from"], "won");
    assert_eq!(history[0]["to"], "lost");
    assert_eq!(history[0]["note"], "budget evaporated");
    assert_eq!(history[1]["from"], "new");
    assert_eq!(history[1]["to"], "won");
    assert_eq!(history[2]["from"], "new");
    assert_eq!(history[2]["to"], "new");
    assert!(history[2]["changedBy"].is_null());
    assert_eq!(history[0]["changedBy"]["email"], "admin@example.com");

    // Exactly one row per accepted change in the table itself
    let rows = StatusHistory::find()
        .filter(status_history::Column::LeadId.eq(&lead_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_update_rejects_unknown_status() {
    let (app, db, _dir) = setup().await;
    create_user(&db, "admin@example.com", "admin123", "admin").await;
    let token = login(&app, "admin@example.com", "admin123").await;
    let lead_id = submit_lead(&app, "Bad status").await;

    let response = app
        .clone()
        .oneshot(patch_lead(&lead_id, &token, serde_json::json!({"status": "archived"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_STATUS_VALUE");

    // The lead and its history are untouched
    let lead = Leads::find_by_id(&lead_id).one(&db).await.unwrap().unwrap();
    assert_eq!(lead.status, "new");
    let rows = StatusHistory::find()
        .filter(status_history::Column::LeadId.eq(&lead_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_update_unknown_lead_is_404() {
    let (app, db, _dir) = setup().await;
    create_user(&db, "admin@example.com", "admin123", "admin").await;
    let token = login(&app, "admin@example.com", "admin123").await;

    let response = app
        .clone()
        .oneshot(patch_lead("no-such-id", &token, serde_json::json!({"status": "won"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "RECORD_NOT_FOUND");
}

#[tokio::test]
async fn test_assignment_and_notes() {
    let (app, db, _dir) = setup().await;
    create_user(&db, "admin@example.com", "admin123", "admin").await;
    let assignee_id = create_user(&db, "rep@example.com", "rep12345", "user").await;
    let token = login(&app, "admin@example.com", "admin123").await;
    let lead_id = submit_lead(&app, "Assignment test").await;

    // Assign
    let response = app
        .clone()
        .oneshot(patch_lead(
            &lead_id,
            &token,
            serde_json::json!({"assignedToId": assignee_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["assignedTo"]["id"], assignee_id.as_str());

    // Unknown assignee
    let response = app
        .clone()
        .oneshot(patch_lead(
            &lead_id,
            &token,
            serde_json::json!({"assignedToId": "ghost"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Note-only update appends an attributed line and records no transition
    let response = app
        .clone()
        .oneshot(patch_lead(
            &lead_id,
            &token,
            serde_json::json!({"note": "left a voicemail"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let notes = body["notes"].as_str().unwrap();
    assert!(notes.contains("left a voicemail"));
    assert!(notes.contains("Test Person"));
    assert_eq!(body["statusHistory"].as_array().unwrap().len(), 1);

    // Clear the assignment with an explicit null
    let response = app
        .clone()
        .oneshot(patch_lead(
            &lead_id,
            &token,
            serde_json::json!({"assignedToId": null}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["assignedTo"].is_null());
}

#[tokio::test]
async fn test_lead_detail_requires_admin_but_update_does_not() {
    let (app, db, _dir) = setup().await;
    create_user(&db, "admin@example.com", "admin123", "admin").await;
    create_user(&db, "user@example.com", "user123", "user").await;
    let user_token = login(&app, "user@example.com", "user123").await;
    let lead_id = submit_lead(&app, "Role split").await;

    // A regular user may update...
    let response = app
        .clone()
        .oneshot(patch_lead(
            &lead_id,
            &user_token,
            serde_json::json!({"status": "contacted"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // ...but not read the detail view
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/leads/{}", lead_id))
                .header("Authorization", format!("Bearer {}", user_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_auth_me_round_trip() {
    let (app, db, _dir) = setup().await;
    create_user(&db, "admin@example.com", "admin123", "admin").await;
    let token = login(&app, "admin@example.com", "admin123").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user"]["email"], "admin@example.com");
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (app, db, _dir) = setup().await;
    create_user(&db, "admin@example.com", "admin123", "admin").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"email": "admin@example.com", "password": "wrong"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_user_management() {
    let (app, db, _dir) = setup().await;
    create_user(&db, "admin@example.com", "admin123", "admin").await;
    let token = login(&app, "admin@example.com", "admin123").await;

    // Create
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/users")
                .header("Authorization", format!("Bearer {}", token))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": "New Rep",
                        "email": "Rep@Example.com",
                        "password": "rep12345",
                        "role": "user",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["email"], "rep@example.com");

    // Duplicate email conflicts
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/users")
                .header("Authorization", format!("Bearer {}", token))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": "Dup",
                        "email": "rep@example.com",
                        "password": "rep12345",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Invalid role
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/users")
                .header("Authorization", format!("Bearer {}", token))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": "Bad Role",
                        "email": "bad@example.com",
                        "password": "pass1234",
                        "role": "superuser",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Listing includes both users
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/users")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"].as_array().unwrap().len(), 2);
}
