pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::infrastructure::storage::LocalStorage;
use crate::services::token::TokenCodec;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::login,
        api::handlers::auth::me,
        api::handlers::auth::logout,
        api::handlers::intake::submit_intake,
        api::handlers::files::get_upload_url,
        api::handlers::files::upload_file,
        api::handlers::files::get_download_url,
        api::handlers::files::download_file,
        api::handlers::leads::list_leads,
        api::handlers::leads::get_lead,
        api::handlers::leads::update_lead,
        api::handlers::users::list_users,
        api::handlers::users::create_user,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::auth::LoginRequest,
            api::handlers::auth::LoginResponse,
            api::handlers::auth::SessionUser,
            api::handlers::intake::IntakeRequest,
            api::handlers::intake::IntakeResponse,
            api::handlers::files::UploadUrlResponse,
            api::handlers::files::DownloadUrlResponse,
            api::handlers::files::UploadResponse,
            api::handlers::leads::ListLeadsResponse,
            api::handlers::leads::ListMeta,
            api::handlers::leads::LeadDetailResponse,
            api::handlers::leads::StatusHistoryEntry,
            api::handlers::leads::UserSummary,
            api::handlers::leads::UpdateLeadRequest,
            api::handlers::users::UserResponse,
            api::handlers::users::CreateUserRequest,
            api::handlers::users::CreatedUserResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "auth", description = "Session endpoints"),
        (name = "intake", description = "Public project intake"),
        (name = "files", description = "Presigned file transfer"),
        (name = "leads", description = "Lead triage endpoints"),
        (name = "users", description = "Admin user management"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: LocalStorage,
    pub tokens: TokenCodec,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db,
            storage: LocalStorage::new(&config.upload_base_dir),
            tokens: TokenCodec::new(&config.file_upload_secret),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/admin/leads", get(api::handlers::leads::list_leads))
        .route(
            "/api/admin/users",
            get(api::handlers::users::list_users).post(api::handlers::users::create_user),
        )
        .layer(from_fn(api::middleware::auth::require_admin))
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/api/auth/login", post(api::handlers::auth::login))
        .route("/api/auth/logout", post(api::handlers::auth::logout))
        .route(
            "/api/auth/me",
            get(api::handlers::auth::me).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/api/project-intake",
            post(api::handlers::intake::submit_intake),
        )
        .route(
            "/api/files/upload-url",
            get(api::handlers::files::get_upload_url),
        )
        .route(
            "/api/files/upload",
            put(api::handlers::files::upload_file).layer(axum::extract::DefaultBodyLimit::max(
                // Headroom so oversized uploads reach the handler's own check
                state.config.max_upload_size + 1024 * 1024,
            )),
        )
        .route(
            "/api/files/download-url",
            get(api::handlers::files::get_download_url),
        )
        .route(
            "/api/files/download",
            get(api::handlers::files::download_file),
        )
        .route(
            "/api/leads/:id",
            get(api::handlers::leads::get_lead)
                .patch(api::handlers::leads::update_lead)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .merge(admin_routes)
        .layer(from_fn(api::middleware::security::security_headers))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
