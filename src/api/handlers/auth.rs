use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::utils::auth::{Claims, create_jwt};
use argon2::{
    Argon2,
    password_hash::PasswordVerifier,
};
use axum::{Extension, Json, extract::State};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = Users::find()
        .filter(users::Column::Email.eq(payload.email.to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))?;

    let parsed_hash = argon2::PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let token =
        create_jwt(&user, &state.config.jwt_secret).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(LoginResponse {
        token,
        user: SessionUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current session user"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "auth"
)]
pub async fn me(Extension(claims): Extension<Claims>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "user": {
            "id": claims.sub,
            "name": claims.name,
            "email": claims.email,
            "role": claims.role,
        }
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out")
    ),
    tag = "auth"
)]
pub async fn logout() -> Json<serde_json::Value> {
    // Tokens are stateless; the client discards its copy
    Json(serde_json::json!({
        "success": true,
        "message": "Logged out successfully",
    }))
}
