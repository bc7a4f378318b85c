use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, ActiveModelTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

// ── Request / Response Types ──────────────────────────────────────────

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: chrono::DateTime<Utc>,
    pub assigned_lead_count: i64,
    pub status_change_count: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: chrono::DateTime<Utc>,
}

// ── Handlers ──────────────────────────────────────────────────────────

/// List users with their assignment and attribution counts, admin only.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "User listing", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = []))
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let users = Users::find()
        .order_by_desc(users::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let assigned: HashMap<String, i64> = Leads::find()
        .select_only()
        .column(leads::Column::AssignedToId)
        .column_as(leads::Column::Id.count(), "count")
        .filter(leads::Column::AssignedToId.is_not_null())
        .group_by(leads::Column::AssignedToId)
        .into_tuple::<(String, i64)>()
        .all(&state.db)
        .await?
        .into_iter()
        .collect();

    let changes: HashMap<String, i64> = StatusHistory::find()
        .select_only()
        .column(status_history::Column::ChangedById)
        .column_as(status_history::Column::Id.count(), "count")
        .filter(status_history::Column::ChangedById.is_not_null())
        .group_by(status_history::Column::ChangedById)
        .into_tuple::<(String, i64)>()
        .all(&state.db)
        .await?
        .into_iter()
        .collect();

    let data: Vec<UserResponse> = users
        .into_iter()
        .map(|u| UserResponse {
            assigned_lead_count: assigned.get(&u.id).copied().unwrap_or(0),
            status_change_count: changes.get(&u.id).copied().unwrap_or(0),
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
        })
        .collect();

    Ok(Json(serde_json::json!({ "data": data })))
}

/// Create a user for lead assignment and attribution, admin only.
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = CreatedUserResponse),
        (status = 400, description = "Missing fields or invalid role"),
        (status = 409, description = "Email already registered")
    ),
    security(("jwt" = []))
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let name = req.name.filter(|v| !v.is_empty());
    let email = req.email.filter(|v| !v.is_empty());
    let password = req.password.filter(|v| !v.is_empty());
    let (name, email, password) = match (name, email, password) {
        (Some(n), Some(e), Some(p)) => (n, e, p),
        _ => {
            return Err(AppError::MissingParameter(
                "Name, email, and password are required".to_string(),
            ));
        }
    };

    let role = req.role.unwrap_or_else(|| "user".to_string());
    if !["admin", "user"].contains(&role.as_str()) {
        return Err(AppError::BadRequest(
            "Invalid role. Must be 'admin' or 'user'".to_string(),
        ));
    }

    let email = email.to_lowercase();
    let existing = Users::find()
        .filter(users::Column::Email.eq(&email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .to_string();

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role),
        created_at: Set(Utc::now()),
    };
    let user = user.insert(&state.db).await?;

    let created = CreatedUserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        created_at: user.created_at,
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": created })),
    ))
}
