use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::lead_service::{LeadFilter, LeadService, LeadUpdate};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

// ── Request / Response Types ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListLeadsQuery {
    pub page: Option<u64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u64>,
    pub status: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<String>,
}

#[derive(Serialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub id: String,
    pub from: String,
    pub to: String,
    pub note: Option<String>,
    pub changed_by: Option<UserSummary>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetailResponse {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub lead: leads::Model,
    pub assigned_to: Option<UserSummary>,
    pub status_history: Vec<StatusHistoryEntry>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub status_counts: HashMap<String, i64>,
}

#[derive(Serialize, ToSchema)]
pub struct ListLeadsResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<leads::Model>,
    pub meta: ListMeta,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    pub status: Option<String>,
    pub note: Option<String>,
    /// Absent leaves the assignment untouched; present-but-null clears it
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub assigned_to_id: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

// ── Handlers ──────────────────────────────────────────────────────────

/// Paginated triage listing for the admin dashboard.
#[utoipa::path(
    get,
    path = "/api/admin/leads",
    params(
        ("page" = Option<u64>, Query, description = "Page number (1-based)"),
        ("pageSize" = Option<u64>, Query, description = "Page size, capped at 100"),
        ("status" = Option<String>, Query, description = "Filter by status, or 'all'"),
        ("search" = Option<String>, Query, description = "Free-text search"),
        ("assignedTo" = Option<String>, Query, description = "Filter by assignee id, or 'all'")
    ),
    responses(
        (status = 200, description = "Lead listing", body = ListLeadsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = []))
)]
pub async fn list_leads(
    State(state): State<crate::AppState>,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<ListLeadsResponse>, AppError> {
    let page = LeadService::list_leads(
        &state.db,
        LeadFilter {
            status: query.status,
            search: query.search,
            assigned_to: query.assigned_to,
            page: query.page.unwrap_or(1),
            page_size: query.page_size.unwrap_or(20),
        },
    )
    .await?;

    Ok(Json(ListLeadsResponse {
        data: page.leads,
        meta: ListMeta {
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            status_counts: page.status_counts,
        },
    }))
}

/// Full lead detail with assignee and status history, admin only.
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    params(("id" = String, Path, description = "Lead ID")),
    responses(
        (status = 200, description = "Lead detail", body = LeadDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Lead not found")
    ),
    security(("jwt" = []))
)]
pub async fn get_lead(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(lead_id): Path<String>,
) -> Result<Json<LeadDetailResponse>, AppError> {
    if !claims.is_admin() {
        return Err(AppError::Forbidden(
            "Forbidden: insufficient permissions".to_string(),
        ));
    }

    let (lead, history) = LeadService::get_lead(&state.db, &lead_id).await?;
    let response = build_detail(&state.db, lead, history).await?;
    Ok(Json(response))
}

/// Apply status/assignment/note changes; status changes append one audit row
/// in the same transaction as the lead update.
#[utoipa::path(
    patch,
    path = "/api/leads/{id}",
    params(("id" = String, Path, description = "Lead ID")),
    request_body = UpdateLeadRequest,
    responses(
        (status = 200, description = "Updated lead", body = LeadDetailResponse),
        (status = 400, description = "Invalid status value"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Lead not found")
    ),
    security(("jwt" = []))
)]
pub async fn update_lead(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(lead_id): Path<String>,
    Json(req): Json<UpdateLeadRequest>,
) -> Result<Json<LeadDetailResponse>, AppError> {
    let lead = LeadService::update_lead(
        &state.db,
        &lead_id,
        LeadUpdate {
            status: req.status,
            note: req.note,
            assigned_to_id: req.assigned_to_id,
        },
        &claims,
    )
    .await?;

    let (lead, history) = LeadService::get_lead(&state.db, &lead.id).await?;
    let response = build_detail(&state.db, lead, history).await?;
    Ok(Json(response))
}

async fn build_detail(
    db: &sea_orm::DatabaseConnection,
    lead: leads::Model,
    history: Vec<status_history::Model>,
) -> Result<LeadDetailResponse, AppError> {
    // One lookup covers the assignee and every history author
    let mut user_ids: Vec<String> = history
        .iter()
        .filter_map(|h| h.changed_by_id.clone())
        .collect();
    if let Some(ref assignee) = lead.assigned_to_id {
        user_ids.push(assignee.clone());
    }

    let users: HashMap<String, UserSummary> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| {
                (
                    u.id.clone(),
                    UserSummary {
                        id: u.id,
                        name: u.name,
                        email: u.email,
                    },
                )
            })
            .collect()
    };

    let assigned_to = lead
        .assigned_to_id
        .as_ref()
        .and_then(|id| users.get(id))
        .cloned();

    let status_history = history
        .into_iter()
        .map(|h| StatusHistoryEntry {
            changed_by: h
                .changed_by_id
                .as_ref()
                .and_then(|id| users.get(id))
                .cloned(),
            id: h.id,
            from: h.from_status,
            to: h.to_status,
            note: h.note,
            created_at: h.created_at,
        })
        .collect();

    Ok(LeadDetailResponse {
        lead,
        assigned_to,
        status_history,
    })
}
