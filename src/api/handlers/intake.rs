use crate::api::error::AppError;
use crate::services::lead_service::{LeadService, NewLead};
use crate::services::scoring::{ScoreInput, calculate_lead_score};
use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IntakeRequest {
    pub goal: Option<String>,
    pub deadline: Option<String>,
    #[serde(default)]
    pub is_deadline_flexible: bool,
    #[serde(default)]
    pub features: Vec<String>,
    pub other_requirements: Option<String>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub budget_tier: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub preferred_contact: Option<String>,
    pub company_name: Option<String>,
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub add_ons: Vec<String>,
    /// Secure filenames returned by the presigned upload flow
    #[serde(default)]
    pub attached_files: Vec<String>,
    pub source: Option<String>,
    pub campaign: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntakeResponse {
    pub success: bool,
    pub submission_id: String,
    pub lead_id: String,
    pub score: i32,
    pub message: String,
}

/// Parse a submitted deadline leniently: RFC 3339 first, then a bare date.
/// Anything else scores like a distant deadline rather than failing the
/// whole submission.
fn parse_deadline(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
}

/// Accept a public project-intake submission, score it, and persist it as a
/// new lead with its creation audit row.
#[utoipa::path(
    post,
    path = "/api/project-intake",
    request_body = IntakeRequest,
    responses(
        (status = 200, description = "Lead created", body = IntakeResponse),
        (status = 400, description = "Missing or invalid fields")
    ),
    tag = "intake"
)]
pub async fn submit_intake(
    State(state): State<crate::AppState>,
    headers: HeaderMap,
    Json(req): Json<IntakeRequest>,
) -> Result<Json<IntakeResponse>, AppError> {
    let goal = req
        .goal
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingParameter(
            "Missing required fields: goal, contactName, contactEmail".to_string(),
        ))?
        .to_string();
    let contact_name = req
        .contact_name
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingParameter(
            "Missing required fields: goal, contactName, contactEmail".to_string(),
        ))?
        .to_string();
    let contact_email = req
        .contact_email
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingParameter(
            "Missing required fields: goal, contactName, contactEmail".to_string(),
        ))?
        .to_string();

    req.validate()
        .map_err(|_| AppError::BadRequest("Invalid email format".to_string()))?;

    let budget_max = req.budget_max.unwrap_or(0);
    let score = calculate_lead_score(&ScoreInput {
        budget_max,
        deadline: parse_deadline(req.deadline.as_deref()),
        feature_count: req.features.len(),
        add_on_count: req.add_ons.len(),
        has_notes: req
            .additional_notes
            .as_deref()
            .is_some_and(|n| !n.is_empty()),
        has_attachments: !req.attached_files.is_empty(),
    });

    let submission_id = format!(
        "sub_{}_{}",
        Utc::now().timestamp_millis(),
        &Uuid::new_v4().to_string()[..8]
    );

    let lead = LeadService::create_lead(
        &state.db,
        NewLead {
            submission_id,
            project_goal: goal,
            project_description: req.other_requirements.filter(|v| !v.is_empty()),
            project_timeline: req.deadline.unwrap_or_default(),
            estimated_budget: (budget_max > 0).then_some(budget_max),
            project_scope: req.features,
            attachments: req.attached_files,
            contact_name,
            contact_email,
            contact_phone: req.contact_phone.filter(|v| !v.is_empty()),
            company_name: req.company_name.filter(|v| !v.is_empty()),
            notes: req.additional_notes.filter(|v| !v.is_empty()),
            lead_score: score,
            source: Some(req.source.unwrap_or_else(|| "website".to_string())),
            ip_address: client_ip(&headers),
            user_agent: headers
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string()),
        },
    )
    .await?;

    tracing::info!(
        lead_id = %lead.id,
        submission_id = %lead.submission_id,
        score,
        "📬 New lead captured"
    );

    Ok(Json(IntakeResponse {
        success: true,
        submission_id: lead.submission_id,
        lead_id: lead.id,
        score,
        message: "Thank you for your submission! We'll be in touch soon.".to_string(),
    }))
}
