use crate::api::error::AppError;
use crate::entities::{leads::LeadStatus, prelude::*, *};
use crate::utils::auth::Claims;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func},
};
use std::collections::HashMap;
use uuid::Uuid;

const INITIAL_SUBMISSION_NOTE: &str = "Initial lead submission from website";

/// Fields captured from a public intake submission.
pub struct NewLead {
    pub submission_id: String,
    pub project_goal: String,
    pub project_description: Option<String>,
    pub project_timeline: String,
    pub estimated_budget: Option<i64>,
    pub project_scope: Vec<String>,
    pub attachments: Vec<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub company_name: Option<String>,
    pub notes: Option<String>,
    pub lead_score: i32,
    pub source: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Admin-side changes applied to an existing lead.
#[derive(Default)]
pub struct LeadUpdate {
    pub status: Option<String>,
    pub note: Option<String>,
    /// `Some(None)` clears the assignment, `None` leaves it untouched
    pub assigned_to_id: Option<Option<String>>,
}

pub struct LeadFilter {
    pub status: Option<String>,
    pub search: Option<String>,
    pub assigned_to: Option<String>,
    pub page: u64,
    pub page_size: u64,
}

pub struct LeadPage {
    pub leads: Vec<leads::Model>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub status_counts: HashMap<String, i64>,
}

pub struct LeadService;

impl LeadService {
    /// Persist a new lead together with its degenerate creation marker
    /// (`from == to == "new"`) in one transaction.
    pub async fn create_lead(
        db: &DatabaseConnection,
        input: NewLead,
    ) -> Result<leads::Model, AppError> {
        let now = Utc::now();
        let lead = leads::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            submission_id: Set(input.submission_id),
            project_goal: Set(input.project_goal),
            project_description: Set(input.project_description),
            project_timeline: Set(input.project_timeline),
            estimated_budget: Set(input.estimated_budget),
            project_scope: Set(serde_json::to_string(&input.project_scope)
                .map_err(|e| AppError::Internal(e.to_string()))?),
            attachments: Set(serde_json::to_string(&input.attachments)
                .map_err(|e| AppError::Internal(e.to_string()))?),
            contact_name: Set(input.contact_name),
            contact_email: Set(input.contact_email),
            contact_phone: Set(input.contact_phone),
            company_name: Set(input.company_name),
            notes: Set(input.notes),
            lead_score: Set(input.lead_score),
            status: Set(LeadStatus::New.as_str().to_string()),
            source: Set(input.source),
            ip_address: Set(input.ip_address),
            user_agent: Set(input.user_agent),
            assigned_to_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let txn = db.begin().await?;
        let lead = lead.insert(&txn).await?;
        Self::record_transition(
            &txn,
            &lead.id,
            LeadStatus::New.as_str(),
            LeadStatus::New.as_str(),
            Some(INITIAL_SUBMISSION_NOTE.to_string()),
            None,
        )
        .await?;
        txn.commit().await?;

        Ok(lead)
    }

    /// Append one audit row for a status change. Never updated or deleted.
    async fn record_transition(
        txn: &DatabaseTransaction,
        lead_id: &str,
        from: &str,
        to: &str,
        note: Option<String>,
        changed_by_id: Option<String>,
    ) -> Result<status_history::Model, AppError> {
        let entry = status_history::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            lead_id: Set(lead_id.to_string()),
            from_status: Set(from.to_string()),
            to_status: Set(to.to_string()),
            note: Set(note),
            changed_by_id: Set(changed_by_id),
            created_at: Set(Utc::now()),
        };
        Ok(entry.insert(txn).await?)
    }

    /// Apply status/assignment/note changes. The status-history insert and the
    /// lead update commit together or not at all. No transition graph is
    /// enforced: any of the six statuses may follow any other.
    pub async fn update_lead(
        db: &DatabaseConnection,
        lead_id: &str,
        update: LeadUpdate,
        actor: &Claims,
    ) -> Result<leads::Model, AppError> {
        let lead = Leads::find_by_id(lead_id)
            .one(db)
            .await?
            .ok_or(AppError::RecordNotFound("Lead not found".to_string()))?;

        let new_status = match update.status {
            Some(ref status) if *status != lead.status => {
                LeadStatus::parse(status)
                    .ok_or(AppError::InvalidStatusValue("Invalid status value".to_string()))?;
                Some(status.clone())
            }
            _ => None,
        };

        let new_assignee = match update.assigned_to_id {
            Some(Some(ref user_id)) if !user_id.is_empty() => {
                Users::find_by_id(user_id)
                    .one(db)
                    .await?
                    .ok_or(AppError::BadRequest("Assigned user not found".to_string()))?;
                Some(Some(user_id.clone()))
            }
            Some(_) => Some(None),
            None => None,
        };

        let new_notes = update.note.as_ref().map(|note| {
            let author = if actor.name.is_empty() {
                &actor.email
            } else {
                &actor.name
            };
            let line = format!("[{}] {}: {}", Utc::now().to_rfc3339(), author, note);
            match &lead.notes {
                Some(existing) => format!("{}\n{}", existing, line),
                None => line,
            }
        });

        let txn = db.begin().await?;

        if let Some(ref status) = new_status {
            Self::record_transition(
                &txn,
                &lead.id,
                &lead.status,
                status,
                update.note.clone(),
                Some(actor.sub.clone()),
            )
            .await?;
        }

        let mut active: leads::ActiveModel = lead.into();
        if let Some(status) = new_status {
            active.status = Set(status);
        }
        if let Some(assignee) = new_assignee {
            active.assigned_to_id = Set(assignee);
        }
        if let Some(notes) = new_notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Fetch a lead with its full status history (newest first).
    pub async fn get_lead(
        db: &DatabaseConnection,
        lead_id: &str,
    ) -> Result<(leads::Model, Vec<status_history::Model>), AppError> {
        let lead = Leads::find_by_id(lead_id)
            .one(db)
            .await?
            .ok_or(AppError::RecordNotFound("Lead not found".to_string()))?;

        let history = StatusHistory::find()
            .filter(status_history::Column::LeadId.eq(&lead.id))
            .order_by_desc(status_history::Column::CreatedAt)
            .all(db)
            .await?;

        Ok((lead, history))
    }

    /// Filtered, paginated listing ordered for triage: fresh statuses first,
    /// then score, then recency.
    pub async fn list_leads(
        db: &DatabaseConnection,
        filter: LeadFilter,
    ) -> Result<LeadPage, AppError> {
        let mut cond = Condition::all();

        if let Some(ref status) = filter.status {
            if status != "all" {
                cond = cond.add(leads::Column::Status.eq(status));
            }
        }

        if let Some(ref assigned_to) = filter.assigned_to {
            if assigned_to != "all" {
                cond = cond.add(leads::Column::AssignedToId.eq(assigned_to));
            }
        }

        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search.to_lowercase());
            let like = |col: leads::Column| {
                Expr::expr(Func::lower(Expr::col(col))).like(pattern.clone())
            };
            cond = cond.add(
                Condition::any()
                    .add(like(leads::Column::ContactName))
                    .add(like(leads::Column::ContactEmail))
                    .add(like(leads::Column::ContactPhone))
                    .add(like(leads::Column::ProjectGoal)),
            );
        }

        let page = filter.page.max(1);
        let page_size = filter.page_size.clamp(1, 100);

        let paginator = Leads::find()
            .filter(cond)
            .order_by_asc(leads::Column::Status)
            .order_by_desc(leads::Column::LeadScore)
            .order_by_desc(leads::Column::CreatedAt)
            .paginate(db, page_size);

        let total = paginator.num_items().await?;
        let leads = paginator.fetch_page(page - 1).await?;

        // Dashboard stats are global, not scoped to the active filter
        let status_counts: HashMap<String, i64> = Leads::find()
            .select_only()
            .column(leads::Column::Status)
            .column_as(leads::Column::Id.count(), "count")
            .group_by(leads::Column::Status)
            .into_tuple::<(String, i64)>()
            .all(db)
            .await?
            .into_iter()
            .collect();

        Ok(LeadPage {
            leads,
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size),
            status_counts,
        })
    }
}
