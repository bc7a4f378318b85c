use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pipeline states a lead can be in. Stored as plain strings; any status may
/// follow any other (manual override flexibility), only membership is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    ProposalSent,
    Won,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 6] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::ProposalSent,
        LeadStatus::Won,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::ProposalSent => "proposal_sent",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leads")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub submission_id: String,
    pub project_goal: String,
    pub project_description: Option<String>,
    pub project_timeline: String,
    pub estimated_budget: Option<i64>,
    /// JSON array of feature tags, e.g. `["web-development","e-commerce"]`
    #[sea_orm(column_type = "Text")]
    pub project_scope: String,
    /// JSON array of secure filenames from presigned uploads
    #[sea_orm(column_type = "Text")]
    pub attachments: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub company_name: Option<String>,
    pub notes: Option<String>,
    pub lead_score: i32,
    pub status: String, // one of LeadStatus
    pub source: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub assigned_to_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AssignedToId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    AssignedTo,
    #[sea_orm(has_many = "super::status_history::Entity")]
    StatusHistory,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedTo.def()
    }
}

impl Related<super::status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
