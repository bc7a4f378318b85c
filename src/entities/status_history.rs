use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only audit record of a lead status change. The initial row written
/// at lead creation carries `from_status == to_status == "new"`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "status_history")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub lead_id: String,
    pub from_status: String,
    pub to_status: String,
    pub note: Option<String>,
    /// Null for the system-generated creation marker
    pub changed_by_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::leads::Entity",
        from = "Column::LeadId",
        to = "super::leads::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Leads,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ChangedById",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    ChangedBy,
}

impl Related<super::leads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Leads.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChangedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
