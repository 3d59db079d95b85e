//! `SeaORM` Entity for workflows table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "workflows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub document_id: Uuid,
    #[sea_orm(column_type = "JsonBinary")]
    pub step_roles: Json,
    pub current_step: i32,
    pub is_completed: bool,
    pub is_rejected: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::documents::Entity",
        from = "Column::DocumentId",
        to = "super::documents::Column::Id"
    )]
    Documents,
    #[sea_orm(has_many = "super::workflow_actions::Entity")]
    WorkflowActions,
}

impl Related<super::documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::workflow_actions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkflowActions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
