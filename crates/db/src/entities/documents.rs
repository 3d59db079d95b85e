//! `SeaORM` Entity for documents table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub fingerprint: String,
    pub status: String,
    pub owner_id: Uuid,
    pub template_id: Uuid,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::document_templates::Entity",
        from = "Column::TemplateId",
        to = "super::document_templates::Column::Id"
    )]
    DocumentTemplates,
    #[sea_orm(has_one = "super::workflows::Entity")]
    Workflows,
}

impl Related<super::document_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentTemplates.def()
    }
}

impl Related<super::workflows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workflows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
