//! Category entity - a node of the listing taxonomy.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(nullable)]
    pub parent_id: Option<i32>,

    /// Stable machine name, e.g. "surfboard".
    #[sea_orm(unique)]
    pub value: String,

    pub label: String,

    /// Materialized `ltree` path such as `root.1.3`.
    ///
    /// sqlx cannot decode `ltree` into a `String`, so reads go through
    /// statements that cast the column to `text`.
    #[sea_orm(unique)]
    pub path: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post_category::Entity")]
    PostCategory,
}

impl Related<super::post_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
