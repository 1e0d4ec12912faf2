//! Tag and category repository.

use std::sync::Arc;

use boardhop_common::AppResult;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::{
    TxScope, composer, db_err,
    entities::{Category, Tag, category, tag},
    statement,
};

#[derive(Debug, FromQueryResult)]
struct IdRow {
    id: i32,
}

/// Taxonomy repository for database operations.
#[derive(Clone)]
pub struct TaxonomyRepository {
    db: Arc<DatabaseConnection>,
}

impl TaxonomyRepository {
    /// Create a new taxonomy repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Tags whose type is one of `types`, ordered by ID.
    pub async fn list_tags(&self, scope: TxScope<'_>, types: &[&str]) -> AppResult<Vec<tag::Model>> {
        let tx = scope.open(&self.db).await?;
        let result = Tag::find()
            .filter(tag::Column::TagType.is_in(types.iter().copied()))
            .order_by_asc(tag::Column::Id)
            .all(tx.conn())
            .await
            .map_err(db_err("list tags"));
        tx.settle(result).await
    }

    /// The whole category tree.
    pub async fn list_categories(&self, scope: TxScope<'_>) -> AppResult<Vec<category::Model>> {
        let tx = scope.open(&self.db).await?;
        let conn = tx.conn();
        let result = category::Model::find_by_statement(statement(conn, &composer::categories()))
            .all(conn)
            .await
            .map_err(db_err("list categories"));
        tx.settle(result).await
    }

    /// The subset of `ids` that name existing tags.
    pub async fn existing_tag_ids(&self, scope: TxScope<'_>, ids: &[i32]) -> AppResult<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let tx = scope.open(&self.db).await?;
        let result = Tag::find()
            .select_only()
            .column(tag::Column::Id)
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .into_model::<IdRow>()
            .all(tx.conn())
            .await
            .map(|rows| rows.into_iter().map(|row| row.id).collect())
            .map_err(db_err("check tag ids"));
        tx.settle(result).await
    }

    /// The subset of `ids` that name existing categories.
    pub async fn existing_category_ids(
        &self,
        scope: TxScope<'_>,
        ids: &[i32],
    ) -> AppResult<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let tx = scope.open(&self.db).await?;
        let result = Category::find()
            .select_only()
            .column(category::Column::Id)
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .into_model::<IdRow>()
            .all(tx.conn())
            .await
            .map(|rows| rows.into_iter().map(|row| row.id).collect())
            .map_err(db_err("check category ids"));
        tx.settle(result).await
    }
}
