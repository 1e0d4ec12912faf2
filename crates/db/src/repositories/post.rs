//! Post repository.

use std::sync::Arc;

use boardhop_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::Expr,
};

use crate::{
    TxScope, UnitOfWork,
    composer::{self, ListingFilter},
    db_err,
    entities::{Post, PostCategory, PostMedia, PostTag, post, post_category, post_media, post_tag},
    hydrator, statement,
    views::{PostAggregate, PostDetail, PostListing, PostSummary},
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Begin a unit of work on this repository's pool.
    pub async fn begin(&self) -> AppResult<UnitOfWork> {
        UnitOfWork::begin(&self.db).await
    }

    // ==================== Reads ====================

    /// List visible posts matching `filter`, one row per post.
    pub async fn list(
        &self,
        scope: TxScope<'_>,
        filter: &ListingFilter,
    ) -> AppResult<Vec<PostListing>> {
        let tx = scope.open(&self.db).await?;
        let conn = tx.conn();
        let result = async {
            let rows = PostSummary::find_by_statement(statement(conn, &composer::post_list(filter)))
                .all(conn)
                .await
                .map_err(db_err("list posts"))?;
            hydrator::hydrate_listing(conn, rows).await
        }
        .await;
        tx.settle(result).await
    }

    /// Find the scalar detail of a visible post.
    pub async fn find_detail(&self, scope: TxScope<'_>, id: &str) -> AppResult<Option<PostDetail>> {
        let tx = scope.open(&self.db).await?;
        let conn = tx.conn();
        let result = PostDetail::find_by_statement(statement(conn, &composer::post_detail(id)))
            .one(conn)
            .await
            .map_err(db_err("find post"));
        tx.settle(result).await
    }

    /// Get a visible post with categories, tags and media.
    pub async fn get(&self, scope: TxScope<'_>, id: &str) -> AppResult<PostAggregate> {
        let tx = scope.open(&self.db).await?;
        let result = async {
            let conn = tx.conn();
            let detail = PostDetail::find_by_statement(statement(conn, &composer::post_detail(id)))
                .one(conn)
                .await
                .map_err(db_err("get post"))?
                .ok_or_else(|| AppError::PostNotFound(id.to_string()))?;
            hydrator::hydrate_post(conn, detail).await
        }
        .await;
        tx.settle(result).await
    }

    /// Find a visible post and lock its row until the transaction ends.
    pub async fn find_for_update(
        &self,
        scope: TxScope<'_>,
        id: &str,
    ) -> AppResult<Option<post::Model>> {
        let tx = scope.open(&self.db).await?;
        let result = Post::find_by_id(id)
            .filter(post::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(tx.conn())
            .await
            .map_err(db_err("lock post"));
        tx.settle(result).await
    }

    /// Media rows of a post in display order.
    pub async fn find_medias(
        &self,
        scope: TxScope<'_>,
        post_id: &str,
    ) -> AppResult<Vec<post_media::Model>> {
        let tx = scope.open(&self.db).await?;
        let result = PostMedia::find()
            .filter(post_media::Column::PostId.eq(post_id))
            .filter(post_media::Column::DeletedAt.is_null())
            .order_by_asc(post_media::Column::Position)
            .all(tx.conn())
            .await
            .map_err(db_err("find post medias"));
        tx.settle(result).await
    }

    // ==================== Root row ====================

    /// Insert the post row.
    pub async fn insert(&self, scope: TxScope<'_>, model: post::ActiveModel) -> AppResult<()> {
        let tx = scope.open(&self.db).await?;
        let result = Post::insert(model)
            .exec_without_returning(tx.conn())
            .await
            .map(|_| ())
            .map_err(db_err("insert post"));
        tx.settle(result).await
    }

    /// Update the set fields of a visible post.
    pub async fn update(
        &self,
        scope: TxScope<'_>,
        id: &str,
        model: post::ActiveModel,
    ) -> AppResult<()> {
        let tx = scope.open(&self.db).await?;
        let result = Post::update_many()
            .set(model)
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::DeletedAt.is_null())
            .exec(tx.conn())
            .await
            .map_err(db_err("update post"))
            .and_then(|res| {
                if res.rows_affected == 0 {
                    Err(AppError::PostNotFound(id.to_string()))
                } else {
                    Ok(())
                }
            });
        tx.settle(result).await
    }

    /// Mark a post and its media deleted.
    pub async fn soft_delete(&self, scope: TxScope<'_>, id: &str) -> AppResult<()> {
        let tx = scope.open(&self.db).await?;
        let result = async {
            let now = Utc::now().fixed_offset();
            let res = Post::update_many()
                .col_expr(post::Column::DeletedAt, Expr::value(now))
                .filter(post::Column::Id.eq(id))
                .filter(post::Column::DeletedAt.is_null())
                .exec(tx.conn())
                .await
                .map_err(db_err("delete post"))?;
            if res.rows_affected == 0 {
                return Err(AppError::PostNotFound(id.to_string()));
            }
            PostMedia::update_many()
                .col_expr(post_media::Column::DeletedAt, Expr::value(now))
                .filter(post_media::Column::PostId.eq(id))
                .filter(post_media::Column::DeletedAt.is_null())
                .exec(tx.conn())
                .await
                .map_err(db_err("delete post medias"))?;
            Ok(())
        }
        .await;
        tx.settle(result).await
    }

    // ==================== Join rows ====================

    /// Link tags to a post in one multi-row insert. Empty input is a no-op.
    pub async fn insert_post_tags(
        &self,
        scope: TxScope<'_>,
        post_id: &str,
        tag_ids: &[i32],
    ) -> AppResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }
        let rows = tag_ids.iter().map(|&tag_id| post_tag::ActiveModel {
            post_id: Set(post_id.to_string()),
            tag_id: Set(tag_id),
        });

        let tx = scope.open(&self.db).await?;
        let result = PostTag::insert_many(rows)
            .exec_without_returning(tx.conn())
            .await
            .map(|_| ())
            .map_err(db_err("insert post tags"));
        tx.settle(result).await
    }

    /// Unlink every tag from a post. Returns the number of links removed.
    pub async fn delete_post_tags(&self, scope: TxScope<'_>, post_id: &str) -> AppResult<u64> {
        let tx = scope.open(&self.db).await?;
        let result = PostTag::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(tx.conn())
            .await
            .map(|res| res.rows_affected)
            .map_err(db_err("delete post tags"));
        tx.settle(result).await
    }

    /// Link categories to a post in one multi-row insert. Empty input is a no-op.
    pub async fn insert_post_categories(
        &self,
        scope: TxScope<'_>,
        post_id: &str,
        category_ids: &[i32],
    ) -> AppResult<()> {
        if category_ids.is_empty() {
            return Ok(());
        }
        let rows = category_ids.iter().map(|&category_id| post_category::ActiveModel {
            post_id: Set(post_id.to_string()),
            category_id: Set(category_id),
        });

        let tx = scope.open(&self.db).await?;
        let result = PostCategory::insert_many(rows)
            .exec_without_returning(tx.conn())
            .await
            .map(|_| ())
            .map_err(db_err("insert post categories"));
        tx.settle(result).await
    }

    /// Unlink every category from a post.
    pub async fn delete_post_categories(
        &self,
        scope: TxScope<'_>,
        post_id: &str,
    ) -> AppResult<u64> {
        let tx = scope.open(&self.db).await?;
        let result = PostCategory::delete_many()
            .filter(post_category::Column::PostId.eq(post_id))
            .exec(tx.conn())
            .await
            .map(|res| res.rows_affected)
            .map_err(db_err("delete post categories"));
        tx.settle(result).await
    }

    /// Insert media rows in one multi-row insert. Empty input is a no-op.
    pub async fn insert_post_medias(
        &self,
        scope: TxScope<'_>,
        rows: Vec<post_media::ActiveModel>,
    ) -> AppResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let tx = scope.open(&self.db).await?;
        let result = PostMedia::insert_many(rows)
            .exec_without_returning(tx.conn())
            .await
            .map(|_| ())
            .map_err(db_err("insert post medias"));
        tx.settle(result).await
    }

    /// Remove every media row of a post.
    pub async fn delete_post_medias(&self, scope: TxScope<'_>, post_id: &str) -> AppResult<u64> {
        let tx = scope.open(&self.db).await?;
        let result = PostMedia::delete_many()
            .filter(post_media::Column::PostId.eq(post_id))
            .exec(tx.conn())
            .await
            .map(|res| res.rows_affected)
            .map_err(db_err("delete post medias"));
        tx.settle(result).await
    }
}
