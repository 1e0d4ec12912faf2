//! Follow-up reads that turn a fetched row into a full aggregate.
//!
//! Hydration runs on the caller's connection so every read of one aggregate
//! sees the same transaction. Any failed read fails the whole aggregate.

use std::collections::HashMap;

use boardhop_common::{AppError, AppResult};
use sea_orm::{ConnectionTrait, FromQueryResult};

use crate::{
    composer::{self, MessageOwner},
    db_err,
    entities::{category, order, post_media, tag},
    statement,
    views::{MessageView, OrderAggregate, PostAggregate, PostDetail, PostListing, PostSummary},
};

/// Attach categories, tags and media to a post.
pub async fn hydrate_post<C: ConnectionTrait>(conn: &C, post: PostDetail) -> AppResult<PostAggregate> {
    let categories = category::Model::find_by_statement(statement(conn, &composer::post_categories(&post.id)))
        .all(conn)
        .await
        .map_err(db_err("hydrate post categories"))?;

    let tags = tag::Model::find_by_statement(statement(conn, &composer::post_tags(&post.id)))
        .all(conn)
        .await
        .map_err(db_err("hydrate post tags"))?;

    let medias = post_media::Model::find_by_statement(statement(conn, &composer::post_medias(&post.id)))
        .all(conn)
        .await
        .map_err(db_err("hydrate post medias"))?;

    Ok(PostAggregate {
        post,
        categories,
        tags,
        medias,
    })
}

/// Attach media to a page of listing rows with one read for the whole page.
pub async fn hydrate_listing<C: ConnectionTrait>(
    conn: &C,
    posts: Vec<PostSummary>,
) -> AppResult<Vec<PostListing>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
    let rows = post_media::Model::find_by_statement(statement(conn, &composer::medias_of_posts(&ids)))
        .all(conn)
        .await
        .map_err(db_err("hydrate listing medias"))?;

    let mut by_post: HashMap<String, Vec<post_media::Model>> = HashMap::new();
    for media in rows {
        by_post.entry(media.post_id.clone()).or_default().push(media);
    }

    Ok(posts
        .into_iter()
        .map(|post| {
            let medias = by_post.remove(&post.id).unwrap_or_default();
            PostListing { post, medias }
        })
        .collect())
}

/// Attach the rented post, fully hydrated, and the order's message thread.
pub async fn hydrate_order<C: ConnectionTrait>(
    conn: &C,
    order: order::Model,
) -> AppResult<OrderAggregate> {
    let detail = PostDetail::find_by_statement(statement(conn, &composer::post_detail(&order.post_id)))
        .one(conn)
        .await
        .map_err(db_err("hydrate order post"))?
        .ok_or_else(|| AppError::PostNotFound(order.post_id.clone()))?;
    let post = hydrate_post(conn, detail).await?;

    let owner = MessageOwner::Order(order.id.clone());
    let messages = MessageView::find_by_statement(statement(conn, &composer::messages(&owner)))
        .all(conn)
        .await
        .map_err(db_err("hydrate order messages"))?;

    Ok(OrderAggregate {
        order,
        post,
        messages,
    })
}
