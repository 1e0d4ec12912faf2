//! Message service.

use boardhop_common::{AppError, AppResult};
use boardhop_db::{
    TxScope,
    composer::MessageOwner,
    entities::message,
    repositories::{MessageRepository, OrderRepository, PostRepository},
    views::MessageView,
};
use chrono::Utc;
use sea_orm::{NotSet, Set};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Input for posting a message to a post or an order thread.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageInput {
    pub post_id: Option<String>,
    pub order_id: Option<String>,
    #[validate(length(min = 1, max = 4096))]
    pub message: String,
}

impl CreateMessageInput {
    /// The thread this message belongs to. Exactly one key must be given.
    fn owner(&self) -> AppResult<MessageOwner> {
        match (&self.post_id, &self.order_id) {
            (Some(post_id), None) => Ok(MessageOwner::Post(post_id.clone())),
            (None, Some(order_id)) => Ok(MessageOwner::Order(order_id.clone())),
            _ => Err(AppError::Validation(
                "Exactly one of postId or orderId is required".to_string(),
            )),
        }
    }
}

/// Service for message threads.
#[derive(Clone)]
pub struct MessageService {
    message_repo: MessageRepository,
    post_repo: PostRepository,
    order_repo: OrderRepository,
}

impl MessageService {
    /// Create a new message service.
    #[must_use]
    pub const fn new(
        message_repo: MessageRepository,
        post_repo: PostRepository,
        order_repo: OrderRepository,
    ) -> Self {
        Self {
            message_repo,
            post_repo,
            order_repo,
        }
    }

    /// Post a message. Order threads are open to the renter and the post owner.
    pub async fn create(&self, user_id: &str, input: CreateMessageInput) -> AppResult<()> {
        input.validate()?;
        let owner = input.owner()?;

        let (post_id, order_id) = match &owner {
            MessageOwner::Post(post_id) => {
                self.post_repo
                    .find_detail(TxScope::Auto, post_id)
                    .await?
                    .ok_or_else(|| AppError::PostNotFound(post_id.clone()))?;
                (Some(post_id.clone()), None)
            }
            MessageOwner::Order(order_id) => {
                let order = self
                    .order_repo
                    .find_by_id(TxScope::Auto, order_id)
                    .await?
                    .ok_or_else(|| AppError::OrderNotFound(order_id.clone()))?;
                if order.user_id != user_id {
                    let post = self
                        .post_repo
                        .find_detail(TxScope::Auto, &order.post_id)
                        .await?
                        .ok_or_else(|| AppError::PostNotFound(order.post_id.clone()))?;
                    if post.user_id != user_id {
                        return Err(AppError::Forbidden("Not a party to this order".to_string()));
                    }
                }
                (None, Some(order_id.clone()))
            }
        };

        self.message_repo
            .insert(
                TxScope::Auto,
                message::ActiveModel {
                    id: NotSet,
                    user_id: Set(user_id.to_string()),
                    post_id: Set(post_id),
                    order_id: Set(order_id),
                    message: Set(input.message),
                    created_at: Set(Utc::now().fixed_offset()),
                },
            )
            .await?;

        info!(user_id = %user_id, ?owner, "Message created");
        Ok(())
    }

    /// Messages left on a post, oldest first.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<MessageView>> {
        self.message_repo
            .list(TxScope::Auto, &MessageOwner::Post(post_id.to_string()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{detail_row, exec};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service(db: &Arc<DatabaseConnection>) -> MessageService {
        MessageService::new(
            MessageRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            OrderRepository::new(db.clone()),
        )
    }

    fn input(post_id: Option<&str>, order_id: Option<&str>) -> CreateMessageInput {
        CreateMessageInput {
            post_id: post_id.map(ToString::to_string),
            order_id: order_id.map(ToString::to_string),
            message: "Still available?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_requires_exactly_one_thread_key() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(&db);

        let both = svc.create("u1", input(Some("p1"), Some("o1"))).await;
        let neither = svc.create("u1", input(None, None)).await;

        assert!(matches!(both, Err(AppError::Validation(_))));
        assert!(matches!(neither, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_post_message_is_inserted() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[detail_row("p1", "owner")]])
                .append_exec_results([exec(1)])
                .into_connection(),
        );
        let svc = service(&db);

        svc.create("renter", input(Some("p1"), None)).await.unwrap();
    }
}
