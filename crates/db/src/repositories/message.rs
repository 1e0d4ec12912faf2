//! Message repository.

use std::sync::Arc;

use boardhop_common::AppResult;
use sea_orm::{DatabaseConnection, EntityTrait, FromQueryResult};

use crate::{
    TxScope,
    composer::{self, MessageOwner},
    db_err,
    entities::{Message, message},
    statement,
    views::MessageView,
};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a message row.
    pub async fn insert(&self, scope: TxScope<'_>, model: message::ActiveModel) -> AppResult<()> {
        let tx = scope.open(&self.db).await?;
        let result = Message::insert(model)
            .exec_without_returning(tx.conn())
            .await
            .map(|_| ())
            .map_err(db_err("insert message"));
        tx.settle(result).await
    }

    /// Messages of one thread, oldest first.
    pub async fn list(
        &self,
        scope: TxScope<'_>,
        owner: &MessageOwner,
    ) -> AppResult<Vec<MessageView>> {
        let tx = scope.open(&self.db).await?;
        let conn = tx.conn();
        let result = MessageView::find_by_statement(statement(conn, &composer::messages(owner)))
            .all(conn)
            .await
            .map_err(db_err("list messages"));
        tx.settle(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Set};

    #[tokio::test]
    async fn test_list_post_thread() {
        let row = btreemap! {
            "id" => 1_i32.into(),
            "user_id" => "renter".into(),
            "post_id" => Some("p1".to_string()).into(),
            "order_id" => Option::<String>::None.into(),
            "message" => "Is it still available?".into(),
            "created_at" => Utc::now().fixed_offset().into(),
            "avatar_url" => Some("https://cdn.example.com/a.png".to_string()).into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let messages = repo
            .list(TxScope::Auto, &MessageOwner::Post("p1".to_string()))
            .await
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].post_id.as_deref(), Some("p1"));
        assert!(messages[0].avatar_url.is_some());
    }

    #[tokio::test]
    async fn test_insert_failure_is_database_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_errors([sea_orm::DbErr::Custom("check violation".to_string())])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let model = message::ActiveModel {
            user_id: Set("renter".to_string()),
            message: Set("hi".to_string()),
            ..Default::default()
        };
        let result = repo.insert(TxScope::Auto, model).await;

        assert!(matches!(result, Err(boardhop_common::AppError::Database(msg)) if msg.starts_with("insert message")));
    }
}
