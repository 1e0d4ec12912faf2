//! Order service.

use boardhop_common::{AppError, AppResult, IdGenerator, ListingConfig};
use boardhop_db::{
    TxScope,
    composer::{OrderFilter, Pagination},
    entities::{message, order, order::OrderStatus},
    repositories::{MessageRepository, OrderRepository, PostRepository},
    views::{OrderAggregate, OrderSummary},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{NotSet, Set};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

/// Input for creating an order.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    #[validate(length(min = 1))]
    pub post_id: String,
    #[validate(length(max = 256))]
    pub payment_id: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(range(min = 0.0))]
    pub total: f64,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    /// First message of the order thread, written with the order.
    #[validate(length(min = 1, max = 4096))]
    pub message: Option<String>,
}

/// Service for rental orders.
#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    post_repo: PostRepository,
    message_repo: MessageRepository,
    listing: ListingConfig,
    id_gen: IdGenerator,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub const fn new(
        order_repo: OrderRepository,
        post_repo: PostRepository,
        message_repo: MessageRepository,
        listing: ListingConfig,
    ) -> Self {
        Self {
            order_repo,
            post_repo,
            message_repo,
            listing,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an order and its optional first message atomically.
    pub async fn create(&self, user_id: &str, input: CreateOrderInput) -> AppResult<String> {
        input.validate()?;
        if input.end_date < input.start_date {
            return Err(AppError::Validation(
                "endDate must not be before startDate".to_string(),
            ));
        }

        let order_id = self.id_gen.generate();
        let now = Utc::now().fixed_offset();

        let mut uow = self.order_repo.begin().await?;
        let result = async {
            self.post_repo
                .find_detail(uow.scope(), &input.post_id)
                .await?
                .ok_or_else(|| AppError::PostNotFound(input.post_id.clone()))?;

            self.order_repo
                .insert(
                    uow.scope(),
                    order::ActiveModel {
                        id: Set(order_id.clone()),
                        post_id: Set(input.post_id.clone()),
                        user_id: Set(user_id.to_string()),
                        payment_id: Set(input.payment_id.clone()),
                        status: Set(OrderStatus::Pending),
                        quantity: Set(input.quantity),
                        total: Set(input.total),
                        start_date: Set(input.start_date),
                        end_date: Set(input.end_date),
                        created_at: Set(now),
                        deleted_at: Set(None),
                    },
                )
                .await?;

            if let Some(text) = &input.message {
                self.message_repo
                    .insert(
                        uow.scope(),
                        message::ActiveModel {
                            id: NotSet,
                            user_id: Set(user_id.to_string()),
                            post_id: Set(None),
                            order_id: Set(Some(order_id.clone())),
                            message: Set(text.clone()),
                            created_at: Set(now),
                        },
                    )
                    .await?;
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => uow.commit().await?,
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                return Err(err);
            }
        }

        info!(order_id = %order_id, post_id = %input.post_id, "Order created");
        Ok(order_id)
    }

    /// Get an order visible to its renter or to the owner of the rented post.
    pub async fn get(&self, user_id: &str, order_id: &str) -> AppResult<OrderAggregate> {
        let order = self.order_repo.get(TxScope::Auto, order_id).await?;
        if order.order.user_id != user_id && order.post.post.user_id != user_id {
            return Err(AppError::Forbidden("Not a party to this order".to_string()));
        }
        Ok(order)
    }

    /// List the caller's orders.
    pub async fn list(
        &self,
        user_id: &str,
        page: Option<&str>,
        size: Option<&str>,
    ) -> AppResult<Vec<OrderSummary>> {
        let filter = OrderFilter {
            user_id: user_id.to_string(),
            pagination: Pagination::parse(page, size, &self.listing),
        };
        let orders = self.order_repo.list(TxScope::Auto, &filter).await?;
        if orders.is_empty() {
            return Err(AppError::NotFound("No orders found".to_string()));
        }
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardhop_db::test_utils::render_log;
    use crate::services::testing::{detail_row, empty_rows, exec};
    use boardhop_db::entities::post_media;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service(db: &Arc<DatabaseConnection>) -> OrderService {
        OrderService::new(
            OrderRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            MessageRepository::new(db.clone()),
            ListingConfig::default(),
        )
    }

    fn input(message: Option<&str>) -> CreateOrderInput {
        let start = Utc::now().fixed_offset();
        CreateOrderInput {
            post_id: "p1".to_string(),
            payment_id: None,
            quantity: 1,
            total: 80.0,
            start_date: start,
            end_date: start + chrono::Duration::days(2),
            message: message.map(ToString::to_string),
        }
    }

    fn log_of(db: Arc<DatabaseConnection>) -> String {
        let Ok(db) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        render_log(&db.into_transaction_log())
    }

    fn order_model(id: &str, user_id: &str) -> order::Model {
        let now = Utc::now().fixed_offset();
        order::Model {
            id: id.to_string(),
            post_id: "p1".to_string(),
            user_id: user_id.to_string(),
            payment_id: None,
            status: OrderStatus::Pending,
            quantity: 1,
            total: 80.0,
            start_date: now,
            end_date: now,
            created_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_with_message_commits_both_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[detail_row("p1", "owner")]])
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );
        let svc = service(&db);

        svc.create("renter", input(Some("Can I pick up at 8?")))
            .await
            .unwrap();
        drop(svc);

        let log = log_of(db);
        assert!(log.contains("INSERT INTO \"order\""));
        assert!(log.contains("INSERT INTO \"message\""));
        assert_eq!(log.matches("COMMIT").count(), 1);
    }

    #[tokio::test]
    async fn test_create_message_failure_rolls_back_order() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[detail_row("p1", "owner")]])
                .append_exec_results([exec(1)])
                .into_connection(),
        );
        let svc = service(&db);

        let result = svc.create("renter", input(Some("hello"))).await;
        drop(svc);

        assert!(matches!(result, Err(AppError::Database(msg)) if msg.starts_with("insert message")));
        let log = log_of(db);
        assert!(log.contains("ROLLBACK"));
        assert!(!log.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_create_for_missing_post_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([empty_rows()])
                .into_connection(),
        );
        let svc = service(&db);

        let result = svc.create("renter", input(None)).await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_reversed_dates() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(&db);

        let mut reversed = input(None);
        std::mem::swap(&mut reversed.start_date, &mut reversed.end_date);
        let result = svc.create("renter", reversed).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_by_stranger_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[order_model("o1", "renter")]])
                .append_query_results([[detail_row("p1", "owner")]])
                .append_query_results([empty_rows()])
                .append_query_results([empty_rows()])
                .append_query_results([Vec::<post_media::Model>::new()])
                .append_query_results([empty_rows()])
                .into_connection(),
        );
        let svc = service(&db);

        let result = svc.get("stranger", "o1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_by_post_owner_is_allowed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[order_model("o1", "renter")]])
                .append_query_results([[detail_row("p1", "owner")]])
                .append_query_results([empty_rows()])
                .append_query_results([empty_rows()])
                .append_query_results([Vec::<post_media::Model>::new()])
                .append_query_results([empty_rows()])
                .into_connection(),
        );
        let svc = service(&db);

        let order = svc.get("owner", "o1").await.unwrap();

        assert_eq!(order.order.id, "o1");
        assert_eq!(order.post.post.id, "p1");
        assert!(order.messages.is_empty());
    }
}
