//! User repository.

use std::sync::Arc;

use boardhop_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::{
    TxScope, db_err,
    entities::{User, user},
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, scope: TxScope<'_>, id: &str) -> AppResult<Option<user::Model>> {
        let tx = scope.open(&self.db).await?;
        let result = User::find_by_id(id)
            .one(tx.conn())
            .await
            .map_err(db_err("find user"));
        tx.settle(result).await
    }

    /// Get a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, scope: TxScope<'_>, id: &str) -> AppResult<user::Model> {
        self.find_by_id(scope, id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find the user bound to an identity-provider subject.
    pub async fn find_by_subject(
        &self,
        scope: TxScope<'_>,
        subject: &str,
    ) -> AppResult<Option<user::Model>> {
        let tx = scope.open(&self.db).await?;
        let result = User::find()
            .filter(user::Column::AuthSubject.eq(subject))
            .one(tx.conn())
            .await
            .map_err(db_err("find user by subject"));
        tx.settle(result).await
    }

    /// Find a user by email.
    pub async fn find_by_email(
        &self,
        scope: TxScope<'_>,
        email: &str,
    ) -> AppResult<Option<user::Model>> {
        let tx = scope.open(&self.db).await?;
        let result = User::find()
            .filter(user::Column::Email.eq(email))
            .one(tx.conn())
            .await
            .map_err(db_err("find user by email"));
        tx.settle(result).await
    }

    /// Insert a user row.
    pub async fn insert(&self, scope: TxScope<'_>, model: user::ActiveModel) -> AppResult<()> {
        let tx = scope.open(&self.db).await?;
        let result = User::insert(model)
            .exec_without_returning(tx.conn())
            .await
            .map(|_| ())
            .map_err(db_err("insert user"));
        tx.settle(result).await
    }
}
