//! User service.

use boardhop_common::{AppError, AppResult, CallerIdentity, IdGenerator};
use boardhop_db::{TxScope, entities::user, repositories::UserRepository};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Input for signing up the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,
    #[validate(length(min = 1, max = 64))]
    pub last_name: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

/// Service for user accounts bound to identity-provider subjects.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register the caller.
    pub async fn signup(
        &self,
        identity: &CallerIdentity,
        input: SignupInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_subject(TxScope::Auto, &identity.subject)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("User already registered".to_string()));
        }
        if self
            .user_repo
            .find_by_email(TxScope::Auto, &input.email)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("Email already in use".to_string()));
        }

        let user = user::Model {
            id: self.id_gen.generate(),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            avatar_url: input.avatar_url,
            auth_subject: identity.subject.clone(),
            created_at: Utc::now().fixed_offset(),
        };

        self.user_repo
            .insert(
                TxScope::Auto,
                user::ActiveModel {
                    id: Set(user.id.clone()),
                    email: Set(user.email.clone()),
                    first_name: Set(user.first_name.clone()),
                    last_name: Set(user.last_name.clone()),
                    phone: Set(user.phone.clone()),
                    avatar_url: Set(user.avatar_url.clone()),
                    auth_subject: Set(user.auth_subject.clone()),
                    created_at: Set(user.created_at),
                },
            )
            .await?;

        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// The caller's user row, or `UserNotFound` when not signed up.
    pub async fn me(&self, identity: &CallerIdentity) -> AppResult<user::Model> {
        self.user_repo
            .find_by_subject(TxScope::Auto, &identity.subject)
            .await?
            .ok_or_else(|| AppError::UserNotFound(identity.subject.clone()))
    }

    /// The caller's user row for write access.
    ///
    /// An identity without a user row is unauthorized rather than missing.
    pub async fn resolve(&self, identity: &CallerIdentity) -> AppResult<user::Model> {
        self.user_repo
            .find_by_subject(TxScope::Auto, &identity.subject)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(TxScope::Auto, id).await
    }
}
