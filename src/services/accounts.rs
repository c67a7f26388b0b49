use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, SqlErr,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::entities::{user, User};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 2, message = "Username must be at least 2 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// A user plus the token that authenticates them.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: user::Model,
    pub token: String,
}

#[derive(Clone)]
pub struct AccountService {
    db: DbPool,
    auth: Arc<AuthService>,
    event_sender: EventSender,
}

impl AccountService {
    pub fn new(db: DbPool, auth: Arc<AuthService>, event_sender: EventSender) -> Self {
        Self {
            db,
            auth,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<AuthenticatedUser, ServiceError> {
        request.validate()?;

        let row = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(request.username.clone()),
            email: Set(request.email.to_lowercase()),
            password_hash: Set(self.auth.hash_password(&request.password)?),
            is_admin: Set(false),
            created_at: Set(Utc::now()),
        };

        let user = match row.insert(&self.db).await {
            Ok(user) => user,
            Err(err) => {
                // The unique email index is the duplicate check; no
                // read-before-write race window.
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(ServiceError::ValidationError(
                        "User with this email already exists".to_string(),
                    ));
                }
                return Err(err.into());
            }
        };

        self.event_sender
            .send(Event::UserRegistered {
                user_id: user.id,
                email: user.email.clone(),
            })
            .await;

        let token = self
            .auth
            .issue_token(user.id, &user.email, &user.username, user.is_admin)?;
        Ok(AuthenticatedUser { user, token })
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthenticatedUser, ServiceError> {
        request.validate()?;

        let user = User::find()
            .filter(user::Column::Email.eq(request.email.to_lowercase()))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;

        if !self.auth.verify_password(&request.password, &user.password_hash)? {
            return Err(ServiceError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self
            .auth
            .issue_token(user.id, &user.email, &user.username, user.is_admin)?;
        Ok(AuthenticatedUser { user, token })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }
}
