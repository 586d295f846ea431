use std::sync::Arc;

use crate::auth::{hash_password_with_cost, verify_password, RegisterRequest};
use crate::error::AppError;
use crate::models::{gravatar_url, NewUser, User, UserRole};
use crate::repository::UserRepository;

/// Result of confirming an e-mail address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    AlreadyConfirmed,
}

/// Account operations layered over a [`UserRepository`].
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hash_cost: u32,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self {
            repository,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt cost. Tests use the minimum to stay fast.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn repository(&self) -> &Arc<dyn UserRepository> {
        &self.repository
    }

    /// Registers a new unconfirmed account with the `user` role.
    ///
    /// Fails with `AppError::Conflict` when the e-mail or username is taken.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        if self.repository.get_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict(
                "A user with this email already exists".into(),
            ));
        }
        if self
            .repository
            .get_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A user with this username already exists".into(),
            ));
        }

        self.create_user(&request.username, &request.email, &request.password, UserRole::User)
            .await
    }

    /// Hashes the password and stores the account with a Gravatar avatar.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let password_hash = hash_password_with_cost(password, self.hash_cost)?;
        let user = self
            .repository
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                avatar: Some(gravatar_url(email)),
                role,
            })
            .await?;
        log::info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn get_by_id(&self, user_id: i32) -> Result<Option<User>, AppError> {
        self.repository.get_by_id(user_id).await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.repository.get_by_username(username).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.repository.get_by_email(email).await
    }

    /// Checks the credentials and that the e-mail address has been confirmed.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = match self.repository.get_by_username(username).await? {
            Some(user) if verify_password(password, &user.password_hash)? => user,
            _ => return Err(AppError::Unauthorized("Incorrect username or password".into())),
        };

        if !user.confirmed {
            return Err(AppError::Unauthorized("Email address not confirmed".into()));
        }
        Ok(user)
    }

    /// Confirms the address. An unknown address is `AppError::BadRequest`.
    pub async fn confirm_email(&self, email: &str) -> Result<Confirmation, AppError> {
        let user = self
            .repository
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::BadRequest("Verification error".into()))?;

        if user.confirmed {
            return Ok(Confirmation::AlreadyConfirmed);
        }
        if !self.repository.confirm_email(email).await? {
            return Err(AppError::BadRequest("Verification error".into()));
        }
        log::info!("Confirmed email of user {}", user.id);
        Ok(Confirmation::Confirmed)
    }

    pub async fn update_avatar_url(&self, user_id: i32, url: &str) -> Result<User, AppError> {
        let user = self
            .repository
            .update_avatar(user_id, url)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        log::info!("Updated avatar of user {}", user.id);
        Ok(user)
    }
}
