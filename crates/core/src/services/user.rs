//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use humap_common::{AppError, AppResult, IdGenerator};
use humap_db::{
    entities::user::{self, Role},
    repositories::UserRepository,
};
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    #[validate(email, length(max = 256))]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for signing in.
#[derive(Debug, Deserialize, Validate)]
pub struct SigninInput {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Input for editing one's own profile. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 128))]
    pub username: Option<String>,
    #[validate(length(max = 32))]
    pub gender: Option<String>,
    #[validate(length(max = 512))]
    pub avatar: Option<String>,
    /// Only present to be refused: passwords are not changed here.
    pub password: Option<String>,
}

/// Credentials returned by signup and signin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub id: String,
    pub username: String,
    pub token: String,
}

impl From<user::Model> for AuthSession {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            token: user.token,
        }
    }
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

    /// Register a new account and issue its token.
    pub async fn signup(&self, input: SignupInput) -> AppResult<AuthSession> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            token: Set(self.id_gen.generate_token()),
            avatar: Set(None),
            gender: Set(None),
            role: Set(Role::User),
            nb_reviews: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await.map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict("Email already registered".to_string()),
            other => other,
        })?;

        tracing::info!(user_id = %user.id, "Registered user");
        Ok(user.into())
    }

    /// Authenticate by email and password.
    pub async fn signin(&self, input: SigninInput) -> AppResult<AuthSession> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user.into())
    }

    /// Authenticate a user by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Edit the caller's own profile (username, gender, avatar).
    pub async fn update(
        &self,
        actor: &user::Model,
        id: &str,
        input: UpdateUserInput,
    ) -> AppResult<user::Model> {
        if actor.id != id {
            return Err(AppError::access_denied());
        }
        if input.password.is_some() {
            return Err(AppError::BadRequest(
                "Use a dedicated endpoint to change password".to_string(),
            ));
        }
        input.validate()?;

        let mut active = self.user_repo.get_by_id(id).await?.into_active_model();
        if let Some(username) = input.username {
            active.username = Set(username.trim().to_string());
        }
        if input.gender.is_some() {
            active.gender = Set(input.gender);
        }
        if input.avatar.is_some() {
            active.avatar = Set(input.avatar);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Delete the caller's own account.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        if actor.id != id {
            return Err(AppError::access_denied());
        }

        let user = self.user_repo.get_by_id(id).await?;
        self.user_repo.delete(&user.id).await?;
        tracing::info!(user_id = %user.id, "Deleted user");
        Ok(())
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
