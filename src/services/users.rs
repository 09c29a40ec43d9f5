//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::{AuthConfig, BootstrapAdmin},
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{LoginResponse, NewUser, RegisterUser, UpdateProfile, User, UserClaims, UserQuery},
    },
    repository::{users::ProfileChanges, Repository},
    services::{books::most_frequent_genre, validation::ValidationService},
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    validation: ValidationService,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, validation: ValidationService, config: AuthConfig) -> Self {
        Self {
            repository,
            validation,
            config,
        }
    }

    /// Create a patron account
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        self.validation.validate_username(&request.username, None).await?;
        self.validation.validate_email(&request.email, None).await?;
        self.validation.validate_password(&request.password)?;

        let user = self
            .repository
            .users
            .create(&NewUser {
                username: request.username,
                email: request.email,
                password_hash: self.hash_password(&request.password)?,
                first_name: request.first_name,
                last_name: request.last_name,
                role: Role::Patron,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Authenticate by username and password and return a JWT
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            tracing::warn!(username, "Failed login attempt");
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.jwt_expiration_hours as i64 * 3600,
            user,
        })
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        if user.password_hash.is_empty() {
            return Ok(false);
        }
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    pub async fn get(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(query).await
    }

    /// Update the caller's own profile; a password change needs the current password
    pub async fn update_profile(&self, user_id: i32, profile: UpdateProfile) -> AppResult<User> {
        let user = self.repository.users.get_by_id(user_id).await?;

        if let Some(ref email) = profile.email {
            self.validation.validate_email(email, Some(user_id)).await?;
        }

        let password_hash = match profile.new_password {
            Some(ref new_password) => {
                let current_password = profile.current_password.as_ref().ok_or_else(|| {
                    AppError::Validation("Current password required to change password".to_string())
                })?;
                if !self.verify_password(&user, current_password)? {
                    return Err(AppError::Authentication("Current password is incorrect".to_string()));
                }
                self.validation.validate_password(new_password)?;
                Some(self.hash_password(new_password)?)
            }
            None => None,
        };

        let changes = ProfileChanges {
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            password_hash,
        };
        self.repository.users.update_profile(user_id, &changes).await
    }

    /// Change a user's role; administrators cannot demote themselves
    pub async fn assign_role(&self, acting_user_id: i32, user_id: i32, role: Role) -> AppResult<User> {
        let user = self.repository.users.get_by_id(user_id).await?;
        if user.id == acting_user_id && user.role == Role::Administrator && role != Role::Administrator {
            return Err(AppError::BadRequest(
                "Administrators cannot remove their own administrator role".to_string(),
            ));
        }

        let updated = self.repository.users.set_role(user_id, role).await?;
        tracing::info!(user_id, role = %role, by = acting_user_id, "Role assigned");
        Ok(updated)
    }

    pub async fn delete(&self, acting_user_id: i32, user_id: i32) -> AppResult<()> {
        if acting_user_id == user_id {
            return Err(AppError::BadRequest("Cannot delete your own account".to_string()));
        }
        self.repository.users.delete(user_id).await?;
        tracing::info!(user_id, by = acting_user_id, "User deleted");
        Ok(())
    }

    /// Genre the user borrowed most often; ties go to the smallest genre id
    pub async fn favourite_genre(&self, user_id: i32) -> AppResult<Option<i32>> {
        let history = self.repository.books.genre_history(user_id).await?;
        Ok(most_frequent_genre(&history))
    }

    /// Create the configured administrator when none exists yet
    pub async fn ensure_admin(&self, bootstrap: Option<&BootstrapAdmin>) -> AppResult<Option<User>> {
        let Some(admin) = bootstrap else {
            return Ok(None);
        };
        if self.repository.users.count_with_role(Role::Administrator).await? > 0 {
            return Ok(None);
        }

        self.validation.validate_username(&admin.username, None).await?;
        self.validation.validate_email(&admin.email, None).await?;
        self.validation.validate_password(&admin.password)?;

        let user = self
            .repository
            .users
            .create(&NewUser {
                username: admin.username.clone(),
                email: admin.email.clone(),
                password_hash: self.hash_password(&admin.password)?,
                first_name: None,
                last_name: None,
                role: Role::Administrator,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "Bootstrap administrator created");
        Ok(Some(user))
    }
}
