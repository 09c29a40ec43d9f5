//! Account input validation

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AppError, AppResult},
    repository::Repository,
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("username pattern is valid"));

#[derive(Clone)]
pub struct ValidationService {
    repository: Repository,
}

impl ValidationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub fn validate_password(&self, password: &str) -> AppResult<()> {
        check_password(password)
    }

    pub fn validate_email_format(&self, email: &str) -> AppResult<()> {
        check_email(email)
    }

    /// Format check plus case-insensitive uniqueness
    pub async fn validate_username(&self, username: &str, exclude_id: Option<i32>) -> AppResult<()> {
        check_username(username)?;
        if self.repository.users.username_exists(username, exclude_id).await? {
            return Err(AppError::Validation(format!(
                "Username '{}' is already taken",
                username
            )));
        }
        Ok(())
    }

    pub async fn validate_email(&self, email: &str, exclude_id: Option<i32>) -> AppResult<()> {
        check_email(email)?;
        if self.repository.users.email_exists(email, exclude_id).await? {
            return Err(AppError::Validation(format!(
                "Email '{}' is already registered",
                email
            )));
        }
        Ok(())
    }
}

fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> AppResult<()> {
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::Validation(format!("'{}' is not a valid email address", email)));
    }
    Ok(())
}

fn check_username(username: &str) -> AppResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::Validation(
            "Username must be 3 to 32 letters, digits, '.', '_' or '-'".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{repository_with_users, MockUsersRepo};

    #[test]
    fn password_length() {
        assert!(check_password("short").is_err());
        assert!(check_password("1234567").is_err());
        assert!(check_password("12345678").is_ok());
    }

    #[test]
    fn email_format() {
        assert!(check_email("reader@library.org").is_ok());
        assert!(check_email("first.last+tag@mail.example.co.uk").is_ok());
        assert!(check_email("no-at-sign.org").is_err());
        assert!(check_email("two@@example.org").is_err());
        assert!(check_email("user@localhost").is_err());
        assert!(check_email("").is_err());
    }

    #[test]
    fn username_format() {
        assert!(check_username("jane.doe").is_ok());
        assert!(check_username("ab").is_err());
        assert!(check_username("   ").is_err());
        assert!(check_username("has space").is_err());
    }

    #[tokio::test]
    async fn taken_username_rejected() {
        let mut users = MockUsersRepo::new();
        users
            .expect_username_exists()
            .withf(|username, exclude| username == "alice" && exclude.is_none())
            .returning(|_, _| Ok(true));
        let service = ValidationService::new(repository_with_users(users));

        let err = service.validate_username("alice", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("already taken")));
    }

    #[tokio::test]
    async fn malformed_username_skips_lookup() {
        let mut users = MockUsersRepo::new();
        users.expect_username_exists().never();
        let service = ValidationService::new(repository_with_users(users));

        assert!(service.validate_username("a b", None).await.is_err());
    }

    #[tokio::test]
    async fn free_email_accepted() {
        let mut users = MockUsersRepo::new();
        users
            .expect_email_exists()
            .withf(|email, exclude| email == "new@library.org" && *exclude == Some(3))
            .returning(|_, _| Ok(false));
        let service = ValidationService::new(repository_with_users(users));

        tokio_test::assert_ok!(service.validate_email("new@library.org", Some(3)).await);
    }
}
