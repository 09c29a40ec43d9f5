//! Notification service: stores user notifications and mails them out

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::notification::Notification,
    repository::Repository,
    services::email::Mailer,
};

const EMAIL_SUBJECT: &str = "Library notification";

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
    mailer: Arc<dyn Mailer>,
}

impl NotificationsService {
    pub fn new(repository: Repository, mailer: Arc<dyn Mailer>) -> Self {
        Self { repository, mailer }
    }

    /// Store a notification for the user and email a copy.
    ///
    /// Delivery failures are logged; the stored notification is returned either way.
    pub async fn notify(&self, user_id: i32, message: &str) -> AppResult<Notification> {
        let notification = self.repository.notifications.create(user_id, message).await?;

        match self.repository.users.get_by_id(user_id).await {
            Ok(user) => {
                if let Err(e) = self.mailer.send(&user.email, EMAIL_SUBJECT, message).await {
                    tracing::warn!(user_id, "Failed to email notification: {}", e);
                }
            }
            Err(e) => tracing::warn!(user_id, "No recipient for notification email: {}", e),
        }

        Ok(notification)
    }

    pub async fn list(&self, user_id: i32, unread_only: bool) -> AppResult<Vec<Notification>> {
        self.repository.notifications.for_user(user_id, unread_only).await
    }

    pub async fn unread_count(&self, user_id: i32) -> AppResult<i64> {
        self.repository.notifications.count_unread(user_id).await
    }

    /// Mark one of the user's notifications as read
    pub async fn mark_read(&self, user_id: i32, notification_id: i32) -> AppResult<()> {
        let notification = self.repository.notifications.get_by_id(notification_id).await?;
        if notification.user_id != user_id {
            return Err(AppError::Authorization(
                "Notification belongs to another user".to_string(),
            ));
        }
        if notification.is_read {
            return Ok(());
        }
        self.repository.notifications.mark_read(notification_id).await
    }

    pub async fn mark_all_read(&self, user_id: i32) -> AppResult<u64> {
        self.repository.notifications.mark_all_read(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{notification, patron, MockMailerImpl, MockRepos};

    #[tokio::test]
    async fn notify_stores_and_emails() {
        let mut repos = MockRepos::default();
        repos
            .notifications
            .expect_create()
            .withf(|user_id, message| *user_id == 5 && message == "Book ready")
            .times(1)
            .returning(|user_id, message| Ok(notification(1, user_id, message)));
        repos.users.expect_get_by_id().returning(|id| Ok(patron(id)));

        let mut mailer = MockMailerImpl::new();
        mailer
            .expect_send()
            .withf(|to, _, body| to == "patron5@library.org" && body == "Book ready")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = NotificationsService::new(repos.build(), Arc::new(mailer));
        let stored = service.notify(5, "Book ready").await.unwrap();
        assert_eq!(stored.user_id, 5);
        assert!(!stored.is_read);
    }

    #[tokio::test]
    async fn email_failure_is_not_propagated() {
        let mut repos = MockRepos::default();
        repos
            .notifications
            .expect_create()
            .returning(|user_id, message| Ok(notification(9, user_id, message)));
        repos.users.expect_get_by_id().returning(|id| Ok(patron(id)));

        let mut mailer = MockMailerImpl::new();
        mailer
            .expect_send()
            .returning(|_, _, _| Err(AppError::Internal("smtp down".into())));

        let service = NotificationsService::new(repos.build(), Arc::new(mailer));
        tokio_test::assert_ok!(service.notify(5, "Overdue").await);
    }

    #[tokio::test]
    async fn cannot_mark_someone_elses_notification() {
        let mut repos = MockRepos::default();
        repos
            .notifications
            .expect_get_by_id()
            .returning(|id| Ok(notification(id, 8, "hello")));
        repos.notifications.expect_mark_read().never();

        let service = NotificationsService::new(repos.build(), Arc::new(MockMailerImpl::new()));
        let err = service.mark_read(5, 3).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn mark_read_own_notification() {
        let mut repos = MockRepos::default();
        repos
            .notifications
            .expect_get_by_id()
            .returning(|id| Ok(notification(id, 5, "hello")));
        repos.notifications.expect_mark_read().times(1).returning(|_| Ok(()));

        let service = NotificationsService::new(repos.build(), Arc::new(MockMailerImpl::new()));
        tokio_test::assert_ok!(service.mark_read(5, 3).await);
    }
}
