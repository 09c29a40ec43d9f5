//! Patron reading lists

use crate::{
    error::{AppError, AppResult},
    models::reading_list::{ReadingList, ReadingListDetails},
    repository::Repository,
};

/// Trimmed list name; blank names are rejected
fn list_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("List name cannot be blank".to_string()));
    }
    Ok(name)
}

#[derive(Clone)]
pub struct ReadingListsService {
    repository: Repository,
}

impl ReadingListsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Load a list and check it belongs to `user_id`
    async fn owned(&self, user_id: i32, list_id: i32) -> AppResult<ReadingList> {
        let list = self.repository.reading_lists.get_by_id(list_id).await?;
        if list.user_id != user_id {
            return Err(AppError::Authorization(
                "Reading list belongs to another user".to_string(),
            ));
        }
        Ok(list)
    }

    pub async fn create(&self, user_id: i32, name: &str) -> AppResult<ReadingList> {
        let name = list_name(name)?;
        self.repository.reading_lists.create(user_id, name).await
    }

    pub async fn list(&self, user_id: i32) -> AppResult<Vec<ReadingList>> {
        self.repository.reading_lists.for_user(user_id).await
    }

    pub async fn get(&self, user_id: i32, list_id: i32) -> AppResult<ReadingListDetails> {
        let list = self.owned(user_id, list_id).await?;
        let books = self.repository.reading_lists.books(list_id).await?;
        Ok(ReadingListDetails { list, books })
    }

    pub async fn rename(&self, user_id: i32, list_id: i32, name: &str) -> AppResult<ReadingList> {
        let name = list_name(name)?;
        self.owned(user_id, list_id).await?;
        self.repository.reading_lists.rename(list_id, name).await
    }

    pub async fn delete(&self, user_id: i32, list_id: i32) -> AppResult<()> {
        self.owned(user_id, list_id).await?;
        self.repository.reading_lists.delete(list_id).await
    }

    pub async fn add_book(&self, user_id: i32, list_id: i32, book_id: i32) -> AppResult<ReadingListDetails> {
        self.owned(user_id, list_id).await?;
        self.repository.books.get_by_id(book_id).await?;
        if self.repository.reading_lists.contains(list_id, book_id).await? {
            return Err(AppError::Conflict(format!(
                "Book {} is already in this reading list",
                book_id
            )));
        }
        self.repository.reading_lists.add_book(list_id, book_id).await?;
        self.get(user_id, list_id).await
    }

    pub async fn remove_book(&self, user_id: i32, list_id: i32, book_id: i32) -> AppResult<()> {
        self.owned(user_id, list_id).await?;
        if !self.repository.reading_lists.remove_book(list_id, book_id).await? {
            return Err(AppError::NotFound(format!(
                "Book {} is not in this reading list",
                book_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{book, MockRepos};
    use chrono::Utc;

    fn reading_list(id: i32, user_id: i32) -> ReadingList {
        ReadingList {
            id,
            user_id,
            name: "Summer".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn other_users_list_is_forbidden() {
        let mut repos = MockRepos::default();
        repos
            .reading_lists
            .expect_get_by_id()
            .returning(|id| Ok(reading_list(id, 9)));
        repos.reading_lists.expect_books().never();
        repos.reading_lists.expect_delete().never();
        let service = ReadingListsService::new(repos.build());

        assert!(matches!(service.get(5, 1).await, Err(AppError::Authorization(_))));
        assert!(matches!(service.delete(5, 1).await, Err(AppError::Authorization(_))));
    }

    #[tokio::test]
    async fn duplicate_book_conflicts() {
        let mut repos = MockRepos::default();
        repos
            .reading_lists
            .expect_get_by_id()
            .returning(|id| Ok(reading_list(id, 5)));
        repos.books.expect_get_by_id().returning(|id| Ok(book(id)));
        repos.reading_lists.expect_contains().returning(|_, _| Ok(true));
        repos.reading_lists.expect_add_book().never();

        let err = ReadingListsService::new(repos.build())
            .add_book(5, 1, 7)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_book_cannot_be_added() {
        let mut repos = MockRepos::default();
        repos
            .reading_lists
            .expect_get_by_id()
            .returning(|id| Ok(reading_list(id, 5)));
        repos
            .books
            .expect_get_by_id()
            .returning(|id| Err(AppError::NotFound(format!("Book with id {} not found", id))));
        repos.reading_lists.expect_add_book().never();

        let err = ReadingListsService::new(repos.build())
            .add_book(5, 1, 70)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let mut repos = MockRepos::default();
        repos.reading_lists.expect_create().never();
        repos.reading_lists.expect_rename().never();
        let service = ReadingListsService::new(repos.build());

        let err = service.create(5, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = service.rename(5, 1, "\t").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_stores_trimmed_name() {
        let mut repos = MockRepos::default();
        repos
            .reading_lists
            .expect_create()
            .withf(|user_id, name| *user_id == 5 && name == "Summer")
            .times(1)
            .returning(|user_id, name| {
                let mut list = reading_list(3, user_id);
                list.name = name.to_string();
                Ok(list)
            });

        let list = ReadingListsService::new(repos.build())
            .create(5, "  Summer ")
            .await
            .unwrap();
        assert_eq!(list.name, "Summer");
    }

    #[tokio::test]
    async fn add_book_returns_updated_list() {
        let mut repos = MockRepos::default();
        repos
            .reading_lists
            .expect_get_by_id()
            .returning(|id| Ok(reading_list(id, 5)));
        repos.books.expect_get_by_id().returning(|id| Ok(book(id)));
        repos.reading_lists.expect_contains().returning(|_, _| Ok(false));
        repos.reading_lists.expect_add_book().times(1).returning(|_, _| Ok(()));
        repos
            .reading_lists
            .expect_books()
            .returning(|_| Ok(vec![crate::services::testing::summary(7, 1)]));

        let details = ReadingListsService::new(repos.build())
            .add_book(5, 1, 7)
            .await
            .unwrap();
        assert_eq!(details.books.len(), 1);
        assert_eq!(details.books[0].id, 7);
    }
}
