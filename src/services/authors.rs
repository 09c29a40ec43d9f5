//! Authors service

use crate::{
    error::AppResult,
    models::author::{Author, AuthorDetails, CreateAuthor, UpdateAuthor},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, name: Option<String>) -> AppResult<Vec<Author>> {
        self.repository.authors.list(name).await
    }

    /// Author with the books they wrote
    pub async fn get(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.by_author(id).await?;
        Ok(AuthorDetails { author, books })
    }

    pub async fn create(&self, author: &CreateAuthor) -> AppResult<Author> {
        let created = self.repository.authors.create(author).await?;
        tracing::info!(author_id = created.id, "Author created");
        Ok(created)
    }

    pub async fn update(&self, id: i32, author: &UpdateAuthor) -> AppResult<Author> {
        self.repository.authors.update(id, author).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{summary, MockRepos};
    use chrono::Utc;

    #[tokio::test]
    async fn get_includes_books() {
        let mut repos = MockRepos::default();
        repos.authors.expect_get_by_id().returning(|id| {
            Ok(Author {
                id,
                first_name: Some("Ursula".into()),
                last_name: "Le Guin".into(),
                biography: None,
                created_at: Utc::now(),
            })
        });
        repos
            .books
            .expect_by_author()
            .returning(|_| Ok(vec![summary(1, 2), summary(2, 2)]));

        let details = AuthorsService::new(repos.build()).get(3).await.unwrap();
        assert_eq!(details.author.last_name, "Le Guin");
        assert_eq!(details.books.len(), 2);
    }
}
