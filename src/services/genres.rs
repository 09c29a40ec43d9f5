//! Genres service

use crate::{
    error::{AppError, AppResult},
    models::genre::{CreateGenre, Genre, GenreDetails, UpdateGenre},
    repository::Repository,
};

#[derive(Clone)]
pub struct GenresService {
    repository: Repository,
}

impl GenresService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<GenreDetails> {
        let genre = self.repository.genres.get_by_id(id).await?;
        let book_count = self.repository.genres.count_books(id).await?;
        Ok(GenreDetails { genre, book_count })
    }

    async fn ensure_name_free(&self, name: &str, exclude_id: Option<i32>) -> AppResult<()> {
        if let Some(existing) = self.repository.genres.get_by_name(name).await? {
            if Some(existing.id) != exclude_id {
                return Err(AppError::Conflict(format!("Genre '{}' already exists", name)));
            }
        }
        Ok(())
    }

    pub async fn create(&self, genre: &CreateGenre) -> AppResult<Genre> {
        self.ensure_name_free(&genre.name, None).await?;
        let created = self.repository.genres.create(genre).await?;
        tracing::info!(genre_id = created.id, name = %created.name, "Genre created");
        Ok(created)
    }

    pub async fn update(&self, id: i32, genre: &UpdateGenre) -> AppResult<Genre> {
        if let Some(ref name) = genre.name {
            self.ensure_name_free(name, Some(id)).await?;
        }
        self.repository.genres.update(id, genre).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await
    }
}
