use std::collections::HashMap;
use async_trait::async_trait;
use crate::availability::domain::AvailabilityService;
use crate::books::domain::model::BookEntity;
use crate::books::dto::BookDto;
use crate::books::repository::BookRepository;
use crate::core::domain::Configuration;
use crate::core::library::{BookStatus, LibraryError, LibraryResult};

pub(crate) struct AvailabilityServiceImpl {
    book_repository: Box<dyn BookRepository>,
}

impl AvailabilityServiceImpl {
    pub(crate) fn new(_config: &Configuration, book_repository: Box<dyn BookRepository>) -> Self {
        Self {
            book_repository,
        }
    }
}

#[async_trait]
impl AvailabilityService for AvailabilityServiceImpl {
    async fn add_book(&self, book: &BookDto) -> LibraryResult<BookDto> {
        let _ = self.book_repository.create(&BookEntity::from(book)).await?;
        Ok(book.clone())
    }

    async fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto> {
        self.book_repository.get(id).await.map(|b| BookDto::from(&b))
    }

    async fn find_book_by_isbn(&self, isbn: &str) -> LibraryResult<Vec<BookDto>> {
        let res = self.book_repository.query(
            &HashMap::from([("isbn".to_string(), isbn.to_string())]), None, 100).await?;
        Ok(res.records.iter().map(BookDto::from).collect())
    }

    async fn is_available(&self, id: &str) -> LibraryResult<bool> {
        match self.book_repository.get(id).await {
            Ok(book) => Ok(book.book_status == BookStatus::Available),
            Err(LibraryError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn set_status(&self, id: &str, status: BookStatus) -> LibraryResult<BookDto> {
        let mut book = self.book_repository.get(id).await?;
        book.book_status = status;
        self.book_repository.update(&book).await?;
        self.book_repository.get(id).await.map(|b| BookDto::from(&b))
    }
}

impl From<&BookEntity> for BookDto {
    fn from(other: &BookEntity) -> Self {
        Self {
            book_id: other.book_id.to_string(),
            version: other.version,
            isbn: other.isbn.to_string(),
            title: other.title.to_string(),
            book_status: other.book_status,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&BookDto> for BookEntity {
    fn from(other: &BookDto) -> Self {
        Self {
            book_id: other.book_id.to_string(),
            version: other.version,
            isbn: other.isbn.to_string(),
            title: other.title.to_string(),
            book_status: other.book_status,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}
