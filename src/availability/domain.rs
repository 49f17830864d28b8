use async_trait::async_trait;
use crate::books::dto::BookDto;
use crate::core::library::{BookStatus, LibraryResult};

pub mod service;

// AvailabilityService tracks each copy's circulation status and performs
// the status writes on behalf of the loan lifecycle. It has no knowledge of
// the reservation queue; callers decide the target status.
#[async_trait]
pub trait AvailabilityService: Sync + Send {
    async fn add_book(&self, book: &BookDto) -> LibraryResult<BookDto>;
    async fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto>;
    async fn find_book_by_isbn(&self, isbn: &str) -> LibraryResult<Vec<BookDto>>;
    async fn is_available(&self, id: &str) -> LibraryResult<bool>;
    async fn set_status(&self, id: &str, status: BookStatus) -> LibraryResult<BookDto>;
}
