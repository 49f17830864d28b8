pub mod memory_loan_repository;

use async_trait::async_trait;
use chrono::NaiveDate;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;
use crate::loans::domain::model::LoanEntity;

#[async_trait]
pub(crate) trait LoanRepository: Repository<LoanEntity> {
    // The member's Active or Extended loan on the book, if any. At most one
    // such loan exists per (user, book).
    async fn find_open_by_user_and_book(&self, user_id: &str, book_id: &str)
                                        -> LibraryResult<Option<LoanEntity>>;

    async fn count_open_by_user(&self, user_id: &str) -> LibraryResult<i64>;

    async fn query_open_by_user(&self, user_id: &str) -> LibraryResult<Vec<LoanEntity>>;

    // Open loans due strictly before as_of.
    async fn query_overdue(&self, as_of: NaiveDate) -> LibraryResult<Vec<LoanEntity>>;

    // Open loans due within [start, end].
    async fn query_due_between(&self, start: NaiveDate, end: NaiveDate) -> LibraryResult<Vec<LoanEntity>>;

    // Open loans due within [start, end] that have not been reminded yet.
    async fn query_reminder_candidates(&self, start: NaiveDate, end: NaiveDate) -> LibraryResult<Vec<LoanEntity>>;
}
