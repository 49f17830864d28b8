use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use crate::core::library::LibraryResult;
use crate::loans::dto::LoanDto;

pub mod model;
pub mod service;

// LoanService orchestrates borrow/return/extend against the availability
// tracker and the reservation queue. Borrow is the only operation that
// retries on transient store contention; every business-rule rejection
// surfaces immediately.
#[async_trait]
pub trait LoanService: Sync + Send {
    async fn borrow(&self, user_id: &str, book_id: &str) -> LibraryResult<LoanDto>;

    async fn return_book(&self, loan_id: &str) -> LibraryResult<LoanDto>;

    async fn extend(&self, loan_id: &str) -> LibraryResult<LoanDto>;

    // Marks Active/Extended loans due within the reminder window as
    // reminded and emits a due-soon event for each. Idempotent; delivery
    // belongs to the gateway.
    async fn due_soon_reminder_sweep(&self, now: NaiveDateTime) -> LibraryResult<Vec<LoanDto>>;

    async fn find_loan_by_id(&self, id: &str) -> LibraryResult<LoanDto>;

    // Full loan history for the member, newest first.
    async fn get_loans_by_user(&self, user_id: &str) -> LibraryResult<Vec<LoanDto>>;

    // Active and Extended loans for the member.
    async fn get_active_loans(&self, user_id: &str) -> LibraryResult<Vec<LoanDto>>;

    async fn get_overdue_loans(&self, as_of: NaiveDate) -> LibraryResult<Vec<LoanDto>>;

    async fn get_loans_due_within(&self, days: i64) -> LibraryResult<Vec<LoanDto>>;
}
