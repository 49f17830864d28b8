use std::time::Duration as StdDuration;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::warn;
use crate::availability::domain::AvailabilityService;
use crate::core::domain::Configuration;
use crate::core::events::{CirculationEvent, CirculationEventKind};
use crate::core::library::{BookStatus, ConflictReason, LibraryError, LibraryResult, LoanStatus, ReservationStatus};
use crate::gateway::events::EventPublisher;
use crate::loans::domain::model::LoanEntity;
use crate::loans::domain::LoanService;
use crate::loans::dto::LoanDto;
use crate::loans::repository::LoanRepository;
use crate::reservations::domain::ReservationService;
use crate::users::domain::UserService;
use crate::users::dto::UserDto;
use crate::utils::date::today;

pub(crate) struct LoanServiceImpl {
    config: Configuration,
    loan_repository: Box<dyn LoanRepository>,
    user_service: Box<dyn UserService>,
    availability_service: Box<dyn AvailabilityService>,
    reservation_service: Box<dyn ReservationService>,
    events_publisher: Box<dyn EventPublisher>,
}

impl LoanServiceImpl {
    pub(crate) fn new(config: &Configuration, loan_repository: Box<dyn LoanRepository>,
                      user_service: Box<dyn UserService>, availability_service: Box<dyn AvailabilityService>,
                      reservation_service: Box<dyn ReservationService>,
                      events_publisher: Box<dyn EventPublisher>) -> Self {
        Self {
            config: config.clone(),
            loan_repository,
            user_service,
            availability_service,
            reservation_service,
            events_publisher,
        }
    }

    async fn publish<T: Serialize>(&self, kind: CirculationEventKind, key: &str,
                                   book_id: &str, user_id: &str, data: &T) {
        match CirculationEvent::new(kind, key, book_id, user_id, data) {
            Ok(event) => {
                if let Err(err) = self.events_publisher.publish(&event).await {
                    warn!("failed to publish {} for {}: {}", kind, key, err);
                }
            }
            Err(err) => {
                warn!("failed to build {} for {}: {}", kind, key, err);
            }
        }
    }

    // One check-then-act borrow attempt. Business-rule checks run against a
    // fresh read every attempt; the Borrowed claim is a versioned write, so
    // a concurrent borrower surfaces as retryable contention here.
    async fn try_borrow(&self, user: &UserDto, book_id: &str) -> LibraryResult<LoanDto> {
        if let Some(existing) = self.loan_repository
            .find_open_by_user_and_book(user.user_id.as_str(), book_id).await? {
            return Err(LibraryError::conflict(
                format!("user {} already borrowed book {} under loan {}",
                        user.user_id, book_id, existing.loan_id).as_str(),
                ConflictReason::AlreadyBorrowed));
        }
        let book = self.availability_service.find_book_by_id(book_id).await?;
        if book.book_status != BookStatus::Available {
            return Err(LibraryError::conflict(
                format!("book {} is not available for borrowing", book.book_id).as_str(),
                ConflictReason::NotAvailable));
        }
        let open_loans = self.loan_repository.count_open_by_user(user.user_id.as_str()).await?;
        if open_loans >= self.config.max_loans_per_user {
            return Err(LibraryError::conflict(
                format!("user {} reached the loan limit of {}",
                        user.user_id, self.config.max_loans_per_user).as_str(),
                ConflictReason::LimitReached));
        }

        // claim the copy first, then write the loan; the claim is what a
        // concurrent borrower conflicts on
        self.availability_service.set_status(book_id, BookStatus::Borrowed).await?;
        let mut loan = LoanEntity::new(book_id, user.user_id.as_str(), self.config.loan_period_days);
        loan.branch_id = self.config.branch_id.to_string();
        if let Err(err) = self.loan_repository.create(&loan).await {
            // release the claim so the command applies fully or not at all
            if let Err(rollback) = self.availability_service
                .set_status(book_id, BookStatus::Available).await {
                warn!("failed to release claim on book {}: {}", book_id, rollback);
            }
            return Err(err);
        }
        self.fulfill_held_reservation(user.user_id.as_str(), book_id).await;
        let dto = LoanDto::from(&loan);
        self.publish(CirculationEventKind::BookBorrowed,
                     dto.loan_id.as_str(), book_id, user.user_id.as_str(), &dto).await;
        Ok(dto)
    }

    // A member borrowing a copy held for them picks up their reservation.
    async fn fulfill_held_reservation(&self, user_id: &str, book_id: &str) {
        let held = match self.reservation_service.get_user_reservations(user_id).await {
            Ok(reservations) => reservations.into_iter()
                .find(|r| r.book_id == book_id
                    && r.reservation_status == ReservationStatus::ReadyForPickup),
            Err(err) => {
                warn!("failed to look up held reservation for {}: {}", user_id, err);
                return;
            }
        };
        if let Some(reservation) = held {
            if let Err(err) = self.reservation_service
                .complete(reservation.reservation_id.as_str()).await {
                warn!("failed to fulfill reservation {}: {}", reservation.reservation_id, err);
            }
        }
    }
}

#[async_trait]
impl LoanService for LoanServiceImpl {
    async fn borrow(&self, user_id: &str, book_id: &str) -> LibraryResult<LoanDto> {
        let user = self.user_service.find_user_by_id(user_id).await?;
        let _ = self.availability_service.find_book_by_id(book_id).await?;

        let mut attempt: u32 = 1;
        loop {
            match self.try_borrow(&user, book_id).await {
                Err(err) if err.retryable() && attempt < self.config.borrow_retry_attempts => {
                    warn!("borrow attempt {} for user {} book {} hit contention: {}",
                          attempt, user_id, book_id, err);
                    let backoff = self.config.borrow_retry_backoff_ms * attempt as u64;
                    tokio::time::sleep(StdDuration::from_millis(backoff)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn return_book(&self, loan_id: &str) -> LibraryResult<LoanDto> {
        let mut loan = self.loan_repository.get(loan_id).await?;
        if !loan.loan_status.is_open() {
            return Err(LibraryError::invalid_state(
                format!("loan {} is {} and cannot be returned",
                        loan_id, loan.loan_status).as_str()));
        }
        loan.returned_on = Some(today());
        loan.loan_status = LoanStatus::Returned;
        loan.reminder_sent_at = None;
        self.loan_repository.update(&loan).await?;

        let book_id = loan.book_id.as_str();
        if self.reservation_service.has_active_demand(book_id).await? {
            // the copy is held for the queue; the hold lives in the
            // reservation layer, the book itself stays Available
            let _ = self.reservation_service.promote_next(book_id).await?;
        }
        self.availability_service.set_status(book_id, BookStatus::Available).await?;

        let dto = LoanDto::from(&loan);
        self.publish(CirculationEventKind::BookReturned,
                     dto.loan_id.as_str(), book_id, dto.user_id.as_str(), &dto).await;
        Ok(dto)
    }

    async fn extend(&self, loan_id: &str) -> LibraryResult<LoanDto> {
        let mut loan = self.loan_repository.get(loan_id).await?;
        if !loan.loan_status.is_open() {
            return Err(LibraryError::invalid_state(
                format!("loan {} is {} and cannot be extended",
                        loan_id, loan.loan_status).as_str()));
        }
        if loan.due_on < today() {
            return Err(LibraryError::conflict(
                format!("loan {} was due {} and is overdue", loan_id, loan.due_on).as_str(),
                ConflictReason::Overdue));
        }
        if self.reservation_service.has_active_demand(loan.book_id.as_str()).await? {
            return Err(LibraryError::conflict(
                format!("book {} has members waiting and loan {} cannot be extended",
                        loan.book_id, loan_id).as_str(),
                ConflictReason::HasDemand));
        }
        loan.due_on += Duration::days(self.config.loan_period_days);
        loan.loan_status = LoanStatus::Extended;
        loan.reminder_sent_at = None;
        self.loan_repository.update(&loan).await?;

        let dto = LoanDto::from(&loan);
        self.publish(CirculationEventKind::LoanExtended,
                     dto.loan_id.as_str(), dto.book_id.as_str(), dto.user_id.as_str(), &dto).await;
        Ok(dto)
    }

    async fn due_soon_reminder_sweep(&self, now: NaiveDateTime) -> LibraryResult<Vec<LoanDto>> {
        let window_start = now.date() + Duration::days(self.config.reminder_lead_days_min);
        let window_end = now.date() + Duration::days(self.config.reminder_lead_days_max);
        let due_soon = self.loan_repository
            .query_reminder_candidates(window_start, window_end).await?;
        let mut reminded = Vec::with_capacity(due_soon.len());
        for mut loan in due_soon {
            loan.reminder_sent_at = Some(now);
            self.loan_repository.update(&loan).await?;
            let dto = LoanDto::from(&loan);
            self.publish(CirculationEventKind::DueSoonReminder,
                         dto.loan_id.as_str(), dto.book_id.as_str(), dto.user_id.as_str(), &dto).await;
            reminded.push(dto);
        }
        Ok(reminded)
    }

    async fn find_loan_by_id(&self, id: &str) -> LibraryResult<LoanDto> {
        self.loan_repository.get(id).await.map(|l| LoanDto::from(&l))
    }

    async fn get_loans_by_user(&self, user_id: &str) -> LibraryResult<Vec<LoanDto>> {
        let res = self.loan_repository.query(
            &std::collections::HashMap::from([("user_id".to_string(), user_id.to_string())]),
            None, 500).await?;
        Ok(res.records.iter().map(LoanDto::from).collect())
    }

    async fn get_active_loans(&self, user_id: &str) -> LibraryResult<Vec<LoanDto>> {
        let records = self.loan_repository.query_open_by_user(user_id).await?;
        Ok(records.iter().map(LoanDto::from).collect())
    }

    async fn get_overdue_loans(&self, as_of: NaiveDate) -> LibraryResult<Vec<LoanDto>> {
        let records = self.loan_repository.query_overdue(as_of).await?;
        Ok(records.iter().map(LoanDto::from).collect())
    }

    async fn get_loans_due_within(&self, days: i64) -> LibraryResult<Vec<LoanDto>> {
        let start = today();
        let records = self.loan_repository
            .query_due_between(start, start + Duration::days(days)).await?;
        Ok(records.iter().map(LoanDto::from).collect())
    }
}

impl From<&LoanEntity> for LoanDto {
    fn from(other: &LoanEntity) -> LoanDto {
        LoanDto {
            loan_id: other.loan_id.to_string(),
            version: other.version,
            branch_id: other.branch_id.to_string(),
            book_id: other.book_id.to_string(),
            user_id: other.user_id.to_string(),
            loan_status: other.loan_status,
            borrowed_on: other.borrowed_on,
            due_on: other.due_on,
            returned_on: other.returned_on,
            reminder_sent_at: other.reminder_sent_at,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&LoanDto> for LoanEntity {
    fn from(other: &LoanDto) -> LoanEntity {
        LoanEntity {
            loan_id: other.loan_id.to_string(),
            version: other.version,
            branch_id: other.branch_id.to_string(),
            book_id: other.book_id.to_string(),
            user_id: other.user_id.to_string(),
            loan_status: other.loan_status,
            borrowed_on: other.borrowed_on,
            due_on: other.due_on,
            returned_on: other.returned_on,
            reminder_sent_at: other.reminder_sent_at,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}
