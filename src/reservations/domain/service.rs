use std::collections::HashMap;
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::warn;
use crate::availability::domain::AvailabilityService;
use crate::core::domain::Configuration;
use crate::core::events::{CirculationEvent, CirculationEventKind};
use crate::core::library::{ConflictReason, LibraryError, LibraryResult, ReservationStatus};
use crate::gateway::events::EventPublisher;
use crate::reservations::domain::model::ReservationEntity;
use crate::reservations::domain::ReservationService;
use crate::reservations::dto::ReservationDto;
use crate::reservations::repository::ReservationRepository;
use crate::users::domain::UserService;

pub(crate) struct ReservationServiceImpl {
    branch_id: String,
    pickup_window_hours: i64,
    reservation_repository: Box<dyn ReservationRepository>,
    user_service: Box<dyn UserService>,
    availability_service: Box<dyn AvailabilityService>,
    events_publisher: Box<dyn EventPublisher>,
}

impl ReservationServiceImpl {
    pub(crate) fn new(config: &Configuration, reservation_repository: Box<dyn ReservationRepository>,
                      user_service: Box<dyn UserService>, availability_service: Box<dyn AvailabilityService>,
                      events_publisher: Box<dyn EventPublisher>) -> Self {
        Self {
            branch_id: config.branch_id.to_string(),
            pickup_window_hours: config.pickup_window_hours,
            reservation_repository,
            user_service,
            availability_service,
            events_publisher,
        }
    }

    // Notification decisions are advisory; a failed publish never rolls
    // back the queue change it describes.
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
}

#[async_trait]
impl ReservationService for ReservationServiceImpl {
    async fn reserve(&self, user_id: &str, book_id: &str) -> LibraryResult<ReservationDto> {
        let user = self.user_service.find_user_by_id(user_id).await?;
        let book = self.availability_service.find_book_by_id(book_id).await?;
        if let Some(existing) = self.reservation_repository
            .find_active_by_user_and_book(user_id, book_id).await? {
            return Err(LibraryError::conflict(
                format!("user {} already holds reservation {} for book {}",
                        user.user_id, existing.reservation_id, book.book_id).as_str(),
                ConflictReason::AlreadyReserved));
        }
        let mut reservation = ReservationEntity::new(book_id, user_id);
        reservation.branch_id = self.branch_id.to_string();
        let saved = self.reservation_repository.save_at_queue_tail(&reservation).await?;
        let dto = ReservationDto::from(&saved);
        self.publish(CirculationEventKind::ReservationQueued,
                     dto.reservation_id.as_str(), book_id, user_id, &dto).await;
        Ok(dto)
    }

    async fn has_active_demand(&self, book_id: &str) -> LibraryResult<bool> {
        let pending = self.reservation_repository.count_pending_by_book(book_id).await?;
        Ok(pending > 0)
    }

    async fn promote_next(&self, book_id: &str) -> LibraryResult<Option<ReservationDto>> {
        let outstanding = self.reservation_repository.query_ready_by_book(book_id).await?;
        if !outstanding.is_empty() {
            // at most one outstanding pickup per book; the queue moves again
            // once that reservation is fulfilled or expires
            return Ok(None);
        }
        let pending = self.reservation_repository.query_pending_by_book(book_id).await?;
        let mut promoted = match pending.into_iter().next() {
            Some(first) => first,
            None => return Ok(None),
        };
        let freed_position = promoted.queue_position;
        let now = Utc::now().naive_utc();
        promoted.reservation_status = ReservationStatus::ReadyForPickup;
        promoted.notified_at = Some(now);
        promoted.expires_at = Some(now + Duration::hours(self.pickup_window_hours));
        self.reservation_repository.update(&promoted).await?;
        self.reservation_repository.renumber_after_removal(book_id, freed_position).await?;
        let dto = ReservationDto::from(&promoted);
        self.publish(CirculationEventKind::PickupReady,
                     dto.reservation_id.as_str(), book_id, dto.user_id.as_str(), &dto).await;
        Ok(Some(dto))
    }

    async fn cancel(&self, reservation_id: &str, user_id: &str) -> LibraryResult<ReservationDto> {
        let mut reservation = self.reservation_repository.get(reservation_id).await?;
        if reservation.user_id != user_id {
            return Err(LibraryError::forbidden(
                format!("user {} cannot cancel reservation {} held by {}",
                        user_id, reservation_id, reservation.user_id).as_str()));
        }
        if !reservation.reservation_status.is_active() {
            return Err(LibraryError::invalid_state(
                format!("reservation {} is already {}",
                        reservation_id, reservation.reservation_status).as_str()));
        }
        let was_pending = reservation.reservation_status == ReservationStatus::Pending;
        let removed_position = reservation.queue_position;
        reservation.reservation_status = ReservationStatus::Cancelled;
        self.reservation_repository.update(&reservation).await?;
        if was_pending {
            self.reservation_repository
                .renumber_after_removal(reservation.book_id.as_str(), removed_position).await?;
        }
        let dto = ReservationDto::from(&reservation);
        self.publish(CirculationEventKind::ReservationCancelled,
                     dto.reservation_id.as_str(), dto.book_id.as_str(), user_id, &dto).await;
        Ok(dto)
    }

    async fn process_expired(&self, now: NaiveDateTime) -> LibraryResult<Vec<ReservationDto>> {
        let lapsed = self.reservation_repository.query_expired(now).await?;
        let mut processed = Vec::with_capacity(lapsed.len());
        for mut reservation in lapsed {
            reservation.reservation_status = ReservationStatus::Expired;
            self.reservation_repository.update(&reservation).await?;
            let dto = ReservationDto::from(&reservation);
            self.publish(CirculationEventKind::ReservationExpired,
                         dto.reservation_id.as_str(), dto.book_id.as_str(),
                         dto.user_id.as_str(), &dto).await;
            // the freed slot goes straight to the next member in line
            let _ = self.promote_next(reservation.book_id.as_str()).await?;
            processed.push(dto);
        }
        Ok(processed)
    }

    async fn complete(&self, reservation_id: &str) -> LibraryResult<ReservationDto> {
        let mut reservation = self.reservation_repository.get(reservation_id).await?;
        if reservation.reservation_status != ReservationStatus::ReadyForPickup {
            return Err(LibraryError::invalid_state(
                format!("reservation {} is {} and cannot be fulfilled",
                        reservation_id, reservation.reservation_status).as_str()));
        }
        reservation.reservation_status = ReservationStatus::Fulfilled;
        self.reservation_repository.update(&reservation).await?;
        let dto = ReservationDto::from(&reservation);
        self.publish(CirculationEventKind::ReservationFulfilled,
                     dto.reservation_id.as_str(), dto.book_id.as_str(),
                     dto.user_id.as_str(), &dto).await;
        Ok(dto)
    }

    async fn find_reservation_by_id(&self, id: &str) -> LibraryResult<ReservationDto> {
        self.reservation_repository.get(id).await.map(|r| ReservationDto::from(&r))
    }

    async fn get_user_reservations(&self, user_id: &str) -> LibraryResult<Vec<ReservationDto>> {
        let res = self.reservation_repository.query(
            &HashMap::from([("user_id".to_string(), user_id.to_string())]), None, 500).await?;
        Ok(res.records.iter()
            .filter(|r| r.reservation_status.is_active())
            .map(ReservationDto::from)
            .collect())
    }

    async fn get_all_reservations(&self, user_id: &str) -> LibraryResult<Vec<ReservationDto>> {
        let res = self.reservation_repository.query(
            &HashMap::from([("user_id".to_string(), user_id.to_string())]), None, 500).await?;
        Ok(res.records.iter().map(ReservationDto::from).collect())
    }
}

impl From<&ReservationEntity> for ReservationDto {
    fn from(other: &ReservationEntity) -> ReservationDto {
        ReservationDto {
            reservation_id: other.reservation_id.to_string(),
            version: other.version,
            branch_id: other.branch_id.to_string(),
            book_id: other.book_id.to_string(),
            user_id: other.user_id.to_string(),
            reservation_status: other.reservation_status,
            queue_position: other.queue_position,
            created_at: other.created_at,
            notified_at: other.notified_at,
            expires_at: other.expires_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&ReservationDto> for ReservationEntity {
    fn from(other: &ReservationDto) -> ReservationEntity {
        ReservationEntity {
            reservation_id: other.reservation_id.to_string(),
            version: other.version,
            branch_id: other.branch_id.to_string(),
            book_id: other.book_id.to_string(),
            user_id: other.user_id.to_string(),
            reservation_status: other.reservation_status,
            queue_position: other.queue_position,
            created_at: other.created_at,
            notified_at: other.notified_at,
            expires_at: other.expires_at,
            updated_at: other.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use chrono::{Duration, Utc};
    use lazy_static::lazy_static;
    use crate::availability::domain::AvailabilityService;
    use crate::availability::factory::create_availability_service;
    use crate::books::dto::BookDto;
    use crate::core::domain::Configuration;
    use crate::core::library::{BookStatus, ConflictReason, LibraryError, ReservationStatus, Role};
    use crate::core::repository::{Repository, RepositoryStore};
    use crate::reservations::domain::ReservationService;
    use crate::reservations::factory;
    use crate::reservations::factory::create_reservation_repository;
    use crate::reservations::repository::ReservationRepository;
    use crate::users::domain::UserService;
    use crate::users::dto::UserDto;
    use crate::users::factory::create_user_service;

    lazy_static! {
        static ref SUT_SVC: AsyncOnce<Box<dyn ReservationService>> = AsyncOnce::new(async {
                factory::create_reservation_service(&Configuration::new("test"), RepositoryStore::Memory).await
            });
        static ref USER_SVC: AsyncOnce<Box<dyn UserService>> = AsyncOnce::new(async {
                create_user_service(&Configuration::new("test"), RepositoryStore::Memory).await
            });
        static ref BOOK_SVC: AsyncOnce<Box<dyn AvailabilityService>> = AsyncOnce::new(async {
                create_availability_service(&Configuration::new("test"), RepositoryStore::Memory).await
            });
        static ref RES_REPO: AsyncOnce<Box<dyn ReservationRepository>> = AsyncOnce::new(async {
                create_reservation_repository(RepositoryStore::Memory).await
            });
    }

    async fn add_user(name: &str) -> UserDto {
        USER_SVC.get().await
            .add_user(&UserDto::new(Role::Regular, name, format!("{}@example.com", name).as_str())).await
            .expect("should add user")
    }

    async fn add_book(isbn: &str) -> BookDto {
        BOOK_SVC.get().await
            .add_book(&BookDto::new(isbn, "test book", BookStatus::Available)).await
            .expect("should add book")
    }

    #[tokio::test]
    async fn test_should_reserve_at_queue_tail() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-1").await;
        let user = add_user("res-user-1").await;

        let reservation = svc.reserve(user.user_id.as_str(), book.book_id.as_str()).await
            .expect("should reserve");
        assert_eq!(ReservationStatus::Pending, reservation.reservation_status);
        assert_eq!(1, reservation.queue_position);
        assert_eq!(None, reservation.expires_at);
    }

    #[tokio::test]
    async fn test_should_reject_second_reservation_for_same_user() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-2").await;
        let user = add_user("res-user-2").await;

        svc.reserve(user.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve");
        let again = svc.reserve(user.user_id.as_str(), book.book_id.as_str()).await;
        match again {
            Err(err) => assert_eq!(Some(ConflictReason::AlreadyReserved), err.conflict_reason()),
            Ok(_) => panic!("second reservation should be rejected"),
        }
    }

    #[tokio::test]
    async fn test_should_reject_reservation_for_missing_user_or_book() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-3").await;
        let user = add_user("res-user-3").await;

        assert!(matches!(svc.reserve("missing-user", book.book_id.as_str()).await,
                         Err(LibraryError::NotFound { .. })));
        assert!(matches!(svc.reserve(user.user_id.as_str(), "missing-book").await,
                         Err(LibraryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_should_assign_positions_in_join_order() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-4").await;
        let first = add_user("res-user-4a").await;
        let second = add_user("res-user-4b").await;
        let third = add_user("res-user-4c").await;

        let positions = vec![
            svc.reserve(first.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve"),
            svc.reserve(second.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve"),
            svc.reserve(third.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve"),
        ];
        assert_eq!(vec![1, 2, 3], positions.iter().map(|r| r.queue_position).collect::<Vec<i64>>());
        assert!(svc.has_active_demand(book.book_id.as_str()).await.expect("should check demand"));
    }

    #[tokio::test]
    async fn test_should_report_no_demand_for_empty_queue() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-5").await;
        assert!(!svc.has_active_demand(book.book_id.as_str()).await.expect("should check demand"));
    }

    #[tokio::test]
    async fn test_should_promote_lowest_position() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-6").await;
        let first = add_user("res-user-6a").await;
        let second = add_user("res-user-6b").await;
        svc.reserve(first.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve");
        svc.reserve(second.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve");

        let promoted = svc.promote_next(book.book_id.as_str()).await.expect("should promote")
            .expect("should pick first in queue");
        assert_eq!(first.user_id, promoted.user_id);
        assert_eq!(ReservationStatus::ReadyForPickup, promoted.reservation_status);
        let notified_at = promoted.notified_at.expect("should record notified at");
        let expires_at = promoted.expires_at.expect("should record expires at");
        assert_eq!(notified_at + Duration::hours(24), expires_at);

        // remaining queue closes the gap and demand still exists
        let remaining = svc.get_user_reservations(second.user_id.as_str()).await.expect("should query");
        assert_eq!(1, remaining.len());
        assert_eq!(1, remaining[0].queue_position);
        assert!(svc.has_active_demand(book.book_id.as_str()).await.expect("should check demand"));
    }

    #[tokio::test]
    async fn test_should_not_promote_empty_queue() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-7").await;
        let promoted = svc.promote_next(book.book_id.as_str()).await.expect("should promote");
        assert!(promoted.is_none());
    }

    #[tokio::test]
    async fn test_should_not_promote_while_pickup_outstanding() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-8").await;
        let first = add_user("res-user-8a").await;
        let second = add_user("res-user-8b").await;
        svc.reserve(first.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve");
        svc.reserve(second.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve");

        let promoted = svc.promote_next(book.book_id.as_str()).await.expect("should promote");
        assert!(promoted.is_some());
        // a re-entrant promotion while the first pickup is outstanding is a no-op
        let again = svc.promote_next(book.book_id.as_str()).await.expect("should promote");
        assert!(again.is_none());
        let waiting = svc.get_user_reservations(second.user_id.as_str()).await.expect("should query");
        assert_eq!(ReservationStatus::Pending, waiting[0].reservation_status);
    }

    #[tokio::test]
    async fn test_should_keep_positions_contiguous_after_promotion() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-9").await;
        let first = add_user("res-user-9a").await;
        let second = add_user("res-user-9b").await;
        svc.reserve(first.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve");
        svc.reserve(second.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve");
        svc.promote_next(book.book_id.as_str()).await.expect("should promote");

        // a member joining after the promotion lands behind the renumbered tail
        let third = add_user("res-user-9c").await;
        let joined = svc.reserve(third.user_id.as_str(), book.book_id.as_str()).await
            .expect("should reserve");
        assert_eq!(2, joined.queue_position);
    }

    #[tokio::test]
    async fn test_should_cancel_and_renumber_queue() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-10").await;
        let users = vec![
            add_user("res-user-10a").await,
            add_user("res-user-10b").await,
            add_user("res-user-10c").await,
            add_user("res-user-10d").await,
        ];
        let mut reservations = vec![];
        for user in &users {
            reservations.push(svc.reserve(user.user_id.as_str(), book.book_id.as_str()).await
                .expect("should reserve"));
        }

        let cancelled = svc.cancel(reservations[1].reservation_id.as_str(),
                                   users[1].user_id.as_str()).await.expect("should cancel");
        assert_eq!(ReservationStatus::Cancelled, cancelled.reservation_status);

        // {1,2,3,4} minus position 2 becomes {1,2,3}: positions above the
        // cancelled one shift down by exactly one
        let survivors = vec![&users[0], &users[2], &users[3]];
        let mut positions = vec![];
        for user in survivors {
            let active = svc.get_user_reservations(user.user_id.as_str()).await.expect("should query");
            positions.push(active[0].queue_position);
        }
        assert_eq!(vec![1, 2, 3], positions);
    }

    #[tokio::test]
    async fn test_should_reject_cancel_by_non_owner() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-11").await;
        let owner = add_user("res-user-11a").await;
        let other = add_user("res-user-11b").await;
        let reservation = svc.reserve(owner.user_id.as_str(), book.book_id.as_str()).await
            .expect("should reserve");

        let res = svc.cancel(reservation.reservation_id.as_str(), other.user_id.as_str()).await;
        assert!(matches!(res, Err(LibraryError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_should_reject_cancel_of_missing_reservation() {
        let svc = SUT_SVC.get().await;
        let user = add_user("res-user-12").await;
        let res = svc.cancel("missing-reservation", user.user_id.as_str()).await;
        assert!(matches!(res, Err(LibraryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_should_reject_cancel_of_terminal_reservation() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-13").await;
        let user = add_user("res-user-13").await;
        let reservation = svc.reserve(user.user_id.as_str(), book.book_id.as_str()).await
            .expect("should reserve");
        svc.cancel(reservation.reservation_id.as_str(), user.user_id.as_str()).await
            .expect("should cancel");

        let again = svc.cancel(reservation.reservation_id.as_str(), user.user_id.as_str()).await;
        assert!(matches!(again, Err(LibraryError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_should_expire_and_cascade_promotion() {
        let svc = SUT_SVC.get().await;
        let reservation_repo = RES_REPO.get().await;
        let book = add_book("res-isbn-14").await;
        let first = add_user("res-user-14a").await;
        let second = add_user("res-user-14b").await;
        svc.reserve(first.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve");
        svc.reserve(second.user_id.as_str(), book.book_id.as_str()).await.expect("should reserve");
        let promoted = svc.promote_next(book.book_id.as_str()).await.expect("should promote")
            .expect("should pick first in queue");

        // push the pickup window into the past
        let mut lapsed = reservation_repo.get(promoted.reservation_id.as_str()).await
            .expect("should load reservation");
        lapsed.expires_at = Some(Utc::now().naive_utc() - chrono::Duration::hours(1));
        reservation_repo.update(&lapsed).await.expect("should update reservation");

        let processed = svc.process_expired(Utc::now().naive_utc()).await.expect("should sweep");
        assert_eq!(1, processed.len());
        assert_eq!(ReservationStatus::Expired, processed[0].reservation_status);

        let expired = svc.find_reservation_by_id(promoted.reservation_id.as_str()).await
            .expect("should load reservation");
        assert_eq!(ReservationStatus::Expired, expired.reservation_status);
        let next = svc.get_user_reservations(second.user_id.as_str()).await.expect("should query");
        assert_eq!(ReservationStatus::ReadyForPickup, next[0].reservation_status);

        // a second sweep with nothing newly lapsed changes nothing
        let idle = svc.process_expired(Utc::now().naive_utc()).await.expect("should sweep");
        assert!(idle.is_empty());
        let still_ready = svc.get_user_reservations(second.user_id.as_str()).await.expect("should query");
        assert_eq!(ReservationStatus::ReadyForPickup, still_ready[0].reservation_status);
    }

    #[tokio::test]
    async fn test_should_complete_ready_reservation() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-15").await;
        let user = add_user("res-user-15").await;
        let reservation = svc.reserve(user.user_id.as_str(), book.book_id.as_str()).await
            .expect("should reserve");
        svc.promote_next(book.book_id.as_str()).await.expect("should promote");

        let fulfilled = svc.complete(reservation.reservation_id.as_str()).await
            .expect("should complete");
        assert_eq!(ReservationStatus::Fulfilled, fulfilled.reservation_status);
    }

    #[tokio::test]
    async fn test_should_reject_complete_of_pending_reservation() {
        let svc = SUT_SVC.get().await;
        let book = add_book("res-isbn-16").await;
        let user = add_user("res-user-16").await;
        let reservation = svc.reserve(user.user_id.as_str(), book.book_id.as_str()).await
            .expect("should reserve");

        let res = svc.complete(reservation.reservation_id.as_str()).await;
        assert!(matches!(res, Err(LibraryError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_should_list_user_reservations() {
        let svc = SUT_SVC.get().await;
        let first_book = add_book("res-isbn-17a").await;
        let second_book = add_book("res-isbn-17b").await;
        let user = add_user("res-user-17").await;
        let kept = svc.reserve(user.user_id.as_str(), first_book.book_id.as_str()).await
            .expect("should reserve");
        let dropped = svc.reserve(user.user_id.as_str(), second_book.book_id.as_str()).await
            .expect("should reserve");
        svc.cancel(dropped.reservation_id.as_str(), user.user_id.as_str()).await
            .expect("should cancel");

        let active = svc.get_user_reservations(user.user_id.as_str()).await.expect("should query");
        assert_eq!(1, active.len());
        assert_eq!(kept.reservation_id, active[0].reservation_id);

        let history = svc.get_all_reservations(user.user_id.as_str()).await.expect("should query");
        assert_eq!(2, history.len());
    }
}
