use async_trait::async_trait;
use chrono::NaiveDateTime;
use crate::core::library::LibraryResult;
use crate::reservations::dto::ReservationDto;

pub mod model;
pub mod service;

// ReservationService maintains, per book, the FIFO pickup queue: members
// join at the tail, leave with renumbering, and are promoted one at a time
// as copies come back or pickup windows lapse.
#[async_trait]
pub trait ReservationService: Sync + Send {
    async fn reserve(&self, user_id: &str, book_id: &str) -> LibraryResult<ReservationDto>;

    // True while at least one Pending reservation exists for the book; a
    // returned copy is then held for the queue and loans cannot be extended.
    async fn has_active_demand(&self, book_id: &str) -> LibraryResult<bool>;

    // Offers the copy to the lowest-position Pending reservation. No-op
    // when the queue is empty or while another pickup is still outstanding.
    async fn promote_next(&self, book_id: &str) -> LibraryResult<Option<ReservationDto>>;

    async fn cancel(&self, reservation_id: &str, user_id: &str) -> LibraryResult<ReservationDto>;

    // Expires every lapsed pickup window and cascades the freed slot to the
    // next member in line. Safe to run at any cadence.
    async fn process_expired(&self, now: NaiveDateTime) -> LibraryResult<Vec<ReservationDto>>;

    // Marks a ReadyForPickup reservation Fulfilled once the member borrows
    // the held copy.
    async fn complete(&self, reservation_id: &str) -> LibraryResult<ReservationDto>;

    async fn find_reservation_by_id(&self, id: &str) -> LibraryResult<ReservationDto>;

    // Pending and ReadyForPickup entries for the member, newest first.
    async fn get_user_reservations(&self, user_id: &str) -> LibraryResult<Vec<ReservationDto>>;

    // Full reservation history for the member, newest first.
    async fn get_all_reservations(&self, user_id: &str) -> LibraryResult<Vec<ReservationDto>>;
}
