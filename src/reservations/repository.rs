pub mod memory_reservation_repository;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;
use crate::reservations::domain::model::ReservationEntity;

#[async_trait]
pub(crate) trait ReservationRepository: Repository<ReservationEntity> {
    // Appends the entry at position = Pending count + 1 for its book.
    // Counting and inserting happen inside one store transaction so that
    // concurrent joins cannot observe the same tail.
    async fn save_at_queue_tail(&self, entity: &ReservationEntity) -> LibraryResult<ReservationEntity>;

    // The member's Pending or ReadyForPickup entry for the book, if any.
    async fn find_active_by_user_and_book(&self, user_id: &str, book_id: &str)
                                          -> LibraryResult<Option<ReservationEntity>>;

    // Pending entries for the book ordered by ascending queue position.
    async fn query_pending_by_book(&self, book_id: &str) -> LibraryResult<Vec<ReservationEntity>>;

    async fn query_ready_by_book(&self, book_id: &str) -> LibraryResult<Vec<ReservationEntity>>;

    async fn count_pending_by_book(&self, book_id: &str) -> LibraryResult<i64>;

    // ReadyForPickup entries whose pickup window closed before `now`.
    async fn query_expired(&self, now: NaiveDateTime) -> LibraryResult<Vec<ReservationEntity>>;

    // Restores 1..N contiguity after the Pending entry at removed_position
    // left the queue: every Pending entry for the book with a greater
    // position moves down exactly one slot. Target positions are computed
    // directly in one store transaction, never by pairwise swaps.
    async fn renumber_after_removal(&self, book_id: &str, removed_position: i64) -> LibraryResult<usize>;
}
