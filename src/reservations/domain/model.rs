use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::core::library::ReservationStatus;
use crate::utils::date::serializer;

// ReservationEntity abstracts one member's place in a book's pickup queue.
// queue_position is the single source of ordering truth: it is assigned when
// the member joins and is renumbered whenever an earlier Pending entry
// leaves the queue. expires_at is only set once the reservation is promoted
// to ReadyForPickup.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub(crate) struct ReservationEntity {
    pub reservation_id: String,
    pub version: i64,
    pub branch_id: String,
    pub book_id: String,
    pub user_id: String,
    pub reservation_status: ReservationStatus,
    pub queue_position: i64,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    pub notified_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDateTime>,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl ReservationEntity {
    pub fn new(book_id: &str, user_id: &str) -> Self {
        Self {
            reservation_id: Uuid::new_v4().to_string(),
            version: 0,
            branch_id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            user_id: user_id.to_string(),
            reservation_status: ReservationStatus::Pending,
            // assigned when the entry is appended to the queue tail
            queue_position: 0,
            created_at: Utc::now().naive_utc(),
            notified_at: None,
            expires_at: None,
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl Identifiable for ReservationEntity {
    fn id(&self) -> String {
        self.reservation_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use crate::core::library::ReservationStatus;
    use crate::reservations::domain::model::ReservationEntity;

    #[tokio::test]
    async fn test_should_build_reservation() {
        let reservation = ReservationEntity::new("book1", "user1");
        assert_eq!("book1", reservation.book_id.as_str());
        assert_eq!("user1", reservation.user_id.as_str());
        assert_eq!(ReservationStatus::Pending, reservation.reservation_status);
        assert_eq!(None, reservation.expires_at);
        assert_eq!(None, reservation.notified_at);
    }
}
