use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::library::ReservationStatus;
use crate::utils::date::serializer;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ReservationDto {
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

impl ReservationDto {
    pub fn new(book_id: &str, user_id: &str) -> Self {
        Self {
            reservation_id: Uuid::new_v4().to_string(),
            version: 0,
            branch_id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            user_id: user_id.to_string(),
            reservation_status: ReservationStatus::Pending,
            queue_position: 0,
            created_at: Utc::now().naive_utc(),
            notified_at: None,
            expires_at: None,
            updated_at: Utc::now().naive_utc(),
        }
    }
}
