use std::fmt;
use std::fmt::{Display, Formatter};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::utils::date::serializer;

// CirculationEventKind names the moments the engine decides a member should
// be told about something. Delivery itself is a gateway concern.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum CirculationEventKind {
    BookBorrowed,
    BookReturned,
    LoanExtended,
    DueSoonReminder,
    ReservationQueued,
    PickupReady,
    ReservationExpired,
    ReservationCancelled,
    ReservationFulfilled,
}

impl Display for CirculationEventKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CirculationEventKind::BookBorrowed => write!(f, "BookBorrowed"),
            CirculationEventKind::BookReturned => write!(f, "BookReturned"),
            CirculationEventKind::LoanExtended => write!(f, "LoanExtended"),
            CirculationEventKind::DueSoonReminder => write!(f, "DueSoonReminder"),
            CirculationEventKind::ReservationQueued => write!(f, "ReservationQueued"),
            CirculationEventKind::PickupReady => write!(f, "PickupReady"),
            CirculationEventKind::ReservationExpired => write!(f, "ReservationExpired"),
            CirculationEventKind::ReservationCancelled => write!(f, "ReservationCancelled"),
            CirculationEventKind::ReservationFulfilled => write!(f, "ReservationFulfilled"),
        }
    }
}

// CirculationEvent abstracts a notification decision for a loan or
// reservation change, with the affected entity serialized as payload.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CirculationEvent {
    pub event_id: String,
    pub kind: CirculationEventKind,
    // id of the loan or reservation the event is about
    pub key: String,
    pub book_id: String,
    pub user_id: String,
    pub json_data: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl CirculationEvent {
    pub fn new<T: Serialize>(kind: CirculationEventKind, key: &str, book_id: &str,
                             user_id: &str, data: &T) -> serde_json::Result<Self> {
        let json = serde_json::to_string(&data)?;
        Ok(CirculationEvent {
            event_id: Uuid::new_v4().to_string(),
            kind,
            key: key.to_string(),
            book_id: book_id.to_string(),
            user_id: user_id.to_string(),
            json_data: json,
            created_at: Utc::now().naive_utc(),
        })
    }
}
