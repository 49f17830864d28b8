use std::collections::HashMap;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use serde_json::Value;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult, ReservationStatus};
use crate::core::repository::Repository;
use crate::reservations::domain::model::ReservationEntity;
use crate::reservations::repository::ReservationRepository;
use crate::utils::store::{paginate, row_str, MemoryTable};

#[derive(Debug, Clone)]
pub(crate) struct MemoryReservationRepository {
    table: MemoryTable,
}

impl MemoryReservationRepository {
    pub(crate) fn new(table: MemoryTable) -> Self {
        Self { table }
    }

    fn decode(row: &Value) -> LibraryResult<ReservationEntity> {
        serde_json::from_value(row.clone()).map_err(LibraryError::from)
    }

    fn matches(row: &Value, predicate: &HashMap<String, String>) -> bool {
        predicate.iter().all(|(field, expected)| row_str(row, field) == expected.as_str())
    }

    fn scan_decoded(&self) -> LibraryResult<Vec<ReservationEntity>> {
        self.table.scan().iter().map(Self::decode).collect()
    }
}

#[async_trait]
impl Repository<ReservationEntity> for MemoryReservationRepository {
    async fn create(&self, entity: &ReservationEntity) -> LibraryResult<usize> {
        let row = serde_json::to_value(entity)?;
        self.table.put_new(entity.reservation_id.as_str(), row)
    }

    async fn update(&self, entity: &ReservationEntity) -> LibraryResult<usize> {
        let mut next = entity.clone();
        next.updated_at = Utc::now().naive_utc();
        let row = serde_json::to_value(&next)?;
        self.table.put_versioned(entity.reservation_id.as_str(), row)
    }

    async fn get(&self, id: &str) -> LibraryResult<ReservationEntity> {
        match self.table.get(id) {
            Some(row) => Self::decode(&row),
            None => Err(LibraryError::not_found(
                format!("reservation not found for {}", id).as_str())),
        }
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        self.table.remove(id)
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<ReservationEntity>> {
        let mut records = self.table.scan().iter()
            .filter(|row| Self::matches(row, predicate))
            .map(Self::decode)
            .collect::<LibraryResult<Vec<ReservationEntity>>>()?;
        // member-facing history reads newest first
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at)
            .then_with(|| a.reservation_id.cmp(&b.reservation_id)));
        Ok(paginate(page, page_size, records))
    }
}

#[async_trait]
impl ReservationRepository for MemoryReservationRepository {
    async fn save_at_queue_tail(&self, entity: &ReservationEntity) -> LibraryResult<ReservationEntity> {
        self.table.with_rows(|rows| {
            if rows.contains_key(entity.reservation_id.as_str()) {
                return Err(LibraryError::runtime(
                    format!("row already exists for {}", entity.reservation_id).as_str(),
                    Some("409".to_string())));
            }
            let pending = ReservationStatus::Pending.to_string();
            let tail = rows.values()
                .filter(|row| row_str(row, "book_id") == entity.book_id.as_str()
                    && row_str(row, "reservation_status") == pending.as_str())
                .count() as i64;
            let mut appended = entity.clone();
            appended.queue_position = tail + 1;
            let row = serde_json::to_value(&appended)?;
            rows.insert(appended.reservation_id.to_string(), row);
            Ok(appended)
        })
    }

    async fn find_active_by_user_and_book(&self, user_id: &str, book_id: &str)
                                          -> LibraryResult<Option<ReservationEntity>> {
        let found = self.scan_decoded()?.into_iter()
            .find(|r| r.user_id == user_id && r.book_id == book_id
                && r.reservation_status.is_active());
        Ok(found)
    }

    async fn query_pending_by_book(&self, book_id: &str) -> LibraryResult<Vec<ReservationEntity>> {
        let mut records: Vec<ReservationEntity> = self.scan_decoded()?.into_iter()
            .filter(|r| r.book_id == book_id
                && r.reservation_status == ReservationStatus::Pending)
            .collect();
        records.sort_by(|a, b| a.queue_position.cmp(&b.queue_position));
        Ok(records)
    }

    async fn query_ready_by_book(&self, book_id: &str) -> LibraryResult<Vec<ReservationEntity>> {
        Ok(self.scan_decoded()?.into_iter()
            .filter(|r| r.book_id == book_id
                && r.reservation_status == ReservationStatus::ReadyForPickup)
            .collect())
    }

    async fn count_pending_by_book(&self, book_id: &str) -> LibraryResult<i64> {
        Ok(self.query_pending_by_book(book_id).await?.len() as i64)
    }

    async fn query_expired(&self, now: NaiveDateTime) -> LibraryResult<Vec<ReservationEntity>> {
        let mut records: Vec<ReservationEntity> = self.scan_decoded()?.into_iter()
            .filter(|r| r.reservation_status == ReservationStatus::ReadyForPickup
                && r.expires_at.map(|expires| expires < now).unwrap_or(false))
            .collect();
        records.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));
        Ok(records)
    }

    async fn renumber_after_removal(&self, book_id: &str, removed_position: i64) -> LibraryResult<usize> {
        self.table.with_rows(|rows| {
            let mut shifted = 0;
            let keys: Vec<String> = rows.keys().cloned().collect();
            for key in keys {
                let row = match rows.get(key.as_str()) {
                    Some(row) => row,
                    None => continue,
                };
                let mut entity = Self::decode(row)?;
                if entity.book_id != book_id
                    || entity.reservation_status != ReservationStatus::Pending
                    || entity.queue_position <= removed_position {
                    continue;
                }
                entity.queue_position -= 1;
                entity.version += 1;
                entity.updated_at = Utc::now().naive_utc();
                rows.insert(key, serde_json::to_value(&entity)?);
                shifted += 1;
            }
            Ok(shifted)
        })
    }
}
