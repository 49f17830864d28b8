use std::collections::HashMap;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::loans::domain::model::LoanEntity;
use crate::loans::repository::LoanRepository;
use crate::utils::store::{paginate, row_str, MemoryTable};

#[derive(Debug, Clone)]
pub(crate) struct MemoryLoanRepository {
    table: MemoryTable,
}

impl MemoryLoanRepository {
    pub(crate) fn new(table: MemoryTable) -> Self {
        Self { table }
    }

    fn decode(row: &Value) -> LibraryResult<LoanEntity> {
        serde_json::from_value(row.clone()).map_err(LibraryError::from)
    }

    fn matches(row: &Value, predicate: &HashMap<String, String>) -> bool {
        predicate.iter().all(|(field, expected)| row_str(row, field) == expected.as_str())
    }

    fn scan_decoded(&self) -> LibraryResult<Vec<LoanEntity>> {
        self.table.scan().iter().map(Self::decode).collect()
    }

    fn scan_open(&self) -> LibraryResult<Vec<LoanEntity>> {
        Ok(self.scan_decoded()?.into_iter()
            .filter(|l| l.loan_status.is_open())
            .collect())
    }
}

#[async_trait]
impl Repository<LoanEntity> for MemoryLoanRepository {
    async fn create(&self, entity: &LoanEntity) -> LibraryResult<usize> {
        let row = serde_json::to_value(entity)?;
        self.table.put_new(entity.loan_id.as_str(), row)
    }

    async fn update(&self, entity: &LoanEntity) -> LibraryResult<usize> {
        let mut next = entity.clone();
        next.updated_at = Utc::now().naive_utc();
        let row = serde_json::to_value(&next)?;
        self.table.put_versioned(entity.loan_id.as_str(), row)
    }

    async fn get(&self, id: &str) -> LibraryResult<LoanEntity> {
        match self.table.get(id) {
            Some(row) => Self::decode(&row),
            None => Err(LibraryError::not_found(
                format!("loan not found for {}", id).as_str())),
        }
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        self.table.remove(id)
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
        let mut records = self.table.scan().iter()
            .filter(|row| Self::matches(row, predicate))
            .map(Self::decode)
            .collect::<LibraryResult<Vec<LoanEntity>>>()?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at)
            .then_with(|| a.loan_id.cmp(&b.loan_id)));
        Ok(paginate(page, page_size, records))
    }
}

#[async_trait]
impl LoanRepository for MemoryLoanRepository {
    async fn find_open_by_user_and_book(&self, user_id: &str, book_id: &str)
                                        -> LibraryResult<Option<LoanEntity>> {
        let found = self.scan_open()?.into_iter()
            .find(|l| l.user_id == user_id && l.book_id == book_id);
        Ok(found)
    }

    async fn count_open_by_user(&self, user_id: &str) -> LibraryResult<i64> {
        Ok(self.query_open_by_user(user_id).await?.len() as i64)
    }

    async fn query_open_by_user(&self, user_id: &str) -> LibraryResult<Vec<LoanEntity>> {
        let mut records: Vec<LoanEntity> = self.scan_open()?.into_iter()
            .filter(|l| l.user_id == user_id)
            .collect();
        records.sort_by(|a, b| a.due_on.cmp(&b.due_on)
            .then_with(|| a.loan_id.cmp(&b.loan_id)));
        Ok(records)
    }

    async fn query_overdue(&self, as_of: NaiveDate) -> LibraryResult<Vec<LoanEntity>> {
        let mut records: Vec<LoanEntity> = self.scan_open()?.into_iter()
            .filter(|l| l.due_on < as_of)
            .collect();
        records.sort_by(|a, b| a.due_on.cmp(&b.due_on)
            .then_with(|| a.loan_id.cmp(&b.loan_id)));
        Ok(records)
    }

    async fn query_due_between(&self, start: NaiveDate, end: NaiveDate) -> LibraryResult<Vec<LoanEntity>> {
        let mut records: Vec<LoanEntity> = self.scan_open()?.into_iter()
            .filter(|l| l.due_on >= start && l.due_on <= end)
            .collect();
        records.sort_by(|a, b| a.due_on.cmp(&b.due_on)
            .then_with(|| a.loan_id.cmp(&b.loan_id)));
        Ok(records)
    }

    async fn query_reminder_candidates(&self, start: NaiveDate, end: NaiveDate) -> LibraryResult<Vec<LoanEntity>> {
        Ok(self.query_due_between(start, end).await?.into_iter()
            .filter(|l| l.reminder_sent_at.is_none())
            .collect())
    }
}
