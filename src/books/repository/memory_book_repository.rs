use std::collections::HashMap;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use crate::books::domain::model::BookEntity;
use crate::books::repository::BookRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::store::{paginate, row_str, MemoryTable};

#[derive(Debug, Clone)]
pub(crate) struct MemoryBookRepository {
    table: MemoryTable,
}

impl MemoryBookRepository {
    pub(crate) fn new(table: MemoryTable) -> Self {
        Self { table }
    }

    fn decode(row: &Value) -> LibraryResult<BookEntity> {
        serde_json::from_value(row.clone()).map_err(LibraryError::from)
    }

    fn matches(row: &Value, predicate: &HashMap<String, String>) -> bool {
        predicate.iter().all(|(field, expected)| row_str(row, field) == expected.as_str())
    }
}

#[async_trait]
impl Repository<BookEntity> for MemoryBookRepository {
    async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let row = serde_json::to_value(entity)?;
        self.table.put_new(entity.book_id.as_str(), row)
    }

    async fn update(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let mut next = entity.clone();
        next.updated_at = Utc::now().naive_utc();
        let row = serde_json::to_value(&next)?;
        self.table.put_versioned(entity.book_id.as_str(), row)
    }

    async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
        match self.table.get(id) {
            Some(row) => Self::decode(&row),
            None => Err(LibraryError::not_found(
                format!("book not found for {}", id).as_str())),
        }
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        self.table.remove(id)
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let mut records = self.table.scan().iter()
            .filter(|row| Self::matches(row, predicate))
            .map(Self::decode)
            .collect::<LibraryResult<Vec<BookEntity>>>()?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at)
            .then_with(|| a.book_id.cmp(&b.book_id)));
        Ok(paginate(page, page_size, records))
    }
}

impl BookRepository for MemoryBookRepository {}
