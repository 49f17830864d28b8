use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use lazy_static::lazy_static;
use serde_json::Value;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::RepositoryStore;

// MemoryTable keeps rows as JSON documents keyed by id. Writes are
// conditional the way the production record store's are: put_new refuses a
// duplicate key and put_versioned refuses a stale version, which is the
// transient contention signal the borrow path retries on.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryTable {
    rows: Arc<RwLock<HashMap<String, Value>>>,
}

pub(crate) fn row_version(row: &Value) -> i64 {
    row.get("version").and_then(Value::as_i64).unwrap_or(0)
}

pub(crate) fn row_str<'a>(row: &'a Value, field: &str) -> &'a str {
    row.get(field).and_then(Value::as_str).unwrap_or("")
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    // Runs f under the table write lock; every read-then-write sequence that
    // must be transactionally consistent goes through here.
    pub fn with_rows<R>(&self, f: impl FnOnce(&mut HashMap<String, Value>) -> R) -> R {
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        f(&mut rows)
    }

    pub fn put_new(&self, key: &str, row: Value) -> LibraryResult<usize> {
        self.with_rows(|rows| {
            if rows.contains_key(key) {
                return Err(LibraryError::runtime(
                    format!("row already exists for {}", key).as_str(), Some("409".to_string())));
            }
            rows.insert(key.to_string(), row);
            Ok(1)
        })
    }

    // Conditional write: the stored row must carry the same version as the
    // incoming one, and the winner is stored with version + 1.
    pub fn put_versioned(&self, key: &str, row: Value) -> LibraryResult<usize> {
        self.with_rows(|rows| {
            let stored = match rows.get(key) {
                Some(stored) => stored,
                None => {
                    return Err(LibraryError::not_found(
                        format!("row not found for {}", key).as_str()));
                }
            };
            let expected = row_version(&row);
            if row_version(stored) != expected {
                return Err(LibraryError::contention(
                    format!("stale version {} for {}", expected, key).as_str(), true));
            }
            let mut next = row;
            if let Value::Object(fields) = &mut next {
                fields.insert("version".to_string(), Value::from(expected + 1));
            }
            rows.insert(key.to_string(), next);
            Ok(1)
        })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        rows.get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> LibraryResult<usize> {
        self.with_rows(|rows| {
            match rows.remove(key) {
                Some(_) => Ok(1),
                None => Err(LibraryError::not_found(
                    format!("row not found for {}", key).as_str())),
            }
        })
    }

    pub fn scan(&self) -> Vec<Value> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        rows.values().cloned().collect()
    }
}

// StoreClient hands out named tables, creating them on demand. Cloning a
// client shares the underlying tables, so every repository built from the
// same client sees the same records.
#[derive(Debug, Clone, Default)]
pub(crate) struct StoreClient {
    tables: Arc<RwLock<HashMap<String, MemoryTable>>>,
}

impl StoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> MemoryTable {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.entry(name.to_string()).or_default().clone()
    }
}

lazy_static! {
    static ref SHARED_STORE: StoreClient = StoreClient::new();
}

pub(crate) fn build_store_client(store: RepositoryStore) -> StoreClient {
    match store {
        RepositoryStore::Memory => SHARED_STORE.clone(),
    }
}

// Offset pagination over an already-filtered, already-ordered result set.
pub(crate) fn paginate<T>(page: Option<&str>, page_size: usize, records: Vec<T>) -> PaginatedResult<T> {
    let offset = page.and_then(|p| p.parse::<usize>().ok()).unwrap_or(0);
    let total = records.len();
    let slice: Vec<T> = records.into_iter().skip(offset).take(page_size).collect();
    let next_page = if offset + page_size < total {
        Some((offset + page_size).to_string())
    } else {
        None
    };
    PaginatedResult::new(page, page_size, next_page, slice)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use crate::core::library::LibraryError;
    use crate::core::repository::RepositoryStore;
    use crate::utils::store::{build_store_client, paginate, row_version, MemoryTable, StoreClient};

    #[tokio::test]
    async fn test_should_reject_duplicate_put_new() {
        let table = MemoryTable::new();
        table.put_new("k1", json!({"version": 0})).expect("should put");
        let dup = table.put_new("k1", json!({"version": 0}));
        assert!(matches!(dup, Err(LibraryError::Runtime { .. })));
    }

    #[tokio::test]
    async fn test_should_bump_version_on_put_versioned() {
        let table = MemoryTable::new();
        table.put_new("k1", json!({"version": 0, "title": "a"})).expect("should put");
        table.put_versioned("k1", json!({"version": 0, "title": "b"})).expect("should update");
        let row = table.get("k1").expect("should get");
        assert_eq!(1, row_version(&row));
        assert_eq!("b", row.get("title").and_then(|v| v.as_str()).unwrap_or(""));
    }

    #[tokio::test]
    async fn test_should_reject_stale_version() {
        let table = MemoryTable::new();
        table.put_new("k1", json!({"version": 0})).expect("should put");
        table.put_versioned("k1", json!({"version": 0})).expect("should update");
        let stale = table.put_versioned("k1", json!({"version": 0}));
        match stale {
            Err(err) => assert!(err.retryable()),
            Ok(_) => panic!("stale write should be rejected"),
        }
    }

    #[tokio::test]
    async fn test_should_report_missing_row() {
        let table = MemoryTable::new();
        assert!(matches!(table.put_versioned("nope", json!({"version": 0})),
                         Err(LibraryError::NotFound { .. })));
        assert!(matches!(table.remove("nope"), Err(LibraryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_should_share_tables_between_clones() {
        let client = StoreClient::new();
        client.table("t").put_new("k1", json!({"version": 0})).expect("should put");
        let other = client.clone();
        assert!(other.table("t").get("k1").is_some());
    }

    #[tokio::test]
    async fn test_should_build_shared_client() {
        let a = build_store_client(RepositoryStore::Memory);
        let b = build_store_client(RepositoryStore::Memory);
        a.table("shared_probe").put_new("k1", json!({"version": 0})).expect("should put");
        assert!(b.table("shared_probe").get("k1").is_some());
    }

    #[tokio::test]
    async fn test_should_paginate_records() {
        let res = paginate(None, 2, vec![1, 2, 3, 4, 5]);
        assert_eq!(vec![1, 2], res.records);
        assert_eq!(Some("2".to_string()), res.next_page);
        let res = paginate(Some("4"), 2, vec![1, 2, 3, 4, 5]);
        assert_eq!(vec![5], res.records);
        assert_eq!(None, res.next_page);
    }
}
