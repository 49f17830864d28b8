use std::collections::HashMap;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::users::domain::model::UserEntity;
use crate::users::repository::UserRepository;
use crate::utils::store::{paginate, row_str, MemoryTable};

#[derive(Debug, Clone)]
pub(crate) struct MemoryUserRepository {
    table: MemoryTable,
}

impl MemoryUserRepository {
    pub(crate) fn new(table: MemoryTable) -> Self {
        Self { table }
    }

    fn decode(row: &Value) -> LibraryResult<UserEntity> {
        serde_json::from_value(row.clone()).map_err(LibraryError::from)
    }

    fn matches(row: &Value, predicate: &HashMap<String, String>) -> bool {
        predicate.iter().all(|(field, expected)| row_str(row, field) == expected.as_str())
    }
}

#[async_trait]
impl Repository<UserEntity> for MemoryUserRepository {
    async fn create(&self, entity: &UserEntity) -> LibraryResult<usize> {
        let row = serde_json::to_value(entity)?;
        self.table.put_new(entity.user_id.as_str(), row)
    }

    async fn update(&self, entity: &UserEntity) -> LibraryResult<usize> {
        let mut next = entity.clone();
        next.updated_at = Utc::now().naive_utc();
        let row = serde_json::to_value(&next)?;
        self.table.put_versioned(entity.user_id.as_str(), row)
    }

    async fn get(&self, id: &str) -> LibraryResult<UserEntity> {
        match self.table.get(id) {
            Some(row) => Self::decode(&row),
            None => Err(LibraryError::not_found(
                format!("user not found for {}", id).as_str())),
        }
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        self.table.remove(id)
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<UserEntity>> {
        let mut records = self.table.scan().iter()
            .filter(|row| Self::matches(row, predicate))
            .map(Self::decode)
            .collect::<LibraryResult<Vec<UserEntity>>>()?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at)
            .then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(paginate(page, page_size, records))
    }
}

impl UserRepository for MemoryUserRepository {}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use crate::core::library::{LibraryError, Role};
    use crate::core::repository::Repository;
    use crate::users::domain::model::UserEntity;
    use crate::users::repository::memory_user_repository::MemoryUserRepository;
    use crate::utils::store::StoreClient;

    fn repo() -> MemoryUserRepository {
        MemoryUserRepository::new(StoreClient::new().table("users"))
    }

    #[tokio::test]
    async fn test_should_create_get_user() {
        let user_repo = repo();
        let user = UserEntity::new(Role::Regular, "Jane Doe", "jane@example.com");
        let size = user_repo.create(&user).await.expect("should create user");
        assert_eq!(1, size);

        let loaded = user_repo.get(user.user_id.as_str()).await.expect("should return user");
        assert_eq!(user.user_id, loaded.user_id);
    }

    #[tokio::test]
    async fn test_should_query_by_email() {
        let user_repo = repo();
        let user = UserEntity::new(Role::Regular, "Jane Doe", "jane@example.com");
        user_repo.create(&user).await.expect("should create user");
        user_repo.create(&UserEntity::new(Role::Regular, "Sam Lee", "sam@example.com")).await
            .expect("should create user");

        let predicate = HashMap::from([("email".to_string(), "jane@example.com".to_string())]);
        let res = user_repo.query(&predicate, None, 10).await.expect("should query");
        assert_eq!(1, res.records.len());
        assert_eq!(user.user_id, res.records[0].user_id);
    }

    #[tokio::test]
    async fn test_should_create_delete_user() {
        let user_repo = repo();
        let user = UserEntity::new(Role::Regular, "Jane Doe", "jane@example.com");
        user_repo.create(&user).await.expect("should create user");

        let deleted = user_repo.delete(user.user_id.as_str()).await.expect("should delete user");
        assert_eq!(1, deleted);
        assert!(matches!(user_repo.get(user.user_id.as_str()).await,
                         Err(LibraryError::NotFound { .. })));
    }
}
