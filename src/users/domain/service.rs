use std::collections::HashMap;
use async_trait::async_trait;
use crate::core::domain::Configuration;
use crate::core::library::LibraryResult;
use crate::users::domain::model::UserEntity;
use crate::users::domain::UserService;
use crate::users::dto::UserDto;
use crate::users::repository::UserRepository;

pub(crate) struct UserServiceImpl {
    user_repository: Box<dyn UserRepository>,
}

impl UserServiceImpl {
    pub(crate) fn new(_config: &Configuration, user_repository: Box<dyn UserRepository>) -> Self {
        Self {
            user_repository,
        }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn add_user(&self, user: &UserDto) -> LibraryResult<UserDto> {
        let _ = self.user_repository.create(&UserEntity::from(user)).await?;
        Ok(user.clone())
    }

    async fn find_user_by_id(&self, id: &str) -> LibraryResult<UserDto> {
        self.user_repository.get(id).await.map(|u| UserDto::from(&u))
    }

    async fn find_user_by_email(&self, email: &str) -> LibraryResult<Vec<UserDto>> {
        let res = self.user_repository.query(
            &HashMap::from([("email".to_string(), email.to_string())]), None, 100).await?;
        Ok(res.records.iter().map(UserDto::from).collect())
    }
}

impl From<&UserEntity> for UserDto {
    fn from(other: &UserEntity) -> Self {
        Self {
            user_id: other.user_id.to_string(),
            version: other.version,
            role: other.role.clone(),
            full_name: other.full_name.to_string(),
            email: other.email.to_string(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&UserDto> for UserEntity {
    fn from(other: &UserDto) -> Self {
        Self {
            user_id: other.user_id.to_string(),
            version: other.version,
            role: other.role.clone(),
            full_name: other.full_name.to_string(),
            email: other.email.to_string(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}
