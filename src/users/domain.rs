use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::users::dto::UserDto;

pub mod model;
pub mod service;

// The engine never reads an ambient authenticated user; callers pass the
// acting member's id and this service resolves it.
#[async_trait]
pub trait UserService: Sync + Send {
    async fn add_user(&self, user: &UserDto) -> LibraryResult<UserDto>;
    async fn find_user_by_id(&self, id: &str) -> LibraryResult<UserDto>;
    async fn find_user_by_email(&self, email: &str) -> LibraryResult<Vec<UserDto>>;
}
