use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::users::domain::service::UserServiceImpl;
use crate::users::domain::UserService;
use crate::users::repository::memory_user_repository::MemoryUserRepository;
use crate::users::repository::UserRepository;
use crate::utils::store::build_store_client;

pub(crate) async fn create_user_repository(store: RepositoryStore) -> Box<dyn UserRepository> {
    match store {
        RepositoryStore::Memory => {
            let client = build_store_client(store);
            Box::new(MemoryUserRepository::new(client.table("users")))
        }
    }
}

pub async fn create_user_service(config: &Configuration, store: RepositoryStore) -> Box<dyn UserService> {
    let user_repository = create_user_repository(store).await;
    Box::new(UserServiceImpl::new(config, user_repository))
}
