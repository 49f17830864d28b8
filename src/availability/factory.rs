use crate::availability::domain::service::AvailabilityServiceImpl;
use crate::availability::domain::AvailabilityService;
use crate::books::factory::create_book_repository;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;

pub async fn create_availability_service(config: &Configuration, store: RepositoryStore) -> Box<dyn AvailabilityService> {
    let book_repository = create_book_repository(store).await;
    Box::new(AvailabilityServiceImpl::new(config, book_repository))
}
