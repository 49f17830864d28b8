use crate::availability::factory::create_availability_service;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::gateway::factory::create_publisher;
use crate::reservations::domain::service::ReservationServiceImpl;
use crate::reservations::domain::ReservationService;
use crate::reservations::repository::memory_reservation_repository::MemoryReservationRepository;
use crate::reservations::repository::ReservationRepository;
use crate::users::factory::create_user_service;
use crate::utils::store::build_store_client;

pub(crate) async fn create_reservation_repository(store: RepositoryStore) -> Box<dyn ReservationRepository> {
    match store {
        RepositoryStore::Memory => {
            let client = build_store_client(store);
            Box::new(MemoryReservationRepository::new(client.table("reservations")))
        }
    }
}

pub async fn create_reservation_service(config: &Configuration, store: RepositoryStore) -> Box<dyn ReservationService> {
    let reservation_repository = create_reservation_repository(store).await;
    let user_svc = create_user_service(config, store).await;
    let availability_svc = create_availability_service(config, store).await;
    let publisher = create_publisher(store.gateway_publisher()).await;
    Box::new(ReservationServiceImpl::new(config, reservation_repository, user_svc, availability_svc, publisher))
}
