use crate::availability::factory::create_availability_service;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::gateway::factory::create_publisher;
use crate::loans::domain::service::LoanServiceImpl;
use crate::loans::domain::LoanService;
use crate::loans::repository::memory_loan_repository::MemoryLoanRepository;
use crate::loans::repository::LoanRepository;
use crate::reservations::factory::create_reservation_service;
use crate::users::factory::create_user_service;
use crate::utils::store::build_store_client;

pub(crate) async fn create_loan_repository(store: RepositoryStore) -> Box<dyn LoanRepository> {
    match store {
        RepositoryStore::Memory => {
            let client = build_store_client(store);
            Box::new(MemoryLoanRepository::new(client.table("loans")))
        }
    }
}

pub async fn create_loan_service(config: &Configuration, store: RepositoryStore) -> Box<dyn LoanService> {
    let loan_repository = create_loan_repository(store).await;
    let user_svc = create_user_service(config, store).await;
    let availability_svc = create_availability_service(config, store).await;
    let reservation_svc = create_reservation_service(config, store).await;
    let publisher = create_publisher(store.gateway_publisher()).await;
    Box::new(LoanServiceImpl::new(config, loan_repository, user_svc,
                                  availability_svc, reservation_svc, publisher))
}
