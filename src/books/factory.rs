use crate::books::repository::memory_book_repository::MemoryBookRepository;
use crate::books::repository::BookRepository;
use crate::core::repository::RepositoryStore;
use crate::utils::store::build_store_client;

pub(crate) async fn create_book_repository(store: RepositoryStore) -> Box<dyn BookRepository> {
    match store {
        RepositoryStore::Memory => {
            let client = build_store_client(store);
            Box::new(MemoryBookRepository::new(client.table("books")))
        }
    }
}
