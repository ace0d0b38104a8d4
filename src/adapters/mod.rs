pub mod in_memory_transaction_repository;
pub mod mongo_transaction_repository;
pub(crate) mod transaction_document;

pub use in_memory_transaction_repository::InMemoryTransactionRepository;
pub use mongo_transaction_repository::MongoTransactionRepository;
