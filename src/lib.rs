pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod ports;

pub use adapters::{InMemoryTransactionRepository, MongoTransactionRepository};
pub use domain::{
    MonthlySummaryEntry, Transaction, TransactionFilter, TransactionPatch, TransactionType,
};
pub use ports::{Repository, RepositoryError, RepositoryResult, TransactionRepository};
