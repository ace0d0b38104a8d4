//! Repository ports.
//! Storage-agnostic contracts implemented by the adapters.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::domain::{MonthlySummaryEntry, Transaction, TransactionFilter, TransactionPatch};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid period: year {year}, month {month}")]
    InvalidPeriod { year: i32, month: u32 },

    #[error("Duplicate entity: {0}")]
    Duplicate(String),
}

impl From<mongodb::bson::ser::Error> for RepositoryError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for RepositoryError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<mongodb::bson::document::ValueAccessError> for RepositoryError {
    fn from(err: mongodb::bson::document::ValueAccessError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Generic CRUD contract over an entity `T` keyed by `Id`.
///
/// Not-found is never an error: `get` and `update` return `None`,
/// `delete` returns `false`.
#[async_trait]
pub trait Repository<T, Id: ?Sized>: Send + Sync
where
    T: Send + Sync + 'static,
    Id: Sync,
{
    type Filter: Send + Sync;
    type Patch: Send + Sync;

    async fn create(&self, entity: T) -> RepositoryResult<T>;

    async fn get(&self, id: &Id) -> RepositoryResult<Option<T>>;

    async fn list(&self, filter: &Self::Filter) -> RepositoryResult<Vec<T>>;

    /// Applies a partial update and returns the entity as stored afterwards.
    async fn update(&self, id: &Id, patch: &Self::Patch) -> RepositoryResult<Option<T>>;

    async fn delete(&self, id: &Id) -> RepositoryResult<bool>;
}

/// Transaction storage: CRUD plus the existence checks and reporting
/// aggregations used by the account, category and budget features.
#[async_trait]
pub trait TransactionRepository:
    Repository<Transaction, str, Filter = TransactionFilter, Patch = TransactionPatch>
{
    async fn exists_for_account(&self, account_id: &str) -> RepositoryResult<bool>;

    /// `year` alone selects the whole year, `year` with `month` selects that
    /// month. A `month` without a `year` is ignored.
    async fn exists_for_category(
        &self,
        category_id: &str,
        user_id: Option<&str>,
        year: Option<i32>,
        month: Option<u32>,
    ) -> RepositoryResult<bool>;

    /// Totals and counts of a user's transactions in one month, grouped by
    /// category and type, ordered by category then type.
    async fn aggregate_monthly_summary(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> RepositoryResult<Vec<MonthlySummaryEntry>>;

    async fn sum_for_category_period(
        &self,
        user_id: &str,
        category_id: &str,
        year: i32,
        month: u32,
    ) -> RepositoryResult<BigDecimal>;
}
