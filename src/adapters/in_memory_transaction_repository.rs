//! In-memory implementation of TransactionRepository, for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use tokio::sync::RwLock;

use crate::db::object_id;
use crate::domain::period;
use crate::domain::{
    MonthlySummaryEntry, Transaction, TransactionFilter, TransactionPatch, TransactionType,
};
use crate::ports::{Repository, RepositoryError, RepositoryResult, TransactionRepository};

/// Map-backed transaction repository.
///
/// Ids are validated exactly like the MongoDB repository does, so both
/// report malformed ids the same way.
#[derive(Default)]
pub struct InMemoryTransactionRepository {
    storage: RwLock<HashMap<String, Transaction>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.storage.read().await.is_empty()
    }
}

fn validate_filter(filter: &TransactionFilter) -> RepositoryResult<()> {
    for id in [
        &filter.user_id,
        &filter.account_id,
        &filter.category_id,
        &filter.transfer_account_id,
    ]
    .into_iter()
    .flatten()
    {
        object_id::parse(id)?;
    }
    Ok(())
}

fn validate_patch(patch: &TransactionPatch) -> RepositoryResult<()> {
    for id in [&patch.user_id, &patch.account_id, &patch.category_id]
        .into_iter()
        .flatten()
    {
        object_id::parse(id)?;
    }
    if let Some(transfer_account_id) = &patch.transfer_account_id {
        object_id::parse_optional(transfer_account_id.as_deref())?;
    }
    Ok(())
}

fn validate_transaction(tx: &Transaction) -> RepositoryResult<()> {
    for id in [&tx.id, &tx.user_id, &tx.account_id, &tx.category_id] {
        object_id::parse(id)?;
    }
    object_id::parse_optional(tx.transfer_account())?;
    Ok(())
}

/// Empty transfer ids are stored as absent, matching the document mapper.
fn normalized(mut tx: Transaction) -> Transaction {
    if tx.transfer_account().is_none() {
        tx.transfer_account_id = None;
    }
    tx
}

#[async_trait]
impl Repository<Transaction, str> for InMemoryTransactionRepository {
    type Filter = TransactionFilter;
    type Patch = TransactionPatch;

    async fn create(&self, tx: Transaction) -> RepositoryResult<Transaction> {
        validate_transaction(&tx)?;

        let mut storage = self.storage.write().await;
        if storage.contains_key(&tx.id) {
            return Err(RepositoryError::Duplicate(tx.id));
        }
        storage.insert(tx.id.clone(), normalized(tx.clone()));
        Ok(tx)
    }

    async fn get(&self, id: &str) -> RepositoryResult<Option<Transaction>> {
        object_id::parse(id)?;
        Ok(self.storage.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<Transaction>> {
        validate_filter(filter)?;

        let storage = self.storage.read().await;
        let mut matches: Vec<Transaction> = storage
            .values()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();
        matches.sort_by(|a, b| (b.occurred_at, &b.id).cmp(&(a.occurred_at, &a.id)));
        Ok(matches)
    }

    async fn update(
        &self,
        id: &str,
        patch: &TransactionPatch,
    ) -> RepositoryResult<Option<Transaction>> {
        if patch.is_empty() {
            return self.get(id).await;
        }

        object_id::parse(id)?;
        validate_patch(patch)?;

        let mut storage = self.storage.write().await;
        Ok(storage.get_mut(id).map(|tx| {
            patch.apply_to(tx);
            tx.clone()
        }))
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        object_id::parse(id)?;
        Ok(self.storage.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn exists_for_account(&self, account_id: &str) -> RepositoryResult<bool> {
        object_id::parse(account_id)?;
        let storage = self.storage.read().await;
        Ok(storage.values().any(|tx| tx.account_id == account_id))
    }

    async fn exists_for_category(
        &self,
        category_id: &str,
        user_id: Option<&str>,
        year: Option<i32>,
        month: Option<u32>,
    ) -> RepositoryResult<bool> {
        object_id::parse(category_id)?;
        if let Some(user_id) = user_id {
            object_id::parse(user_id)?;
        }
        let window = period::optional_window(year, month)?;

        let storage = self.storage.read().await;
        Ok(storage.values().any(|tx| {
            tx.category_id == category_id
                && user_id.map_or(true, |u| tx.user_id == u)
                && window.map_or(true, |w| w.contains(tx.occurred_at))
        }))
    }

    async fn aggregate_monthly_summary(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> RepositoryResult<Vec<MonthlySummaryEntry>> {
        period::validate_month(year, month)?;
        object_id::parse(user_id)?;

        let storage = self.storage.read().await;
        let mut groups: HashMap<(String, TransactionType), (BigDecimal, i64)> = HashMap::new();
        for tx in storage
            .values()
            .filter(|tx| tx.user_id == user_id && period::in_month(tx.occurred_at, year, month))
        {
            let entry = groups
                .entry((tx.category_id.clone(), tx.transaction_type))
                .or_insert_with(|| (BigDecimal::from(0), 0));
            entry.0 = &entry.0 + &tx.amount;
            entry.1 += 1;
        }

        let mut summary: Vec<MonthlySummaryEntry> = groups
            .into_iter()
            .map(|((category_id, transaction_type), (total, count))| MonthlySummaryEntry {
                category_id,
                transaction_type,
                total,
                count,
            })
            .collect();
        summary.sort_by_key(|e| (e.category_id.clone(), e.transaction_type.as_str()));
        Ok(summary)
    }

    async fn sum_for_category_period(
        &self,
        user_id: &str,
        category_id: &str,
        year: i32,
        month: u32,
    ) -> RepositoryResult<BigDecimal> {
        period::validate_month(year, month)?;
        object_id::parse(user_id)?;
        object_id::parse(category_id)?;

        let storage = self.storage.read().await;
        Ok(storage
            .values()
            .filter(|tx| {
                tx.user_id == user_id
                    && tx.category_id == category_id
                    && period::in_month(tx.occurred_at, year, month)
            })
            .map(|tx| tx.amount.clone())
            .fold(BigDecimal::from(0), |acc, x| acc + x))
    }
}
