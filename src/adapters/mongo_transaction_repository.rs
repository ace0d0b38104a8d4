//! MongoDB implementation of TransactionRepository.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{CountOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use super::transaction_document::{prepare_update, to_bson_datetime, TransactionDocument};
use crate::db::{decimal, object_id};
use crate::domain::period;
use crate::domain::{MonthlySummaryEntry, Transaction, TransactionFilter, TransactionPatch};
use crate::ports::{Repository, RepositoryError, RepositoryResult, TransactionRepository};

pub const COLLECTION_NAME: &str = "transactions";

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed transaction repository.
///
/// Indexes are requested on the first create or list call. The flag is not
/// guarded against concurrent first use; index creation is idempotent on
/// the server, so a repeated request is harmless.
pub struct MongoTransactionRepository {
    collection: Collection<TransactionDocument>,
    indexes_ready: AtomicBool,
}

impl MongoTransactionRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(COLLECTION_NAME),
            indexes_ready: AtomicBool::new(false),
        }
    }

    /// Whether this repository has already created its indexes.
    pub fn indexes_ready(&self) -> bool {
        self.indexes_ready.load(Ordering::Acquire)
    }

    pub async fn ensure_indexes(&self) -> RepositoryResult<()> {
        if self.indexes_ready() {
            return Ok(());
        }

        let models = vec![
            IndexModel::builder().keys(doc! { "user_id": 1 }).build(),
            IndexModel::builder().keys(doc! { "account_id": 1 }).build(),
            IndexModel::builder().keys(doc! { "category_id": 1 }).build(),
            IndexModel::builder().keys(doc! { "occurred_at": -1 }).build(),
        ];
        let result = self.collection.create_indexes(models, None).await?;
        tracing::info!(
            "Ensured {} indexes on collection {}",
            result.index_names.len(),
            COLLECTION_NAME
        );

        self.indexes_ready.store(true, Ordering::Release);
        Ok(())
    }

    fn build_filter(filter: &TransactionFilter) -> RepositoryResult<Document> {
        let mut query = Document::new();

        let ids = [
            ("user_id", &filter.user_id),
            ("account_id", &filter.account_id),
            ("category_id", &filter.category_id),
            ("transfer_account_id", &filter.transfer_account_id),
        ];
        for (field, value) in ids {
            if let Some(id) = value {
                query.insert(field, object_id::parse(id)?);
            }
        }
        if let Some(transaction_type) = &filter.transaction_type {
            query.insert("transaction_type", transaction_type.as_str());
        }

        let mut range = Document::new();
        if let Some(from) = filter.date_from {
            range.insert("$gte", to_bson_datetime(from));
        }
        if let Some(to) = filter.date_to {
            range.insert("$lte", to_bson_datetime(to));
        }
        if !range.is_empty() {
            query.insert("occurred_at", range);
        }

        Ok(query)
    }

    fn month_expr(year: i32, month: u32) -> Document {
        let month = month as i32;
        doc! {
            "$and": [
                { "$eq": [{ "$year": "$occurred_at" }, year] },
                { "$eq": [{ "$month": "$occurred_at" }, month] },
            ]
        }
    }

    async fn exists(&self, filter: Document) -> RepositoryResult<bool> {
        let options = CountOptions::builder().limit(1).build();
        let count = self.collection.count_documents(filter, options).await?;
        Ok(count > 0)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

fn decimal_field(document: &Document, key: &str) -> RepositoryResult<BigDecimal> {
    match document.get(key) {
        Some(Bson::Decimal128(value)) => decimal::from_decimal128(value),
        Some(Bson::Int32(value)) => Ok(BigDecimal::from(*value)),
        Some(Bson::Int64(value)) => Ok(BigDecimal::from(*value)),
        None | Some(Bson::Null) => Ok(BigDecimal::from(0)),
        Some(other) => Err(RepositoryError::Serialization(format!(
            "unexpected {} value: {}",
            key, other
        ))),
    }
}

fn count_field(document: &Document, key: &str) -> RepositoryResult<i64> {
    match document.get(key) {
        Some(Bson::Int32(value)) => Ok(i64::from(*value)),
        Some(Bson::Int64(value)) => Ok(*value),
        other => Err(RepositoryError::Serialization(format!(
            "unexpected {} value: {:?}",
            key, other
        ))),
    }
}

fn summary_entry(document: Document) -> RepositoryResult<MonthlySummaryEntry> {
    let category_id = document.get_object_id("category_id")?.to_hex();
    let transaction_type = document
        .get_str("transaction_type")?
        .parse()
        .map_err(RepositoryError::Serialization)?;

    Ok(MonthlySummaryEntry {
        category_id,
        transaction_type,
        total: decimal_field(&document, "total")?,
        count: count_field(&document, "count")?,
    })
}

#[async_trait]
impl Repository<Transaction, str> for MongoTransactionRepository {
    type Filter = TransactionFilter;
    type Patch = TransactionPatch;

    async fn create(&self, tx: Transaction) -> RepositoryResult<Transaction> {
        self.ensure_indexes().await?;

        let document = TransactionDocument::from_domain(&tx)?;
        self.collection
            .insert_one(document, None)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    RepositoryError::Duplicate(tx.id.clone())
                } else {
                    RepositoryError::from(e)
                }
            })?;

        tracing::debug!("Inserted transaction {}", tx.id);
        Ok(tx)
    }

    async fn get(&self, id: &str) -> RepositoryResult<Option<Transaction>> {
        let oid = object_id::parse(id)?;
        let document = self.collection.find_one(doc! { "_id": oid }, None).await?;

        document.map(TransactionDocument::into_domain).transpose()
    }

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Vec<Transaction>> {
        self.ensure_indexes().await?;

        let query = Self::build_filter(filter)?;
        let options = FindOptions::builder()
            .sort(doc! { "occurred_at": -1, "_id": -1 })
            .build();
        let documents: Vec<TransactionDocument> = self
            .collection
            .find(query, options)
            .await?
            .try_collect()
            .await?;

        documents
            .into_iter()
            .map(TransactionDocument::into_domain)
            .collect()
    }

    async fn update(
        &self,
        id: &str,
        patch: &TransactionPatch,
    ) -> RepositoryResult<Option<Transaction>> {
        if patch.is_empty() {
            return self.get(id).await;
        }

        let oid = object_id::parse(id)?;
        let set = prepare_update(patch)?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set }, options)
            .await?;

        tracing::debug!("Updated transaction {} (matched: {})", id, updated.is_some());
        updated.map(TransactionDocument::into_domain).transpose()
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        let oid = object_id::parse(id)?;
        let result = self.collection.delete_one(doc! { "_id": oid }, None).await?;

        tracing::debug!("Deleted {} transaction(s) with id {}", result.deleted_count, id);
        Ok(result.deleted_count == 1)
    }
}

#[async_trait]
impl TransactionRepository for MongoTransactionRepository {
    async fn exists_for_account(&self, account_id: &str) -> RepositoryResult<bool> {
        let oid = object_id::parse(account_id)?;
        self.exists(doc! { "account_id": oid }).await
    }

    async fn exists_for_category(
        &self,
        category_id: &str,
        user_id: Option<&str>,
        year: Option<i32>,
        month: Option<u32>,
    ) -> RepositoryResult<bool> {
        let mut query = doc! { "category_id": object_id::parse(category_id)? };
        if let Some(user_id) = user_id {
            query.insert("user_id", object_id::parse(user_id)?);
        }
        if let Some(window) = period::optional_window(year, month)? {
            query.insert(
                "occurred_at",
                doc! {
                    "$gte": to_bson_datetime(window.start),
                    "$lt": to_bson_datetime(window.end),
                },
            );
        }

        self.exists(query).await
    }

    async fn aggregate_monthly_summary(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> RepositoryResult<Vec<MonthlySummaryEntry>> {
        period::validate_month(year, month)?;
        let pipeline = vec![
            doc! {
                "$match": {
                    "user_id": object_id::parse(user_id)?,
                    "$expr": Self::month_expr(year, month),
                }
            },
            doc! {
                "$group": {
                    "_id": {
                        "category_id": "$category_id",
                        "transaction_type": "$transaction_type",
                    },
                    "total": { "$sum": "$amount" },
                    "count": { "$sum": 1 },
                }
            },
            doc! {
                "$project": {
                    "_id": 0,
                    "category_id": "$_id.category_id",
                    "transaction_type": "$_id.transaction_type",
                    "total": 1,
                    "count": 1,
                }
            },
            doc! { "$sort": { "category_id": 1, "transaction_type": 1 } },
        ];

        let rows: Vec<Document> = self
            .collection
            .aggregate(pipeline, None)
            .await?
            .try_collect()
            .await?;
        tracing::debug!(
            "Monthly summary for user {} ({}-{:02}): {} groups",
            user_id,
            year,
            month,
            rows.len()
        );

        rows.into_iter().map(summary_entry).collect()
    }

    async fn sum_for_category_period(
        &self,
        user_id: &str,
        category_id: &str,
        year: i32,
        month: u32,
    ) -> RepositoryResult<BigDecimal> {
        period::validate_month(year, month)?;
        let pipeline = vec![
            doc! {
                "$match": {
                    "user_id": object_id::parse(user_id)?,
                    "category_id": object_id::parse(category_id)?,
                    "$expr": Self::month_expr(year, month),
                }
            },
            doc! { "$group": { "_id": Bson::Null, "total": { "$sum": "$amount" } } },
        ];

        let mut cursor = self.collection.aggregate(pipeline, None).await?;
        match cursor.try_next().await? {
            Some(row) => decimal_field(&row, "total"),
            None => Ok(BigDecimal::from(0)),
        }
    }
}
