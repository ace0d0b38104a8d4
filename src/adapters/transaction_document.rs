//! Mapping between [`Transaction`] and its stored document form.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson, DateTime as BsonDateTime, Decimal128, Document};
use serde::{Deserialize, Serialize};

use crate::db::{decimal, object_id};
use crate::domain::{Transaction, TransactionPatch, TransactionType};
use crate::ports::{RepositoryError, RepositoryResult};

/// Stored shape of a transaction. Not exposed outside the adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TransactionDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub account_id: ObjectId,
    pub category_id: ObjectId,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub amount: Option<Decimal128>,
    #[serde(default)]
    pub transfer_account_id: Option<ObjectId>,
    #[serde(default)]
    pub description: Option<String>,
    pub occurred_at: BsonDateTime,
    pub created_at: BsonDateTime,
}

pub(crate) fn to_bson_datetime(at: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(at.timestamp_millis())
}

fn from_bson_datetime(at: BsonDateTime) -> RepositoryResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis()).ok_or_else(|| {
        RepositoryError::Serialization(format!("timestamp out of range: {}", at.timestamp_millis()))
    })
}

impl TransactionDocument {
    pub fn from_domain(tx: &Transaction) -> RepositoryResult<Self> {
        Ok(Self {
            id: object_id::parse(&tx.id)?,
            user_id: object_id::parse(&tx.user_id)?,
            account_id: object_id::parse(&tx.account_id)?,
            category_id: object_id::parse(&tx.category_id)?,
            transaction_type: tx.transaction_type,
            amount: Some(decimal::to_decimal128(&tx.amount)?),
            transfer_account_id: object_id::parse_optional(tx.transfer_account())?,
            description: tx.description.clone(),
            occurred_at: to_bson_datetime(tx.occurred_at),
            created_at: to_bson_datetime(tx.created_at),
        })
    }

    pub fn into_domain(self) -> RepositoryResult<Transaction> {
        let amount = match self.amount {
            Some(amount) => decimal::from_decimal128(&amount)?,
            None => BigDecimal::from(0),
        };

        Ok(Transaction {
            id: self.id.to_hex(),
            user_id: self.user_id.to_hex(),
            account_id: self.account_id.to_hex(),
            category_id: self.category_id.to_hex(),
            transaction_type: self.transaction_type,
            amount,
            transfer_account_id: self.transfer_account_id.map(|id| id.to_hex()),
            description: self.description,
            occurred_at: from_bson_datetime(self.occurred_at)?,
            created_at: from_bson_datetime(self.created_at)?,
        })
    }
}

/// Builds the `$set` body for a partial update. Only fields present in the
/// patch appear in the result.
pub(crate) fn prepare_update(patch: &TransactionPatch) -> RepositoryResult<Document> {
    let mut set = Document::new();

    if let Some(user_id) = &patch.user_id {
        set.insert("user_id", object_id::parse(user_id)?);
    }
    if let Some(account_id) = &patch.account_id {
        set.insert("account_id", object_id::parse(account_id)?);
    }
    if let Some(category_id) = &patch.category_id {
        set.insert("category_id", object_id::parse(category_id)?);
    }
    if let Some(transaction_type) = patch.transaction_type {
        set.insert("transaction_type", transaction_type.as_str());
    }
    if let Some(amount) = &patch.amount {
        set.insert("amount", Bson::Decimal128(decimal::to_decimal128(amount)?));
    }
    if let Some(transfer_account_id) = &patch.transfer_account_id {
        let value = match object_id::parse_optional(transfer_account_id.as_deref())? {
            Some(oid) => Bson::ObjectId(oid),
            None => Bson::Null,
        };
        set.insert("transfer_account_id", value);
    }
    if let Some(description) = &patch.description {
        let value = match description {
            Some(text) => Bson::String(text.clone()),
            None => Bson::Null,
        };
        set.insert("description", value);
    }
    if let Some(occurred_at) = patch.occurred_at {
        set.insert("occurred_at", to_bson_datetime(occurred_at));
    }

    Ok(set)
}
