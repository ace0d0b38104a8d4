//! Transaction domain entity.
//! Storage-agnostic representation of a personal finance transaction.

use bigdecimal::BigDecimal;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::object_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "transfer" => Ok(TransactionType::Transfer),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

/// Domain entity representing a transaction.
///
/// Ids are ObjectId hex strings. Timestamps carry millisecond precision,
/// the resolution of the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub category_id: String,
    pub transaction_type: TransactionType,
    pub amount: BigDecimal,
    pub transfer_account_id: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: String,
        account_id: String,
        category_id: String,
        transaction_type: TransactionType,
        amount: BigDecimal,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: object_id::generate(),
            user_id,
            account_id,
            category_id,
            transaction_type,
            amount,
            transfer_account_id: None,
            description: None,
            occurred_at: occurred_at.trunc_subsecs(3),
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    pub fn with_transfer_account(mut self, transfer_account_id: impl Into<String>) -> Self {
        self.transfer_account_id = Some(transfer_account_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The transfer account, with an empty id treated as no account.
    pub fn transfer_account(&self) -> Option<&str> {
        self.transfer_account_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

/// Partial update of a [`Transaction`].
///
/// A `None` field is left untouched. Nullable fields use a nested option:
/// `Some(None)` clears the stored value. When deserialized, a missing key is
/// absent and an explicit `null` clears a nullable field. An explicit `null`
/// amount counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransactionPatch {
    pub user_id: Option<String>,
    pub account_id: Option<String>,
    pub category_id: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub amount: Option<BigDecimal>,
    #[serde(deserialize_with = "present")]
    pub transfer_account_id: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub occurred_at: Option<DateTime<Utc>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.account_id.is_none()
            && self.category_id.is_none()
            && self.transaction_type.is_none()
            && self.amount.is_none()
            && self.transfer_account_id.is_none()
            && self.description.is_none()
            && self.occurred_at.is_none()
    }

    /// Merges every present field into `tx`.
    pub fn apply_to(&self, tx: &mut Transaction) {
        if let Some(user_id) = &self.user_id {
            tx.user_id = user_id.clone();
        }
        if let Some(account_id) = &self.account_id {
            tx.account_id = account_id.clone();
        }
        if let Some(category_id) = &self.category_id {
            tx.category_id = category_id.clone();
        }
        if let Some(transaction_type) = self.transaction_type {
            tx.transaction_type = transaction_type;
        }
        if let Some(amount) = &self.amount {
            tx.amount = amount.clone();
        }
        if let Some(transfer_account_id) = &self.transfer_account_id {
            tx.transfer_account_id = transfer_account_id
                .as_ref()
                .filter(|id| !id.is_empty())
                .cloned();
        }
        if let Some(description) = &self.description {
            tx.description = description.clone();
        }
        if let Some(occurred_at) = self.occurred_at {
            tx.occurred_at = occurred_at.trunc_subsecs(3);
        }
    }
}
