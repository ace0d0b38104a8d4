use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::Transaction;

/// Keyword filters accepted by `list`. Every field is optional and the
/// present ones are combined with AND. Both date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub user_id: Option<String>,
    pub account_id: Option<String>,
    pub category_id: Option<String>,
    /// Compared verbatim against the stored type name.
    pub transaction_type: Option<String>,
    pub transfer_account_id: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    /// Builds a filter from loosely typed parameters, e.g. a query string
    /// decoded into JSON. Unknown keys and values of the wrong type are
    /// skipped; dates must be RFC 3339 strings.
    pub fn from_params(params: &Map<String, Value>) -> Self {
        let text = |key: &str| params.get(key).and_then(Value::as_str).map(str::to_owned);
        let date = |key: &str| {
            params
                .get(key)
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.with_timezone(&Utc))
        };

        Self {
            user_id: text("user_id"),
            account_id: text("account_id"),
            category_id: text("category_id"),
            transaction_type: text("transaction_type"),
            transfer_account_id: text("transfer_account_id"),
            date_from: date("date_from"),
            date_to: date("date_to"),
        }
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Evaluates the filter in application code.
    pub fn matches(&self, tx: &Transaction) -> bool {
        fn eq(expected: &Option<String>, actual: &str) -> bool {
            expected.as_deref().map_or(true, |e| e == actual)
        }

        eq(&self.user_id, &tx.user_id)
            && eq(&self.account_id, &tx.account_id)
            && eq(&self.category_id, &tx.category_id)
            && eq(&self.transaction_type, tx.transaction_type.as_str())
            && self
                .transfer_account_id
                .as_deref()
                .map_or(true, |e| tx.transfer_account() == Some(e))
            && self.date_from.map_or(true, |from| tx.occurred_at >= from)
            && self.date_to.map_or(true, |to| tx.occurred_at <= to)
    }
}
