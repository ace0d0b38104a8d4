use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::TransactionType;

/// One row of the monthly report: totals for a category and type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummaryEntry {
    pub category_id: String,
    pub transaction_type: TransactionType,
    pub total: BigDecimal,
    pub count: i64,
}
