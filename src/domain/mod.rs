pub mod filter;
pub mod period;
pub mod summary;
pub mod transaction;

pub use filter::TransactionFilter;
pub use summary::MonthlySummaryEntry;
pub use transaction::{Transaction, TransactionPatch, TransactionType};
