//! Types that represent the core data model, such as `Transaction`, and the aggregates computed
//! from it.
mod amount;
mod budget;
mod category;
mod summary;
mod transaction;

pub use amount::{format_amount, format_currency, normalize_amount, parse_amount};
pub use budget::{BudgetLine, BudgetReport, Budgets};
pub use category::{is_recommended, recommended_categories};
pub use summary::{CategoryShare, Summary};
pub use transaction::{parse_date, Transaction, TransactionInput, TransactionType, DATE_FORMAT};
