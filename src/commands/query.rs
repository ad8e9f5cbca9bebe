//! Read-only commands: `list`, `summary` and `categories`.

use crate::args::{CategoriesArgs, ListArgs};
use crate::commands::{plural, Out, Session};
use crate::model::{
    format_currency, recommended_categories, Summary, Transaction, TransactionType, DATE_FORMAT,
};
use crate::Result;
use serde::Serialize;
use std::fmt::Write;

/// Lists the session's transactions, optionally filtered by type and category.
pub async fn list(session: &Session, args: ListArgs) -> Result<Out<Vec<Transaction>>> {
    let transactions: Vec<Transaction> = session
        .store()
        .transactions()
        .into_iter()
        .filter(|t| args.kind().map_or(true, |kind| t.kind() == kind))
        .filter(|t| args.category().map_or(true, |c| t.category() == c))
        .collect();

    let mut message = format!("Found {}", plural(transactions.len(), "transaction"));
    for t in &transactions {
        let _ = write!(
            message,
            "\n{}  {:<7}  {:>14}  {:<14}  {}  ({})",
            t.date().format(DATE_FORMAT),
            t.kind().to_string(),
            format_currency(t.amount()),
            t.category(),
            t.description(),
            t.id()
        );
    }
    Ok(Out::new(message, transactions))
}

/// Totals and expenses by category for the session's transactions.
pub async fn summary(session: &Session) -> Result<Out<Summary>> {
    let transactions = session.store().transactions();
    let summary = Summary::new(&transactions);

    let mut message = format!(
        "Income: {}\nExpenses: {}\nBalance: {}",
        format_currency(summary.total_income()),
        format_currency(summary.total_expenses()),
        format_currency(summary.balance())
    );
    for share in summary.expenses_by_category() {
        let _ = write!(
            message,
            "\n  {:<14} {:>14}  {:>5.1}%",
            share.category(),
            format_currency(share.spent()),
            share.percent_of_total()
        );
    }
    Ok(Out::new(message, summary))
}

/// The recommended categories for one type.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryList {
    #[serde(rename = "type")]
    kind: TransactionType,
    categories: Vec<String>,
}

/// Lists the recommended categories, for one type or for both.
pub async fn categories(args: CategoriesArgs) -> Result<Out<Vec<CategoryList>>> {
    let kinds = match args.kind() {
        Some(kind) => vec![kind],
        None => vec![TransactionType::Income, TransactionType::Expense],
    };
    let lists: Vec<CategoryList> = kinds
        .into_iter()
        .map(|kind| CategoryList {
            kind,
            categories: recommended_categories(kind)
                .iter()
                .map(|c| c.to_string())
                .collect(),
        })
        .collect();

    let message = lists
        .iter()
        .map(|list| format!("{}: {}", list.kind, list.categories.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Out::new(message, lists))
}
