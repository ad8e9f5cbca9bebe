//! Dashboard aggregates computed from a user's transactions.

use crate::model::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Totals shown at the top of the dashboard plus the breakdown of expenses by category.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Summary {
    total_income: f64,
    total_expenses: f64,
    balance: f64,
    /// Sorted by amount, largest first.
    expenses_by_category: Vec<CategoryShare>,
}

/// How much was spent in one category and what share of all expenses that is.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryShare {
    category: String,
    spent: f64,
    /// Percentage of total expenses, `0.0` when there are no expenses.
    percent_of_total: f64,
}

impl Summary {
    pub fn new<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut total_income = 0.0;
        let mut total_expenses = 0.0;
        let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
        for t in transactions {
            if t.is_income() {
                total_income += t.amount();
            } else {
                total_expenses += t.amount();
                *by_category.entry(t.category()).or_default() += t.amount();
            }
        }

        let mut expenses_by_category: Vec<CategoryShare> = by_category
            .into_iter()
            .map(|(category, spent)| CategoryShare {
                category: category.to_string(),
                spent,
                percent_of_total: percent(spent, total_expenses),
            })
            .collect();
        // Stable sort keeps ties in alphabetical order
        expenses_by_category.sort_by(|a, b| b.spent.total_cmp(&a.spent));

        Self {
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
            expenses_by_category,
        }
    }

    pub fn total_income(&self) -> f64 {
        self.total_income
    }

    pub fn total_expenses(&self) -> f64 {
        self.total_expenses
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn expenses_by_category(&self) -> &[CategoryShare] {
        &self.expenses_by_category
    }
}

impl CategoryShare {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn spent(&self) -> f64 {
        self.spent
    }

    pub fn percent_of_total(&self) -> f64 {
        self.percent_of_total
    }
}

pub(crate) fn percent(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value * 100.0 / max
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TransactionInput, TransactionType};
    use chrono::NaiveDate;

    fn txn(id: &str, amount: f64, category: &str, kind: TransactionType) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        Transaction::from_input(
            id,
            "u1",
            TransactionInput::new(id, amount, date, category, kind),
        )
    }

    #[test]
    fn test_empty() {
        let summary = Summary::new(std::iter::empty());
        assert_eq!(summary.balance(), 0.0);
        assert!(summary.expenses_by_category().is_empty());
    }

    #[test]
    fn test_totals_and_breakdown() {
        let data = vec![
            txn("1", 3000.0, "Salário", TransactionType::Income),
            txn("2", 100.0, "Lazer", TransactionType::Expense),
            txn("3", 250.0, "Alimentação", TransactionType::Expense),
            txn("4", 150.0, "Alimentação", TransactionType::Expense),
            txn("5", 500.0, "Freelance", TransactionType::Income),
        ];
        let summary = Summary::new(&data);
        assert_eq!(summary.total_income(), 3500.0);
        assert_eq!(summary.total_expenses(), 500.0);
        assert_eq!(summary.balance(), 3000.0);

        let breakdown = summary.expenses_by_category();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category(), "Alimentação");
        assert_eq!(breakdown[0].spent(), 400.0);
        assert_eq!(breakdown[0].percent_of_total(), 80.0);
        assert_eq!(breakdown[1].category(), "Lazer");
        assert_eq!(breakdown[1].percent_of_total(), 20.0);
    }

    #[test]
    fn test_negative_balance() {
        let data = vec![
            txn("1", 10.0, "Vendas", TransactionType::Income),
            txn("2", 25.0, "Contas", TransactionType::Expense),
        ];
        assert_eq!(Summary::new(&data).balance(), -15.0);
    }
}
