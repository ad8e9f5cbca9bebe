//! Comparison of spending against per-category budgets.

use crate::model::summary::percent;
use crate::model::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spending limits keyed by category name.
pub type Budgets = BTreeMap<String, f64>;

/// One line of a `BudgetReport`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BudgetLine {
    category: String,
    spent: f64,
    /// `None` when the category has spending but no budget.
    limit: Option<f64>,
    /// `limit - spent`, negative when over budget.
    remaining: Option<f64>,
    percent_used: Option<f64>,
    over_budget: bool,
}

/// Expenses compared against `Budgets`. Every budgeted category appears, even with nothing spent,
/// followed by the categories that have spending but no budget.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BudgetReport {
    lines: Vec<BudgetLine>,
}

impl BudgetReport {
    pub fn new<'a>(
        budgets: &Budgets,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Self {
        let mut spent: BTreeMap<&str, f64> = BTreeMap::new();
        for t in transactions.into_iter().filter(|t| t.is_expense()) {
            *spent.entry(t.category()).or_default() += t.amount();
        }

        let mut lines: Vec<BudgetLine> = budgets
            .iter()
            .map(|(category, &limit)| {
                let spent = spent.remove(category.as_str()).unwrap_or_default();
                BudgetLine {
                    category: category.clone(),
                    spent,
                    limit: Some(limit),
                    remaining: Some(limit - spent),
                    percent_used: Some(percent(spent, limit)),
                    over_budget: spent > limit,
                }
            })
            .collect();

        lines.extend(spent.into_iter().map(|(category, spent)| BudgetLine {
            category: category.to_string(),
            spent,
            ..BudgetLine::default()
        }));

        Self { lines }
    }

    pub fn lines(&self) -> &[BudgetLine] {
        &self.lines
    }

    /// The lines whose spending exceeds their limit.
    pub fn over_budget(&self) -> impl Iterator<Item = &BudgetLine> {
        self.lines.iter().filter(|l| l.over_budget)
    }
}

impl BudgetLine {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn spent(&self) -> f64 {
        self.spent
    }

    pub fn limit(&self) -> Option<f64> {
        self.limit
    }

    pub fn remaining(&self) -> Option<f64> {
        self.remaining
    }

    pub fn percent_used(&self) -> Option<f64> {
        self.percent_used
    }

    pub fn is_over_budget(&self) -> bool {
        self.over_budget
    }
}
