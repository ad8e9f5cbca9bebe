//! The recommended categories offered for each transaction type. Categories are free text, so
//! these are suggestions and are never enforced.

use crate::model::TransactionType;

const INCOME_CATEGORIES: &[&str] = &["Salário", "Freelance", "Investimentos", "Vendas", "Outros"];

const EXPENSE_CATEGORIES: &[&str] = &[
    "Alimentação",
    "Transporte",
    "Moradia",
    "Saúde",
    "Educação",
    "Lazer",
    "Compras",
    "Contas",
    "Outros",
];

/// Returns the recommended categories for `kind`.
pub fn recommended_categories(kind: TransactionType) -> &'static [&'static str] {
    match kind {
        TransactionType::Income => INCOME_CATEGORIES,
        TransactionType::Expense => EXPENSE_CATEGORIES,
    }
}

/// Whether `category` is one of the recommended categories for `kind`.
pub fn is_recommended(kind: TransactionType, category: &str) -> bool {
    recommended_categories(kind).contains(&category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outros_is_shared() {
        assert!(is_recommended(TransactionType::Income, "Outros"));
        assert!(is_recommended(TransactionType::Expense, "Outros"));
    }

    #[test]
    fn test_categories_are_per_type() {
        assert!(is_recommended(TransactionType::Income, "Salário"));
        assert!(!is_recommended(TransactionType::Expense, "Salário"));
        assert!(is_recommended(TransactionType::Expense, "Moradia"));
        assert!(!is_recommended(TransactionType::Expense, "Groceries"));
    }
}
