//! The `budget` command.

use crate::args::BudgetArgs;
use crate::commands::{Out, Session};
use crate::model::{format_currency, BudgetReport};
use crate::Result;
use std::fmt::Write;
use tracing::{debug, warn};

/// Applies the budget changes in `args`, saves them, and reports spending against the budgets.
pub async fn budget(session: &mut Session, args: BudgetArgs) -> Result<Out<BudgetReport>> {
    let changed = !args.set().is_empty() || !args.remove().is_empty();
    for (category, limit) in args.set() {
        session.config.set_budget(category.as_str(), *limit)?;
    }
    for category in args.remove() {
        if !session.config.remove_budget(category) {
            warn!("There was no budget for '{category}'");
        }
    }
    if changed {
        session.config.save().await?;
        debug!("Saved budgets to {}", session.config.config_path().display());
    }

    let transactions = session.store().transactions();
    let report = BudgetReport::new(session.config().budgets(), &transactions);

    let over = report.over_budget().count();
    let mut message = match over {
        0 => "All categories are within budget".to_string(),
        1 => "1 category is over budget".to_string(),
        n => format!("{n} categories are over budget"),
    };
    for line in report.lines() {
        let limit = line
            .limit()
            .map(format_currency)
            .unwrap_or_else(|| "no budget".to_string());
        let _ = write!(
            message,
            "\n  {:<14} {:>14} of {:<14}{}",
            line.category(),
            format_currency(line.spent()),
            limit,
            if line.is_over_budget() { "  OVER" } else { "" }
        );
    }
    Ok(Out::new(message, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Mode;
    use crate::test::TestEnv;
    use crate::Config;

    #[tokio::test]
    async fn test_budget_set_and_report() {
        let env = TestEnv::new().await;
        let mut session = Session::open(env.config().clone(), Mode::Test, Some("demo"))
            .await
            .unwrap();
        let args = BudgetArgs::new(
            vec![
                ("Alimentação".to_string(), 500.0),
                ("Lazer".to_string(), 50.0),
            ],
            vec![],
        );
        let out = budget(&mut session, args).await.unwrap();
        let report = out.structure().unwrap();

        let food = &report.lines()[0];
        assert_eq!(food.category(), "Alimentação");
        assert_eq!(food.spent(), 412.37);
        assert!(!food.is_over_budget());
        let fun = &report.lines()[1];
        assert_eq!(fun.category(), "Lazer");
        assert!(fun.is_over_budget());
        assert!(out.message().starts_with("1 category is over budget"));

        let saved = Config::load(env.config().root()).await.unwrap();
        assert_eq!(saved.budgets().len(), 2);
    }

    #[tokio::test]
    async fn test_budget_remove() {
        let env = TestEnv::new().await;
        let mut session = Session::open(env.config().clone(), Mode::Test, Some("demo"))
            .await
            .unwrap();
        let set = BudgetArgs::new(vec![("Contas".to_string(), 300.0)], vec![]);
        budget(&mut session, set).await.unwrap();
        let remove = BudgetArgs::new(vec![], vec!["Contas".to_string()]);
        let out = budget(&mut session, remove).await.unwrap();
        assert!(out.message().starts_with("All categories are within budget"));
        assert!(out
            .structure()
            .unwrap()
            .lines()
            .iter()
            .all(|line| line.limit().is_none()));
    }
}
