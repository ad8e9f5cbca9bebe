//! The `add` command.

use crate::args::AddArgs;
use crate::commands::{Out, Session};
use crate::model::{format_currency, Transaction, TransactionInput};
use crate::Result;
use chrono::Local;

/// Adds a transaction for the session's user. The date defaults to today.
pub async fn add(session: &Session, args: AddArgs) -> Result<Out<Transaction>> {
    let date = args.date().unwrap_or_else(|| Local::now().date_naive());
    let input = TransactionInput::new(
        args.description(),
        args.amount(),
        date,
        args.category(),
        args.kind(),
    );
    let created = session
        .store()
        .add_transaction(input, session.user_id())
        .await?;
    let message = format!(
        "Added {} of {} with id '{}'",
        created.kind(),
        format_currency(created.amount()),
        created.id()
    );
    Ok(Out::new(message, created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Mode;
    use crate::model::TransactionType;
    use crate::test::{date, TestEnv};
    use crate::ErrorType;

    #[tokio::test]
    async fn test_add() {
        let env = TestEnv::new().await;
        let session = Session::open(env.config().clone(), Mode::Test, Some("demo"))
            .await
            .unwrap();
        let args = AddArgs::new(
            "Padaria",
            12.5,
            Some(date(2025, 10, 14)),
            "Alimentação",
            TransactionType::Expense,
        );
        let out = add(&session, args).await.unwrap();
        let created = out.structure().unwrap();
        assert_eq!(created.user_id(), "demo");
        assert!(out.message().contains("R$ 12,50"));

        let transactions = session.store().transactions();
        assert_eq!(transactions.len(), 9);
        assert_eq!(&transactions[0], created);
    }

    #[tokio::test]
    async fn test_add_without_user() {
        let env = TestEnv::new().await;
        let session = Session::open(env.config().clone(), Mode::Test, None)
            .await
            .unwrap();
        let args = AddArgs::new("Padaria", 1.0, None, "Alimentação", TransactionType::Expense);
        let err = add(&session, args).await.unwrap_err();
        assert!(err.is(ErrorType::Unauthenticated));
    }
}
