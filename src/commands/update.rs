//! The `update` command.

use crate::args::UpdateArgs;
use crate::commands::{Out, Session};
use crate::error::{Error, ErrorType};
use crate::model::{Transaction, TransactionInput};
use crate::Result;

/// Changes the fields given in `args` and keeps the others as they are in the loaded list.
///
/// # Errors
/// - `ErrorType::NotFoundOrForbidden` if the session's user has no transaction with that id.
pub async fn update(session: &Session, args: UpdateArgs) -> Result<Out<Transaction>> {
    let existing = session
        .store()
        .state()
        .get(args.id())
        .cloned()
        .ok_or_else(|| {
            Error::msg(
                ErrorType::NotFoundOrForbidden,
                format!("There is no transaction with id '{}'", args.id()),
            )
        })?;

    let mut input = TransactionInput::from(existing);
    if let Some(description) = args.description() {
        input.description = description.to_string();
    }
    if let Some(amount) = args.amount() {
        input.amount = amount;
    }
    if let Some(date) = args.date() {
        input.date = date;
    }
    if let Some(category) = args.category() {
        input.category = category.to_string();
    }
    if let Some(kind) = args.kind() {
        input.kind = kind;
    }

    let updated = session
        .store()
        .update_transaction(args.id(), input, session.user_id())
        .await?;
    Ok(Out::new(
        format!("Updated transaction '{}'", updated.id()),
        updated,
    ))
}
