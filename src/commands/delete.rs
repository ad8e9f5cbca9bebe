//! The `delete` command.

use crate::args::DeleteArgs;
use crate::commands::{Out, Session};
use crate::Result;

/// Removes a transaction of the session's user.
pub async fn delete(session: &Session, args: DeleteArgs) -> Result<Out<String>> {
    session
        .store()
        .delete_transaction(args.id(), session.user_id())
        .await?;
    Ok(Out::new(
        format!("Deleted transaction '{}'", args.id()),
        args.id().to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Mode;
    use crate::test::TestEnv;
    use crate::ErrorType;

    #[tokio::test]
    async fn test_delete() {
        let env = TestEnv::new().await;
        let session = Session::open(env.config().clone(), Mode::Test, Some("demo"))
            .await
            .unwrap();
        delete(&session, DeleteArgs::new("seed-02")).await.unwrap();
        assert_eq!(session.store().transactions().len(), 7);
        assert!(session.store().state().get("seed-02").is_none());

        let err = delete(&session, DeleteArgs::new("seed-02"))
            .await
            .unwrap_err();
        assert!(err.is(ErrorType::NotFoundOrForbidden));
        assert_eq!(session.store().transactions().len(), 7);
    }
}
