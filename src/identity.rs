//! The identity provider: who is signed in. Authentication itself happens elsewhere; this crate only
//! needs a stable user id, a way to hear about sign-in and sign-out, and a way to sign out.

use crate::error::{Error, ErrorType, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

/// The capabilities the rest of the crate needs from an identity provider.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<User>;

    /// A receiver that is notified on every sign-in and sign-out.
    fn subscribe(&self) -> watch::Receiver<Option<User>>;

    /// Signs the current user out.
    async fn sign_out(&self) -> Result<()>;
}

/// An `IdentityProvider` whose user is set directly, e.g. from the command line.
#[derive(Debug)]
pub struct LocalIdentity {
    user: watch::Sender<Option<User>>,
}

impl LocalIdentity {
    /// Creates a `LocalIdentity` with nobody signed in.
    pub fn new() -> Self {
        let (user, _) = watch::channel(None);
        Self { user }
    }

    /// Creates a `LocalIdentity` with `user` signed in.
    pub fn signed_in(user: User) -> Self {
        let identity = Self::new();
        identity.sign_in(user);
        identity
    }

    /// Signs `user` in, replacing whoever was signed in before.
    pub fn sign_in(&self, user: User) {
        info!("Signed in as {}", user.uid());
        self.user.send_replace(Some(user));
    }
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    async fn sign_out(&self) -> Result<()> {
        match self.user.send_replace(None) {
            Some(user) => {
                debug!("Signed out {}", user.uid());
                Ok(())
            }
            None => Err(Error::msg(
                ErrorType::Unauthenticated,
                "Cannot sign out because nobody is signed in",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let identity = LocalIdentity::new();
        assert!(identity.current_user().is_none());

        let mut rx = identity.subscribe();
        identity.sign_in(User::new("u1").with_email("u1@example.com"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(User::uid), Some("u1"));
        assert_eq!(
            identity.current_user().unwrap().email(),
            Some("u1@example.com")
        );

        identity.sign_out().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_without_user_fails() {
        let identity = LocalIdentity::new();
        let err = identity.sign_out().await.unwrap_err();
        assert!(err.is(ErrorType::Unauthenticated));
    }
}
