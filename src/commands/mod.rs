//! Command handlers for the sheetbook CLI.
//!
//! This module contains implementations for all CLI subcommands. Every command that touches
//! transactions runs against a `Session`, which plays the part of the user interface: it signs in
//! the user from the command line, builds the `Store` and loads it.

mod budget;
mod delete;
mod init;
mod insert;
mod query;
mod update;

use crate::api::{self, Mode};
use crate::identity::{LocalIdentity, User};
use crate::store::Store;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info};

pub use budget::budget;
pub use delete::delete;
pub use init::init;
pub use insert::add;
pub use query::{categories, list, summary};
pub use update::update;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// A loaded store for the user given on the command line.
pub struct Session {
    config: Config,
    store: Arc<Store>,
    user_id: String,
}

impl Session {
    /// Signs in `user` (if any), connects to the transaction service selected by `mode`, and
    /// fetches the user's transactions.
    ///
    /// Without a user the session is unauthenticated: the store stays empty and every mutation
    /// fails with `ErrorType::Unauthenticated`.
    pub async fn open(config: Config, mode: Mode, user: Option<&str>) -> Result<Self> {
        let api = api::api(&config, mode)?;
        let identity = Arc::new(LocalIdentity::new());
        if let Some(uid) = user {
            identity.sign_in(User::new(uid));
        }
        let store = Arc::new(Store::new(api, identity, config.store_options()));
        let user_id = user.unwrap_or_default().to_string();
        store.fetch_transactions(&user_id).await?;
        Ok(Self {
            config,
            store,
            user_id,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// "1 transaction", "2 transactions"
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
