//! The remote transaction service: a REST proxy in front of a spreadsheet.
//!
//! `TransactionApi` is the seam between the `Store` and the network. It returns response bodies
//! classified as `RawResponse` and leaves all interpretation to the caller, so the in-memory
//! implementation can reproduce the service's inconsistencies faithfully.

mod http_api;
mod memory_api;

use crate::error::{ErrorType, IntoResult, Result};
use crate::model::Transaction;
use crate::normalize::RawResponse;
use crate::Config;
use std::sync::Arc;

pub use http_api::HttpApi;
pub use memory_api::{Failure, ListShape, MemoryApi};

/// When this environment variable is set and non-empty, `Mode::from_env` returns `Mode::Test`.
pub const TEST_MODE_ENV: &str = "SHEETBOOK_IN_TEST_MODE";

/// Operations offered by the spreadsheet proxy. Every operation is scoped by a user id.
///
/// Implementations report transport problems as `ErrorType::Timeout` or `ErrorType::Network`, and
/// an HTML error page as `ErrorType::UpstreamMisconfigured`. Everything else is returned as a
/// `RawResponse`.
#[async_trait::async_trait]
pub trait TransactionApi: Send + Sync {
    /// `GET /?userId={user_id}`
    async fn list(&self, user_id: &str) -> Result<RawResponse>;

    /// `POST /` with the full record. Answers with an array holding the created record.
    async fn create(&self, transaction: &Transaction) -> Result<RawResponse>;

    /// `PUT /?id={id}&userId={user_id}` with the full record. An empty array means that nothing
    /// matched the `id` + `user_id` pair.
    async fn update(
        &self,
        id: &str,
        user_id: &str,
        transaction: &Transaction,
    ) -> Result<RawResponse>;

    /// `DELETE /?id={id}&userId={user_id}`. Answers with `{"deleted": 0|1}`.
    async fn delete(&self, id: &str, user_id: &str) -> Result<RawResponse>;
}

/// Selects which `TransactionApi` the program talks to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Use the HTTP service at the configured URL.
    #[default]
    Http,
    /// Use a seeded in-memory service so the program can run without a backend.
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// Creates the `TransactionApi` for `mode`.
pub fn api(config: &Config, mode: Mode) -> Result<Arc<dyn TransactionApi>> {
    Ok(match mode {
        Mode::Http => Arc::new(HttpApi::new(config.api_url(), config.timeout())?),
        Mode::Test => Arc::new(MemoryApi::seeded().pub_result(ErrorType::Config)?),
    })
}
