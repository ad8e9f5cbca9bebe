//! sheetbook keeps a user's income and expense transactions in a spreadsheet that sits behind a
//! small REST service.
//!
//! The pieces are:
//! - `normalize`: turns the service's inconsistent response bodies into `model::Transaction`s
//! - `store`: the in-memory copy of the signed-in user's transactions and every mutation of it
//! - `api`: the `TransactionApi` seam with an HTTP client and an in-memory stand-in
//! - `identity`: who is signed in
//!
//! The `sheetbook` binary drives these through the `commands` module.

pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod identity;
pub mod model;
pub mod normalize;
pub mod store;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::{Error, ErrorType, Result};
