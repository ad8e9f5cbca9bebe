//! Configuration file handling for sheetbook.
//!
//! The configuration file is stored at `$SHEETBOOK_HOME/config.json` and holds the URL of the
//! transaction service, the request timeout, the store behaviors that depend on the backend, and
//! the category budgets.

use crate::error::{ErrorType, IntoResult, Res, Result};
use crate::model::Budgets;
use crate::store::{IdAssignment, RollbackPolicy, StoreOptions};
use crate::utils;
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "sheetbook";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$SHEETBOOK_HOME` and from there it loads `$SHEETBOOK_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory and an initial `config.json` that points at `api_url`, with
    /// default settings for everything else.
    ///
    /// # Errors
    /// - `ErrorType::Config` if `api_url` is not an http(s) URL, if the directory already holds a
    ///   config file, or if any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, api_url: &str) -> Result<Self> {
        Self::try_create(dir.into(), api_url)
            .await
            .pub_result(ErrorType::Config)
    }

    /// Loads `$SHEETBOOK_HOME/config.json` and validates it.
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        Self::try_load(home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    /// Writes the current settings back to `config.json`.
    pub async fn save(&self) -> Result<()> {
        self.config_file
            .save(&self.config_path)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn try_create(maybe_relative: PathBuf, api_url: &str) -> Res<Self> {
        validate_api_url(api_url)?;
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the sheetbook home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }

        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    async fn try_load(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Sheetbook home is missing, run 'sheetbook init' first")?;
        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn api_url(&self) -> &str {
        &self.config_file.api_url
    }

    /// The timeout applied to every request to the transaction service.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.timeout_secs)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            id_assignment: self.config_file.id_assignment,
            delete_rollback: self.config_file.delete_rollback,
            discard_stale_fetches: self.config_file.discard_stale_fetches,
        }
    }

    pub fn budgets(&self) -> &Budgets {
        &self.config_file.budgets
    }

    /// Sets the monthly spending limit of `category`. Call `save` to persist it.
    pub fn set_budget(&mut self, category: impl Into<String>, limit: f64) -> Result<()> {
        let category = category.into();
        check_budget(&category, limit).pub_result(ErrorType::Validation)?;
        self.config_file.budgets.insert(category, limit);
        Ok(())
    }

    /// Removes the budget of `category`, returning whether there was one.
    pub fn remove_budget(&mut self, category: &str) -> bool {
        self.config_file.budgets.remove(category).is_some()
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "sheetbook",
///   "config_version": 1,
///   "api_url": "https://script.google.com/macros/s/AKfycbx/exec",
///   "timeout_secs": 10,
///   "id_assignment": "client",
///   "delete_rollback": "snapshot",
///   "discard_stale_fetches": false,
///   "budgets": { "Alimentação": 800.0 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "sheetbook"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the transaction service
    api_url: String,

    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,

    #[serde(default)]
    id_assignment: IdAssignment,

    #[serde(default)]
    delete_rollback: RollbackPolicy,

    #[serde(default)]
    discard_stale_fetches: bool,

    /// Monthly spending limit per expense category
    #[serde(default, skip_serializing_if = "Budgets::is_empty")]
    budgets: Budgets,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let options = StoreOptions::default();
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            id_assignment: options.id_assignment,
            delete_rollback: options.delete_rollback,
            discard_stale_fetches: options.discard_stale_fetches,
            budgets: Budgets::new(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path` and validates it.
    async fn load(path: &Path) -> Res<Self> {
        let config: ConfigFile = utils::deserialize(path).await?;
        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {}, expected {}",
            config.config_version,
            CONFIG_VERSION
        );
        ensure!(config.timeout_secs > 0, "timeout_secs must be at least 1");
        validate_api_url(&config.api_url)?;
        for (category, limit) in &config.budgets {
            check_budget(category, *limit)?;
        }
        Ok(config)
    }

    async fn save(&self, path: &Path) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// The transaction service must be reachable over http or https.
fn validate_api_url(api_url: &str) -> Res<Url> {
    let url = Url::parse(api_url).with_context(|| format!("Invalid api_url '{api_url}'"))?;
    ensure!(
        matches!(url.scheme(), "http" | "https"),
        "The api_url must use http or https, got '{}'",
        url.scheme()
    );
    Ok(url)
}

fn check_budget(category: &str, limit: f64) -> Res<()> {
    ensure!(!category.trim().is_empty(), "A budget needs a category");
    ensure!(
        limit.is_finite() && limit >= 0.0,
        "The budget for '{category}' must be a non-negative number, got {limit}"
    );
    Ok(())
}
