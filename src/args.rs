//! These structs provide the CLI interface for the sheetbook CLI.

use crate::model::{parse_amount, parse_date, TransactionType};
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// sheetbook: track your income and expenses in a spreadsheet.
///
/// Transactions live in a spreadsheet behind a small REST service. This program lists them, adds,
/// edits and removes them, and shows a summary of your balance and your spending per category
/// against the budgets you set.
///
/// Run `sheetbook init --api-url URL` first. Every other command acts on behalf of the user given
/// with --user or SHEETBOOK_USER.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and the configuration file.
    ///
    /// The API URL is the address of the REST service that fronts your spreadsheet. If you are
    /// not sure it is right, try `sheetbook list`: a wrong URL usually answers with a web page,
    /// which is reported as a configuration problem.
    Init(InitArgs),
    /// List your transactions.
    List(ListArgs),
    /// Add a transaction.
    Add(AddArgs),
    /// Change a transaction. Fields that are not given keep their current value.
    Update(UpdateArgs),
    /// Remove a transaction.
    Delete(DeleteArgs),
    /// Show total income, total expenses, balance and expenses by category.
    Summary,
    /// Show spending per category against its budget, optionally setting budgets first.
    Budget(BudgetArgs),
    /// Show the recommended categories.
    Categories(CategoriesArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where sheetbook configuration is held. Defaults to ~/sheetbook
    #[arg(long, env = "SHEETBOOK_HOME", default_value_t = default_sheetbook_home())]
    sheetbook_home: DisplayPath,

    /// The id of the signed-in user. Without it, only `init` and `categories` are useful.
    #[arg(long, env = "SHEETBOOK_USER")]
    user: Option<String>,
}

impl Common {
    pub fn new(log_level: LevelFilter, sheetbook_home: PathBuf, user: Option<String>) -> Self {
        Self {
            log_level,
            sheetbook_home: sheetbook_home.into(),
            user,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn sheetbook_home(&self) -> &DisplayPath {
        &self.sheetbook_home
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

/// Args for the `sheetbook init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of the transaction service, e.g. https://script.google.com/macros/s/ID/exec
    #[arg(long)]
    api_url: String,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// Args for the `sheetbook list` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ListArgs {
    /// Only show income or only show expenses.
    #[arg(long = "type", value_enum)]
    kind: Option<TransactionType>,

    /// Only show this category.
    #[arg(long)]
    category: Option<String>,
}

impl ListArgs {
    pub fn new(kind: Option<TransactionType>, category: Option<String>) -> Self {
        Self { kind, category }
    }

    pub fn kind(&self) -> Option<TransactionType> {
        self.kind
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// Args for the `sheetbook add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    #[arg(long)]
    description: String,

    /// The amount, either `1234.56` or in the Brazilian format `1.234,56`.
    #[arg(long, value_parser = parse_amount_arg)]
    amount: f64,

    /// The date as YYYY-MM-DD. Defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    #[arg(long)]
    category: String,

    #[arg(long = "type", value_enum, default_value_t = TransactionType::Expense)]
    kind: TransactionType,
}

impl AddArgs {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        date: Option<NaiveDate>,
        category: impl Into<String>,
        kind: TransactionType,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
            category: category.into(),
            kind,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }
}

/// Args for the `sheetbook update` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct UpdateArgs {
    /// The id of the transaction to change.
    #[arg(long)]
    id: String,

    #[arg(long)]
    description: Option<String>,

    /// The amount, either `1234.56` or in the Brazilian format `1.234,56`.
    #[arg(long, value_parser = parse_amount_arg)]
    amount: Option<f64>,

    /// The date as YYYY-MM-DD.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long = "type", value_enum)]
    kind: Option<TransactionType>,
}

impl UpdateArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn kind(&self) -> Option<TransactionType> {
        self.kind
    }
}

/// Args for the `sheetbook delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The id of the transaction to remove.
    #[arg(long)]
    id: String,
}

impl DeleteArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Args for the `sheetbook budget` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct BudgetArgs {
    /// Set the budget of a category, e.g. --set "Alimentação=800". May be repeated.
    #[arg(long = "set", value_parser = parse_budget_arg)]
    set: Vec<(String, f64)>,

    /// Remove the budget of a category. May be repeated.
    #[arg(long = "remove")]
    remove: Vec<String>,
}

impl BudgetArgs {
    pub fn new(set: Vec<(String, f64)>, remove: Vec<String>) -> Self {
        Self { set, remove }
    }

    pub fn set(&self) -> &[(String, f64)] {
        &self.set
    }

    pub fn remove(&self) -> &[String] {
        &self.remove
    }
}

/// Args for the `sheetbook categories` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct CategoriesArgs {
    /// Only show the categories for this type.
    #[arg(long = "type", value_enum)]
    kind: Option<TransactionType>,
}

impl CategoriesArgs {
    pub fn new(kind: Option<TransactionType>) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> Option<TransactionType> {
        self.kind
    }
}

/// Accepts a plain decimal (`1234.56`) or a Brazilian-formatted amount (`1.234,56`).
fn parse_amount_arg(s: &str) -> anyhow::Result<f64> {
    let s = s.trim();
    if s.contains(',') {
        let amount = parse_amount(s);
        if amount == 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
            return Err(anyhow!("Unable to parse the amount '{s}'"));
        }
        return Ok(amount);
    }
    f64::from_str(s).with_context(|| format!("Unable to parse the amount '{s}'"))
}

/// Parses `CATEGORY=LIMIT`.
fn parse_budget_arg(s: &str) -> anyhow::Result<(String, f64)> {
    let (category, limit) = s
        .rsplit_once('=')
        .with_context(|| format!("Expected CATEGORY=LIMIT but got '{s}'"))?;
    Ok((category.trim().to_string(), parse_amount_arg(limit)?))
}

fn default_sheetbook_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("sheetbook"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --sheetbook-home or SHEETBOOK_HOME instead of relying on the \
                default sheetbook home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("sheetbook")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
