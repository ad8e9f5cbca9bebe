use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the data directory and an initial `config.json` pointing at `api_url`.
///
/// # Arguments
/// - `sheetbook_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/sheetbook`
/// - `api_url` - The URL of the transaction service.
///
/// # Errors
/// - `ErrorType::Config` if the URL is not valid, the directory is already initialized, or any
///   file operation fails.
pub async fn init(sheetbook_home: &Path, api_url: &str) -> Result<Out<()>> {
    let config = Config::create(sheetbook_home, api_url).await?;
    Ok(format!(
        "Successfully created the sheetbook configuration at {}",
        config.config_path().display()
    )
    .into())
}
