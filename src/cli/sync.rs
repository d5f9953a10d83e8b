use crate::client::PortfolioClient;
use crate::Config;
use anyhow::Result;
use std::path::Path;

/// Exercise the client end to end: fetch the manifest, resolve every
/// project's metadata in batches, and write the grouped portfolio JSON.
pub async fn run(config_path: &Path, output: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let client = PortfolioClient::from_config(&config);

    let portfolio = client.fetch_portfolio().await?;
    let json = serde_json::to_string_pretty(&portfolio)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(
                "Wrote {} project(s) across {} categories to {:?}",
                portfolio.project_count(),
                portfolio.categories.len(),
                path
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
