use crate::{web, Config, Store};
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, host: &str, port: u16) -> Result<()> {
    let config = Config::load(config_path)?;
    let store = Store::open(&config.storage.data_dir)?;

    if config.admin_password().is_none() {
        tracing::warn!("No admin password configured; all admin mutations will be rejected");
    }

    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server at http://{}", addr);

    web::serve(config, store, &addr).await?;

    Ok(())
}
