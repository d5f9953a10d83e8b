use anyhow::Result;
use base64::Engine;
use rand::RngCore;
use std::path::PathBuf;

pub async fn run(path: PathBuf, name: Option<String>) -> Result<()> {
    let site_name = name.unwrap_or_else(|| "My Portfolio".to_string());

    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(path.join("data"))?;

    let mut key_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key_bytes);
    let signing_key = base64::engine::general_purpose::STANDARD.encode(key_bytes);

    let config = format!(
        r#"[site]
title = "{}"
description = "An interior design portfolio"

[server]
host = "127.0.0.1"
port = 8080

[storage]
data_dir = "./data"
base_url = "http://127.0.0.1:8080/media"

[api]
base_url = "http://127.0.0.1:8080"

[auth]
# Set the admin password here or via VITRINE_ADMIN_PASSWORD.
# admin_password = ""
upload_signing_key = "{}"

[upload]
max_size_bytes = 209715200
url_ttl_secs = 3600
"#,
        site_name, signing_key
    );

    std::fs::write(path.join("vitrine.toml"), config)?;

    tracing::info!("Created new Vitrine site at {:?}", path);
    tracing::info!("Set an admin password, then run 'vitrine serve' to start the API");

    Ok(())
}
