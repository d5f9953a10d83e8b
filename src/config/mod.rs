use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally reachable base URL for presigned upload targets.
    /// Defaults to http://{host}:{port}.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

impl ServerConfig {
    pub fn public_base(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for stored objects (metadata and uploaded media).
    pub data_dir: String,
    /// Public base URL relative media references resolve against,
    /// e.g. "http://127.0.0.1:8080/media" or a CDN origin.
    pub base_url: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API base for the client library and the `sync` command. When unset,
    /// the client reads the manifest and metadata straight from storage.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Shared password for admin mutations. Overridden by the
    /// VITRINE_ADMIN_PASSWORD environment variable.
    #[serde(default)]
    pub admin_password: Option<String>,
    pub upload_signing_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_upload")]
    pub max_size_bytes: usize,
    #[serde(default = "default_url_ttl")]
    pub url_ttl_secs: i64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_upload(),
            url_ttl_secs: default_url_ttl(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload() -> usize {
    200 * 1024 * 1024
}

fn default_url_ttl() -> i64 {
    3600
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Are you in a Vitrine site directory?",
                path.display(),
                e
            )
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.upload_signing_key.trim().is_empty() {
            anyhow::bail!("auth.upload_signing_key must not be empty");
        }
        if self.storage.base_url.trim().is_empty() {
            anyhow::bail!("storage.base_url must not be empty");
        }
        if self.upload.url_ttl_secs <= 0 {
            anyhow::bail!("upload.url_ttl_secs must be greater than 0");
        }
        if self.upload.max_size_bytes == 0 {
            anyhow::bail!("upload.max_size_bytes must be greater than 0");
        }
        Ok(())
    }

    /// Admin password with the environment override applied.
    pub fn admin_password(&self) -> Option<String> {
        std::env::var("VITRINE_ADMIN_PASSWORD")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.auth.admin_password.clone())
    }
}
