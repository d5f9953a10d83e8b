use crate::models::now_rfc3339;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Explicit application state the dashboard used to keep in browser
/// session/local storage: the unlocked flag gating admin views and a cached
/// geolocation country code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub dashboard_unlocked: bool,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl SessionState {
    /// Load saved state; a missing file is a fresh session.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("parsing session state '{}'", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("reading session state '{}'", path.display()))
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("writing session state '{}'", path.display()))
    }

    pub fn unlock(&mut self) {
        self.dashboard_unlocked = true;
        self.updated_at = Some(now_rfc3339());
    }

    pub fn lock(&mut self) {
        self.dashboard_unlocked = false;
        self.updated_at = Some(now_rfc3339());
    }

    pub fn set_country_code(&mut self, code: impl Into<String>) {
        self.country_code = Some(code.into());
        self.updated_at = Some(now_rfc3339());
    }
}
