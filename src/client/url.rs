use crate::models::Project;
use url::Url;

/// Rewrites relative media references against a single storage base.
/// Prefixing is idempotent: absolute URLs pass through untouched.
#[derive(Debug, Clone)]
pub struct UrlPrefixer {
    base: String,
}

impl UrlPrefixer {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn prefix(&self, path: &str) -> String {
        if path.is_empty() {
            return String::new();
        }
        if is_absolute(path) {
            return path.to_string();
        }
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Rewrite every media reference in a project to an absolute URL.
    pub fn rewrite(&self, project: &mut Project) {
        if !project.cover.is_empty() {
            project.cover = self.prefix(&project.cover);
        }
        for item in &mut project.media {
            item.src = self.prefix(&item.src);
        }
    }
}

fn is_absolute(path: &str) -> bool {
    match Url::parse(path) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
