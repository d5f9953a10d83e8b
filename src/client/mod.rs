//! Client side of the portfolio API: manifest fetch, batched metadata
//! resolution with retry and URL rewriting, admin mutations, and the
//! presigned-URL uploader. This is what the dashboard and the public
//! gallery consume.

mod error;
pub mod retry;
pub mod session;
pub mod url;

pub use error::{ClientError, ClientResult};
pub use retry::RetryPolicy;
pub use session::SessionState;
pub use url::UrlPrefixer;

use crate::models::{
    Category, CreateProject, Manifest, ManifestEntry, Project, ProjectDraft, UpdateProject,
    UploadFileSpec, UploadKind, UploadTarget,
};
use crate::Config;
use bytes::Bytes;
use futures_util::future::join_all;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

pub const ADMIN_PASSWORD_HEADER: &str = "X-Admin-Password";
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Metadata fetches run in groups of this size, groups sequentially, to
/// bound concurrent load on the backend.
pub const BATCH_SIZE: usize = 3;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Response body for create and update mutations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub message: String,
    pub project: Project,
    #[serde(default)]
    pub upload_urls: Vec<UploadTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlsResponse {
    #[serde(default)]
    upload_urls: Vec<UploadTarget>,
}

/// One category's slice of the aggregated portfolio.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryListing {
    pub title: String,
    pub description: String,
    pub projects: Vec<Project>,
}

/// The fully resolved portfolio, grouped per category with manifest order
/// preserved inside each group.
#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub categories: BTreeMap<Category, CategoryListing>,
}

impl Portfolio {
    pub fn project_count(&self) -> usize {
        self.categories.values().map(|c| c.projects.len()).sum()
    }
}

pub struct PortfolioClient {
    http: reqwest::Client,
    api_base: Option<String>,
    prefixer: UrlPrefixer,
    admin_password: Option<String>,
    retry: RetryPolicy,
}

impl PortfolioClient {
    /// `api_base` is the REST API root; when absent the client falls back to
    /// reading the manifest and metadata straight from the storage base.
    pub fn new(api_base: Option<&str>, storage_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.map(|b| b.trim_end_matches('/').to_string()),
            prefixer: UrlPrefixer::new(storage_base),
            admin_password: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut client = Self::new(config.api.base_url.as_deref(), &config.storage.base_url);
        if let Some(password) = config.admin_password() {
            client = client.with_admin_password(password);
        }
        client
    }

    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = Some(password.into());
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn prefixer(&self) -> &UrlPrefixer {
        &self.prefixer
    }

    fn api_url(&self, path: &str) -> ClientResult<String> {
        match &self.api_base {
            Some(base) => Ok(format!("{}{}", base, path)),
            None => Err(ClientError::Validation(
                "no API base configured for admin operations".to_string(),
            )),
        }
    }

    /// Attach the shared admin credential and a fresh request id.
    fn admin(&self, request: reqwest::RequestBuilder) -> ClientResult<reqwest::RequestBuilder> {
        let password = self.admin_password.as_ref().ok_or_else(|| {
            ClientError::Validation("admin password is not configured".to_string())
        })?;
        Ok(request
            .header(ADMIN_PASSWORD_HEADER, password)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string()))
    }

    /// Fetch the project manifest. Transport errors propagate; there is no
    /// retry at this layer.
    pub async fn fetch_manifest(&self) -> ClientResult<Manifest> {
        let url = match &self.api_base {
            Some(base) => format!("{}/projects", base),
            None => self.prefixer.prefix(crate::services::manifest::MANIFEST_KEY),
        };
        let response = self.http.get(&url).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_for_status(response).await)
        }
    }

    /// Resolve one project's metadata, retrying throttling and transport
    /// failures with bounded exponential backoff. Every media reference in
    /// the result is rewritten to an absolute URL.
    pub async fn fetch_project(&self, category: Category, id: &str) -> ClientResult<Project> {
        let mut attempt = 0;
        loop {
            match self.fetch_project_once(category, id).await {
                Ok(mut project) => {
                    self.prefixer.rewrite(&mut project);
                    return Ok(project);
                }
                Err(e) if e.is_transient_fetch() && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    tracing::debug!(
                        "Retrying {}/{} in {:?} after: {}",
                        category,
                        id,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_project_once(&self, category: Category, id: &str) -> ClientResult<Project> {
        let url = match &self.api_base {
            Some(base) => format!("{}/projects/{}/{}", base, category, id),
            None => self
                .prefixer
                .prefix(&format!("projects/{}/{}/metadata.json", category, id)),
        };
        let response = self.http.get(&url).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_for_status(response).await)
        }
    }

    /// Resolve every manifest entry, batched. Input order is preserved in
    /// the output regardless of per-item latency; an entry whose resolution
    /// fails after retry exhaustion degrades to a placeholder instead of
    /// aborting the listing.
    pub async fn resolve_manifest(&self, manifest: &Manifest) -> Vec<Project> {
        let mut projects = Vec::with_capacity(manifest.projects.len());
        for chunk in manifest.projects.chunks(BATCH_SIZE) {
            let batch = join_all(chunk.iter().map(|entry| self.resolve_entry(entry))).await;
            projects.extend(batch);
        }
        projects
    }

    async fn resolve_entry(&self, entry: &ManifestEntry) -> Project {
        match self.fetch_project(entry.category, &entry.id).await {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!("Failed to resolve {}/{}: {}", entry.category, entry.id, e);
                Project::placeholder(entry)
            }
        }
    }

    /// Fetch the manifest and resolve it into the grouped portfolio shape
    /// the gallery renders from.
    pub async fn fetch_portfolio(&self) -> ClientResult<Portfolio> {
        let manifest = self.fetch_manifest().await?;
        let projects = self.resolve_manifest(&manifest).await;

        let infos = if manifest.categories.is_empty() {
            Manifest::default_categories()
        } else {
            manifest.categories.clone()
        };
        let mut categories: BTreeMap<Category, CategoryListing> = infos
            .into_iter()
            .map(|(category, info)| {
                (
                    category,
                    CategoryListing {
                        title: info.title,
                        description: info.description,
                        projects: Vec::new(),
                    },
                )
            })
            .collect();

        for project in projects {
            let listing = categories
                .entry(project.category)
                .or_insert_with(|| CategoryListing {
                    title: project.category.default_title().to_string(),
                    description: project.category.default_description().to_string(),
                    projects: Vec::new(),
                });
            listing.projects.push(project);
        }

        Ok(Portfolio { categories })
    }

    /// Create a project. The draft is validated locally first; an invalid
    /// draft never reaches the network.
    pub async fn create_project(&self, draft: &ProjectDraft) -> ClientResult<MutationResponse> {
        validate_draft(draft, false)?;
        let body = CreateProject {
            title: draft.title.trim().to_string(),
            category: draft.category,
            id: None,
            area: draft.area.trim().to_string(),
            description: draft.description.trim().to_string(),
            files: draft.files.clone(),
        };
        let url = self.api_url("/projects")?;
        let request = self.admin(self.http.post(&url))?.json(&body);
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_for_status(response).await)
        }
    }

    /// Update project metadata. An explicitly empty title is rejected
    /// locally.
    pub async fn update_project(
        &self,
        category: Category,
        id: &str,
        update: &UpdateProject,
    ) -> ClientResult<MutationResponse> {
        if let Some(title) = &update.title {
            if title.trim().is_empty() {
                return Err(ClientError::Validation(
                    "a project title is required".to_string(),
                ));
            }
        }
        let url = self.api_url(&format!("/projects/{}/{}", category, id))?;
        let request = self.admin(self.http.put(&url))?.json(update);
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_for_status(response).await)
        }
    }

    /// Delete a project, retrying server errors with the same backoff as
    /// metadata fetch.
    pub async fn delete_project(&self, category: Category, id: &str) -> ClientResult<()> {
        let mut attempt = 0;
        loop {
            match self.delete_project_once(category, id).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient_delete() && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    tracing::debug!(
                        "Retrying delete of {}/{} in {:?} after: {}",
                        category,
                        id,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn delete_project_once(&self, category: Category, id: &str) -> ClientResult<()> {
        let url = self.api_url(&format!("/projects/{}/{}", category, id))?;
        let request = self.admin(self.http.delete(&url))?;
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_for_status(response).await)
        }
    }

    /// Request presigned upload targets for new media files.
    pub async fn request_upload_urls(
        &self,
        category: Category,
        id: &str,
        files: &[UploadFileSpec],
    ) -> ClientResult<Vec<UploadTarget>> {
        let url = self.api_url(&format!("/projects/{}/{}/upload-urls", category, id))?;
        let body = serde_json::json!({ "files": files });
        let request = self.admin(self.http.post(&url))?.json(&body);
        let response = request.send().await?;
        if response.status().is_success() {
            let parsed: UploadUrlsResponse = response.json().await?;
            Ok(parsed.upload_urls)
        } else {
            Err(error_for_status(response).await)
        }
    }

    /// Stream one file to a presigned URL, reporting progress as
    /// (bytes sent, total). Resolves on 2xx; no retry, no resumability.
    pub async fn upload_file(
        &self,
        upload_url: &str,
        path: &Path,
        on_progress: Option<ProgressFn>,
    ) -> ClientResult<()> {
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();

        let stream = futures_util::stream::unfold((file, 0u64), move |(mut file, sent)| {
            let progress = on_progress.clone();
            async move {
                let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
                match file.read(&mut buf).await {
                    Ok(0) => None,
                    Ok(n) => {
                        buf.truncate(n);
                        let sent = sent + n as u64;
                        if let Some(callback) = &progress {
                            callback(sent, total);
                        }
                        Some((Ok::<Bytes, std::io::Error>(Bytes::from(buf)), (file, sent)))
                    }
                    Err(e) => Some((Err(e), (file, sent))),
                }
            }
        });

        let response = self
            .http
            .put(upload_url)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::Upload(response.status().as_u16()))
        }
    }
}

/// Client-side validation applied before a create request goes out: a title
/// is always required, and a new project needs a cover file among its
/// uploads. Editing an existing project keeps its stored cover.
pub fn validate_draft(draft: &ProjectDraft, editing: bool) -> ClientResult<()> {
    if draft.title.trim().is_empty() {
        return Err(ClientError::Validation(
            "a project title is required".to_string(),
        ));
    }
    if !editing && !draft.files.iter().any(|f| f.kind == UploadKind::Cover) {
        return Err(ClientError::Validation(
            "a cover video is required for a new project".to_string(),
        ));
    }
    Ok(())
}

/// Map a non-success response to the error taxonomy, pulling the message
/// from the JSON error body when one is present.
async fn error_for_status(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    match status.as_u16() {
        400 => ClientError::Validation(message),
        401 => ClientError::Unauthorized,
        404 => ClientError::NotFound(message),
        409 => ClientError::Conflict(message),
        503 => ClientError::Throttled,
        s => ClientError::Server { status: s, message },
    }
}
