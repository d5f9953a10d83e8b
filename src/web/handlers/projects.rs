use crate::models::{
    now_rfc3339, Category, CreateProject, ManifestEntry, Project, UpdateProject, UploadFileSpec,
};
use crate::services::{manifest, presign, project};
use crate::web::extractors::AdminAuth;
use crate::web::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

fn not_found(msg: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": msg})),
    )
        .into_response()
}

fn bad_request(msg: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": msg})),
    )
        .into_response()
}

fn internal_error(context: &str, err: anyhow::Error) -> Response {
    tracing::error!("{}: {:?}", context, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "Internal server error"})),
    )
        .into_response()
}

/// Unknown categories surface as a missing project, not a routing error.
fn parse_category(raw: &str) -> Result<Category, Response> {
    Category::from_str(raw).map_err(|_| not_found("Project not found"))
}

/// Stored ids are always slug-shaped, so anything else cannot exist. Checked
/// before the store is touched; an out-of-charset id would otherwise fail
/// key validation and read as a server error.
fn parse_project_ref(raw_category: &str, id: &str) -> Result<Category, Response> {
    let category = parse_category(raw_category)?;
    if !project::valid_id(id) {
        return Err(not_found("Project not found"));
    }
    Ok(category)
}

/// GET /projects
pub async fn get_manifest(State(state): State<Arc<AppState>>) -> Response {
    match manifest::load(&state.store) {
        Ok(manifest) => Json(manifest).into_response(),
        Err(e) => internal_error("Failed to load manifest", e),
    }
}

/// GET /projects/:category/:id
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path((category, id)): Path<(String, String)>,
) -> Response {
    let category = match parse_project_ref(&category, &id) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match project::get(&state.store, category, &id) {
        Ok(Some(project)) => Json(project).into_response(),
        Ok(None) => not_found("Project not found"),
        Err(e) => internal_error("Failed to load project metadata", e),
    }
}

/// POST /projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Json(req): Json<CreateProject>,
) -> Response {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return bad_request("Missing required field: title");
    }

    let id = match req.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => project::generate_id(&title),
    };
    if !project::valid_id(&id) {
        return bad_request("Could not derive a valid project id from the title");
    }

    let mut manifest = match manifest::load(&state.store) {
        Ok(m) => m,
        Err(e) => return internal_error("Failed to load manifest", e),
    };
    if manifest.find_entry(req.category, &id).is_some() {
        let msg = format!(
            "Project with id '{}' already exists in category '{}'",
            id, req.category
        );
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": msg})),
        )
            .into_response();
    }

    let new_project = Project {
        id: id.clone(),
        title,
        category: req.category,
        area: req.area.trim().to_string(),
        description: req.description.trim().to_string(),
        cover: String::new(),
        media: Vec::new(),
        created_at: now_rfc3339(),
        updated_at: None,
    };

    if let Err(e) = project::save(&state.store, &new_project) {
        return internal_error("Failed to save project metadata", e);
    }

    manifest::add_entry(
        &mut manifest,
        ManifestEntry {
            id: id.clone(),
            category: req.category,
            path: project::project_prefix(req.category, &id),
            title: Some(new_project.title.clone()),
        },
    );
    if let Err(e) = manifest::save(&state.store, &mut manifest) {
        // Roll the metadata object back so the store stays consistent with
        // the manifest.
        let _ = state
            .store
            .delete(&project::metadata_key(req.category, &id));
        return internal_error("Failed to update manifest", e);
    }

    let upload_urls = presign::upload_targets(&state.config, req.category, &id, &req.files);
    tracing::info!("Created project {}/{}", req.category, id);
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Project created",
            "project": new_project,
            "uploadUrls": upload_urls,
        })),
    )
        .into_response()
}

/// PUT /projects/:category/:id
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path((category, id)): Path<(String, String)>,
    Json(req): Json<UpdateProject>,
) -> Response {
    let category = match parse_project_ref(&category, &id) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return bad_request("Missing required field: title");
        }
    }

    let mut existing = match project::get(&state.store, category, &id) {
        Ok(Some(p)) => p,
        Ok(None) => return not_found("Project not found"),
        Err(e) => return internal_error("Failed to load project metadata", e),
    };

    existing.apply_update(&req);
    existing.updated_at = Some(now_rfc3339());

    if let Err(e) = project::save(&state.store, &existing) {
        return internal_error("Failed to save project metadata", e);
    }

    // Keep the manifest entry's display title in step with the metadata, so
    // placeholders built from the entry show the current name.
    if req.title.is_some() {
        let mut manifest = match manifest::load(&state.store) {
            Ok(m) => m,
            Err(e) => return internal_error("Failed to load manifest", e),
        };
        manifest::retitle_entry(&mut manifest, category, &id, &existing.title);
        if let Err(e) = manifest::save(&state.store, &mut manifest) {
            return internal_error("Failed to update manifest", e);
        }
    }

    let upload_urls = presign::upload_targets(&state.config, category, &id, &req.files);
    Json(serde_json::json!({
        "message": "Project updated",
        "project": existing,
        "uploadUrls": upload_urls,
    }))
    .into_response()
}

/// DELETE /projects/:category/:id
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path((category, id)): Path<(String, String)>,
) -> Response {
    let category = match parse_project_ref(&category, &id) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    if let Err(e) = project::delete_objects(&state.store, category, &id) {
        return internal_error("Failed to delete project objects", e);
    }

    let mut manifest = match manifest::load(&state.store) {
        Ok(m) => m,
        Err(e) => return internal_error("Failed to load manifest", e),
    };
    manifest::remove_entry(&mut manifest, category, &id);
    if let Err(e) = manifest::save(&state.store, &mut manifest) {
        return internal_error("Failed to update manifest", e);
    }

    tracing::info!("Deleted project {}/{}", category, id);
    Json(serde_json::json!({"message": "Project deleted"})).into_response()
}

#[derive(Deserialize)]
pub struct UploadUrlsRequest {
    #[serde(default)]
    pub files: Vec<UploadFileSpec>,
}

/// POST /projects/:category/:id/upload-urls
pub async fn upload_urls(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path((category, id)): Path<(String, String)>,
    Json(req): Json<UploadUrlsRequest>,
) -> Response {
    let category = match parse_project_ref(&category, &id) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let targets = presign::upload_targets(&state.config, category, &id, &req.files);
    Json(serde_json::json!({"uploadUrls": targets})).into_response()
}
