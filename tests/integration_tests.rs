use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vitrine::client::{ClientError, PortfolioClient, RetryPolicy};
use vitrine::config::{
    ApiConfig, AuthConfig, ServerConfig, SiteConfig, StorageConfig, UploadConfig,
};
use vitrine::models::{
    Category, Manifest, ManifestEntry, MediaItem, MediaKind, UpdateProject, UploadFileSpec,
    UploadKind,
};
use vitrine::{Config, Store};

const ADMIN_PASSWORD: &str = "integration-admin";

fn temp_root(tag: &str) -> PathBuf {
    use rand::Rng;
    let id: u32 = rand::thread_rng().gen();
    std::env::temp_dir().join(format!("vitrine_{}_{}", tag, id))
}

fn site_config(root: &FsPath, addr: SocketAddr) -> Config {
    Config {
        site: SiteConfig {
            title: "Test Site".to_string(),
            description: "Integration test site".to_string(),
        },
        server: ServerConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            public_url: Some(format!("http://{}", addr)),
        },
        storage: StorageConfig {
            data_dir: root.display().to_string(),
            base_url: format!("http://{}/media", addr),
        },
        api: ApiConfig {
            base_url: Some(format!("http://{}", addr)),
        },
        auth: AuthConfig {
            admin_password: Some(ADMIN_PASSWORD.to_string()),
            upload_signing_key: "integration-signing-key".to_string(),
        },
        upload: UploadConfig::default(),
    }
}

/// Start the real application on an ephemeral port backed by a fresh store,
/// with a hook to adjust the config before the router is built.
async fn spawn_site_with(tag: &str, tweak: impl FnOnce(&mut Config)) -> (SocketAddr, PathBuf) {
    let root = temp_root(tag);
    let store = Store::open(&root).expect("Failed to open test store");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    let mut config = site_config(&root, addr);
    tweak(&mut config);
    let router = vitrine::web::app(config, store);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, root)
}

async fn spawn_site(tag: &str) -> (SocketAddr, PathBuf) {
    spawn_site_with(tag, |_| {}).await
}

fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(1),
    }
}

fn site_client(addr: SocketAddr) -> PortfolioClient {
    PortfolioClient::new(
        Some(&format!("http://{}", addr)),
        &format!("http://{}/media", addr),
    )
    .with_admin_password(ADMIN_PASSWORD)
    .with_retry_policy(fast_retries())
}

fn cover_draft(title: &str, category: Category) -> vitrine::models::ProjectDraft {
    let mut draft = vitrine::models::ProjectDraft::new(title, category);
    draft
        .files
        .push(UploadFileSpec::new("cover.mp4", UploadKind::Cover));
    draft
}

mod site_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_crud_and_upload_roundtrip() {
        let (addr, root) = spawn_site("crud").await;
        let client = site_client(addr);

        // Create a project; the id comes from the title and a presigned
        // target is issued for the cover.
        let created = client
            .create_project(&cover_draft("Villa Aurora", Category::Fit))
            .await
            .expect("create failed");
        assert_eq!(created.project.id, "villa-aurora");
        assert_eq!(created.project.category, Category::Fit);
        assert_eq!(created.upload_urls.len(), 1);
        let target = &created.upload_urls[0];
        assert_eq!(target.key, "uploads/fit/villa-aurora/cover/cover.mp4");

        // Upload the cover through the presigned URL, watching progress.
        let file_path = root.join("cover-src.mp4");
        let payload = vec![7u8; 150_000];
        std::fs::write(&file_path, &payload).unwrap();

        let last_sent = Arc::new(AtomicU64::new(0));
        let reported_total = Arc::new(AtomicU64::new(0));
        let progress = {
            let last_sent = last_sent.clone();
            let reported_total = reported_total.clone();
            Arc::new(move |sent: u64, total: u64| {
                last_sent.store(sent, Ordering::SeqCst);
                reported_total.store(total, Ordering::SeqCst);
            }) as vitrine::client::ProgressFn
        };
        client
            .upload_file(&target.upload_url, &file_path, Some(progress))
            .await
            .expect("upload failed");
        assert_eq!(last_sent.load(Ordering::SeqCst), payload.len() as u64);
        assert_eq!(reported_total.load(Ordering::SeqCst), payload.len() as u64);

        // The uploaded object is served from the storage surface.
        let media_url = format!("http://{}/media/{}", addr, target.key);
        let served = reqwest::get(&media_url).await.unwrap();
        assert!(served.status().is_success());
        assert_eq!(served.bytes().await.unwrap().as_ref(), &payload[..]);

        // Point the project at the uploaded cover and add a media item.
        let updated = client
            .update_project(
                Category::Fit,
                "villa-aurora",
                &UpdateProject {
                    cover: Some(target.key.clone()),
                    media: Some(vec![MediaItem {
                        kind: MediaKind::Image,
                        src: "fit/villa-aurora/1.webp".to_string(),
                    }]),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed");
        assert!(updated.project.updated_at.is_some());

        // Resolution rewrites every reference against the storage base.
        let resolved = client
            .fetch_project(Category::Fit, "villa-aurora")
            .await
            .expect("fetch failed");
        assert_eq!(resolved.cover, format!("http://{}/media/{}", addr, target.key));
        assert_eq!(
            resolved.media[0].src,
            format!("http://{}/media/fit/villa-aurora/1.webp", addr)
        );

        // The manifest lists the project; the grouped portfolio contains it.
        let manifest = client.fetch_manifest().await.expect("manifest failed");
        assert_eq!(manifest.projects.len(), 1);
        let portfolio = client.fetch_portfolio().await.expect("portfolio failed");
        assert_eq!(portfolio.project_count(), 1);
        assert_eq!(
            portfolio.categories[&Category::Fit].projects[0].id,
            "villa-aurora"
        );

        // The direct-storage fallback reads the same data without an API base.
        let storage_only = PortfolioClient::new(None, &format!("http://{}/media", addr))
            .with_retry_policy(fast_retries());
        let fallback_manifest = storage_only.fetch_manifest().await.unwrap();
        assert_eq!(fallback_manifest.projects.len(), 1);
        let fallback_project = storage_only
            .fetch_project(Category::Fit, "villa-aurora")
            .await
            .unwrap();
        assert_eq!(fallback_project.title, "Villa Aurora");

        // Delete removes metadata, uploads, and the manifest entry.
        client
            .delete_project(Category::Fit, "villa-aurora")
            .await
            .expect("delete failed");
        let gone = client.fetch_project(Category::Fit, "villa-aurora").await;
        assert!(matches!(gone, Err(ClientError::NotFound(_))));
        let manifest = client.fetch_manifest().await.unwrap();
        assert!(manifest.projects.is_empty());
        let served = reqwest::get(&media_url).await.unwrap();
        assert_eq!(served.status(), reqwest::StatusCode::NOT_FOUND);

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let (addr, root) = spawn_site("dup").await;
        let client = site_client(addr);

        client
            .create_project(&cover_draft("Villa Aurora", Category::Fit))
            .await
            .unwrap();
        let second = client
            .create_project(&cover_draft("Villa Aurora", Category::Fit))
            .await;
        assert!(matches!(second, Err(ClientError::Conflict(_))));

        // The same title in another category is a different project.
        client
            .create_project(&cover_draft("Villa Aurora", Category::Interior))
            .await
            .unwrap();

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let (addr, root) = spawn_site("auth").await;
        let client = PortfolioClient::new(
            Some(&format!("http://{}", addr)),
            &format!("http://{}/media", addr),
        )
        .with_admin_password("wrong");

        let result = client
            .create_project(&cover_draft("Villa Aurora", Category::Fit))
            .await;
        assert!(matches!(result, Err(ClientError::Unauthorized)));

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let (addr, root) = spawn_site_with("toolarge", |c| c.upload.max_size_bytes = 1024).await;
        let client = site_client(addr);

        let created = client
            .create_project(&cover_draft("Villa Aurora", Category::Fit))
            .await
            .unwrap();
        let target = &created.upload_urls[0];

        // Validly signed, but the body is over the configured limit.
        let resp = reqwest::Client::new()
            .put(&target.upload_url)
            .body(vec![0u8; 2048])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);

        // At the limit the same URL still accepts the upload.
        let resp = reqwest::Client::new()
            .put(&target.upload_url)
            .body(vec![0u8; 1024])
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_title_update_refreshes_manifest_entry() {
        let (addr, root) = spawn_site("retitle").await;
        let client = site_client(addr);

        client
            .create_project(&cover_draft("Villa Aurora", Category::Fit))
            .await
            .unwrap();
        client
            .update_project(
                Category::Fit,
                "villa-aurora",
                &UpdateProject {
                    title: Some("Villa Borealis".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // A placeholder built from the manifest entry must show the new name.
        let manifest = client.fetch_manifest().await.unwrap();
        let entry = manifest.find_entry(Category::Fit, "villa-aurora").unwrap();
        assert_eq!(entry.title.as_deref(), Some("Villa Borealis"));

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_out_of_charset_id_reads_as_not_found() {
        let (addr, root) = spawn_site("badid").await;

        // Percent-encoded '!' decodes to an id no stored project can have.
        let resp = reqwest::get(format!("http://{}/projects/fit/p%21", addr))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let resp = reqwest::Client::new()
            .delete(format!("http://{}/projects/fit/Bad_Id", addr))
            .header(vitrine::client::ADMIN_PASSWORD_HEADER, ADMIN_PASSWORD)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_unknown_category_and_project_are_not_found() {
        let (addr, root) = spawn_site("notfound").await;

        let resp = reqwest::get(format!("http://{}/projects/fit/nope", addr))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let resp = reqwest::get(format!("http://{}/projects/landscape/p1", addr))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_tampered_upload_signature_is_rejected() {
        let (addr, root) = spawn_site("presign").await;
        let client = site_client(addr);

        let created = client
            .create_project(&cover_draft("Villa Aurora", Category::Fit))
            .await
            .unwrap();
        let target = &created.upload_urls[0];

        // Redirect the signed URL at a different key.
        let tampered = target
            .upload_url
            .replace("cover/cover.mp4", "cover/other.mp4");
        let resp = reqwest::Client::new()
            .put(&tampered)
            .body("data")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_validation_short_circuits_before_any_request() {
        // Unroutable API base: any issued request would fail with a
        // transport error, so a Validation error proves nothing went out.
        let client = PortfolioClient::new(Some("http://127.0.0.1:9"), "http://127.0.0.1:9/media")
            .with_admin_password(ADMIN_PASSWORD);

        let untitled = cover_draft("  ", Category::Fit);
        let result = client.create_project(&untitled).await;
        assert!(matches!(result, Err(ClientError::Validation(_))));

        let no_cover = vitrine::models::ProjectDraft::new("Villa Aurora", Category::Fit);
        let result = client.create_project(&no_cover).await;
        assert!(matches!(result, Err(ClientError::Validation(_))));

        let empty_title_update = UpdateProject {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        let result = client
            .update_project(Category::Fit, "p1", &empty_title_update)
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }
}

/// Shared state for the stub backends used to probe retry and batching
/// behavior.
#[derive(Default)]
struct StubState {
    hits: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Respond 503/500 to this many requests before succeeding;
    /// usize::MAX means always fail.
    fail_first: usize,
    fail_status: u16,
}

impl StubState {
    fn throttled(n: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_first: n,
            fail_status: 503,
            ..Default::default()
        })
    }

    fn server_errors(n: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_first: n,
            fail_status: 500,
            ..Default::default()
        })
    }
}

fn project_body(category: &str, id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": format!("Project {}", id),
        "category": category,
        "cover": format!("{}/{}/cover.mp4", category, id),
        "media": [{"type": "image", "src": format!("{}/{}/1.webp", category, id)}],
        "createdAt": "2026-01-01T00:00:00Z",
    })
}

async fn stub_get_project(
    State(state): State<Arc<StubState>>,
    Path((category, id)): Path<(String, String)>,
) -> Response {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst);

    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);

    // Later ids answer faster, so any order drift inside a batch would show.
    let weight = id
        .trim_start_matches('p')
        .parse::<u64>()
        .unwrap_or_default();
    tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(weight * 5))).await;
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Project not found"})),
        )
            .into_response();
    }
    if hit < state.fail_first {
        return (
            StatusCode::from_u16(state.fail_status).unwrap(),
            Json(serde_json::json!({"error": "backend unavailable"})),
        )
            .into_response();
    }
    Json(project_body(&category, &id)).into_response()
}

async fn stub_delete_project(State(state): State<Arc<StubState>>) -> Response {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst);
    if hit < state.fail_first {
        return (
            StatusCode::from_u16(state.fail_status).unwrap(),
            Json(serde_json::json!({"error": "backend unavailable"})),
        )
            .into_response();
    }
    Json(serde_json::json!({"message": "Project deleted"})).into_response()
}

async fn spawn_stub(state: Arc<StubState>) -> SocketAddr {
    let router = Router::new()
        .route(
            "/projects/:category/:id",
            get(stub_get_project).delete(stub_delete_project),
        )
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn stub_client(addr: SocketAddr) -> PortfolioClient {
    PortfolioClient::new(
        Some(&format!("http://{}", addr)),
        "https://cdn.example.com",
    )
    .with_admin_password("stub-admin")
    .with_retry_policy(fast_retries())
}

fn manifest_of(ids: &[&str]) -> Manifest {
    let mut manifest = Manifest::empty();
    for id in ids {
        manifest.projects.push(ManifestEntry {
            id: id.to_string(),
            category: Category::Fit,
            path: format!("projects/fit/{}/", id),
            title: Some(format!("Entry {}", id)),
        });
    }
    manifest
}

mod retry_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_metadata_fetch_retries_throttling_then_succeeds() {
        let state = StubState::throttled(2);
        let addr = spawn_stub(state.clone()).await;
        let client = stub_client(addr);

        let project = client.fetch_project(Category::Fit, "p1").await.unwrap();
        assert_eq!(state.hits.load(Ordering::SeqCst), 3);
        assert_eq!(project.cover, "https://cdn.example.com/fit/p1/cover.mp4");
        assert_eq!(
            project.media[0].src,
            "https://cdn.example.com/fit/p1/1.webp"
        );
    }

    #[tokio::test]
    async fn test_metadata_fetch_gives_up_after_three_retries() {
        let state = StubState::throttled(usize::MAX);
        let addr = spawn_stub(state.clone()).await;
        let client = stub_client(addr);

        let result = client.fetch_project(Category::Fit, "p1").await;
        assert!(matches!(result, Err(ClientError::Throttled)));
        // One initial attempt plus three retries.
        assert_eq!(state.hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let state = StubState::throttled(0);
        let addr = spawn_stub(state.clone()).await;
        let client = stub_client(addr);

        let result = client.fetch_project(Category::Fit, "missing").await;
        assert!(matches!(result, Err(ClientError::NotFound(_))));
        assert_eq!(state.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_retries_server_errors_then_succeeds() {
        let state = StubState::server_errors(2);
        let addr = spawn_stub(state.clone()).await;
        let client = stub_client(addr);

        client.delete_project(Category::Fit, "p1").await.unwrap();
        assert_eq!(state.hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_delete_does_not_retry_client_errors() {
        let state = Arc::new(StubState {
            fail_first: usize::MAX,
            fail_status: 403,
            ..Default::default()
        });
        let addr = spawn_stub(state.clone()).await;
        let client = stub_client(addr);

        let result = client.delete_project(Category::Fit, "p1").await;
        assert!(matches!(
            result,
            Err(ClientError::Server { status: 403, .. })
        ));
        assert_eq!(state.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_https_base_fails_at_the_socket_not_the_scheme() {
        // Nothing listens on the discard port; the point is that an https
        // base must get as far as a connection attempt.
        let client =
            PortfolioClient::new(Some("https://127.0.0.1:9"), "https://127.0.0.1:9/media");
        let err = client.fetch_manifest().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        let rendered = format!("{:?}", err);
        assert!(
            !rendered.contains("scheme is not http"),
            "https must be supported by the client: {}",
            rendered
        );
    }

    #[tokio::test]
    async fn test_delete_retries_at_most_three_times() {
        let state = StubState::server_errors(usize::MAX);
        let addr = spawn_stub(state.clone()).await;
        let client = stub_client(addr);

        let result = client.delete_project(Category::Fit, "p1").await;
        assert!(matches!(
            result,
            Err(ClientError::Server { status: 500, .. })
        ));
        assert_eq!(state.hits.load(Ordering::SeqCst), 4);
    }
}

mod batch_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_batches_preserve_order_and_bound_concurrency() {
        let state = StubState::throttled(0);
        let addr = spawn_stub(state.clone()).await;
        let client = stub_client(addr);

        let ids = ["p1", "p2", "p3", "p4", "p5", "p6", "p7"];
        let manifest = manifest_of(&ids);
        let projects = client.resolve_manifest(&manifest).await;

        let resolved_ids: Vec<&str> = projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(resolved_ids, ids);
        // Groups run three at a time, sequentially between groups.
        assert!(state.max_in_flight.load(Ordering::SeqCst) <= vitrine::client::BATCH_SIZE);
        assert_eq!(state.hits.load(Ordering::SeqCst), ids.len());
    }

    #[tokio::test]
    async fn test_failed_entry_degrades_to_placeholder_in_place() {
        let state = StubState::throttled(0);
        let addr = spawn_stub(state.clone()).await;
        let client = stub_client(addr);

        let manifest = manifest_of(&["p1", "missing", "p3"]);
        let projects = client.resolve_manifest(&manifest).await;

        assert_eq!(projects.len(), 3);
        assert_eq!(projects[0].title, "Project p1");
        // The placeholder keeps the manifest position, id, and title.
        assert_eq!(projects[1].id, "missing");
        assert_eq!(projects[1].title, "Entry missing");
        assert!(projects[1].cover.is_empty());
        assert_eq!(projects[2].title, "Project p3");
    }
}
