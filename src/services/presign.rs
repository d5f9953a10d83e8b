use crate::models::{Category, UploadFileSpec, UploadKind, UploadTarget};
use crate::store;
use crate::Config;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Storage key an uploaded file lands at. Covers get their own folder so the
/// admin UI can tell them apart from gallery media.
pub fn upload_key(category: Category, id: &str, spec: &UploadFileSpec) -> String {
    match spec.kind {
        UploadKind::Cover => format!("uploads/{}/{}/cover/{}", category, id, spec.filename),
        _ => format!("uploads/{}/{}/original/{}", category, id, spec.filename),
    }
}

/// Hex HMAC-SHA256 over `method\nkey\nexpires`.
pub fn sign(signing_key: &str, method: &str, key: &str, expires: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_key.as_bytes()).expect("HMAC key length");
    mac.update(format!("{}\n{}\n{}", method, key, expires).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// A signature is good when it matches the recomputed digest and has not
/// expired.
pub fn verify(signing_key: &str, method: &str, key: &str, expires: i64, signature: &str) -> bool {
    if expires < Utc::now().timestamp() {
        return false;
    }
    sign(signing_key, method, key, expires) == signature
}

/// Issue presigned PUT targets for a list of upload specs. Specs with empty
/// filenames or filenames that do not form a valid key are skipped rather
/// than failing the batch.
pub fn upload_targets(
    config: &Config,
    category: Category,
    id: &str,
    files: &[UploadFileSpec],
) -> Vec<UploadTarget> {
    let expires = Utc::now().timestamp() + config.upload.url_ttl_secs;
    let base = config.server.public_base();
    files
        .iter()
        .filter(|f| !f.filename.trim().is_empty())
        .filter_map(|f| {
            let key = upload_key(category, id, f);
            if let Err(e) = store::validate_key(&key) {
                tracing::warn!("Skipping upload target for '{}': {}", f.filename, e);
                return None;
            }
            let signature = sign(&config.auth.upload_signing_key, "PUT", &key, expires);
            Some(UploadTarget {
                filename: f.filename.clone(),
                upload_url: format!(
                    "{}/uploads/{}?expires={}&signature={}",
                    base, key, expires, signature
                ),
                key,
                content_type: f.content_type.clone(),
            })
        })
        .collect()
}
