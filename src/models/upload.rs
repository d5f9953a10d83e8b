use serde::{Deserialize, Serialize};

/// Where an uploaded file lands in the project's key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Cover,
    Media,
    #[default]
    Other,
}

/// One file the caller intends to upload, named in an upload-URL request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileSpec {
    pub filename: String,
    #[serde(default, rename = "type")]
    pub kind: UploadKind,
    #[serde(default = "default_content_type", rename = "contentType")]
    pub content_type: String,
}

impl UploadFileSpec {
    pub fn new(filename: impl Into<String>, kind: UploadKind) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            filename,
            kind,
            content_type,
        }
    }
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

/// Presigned upload target issued by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    pub filename: String,
    pub upload_url: String,
    pub key: String,
    pub content_type: String,
}
