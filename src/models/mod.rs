mod manifest;
mod project;
mod upload;

pub use manifest::{CategoryInfo, Manifest, ManifestEntry};
pub use project::{
    Category, CreateProject, MediaItem, MediaKind, Project, ProjectDraft, UpdateProject,
};
pub use upload::{UploadFileSpec, UploadKind, UploadTarget};

use chrono::{SecondsFormat, Utc};

/// Current time as an RFC 3339 UTC string, the wire format for all timestamps.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
