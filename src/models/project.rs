use super::upload::UploadFileSpec;
use super::ManifestEntry;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The fixed set of portfolio categories. A project's category is immutable
/// once created; moving projects between categories is unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Architectural,
    Interior,
    Fit,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Architectural, Category::Interior, Category::Fit];

    pub fn default_title(&self) -> &'static str {
        match self {
            Self::Architectural => "Architectural",
            Self::Interior => "Interior",
            Self::Fit => "Fit Out",
        }
    }

    pub fn default_description(&self) -> &'static str {
        match self {
            Self::Architectural => "Architectural design projects",
            Self::Interior => "Interior design projects",
            Self::Fit => "Fit out projects",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "architectural" => Ok(Self::Architectural),
            "interior" => Ok(Self::Interior),
            "fit" => Ok(Self::Fit),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Architectural => write!(f, "architectural"),
            Self::Interior => write!(f, "interior"),
            Self::Fit => write!(f, "fit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// One entry in a project's ordered media list. `src` is either an absolute
/// URL or a path relative to the storage base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub src: String,
}

/// Full descriptive record for one project. Owned by the store; the client
/// holds a transient editable copy while authoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Project {
    /// Minimal stand-in for a project whose metadata could not be resolved.
    /// Carries at least the id and a title so the listing stays complete.
    pub fn placeholder(entry: &ManifestEntry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone().unwrap_or_else(|| entry.id.clone()),
            category: entry.category,
            area: String::new(),
            description: String::new(),
            cover: String::new(),
            media: Vec::new(),
            created_at: String::new(),
            updated_at: None,
        }
    }

    /// Merge an update request into existing metadata. Absent fields keep
    /// their current values; the category never changes.
    pub fn apply_update(&mut self, update: &UpdateProject) {
        if let Some(title) = &update.title {
            self.title = title.trim().to_string();
        }
        if let Some(area) = &update.area {
            self.area = area.trim().to_string();
        }
        if let Some(description) = &update.description {
            self.description = description.trim().to_string();
        }
        if let Some(cover) = &update.cover {
            self.cover = cover.clone();
        }
        if let Some(media) = &update.media {
            self.media = media.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<UploadFileSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<MediaItem>>,
    #[serde(default)]
    pub files: Vec<UploadFileSpec>,
}

/// Client-side authoring state for a new project, validated before any
/// request is issued.
#[derive(Debug, Clone)]
pub struct ProjectDraft {
    pub title: String,
    pub category: Category,
    pub area: String,
    pub description: String,
    pub files: Vec<UploadFileSpec>,
}

impl ProjectDraft {
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            category,
            area: String::new(),
            description: String::new(),
            files: Vec::new(),
        }
    }
}
