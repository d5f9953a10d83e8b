use super::project::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MANIFEST_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Minimal pointer used to enumerate projects before their metadata is
/// fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub category: Category,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// The enumerable list of project pointers, stored at `projects.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub categories: BTreeMap<Category, CategoryInfo>,
    #[serde(default)]
    pub projects: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            last_updated: super::now_rfc3339(),
            categories: Self::default_categories(),
            projects: Vec::new(),
        }
    }

    pub fn default_categories() -> BTreeMap<Category, CategoryInfo> {
        Category::ALL
            .iter()
            .map(|c| {
                (
                    *c,
                    CategoryInfo {
                        title: c.default_title().to_string(),
                        description: c.default_description().to_string(),
                    },
                )
            })
            .collect()
    }

    pub fn find_entry(&self, category: Category, id: &str) -> Option<&ManifestEntry> {
        self.projects
            .iter()
            .find(|e| e.category == category && e.id == id)
    }
}
