use crate::models::{Category, Project};
use crate::Store;
use anyhow::Result;
use slug::slugify;

pub fn metadata_key(category: Category, id: &str) -> String {
    format!("projects/{}/{}/metadata.json", category, id)
}

pub fn project_prefix(category: Category, id: &str) -> String {
    format!("projects/{}/{}/", category, id)
}

pub fn uploads_prefix(category: Category, id: &str) -> String {
    format!("uploads/{}/{}/", category, id)
}

/// Derive a project id from its title.
pub fn generate_id(title: &str) -> String {
    slugify(title)
}

pub fn valid_id(id: &str) -> bool {
    if id.is_empty() || id.len() > 200 {
        return false;
    }
    id.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub fn get(store: &Store, category: Category, id: &str) -> Result<Option<Project>> {
    store.get_json(&metadata_key(category, id))
}

pub fn save(store: &Store, project: &Project) -> Result<()> {
    store.put_json(&metadata_key(project.category, &project.id), project)
}

/// Remove every stored object belonging to a project, metadata and uploaded
/// media alike.
pub fn delete_objects(store: &Store, category: Category, id: &str) -> Result<usize> {
    let mut removed = store.delete_prefix(&project_prefix(category, id))?;
    removed += store.delete_prefix(&uploads_prefix(category, id))?;
    Ok(removed)
}
