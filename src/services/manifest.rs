use crate::models::{now_rfc3339, Category, Manifest, ManifestEntry};
use crate::Store;
use anyhow::Result;

pub const MANIFEST_KEY: &str = "projects.json";

/// Load the manifest, substituting an empty one when none exists and the
/// default category definitions when the stored set is empty.
pub fn load(store: &Store) -> Result<Manifest> {
    let mut manifest: Manifest = match store.get_json(MANIFEST_KEY)? {
        Some(m) => m,
        None => return Ok(Manifest::empty()),
    };
    if manifest.categories.is_empty() {
        manifest.categories = Manifest::default_categories();
    }
    Ok(manifest)
}

/// Persist the manifest, stamping `lastUpdated`.
pub fn save(store: &Store, manifest: &mut Manifest) -> Result<()> {
    manifest.last_updated = now_rfc3339();
    store.put_json(MANIFEST_KEY, manifest)
}

pub fn add_entry(manifest: &mut Manifest, entry: ManifestEntry) {
    manifest.projects.push(entry);
}

/// Refresh the display title on an existing entry, e.g. after a metadata
/// update renamed the project.
pub fn retitle_entry(manifest: &mut Manifest, category: Category, id: &str, title: &str) {
    if let Some(entry) = manifest
        .projects
        .iter_mut()
        .find(|e| e.category == category && e.id == id)
    {
        entry.title = Some(title.to_string());
    }
}

pub fn remove_entry(manifest: &mut Manifest, category: Category, id: &str) {
    manifest
        .projects
        .retain(|e| !(e.category == category && e.id == id));
}
