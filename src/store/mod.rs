use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

static KEY_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\- ]*$").expect("key segment regex"));

/// Filesystem-backed object store with the flat-key semantics the rest of
/// the system is written against: objects live under `root/<key>`, keys are
/// slash-separated paths, and prefix operations mirror listing/deleting a
/// key prefix in a bucket.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating store root '{}'", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.resolve(key)?.is_file())
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(key)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading object '{}'", key)),
        }
    }

    pub fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, data).with_context(|| format!("writing object '{}'", key))
    }

    /// Remove an object. Deleting a missing key is not an error.
    pub fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("deleting object '{}'", key)),
        }
    }

    /// All keys under a prefix, sorted. The prefix must name whole segments
    /// (e.g. "projects/fit/villa/").
    pub fn list_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let trimmed = prefix.trim_end_matches('/');
        validate_key(trimmed)?;
        let dir = self.root.join(trimmed);
        let mut keys = Vec::new();
        if dir.is_dir() {
            collect_keys(&dir, trimmed, &mut keys)?;
        }
        keys.sort();
        Ok(keys)
    }

    /// Remove every object under a prefix, returning how many were deleted.
    pub fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let keys = self.list_prefix(prefix)?;
        let dir = self.root.join(prefix.trim_end_matches('/'));
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("deleting prefix '{}'", prefix))?;
        }
        Ok(keys.len())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(data) => {
                let value = serde_json::from_slice(&data)
                    .with_context(|| format!("parsing object '{}'", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)?;
        self.put(key, &data)
    }
}

fn collect_keys(dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let key = format!("{}/{}", prefix, name);
        if entry.file_type()?.is_dir() {
            collect_keys(&entry.path(), &key, out)?;
        } else {
            out.push(key);
        }
    }
    Ok(())
}

/// Keys are slash-separated segments of safe characters. Rejects empty
/// segments, leading slashes, and dot-dot traversal before anything touches
/// the filesystem.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("empty object key");
    }
    if key.starts_with('/') {
        bail!("object key must not start with '/': '{}'", key);
    }
    for segment in key.split('/') {
        // Segments start alphanumeric, so "", ".", and ".." all fail here.
        if !KEY_SEGMENT.is_match(segment) {
            bail!("invalid object key segment '{}' in '{}'", segment, key);
        }
    }
    Ok(())
}
