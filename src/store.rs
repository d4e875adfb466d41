//! Page storage collaborator.
//!
//! The rendering pipeline only needs two things from storage: look a page up
//! by slug, and persist an edited page. [`PageStore`] is that seam.
//!
//! - [`MemoryPageStore`] keeps pages in a map (editor sessions, tests).
//! - [`JsonDirStore`] keeps one `<slug>.json` file per page under a site
//!   directory; nested slugs (`blog/hello`) map to subdirectories.
//!
//! A missing or unreadable record is reported as "not found". The render
//! path treats that exactly like an unpublished page.

use crate::types::Page;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),
}

pub trait PageStore {
    /// The page stored under `slug`, or `None` when there is none.
    fn get_page(&self, slug: &str) -> Option<Page>;

    /// Persist `page` under its slug, assigning it `id`.
    fn save_page(&mut self, id: u64, page: &Page) -> Result<(), StoreError>;

    /// Every stored slug, sorted.
    fn list_slugs(&self) -> Vec<String>;
}

/// Reject slugs that would escape the store or name nothing.
pub fn validate_slug(slug: &str) -> Result<(), StoreError> {
    let invalid = slug.is_empty()
        || slug.starts_with('/')
        || slug.ends_with('/')
        || slug.contains('\\')
        || slug.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if invalid {
        Err(StoreError::InvalidSlug(slug.to_string()))
    } else {
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryPageStore {
    pages: BTreeMap<String, Page>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: impl IntoIterator<Item = Page>) -> Self {
        Self {
            pages: pages.into_iter().map(|p| (p.slug.clone(), p)).collect(),
        }
    }
}

impl PageStore for MemoryPageStore {
    fn get_page(&self, slug: &str) -> Option<Page> {
        self.pages.get(slug).cloned()
    }

    fn save_page(&mut self, id: u64, page: &Page) -> Result<(), StoreError> {
        validate_slug(&page.slug)?;
        let mut stored = page.clone();
        stored.id = id;
        self.pages.insert(stored.slug.clone(), stored);
        Ok(())
    }

    fn list_slugs(&self) -> Vec<String> {
        self.pages.keys().cloned().collect()
    }
}

// ============================================================================
// JSON directory store
// ============================================================================

#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn page_path(&self, slug: &str) -> PathBuf {
        self.root.join(format!("{slug}.json"))
    }

    fn load(&self, slug: &str) -> Result<Page, StoreError> {
        validate_slug(slug)?;
        let content = fs::read_to_string(self.page_path(slug))?;
        let mut page: Page = serde_json::from_str(&content)?;
        if page.slug.is_empty() {
            page.slug = slug.to_string();
        }
        Ok(page)
    }
}

impl PageStore for JsonDirStore {
    fn get_page(&self, slug: &str) -> Option<Page> {
        match self.load(slug) {
            Ok(page) => Some(page),
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("could not load page {slug:?}: {e}");
                None
            }
        }
    }

    fn save_page(&mut self, id: u64, page: &Page) -> Result<(), StoreError> {
        validate_slug(&page.slug)?;
        let path = self.page_path(&page.slug);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut stored = page.clone();
        stored.id = id;
        fs::write(&path, serde_json::to_string_pretty(&stored)?)?;
        log::debug!("saved page {:?} to {}", page.slug, path.display());
        Ok(())
    }

    fn list_slugs(&self) -> Vec<String> {
        let mut slugs = Vec::new();
        if let Err(e) = collect_slugs(&self.root, &self.root, &mut slugs) {
            log::warn!("could not list pages in {}: {e}", self.root.display());
        }
        slugs.sort();
        slugs
    }
}

fn collect_slugs(root: &Path, dir: &Path, slugs: &mut Vec<String>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_slugs(root, &path, slugs)?;
        } else if path.extension().is_some_and(|e| e == "json") {
            let Ok(relative) = path.with_extension("").strip_prefix(root).map(Path::to_path_buf)
            else {
                continue;
            };
            let slug = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if validate_slug(&slug).is_ok() {
                slugs.push(slug);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PageStatus, StoredContent};
    use tempfile::TempDir;

    fn page(slug: &str) -> Page {
        Page {
            slug: slug.to_string(),
            title: "Title".to_string(),
            content: Some(StoredContent::from("<p>x</p>")),
            status: PageStatus::Published,
            ..Page::default()
        }
    }

    #[test]
    fn slug_validation() {
        assert!(validate_slug("about").is_ok());
        assert!(validate_slug("blog/hello-world").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("../etc/passwd").is_err());
        assert!(validate_slug("/abs").is_err());
        assert!(validate_slug("a//b").is_err());
        assert!(validate_slug("a\\b").is_err());
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryPageStore::new();
        store.save_page(7, &page("about")).unwrap();
        let loaded = store.get_page("about").unwrap();
        assert_eq!(loaded.id, 7);
        assert_eq!(loaded.title, "Title");
        assert!(store.get_page("missing").is_none());
        assert_eq!(store.list_slugs(), vec!["about"]);
    }

    #[test]
    fn json_store_saves_and_loads() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonDirStore::new(tmp.path());
        store.save_page(3, &page("blog/first")).unwrap();
        assert!(tmp.path().join("blog/first.json").exists());

        let loaded = store.get_page("blog/first").unwrap();
        assert_eq!(loaded.id, 3);
        assert_eq!(loaded.content, Some(StoredContent::from("<p>x</p>")));
    }

    #[test]
    fn json_store_missing_page_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = JsonDirStore::new(tmp.path());
        assert!(store.get_page("nope").is_none());
        assert!(store.get_page("../escape").is_none());
    }

    #[test]
    fn json_store_corrupt_page_is_none() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.json"), "{ not json").unwrap();
        let store = JsonDirStore::new(tmp.path());
        assert!(store.get_page("bad").is_none());
    }

    #[test]
    fn json_store_fills_slug_from_file_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("contact.json"), r#"{"title": "Contact"}"#).unwrap();
        let store = JsonDirStore::new(tmp.path());
        assert_eq!(store.get_page("contact").unwrap().slug, "contact");
    }

    #[test]
    fn json_store_loads_record_with_null_metadata() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("a.json"),
            r#"{"slug":"a","status":"published","title":"About","meta_title":null,"content":"<p>x</p>"}"#,
        )
        .unwrap();
        let store = JsonDirStore::new(tmp.path());
        let page = store.get_page("a").unwrap();
        assert!(page.is_published());
        assert_eq!(page.meta_title, "");
    }

    #[test]
    fn json_store_lists_nested_slugs() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonDirStore::new(tmp.path());
        store.save_page(1, &page("home")).unwrap();
        store.save_page(2, &page("blog/b")).unwrap();
        store.save_page(3, &page("blog/a")).unwrap();
        fs::write(tmp.path().join("config.toml"), "").unwrap();
        assert_eq!(store.list_slugs(), vec!["blog/a", "blog/b", "home"]);
    }

    #[test]
    fn save_rejects_invalid_slug() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonDirStore::new(tmp.path());
        assert!(matches!(
            store.save_page(1, &page("../x")),
            Err(StoreError::InvalidSlug(_))
        ));
    }
}
