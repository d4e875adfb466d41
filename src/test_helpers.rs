//! Shared test utilities for the pagewright test suite.
//!
//! Provides block and page builders, a store that always fails to save, and
//! lookups over recorded preview frames.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let page = published_page("about", "<p>Hello</p>");
//! let blocks = vec![heading("Hi", "h1"), text("<p>Body</p>")];
//! ```

use std::collections::BTreeMap;

use crate::preview::PreviewFrame;
use crate::store::{PageStore, StoreError};
use crate::types::{Block, BlockKind, Page, PageStatus, StoredContent};

// =========================================================================
// Block builders
// =========================================================================

pub fn text(content: &str) -> Block {
    Block::new(BlockKind::Text, content)
}

/// Heading block with a `level` setting (`"h1"`, `"3"`, ...).
pub fn heading(content: &str, level: &str) -> Block {
    Block::new(BlockKind::Heading, content).with_setting("level", level)
}

pub fn video(url: &str) -> Block {
    Block::new(BlockKind::Video, url)
}

// =========================================================================
// Page builders
// =========================================================================

/// A published page with string content and a title derived from the slug.
pub fn published_page(slug: &str, content: &str) -> Page {
    Page {
        id: 1,
        title: slug.to_string(),
        slug: slug.to_string(),
        content: Some(StoredContent::from(content)),
        status: PageStatus::Published,
        ..Page::default()
    }
}

/// A draft page with block content.
pub fn draft_blocks_page(slug: &str, blocks: Vec<Block>) -> Page {
    Page {
        id: 1,
        title: slug.to_string(),
        slug: slug.to_string(),
        content: Some(StoredContent::Blocks(blocks)),
        ..Page::default()
    }
}

// =========================================================================
// Collaborators
// =========================================================================

/// A store whose saves always fail with an IO error.
#[derive(Debug, Default)]
pub struct FailingStore {
    pub pages: BTreeMap<String, Page>,
    pub attempts: usize,
}

impl PageStore for FailingStore {
    fn get_page(&self, slug: &str) -> Option<Page> {
        self.pages.get(slug).cloned()
    }

    fn save_page(&mut self, _id: u64, _page: &Page) -> Result<(), StoreError> {
        self.attempts += 1;
        Err(StoreError::Io(std::io::Error::other("disk full")))
    }

    fn list_slugs(&self) -> Vec<String> {
        self.pages.keys().cloned().collect()
    }
}

// =========================================================================
// Frame lookups — panics with a clear message on miss
// =========================================================================

/// The most recent frame. Panics if nothing was committed.
pub fn last_frame(frames: &[PreviewFrame]) -> &PreviewFrame {
    frames
        .last()
        .unwrap_or_else(|| panic!("no preview frame was committed"))
}
