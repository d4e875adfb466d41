//! Editing modes and the editor session.
//!
//! A page is edited in one of three modes, matching the three content
//! formats: rich text (markup fragment), blocks, and raw document. Moving
//! between the string modes carries the text; moving between a string mode
//! and block mode starts over with empty content. [`switch_mode`] is that
//! conversion and never fails.
//!
//! [`EditorSession`] wires one page's edits to the live preview, the
//! auto-save timer and the page store. Content dropped by a mode switch is
//! kept in a one-slot side buffer until the next lossy switch, and can be
//! brought back explicitly with [`EditorSession::recover_discarded`].

use crate::autosave::AutoSave;
use crate::config::SiteConfig;
use crate::detect::{self, Format};
use crate::preview::{PreviewState, PreviewSurface, PreviewSynchronizer, Viewport};
use crate::store::PageStore;
use crate::types::{Page, StoredContent, TemplateId};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorMode {
    #[default]
    RichText,
    Block,
    RawDocument,
}

impl EditorMode {
    /// The mode an editor should open in for stored content.
    pub fn for_content(content: Option<&StoredContent>) -> Self {
        match detect::classify(content) {
            Format::FullDocument => EditorMode::RawDocument,
            Format::BlockSequence => EditorMode::Block,
            Format::MarkupFragment => EditorMode::RichText,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EditorMode::RichText => "rich-text",
            EditorMode::Block => "block",
            EditorMode::RawDocument => "raw-document",
        }
    }
}

/// Convert the in-memory content for a mode change.
///
/// Switching into or out of block mode discards the content. Between rich
/// text and raw document the string is carried over unchanged; a block array
/// found there is treated as an empty string.
pub fn switch_mode(content: StoredContent, from: EditorMode, to: EditorMode) -> StoredContent {
    if from == to {
        return content;
    }
    match (from, to) {
        (_, EditorMode::Block) => StoredContent::Blocks(Vec::new()),
        (EditorMode::Block, _) => StoredContent::Text(String::new()),
        _ => match content {
            StoredContent::Text(text) => StoredContent::Text(text),
            StoredContent::Blocks(_) => StoredContent::Text(String::new()),
        },
    }
}

// ============================================================================
// Session
// ============================================================================

/// Result of a save attempt, for the editor's notification area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed(String),
}

/// One page open in the editor.
pub struct EditorSession<S: PreviewSurface, P: PageStore> {
    page: Page,
    mode: EditorMode,
    viewport: Viewport,
    discarded: Option<StoredContent>,
    dirty: bool,
    autosave: AutoSave,
    preview: PreviewSynchronizer<S>,
    store: P,
}

impl<S: PreviewSurface, P: PageStore> EditorSession<S, P> {
    /// Open `page` and show its first preview.
    pub fn open(page: Page, store: P, surface: S, config: &SiteConfig) -> Self {
        let mode = EditorMode::for_content(page.content.as_ref());
        log::debug!("editing {:?} in {} mode", page.slug, mode.as_str());
        let mut session = Self {
            page,
            mode,
            viewport: Viewport::default(),
            discarded: None,
            dirty: false,
            autosave: AutoSave::new(config.autosave.delay()),
            preview: PreviewSynchronizer::new(surface, config.clone()),
            store,
        };
        session.refresh_preview();
        session
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Unsaved edits exist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn preview(&self) -> &PreviewSynchronizer<S> {
        &self.preview
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn set_content(&mut self, content: StoredContent, now: Instant) {
        self.page.content = Some(content);
        self.edited(now);
    }

    pub fn set_title(&mut self, title: impl Into<String>, now: Instant) {
        self.page.title = title.into();
        self.edited(now);
    }

    pub fn set_template(&mut self, template: TemplateId, now: Instant) {
        self.page.template = template;
        self.edited(now);
    }

    /// Resize the preview. Not an edit.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Err(e) = self.preview.set_viewport(viewport) {
            log::warn!("could not update preview: {e}");
        }
    }

    /// Change editing mode, converting the content.
    ///
    /// Content that does not survive the conversion replaces whatever the
    /// side buffer held. Switching back does not restore it.
    pub fn switch_mode(&mut self, to: EditorMode, now: Instant) {
        if to == self.mode {
            return;
        }
        let current = self.page.content.take().unwrap_or_default();
        let converted = switch_mode(current.clone(), self.mode, to);
        if converted != current && !current.is_empty() {
            log::info!(
                "switching {} → {} discarded the current content",
                self.mode.as_str(),
                to.as_str()
            );
            self.discarded = Some(current);
        }
        self.page.content = Some(converted);
        self.mode = to;
        self.edited(now);
    }

    /// Content dropped by the last lossy mode switch, if still held.
    pub fn discarded(&self) -> Option<&StoredContent> {
        self.discarded.as_ref()
    }

    /// Take the side buffer back, switching to the mode that fits it.
    pub fn recover_discarded(&mut self, now: Instant) -> Option<&StoredContent> {
        let content = self.discarded.take()?;
        self.mode = EditorMode::for_content(Some(&content));
        self.page.content = Some(content);
        self.edited(now);
        self.page.content.as_ref()
    }

    /// Let time pass; saves when the auto-save deadline has been reached.
    pub fn tick(&mut self, now: Instant) -> Option<SaveOutcome> {
        let ticket = self.autosave.poll(now)?;
        log::debug!("auto-save #{} due for {:?}", ticket.generation, self.page.slug);
        Some(self.persist())
    }

    /// Save immediately, cancelling any pending auto-save.
    pub fn save_now(&mut self) -> SaveOutcome {
        self.autosave.cancel();
        self.persist()
    }

    /// Leave the editor. Pending auto-saves are dropped and the preview closed.
    pub fn close(mut self) -> P {
        if self.dirty {
            log::warn!("closing {:?} with unsaved changes", self.page.slug);
        }
        self.autosave.cancel();
        self.preview.close();
        self.store
    }

    fn edited(&mut self, now: Instant) {
        self.dirty = true;
        self.autosave.touch(now);
        self.refresh_preview();
    }

    fn refresh_preview(&mut self) {
        let state = PreviewState {
            content: self.page.content.clone(),
            title: self.page.title.clone(),
            template: self.page.template.clone(),
            viewport: self.viewport,
        };
        if let Err(e) = self.preview.on_change(state) {
            log::warn!("could not update preview: {e}");
        }
    }

    fn persist(&mut self) -> SaveOutcome {
        match self.store.save_page(self.page.id, &self.page) {
            Ok(()) => {
                self.dirty = false;
                log::info!("saved {:?}", self.page.slug);
                SaveOutcome::Saved
            }
            Err(e) => {
                log::warn!("saving {:?} failed: {e}", self.page.slug);
                SaveOutcome::Failed(e.to_string())
            }
        }
    }
}
