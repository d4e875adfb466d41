//! Live preview: regenerate a preview document on every editor change and
//! commit it into an isolated surface sized to the chosen viewport.
//!
//! The work is split in two so the compilation half stays testable:
//!
//! ```text
//! PreviewState ──build_preview (pure)──→ PreviewFrame ──commit──→ PreviewSurface
//! ```
//!
//! [`build_preview`] writes a full-document body through unmodified. Block
//! and fragment bodies go through the same block compiler as publishing and
//! are wrapped in a styled preview document with the title header and, for
//! non-default templates, a template badge. Shortcodes stay literal: widgets
//! only run on the published page.
//!
//! [`PreviewSynchronizer`] calls build and commit synchronously for each
//! change, so the last completed change always replaces the previous frame
//! in full.

use crate::blocks;
use crate::config::{self, PreviewConfig, SiteConfig};
use crate::detect::ContentValue;
use crate::types::{StoredContent, TemplateId};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const PAGE_CSS: &str = include_str!("../static/page.css");
const PREVIEW_CSS: &str = include_str!("../static/preview.css");

/// Simulated device width for the preview surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl Viewport {
    pub fn as_str(self) -> &'static str {
        match self {
            Viewport::Desktop => "desktop",
            Viewport::Tablet => "tablet",
            Viewport::Mobile => "mobile",
        }
    }

    pub fn width(self, config: &PreviewConfig) -> PreviewWidth {
        match self {
            Viewport::Desktop => PreviewWidth::Full,
            Viewport::Tablet => PreviewWidth::Fixed(config.tablet_width),
            Viewport::Mobile => PreviewWidth::Fixed(config.mobile_width),
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Viewport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Viewport::Desktop),
            "tablet" => Ok(Viewport::Tablet),
            "mobile" => Ok(Viewport::Mobile),
            other => Err(format!(
                "unknown viewport {other:?} (expected desktop, tablet or mobile)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewWidth {
    Full,
    Fixed(u32),
}

impl PreviewWidth {
    /// CSS width for the surface element.
    pub fn css(self) -> String {
        match self {
            PreviewWidth::Full => "100%".to_string(),
            PreviewWidth::Fixed(px) => format!("{px}px"),
        }
    }
}

/// What the editor currently shows. Rebuilt on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewState {
    pub content: Option<StoredContent>,
    pub title: String,
    pub template: TemplateId,
    pub viewport: Viewport,
}

/// One complete preview, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFrame {
    pub document: String,
    pub width: PreviewWidth,
    pub viewport: Viewport,
}

/// Build the preview document for `state`.
pub fn build_preview(state: &PreviewState, config: &SiteConfig) -> PreviewFrame {
    let content = ContentValue::from_stored(state.content.clone());
    let document = match content {
        ContentValue::FullDocument(document) => document,
        ContentValue::BlockSequence(blocks) => {
            let fragment = blocks::compile_with(&blocks, &config.blocks);
            wrap_fragment(state, &fragment, config).into_string()
        }
        ContentValue::MarkupFragment(fragment) => {
            wrap_fragment(state, &fragment, config).into_string()
        }
    };
    PreviewFrame {
        document,
        width: state.viewport.width(&config.preview),
        viewport: state.viewport,
    }
}

fn wrap_fragment(state: &PreviewState, fragment: &str, config: &SiteConfig) -> Markup {
    let title = if state.title.trim().is_empty() {
        "Untitled"
    } else {
        state.title.as_str()
    };
    let css = format!(
        "{}\n\n{}\n\n{}",
        config::generate_color_css(&config.colors),
        PAGE_CSS,
        PREVIEW_CSS
    );
    let template_class = format!("page-template template-{}", state.template);

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css)) }
            }
            body {
                @if !state.template.is_default() {
                    span.template-badge { (state.template) }
                }
                main class=(template_class) {
                    header.page-header {
                        h1 { (title) }
                    }
                    div.page-content {
                        @if fragment.trim().is_empty() {
                            p.preview-empty { "Nothing to preview yet." }
                        } @else {
                            (PreEscaped(fragment))
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Surfaces
// ============================================================================

/// Where preview frames are shown. Each commit replaces the previous frame.
pub trait PreviewSurface {
    fn commit(&mut self, frame: &PreviewFrame) -> io::Result<()>;

    /// The preview was closed; release whatever the surface holds.
    fn close(&mut self) {}
}

/// Records every committed frame.
#[derive(Debug, Default)]
pub struct MemorySurface {
    pub frames: Vec<PreviewFrame>,
    pub closed: bool,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&PreviewFrame> {
        self.frames.last()
    }
}

impl PreviewSurface for MemorySurface {
    fn commit(&mut self, frame: &PreviewFrame) -> io::Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Writes each frame to an HTML file as a host page with a sandboxed iframe.
#[derive(Debug, Clone)]
pub struct FileSurface {
    path: PathBuf,
    sandbox: String,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>, config: &SiteConfig) -> Self {
        Self {
            path: path.into(),
            sandbox: config.sandbox.attribute(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreviewSurface for FileSurface {
    fn commit(&mut self, frame: &PreviewFrame) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let html = surface_document(frame, &self.sandbox).into_string();
        fs::write(&self.path, html)?;
        log::debug!(
            "preview ({}) written to {}",
            frame.viewport,
            self.path.display()
        );
        Ok(())
    }
}

/// Host page for a preview frame.
pub fn surface_document(frame: &PreviewFrame, sandbox: &str) -> Markup {
    let frame_style = format!("width: {}; height: 100%; border: 0;", frame.width.css());
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { "Preview (" (frame.viewport) ")" }
                style {
                    "html, body { margin: 0; height: 100%; background: #e5e5e5; }"
                    "body { display: flex; justify-content: center; }"
                }
            }
            body {
                iframe.preview-surface
                    data-viewport=(frame.viewport)
                    style=(frame_style)
                    sandbox=(sandbox)
                    srcdoc=(frame.document) {}
            }
        }
    }
}

// ============================================================================
// Synchronizer
// ============================================================================

/// Keeps a surface in step with the editor state.
#[derive(Debug)]
pub struct PreviewSynchronizer<S: PreviewSurface> {
    surface: S,
    config: SiteConfig,
    state: Option<PreviewState>,
}

impl<S: PreviewSurface> PreviewSynchronizer<S> {
    pub fn new(surface: S, config: SiteConfig) -> Self {
        Self {
            surface,
            config,
            state: None,
        }
    }

    /// Rebuild and commit for the new state. Returns the committed frame.
    pub fn on_change(&mut self, state: PreviewState) -> io::Result<PreviewFrame> {
        let frame = build_preview(&state, &self.config);
        self.state = Some(state);
        self.surface.commit(&frame)?;
        Ok(frame)
    }

    /// Resize the surface. Commits nothing while the preview is closed.
    pub fn set_viewport(&mut self, viewport: Viewport) -> io::Result<Option<PreviewFrame>> {
        match self.state.take() {
            Some(mut state) => {
                state.viewport = viewport;
                self.on_change(state).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn state(&self) -> Option<&PreviewState> {
        self.state.as_ref()
    }

    pub fn close(&mut self) {
        self.state = None;
        self.surface.close();
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn state(content: &str) -> PreviewState {
        PreviewState {
            content: Some(StoredContent::from(content)),
            title: "Landing".to_string(),
            ..PreviewState::default()
        }
    }

    #[test]
    fn viewport_widths() {
        let config = PreviewConfig::default();
        assert_eq!(Viewport::Desktop.width(&config), PreviewWidth::Full);
        assert_eq!(Viewport::Tablet.width(&config), PreviewWidth::Fixed(768));
        assert_eq!(Viewport::Mobile.width(&config), PreviewWidth::Fixed(375));
        assert_eq!(PreviewWidth::Fixed(375).css(), "375px");
        assert_eq!(PreviewWidth::Full.css(), "100%");
    }

    #[test]
    fn viewport_parses_case_insensitively() {
        assert_eq!("Mobile".parse::<Viewport>(), Ok(Viewport::Mobile));
        assert!("watch".parse::<Viewport>().is_err());
    }

    #[test]
    fn full_document_written_unmodified() {
        let doc = "<!DOCTYPE html><html><body>[form id=\"1\"]</body></html>";
        let frame = build_preview(&state(doc), &SiteConfig::default());
        assert_eq!(frame.document, doc);
    }

    #[test]
    fn fragment_wrapped_with_title_and_styles() {
        let frame = build_preview(&state("<p>Hello</p>"), &SiteConfig::default());
        assert!(frame.document.starts_with("<!DOCTYPE html>"));
        assert!(frame.document.contains("<h1>Landing</h1>"));
        assert!(frame.document.contains("<p>Hello</p>"));
        assert!(frame.document.contains("--color-bg"));
        assert!(!frame.document.contains("template-badge\">"));
    }

    #[test]
    fn untitled_fallback() {
        let mut s = state("<p>x</p>");
        s.title = "  ".to_string();
        let frame = build_preview(&s, &SiteConfig::default());
        assert!(frame.document.contains("<h1>Untitled</h1>"));
    }

    #[test]
    fn badge_for_non_default_template() {
        let mut s = state("<p>x</p>");
        s.template = TemplateId::Blank;
        let frame = build_preview(&s, &SiteConfig::default());
        assert!(
            frame
                .document
                .contains(r#"<span class="template-badge">blank</span>"#)
        );
    }

    #[test]
    fn blocks_compiled_for_preview() {
        let s = PreviewState {
            content: Some(StoredContent::Blocks(vec![
                heading("Hi", "h1"),
                text("<p>Body</p>"),
            ])),
            ..PreviewState::default()
        };
        let frame = build_preview(&s, &SiteConfig::default());
        assert!(frame.document.contains("<h1>Hi</h1>\n<p>Body</p>"));
    }

    #[test]
    fn shortcodes_stay_literal_in_preview() {
        let frame = build_preview(&state(r#"[form id="4"]"#), &SiteConfig::default());
        assert!(frame.document.contains(r#"[form id="4"]"#));
        assert!(!frame.document.contains("widget-form"));
    }

    #[test]
    fn empty_content_shows_placeholder() {
        let s = PreviewState::default();
        let frame = build_preview(&s, &SiteConfig::default());
        assert!(frame.document.contains("preview-empty"));
    }

    #[test]
    fn synchronizer_last_write_wins() {
        let mut sync = PreviewSynchronizer::new(MemorySurface::new(), SiteConfig::default());
        sync.on_change(state("<p>one</p>")).unwrap();
        let committed = sync.on_change(state("<p>two</p>")).unwrap();
        let frames = &sync.surface().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(last_frame(frames), &committed);
        assert!(last_frame(frames).document.contains("<p>two</p>"));
        assert!(!last_frame(frames).document.contains("<p>one</p>"));
    }

    #[test]
    fn viewport_change_recommits_current_state() {
        let mut sync = PreviewSynchronizer::new(MemorySurface::new(), SiteConfig::default());
        sync.on_change(state("<p>x</p>")).unwrap();
        let resized = sync.set_viewport(Viewport::Mobile).unwrap();
        let frame = last_frame(&sync.surface().frames);
        assert_eq!(resized.as_ref(), Some(frame));
        assert_eq!(frame.width, PreviewWidth::Fixed(375));
        assert!(frame.document.contains("<p>x</p>"));
    }

    #[test]
    fn close_drops_state_and_closes_surface() {
        let mut sync = PreviewSynchronizer::new(MemorySurface::new(), SiteConfig::default());
        sync.on_change(state("<p>x</p>")).unwrap();
        sync.close();
        assert!(sync.state().is_none());
        assert!(sync.surface().closed);
        // Resizing a closed preview commits nothing
        assert_eq!(sync.set_viewport(Viewport::Tablet).unwrap(), None);
        assert_eq!(sync.surface().frames.len(), 1);
    }

    #[test]
    fn file_surface_writes_host_page() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/preview.html");
        let mut surface = FileSurface::new(&path, &SiteConfig::default());
        let mut s = state("<p>hi</p>");
        s.viewport = Viewport::Tablet;
        surface
            .commit(&build_preview(&s, &SiteConfig::default()))
            .unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("width: 768px"));
        assert!(html.contains(r#"data-viewport="tablet""#));
        assert!(html.contains(r#"sandbox="allow-scripts allow-forms allow-popups""#));
        assert!(html.contains("&lt;p&gt;hi&lt;/p&gt;"));
    }
}
