//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! The primary display for a page is its slug; what the pipeline decided
//! about it (format, template, render path) follows as indented context
//! lines. Output files are shown after an arrow.
//!
//! # Output Format
//!
//! ## Classify
//!
//! ```text
//! landing
//!     Format: full-document
//!     Template: custom-html (stored: default)
//!     Status: published
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 about → about.html
//! 002 landing → landing.html (isolated)
//!     Advisory: [form] not expanded
//! 003 drafts/idea (page not available)
//!
//! Rendered 2 pages, 1 not available
//! ```
//!
//! ## Preview
//!
//! ```text
//! Preview (mobile, 375px) → dist/preview.html
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::detect;
use crate::preview::{PreviewFrame, PreviewWidth};
use crate::render::{RenderError, RenderPlan};
use crate::types::{Page, StoredContent};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Result line for one rendered page.
///
/// ```text
/// about → about.html
/// landing → landing.html (isolated)
/// drafts/idea (page not available)
/// ```
fn render_line(slug: &str, result: &Result<RenderPlan, RenderError>) -> String {
    match result {
        Ok(plan) if plan.isolated => format!("{slug} \u{2192} {slug}.html (isolated)"),
        Ok(_) => format!("{slug} \u{2192} {slug}.html"),
        Err(e) => format!("{slug} ({e})"),
    }
}

fn advisory_lines(result: &Result<RenderPlan, RenderError>, depth: usize) -> Vec<String> {
    let Ok(RenderPlan {
        advisory: Some(advisory),
        ..
    }) = result
    else {
        return Vec::new();
    };
    let names = advisory
        .names
        .iter()
        .map(|n| format!("[{n}]"))
        .collect::<Vec<_>>()
        .join(", ");
    vec![format!("{}Advisory: {names} not expanded", indent(depth))]
}

// ============================================================================
// Classify
// ============================================================================

pub fn format_classify(page: &Page) -> Vec<String> {
    let format = detect::classify(page.content.as_ref());
    let effective = detect::effective_template(&page.template, format);
    let template = if effective == page.template {
        effective.to_string()
    } else {
        format!("{effective} (stored: {})", page.template)
    };

    let mut lines = vec![
        page.slug.clone(),
        format!("{}Format: {}", indent(1), format.as_str()),
        format!("{}Template: {template}", indent(1)),
        format!(
            "{}Status: {}",
            indent(1),
            if page.is_published() { "published" } else { "draft" }
        ),
    ];
    if !page.title.is_empty() {
        lines.insert(1, format!("{}Title: {}", indent(1), page.title));
    }
    if let Some(StoredContent::Blocks(blocks)) = &page.content {
        lines.push(format!("{}Blocks: {}", indent(1), blocks.len()));
    }
    lines
}

pub fn print_classify(page: &Page) {
    for line in format_classify(page) {
        println!("{}", line);
    }
}

// ============================================================================
// Render / Build
// ============================================================================

pub fn format_render(slug: &str, result: &Result<RenderPlan, RenderError>) -> Vec<String> {
    let mut lines = vec![render_line(slug, result)];
    lines.extend(advisory_lines(result, 1));
    lines
}

pub fn print_render(slug: &str, result: &Result<RenderPlan, RenderError>) {
    for line in format_render(slug, result) {
        println!("{}", line);
    }
}

/// Indexed list of every page rendered by `build`, plus a summary line.
pub fn format_build_output(results: &[(String, Result<RenderPlan, RenderError>)]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (slug, result)) in results.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), render_line(slug, result)));
        lines.extend(advisory_lines(result, 1));
    }

    let rendered = results.iter().filter(|(_, r)| r.is_ok()).count();
    let unavailable = results.len() - rendered;
    if !lines.is_empty() {
        lines.push(String::new());
    }
    let mut summary = format!("Rendered {}", plural(rendered, "page"));
    if unavailable > 0 {
        summary.push_str(&format!(", {unavailable} not available"));
    }
    lines.push(summary);
    lines
}

pub fn print_build_output(results: &[(String, Result<RenderPlan, RenderError>)]) {
    for line in format_build_output(results) {
        println!("{}", line);
    }
}

// ============================================================================
// Preview
// ============================================================================

pub fn format_preview(frame: &PreviewFrame, path: &Path) -> Vec<String> {
    let width = match frame.width {
        PreviewWidth::Full => "full width".to_string(),
        PreviewWidth::Fixed(px) => format!("{px}px"),
    };
    vec![format!(
        "Preview ({}, {width}) \u{2192} {}",
        frame.viewport,
        path.display()
    )]
}

pub fn print_preview(frame: &PreviewFrame, path: &Path) {
    for line in format_preview(frame, path) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::preview::{PreviewState, Viewport, build_preview};
    use crate::render::render;
    use crate::shortcode::WidgetRegistry;
    use crate::test_helpers::*;
    use crate::types::{PageStatus, TemplateId};

    fn rendered(page: &Page) -> Result<RenderPlan, RenderError> {
        render(Some(page), &WidgetRegistry::standard(), &SiteConfig::default())
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "page"), "1 page");
        assert_eq!(plural(0, "page"), "0 pages");
        assert_eq!(plural(3, "page"), "3 pages");
    }

    // =========================================================================
    // Classify
    // =========================================================================

    #[test]
    fn classify_fragment() {
        let mut page = published_page("about", "<p>x</p>");
        page.title = "About".to_string();
        assert_eq!(
            format_classify(&page),
            vec![
                "about",
                "    Title: About",
                "    Format: markup-fragment",
                "    Template: default",
                "    Status: published",
            ]
        );
    }

    #[test]
    fn classify_full_document_shows_override() {
        let mut page = published_page("landing", "<!DOCTYPE html><html></html>");
        page.title = String::new();
        page.status = PageStatus::Draft;
        page.template = TemplateId::Blank;
        let lines = format_classify(&page);
        assert_eq!(lines[1], "    Format: full-document");
        assert_eq!(lines[2], "    Template: custom-html (stored: blank)");
        assert_eq!(lines[3], "    Status: draft");
    }

    #[test]
    fn classify_counts_blocks() {
        let page = draft_blocks_page("b", vec![text("a"), text("b")]);
        let lines = format_classify(&page);
        assert_eq!(lines.last().unwrap(), "    Blocks: 2");
    }

    // =========================================================================
    // Render / Build
    // =========================================================================

    #[test]
    fn render_direct_line() {
        let result = rendered(&published_page("about", "<p>x</p>"));
        assert_eq!(format_render("about", &result), vec!["about \u{2192} about.html"]);
    }

    #[test]
    fn render_isolated_with_advisory() {
        let result = rendered(&published_page(
            "landing",
            r#"<html><body>[form id="4"]</body></html>"#,
        ));
        assert_eq!(
            format_render("landing", &result),
            vec![
                "landing \u{2192} landing.html (isolated)",
                "    Advisory: [form] not expanded",
            ]
        );
    }

    #[test]
    fn render_not_available() {
        let result = render(None, &WidgetRegistry::standard(), &SiteConfig::default());
        assert_eq!(format_render("gone", &result), vec!["gone (page not available)"]);
    }

    #[test]
    fn build_output_lists_and_summarises() {
        let mut draft = published_page("idea", "<p>x</p>");
        draft.status = PageStatus::Draft;
        let results = vec![
            ("about".to_string(), rendered(&published_page("about", "<p>x</p>"))),
            ("idea".to_string(), rendered(&draft)),
        ];
        assert_eq!(
            format_build_output(&results),
            vec![
                "001 about \u{2192} about.html",
                "002 idea (page not available)",
                "",
                "Rendered 1 page, 1 not available",
            ]
        );
    }

    #[test]
    fn build_output_empty_store() {
        assert_eq!(format_build_output(&[]), vec!["Rendered 0 pages"]);
    }

    // =========================================================================
    // Preview
    // =========================================================================

    #[test]
    fn preview_line_shows_viewport_width() {
        let state = PreviewState {
            viewport: Viewport::Mobile,
            ..PreviewState::default()
        };
        let frame = build_preview(&state, &SiteConfig::default());
        assert_eq!(
            format_preview(&frame, Path::new("dist/preview.html")),
            vec!["Preview (mobile, 375px) \u{2192} dist/preview.html"]
        );
    }

    #[test]
    fn preview_line_desktop_is_full_width() {
        let frame = build_preview(&PreviewState::default(), &SiteConfig::default());
        assert_eq!(
            format_preview(&frame, Path::new("p.html")),
            vec!["Preview (desktop, full width) \u{2192} p.html"]
        );
    }
}
