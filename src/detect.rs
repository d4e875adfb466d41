//! Content format detection.
//!
//! A stored content value carries no discriminator: a string may be a markup
//! fragment or a complete document, an array is a block sequence. This module
//! is the single place that decision is made. Everything downstream works on
//! the classified [`ContentValue`] and never inspects the raw shape again.
//!
//! ## Full documents
//!
//! A string whose trimmed text starts with a document-root marker is a full
//! document, whatever template the page has stored:
//!
//! ```text
//! "<!DOCTYPE html><html>…"   → FullDocument
//! "  <html lang=\"en\">…"    → FullDocument
//! "<html>"                   → FullDocument
//! "<htmlx>"                  → MarkupFragment
//! "<p>Hello</p>"             → MarkupFragment
//! ```
//!
//! Markers are matched case-insensitively and must be followed by whitespace,
//! `>`, `/` or the end of the string.

use crate::types::{Block, StoredContent, TemplateId};

const DOCUMENT_MARKERS: [&str; 2] = ["<!doctype", "<html"];

/// The three content formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    FullDocument,
    BlockSequence,
    MarkupFragment,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::FullDocument => "full-document",
            Format::BlockSequence => "block-sequence",
            Format::MarkupFragment => "markup-fragment",
        }
    }
}

/// Classified content. Only [`ContentValue::from_stored`] constructs it.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentValue {
    /// Self-contained document, opaque to the compiler.
    FullDocument(String),
    BlockSequence(Vec<Block>),
    /// Rich-text markup meant for a template wrapper.
    MarkupFragment(String),
}

impl ContentValue {
    pub fn from_stored(content: Option<StoredContent>) -> Self {
        let value = match content {
            Some(StoredContent::Blocks(blocks)) => ContentValue::BlockSequence(blocks),
            Some(StoredContent::Text(text)) if is_full_document(&text) => {
                ContentValue::FullDocument(text)
            }
            Some(StoredContent::Text(text)) => ContentValue::MarkupFragment(text),
            None => ContentValue::MarkupFragment(String::new()),
        };
        log::debug!("classified content as {}", value.format().as_str());
        value
    }

    pub fn format(&self) -> Format {
        match self {
            ContentValue::FullDocument(_) => Format::FullDocument,
            ContentValue::BlockSequence(_) => Format::BlockSequence,
            ContentValue::MarkupFragment(_) => Format::MarkupFragment,
        }
    }
}

/// Classify without taking ownership of the content.
pub fn classify(content: Option<&StoredContent>) -> Format {
    match content {
        Some(StoredContent::Blocks(_)) => Format::BlockSequence,
        Some(StoredContent::Text(text)) if is_full_document(text) => Format::FullDocument,
        _ => Format::MarkupFragment,
    }
}

/// Whether a string is a complete document rather than a fragment.
pub fn is_full_document(text: &str) -> bool {
    let trimmed = text.trim_start();
    DOCUMENT_MARKERS
        .iter()
        .any(|marker| starts_with_marker(trimmed, marker))
}

fn starts_with_marker(text: &str, marker: &str) -> bool {
    let Some(head) = text.get(..marker.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(marker) {
        return false;
    }
    match text[marker.len()..].chars().next() {
        None => true,
        Some(c) => c == '>' || c == '/' || c.is_whitespace(),
    }
}

/// The template a page renders with.
///
/// Full documents always render as `custom-html`; the stored template is
/// returned for every other format. The page record itself is not touched.
pub fn effective_template(stored: &TemplateId, format: Format) -> TemplateId {
    match format {
        Format::FullDocument => TemplateId::CustomHtml,
        _ => stored.clone(),
    }
}
