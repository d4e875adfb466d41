//! # Pagewright
//!
//! The content pipeline of a page builder. A page's body is stored in one of
//! three shapes, and this crate turns each of them into something safe to
//! show a visitor or an editor:
//!
//! - a **markup fragment** written in a rich-text editor,
//! - a **block sequence** of typed blocks (heading, image, video, ...),
//! - a **full document**, a complete HTML document the editor pasted in.
//!
//! # Architecture: One Pipeline, Two Consumers
//!
//! ```text
//!               ┌──────────┐   ┌──────────┐   ┌───────────┐
//! content ────→ │  detect  │──→│  blocks  │──→│ shortcode │──→ fragment
//!               └──────────┘   └──────────┘   └───────────┘
//!                    │ full document
//!                    └─────────────────────────────────────────→ document
//!
//! publish:  render  → RenderPlan → sandboxed iframe or page template
//! authoring: preview → PreviewFrame → PreviewSurface
//! ```
//!
//! Publishing and the live preview share the detector and block compiler, so
//! what the editor sees is what the visitor gets.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Page records, stored content, blocks, templates |
//! | [`detect`] | Classifies stored content; the only constructor of [`detect::ContentValue`] |
//! | [`blocks`] | Compiles a block sequence into a markup fragment |
//! | [`shortcode`] | `[name key="value"]` scanner, widget registry, expand-or-advise decision |
//! | [`render`] | Page → render plan → visitor document (direct or sandboxed) |
//! | [`preview`] | Pure preview builder plus the surfaces it commits to |
//! | [`editor`] | Editing modes, mode switching, and the editor session |
//! | [`autosave`] | Clock-injected debounce timer for auto-save |
//! | [`store`] | Page storage seam with in-memory and JSON-directory stores |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Content Shape Is the Format
//!
//! Whether content is a string or an array decides its format, and a string
//! that starts with `<!DOCTYPE` or `<html` is always a full document. The
//! stored template never overrides this: a full document is rendered with the
//! `custom-html` template even if the record says otherwise.
//!
//! ## Full Documents Run Isolated
//!
//! A full document carries its own `<head>`, styles and scripts. Injecting it
//! into the host template would break both, so it is shown inside an iframe
//! with a `sandbox` attribute and `srcdoc`. Widgets cannot run in there; the
//! shortcodes are detected and reported in an advisory banner instead.
//!
//! ## Drafts Look Missing
//!
//! [`render::render`] returns the same [`render::RenderError::NotAvailable`]
//! for a missing slug and for a draft, so a visitor cannot learn that an
//! unpublished page exists.
//!
//! ## Maud for Markup
//!
//! Documents and most blocks are built with [Maud](https://maud.lambda.xyz/):
//! interpolation is escaped by default, and author-supplied markup is opted
//! in explicitly with `PreEscaped`.
//!
//! ## Mode Switches Keep a Side Buffer
//!
//! Switching between block mode and a text mode empties the content. The
//! [`editor::EditorSession`] keeps the dropped value so it can be recovered,
//! but it never restores it on its own.

pub mod autosave;
pub mod blocks;
pub mod config;
pub mod detect;
pub mod editor;
pub mod output;
pub mod preview;
pub mod render;
pub mod shortcode;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
