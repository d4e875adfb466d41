//! Render dispatch: page record → render plan → visitor document.
//!
//! [`render`] decides how a page reaches the visitor. It is a short state
//! machine with no cycles:
//!
//! ```text
//! page ──(missing or not published)──────────────→ NotAvailable
//!   │
//!   └→ classify ──FullDocument──────────────────→ IsolatedDocument
//!          │
//!          └──BlockSequence / MarkupFragment────→ DirectFragment
//! ```
//!
//! - **IsolatedDocument**: the author's document is kept byte for byte and
//!   shown inside a sandboxed iframe. The template is forced to
//!   `custom-html`, custom CSS/JS are not applied (the document carries its
//!   own), and shortcodes are only scanned to produce an advisory banner.
//! - **DirectFragment**: blocks are compiled, shortcodes expanded, and the
//!   fragment is wrapped in the page's template with the title header (unless
//!   `hide_title`) and the page's custom CSS/JS.
//!
//! Missing and unpublished pages produce the same [`RenderError::NotAvailable`]
//! so visitors cannot probe for drafts. Nothing else fails: bad blocks and bad
//! video URLs degrade to substitute markup inside the plan.
//!
//! [`RenderPlan::to_document`] turns a plan into the final HTML using maud.

use crate::blocks;
use crate::config::{self, SiteConfig};
use crate::detect::{self, ContentValue};
use crate::shortcode::{self, Advisory, RenderPath, WidgetResolver};
use crate::store::{self, PageStore, StoreError};
use crate::types::{Page, SeoMeta, TemplateId};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::path::{Path, PathBuf};
use thiserror::Error;

const PAGE_CSS: &str = include_str!("../static/page.css");
const ISOLATED_CSS: &str = include_str!("../static/isolated.css");

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No such page, or the page is not published. Deliberately one variant.
    #[error("page not available")]
    NotAvailable,
}

/// Everything needed to show a page to a visitor.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// Render inside a sandboxed document instead of the host template.
    pub isolated: bool,
    /// Effective template; `custom-html` for isolated plans.
    pub template: TemplateId,
    pub title: String,
    pub title_visible: bool,
    /// Expanded fragment, or the untouched document when isolated.
    pub markup: String,
    pub custom_css: Option<String>,
    pub custom_js: Option<String>,
    /// Shortcodes an isolated document could not expand.
    pub advisory: Option<Advisory>,
    pub seo: SeoMeta,
}

/// Build the render plan for a page looked up by the caller.
///
/// `page` is `None` when storage had no record for the slug.
pub fn render(
    page: Option<&Page>,
    resolver: &dyn WidgetResolver,
    config: &SiteConfig,
) -> Result<RenderPlan, RenderError> {
    let Some(page) = page else {
        log::debug!("render: page not found");
        return Err(RenderError::NotAvailable);
    };
    if !page.is_published() {
        log::debug!("render: page {:?} is not published", page.slug);
        return Err(RenderError::NotAvailable);
    }

    let content = ContentValue::from_stored(page.content.clone());
    let template = detect::effective_template(&page.template, content.format());

    let plan = match content {
        ContentValue::FullDocument(document) => {
            let processed = shortcode::process(&document, RenderPath::Isolated, resolver);
            RenderPlan {
                isolated: true,
                template,
                title: page.title.clone(),
                title_visible: false,
                markup: processed.markup,
                custom_css: None,
                custom_js: None,
                advisory: processed.advisory,
                seo: page.seo(),
            }
        }
        ContentValue::BlockSequence(blocks) => {
            let fragment = blocks::compile_with(&blocks, &config.blocks);
            direct_plan(page, template, &fragment, resolver)
        }
        ContentValue::MarkupFragment(fragment) => {
            direct_plan(page, template, &fragment, resolver)
        }
    };
    log::debug!(
        "render: page {:?} → {} ({})",
        page.slug,
        if plan.isolated { "isolated" } else { "direct" },
        plan.template
    );
    Ok(plan)
}

fn direct_plan(
    page: &Page,
    template: TemplateId,
    fragment: &str,
    resolver: &dyn WidgetResolver,
) -> RenderPlan {
    let processed = shortcode::process(fragment, RenderPath::Direct, resolver);
    RenderPlan {
        isolated: false,
        template,
        title: page.title.clone(),
        title_visible: !page.hide_title,
        markup: processed.markup,
        custom_css: non_empty(&page.custom_css),
        custom_js: non_empty(&page.custom_js),
        advisory: None,
        seo: page.seo(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Look the page up in `store` and render it.
pub fn render_slug(
    store: &dyn PageStore,
    slug: &str,
    resolver: &dyn WidgetResolver,
    config: &SiteConfig,
) -> Result<RenderPlan, RenderError> {
    let page = store.get_page(slug);
    render(page.as_ref(), resolver, config)
}

/// Where the HTML for `slug` is written under `output_dir`.
///
/// Slugs that are absolute or climb out with `..` are rejected, so the
/// result always stays inside `output_dir`.
pub fn output_path(output_dir: &Path, slug: &str) -> Result<PathBuf, StoreError> {
    store::validate_slug(slug)?;
    Ok(output_dir.join(format!("{slug}.html")))
}

impl RenderPlan {
    /// Assemble the visitor-facing HTML document.
    pub fn to_document(&self, config: &SiteConfig) -> Markup {
        if self.isolated {
            isolated_document(self, config)
        } else {
            direct_document(self, config)
        }
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Head metadata for the SEO overlay.
fn seo_head(seo: &SeoMeta) -> Markup {
    html! {
        title { (seo.document_title()) }
        @if !seo.meta_description.trim().is_empty() {
            meta name="description" content=(seo.meta_description.trim());
        }
        @if !seo.meta_keywords.trim().is_empty() {
            meta name="keywords" content=(seo.meta_keywords.trim());
        }
        @if !seo.canonical_url.trim().is_empty() {
            link rel="canonical" href=(seo.canonical_url.trim());
        }
    }
}

/// Template wrapper for directly injected content.
///
/// The `blank` template skips the baseline stylesheet so the page's own
/// custom CSS is the only styling.
fn direct_document(plan: &RenderPlan, config: &SiteConfig) -> Markup {
    let baseline = (plan.template != TemplateId::Blank)
        .then(|| format!("{}\n\n{}", config::generate_color_css(&config.colors), PAGE_CSS));
    let template_class = format!("page-template template-{}", plan.template);

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                (seo_head(&plan.seo))
                @if let Some(css) = &baseline {
                    style { (PreEscaped(css)) }
                }
                @if let Some(css) = &plan.custom_css {
                    style.custom-css { (PreEscaped(css)) }
                }
            }
            body {
                main class=(template_class) {
                    @if plan.title_visible && !plan.title.trim().is_empty() {
                        header.page-header {
                            h1 { (plan.title) }
                        }
                    }
                    div.page-content {
                        (PreEscaped(&plan.markup))
                    }
                }
                @if let Some(js) = &plan.custom_js {
                    script.custom-js { (PreEscaped(js)) }
                }
            }
        }
    }
}

/// Host document for a full-document page: the author's document runs in a
/// sandboxed iframe and inherits nothing from the host.
fn isolated_document(plan: &RenderPlan, config: &SiteConfig) -> Markup {
    let frame_title = if plan.title.trim().is_empty() {
        "Page"
    } else {
        plan.title.as_str()
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                (seo_head(&plan.seo))
                style { (PreEscaped(ISOLATED_CSS)) }
            }
            body.isolated-host {
                @if let Some(advisory) = &plan.advisory {
                    (advisory.to_markup())
                }
                iframe.isolated-document
                    title=(frame_title)
                    sandbox=(config.sandbox.attribute())
                    srcdoc=(plan.markup) {}
            }
        }
    }
}

/// The page shown for missing and unpublished slugs.
pub fn not_available_document(config: &SiteConfig) -> Markup {
    let css = format!("{}\n\n{}", config::generate_color_css(&config.colors), PAGE_CSS);
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="robots" content="noindex";
                title { "Page not found" }
                style { (PreEscaped(css)) }
            }
            body {
                main.page-template.not-available {
                    h1 { "Page not found" }
                    p { "The page you are looking for does not exist or is not available." }
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
