//! Block sequence compilation.
//!
//! Turns an ordered list of [`Block`]s into a markup fragment. Each block is
//! compiled on its own and the results are joined with a single newline, so
//! the output for a sequence is always the concatenation of its segments:
//!
//! ```text
//! [heading "Hi" level=h1, text "<p>Body</p>"]  →  "<h1>Hi</h1>\n<p>Body</p>"
//! ```
//!
//! ## Rules per block type
//!
//! | Type | Output |
//! |------|--------|
//! | `text` | content verbatim |
//! | `heading` | `<hN>` with `settings.level`, default from config |
//! | `image` | `<img>` with `settings.alt` (default empty) |
//! | `video` | YouTube/Vimeo iframe, native `<video>`, or an invalid-URL notice |
//! | `code` | `<pre><code class="language-…">` with `&`, `<`, `>` escaped |
//! | `quote` | `<blockquote>`, plus `<cite>` when `settings.author` is set |
//! | `html` | content verbatim |
//!
//! Blocks of unknown type compile to an empty segment and are logged; the
//! rest of the sequence is unaffected.

use crate::config::BlocksConfig;
use crate::types::{Block, BlockKind};
use maud::{Markup, PreEscaped, html};
use regex::Regex;
use std::sync::LazyLock;

/// Separator between compiled block segments.
pub const SEPARATOR: &str = "\n";

static YOUTUBE_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.|m\.)?(?:youtube\.com|youtu\.be)(?:[/?#]|$)")
        .expect("valid regex")
});

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|embed/|shorts/)|youtu\.be/)([A-Za-z0-9_-]+)",
    )
    .expect("valid regex")
});

static VIMEO_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.|player\.)?vimeo\.com(?:[/?#]|$)").expect("valid regex")
});

static VIMEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vimeo\.com/(?:video/)?(\d+)").expect("valid regex"));

/// Compile a block sequence with the stock fallbacks.
pub fn compile(blocks: &[Block]) -> String {
    compile_with(blocks, &BlocksConfig::default())
}

/// Compile a block sequence, using `options` for unset heading levels and
/// code languages.
pub fn compile_with(blocks: &[Block], options: &BlocksConfig) -> String {
    blocks
        .iter()
        .map(|block| compile_block(block, options))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Compile a single block to its markup segment.
pub fn compile_block(block: &Block, options: &BlocksConfig) -> String {
    let Some(kind) = block.kind() else {
        log::warn!("skipping block with unrecognized type {:?}", block.kind);
        return String::new();
    };
    match kind {
        BlockKind::Text | BlockKind::Html => block.content.clone(),
        BlockKind::Heading => render_heading(block, options),
        BlockKind::Image => render_image(block).into_string(),
        BlockKind::Video => render_video(&block.content).into_string(),
        BlockKind::Code => render_code(block, options).into_string(),
        BlockKind::Quote => render_quote(block).into_string(),
    }
}

/// Heading level from `settings.level`: accepts `h1`..`h6` or `1`..`6`.
fn heading_level(block: &Block, options: &BlocksConfig) -> u8 {
    block
        .setting("level")
        .and_then(|level| {
            let digits = level
                .strip_prefix('h')
                .or_else(|| level.strip_prefix('H'))
                .unwrap_or(level);
            digits.parse::<u8>().ok()
        })
        .filter(|level| (1..=6).contains(level))
        .unwrap_or(options.heading_level)
}

fn render_heading(block: &Block, options: &BlocksConfig) -> String {
    let level = heading_level(block, options);
    format!("<h{level}>{}</h{level}>", block.content)
}

fn render_image(block: &Block) -> Markup {
    let alt = block.setting("alt").unwrap_or("");
    html! {
        img src=(block.content.trim()) alt=(alt);
    }
}

fn render_code(block: &Block, options: &BlocksConfig) -> Markup {
    let language = block
        .setting("language")
        .unwrap_or(options.code_language.as_str());
    let escaped = html_escape::encode_text(&block.content);
    html! {
        pre {
            code class={ "language-" (language) } { (PreEscaped(escaped)) }
        }
    }
}

fn render_quote(block: &Block) -> Markup {
    html! {
        blockquote {
            (PreEscaped(&block.content))
            @if let Some(author) = block.setting("author") {
                cite { (author) }
            }
        }
    }
}

/// Where a video URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    YouTube(String),
    Vimeo(String),
    /// Any other http(s) URL, played with a native `<video>` element.
    Native(String),
    /// A provider URL without an identifier, or not a URL at all.
    Invalid,
}

impl VideoSource {
    pub fn embed_url(&self) -> Option<String> {
        match self {
            VideoSource::YouTube(id) => Some(format!("https://www.youtube.com/embed/{id}")),
            VideoSource::Vimeo(id) => Some(format!("https://player.vimeo.com/video/{id}")),
            VideoSource::Native(_) | VideoSource::Invalid => None,
        }
    }
}

/// Classify a video URL by provider and extract its identifier.
pub fn parse_video_url(url: &str) -> VideoSource {
    let url = url.trim();
    if YOUTUBE_HOST.is_match(url) {
        return YOUTUBE_ID
            .captures(url)
            .map(|caps| VideoSource::YouTube(caps[1].to_string()))
            .unwrap_or(VideoSource::Invalid);
    }
    if VIMEO_HOST.is_match(url) {
        return VIMEO_ID
            .captures(url)
            .map(|caps| VideoSource::Vimeo(caps[1].to_string()))
            .unwrap_or(VideoSource::Invalid);
    }
    let has_scheme = url.starts_with("http://") || url.starts_with("https://");
    let has_host = url
        .split_once("://")
        .map(|(_, rest)| !rest.is_empty() && !rest.starts_with('/'))
        .unwrap_or(false);
    if has_scheme && has_host && !url.contains(char::is_whitespace) {
        VideoSource::Native(url.to_string())
    } else {
        VideoSource::Invalid
    }
}

fn render_video(url: &str) -> Markup {
    let source = parse_video_url(url);
    if let Some(embed) = source.embed_url() {
        return html! {
            div.video-embed {
                iframe src=(embed) title="Embedded video" frameborder="0"
                    allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture"
                    allowfullscreen {}
            }
        };
    }
    match source {
        VideoSource::Native(src) => html! {
            video.video-native controls src=(src) {
                "Your browser does not support embedded video."
            }
        },
        _ => {
            log::warn!("video block has an unusable URL: {url:?}");
            html! {
                div.embed-error role="alert" { "Invalid video URL: " (url.trim()) }
            }
        }
    }
}
