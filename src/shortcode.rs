//! Shortcode scanning and expansion.
//!
//! Shortcodes are bracket directives embedded in markup that stand in for
//! widgets, e.g. `[form id="4"]`. They are recognised by a small grammar:
//!
//! ```text
//! token     = "[" name { ws attribute } [ ws ] [ "/" ] "]"
//! name      = letter { letter | digit | "_" | "-" }
//! attribute = key "=" value | key
//! value     = '"' … '"' | "'" … "'" | bare
//! ```
//!
//! Anything that does not fit the grammar (closing tags like `[/form]`,
//! `[1]`, stray brackets) is plain text.
//!
//! ## Where expansion happens
//!
//! Widget resolvers produce markup that depends on the host page, so tokens
//! are only expanded when content is injected directly into a template
//! ([`RenderPath::Direct`]). Content rendered as an isolated document keeps
//! its tokens literally; [`process`] then reports the registered widget names
//! it found as an [`Advisory`] so the page can show a warning banner.
//!
//! Expansion is a single left-to-right pass. Resolver output is never
//! rescanned, so expanding twice gives the same result as expanding once
//! whenever no resolver emits further tokens.

use maud::{Markup, html};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Range;

/// A parsed shortcode occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcodeToken {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    /// The exact source text of the token.
    pub raw: String,
    /// Byte range of `raw` within the scanned markup.
    pub span: Range<usize>,
}

/// Resolves widget shortcodes to markup.
pub trait WidgetResolver {
    /// Markup for a token, or `None` to leave the token as written.
    fn resolve(&self, name: &str, attributes: &BTreeMap<String, String>) -> Option<String>;

    /// Whether `name` refers to a known widget.
    fn is_registered(&self, name: &str) -> bool;
}

type ResolveFn = Box<dyn Fn(&BTreeMap<String, String>) -> Option<String> + Send + Sync>;

/// Name → resolver table supplied by the host application.
#[derive(Default)]
pub struct WidgetRegistry {
    resolvers: HashMap<String, ResolveFn>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in widgets (`form`).
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("form", form_widget);
        registry
    }

    pub fn register<F>(&mut self, name: &str, resolve: F) -> &mut Self
    where
        F: Fn(&BTreeMap<String, String>) -> Option<String> + Send + Sync + 'static,
    {
        self.resolvers.insert(name.to_string(), Box::new(resolve));
        self
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("widgets", &self.names())
            .finish()
    }
}

impl WidgetResolver for WidgetRegistry {
    fn resolve(&self, name: &str, attributes: &BTreeMap<String, String>) -> Option<String> {
        self.resolvers.get(name).and_then(|resolve| resolve(attributes))
    }

    fn is_registered(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }
}

/// Built-in `[form id="…"]` widget: a mount point the host page's form
/// component attaches to. Without an `id` the token stays literal.
pub fn form_widget(attributes: &BTreeMap<String, String>) -> Option<String> {
    let id = attributes.get("id").map(|id| id.trim()).filter(|id| !id.is_empty())?;
    let markup = html! {
        div.widget-form data-form-id=(id) data-form-title=[attributes.get("title")] {
            noscript { "This form requires JavaScript." }
        }
    };
    Some(markup.into_string())
}

// ============================================================================
// Scanner
// ============================================================================

/// Find every well-formed shortcode in `markup`, in source order.
pub fn scan(markup: &str) -> Vec<ShortcodeToken> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while let Some(offset) = markup[pos..].find('[') {
        let start = pos + offset;
        match parse_token(markup, start) {
            Some(token) => {
                pos = token.span.end;
                tokens.push(token);
            }
            None => pos = start + 1,
        }
    }
    tokens
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace; true if any was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn ident(&mut self) -> Option<String> {
        let rest = self.rest();
        if !rest.chars().next()?.is_ascii_alphabetic() {
            return None;
        }
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(rest.len());
        self.pos += len;
        Some(rest[..len].to_string())
    }

    fn value(&mut self) -> Option<String> {
        match self.peek()? {
            quote @ ('"' | '\'') => {
                self.bump();
                let rest = self.rest();
                let len = rest.find(quote)?;
                self.pos += len + quote.len_utf8();
                Some(rest[..len].to_string())
            }
            _ => {
                let rest = self.rest();
                let len = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, ']' | '"' | '\''))
                    .unwrap_or(rest.len());
                if len == 0 {
                    return None;
                }
                self.pos += len;
                Some(rest[..len].to_string())
            }
        }
    }
}

fn parse_token(src: &str, start: usize) -> Option<ShortcodeToken> {
    let mut cursor = Cursor {
        src,
        pos: start + 1,
    };
    let name = cursor.ident()?;
    let mut attributes = BTreeMap::new();
    loop {
        let spaced = cursor.skip_ws();
        match cursor.peek()? {
            ']' => {
                cursor.bump();
                break;
            }
            '/' => {
                cursor.bump();
                if cursor.bump()? != ']' {
                    return None;
                }
                break;
            }
            _ if !spaced => return None,
            _ => {
                let key = cursor.ident()?;
                let value = if cursor.peek() == Some('=') {
                    cursor.bump();
                    cursor.value()?
                } else {
                    String::new()
                };
                attributes.insert(key, value);
            }
        }
    }
    let end = cursor.pos;
    Some(ShortcodeToken {
        name,
        attributes,
        raw: src[start..end].to_string(),
        span: start..end,
    })
}

// ============================================================================
// Expansion
// ============================================================================

/// Replace every resolvable token with its widget markup.
///
/// Unknown names and tokens the resolver declines stay as literal text.
pub fn expand(markup: &str, resolver: &dyn WidgetResolver) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut last = 0;
    for token in scan(markup) {
        match resolver.resolve(&token.name, &token.attributes) {
            Some(widget) => {
                out.push_str(&markup[last..token.span.start]);
                out.push_str(&widget);
                last = token.span.end;
            }
            None => log::debug!("leaving shortcode {} unexpanded", token.raw),
        }
    }
    out.push_str(&markup[last..]);
    out
}

/// How the content reaches the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    /// Injected into the host page inside a template wrapper.
    Direct,
    /// Rendered as its own document inside a sandbox.
    Isolated,
}

/// Widget shortcodes found in content that cannot expand them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    /// Distinct widget names, in order of first appearance.
    pub names: Vec<String>,
}

impl Advisory {
    pub fn message(&self) -> String {
        let list = self
            .names
            .iter()
            .map(|name| format!("[{name}]"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Shortcodes {list} are not expanded: this page is a standalone HTML document, \
             and widgets only run inside a site template."
        )
    }

    /// Non-blocking warning banner.
    pub fn to_markup(&self) -> Markup {
        html! {
            div.shortcode-advisory role="status" { (self.message()) }
        }
    }
}

/// Outcome of running shortcodes for one render path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub markup: String,
    pub advisory: Option<Advisory>,
}

/// Expand for direct injection, or only detect for isolated documents.
///
/// On the isolated path the markup is returned unchanged and an advisory
/// lists the registered widgets that would have been expanded. Bracketed text
/// that does not name a widget (`items[i]` in a script) is not reported.
pub fn process(markup: &str, path: RenderPath, resolver: &dyn WidgetResolver) -> Processed {
    match path {
        RenderPath::Direct => Processed {
            markup: expand(markup, resolver),
            advisory: None,
        },
        RenderPath::Isolated => {
            let mut names: Vec<String> = Vec::new();
            for token in scan(markup) {
                if resolver.is_registered(&token.name) && !names.contains(&token.name) {
                    names.push(token.name);
                }
            }
            let advisory = (!names.is_empty()).then(|| {
                log::warn!("isolated document contains unexpandable shortcodes: {names:?}");
                Advisory { names }
            });
            Processed {
                markup: markup.to_string(),
                advisory,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn scan_finds_token_with_attributes() {
        let tokens = scan(r#"<p>Contact us</p>[form id="4" title='Hello there']"#);
        assert_eq!(tokens.len(), 1);
        let token = &tokens[0];
        assert_eq!(token.name, "form");
        assert_eq!(token.attributes, attrs(&[("id", "4"), ("title", "Hello there")]));
        assert_eq!(token.raw, r#"[form id="4" title='Hello there']"#);
    }

    #[test]
    fn scan_records_byte_span() {
        let markup = "ab[gallery]cd";
        let tokens = scan(markup);
        assert_eq!(tokens[0].span, 2..11);
        assert_eq!(&markup[tokens[0].span.clone()], "[gallery]");
    }

    #[test]
    fn scan_handles_bare_and_flag_attributes() {
        let tokens = scan("[map zoom=12 interactive]");
        assert_eq!(
            tokens[0].attributes,
            attrs(&[("zoom", "12"), ("interactive", "")])
        );
    }

    #[test]
    fn scan_accepts_self_closing_form() {
        let tokens = scan(r#"[form id="4" /]"#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].attributes, attrs(&[("id", "4")]));
    }

    #[test]
    fn scan_finds_multiple_tokens_in_order() {
        let names: Vec<String> = scan("[a] text [b x=1] more [c]")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn scan_ignores_non_tokens() {
        assert!(scan("[/form]").is_empty());
        assert!(scan("[1]").is_empty());
        assert!(scan("[ form]").is_empty());
        assert!(scan("[form id=\"4\"").is_empty());
        assert!(scan("[form\"x\"]").is_empty());
        assert!(scan("no brackets").is_empty());
    }

    #[test]
    fn scan_recovers_after_broken_prefix() {
        let tokens = scan(r#"[broken [form id="4"]"#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name, "form");
    }

    #[test]
    fn scan_handles_multibyte_text() {
        let tokens = scan("héllo [form id=\"ü\"] wörld");
        assert_eq!(tokens[0].attributes["id"], "ü");
    }

    #[test]
    fn expand_substitutes_resolver_output() {
        let registry = WidgetRegistry::standard();
        let out = expand(r#"<p>Hi</p>[form id="4"]"#, &registry);
        assert!(out.starts_with("<p>Hi</p><div class=\"widget-form\""));
        assert!(out.contains(r#"data-form-id="4""#));
        assert!(!out.contains("[form"));
    }

    #[test]
    fn expand_leaves_unknown_names_literal() {
        let registry = WidgetRegistry::standard();
        let markup = "before [gallery id=\"2\"] after";
        assert_eq!(expand(markup, &registry), markup);
    }

    #[test]
    fn expand_leaves_declined_tokens_literal() {
        let registry = WidgetRegistry::standard();
        assert_eq!(expand("[form]", &registry), "[form]");
    }

    #[test]
    fn expand_is_idempotent_without_nested_tokens() {
        let mut registry = WidgetRegistry::standard();
        registry.register("year", |_| Some("2026".to_string()));
        let markup = r#"<p>© [year]</p>[form id="9"] [unknown]"#;
        let once = expand(markup, &registry);
        assert_eq!(expand(&once, &registry), once);
    }

    #[test]
    fn expand_does_not_recurse_into_output() {
        let mut registry = WidgetRegistry::new();
        registry.register("outer", |_| Some("[inner]".to_string()));
        registry.register("inner", |_| Some("INNER".to_string()));
        assert_eq!(expand("[outer]", &registry), "[inner]");
    }

    #[test]
    fn form_widget_escapes_attributes() {
        let html = form_widget(&attrs(&[("id", "4\"><script>")])).unwrap();
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn form_widget_carries_title() {
        let html = form_widget(&attrs(&[("id", "4"), ("title", "Join")])).unwrap();
        assert!(html.contains(r#"data-form-title="Join""#));
    }

    #[test]
    fn process_direct_expands() {
        let registry = WidgetRegistry::standard();
        let result = process(r#"[form id="4"]"#, RenderPath::Direct, &registry);
        assert!(result.markup.contains("widget-form"));
        assert_eq!(result.advisory, None);
    }

    #[test]
    fn process_isolated_keeps_tokens_and_advises() {
        let registry = WidgetRegistry::standard();
        let markup = r#"<p>Sign up</p>[form id="4"] and [form id="5"]"#;
        let result = process(markup, RenderPath::Isolated, &registry);
        assert_eq!(result.markup, markup);
        let advisory = result.advisory.unwrap();
        assert_eq!(advisory.names, vec!["form".to_string()]);
        assert!(advisory.message().contains("[form]"));
        assert!(advisory.to_markup().into_string().contains("shortcode-advisory"));
    }

    #[test]
    fn process_isolated_ignores_unregistered_brackets() {
        let registry = WidgetRegistry::standard();
        let markup = "<script>var x = items[i]; y = map[key];</script>";
        let result = process(markup, RenderPath::Isolated, &registry);
        assert_eq!(result.advisory, None);
    }

    #[test]
    fn registry_lists_names() {
        let mut registry = WidgetRegistry::standard();
        registry.register("clock", |_| None);
        assert_eq!(registry.names(), vec!["clock", "form"]);
        assert!(registry.is_registered("form"));
        assert!(!registry.is_registered("gallery"));
    }
}
