//! Shared types: the page record and the stored content shapes.
//!
//! These are the types the storage collaborator hands to the pipeline and
//! receives back from the editor. They serialize to plain JSON: a page is an
//! object, its `content` is either a string or an array of block objects.
//!
//! The stored shape carries no format discriminator. Which of the three
//! content formats applies is decided by [`crate::detect`], which is the only
//! place a [`StoredContent`] is turned into a classified
//! [`ContentValue`](crate::detect::ContentValue).

use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Publication state of a page. Only published pages are rendered for visitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
}

/// Layout selection applied to non-isolated content.
///
/// Serialized as its plain name. Unknown names become [`TemplateId::Named`],
/// an empty name is treated as the default template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TemplateId {
    #[default]
    Default,
    Blank,
    /// Forced whenever the content is a full document.
    CustomHtml,
    Named(String),
}

impl TemplateId {
    pub fn as_str(&self) -> &str {
        match self {
            TemplateId::Default => "default",
            TemplateId::Blank => "blank",
            TemplateId::CustomHtml => "custom-html",
            TemplateId::Named(name) => name,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, TemplateId::Default)
    }
}

impl From<String> for TemplateId {
    fn from(name: String) -> Self {
        match name.trim() {
            "" | "default" => TemplateId::Default,
            "blank" => TemplateId::Blank,
            "custom-html" => TemplateId::CustomHtml,
            trimmed => TemplateId::Named(trimmed.to_string()),
        }
    }
}

impl From<&str> for TemplateId {
    fn from(name: &str) -> Self {
        TemplateId::from(name.to_string())
    }
}

impl From<TemplateId> for String {
    fn from(template: TemplateId) -> Self {
        match template {
            TemplateId::Named(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page record as provided by the storage collaborator.
///
/// Every field except `slug` has a default, so records with missing
/// metadata still load and render with best-effort values (empty title,
/// default template, draft status). An explicit `null` counts as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    #[serde(deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    /// Body in one of the three formats; `None` when absent or `null`.
    #[serde(
        deserialize_with = "deserialize_content",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<StoredContent>,
    #[serde(deserialize_with = "null_as_default")]
    pub template: TemplateId,
    #[serde(deserialize_with = "null_as_default")]
    pub status: PageStatus,
    #[serde(deserialize_with = "null_as_default")]
    pub hide_title: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub meta_title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub meta_description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub meta_keywords: String,
    #[serde(deserialize_with = "null_as_default")]
    pub canonical_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub custom_css: String,
    #[serde(deserialize_with = "null_as_default")]
    pub custom_js: String,
}

/// Stores backed by SQL send missing values as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Page {
    /// Read-only view of the fields the SEO overlay consumes.
    pub fn seo(&self) -> SeoMeta {
        SeoMeta {
            title: self.title.clone(),
            meta_title: self.meta_title.clone(),
            meta_description: self.meta_description.clone(),
            meta_keywords: self.meta_keywords.clone(),
            canonical_url: self.canonical_url.clone(),
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PageStatus::Published
    }
}

/// Document head metadata handed to the SEO overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeoMeta {
    pub title: String,
    pub meta_title: String,
    pub meta_description: String,
    pub meta_keywords: String,
    pub canonical_url: String,
}

impl SeoMeta {
    /// `meta_title` when set, otherwise the page title.
    pub fn document_title(&self) -> &str {
        if self.meta_title.trim().is_empty() {
            &self.title
        } else {
            &self.meta_title
        }
    }
}

/// Runtime shape of a stored content value: a string or an array of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredContent {
    Text(String),
    Blocks(Vec<Block>),
}

impl StoredContent {
    pub fn is_empty(&self) -> bool {
        match self {
            StoredContent::Text(text) => text.trim().is_empty(),
            StoredContent::Blocks(blocks) => blocks.is_empty(),
        }
    }
}

impl Default for StoredContent {
    fn default() -> Self {
        StoredContent::Text(String::new())
    }
}

impl From<&str> for StoredContent {
    fn from(text: &str) -> Self {
        StoredContent::Text(text.to_string())
    }
}

impl From<String> for StoredContent {
    fn from(text: String) -> Self {
        StoredContent::Text(text)
    }
}

impl From<Vec<Block>> for StoredContent {
    fn from(blocks: Vec<Block>) -> Self {
        StoredContent::Blocks(blocks)
    }
}

/// Lenient loader for `Page::content`.
///
/// Anything that is neither a string nor an array (numbers, objects, `null`)
/// loads as absent content. Array elements that are not block objects are
/// dropped with a warning; the remaining blocks keep their order.
fn deserialize_content<'de, D>(deserializer: D) -> Result<Option<StoredContent>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Element {
        Block(Block),
        Other(IgnoredAny),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Items(Vec<Element>),
        Other(IgnoredAny),
    }

    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(text) => Some(StoredContent::Text(text)),
        Loose::Items(items) => {
            let total = items.len();
            let blocks: Vec<Block> = items
                .into_iter()
                .filter_map(|item| match item {
                    Element::Block(block) => Some(block),
                    Element::Other(_) => None,
                })
                .collect();
            if blocks.len() != total {
                log::warn!(
                    "dropped {} content entries that are not block objects",
                    total - blocks.len()
                );
            }
            Some(StoredContent::Blocks(blocks))
        }
        Loose::Other(_) => None,
    })
}

/// The block types the compiler knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Text,
    Heading,
    Image,
    Video,
    Code,
    Quote,
    Html,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Heading => "heading",
            BlockKind::Image => "image",
            BlockKind::Video => "video",
            BlockKind::Code => "code",
            BlockKind::Quote => "quote",
            BlockKind::Html => "html",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "text" => Some(BlockKind::Text),
            "heading" => Some(BlockKind::Heading),
            "image" => Some(BlockKind::Image),
            "video" => Some(BlockKind::Video),
            "code" => Some(BlockKind::Code),
            "quote" => Some(BlockKind::Quote),
            "html" => Some(BlockKind::Html),
            _ => None,
        }
    }
}

/// One unit of a block sequence.
///
/// `kind` keeps the raw `type` string so blocks of unknown types survive a
/// load/save cycle untouched; [`Block::kind`] gives the parsed variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(
        default,
        deserialize_with = "deserialize_settings",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub settings: BTreeMap<String, String>,
}

impl Block {
    pub fn new(kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            content: content.into(),
            settings: BTreeMap::new(),
        }
    }

    pub fn with_setting(mut self, key: &str, value: impl Into<String>) -> Self {
        self.settings.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> Option<BlockKind> {
        BlockKind::parse(&self.kind)
    }

    /// A setting value, treating blank strings as unset.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Settings are string-valued, but editors write `"level": 2` as often as
/// `"level": "h2"`. Scalars are stringified, nested values and nulls dropped.
fn deserialize_settings<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::String(s) => Some((key, s)),
            serde_json::Value::Number(n) => Some((key, n.to_string())),
            serde_json::Value::Bool(b) => Some((key, b.to_string())),
            _ => None,
        })
        .collect())
}
