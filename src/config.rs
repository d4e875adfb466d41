//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the site directory next to the page records and overrides the stock
//! defaults key by key.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [preview]
//! tablet_width = 768        # Simulated tablet viewport (px)
//! mobile_width = 375        # Simulated mobile viewport (px)
//!
//! [autosave]
//! delay_secs = 30           # Quiet period after the last edit before saving
//!
//! [blocks]
//! heading_level = 2         # Heading level when a heading block sets none
//! code_language = "plaintext"
//!
//! [sandbox]
//! allow = ["allow-scripts", "allow-forms", "allow-popups"]
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#111111"
//! text_muted = "#666666"
//! border = "#e0e0e0"
//! link = "#1a56db"
//! link_hover = "#123c99"
//!
//! [colors.dark]
//! background = "#0f1115"
//! text = "#e8e8e8"
//! text_muted = "#9a9a9a"
//! border = "#2c2f36"
//! link = "#7aa2ff"
//! link_hover = "#a8c2ff"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! [preview]
//! mobile_width = 390
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Simulated viewport widths for the live preview.
    pub preview: PreviewConfig,
    /// Auto-save debounce settings.
    pub autosave: AutoSaveConfig,
    /// Defaults for block settings the author left unset.
    pub blocks: BlocksConfig,
    /// Sandbox tokens for isolated documents.
    pub sandbox: SandboxConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview.mobile_width == 0 || self.preview.tablet_width == 0 {
            return Err(ConfigError::Validation(
                "preview widths must be non-zero".into(),
            ));
        }
        if self.preview.mobile_width > self.preview.tablet_width {
            return Err(ConfigError::Validation(
                "preview.mobile_width must not exceed preview.tablet_width".into(),
            ));
        }
        if self.autosave.delay_secs == 0 {
            return Err(ConfigError::Validation(
                "autosave.delay_secs must be at least 1".into(),
            ));
        }
        if !(1..=6).contains(&self.blocks.heading_level) {
            return Err(ConfigError::Validation(
                "blocks.heading_level must be 1-6".into(),
            ));
        }
        if self.blocks.code_language.trim().is_empty() {
            return Err(ConfigError::Validation(
                "blocks.code_language must not be empty".into(),
            ));
        }
        for token in &self.sandbox.allow {
            if !token.starts_with("allow-") {
                return Err(ConfigError::Validation(format!(
                    "sandbox.allow entry '{token}' is not a sandbox token"
                )));
            }
            // Scripts plus same-origin lets the document lift its own sandbox.
            if token == "allow-same-origin" {
                return Err(ConfigError::Validation(
                    "sandbox.allow must not contain allow-same-origin".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Live preview viewport presets. Desktop is always full width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub tablet_width: u32,
    pub mobile_width: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            tablet_width: 768,
            mobile_width: 375,
        }
    }
}

/// Auto-save settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoSaveConfig {
    /// Seconds of inactivity after the last edit before the draft is saved.
    pub delay_secs: u64,
}

impl AutoSaveConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self { delay_secs: 30 }
    }
}

/// Fallbacks used by the block compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlocksConfig {
    /// Heading level (1-6) for heading blocks without a usable `level`.
    pub heading_level: u8,
    /// Language tag for code blocks without a `language`.
    pub code_language: String,
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            heading_level: 2,
            code_language: "plaintext".to_string(),
        }
    }
}

/// Capabilities granted to isolated documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
    pub allow: Vec<String>,
}

impl SandboxConfig {
    /// Value for the iframe `sandbox` attribute.
    pub fn attribute(&self) -> String {
        self.allow.join(" ")
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            allow: vec![
                "allow-scripts".to_string(),
                "allow-forms".to_string(),
                "allow-popups".to_string(),
            ],
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Secondary text: badges, attributions, advisory banners.
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#666666".to_string(),
            border: "#e0e0e0".to_string(),
            link: "#1a56db".to_string(),
            link_hover: "#123c99".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0f1115".to_string(),
            text: "#e8e8e8".to_string(),
            text_muted: "#9a9a9a".to_string(),
            border: "#2c2f36".to_string(),
            link: "#7aa2ff".to_string(),
            link_hover: "#a8c2ff".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a site directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(site_dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = site_dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given site directory.
pub fn load_config(site_dir: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(site_dir)?;
    let config = resolve_config(base, overlay)?;
    log::debug!("loaded config from {}", site_dir.display());
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Pagewright Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Live preview
# ---------------------------------------------------------------------------
[preview]
# Simulated viewport widths in pixels. Desktop always uses the full width.
tablet_width = 768
mobile_width = 375

# ---------------------------------------------------------------------------
# Auto-save
# ---------------------------------------------------------------------------
[autosave]
# Seconds after the last edit before the draft is saved. Every edit restarts
# the countdown.
delay_secs = 30

# ---------------------------------------------------------------------------
# Block compiler fallbacks
# ---------------------------------------------------------------------------
[blocks]
# Heading level (1-6) for heading blocks that do not set one.
heading_level = 2

# Language tag for code blocks that do not set one.
code_language = "plaintext"

# ---------------------------------------------------------------------------
# Isolated documents
# ---------------------------------------------------------------------------
[sandbox]
# Tokens for the iframe sandbox attribute used for full-document pages.
# allow-same-origin is rejected: combined with scripts it undoes the sandbox.
allow = ["allow-scripts", "allow-forms", "allow-popups"]

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#111111"
text_muted = "#666666"    # Badges, attributions, banners
border = "#e0e0e0"
link = "#1a56db"
link_hover = "#123c99"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0f1115"
text = "#e8e8e8"
text_muted = "#9a9a9a"
border = "#2c2f36"
link = "#7aa2ff"
link_hover = "#a8c2ff"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-link: {light_link};
    --color-link-hover: {light_link_hover};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-link: {dark_link};
        --color-link-hover: {dark_link_hover};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_border = colors.light.border,
        light_link = colors.light.link,
        light_link_hover = colors.light.link_hover,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_border = colors.dark.border,
        dark_link = colors.dark.link,
        dark_link_hover = colors.dark.link_hover,
    )
}
