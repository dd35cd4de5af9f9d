//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the content root; stock defaults are overridden by whatever keys it sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! webroot = "/"             # Prefix for every emitted link (must end in "/")
//! site_title = "Notes"      # Shown in the page head and on generated pages
//! # footer = "..."          # Raw HTML appended to every markdown page
//! strict_links = false      # Fail the build on links to unknown notes
//! recent_pages = 10         # Entries in the <!-- recent-pages --> listing
//! ignore = []               # Directory names skipped during discovery
//!
//! [feed]
//! enabled = false
//! # site_url = "https://example.com"  # Required when the feed is enabled
//! description = "Recently updated notes"
//! limit = 20
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#1f2328"
//! text_muted = "#59636e"    # Navigation, heading index, tags
//! border = "#d1d9e0"
//! link = "#0969da"
//! link_hover = "#0550ae"
//!
//! [colors.dark]
//! background = "#0d1117"
//! ...
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Prefix of every emitted link, e.g. `"/"` or `"/garden/"`.
    pub webroot: String,
    /// Site name, used in page titles and on generated pages.
    pub site_title: String,
    /// Raw HTML footer appended to markdown pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    /// Fail the build when a wiki link cannot be resolved.
    pub strict_links: bool,
    /// Number of entries in the recent pages listing.
    pub recent_pages: usize,
    /// Directory names skipped during discovery (hidden entries always are).
    pub ignore: Vec<String>,
    /// RSS feed settings.
    pub feed: FeedConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            webroot: "/".to_string(),
            site_title: "Notes".to_string(),
            footer: None,
            strict_links: false,
            recent_pages: 10,
            ignore: Vec::new(),
            feed: FeedConfig::default(),
            colors: ColorConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.webroot.ends_with('/') {
            return Err(ConfigError::Validation(
                "webroot must end with '/'".into(),
            ));
        }
        if self.feed.enabled && self.feed.site_url.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Validation(
                "feed.site_url is required when feed.enabled = true".into(),
            ));
        }
        if self.feed.limit == 0 {
            return Err(ConfigError::Validation(
                "feed.limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// RSS feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Write `feed.xml` at the output root.
    pub enabled: bool,
    /// Absolute site URL used for feed item links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    /// Channel description.
    pub description: String,
    /// Maximum number of items, newest first.
    pub limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            site_url: None,
            description: "Recently updated notes".to_string(),
            limit: 20,
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
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
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Muted/secondary text (navigation, heading index, tag links).
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#1f2328".to_string(),
            text_muted: "#59636e".to_string(),
            border: "#d1d9e0".to_string(),
            link: "#0969da".to_string(),
            link_hover: "#0550ae".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0d1117".to_string(),
            text: "#e6edf3".to_string(),
            text_muted: "#9198a1".to_string(),
            border: "#3d444d".to_string(),
            link: "#4493f8".to_string(),
            link_hover: "#79b8ff".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Name of the config file in the content root. Discovery skips it.
pub const CONFIG_FILE: &str = "config.toml";

/// Layer `user` over `base`. Tables merge key by key, so `[colors.light]`
/// with one key keeps the other defaults; any other value replaces.
pub fn merge_toml(base: toml::Value, user: toml::Value) -> toml::Value {
    use toml::Value::Table;
    match (base, user) {
        (Table(mut into), Table(from)) => {
            for (key, value) in from {
                let value = match into.remove(&key) {
                    Some(old @ Table(_)) => merge_toml(old, value),
                    _ => value,
                };
                into.insert(key, value);
            }
            Table(into)
        }
        (_, user) => user,
    }
}

/// Read `config.toml` from the content root, layered over the defaults and
/// validated. A missing file means defaults.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let defaults = toml::Value::try_from(SiteConfig::default())?;
    let merged = match fs::read_to_string(root.join(CONFIG_FILE)) {
        Ok(text) => merge_toml(defaults, toml::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => defaults,
        Err(e) => return Err(e.into()),
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# notegarden configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Prefix for every link in the generated site. Must end with "/".
# Use "/garden/" when the site is served from a sub-directory.
webroot = "/"

# Site name, shown in page titles and on tag pages.
site_title = "Notes"

# Raw HTML appended to the bottom of every markdown page.
# footer = "<p>Written with care.</p>"

# Fail the build when a [[wiki link]] points at a note that does not exist.
# When false, the link text is rendered as a broken-link placeholder.
strict_links = false

# Number of pages listed wherever a note contains <!-- recent-pages -->.
recent_pages = 10

# Directory names skipped during discovery (hidden entries are always skipped).
ignore = []

# ---------------------------------------------------------------------------
# RSS feed (written to feed.xml)
# ---------------------------------------------------------------------------
[feed]
enabled = false
# Absolute URL of the published site. Required when enabled.
# site_url = "https://example.com"
description = "Recently updated notes"
# Maximum number of items, newest first.
limit = 20

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#1f2328"
text_muted = "#59636e"    # Navigation, heading index, tags
border = "#d1d9e0"
link = "#0969da"
link_hover = "#0550ae"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0d1117"
text = "#e6edf3"
text_muted = "#9198a1"
border = "#3d444d"
link = "#4493f8"
link_hover = "#79b8ff"
"##
}

impl ColorScheme {
    /// `--color-*` declarations, one per line.
    fn css_vars(&self, indent: &str) -> String {
        [
            ("bg", &self.background),
            ("text", &self.text),
            ("text-muted", &self.text_muted),
            ("border", &self.border),
            ("link", &self.link),
            ("link-hover", &self.link_hover),
        ]
        .iter()
        .map(|(name, value)| format!("{indent}--color-{name}: {value};\n"))
        .collect()
    }
}

/// The configured colors as CSS custom properties, dark scheme behind
/// `prefers-color-scheme`. Prepended to the stylesheet.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        ":root {{\n{}}}\n\n@media (prefers-color-scheme: dark) {{\n    :root {{\n{}    }}\n}}",
        colors.light.css_vars("    "),
        colors.dark.css_vars("        ")
    )
}
