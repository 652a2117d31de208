//! Site configuration module.
//!
//! Handles loading, validating, and merging the project's `config.toml`.
//! The file is optional and sparse: stock defaults are overridden only by the
//! keys it sets.
//!
//! ## Config File Location
//!
//! `config.toml` lives in the project root, next to the content root:
//!
//! ```text
//! my-site/
//! ├── config.toml              # Optional, overrides stock defaults
//! ├── src/                     # content_root
//! │   ├── components/          # Templates (components_dir)
//! │   │   └── post-template.html
//! │   └── pages/               # One of content_dirs
//! │       ├── index.md
//! │       └── blog/
//! │           └── first/index.md
//! └── dist/                    # output_dir (generated)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_root = "src"                 # Stripped from `_file` to form `_path`
//! content_dirs = ["pages"]             # Directories under content_root to build
//! components_dir = "components"        # Template directory under content_root
//! output_dir = "dist"                  # Where pages are written
//! default_template = "post-template.html"
//!
//! [markdown]
//! heading_ids = true                   # GitHub-style id attributes on headings
//! task_lists = true                    # `- [x]` items get task-list-item classes
//! tables = true
//! strikethrough = true
//! footnotes = false
//! smart_punctuation = false
//!
//! [processing]
//! max_processes = 4                    # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::render::RenderOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Content root, relative to the project root. Stripped from `_path`.
    pub content_root: String,
    /// Directories under the content root whose modules become posts.
    pub content_dirs: Vec<String>,
    /// Template directory, relative to the content root.
    pub components_dir: String,
    /// Output directory, relative to the project root.
    pub output_dir: String,
    /// Template for posts that don't name one.
    pub default_template: String,
    /// Markdown rendering switches.
    pub markdown: MarkdownConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_root: "src".to_string(),
            content_dirs: vec!["pages".to_string()],
            components_dir: "components".to_string(),
            output_dir: "dist".to_string(),
            default_template: "post-template.html".to_string(),
            markdown: MarkdownConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("content_root", &self.content_root),
            ("components_dir", &self.components_dir),
            ("output_dir", &self.output_dir),
            ("default_template", &self.default_template),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.content_dirs.is_empty() {
            return Err(ConfigError::Validation(
                "content_dirs must not be empty".into(),
            ));
        }
        for dir in &self.content_dirs {
            if !is_plain_relative(dir) {
                return Err(ConfigError::Validation(format!(
                    "content_dirs entry {dir:?} must be a relative path without `..`"
                )));
            }
        }
        if !is_plain_relative(&self.content_root) {
            return Err(ConfigError::Validation(
                "content_root must be a relative path without `..`".into(),
            ));
        }
        if !is_plain_relative(&self.components_dir) {
            return Err(ConfigError::Validation(
                "components_dir must be a relative path without `..`".into(),
            ));
        }
        Ok(())
    }
}

fn is_plain_relative(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Markdown rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Add GitHub-style `id` attributes to headings.
    pub heading_ids: bool,
    /// Render `- [ ]` / `- [x]` items with task-list-item classes.
    pub task_lists: bool,
    pub tables: bool,
    pub strikethrough: bool,
    pub footnotes: bool,
    /// Curly quotes, en/em dashes and ellipses.
    pub smart_punctuation: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        let options = RenderOptions::default();
        Self {
            heading_ids: options.heading_ids,
            task_lists: options.task_lists,
            tables: options.tables,
            strikethrough: options.strikethrough,
            footnotes: options.footnotes,
            smart_punctuation: options.smart_punctuation,
        }
    }
}

impl MarkdownConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            heading_ids: self.heading_ids,
            task_lists: self.task_lists,
            tables: self.tables,
            strikethrough: self.strikethrough,
            footnotes: self.footnotes,
            smart_punctuation: self.smart_punctuation,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel load/write workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, and at least one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Stock defaults as a TOML table, the base layer under `config.toml`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Layer `overlay` onto `base`.
///
/// Tables merge per key, recursively. Any other overlay value (arrays
/// included) replaces the base value outright, so a `content_dirs` list in
/// `config.toml` is never appended to the default one.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    let toml::Value::Table(overlay_table) = overlay else {
        return overlay;
    };
    let toml::Value::Table(mut merged) = base else {
        return toml::Value::Table(overlay_table);
    };
    for (key, value) in overlay_table {
        let value = match merged.remove(&key) {
            Some(existing) => merge_toml(existing, value),
            None => value,
        };
        merged.insert(key, value);
    }
    toml::Value::Table(merged)
}

/// Read `<root>/config.toml` without interpreting it. A project without
/// one yields `Ok(None)`.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let text = match fs::read_to_string(root.join("config.toml")) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(toml::from_str(&text)?))
}

/// Turn layered TOML into a checked [`SiteConfig`].
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let layered = match overlay {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: SiteConfig = layered.try_into()?;
    config.validate()?;
    Ok(config)
}

/// The project's effective configuration: `config.toml` over stock defaults.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r###"# postpress configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Directory holding content and components, relative to this file.
# It is stripped from each post's `_file` to form its `_path`.
content_root = "src"

# Directories under content_root whose files become posts.
# Each file becomes one post; posts with content become pages.
content_dirs = ["pages"]

# Template directory under content_root.
components_dir = "components"

# Where pages are written, relative to this file.
output_dir = "dist"

# Template for posts without a `template` field. It must exist in
# components_dir unless the site registers a built-in under this name.
default_template = "post-template.html"

# ---------------------------------------------------------------------------
# Markdown rendering (.md content modules)
# ---------------------------------------------------------------------------
[markdown]
# GitHub-style id attributes on headings ("## Getting Started" -> id="getting-started").
heading_ids = true

# Render "- [x]" / "- [ ]" items as <li class="task-list-item checked"> / <li class="task-list-item">.
task_lists = true

tables = true
strikethrough = true
footnotes = false

# Curly quotes, dashes and ellipses.
smart_punctuation = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for loading and writing.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"###
}
