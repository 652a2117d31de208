//! Content modules: how a source file turns into authored post data.
//!
//! A content module "exports" one post: a table of fields where `content`
//! and `template` mean something to the pipeline and everything else is
//! passed through to templates. Loading is behind the [`ModuleLoader`]
//! trait, so a site can read modules from files ([`FileModuleLoader`]) or
//! build them in Rust from an explicit [`ModuleRegistry`].
//!
//! ## File formats
//!
//! | Extension | Post fields | `content` |
//! |-----------|-------------|-----------|
//! | `.toml` | the whole table | as authored |
//! | `.json` | the top-level object | as authored |
//! | `.md`, `.markdown` | `+++` TOML front matter | body rendered as markdown |
//! | `.html`, `.htm` | `+++` TOML front matter | body, verbatim |
//!
//! ```text
//! +++
//! title = "First post"
//! tags = ["intro"]
//! +++
//!
//! # Hello
//!
//! - [x] write the first post
//! ```
//!
//! A blank body leaves `content` as the front matter sets it (usually
//! absent), which makes the module a non-page. An empty `.toml`/`.json`
//! file, or JSON `null`, exports nothing at all.

use crate::codec;
use crate::load::LoadError;
use crate::post::value_kind;
use crate::render::{RenderMode, Renderer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Authored post data as exported by a module.
pub type PostData = Map<String, Value>;

/// Turns a discovered file into the post data it exports.
///
/// `path` is the file on disk; `file` is its `_file` string (relative to the
/// project root, `/`-separated). Returning `Ok(None)` means the module
/// exports no post.
pub trait ModuleLoader: Send + Sync {
    fn load(
        &self,
        path: &Path,
        file: &str,
        renderer: &Renderer,
    ) -> Result<Option<PostData>, LoadError>;
}

// ============================================================================
// File-backed modules
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleFormat {
    Toml,
    Json,
    Document(RenderMode),
}

impl ModuleFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "md" | "markdown" => Some(Self::Document(RenderMode::Markdown)),
            "html" | "htm" => Some(Self::Document(RenderMode::Raw)),
            _ => None,
        }
    }
}

/// Reads content modules from TOML, JSON, markdown and HTML files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileModuleLoader;

impl ModuleLoader for FileModuleLoader {
    fn load(
        &self,
        path: &Path,
        _file: &str,
        renderer: &Renderer,
    ) -> Result<Option<PostData>, LoadError> {
        let format = ModuleFormat::from_path(path)
            .ok_or_else(|| LoadError::UnsupportedModule(path.to_path_buf()))?;
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        match format {
            ModuleFormat::Toml => parse_toml(path, text),
            ModuleFormat::Json => parse_json(path, text),
            ModuleFormat::Document(mode) => parse_document(path, text, mode, renderer).map(Some),
        }
    }
}

fn parse_toml(path: &Path, text: &str) -> Result<Option<PostData>, LoadError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let table: toml::Table = toml::from_str(text).map_err(|source| LoadError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(toml_table_to_json(table)))
}

fn parse_json(path: &Path, text: &str) -> Result<Option<PostData>, LoadError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = codec::decode(text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(LoadError::NotAnObject {
            path: path.to_path_buf(),
            kind: value_kind(&other),
        }),
    }
}

fn parse_document(
    path: &Path,
    text: &str,
    mode: RenderMode,
    renderer: &Renderer,
) -> Result<PostData, LoadError> {
    let (front, body) = split_front_matter(text)
        .ok_or_else(|| LoadError::UnterminatedFrontMatter(path.to_path_buf()))?;

    let mut data = match front {
        Some(front) => {
            let table: toml::Table = toml::from_str(front).map_err(|source| LoadError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
            toml_table_to_json(table)
        }
        None => Map::new(),
    };

    if !body.trim().is_empty() {
        data.insert(
            "content".to_string(),
            Value::String(renderer.render(mode, body)),
        );
    }
    Ok(data)
}

/// Split `+++`-delimited front matter from a document.
///
/// Returns `None` when the opening fence has no matching close.
fn split_front_matter(text: &str) -> Option<(Option<&str>, &str)> {
    let Some(after_fence) = text.strip_prefix("+++") else {
        return Some((None, text));
    };
    let Some(rest) = after_fence
        .strip_prefix("\r\n")
        .or_else(|| after_fence.strip_prefix('\n'))
    else {
        return Some((None, text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "+++" {
            return Some((Some(&rest[..offset]), &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// TOML datetimes become RFC 3339 strings; everything else maps directly.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(toml_table_to_json(table)),
    }
}

fn toml_table_to_json(table: toml::Table) -> PostData {
    table
        .into_iter()
        .map(|(k, v)| (k, toml_to_json(v)))
        .collect()
}

// ============================================================================
// Registry-backed modules
// ============================================================================

type Constructor = Box<dyn Fn(&Renderer) -> PostData + Send + Sync>;

/// Explicit mapping from `_file` paths to post constructors.
///
/// Files are still discovered on disk (they supply `_stat`), but their
/// contents are ignored: the registered constructor builds the post.
///
/// ```
/// use postpress::module::ModuleRegistry;
/// use serde_json::{Map, Value};
///
/// let mut registry = ModuleRegistry::new();
/// registry.register("src/pages/hello.md", |r| {
///     let mut post = Map::new();
///     post.insert("content".into(), Value::String(postpress::md!(r, "# Hello {}", "there")));
///     post
/// });
/// assert!(registry.contains("src/pages/hello.md"));
/// ```
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Constructor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, file: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&Renderer) -> PostData + Send + Sync + 'static,
    {
        self.modules.insert(file.into(), Box::new(constructor));
        self
    }

    pub fn contains(&self, file: &str) -> bool {
        self.modules.contains_key(file)
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load(
        &self,
        _path: &Path,
        file: &str,
        renderer: &Renderer,
    ) -> Result<Option<PostData>, LoadError> {
        let constructor = self
            .modules
            .get(file)
            .ok_or_else(|| LoadError::ModuleNotFound(file.to_string()))?;
        Ok(Some(constructor(renderer)))
    }
}
