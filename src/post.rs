//! The post: one loaded content module plus the fields the pipeline derives.
//!
//! A post serializes to a single flat JSON object. Authored fields come
//! first, followed by the derived ones:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `_md5`, `_sha256`, `_sha512` | digests of `content` (only when content is present) |
//! | `_id` | `sha256(_file + content)` (only when content is present) |
//! | `_file` | source path relative to the project root |
//! | `_path` | `_file` without the content root and extension, e.g. `pages/blog/first` |
//! | `_stat` | filesystem metadata of the source file |
//!
//! Authored values for these reserved names are dropped when the post is
//! built; the derived values always win.

use crate::fingerprint::Fingerprints;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::Metadata;
use std::path::{Component, Path};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Field names the pipeline owns.
pub const RESERVED_FIELDS: &[&str] = &[
    "_md5", "_sha256", "_sha512", "_id", "_file", "_path", "_stat",
];

#[derive(Error, Debug, PartialEq)]
pub enum FieldError {
    #[error("`content` must be a string, found {0}")]
    Content(&'static str),
    #[error("`template` must be a string, false or null, found {0}")]
    Template(&'static str),
}

/// How a post's final markup is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateChoice {
    /// No `template` field: use the site's default template.
    Default,
    /// `template = false` (or JSON `null`): write `content` as-is.
    Skip,
    /// Render through the named template.
    Named(String),
}

impl TemplateChoice {
    /// Interpret the authored `template` field.
    pub fn from_field(value: Option<&Value>) -> Result<Self, FieldError> {
        match value {
            None => Ok(Self::Default),
            Some(Value::Null) | Some(Value::Bool(false)) => Ok(Self::Skip),
            Some(Value::String(name)) if name.is_empty() => Ok(Self::Default),
            Some(Value::String(name)) => Ok(Self::Named(name.clone())),
            Some(other) => Err(FieldError::Template(value_kind(other))),
        }
    }
}

/// Interpret the authored `content` field. Only a non-empty string counts.
pub fn content_from_field(value: Option<&Value>) -> Result<Option<String>, FieldError> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(FieldError::Content(value_kind(other))),
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

/// Filesystem metadata of a post's source file (not following symlinks).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStat {
    pub size: u64,
    pub is_file: bool,
    pub is_dir: bool,
    pub is_symlink: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
    /// Milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_ms: Option<u64>,
}

impl FileStat {
    pub fn from_metadata(meta: &Metadata) -> Self {
        let file_type = meta.file_type();
        Self {
            size: meta.len(),
            is_file: file_type.is_file(),
            is_dir: file_type.is_dir(),
            is_symlink: file_type.is_symlink(),
            mode: unix_mode(meta),
            modified_ms: epoch_ms(meta.modified().ok()),
            accessed_ms: epoch_ms(meta.accessed().ok()),
            created_ms: epoch_ms(meta.created().ok()),
        }
    }
}

#[cfg(unix)]
fn unix_mode(meta: &Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode())
}

#[cfg(not(unix))]
fn unix_mode(_meta: &Metadata) -> Option<u32> {
    None
}

fn epoch_ms(time: Option<SystemTime>) -> Option<u64> {
    let elapsed = time?.duration_since(UNIX_EPOCH).ok()?;
    u64::try_from(elapsed.as_millis()).ok()
}

/// A loaded content module.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Authored fields, passed through to templates untouched.
    #[serde(flatten)]
    pub data: Map<String, Value>,
    #[serde(skip)]
    pub content: Option<String>,
    #[serde(skip)]
    pub template: TemplateChoice,
    #[serde(flatten)]
    pub fingerprints: Option<Fingerprints>,
    #[serde(rename = "_file")]
    pub file: String,
    #[serde(rename = "_path")]
    pub path: String,
    #[serde(rename = "_stat")]
    pub stat: FileStat,
}

impl Post {
    /// Assemble a post from authored data and its source location.
    ///
    /// Fingerprints are computed only when `content` is a non-empty string.
    pub fn new(
        mut data: Map<String, Value>,
        file: String,
        path: String,
        stat: FileStat,
    ) -> Result<Self, FieldError> {
        for key in RESERVED_FIELDS {
            data.remove(*key);
        }
        let content = content_from_field(data.get("content"))?;
        let template = TemplateChoice::from_field(data.get("template"))?;
        let fingerprints = content
            .as_deref()
            .map(|content| Fingerprints::compute(&file, content));

        Ok(Self {
            data,
            content,
            template,
            fingerprints,
            file,
            path,
            stat,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.fingerprints.as_ref().map(|f| f.id.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// The authored `title`, falling back to the last `_path` segment.
    pub fn title(&self) -> &str {
        self.data
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_else(|| self.path.rsplit('/').next().unwrap_or(&self.path))
    }

    /// Output directory for this post, relative to the output root.
    pub fn destination(&self) -> &str {
        destination_dir(&self.path)
    }

    /// The full serialized form seen by templates.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(self.data.clone()))
    }
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive `_path` from `_file`: strip the content root prefix (when present)
/// and the final extension.
///
/// ```
/// use postpress::post::logical_path;
/// assert_eq!(logical_path("src/blog/post-1/index.md", "src"), "blog/post-1/index");
/// assert_eq!(logical_path("blog/about.toml", "src"), "blog/about");
/// assert_eq!(logical_path("src/blog/about.toml", "./src/"), "blog/about");
/// ```
pub fn logical_path(file: &str, content_root: &str) -> String {
    let root = to_slash(Path::new(content_root));
    let rest = if root.is_empty() {
        file
    } else {
        file.strip_prefix(root.as_str())
            .and_then(|r| r.strip_prefix('/'))
            .unwrap_or(file)
    };
    match rest.rsplit_once('/') {
        Some((dir, name)) => format!("{}/{}", dir, strip_extension(name)),
        None => strip_extension(rest).to_string(),
    }
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Map a logical path to its output directory.
///
/// A trailing `/index` segment is dropped so `blog/first/index` and
/// `blog/first` both land in `blog/first/`. A bare `index` maps to the
/// output root.
pub fn destination_dir(path: &str) -> &str {
    if path == "index" {
        ""
    } else {
        path.strip_suffix("/index").unwrap_or(path)
    }
}
