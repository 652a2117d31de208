//! Page templates and their resolution.
//!
//! A template maps a [`Post`] to the final markup of its page. Templates are
//! resolved by file name, lazily, once per page:
//!
//! 1. `<content_root>/<components_dir>/<name>` on disk, as a [`FileTemplate`]
//! 2. a built-in registered under that name
//! 3. otherwise [`TemplateError::NotFound`]
//!
//! The default template name gets no fallback: a site without that file
//! fails to build unless it opts into [`DefaultLayout`] with
//! [`TemplateResolver::use_default_layout`].
//!
//! ## File templates
//!
//! Plain text with `{{ key }}` placeholders filled from the post's
//! serialized fields. Dotted keys walk into tables and arrays:
//!
//! ```text
//! <title>{{ title }}</title>
//! <p>{{ _stat.size }} bytes, tagged {{ tags.0 }}</p>
//! <article>{{ content }}</article>
//! ```
//!
//! Strings are inserted verbatim (content is already markup), other values
//! as JSON, and missing keys as nothing.

use crate::codec::{self, CodecError};
use crate::post::Post;
use maud::{DOCTYPE, PreEscaped, html};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("invalid template name {0:?}: must be a relative path inside the components directory")]
    InvalidName(String),
    #[error("template {name:?} not found (looked in {})", searched.display())]
    NotFound { name: String, searched: PathBuf },
    #[error("cannot read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("template {name:?} cannot insert `{key}`: {source}")]
    Encode {
        name: String,
        key: String,
        #[source]
        source: CodecError,
    },
}

pub trait Template: Send + Sync {
    fn render(&self, post: &Post) -> Result<String, TemplateError>;
}

// ============================================================================
// File templates
// ============================================================================

/// A template read from the components directory.
#[derive(Debug, Clone)]
pub struct FileTemplate {
    name: String,
    source: String,
}

impl FileTemplate {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn load(name: &str, path: &Path) -> Result<Self, TemplateError> {
        let source = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(name, source))
    }
}

impl Template for FileTemplate {
    fn render(&self, post: &Post) -> Result<String, TemplateError> {
        let fields = post.to_value();
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let key = after[..end].trim();
            match lookup(&fields, key) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) => out.push_str(s),
                Some(other) => {
                    let text = codec::encode(other).map_err(|source| TemplateError::Encode {
                        name: self.name.clone(),
                        key: key.to_string(),
                        source,
                    })?;
                    out.push_str(&text);
                }
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn lookup<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    key.split('.').try_fold(value, |current, part| match current {
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => current.get(part),
    })
}

// ============================================================================
// Built-in layout
// ============================================================================

/// Minimal HTML document wrapping the post's content.
///
/// Uses the authored `title` (or the last path segment) and an optional
/// `description` for the `<head>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLayout;

impl Template for DefaultLayout {
    fn render(&self, post: &Post) -> Result<String, TemplateError> {
        let description = post.get("description").and_then(Value::as_str);
        let lang = post.get("lang").and_then(Value::as_str).unwrap_or("en");
        let markup = html! {
            (DOCTYPE)
            html lang=(lang) {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (post.title()) }
                    @if let Some(description) = description {
                        meta name="description" content=(description);
                    }
                }
                body {
                    main {
                        article {
                            (PreEscaped(post.content.as_deref().unwrap_or_default()))
                        }
                    }
                }
            }
        };
        Ok(markup.into_string())
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Finds templates by name for the page writer.
pub struct TemplateResolver {
    components_dir: PathBuf,
    default_name: String,
    builtins: HashMap<String, Arc<dyn Template>>,
}

impl TemplateResolver {
    /// `default_name` is used for posts without a `template` field.
    pub fn new(components_dir: impl Into<PathBuf>, default_name: impl Into<String>) -> Self {
        Self {
            components_dir: components_dir.into(),
            default_name: default_name.into(),
            builtins: HashMap::new(),
        }
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Back the default template name with [`DefaultLayout`] when no file
    /// of that name exists.
    pub fn use_default_layout(&mut self) {
        let name = self.default_name.clone();
        self.register(name, DefaultLayout);
    }

    /// Make `template` available under `name` when no file of that name exists.
    pub fn register(&mut self, name: impl Into<String>, template: impl Template + 'static) {
        self.builtins.insert(name.into(), Arc::new(template));
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Template>, TemplateError> {
        validate_name(name)?;

        let path = self.components_dir.join(name);
        if path.is_file() {
            return Ok(Arc::new(FileTemplate::load(name, &path)?));
        }
        if let Some(builtin) = self.builtins.get(name) {
            return Ok(Arc::clone(builtin));
        }
        Err(TemplateError::NotFound {
            name: name.to_string(),
            searched: self.components_dir.clone(),
        })
    }
}

fn validate_name(name: &str) -> Result<(), TemplateError> {
    let path = Path::new(name);
    let valid = !name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if valid {
        Ok(())
    } else {
        Err(TemplateError::InvalidName(name.to_string()))
    }
}
