//! Page materialization.
//!
//! Each post with content becomes `<output>/<destination>/index.html`, where
//! the destination is the post's `_path` with any trailing `/index` removed:
//!
//! ```text
//! _path                      output
//! blog/first/index      →    dist/blog/first/index.html
//! blog/second           →    dist/blog/second/index.html
//! index                 →    dist/index.html
//! ```
//!
//! Posts without content are skipped silently. Existing files are
//! overwritten; nothing else in the output directory is touched.

use crate::post::{Post, TemplateChoice};
use crate::template::{TemplateError, TemplateResolver};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("{file}: {source}")]
    Template {
        file: String,
        #[source]
        source: TemplateError,
    },
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{first} and {second} both write to {output}")]
    Collision {
        first: String,
        second: String,
        output: String,
    },
}

/// One page written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    /// The post's `_path`.
    pub path: String,
    /// Output file relative to the output directory, `/`-separated.
    pub output: String,
    /// Template used, or `None` when the content was written as-is.
    pub template: Option<String>,
}

/// Output file for a destination directory, relative to the output root.
pub fn output_file(destination: &str) -> String {
    if destination.is_empty() {
        "index.html".to_string()
    } else {
        format!("{destination}/index.html")
    }
}

pub struct PageWriter<'a> {
    output_dir: &'a Path,
    templates: &'a TemplateResolver,
}

impl<'a> PageWriter<'a> {
    pub fn new(output_dir: &'a Path, templates: &'a TemplateResolver) -> Self {
        Self {
            output_dir,
            templates,
        }
    }

    /// Render and write one post. Returns `None` for posts without content.
    pub fn write_page(&self, post: &Post) -> Result<Option<WrittenPage>, WriteError> {
        let Some(content) = post.content.as_deref() else {
            return Ok(None);
        };

        let template_name = match &post.template {
            TemplateChoice::Skip => None,
            TemplateChoice::Default => Some(self.templates.default_name()),
            TemplateChoice::Named(name) => Some(name.as_str()),
        };

        let markup = match template_name {
            None => content.to_string(),
            Some(name) => {
                let template_error = |source| WriteError::Template {
                    file: post.file.clone(),
                    source,
                };
                self.templates
                    .resolve(name)
                    .map_err(template_error)?
                    .render(post)
                    .map_err(template_error)?
            }
        };

        let destination = post.destination();
        let dir = self.output_dir.join(destination);
        fs::create_dir_all(&dir).map_err(|source| WriteError::Io {
            path: dir.clone(),
            source,
        })?;
        let target = dir.join("index.html");
        fs::write(&target, markup).map_err(|source| WriteError::Io {
            path: target.clone(),
            source,
        })?;

        Ok(Some(WrittenPage {
            path: post.path.clone(),
            output: output_file(destination),
            template: template_name.map(str::to_string),
        }))
    }

    /// Write all posts in parallel. Returned pages follow input order.
    ///
    /// Fails before writing anything if two pages would share an output file;
    /// otherwise the first write failure fails the call.
    pub fn write_posts(&self, posts: &[Post]) -> Result<Vec<WrittenPage>, WriteError> {
        check_collisions(posts)?;
        let written: Vec<Option<WrittenPage>> = posts
            .par_iter()
            .map(|post| self.write_page(post))
            .collect::<Result<_, _>>()?;
        Ok(written.into_iter().flatten().collect())
    }
}

fn check_collisions(posts: &[Post]) -> Result<(), WriteError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for post in posts.iter().filter(|p| p.content.is_some()) {
        if let Some(first) = seen.insert(post.destination(), &post.file) {
            return Err(WriteError::Collision {
                first: first.to_string(),
                second: post.file.clone(),
                output: output_file(post.destination()),
            });
        }
    }
    Ok(())
}
