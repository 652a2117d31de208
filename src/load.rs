//! Post loading.
//!
//! Walks one content directory, loads every file through a
//! [`ModuleLoader`], and attaches the derived fields. Files load in parallel
//! on the rayon pool; the result keeps discovery order, and the first
//! failure aborts the whole batch.

use crate::codec::CodecError;
use crate::module::ModuleLoader;
use crate::post::{FieldError, FileStat, Post, logical_path, to_slash};
use crate::render::Renderer;
use crate::walk::{WalkError, list_files};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported content module {} (expected .toml, .json, .md or .html)", .0.display())]
    UnsupportedModule(PathBuf),
    #[error("no module registered for {0}")]
    ModuleNotFound(String),
    #[error("invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("{} must export a table, found {kind}", path.display())]
    NotAnObject { path: PathBuf, kind: &'static str },
    #[error("invalid post in {}: {source}", path.display())]
    InvalidField {
        path: PathBuf,
        #[source]
        source: FieldError,
    },
    #[error("front matter in {} is never closed with +++", .0.display())]
    UnterminatedFrontMatter(PathBuf),
}

/// Loads posts from directories under a project's content root.
pub struct PostLoader<'a> {
    root: &'a Path,
    content_root: &'a str,
    modules: &'a dyn ModuleLoader,
    renderer: &'a Renderer,
}

impl<'a> PostLoader<'a> {
    pub fn new(
        root: &'a Path,
        content_root: &'a str,
        modules: &'a dyn ModuleLoader,
        renderer: &'a Renderer,
    ) -> Self {
        Self {
            root,
            content_root,
            modules,
            renderer,
        }
    }

    /// Load every module under `<root>/<content_root>/<dir>`.
    pub fn load_posts(&self, dir: &str) -> Result<Vec<Post>, LoadError> {
        let files = list_files(&self.root.join(self.content_root).join(dir))?;
        files.par_iter().map(|path| self.load_post(path)).collect()
    }

    /// Load a single discovered file.
    pub fn load_post(&self, path: &Path) -> Result<Post, LoadError> {
        let file = to_slash(path.strip_prefix(self.root).unwrap_or(path));
        let data = self
            .modules
            .load(path, &file, self.renderer)?
            .unwrap_or_default();

        let meta = fs::symlink_metadata(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let logical = logical_path(&file, self.content_root);
        Post::new(data, file, logical, FileStat::from_metadata(&meta)).map_err(|source| {
            LoadError::InvalidField {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint;
    use crate::module::{FileModuleLoader, ModuleRegistry};
    use crate::post::TemplateChoice;
    use crate::test_helpers::*;
    use serde_json::{Map, Value};
    use tempfile::TempDir;

    fn load(tmp: &TempDir, dir: &str) -> Result<Vec<Post>, LoadError> {
        let renderer = Renderer::default();
        PostLoader::new(tmp.path(), "src", &FileModuleLoader, &renderer).load_posts(dir)
    }

    #[test]
    fn derives_file_and_path() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/blog/post-1/index.md", "# One");

        let posts = load(&tmp, "blog").unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].file, "src/blog/post-1/index.md");
        assert_eq!(posts[0].path, "blog/post-1/index");
        assert_eq!(posts[0].destination(), "blog/post-1");
    }

    #[test]
    fn dotted_content_root_is_stripped_from_path() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/pages/a.md", "A");

        let renderer = Renderer::default();
        let posts = PostLoader::new(tmp.path(), "./src", &FileModuleLoader, &renderer)
            .load_posts("pages")
            .unwrap();

        assert_eq!(posts[0].file, "src/pages/a.md");
        assert_eq!(posts[0].path, "pages/a");
        assert_eq!(posts[0].destination(), "pages/a");
    }

    #[test]
    fn fingerprints_follow_content() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/blog/a.md", "Hello");
        write_file(tmp.path(), "src/blog/b.toml", "title = \"data only\"");

        let posts = load(&tmp, "blog").unwrap();
        let a = find_post(&posts, "blog/a");
        let b = find_post(&posts, "blog/b");

        let content = a.content.as_deref().unwrap();
        let fp = a.fingerprints.as_ref().unwrap();
        assert_eq!(fp.md5, fingerprint::md5(content));
        assert_eq!(fp.sha256, fingerprint::sha256(content));
        assert_eq!(fp.sha512, fingerprint::sha512(content));
        assert_eq!(fp.id, fingerprint::sha256(&format!("src/blog/a.md{content}")));

        assert!(b.content.is_none());
        assert!(b.fingerprints.is_none());
        assert_eq!(b.stat.size, "title = \"data only\"".len() as u64);
    }

    #[test]
    fn order_follows_discovery() {
        let tmp = TempDir::new().unwrap();
        for name in ["c", "a", "b/z", "b/y"] {
            write_file(tmp.path(), &format!("src/pages/{name}.md"), name);
        }

        let posts = load(&tmp, "pages").unwrap();
        assert_eq!(
            post_paths(&posts),
            vec!["pages/a", "pages/b/y", "pages/b/z", "pages/c"]
        );
    }

    #[test]
    fn template_field_is_interpreted() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/p/default.md", "x");
        write_file(tmp.path(), "src/p/skip.md", "+++\ntemplate = false\n+++\nx");
        write_file(tmp.path(), "src/p/named.md", "+++\ntemplate = \"wide.html\"\n+++\nx");

        let posts = load(&tmp, "p").unwrap();
        assert_eq!(find_post(&posts, "p/default").template, TemplateChoice::Default);
        assert_eq!(find_post(&posts, "p/skip").template, TemplateChoice::Skip);
        assert_eq!(
            find_post(&posts, "p/named").template,
            TemplateChoice::Named("wide.html".into())
        );
    }

    #[test]
    fn one_bad_module_fails_the_batch() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/p/good.md", "fine");
        write_file(tmp.path(), "src/p/bad.toml", "not = [valid");

        assert!(matches!(load(&tmp, "p"), Err(LoadError::Toml { .. })));
    }

    #[test]
    fn json_error_names_file_once() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/p/bad.json", "{ \"title\": ");

        let err = load(&tmp, "p").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bad.json: malformed JSON: "), "{message}");
        assert_eq!(message.matches("JSON").count(), 1, "{message}");
    }

    #[test]
    fn wrongly_typed_content_is_invalid_field() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/p/bad.toml", "content = 42");

        assert!(matches!(load(&tmp, "p"), Err(LoadError::InvalidField { .. })));
    }

    #[test]
    fn missing_directory_is_walk_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(load(&tmp, "nope"), Err(LoadError::Walk(_))));
    }

    #[test]
    fn registry_loader_supplies_data() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/p/hello.md", "ignored on disk");

        let mut registry = ModuleRegistry::new();
        registry.register("src/p/hello.md", |r| {
            let mut post = Map::new();
            post.insert("title".into(), Value::from("Hi"));
            post.insert("content".into(), Value::from(crate::md!(r, "Hi {}", "there")));
            post
        });
        let renderer = Renderer::default();
        let posts = PostLoader::new(tmp.path(), "src", &registry, &renderer)
            .load_posts("p")
            .unwrap();

        assert_eq!(posts[0].title(), "Hi");
        assert_eq!(posts[0].content.as_deref(), Some("<p>Hi there</p>\n"));
    }

    #[test]
    fn registry_miss_fails_the_batch() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/p/unregistered.md", "x");

        let registry = ModuleRegistry::new();
        let renderer = Renderer::default();
        let result = PostLoader::new(tmp.path(), "src", &registry, &renderer).load_posts("p");
        assert!(matches!(result, Err(LoadError::ModuleNotFound(_))));
    }
}
