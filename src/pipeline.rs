//! The build: load every content directory, then write every page.
//!
//! ```text
//! config.toml ──► Site ──load──► Vec<Post> ──write──► dist/**/index.html
//! ```
//!
//! Loading finishes completely before any page is written, so a single bad
//! module leaves the output directory untouched. Both stages fan out on the
//! rayon pool and keep discovery order in their results.

use crate::config::{ConfigError, SiteConfig};
use crate::load::{LoadError, PostLoader};
use crate::module::{FileModuleLoader, ModuleLoader};
use crate::post::Post;
use crate::render::Renderer;
use crate::template::TemplateResolver;
use crate::write::{PageWriter, WriteError, WrittenPage};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Result of a full build.
#[derive(Debug)]
pub struct BuildReport {
    /// Every loaded post, pages and data-only alike.
    pub posts: Vec<Post>,
    /// Pages written, in post order.
    pub pages: Vec<WrittenPage>,
}

/// A project rooted at a directory, with its resolved configuration.
pub struct Site {
    root: PathBuf,
    output_dir: PathBuf,
    config: SiteConfig,
    renderer: Renderer,
    modules: Box<dyn ModuleLoader>,
    templates: TemplateResolver,
}

impl Site {
    /// A site that reads its content modules from files.
    pub fn new(root: impl Into<PathBuf>, config: SiteConfig) -> Self {
        let root = root.into();
        let renderer = Renderer::new(config.markdown.render_options());
        let templates = TemplateResolver::new(
            root.join(&config.content_root).join(&config.components_dir),
            config.default_template.clone(),
        );
        let output_dir = root.join(&config.output_dir);
        Self {
            root,
            output_dir,
            config,
            renderer,
            modules: Box::new(FileModuleLoader),
            templates,
        }
    }

    /// Replace the module loader, e.g. with a [`crate::module::ModuleRegistry`].
    pub fn with_loader(mut self, modules: impl ModuleLoader + 'static) -> Self {
        self.modules = Box::new(modules);
        self
    }

    /// Write pages somewhere other than the configured `output_dir`.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Register built-in templates or opt into the default layout.
    pub fn templates_mut(&mut self) -> &mut TemplateResolver {
        &mut self.templates
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Load posts from every content directory, in configured order.
    pub fn load(&self) -> Result<Vec<Post>, LoadError> {
        let loader = PostLoader::new(
            &self.root,
            &self.config.content_root,
            self.modules.as_ref(),
            &self.renderer,
        );
        let mut posts = Vec::new();
        for dir in &self.config.content_dirs {
            posts.extend(loader.load_posts(dir)?);
        }
        Ok(posts)
    }

    /// Write every post that has content.
    pub fn write(&self, posts: &[Post]) -> Result<Vec<WrittenPage>, WriteError> {
        PageWriter::new(&self.output_dir, &self.templates).write_posts(posts)
    }

    /// Load, then write.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let posts = self.load()?;
        let pages = self.write(&posts)?;
        Ok(BuildReport { posts, pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use crate::module::ModuleRegistry;
    use crate::template::{FileTemplate, TemplateError};
    use crate::test_helpers::*;
    use serde_json::{Map, Value};
    use std::fs;
    use tempfile::TempDir;

    fn fixture_site(tmp: &TempDir) -> Site {
        Site::new(tmp.path(), load_config(tmp.path()).unwrap())
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn loads_content_dirs_in_order() {
        let tmp = setup_fixtures();
        let posts = fixture_site(&tmp).load().unwrap();
        assert_eq!(
            post_paths(&posts),
            vec![
                "pages/about",
                "pages/data",
                "pages/feed",
                "pages/index",
                "pages/raw",
                "blog/first/index",
                "blog/second",
            ]
        );
    }

    #[test]
    fn fixture_posts_have_expected_fields() {
        let tmp = setup_fixtures();
        let posts = fixture_site(&tmp).load().unwrap();

        let about = find_post(&posts, "pages/about");
        assert_eq!(about.title(), "About");
        assert_eq!(about.file, "src/pages/about.md");
        assert!(about.id().is_some());

        let data = find_post(&posts, "pages/data");
        assert!(data.content.is_none());
        assert!(data.id().is_none());
    }

    #[test]
    fn missing_content_dir_is_load_error() {
        let tmp = setup_fixtures();
        fs::write(
            tmp.path().join("config.toml"),
            "content_dirs = [\"pages\", \"missing\"]\n",
        )
        .unwrap();
        let result = fixture_site(&tmp).build();
        assert!(matches!(result, Err(BuildError::Load(_))));
        assert!(!tmp.path().join("dist").exists());
    }

    #[test]
    fn content_dir_that_is_a_file_is_load_error() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/pages", "oops, a file");
        let result = Site::new(tmp.path(), SiteConfig::default()).load();
        assert!(matches!(
            result,
            Err(LoadError::Walk(crate::walk::WalkError::Discovery { .. }))
        ));
    }

    #[test]
    fn dotted_content_root_builds_same_tree() {
        let tmp = setup_fixtures();
        let config = SiteConfig {
            content_root: "./src".to_string(),
            ..load_config(tmp.path()).unwrap()
        };
        let report = Site::new(tmp.path(), config).build().unwrap();
        assert_eq!(report.posts[0].path, "pages/about");
        assert!(tmp.path().join("dist/pages/about/index.html").is_file());
        assert!(!tmp.path().join("dist/src").exists());
    }

    // =========================================================================
    // Building
    // =========================================================================

    #[test]
    fn missing_default_template_fails_build() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/pages/a.md", "# A");
        let result = Site::new(tmp.path(), SiteConfig::default()).build();
        assert!(matches!(
            result,
            Err(BuildError::Write(WriteError::Template {
                source: TemplateError::NotFound { .. },
                ..
            }))
        ));
        assert!(!tmp.path().join("dist").exists());
    }

    #[test]
    fn default_layout_opt_in_builds_without_components() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/pages/a.md", "+++\ntitle = \"A\"\n+++\nBody");
        let mut site = Site::new(tmp.path(), SiteConfig::default());
        site.templates_mut().use_default_layout();
        site.build().unwrap();
        let html = fs::read_to_string(tmp.path().join("dist/pages/a/index.html")).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A</title>"));
    }

    #[test]
    fn build_writes_expected_tree() {
        let tmp = setup_fixtures();
        let report = fixture_site(&tmp).build().unwrap();

        assert_eq!(report.posts.len(), 7);
        assert_eq!(report.pages.len(), 6);
        assert_eq!(
            tree(&tmp.path().join("dist")),
            vec![
                "blog/first/index.html",
                "blog/second/index.html",
                "pages/about/index.html",
                "pages/feed/index.html",
                "pages/index.html",
                "pages/raw/index.html",
            ]
        );
    }

    #[test]
    fn build_applies_template_choices() {
        let tmp = setup_fixtures();
        fixture_site(&tmp).build().unwrap();
        let dist = tmp.path().join("dist");
        let read = |rel: &str| fs::read_to_string(dist.join(rel)).unwrap();

        let about = read("pages/about/index.html");
        assert!(about.starts_with("<!DOCTYPE html>"));
        assert!(about.contains("<title>About</title>"));
        assert!(about.contains(r#"<h2 id="contact">Contact</h2>"#));

        let first = read("blog/first/index.html");
        assert!(first.contains(r#"<article class="wide">"#));
        assert!(first.contains(r#"<li class="task-list-item checked">"#));

        assert_eq!(read("pages/raw/index.html"), "<p>verbatim</p>\n");
    }

    #[test]
    fn null_template_writes_json_content_verbatim() {
        let tmp = setup_fixtures();
        let report = fixture_site(&tmp).build().unwrap();
        let feed = report.pages.iter().find(|p| p.path == "pages/feed").unwrap();
        assert_eq!(feed.template, None);
        assert_eq!(
            fs::read_to_string(tmp.path().join("dist/pages/feed/index.html")).unwrap(),
            "<rss version=\"2.0\"></rss>"
        );
    }

    #[test]
    fn rebuild_is_byte_identical() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        let dist = tmp.path().join("dist");

        site.build().unwrap();
        let first: Vec<(String, Vec<u8>)> = tree(&dist)
            .into_iter()
            .map(|rel| {
                let bytes = fs::read(dist.join(&rel)).unwrap();
                (rel, bytes)
            })
            .collect();

        site.build().unwrap();
        for (rel, bytes) in &first {
            assert_eq!(&fs::read(dist.join(rel)).unwrap(), bytes, "{rel} changed");
        }
        assert_eq!(tree(&dist).len(), first.len());
    }

    #[test]
    fn unrelated_output_files_survive() {
        let tmp = setup_fixtures();
        write_file(tmp.path(), "dist/keep.txt", "keep");
        fixture_site(&tmp).build().unwrap();
        assert_eq!(
            fs::read_to_string(tmp.path().join("dist/keep.txt")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn output_dir_override() {
        let tmp = setup_fixtures();
        let out = tmp.path().join("public");
        fixture_site(&tmp).with_output_dir(&out).build().unwrap();
        assert!(out.join("pages/about/index.html").exists());
        assert!(!tmp.path().join("dist").exists());
    }

    #[test]
    fn builtin_template_is_used_without_component_file() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/pages/hello.md", "+++\ntitle = \"Hello\"\n+++\nHi");
        let mut site = Site::new(tmp.path(), SiteConfig::default());
        site.templates_mut()
            .register("post-template.html", FileTemplate::new("inline", "[{{ title }}]"));
        site.build().unwrap();
        assert_eq!(
            fs::read_to_string(tmp.path().join("dist/pages/hello/index.html")).unwrap(),
            "[Hello]"
        );
    }

    #[test]
    fn registry_site_builds_from_rust_modules() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/pages/home.md", "");

        let mut registry = ModuleRegistry::new();
        registry.register("src/pages/home.md", |r| {
            let mut post = Map::new();
            post.insert("content".into(), Value::from(crate::md!(r, "# {}", "Home")));
            post.insert("template".into(), Value::Null);
            post
        });
        let site = Site::new(tmp.path(), SiteConfig::default()).with_loader(registry);
        let report = site.build().unwrap();

        assert_eq!(report.pages[0].output, "pages/home/index.html");
        assert_eq!(
            fs::read_to_string(tmp.path().join("dist/pages/home/index.html")).unwrap(),
            "<h1 id=\"home\">Home</h1>\n"
        );
    }
}
