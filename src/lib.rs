//! # Postpress
//!
//! A small static page builder. Each file under a content directory is a
//! *content module* that exports one post; every post with content becomes
//! one HTML page.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Load   src/<content_dir>/**  →  Vec<Post>          (modules → posts)
//! 2. Write  Vec<Post>             →  dist/**/index.html (posts → pages)
//! ```
//!
//! Loading completes for every content directory before any page is
//! written. Both stages run their per-file work in parallel on the rayon
//! pool, keep discovery order in their results, and fail as a whole on the
//! first error.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | `Site`: configured load + write, the entry point for a build |
//! | [`load`] | Walks a content directory and turns files into posts |
//! | [`module`] | Content module formats (TOML, JSON, markdown, HTML) and the Rust registry |
//! | [`post`] | The `Post` type, reserved fields, `_file` / `_path` derivation |
//! | [`write`] | Renders posts through templates into `index.html` files |
//! | [`template`] | `{{ key }}` file templates, the built-in layout, and name resolution |
//! | [`render`] | Markdown and raw rendering, `md!` / `raw!` macros |
//! | [`fingerprint`] | md5 / sha256 / sha512 content digests and the post id |
//! | [`codec`] | JSON encode / decode used for modules and template values |
//! | [`walk`] | Sorted recursive file discovery |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`output`] | CLI output formatting for load and write results |
//!
//! # Derived Fields
//!
//! Every post carries fields the pipeline computes; authored values under
//! these names are discarded:
//!
//! | Field | Value |
//! |-------|-------|
//! | `_file` | source file relative to the project root (`src/blog/a.md`) |
//! | `_path` | `_file` without the content root and extension (`blog/a`) |
//! | `_stat` | file metadata: size, kind, mode, timestamps in ms |
//! | `_md5`, `_sha256`, `_sha512` | hex digests of `content` |
//! | `_id` | sha256 of `_file` followed by `content` |
//!
//! The digests and id exist only for posts with non-empty content.
//!
//! # Templates
//!
//! A post's `template` field selects how its page is rendered:
//!
//! - absent or `""`: the configured default template, which must exist as a
//!   file unless the site opts into the built-in layout
//! - a name: that file under the components directory, else a registered built-in
//! - `null` (JSON) or `false`: no template, `content` is written verbatim

pub mod codec;
pub mod config;
pub mod fingerprint;
pub mod load;
pub mod module;
pub mod output;
pub mod pipeline;
pub mod post;
pub mod render;
pub mod template;
pub mod walk;
pub mod write;

#[cfg(test)]
pub(crate) mod test_helpers;
