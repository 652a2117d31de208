//! Shared test utilities for the postpress test suite.
//!
//! Provides fixture setup, file writers, and post lookups that work with
//! loaded [`Post`] lists.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let posts = Site::new(tmp.path(), load_config(tmp.path()).unwrap()).load().unwrap();
//!
//! let about = find_post(&posts, "pages/about");
//! assert_eq!(about.title(), "About");
//! assert_eq!(post_paths(&posts)[0], "pages/about");
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::post::Post;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `text` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

// =========================================================================
// Post lookups, panicking with a clear message on miss
// =========================================================================

/// Find a post by `_path`. Panics if not found.
pub fn find_post<'a>(posts: &'a [Post], path: &str) -> &'a Post {
    posts.iter().find(|p| p.path == path).unwrap_or_else(|| {
        let paths = post_paths(posts);
        panic!("post '{path}' not found. Available: {paths:?}")
    })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All `_path` values in load order.
pub fn post_paths(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.path.as_str()).collect()
}

/// Every file under `root`, relative and `/`-separated, sorted.
pub fn tree(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| crate::post::to_slash(e.path().strip_prefix(root).unwrap()))
        .collect();
    files.sort();
    files
}
