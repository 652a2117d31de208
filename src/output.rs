//! CLI output formatting for the load and write stages.
//!
//! # Information-First Display
//!
//! Every post is shown by its logical `_path` with a positional index; the
//! source file is secondary context on an indented `Source:` line. Pages
//! are shown as `_path → output file`, with the template that rendered them.
//!
//! # Output Format
//!
//! ## Load
//!
//! ```text
//! Posts
//! 001 pages/about
//!     Source: src/pages/about.md
//!     Title: About
//!     Id: 3f1c2a9b0d4e
//! 002 pages/data
//!     Source: src/pages/data.toml
//!     no content
//! ```
//!
//! ## Write
//!
//! ```text
//! Pages
//! 001 pages/about → pages/about/index.html (post-template.html)
//! 002 pages/raw → pages/raw/index.html (no template)
//!
//! Wrote 2 pages from 3 posts
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure, with
//! no I/O.

use crate::post::Post;
use crate::write::WrittenPage;

/// Characters of the post id shown in load output.
const SHORT_ID: usize = 12;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Load
// ============================================================================

pub fn format_load_output(posts: &[Post]) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];
    if posts.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
        return lines;
    }

    for (i, post) in posts.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), post.path));
        lines.push(format!("{}Source: {}", indent(1), post.file));
        if post.title() != post.path.rsplit('/').next().unwrap_or(&post.path) {
            lines.push(format!("{}Title: {}", indent(1), post.title()));
        }
        match post.id() {
            Some(id) => {
                let short = &id[..id.len().min(SHORT_ID)];
                lines.push(format!("{}Id: {}", indent(1), short));
            }
            None => lines.push(format!("{}no content", indent(1))),
        }
    }
    lines
}

pub fn print_load_output(posts: &[Post]) {
    for line in format_load_output(posts) {
        println!("{}", line);
    }
}

// ============================================================================
// Write
// ============================================================================

pub fn format_write_output(pages: &[WrittenPage], post_count: usize) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for (i, page) in pages.iter().enumerate() {
        let template = page.template.as_deref().unwrap_or("no template");
        lines.push(format!(
            "{} {} → {} ({})",
            format_index(i + 1),
            page.path,
            page.output,
            template
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "Wrote {} from {}",
        plural(pages.len(), "page"),
        plural(post_count, "post")
    ));
    lines
}

pub fn print_write_output(pages: &[WrittenPage], post_count: usize) {
    for line in format_write_output(pages, post_count) {
        println!("{}", line);
    }
}
