//! Markdown and raw text rendering.
//!
//! Content modules produce their final markup through a [`Renderer`], which
//! is built once from the `[markdown]` section of `config.toml` and shared
//! (immutably) by every loader thread. Two modes exist:
//!
//! - **Raw**: the input text is returned unchanged. Used for literal HTML or
//!   CSS embedded in content.
//! - **Markdown**: CommonMark via `pulldown-cmark`, with two extensions on
//!   top of the stock HTML output:
//!   - headings get GitHub-style `id` attributes derived from their text,
//!     deduplicated within one document (`intro`, `intro-1`, `intro-2`)
//!   - task list items render as `<li class="task-list-item">` (plus
//!     `checked` when ticked) instead of a `<li>` with a disabled checkbox
//!
//! Both modes accept anything that implements `Display`, so interpolated
//! text can be passed straight from `format_args!`. The [`md!`](crate::md)
//! and [`raw!`](crate::raw) macros wrap that pattern.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use std::collections::HashMap;
use std::fmt;

/// Which conversion to apply to a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Raw,
    Markdown,
}

/// Markdown rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub heading_ids: bool,
    pub task_lists: bool,
    pub tables: bool,
    pub strikethrough: bool,
    pub footnotes: bool,
    pub smart_punctuation: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            heading_ids: true,
            task_lists: true,
            tables: true,
            strikethrough: true,
            footnotes: false,
            smart_punctuation: false,
        }
    }
}

impl RenderOptions {
    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.task_lists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if self.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.smart_punctuation {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        options
    }
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Return the input text unchanged.
    pub fn raw(input: impl fmt::Display) -> String {
        input.to_string()
    }

    /// Convert markdown to HTML.
    pub fn markdown(&self, input: impl fmt::Display) -> String {
        let source = input.to_string();
        let mut events: Vec<Event> =
            Parser::new_ext(&source, self.options.parser_options()).collect();

        if self.options.heading_ids {
            assign_heading_ids(&mut events);
        }
        if self.options.task_lists {
            events = rewrite_task_items(events);
        }

        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    pub fn render(&self, mode: RenderMode, input: impl fmt::Display) -> String {
        match mode {
            RenderMode::Raw => Self::raw(input),
            RenderMode::Markdown => self.markdown(input),
        }
    }
}

/// Render markdown from a format string: `md!(renderer, "# {}", title)`.
#[macro_export]
macro_rules! md {
    ($renderer:expr, $($arg:tt)*) => {
        $renderer.markdown(::std::format_args!($($arg)*))
    };
}

/// Build verbatim text from a format string: `raw!("<p>{}</p>", body)`.
#[macro_export]
macro_rules! raw {
    ($($arg:tt)*) => {
        $crate::render::Renderer::raw(::std::format_args!($($arg)*))
    };
}

// ============================================================================
// Heading ids
// ============================================================================

/// GitHub-compatible heading slugs with per-document deduplication.
#[derive(Debug, Default)]
struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut candidate = base.clone();
        while self.occurrences.contains_key(&candidate) {
            let count = self.occurrences.entry(base.clone()).or_insert(0);
            *count += 1;
            candidate = format!("{base}-{count}");
        }
        self.occurrences.insert(candidate.clone(), 0);
        candidate
    }
}

/// Lowercase, spaces to `-`, keep letters, digits, `-` and `_`, drop the rest
/// (punctuation and symbols, Unicode included).
fn slugify(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            '-' | '_' => Some(c),
            c if c.is_alphanumeric() => Some(c),
            _ => None,
        })
        .collect()
}

fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut slugger = Slugger::default();
    let mut i = 0;
    while i < events.len() {
        if matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            let mut text = String::new();
            let mut j = i + 1;
            while j < events.len() && !matches!(events[j], Event::End(TagEnd::Heading(_))) {
                if let Event::Text(t) | Event::Code(t) = &events[j] {
                    text.push_str(t);
                }
                j += 1;
            }
            let slug = slugger.slug(&text);
            if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
                *id = Some(CowStr::from(slug));
            }
            i = j;
        }
        i += 1;
    }
}

// ============================================================================
// Task list items
// ============================================================================

/// Replace `<li>` + checkbox marker with a classed `<li>` for task items.
///
/// The marker follows the item start directly in tight lists, and follows
/// the item's opening paragraph in loose lists.
fn rewrite_task_items(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut task_state: Vec<Option<bool>> = vec![None; events.len()];
    let mut marker_at = vec![false; events.len()];

    for (i, event) in events.iter().enumerate() {
        let Event::TaskListMarker(checked) = event else {
            continue;
        };
        let item = if i >= 1 && matches!(events[i - 1], Event::Start(Tag::Item)) {
            Some(i - 1)
        } else if i >= 2
            && matches!(events[i - 1], Event::Start(Tag::Paragraph))
            && matches!(events[i - 2], Event::Start(Tag::Item))
        {
            Some(i - 2)
        } else {
            None
        };
        if let Some(item) = item {
            task_state[item] = Some(*checked);
            marker_at[i] = true;
        }
    }

    events
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !marker_at[*i])
        .map(|(i, event)| match task_state[i] {
            Some(checked) => Event::Html(CowStr::from(task_item_open(checked))),
            None => event,
        })
        .collect()
}

fn task_item_open(checked: bool) -> String {
    if checked {
        "<li class=\"task-list-item checked\">".to_string()
    } else {
        "<li class=\"task-list-item\">".to_string()
    }
}
