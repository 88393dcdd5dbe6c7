//! Live-preview rendering: markdown buffer → HTML fragment.
//!
//! The controller only needs a pure `&str → String` function, expressed as the
//! [`MarkdownRenderer`] trait so tests can count calls and hosts can swap in a
//! different engine. [`CmarkRenderer`] is the default, built on
//! `pulldown-cmark` and configured to behave like a typical browser-side
//! previewer: soft line breaks become `<br />`, GitHub-flavoured tables and
//! lists are on, headings carry no generated ids, and raw HTML is passed
//! through untouched.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

/// Turns a markdown buffer into preview HTML.
pub trait MarkdownRenderer {
    fn render(&self, markdown: &str) -> String;
}

impl<R: MarkdownRenderer + ?Sized> MarkdownRenderer for &R {
    fn render(&self, markdown: &str) -> String {
        (**self).render(markdown)
    }
}

/// Knobs for [`CmarkRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Emit every soft line break as `<br />`. Default: true.
    pub breaks: bool,
    /// Tables, strikethrough, task lists, footnotes. Default: true.
    pub gfm: bool,
    /// Slug `id` attributes on headings. Default: false.
    pub header_ids: bool,
    /// Escape raw HTML instead of passing it through. Default: false.
    pub sanitize: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            breaks: true,
            gfm: true,
            header_ids: false,
            sanitize: false,
        }
    }
}

/// [`MarkdownRenderer`] backed by `pulldown-cmark`.
#[derive(Debug, Clone, Default)]
pub struct CmarkRenderer {
    options: RenderOptions,
}

impl CmarkRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.options.gfm {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.options.header_ids {
            options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        options
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let RenderOptions {
            breaks, sanitize, ..
        } = self.options;

        let events = Parser::new_ext(markdown, self.parser_options()).map(|event| match event {
            Event::SoftBreak if breaks => Event::HardBreak,
            Event::Html(raw) | Event::InlineHtml(raw) if sanitize => Event::Text(raw),
            other => other,
        });

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        if self.options.header_ids {
            html::push_html(&mut out, with_heading_ids(events.collect()).into_iter());
        } else {
            html::push_html(&mut out, events);
        }
        out
    }
}

/// Fill in a slug id for every heading that does not already carry one.
fn with_heading_ids(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut open: Option<usize> = None;
    let mut text = String::new();

    for i in 0..events.len() {
        let mut closed = None;
        match &events[i] {
            Event::Start(Tag::Heading { id: None, .. }) => {
                open = Some(i);
                text.clear();
            }
            Event::Text(t) | Event::Code(t) if open.is_some() => text.push_str(t),
            Event::End(TagEnd::Heading(_)) => closed = open.take(),
            _ => {}
        }
        if let Some(start) = closed {
            if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
                *id = Some(CowStr::from(slugify(&text)));
            }
        }
    }
    events
}

/// Lowercase, keep alphanumerics, collapse everything else into single dashes.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
