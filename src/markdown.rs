//! Markdown to HTML conversion.
//!
//! Uses pulldown-cmark with the GitHub-flavoured extensions most content
//! expects (tables, strikethrough, task lists, footnotes) plus `{#id .class}`
//! heading attributes and smart punctuation.
//!
//! Every heading gets an `id` so pages can link to sections: the heading
//! text is slugified (`## Getting Started` → `getting-started`) and repeats
//! are numbered (`faq`, `faq-1`, `faq-2`). Ids written explicitly with
//! `{#id}` are kept and reserved.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use std::collections::HashSet;

/// Parser options used for every document.
pub fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_SMART_PUNCTUATION
}

/// Convert markdown to an HTML fragment.
pub fn render(markdown: &str) -> String {
    let events: Vec<Event<'_>> = Parser::new_ext(markdown, options()).collect();
    let events = assign_heading_ids(events);

    let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

fn assign_heading_ids(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    // Explicit ids are reserved up front so generated ids never take them,
    // wherever they appear in the document.
    let mut used: HashSet<String> = events
        .iter()
        .filter_map(|e| match e {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    let mut i = 0;
    while i < events.len() {
        if let Event::Start(Tag::Heading { id: None, .. }) = &events[i] {
            let mut text = String::new();
            let mut end = i + 1;
            while end < events.len() {
                match &events[end] {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) | Event::Code(t) => text.push_str(t),
                    _ => {}
                }
                end += 1;
            }

            let id = unique_id(slugify(&text), &mut used);
            if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
                *slot = Some(CowStr::from(id));
            }
            i = end;
        }
        i += 1;
    }
    events
}

/// `base`, or the first `base-N` not taken yet.
fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    let base = if base.is_empty() {
        "section".to_string()
    } else {
        base
    };
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 1;
    loop {
        let id = format!("{base}-{n}");
        if used.insert(id.clone()) {
            return id;
        }
        n += 1;
    }
}

/// Lowercase, keep letters and digits, collapse everything else to `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    slug
}
