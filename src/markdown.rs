//! Markdown to HTML conversion.
//!
//! One converter is shared by markdown pages and canvas text nodes:
//! CommonMark plus tables, strikethrough and `{#id}` heading attributes.
//! Two adjustments are made on the event stream before serialization:
//!
//! - every soft line break becomes a hard break (`<br />`), notes are
//!   written line by line and read that way;
//! - bare `http(s)://` URLs in running text become links. URLs inside code,
//!   existing links (markdown or raw `<a>`) and image alt text are left alone.
//!
//! Raw HTML passes through untouched; the wiki-link and tag processors rely
//! on that.

use pulldown_cmark::{
    CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream, html,
};
use regex::Regex;
use std::sync::LazyLock;

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'\[\]()]+"#).unwrap());

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Convert markdown to an HTML fragment.
pub fn to_html(markdown: &str) -> String {
    let parser = TextMergeStream::new(Parser::new_ext(markdown, options()));
    let events = autolink(parser.map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    }));

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Whether byte offset `pos` lies inside a code span or a code block,
/// fenced or indented.
pub fn in_code(markdown: &str, pos: usize) -> bool {
    for (event, range) in Parser::new_ext(markdown, options()).into_offset_iter() {
        if range.start > pos {
            break;
        }
        if matches!(event, Event::Code(_) | Event::Start(Tag::CodeBlock(_))) && range.contains(&pos) {
            return true;
        }
    }
    false
}

/// Plain-text excerpt of at most `max_chars` characters.
///
/// Markup, raw HTML and code blocks are dropped; block boundaries become
/// single spaces. A cut excerpt ends in `...`.
pub fn preview_text(markdown: &str, max_chars: usize) -> String {
    let mut text = String::new();
    let mut in_code_block = false;

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(t) | Event::Code(t) if !in_code_block => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::TableCell,
            ) => text.push(' '),
            _ => {}
        }
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => {
            let head = &text[..cut];
            // back up to a word boundary when there is one
            let head = head.rfind(' ').map_or(head, |i| &head[..i]);
            format!("{}...", head.trim_end())
        }
    }
}

/// Wrap bare URLs in running text with link events.
fn autolink<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut out = Vec::new();
    // markdown links, images and code blocks nest as tags; raw <a> does not
    let mut depth = 0usize;
    let mut in_raw_anchor = false;

    for event in events {
        match &event {
            Event::Start(Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_)) => depth += 1,
            Event::End(TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock) => {
                depth = depth.saturating_sub(1)
            }
            Event::InlineHtml(h) | Event::Html(h) => {
                let tag = h.trim_start().to_ascii_lowercase();
                if tag.starts_with("<a ") || tag.starts_with("<a>") {
                    in_raw_anchor = true;
                } else if tag.starts_with("</a") {
                    in_raw_anchor = false;
                }
            }
            Event::Text(text) if depth == 0 && !in_raw_anchor && BARE_URL.is_match(text) => {
                link_urls(text, &mut out);
                continue;
            }
            _ => {}
        }
        out.push(event);
    }
    out
}

fn link_urls<'a>(text: &str, out: &mut Vec<Event<'a>>) {
    let mut last = 0;
    for m in BARE_URL.find_iter(text) {
        // trailing sentence punctuation is not part of the URL
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
        let end = m.start() + url.len();
        if m.start() > last {
            out.push(Event::Text(CowStr::from(text[last..m.start()].to_string())));
        }
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(url.to_string()),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        out.push(Event::Text(CowStr::from(url.to_string())));
        out.push(Event::End(TagEnd::Link));
        last = end;
    }
    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}
