//! HTML document rendering with Maud.
//!
//! Every generated page shares [`base_document`]: the stylesheet link, the
//! sidebar with the site title and the folder navigation, and a `<main>`
//! slot. Page-specific renderers fill the slot:
//!
//! | Renderer | Output |
//! |----------|--------|
//! | [`markdown_page`] | title, tag links, heading index, converted body, footer |
//! | [`canvas_page`] | title and the positioned canvas nodes |
//! | [`recent_list`] | `<ul class="recent-pages">` fragment for the end pass |
//!
//! User content (titles, tags, folder names, previews) goes through
//! [`crate::escape::safe`]; converted markdown is inserted as
//! `PreEscaped` since the converter already produced HTML.

use crate::build::RecentEntry;
use crate::escape::safe;
use crate::page::Page;
use crate::site::Site;
use crate::tags;
use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::time::SystemTime;

/// Shared page skeleton.
///
/// `current` is the web path of the page being rendered, used to mark its
/// navigation entry; `None` for generated pages such as tag listings.
pub fn base_document(
    site: &Site,
    title: &str,
    body_class: Option<&str>,
    current: Option<&str>,
    content: Markup,
) -> Markup {
    let config = &site.config;
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (safe(title)) " | " (safe(&config.site_title)) }
                link rel="stylesheet" href=(site.href("static/style.css"));
                @if config.feed.enabled {
                    link rel="alternate" type="application/rss+xml"
                        title=(config.site_title) href=(site.href("feed.xml"));
                }
            }
            body class=[body_class] {
                aside.sidebar {
                    a.site-title href=(config.webroot) { (safe(&config.site_title)) }
                    (site.tree.render(site, current, &config.webroot))
                    a.tag-index-link href=(site.href(tags::TAG_INDEX)) { "All tags" }
                }
                main {
                    (content)
                }
            }
        }
    }
}

/// Links to the tag pages of `tags`.
pub fn tag_links(site: &Site, tags: &[String]) -> Markup {
    html! {
        @if !tags.is_empty() {
            ul.note-tags {
                @for tag in tags {
                    li {
                        a.tag href=(site.href(&tags::tag_web_path(tag))) { "#" (safe(tag)) }
                    }
                }
            }
        }
    }
}

/// A rendered markdown note.
pub fn markdown_page(site: &Site, page: &Page, body: &str) -> Markup {
    let content = html! {
        article.note {
            header {
                h1.note-title { (safe(&page.title)) }
                (tag_links(site, &page.tags))
            }
            @if !page.headings.is_empty() {
                nav.heading-index {
                    ul {
                        @for heading in &page.headings {
                            li class=(format!("level-{}", heading.level)) {
                                a href=(format!("#{}", heading.anchor)) { (safe(&heading.text)) }
                            }
                        }
                    }
                }
            }
            div.note-body {
                (PreEscaped(body))
            }
            @if let Some(footer) = &site.config.footer {
                footer.note-footer { (PreEscaped(footer)) }
            }
        }
    };
    base_document(site, &page.title, Some("note-page"), Some(&page.web_path), content)
}

/// A rendered canvas. `canvas` is the output of [`crate::canvas::render`].
pub fn canvas_page(site: &Site, page: &Page, canvas: Markup) -> Markup {
    let content = html! {
        article.canvas-note {
            header {
                h1.note-title { (safe(&page.title)) }
                (tag_links(site, &page.tags))
            }
            div.canvas-viewport {
                (canvas)
            }
        }
    };
    base_document(site, &page.title, Some("canvas-page"), Some(&page.web_path), content)
}

/// `YYYY-MM-DD` of a timestamp, in UTC.
pub fn format_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format("%Y-%m-%d").to_string()
}

/// List of recently created pages, newest first.
pub fn recent_list(site: &Site, entries: &[RecentEntry]) -> Markup {
    html! {
        ul.recent-pages {
            @for entry in entries {
                @let date = format_date(entry.created);
                li {
                    a href=(site.href(&entry.web_path)) { (safe(&entry.title)) }
                    " "
                    time datetime=(date) { (date) }
                }
            }
        }
    }
}
