//! Built-in processors.
//!
//! | Group | Processor | Rewrites |
//! |-------|-----------|----------|
//! | pre | [`FrontMatter`] | leading `---` YAML block: sets title and tags, removed from output |
//! | pre | [`Headings`] | `# Heading` lines: recorded for the heading index, `{#anchor}` appended |
//! | pre | [`WikiLinks`] | `[[Note#Heading\|label]]` links and `![[image.png]]` embeds |
//! | pre | [`Tags`] | `#tag` words: recorded and linked to the tag page |
//! | post | [`HeadingAnchors`] | `<hN>` without an id gets a slug id |
//! | post | [`ExternalLinks`] | absolute `http(s)` links open in a new tab |
//! | end | [`RecentPages`] | `<!-- recent-pages -->` becomes a list of the newest pages |
//!
//! Pre-processors see markdown source (or canvas node text). Code spans and
//! code blocks, fenced or indented, are left alone by the markdown-level
//! processors.

use crate::escape::escape_html;
use crate::markdown;
use crate::naming;
use crate::page::Heading;
use crate::pipeline::{PipelineError, ProcessContext, Processor};
use crate::render;
use crate::scanner::Match;
use crate::site::Resolved;
use crate::tags;
use regex::bytes::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

/// Whether `pos` falls inside a code span or a code block.
fn in_code(buffer: &[u8], pos: usize) -> bool {
    std::str::from_utf8(buffer).is_ok_and(|text| markdown::in_code(text, pos))
}

/// Whether `pos` falls inside an HTML tag on the same line (`<a href="#x">`).
fn in_html_tag(buffer: &[u8], pos: usize) -> bool {
    let line_start = buffer[..pos]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    let line = &buffer[line_start..pos];
    match (
        line.iter().rposition(|&b| b == b'<'),
        line.iter().rposition(|&b| b == b'>'),
    ) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

fn keep(buffer: &[u8], m: &Match, out: &mut Vec<u8>) {
    out.extend_from_slice(&buffer[m.start()..m.end()]);
}

// =========================================================================
// Front matter
// =========================================================================

static FRONT_MATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)\A---[ \t]*\r?\n(.*?)^---[ \t]*\r?(?:\n|\z)").unwrap());

#[derive(Deserialize, Default)]
#[serde(default)]
struct FrontMatterFields {
    title: Option<String>,
    tags: Option<serde_yaml::Value>,
}

/// Tags from a list or from a comma/space separated string. Scalars such
/// as `2024` count as tags, nested values are ignored.
fn tag_list(value: serde_yaml::Value) -> Vec<String> {
    use serde_yaml::Value;
    match value {
        Value::Sequence(items) => items.into_iter().filter_map(scalar_text).collect(),
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::to_string)
            .collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

fn scalar_text(value: serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Leading YAML block. `title` overrides the page title, `tags` (a list or
/// a comma separated string) are recorded. The block is removed.
pub struct FrontMatter;

impl Processor for FrontMatter {
    fn name(&self) -> &'static str {
        "front-matter"
    }

    fn pattern(&self) -> &Regex {
        &FRONT_MATTER
    }

    fn transform(
        &self,
        cx: &mut ProcessContext<'_>,
        buffer: &[u8],
        m: &Match,
        out: &mut Vec<u8>,
    ) -> Result<(), PipelineError> {
        // the scanner resumes at later offsets, where `\A` matches again
        if m.start() != 0 {
            keep(buffer, m, out);
            return Ok(());
        }
        let yaml = m
            .text(buffer, 1)
            .ok_or_else(|| PipelineError::Encoding(cx.page.path.clone()))?;
        if yaml.trim().is_empty() {
            return Ok(());
        }

        let fields: FrontMatterFields = serde_yaml::from_str(yaml)?;
        if let Some(title) = fields.title.as_deref().map(str::trim)
            && !title.is_empty()
        {
            cx.page.title = title.to_string();
        }
        for tag in fields.tags.map(tag_list).unwrap_or_default() {
            let tag = tag.trim().trim_start_matches('#');
            if !tag.is_empty() {
                cx.page.add_tag(tag);
            }
        }
        Ok(())
    }
}

// =========================================================================
// Headings
// =========================================================================

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(#{1,6})[ \t]+([^\r\n]*?)[ \t]*(\r?)$").unwrap()
});

static HEADING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{#([^}\s]+)\}$").unwrap());

/// Records ATX headings for the heading index and pins their anchors with a
/// `{#anchor}` attribute, so the index and the rendered ids agree.
pub struct Headings;

impl Processor for Headings {
    fn name(&self) -> &'static str {
        "headings"
    }

    fn pattern(&self) -> &Regex {
        &HEADING
    }

    fn transform(
        &self,
        cx: &mut ProcessContext<'_>,
        buffer: &[u8],
        m: &Match,
        out: &mut Vec<u8>,
    ) -> Result<(), PipelineError> {
        let (Some(hashes), Some(raw)) = (m.text(buffer, 1), m.text(buffer, 2)) else {
            keep(buffer, m, out);
            return Ok(());
        };
        if in_code(buffer, m.start()) {
            keep(buffer, m, out);
            return Ok(());
        }
        let level = hashes.len() as u8;

        // an explicit {#id} is kept as written
        if let Some(id) = HEADING_ID.captures(raw.as_bytes()) {
            let anchor = String::from_utf8_lossy(&id[1]).into_owned();
            let text = raw[..raw.len() - id[0].len()].trim_end();
            cx.page.headings.push(Heading {
                level,
                text: markdown::preview_text(text, usize::MAX),
                anchor,
            });
            keep(buffer, m, out);
            return Ok(());
        }

        let text = strip_closing_hashes(raw);
        if text.is_empty() {
            keep(buffer, m, out);
            return Ok(());
        }
        let plain = markdown::preview_text(text, usize::MAX);
        let anchor = unique_anchor(&cx.page.headings, &naming::slugify(&plain));
        let cr = m.text(buffer, 3).unwrap_or_default();

        out.extend_from_slice(format!("{hashes} {text} {{#{anchor}}}{cr}").as_bytes());
        cx.page.headings.push(Heading {
            level,
            text: plain,
            anchor,
        });
        Ok(())
    }
}

/// `## Title ##` → `Title`. A `#` glued to a word (`C#`) is content.
fn strip_closing_hashes(text: &str) -> &str {
    let stripped = text.trim_end_matches('#');
    if stripped.len() == text.len() {
        return text;
    }
    if stripped.is_empty() || stripped.ends_with([' ', '\t']) {
        stripped.trim_end()
    } else {
        text
    }
}

fn unique_anchor(existing: &[Heading], slug: &str) -> String {
    let base = if slug.is_empty() { "section" } else { slug };
    let taken = |a: &str| existing.iter().any(|h| h.anchor == a);
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

// =========================================================================
// Wiki links
// =========================================================================

static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[\[([^\]\|#\r\n]*)(#[^\]\|\r\n]*)?(?:\|([^\]\r\n]*))?\]\]").unwrap()
});

/// `[[Target]]`, `[[Target#Heading]]`, `[[Target|label]]`, `[[#Heading]]`
/// and `![[embed]]`, resolved through the title index.
///
/// Unresolvable targets fail the build when `strict_links` is set and
/// render as a `broken-link` span otherwise.
pub struct WikiLinks;

impl Processor for WikiLinks {
    fn name(&self) -> &'static str {
        "wiki-links"
    }

    fn pattern(&self) -> &Regex {
        &WIKI_LINK
    }

    fn transform(
        &self,
        cx: &mut ProcessContext<'_>,
        buffer: &[u8],
        m: &Match,
        out: &mut Vec<u8>,
    ) -> Result<(), PipelineError> {
        if in_code(buffer, m.start()) {
            keep(buffer, m, out);
            return Ok(());
        }
        let embed = m.bytes(buffer, 1).is_some_and(|b| !b.is_empty());
        let target = m.text(buffer, 2).unwrap_or_default().trim();
        let anchor = m
            .text(buffer, 3)
            .map(|a| a.trim_start_matches('#').trim())
            .filter(|a| !a.is_empty());
        let label = m.text(buffer, 4).map(str::trim).filter(|l| !l.is_empty());
        let fragment = anchor
            .map(|a| format!("#{}", naming::slugify(a)))
            .unwrap_or_default();

        let html = if target.is_empty() {
            match anchor {
                Some(a) => internal_link(&fragment, label.unwrap_or(a)),
                None => broken_link(cx, "", label)?,
            }
        } else {
            match resolve(cx, target) {
                Some(Resolved::Page(link)) => {
                    let href = format!("{}{}", cx.site.href(&link.web_path), fragment);
                    internal_link(&href, label.unwrap_or(target))
                }
                Some(Resolved::Asset(web_path)) if embed && naming::is_image(Path::new(target)) => {
                    let src = cx.site.href(&web_path);
                    if cx.page.first_image.is_none() {
                        cx.page.first_image = Some(web_path.clone());
                    }
                    image(&src, target, label)
                }
                Some(Resolved::Asset(web_path)) => {
                    internal_link(&cx.site.href(&web_path), label.unwrap_or(target))
                }
                None => broken_link(cx, target, label)?,
            }
        };
        out.extend_from_slice(html.as_bytes());
        Ok(())
    }
}

/// Look up a target by name, then by its last path segment
/// (`[[Projects/Alpha]]` finds `Alpha`).
fn resolve<'s>(cx: &ProcessContext<'s>, target: &str) -> Option<Resolved<'s>> {
    cx.site.lookup(target).or_else(|| {
        target
            .rsplit_once('/')
            .and_then(|(_, last)| cx.site.lookup(last))
    })
}

fn internal_link(href: &str, text: &str) -> String {
    format!(
        r#"<a class="internal-link" href="{}">{}</a>"#,
        escape_html(href),
        escape_html(text)
    )
}

/// `![[pic.png|300]]` sets a width, any other label becomes the alt text.
fn image(src: &str, name: &str, label: Option<&str>) -> String {
    match label {
        Some(width) if width.parse::<u32>().is_ok() => format!(
            r#"<img src="{}" alt="{}" width="{}">"#,
            escape_html(src),
            escape_html(name),
            width
        ),
        _ => format!(
            r#"<img src="{}" alt="{}">"#,
            escape_html(src),
            escape_html(label.unwrap_or(name))
        ),
    }
}

fn broken_link(
    cx: &ProcessContext<'_>,
    target: &str,
    label: Option<&str>,
) -> Result<String, PipelineError> {
    if cx.site.config.strict_links {
        return Err(PipelineError::UnresolvedLink {
            page: cx.page.relative.display().to_string(),
            target: target.to_string(),
        });
    }
    Ok(format!(
        r#"<span class="broken-link">{}</span>"#,
        escape_html(label.unwrap_or(target))
    ))
}

// =========================================================================
// Tags
// =========================================================================

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)#([\p{L}_][\p{L}\p{N}_\-/]*)").unwrap());

/// `#tag` words become links to their tag page and are recorded on the page.
pub struct Tags;

impl Processor for Tags {
    fn name(&self) -> &'static str {
        "tags"
    }

    fn pattern(&self) -> &Regex {
        &TAG
    }

    fn transform(
        &self,
        cx: &mut ProcessContext<'_>,
        buffer: &[u8],
        m: &Match,
        out: &mut Vec<u8>,
    ) -> Result<(), PipelineError> {
        let Some(tag) = m.text(buffer, 2).map(|t| t.trim_end_matches(['/', '-'])) else {
            keep(buffer, m, out);
            return Ok(());
        };
        let Some((name_start, _)) = m.group(2) else {
            keep(buffer, m, out);
            return Ok(());
        };
        // the `#`, not the leading whitespace, decides where the tag sits
        let hash = name_start - 1;
        if in_code(buffer, hash) || in_html_tag(buffer, hash) {
            keep(buffer, m, out);
            return Ok(());
        }
        let lead = m.bytes(buffer, 1).unwrap_or_default();
        // characters trimmed off the tag stay in the text
        let tag_end = name_start + tag.len();

        cx.page.add_tag(tag);
        out.extend_from_slice(lead);
        out.extend_from_slice(
            format!(
                r##"<a class="tag" href="{}">#{}</a>"##,
                escape_html(&cx.site.href(&tags::tag_web_path(tag))),
                escape_html(tag)
            )
            .as_bytes(),
        );
        out.extend_from_slice(&buffer[tag_end..m.end()]);
        Ok(())
    }
}

// =========================================================================
// Heading anchors (post)
// =========================================================================

static HTML_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<h([1-6])>(.*?)</h([1-6])>").unwrap());

/// Gives `<hN>` elements without attributes a slug id. Markdown headings
/// already carry one; this covers raw HTML headings and canvas text.
pub struct HeadingAnchors;

impl Processor for HeadingAnchors {
    fn name(&self) -> &'static str {
        "heading-anchors"
    }

    fn pattern(&self) -> &Regex {
        &HTML_HEADING
    }

    fn transform(
        &self,
        _cx: &mut ProcessContext<'_>,
        buffer: &[u8],
        m: &Match,
        out: &mut Vec<u8>,
    ) -> Result<(), PipelineError> {
        let (Some(open), Some(inner), Some(close)) =
            (m.text(buffer, 1), m.text(buffer, 2), m.text(buffer, 3))
        else {
            keep(buffer, m, out);
            return Ok(());
        };
        let anchor = naming::slugify(&naming::strip_html_tags(inner));
        if open != close || anchor.is_empty() {
            keep(buffer, m, out);
            return Ok(());
        }
        out.extend_from_slice(format!(r#"<h{open} id="{anchor}">{inner}</h{open}>"#).as_bytes());
        Ok(())
    }
}

// =========================================================================
// External links (post)
// =========================================================================

static EXTERNAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a\s[^>]*href="https?://[^>]*>"#).unwrap());

/// Absolute `http(s)` links open in a new tab.
pub struct ExternalLinks;

impl Processor for ExternalLinks {
    fn name(&self) -> &'static str {
        "external-links"
    }

    fn pattern(&self) -> &Regex {
        &EXTERNAL_LINK
    }

    fn transform(
        &self,
        _cx: &mut ProcessContext<'_>,
        buffer: &[u8],
        m: &Match,
        out: &mut Vec<u8>,
    ) -> Result<(), PipelineError> {
        let tag = &buffer[m.start()..m.end()];
        if tag.windows(7).any(|w| w == b"target=") {
            out.extend_from_slice(tag);
            return Ok(());
        }
        out.extend_from_slice(&tag[..tag.len() - 1]);
        out.extend_from_slice(br#" target="_blank" rel="noopener">"#);
        Ok(())
    }
}

// =========================================================================
// Recent pages (end)
// =========================================================================

static RECENT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*recent-pages\s*-->").unwrap());

/// Replaces `<!-- recent-pages -->` with the `recent_pages` newest pages.
pub struct RecentPages;

impl Processor for RecentPages {
    fn name(&self) -> &'static str {
        "recent-pages"
    }

    fn pattern(&self) -> &Regex {
        &RECENT_MARKER
    }

    fn transform(
        &self,
        cx: &mut ProcessContext<'_>,
        buffer: &[u8],
        m: &Match,
        out: &mut Vec<u8>,
    ) -> Result<(), PipelineError> {
        let Some(aggregate) = cx.aggregate else {
            keep(buffer, m, out);
            return Ok(());
        };
        let limit = cx.site.config.recent_pages;
        let list = render::recent_list(cx.site, &aggregate.recent[..limit.min(aggregate.recent.len())]);
        out.extend_from_slice(list.into_string().as_bytes());
        Ok(())
    }
}
