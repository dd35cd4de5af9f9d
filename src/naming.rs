//! Filename conventions: display titles, web paths and slugs.
//!
//! The filesystem is the source of truth for naming:
//! - `notes/Daily Log.md` → title "Daily Log", web path `notes/Daily%20Log.html`
//! - `boards/Plan.canvas` → title "Plan", web path `boards/Plan.html`
//! - headings and tags become slugs for anchors and tag pages:
//!   "Open Questions" → `open-questions`

use std::path::{Component, Path};

/// Display title for a note: the file stem, verbatim.
///
/// - `"Daily Log.md"` → `"Daily Log"`
/// - `"plan.canvas"` → `"plan"`
/// - `".md"` → `".md"` (no stem to speak of, keep the name)
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Web path of a page relative to the webroot.
///
/// Segments are joined with `/`, the extension of the last one is replaced
/// by `.html` and characters that would break a URL are percent-encoded.
pub fn web_path(relative: &Path) -> String {
    let segments: Vec<String> = relative
        .with_extension("html")
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(encode_segment(&s.to_string_lossy())),
            _ => None,
        })
        .collect();
    segments.join("/")
}

/// Percent-encode the characters that have meaning inside a URL path.
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '%' => out.push_str("%25"),
            _ => out.push(c),
        }
    }
    out
}

/// Lowercase slug: alphanumeric runs joined by single dashes.
///
/// - `"Open Questions"` → `"open-questions"`
/// - `"**Bold** move!"` → `"bold-move"`
/// - `"project/alpha"` → `"project-alpha"`
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
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Whether a file is displayed inline when embedded with `![[...]]`.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| {
            matches!(
                e.as_str(),
                "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "avif" | "bmp"
            )
        })
}

/// Drop everything between `<` and `>`; used to recover heading text from
/// rendered HTML before slugging it.
pub fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}
