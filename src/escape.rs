//! HTML escaping for every piece of user content interpolated into output.
//!
//! Titles, tag names, folder names and preview text all pass through
//! [`escape_html`] before they are embedded. Templates wrap the result in
//! [`maud::PreEscaped`] so nothing is escaped twice.

use maud::PreEscaped;

/// Escape `&`, `<`, `>`, `"`, `'` and `\`. Every other character is kept as is.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '\\' => out.push_str("&#92;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape and mark as safe for maud interpolation.
pub fn safe(s: &str) -> PreEscaped<String> {
    PreEscaped(escape_html(s))
}
