//! CLI output formatting for the build and check commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every note is its title and positional index, with filesystem paths
//! shown as secondary context via indented `Source:` lines. The output reads
//! as an inventory of the garden while still pointing back at the files.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Notes
//! 001 Alpha
//!     Source: Projects/Alpha.md
//! 002 index
//!     Source: index.md
//!
//! Canvases
//! 001 Roadmap
//!     Source: Projects/Roadmap.canvas
//!
//! Assets
//!     attachments/diagram.png → images/diagram.png
//!
//! Config
//!     config.toml
//! ```
//!
//! ## Build
//!
//! ```text
//! Discovered 3 pages, 1 asset
//! 001/003 Alpha (2 tags)
//!     Source: Projects/Alpha.md
//! 002/003 Roadmap [canvas]
//!     Source: Projects/Roadmap.canvas
//! ...
//! End pass: 3 pages
//! Tag pages: 2 tags
//! Copied 1 asset
//! ```
//!
//! Every function here is pure (`format_*` returns lines); the `print_*`
//! wrappers write them to stdout.

use crate::build::{BuildEvent, BuildSummary};
use crate::config::CONFIG_FILE;
use crate::page::{Page, PageKind};
use crate::scan::Discovery;
use crate::site::asset_web_path;
use std::path::Path;

/// Format a 1-based positional index as zero-padded 3-digit string.
pub fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

fn page_lines(header: String, relative: &Path) -> Vec<String> {
    vec![
        header,
        format!("{}Source: {}", indent(1), relative.display()),
    ]
}

// ============================================================================
// Check: discovery output
// ============================================================================

/// Format what discovery found under `source`, without building anything.
pub fn format_scan_output(discovery: &Discovery) -> Vec<String> {
    let mut lines = Vec::new();
    let of_kind = |kind: PageKind| -> Vec<&Page> {
        discovery.pages.iter().filter(|p| p.kind == kind).collect()
    };

    for (heading, kind) in [("Notes", PageKind::Markdown), ("Canvases", PageKind::Canvas)] {
        let pages = of_kind(kind);
        if pages.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(heading.to_string());
        for (i, page) in pages.iter().enumerate() {
            let header = format!("{} {}", format_index(i + 1), page.title);
            lines.extend(page_lines(header, &page.relative));
        }
    }

    let site = &discovery.site;
    if !site.assets.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Assets".to_string());
        for asset in &site.assets {
            let relative = asset.strip_prefix(&site.root).unwrap_or(asset);
            lines.push(format!(
                "{}{} \u{2192} {}",
                indent(1),
                relative.display(),
                asset_web_path(asset)
            ));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push("Config".to_string());
    if site.root.join(CONFIG_FILE).exists() {
        lines.push(format!("{}{CONFIG_FILE}", indent(1)));
    } else {
        lines.push(format!("{}(defaults)", indent(1)));
    }
    if site.config.feed.enabled {
        lines.push(format!(
            "{}feed: {}",
            indent(1),
            site.config.feed.site_url.as_deref().unwrap_or("(no site_url)")
        ));
    }

    lines
}

/// Print discovery output to stdout.
pub fn print_scan_output(discovery: &Discovery) {
    for line in format_scan_output(discovery) {
        println!("{}", line);
    }
}

// ============================================================================
// Build: progress events
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::Discovered { pages, assets } => vec![format!(
            "Discovered {}, {}",
            plural(*pages, "page", "pages"),
            plural(*assets, "asset", "assets")
        )],
        BuildEvent::PageBuilt {
            index,
            total,
            relative,
            title,
            kind,
            tags,
        } => {
            let mut header = format!("{}/{} {}", format_index(index + 1), format_index(*total), title);
            if *kind == PageKind::Canvas {
                header.push_str(" [canvas]");
            }
            if *tags > 0 {
                header.push_str(&format!(" ({})", plural(*tags, "tag", "tags")));
            }
            page_lines(header, relative)
        }
        BuildEvent::EndPass { pages } => {
            vec![format!("End pass: {}", plural(*pages, "page", "pages"))]
        }
        BuildEvent::TagPages { tags } => {
            vec![format!("Tag pages: {}", plural(*tags, "tag", "tags"))]
        }
        BuildEvent::Feed { items } => {
            vec![format!("Feed: {}", plural(*items, "item", "items"))]
        }
        BuildEvent::AssetsCopied { count } => {
            vec![format!("Copied {}", plural(*count, "asset", "assets"))]
        }
    }
}

/// Format the closing summary of a build.
pub fn format_build_summary(summary: &BuildSummary, output: &Path) -> Vec<String> {
    let mut lines = vec![format!("Built site \u{2192} {}", output.display())];
    lines.push(format!("{}{}", indent(1), plural(summary.pages, "page", "pages")));
    lines.push(format!("{}{}", indent(1), plural(summary.tags, "tag", "tags")));
    lines.push(format!("{}{}", indent(1), plural(summary.assets, "asset", "assets")));
    if let Some(items) = summary.feed_items {
        lines.push(format!("{}feed.xml ({})", indent(1), plural(items, "item", "items")));
    }
    lines
}

/// Print the build summary to stdout.
pub fn print_build_summary(summary: &BuildSummary, output: &Path) {
    for line in format_build_summary(summary, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::path::PathBuf;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "tag", "tags"), "1 tag");
        assert_eq!(plural(0, "tag", "tags"), "0 tags");
    }

    #[test]
    fn scan_output_lists_notes_canvases_assets() {
        let (_dir, discovery) = discover(&[
            ("index.md", "hi"),
            ("Projects/Alpha.md", "a"),
            ("Projects/Roadmap.canvas", "{}"),
            ("attachments/diagram.png", "png"),
        ]);
        let lines = format_scan_output(&discovery);

        let notes = lines.iter().position(|l| l == "Notes").unwrap();
        // walk order: `Projects` sorts before `index.md`
        assert_eq!(lines[notes + 1], "001 Alpha");
        assert_eq!(lines[notes + 2], "    Source: Projects/Alpha.md");
        assert_eq!(lines[notes + 3], "002 index");

        let canvases = lines.iter().position(|l| l == "Canvases").unwrap();
        assert_eq!(lines[canvases + 1], "001 Roadmap");

        assert!(lines.contains(&"    attachments/diagram.png \u{2192} images/diagram.png".to_string()));
        assert!(lines.contains(&"    (defaults)".to_string()));
    }

    #[test]
    fn scan_output_mentions_config_file() {
        let (_dir, discovery) = discover(&[("a.md", ""), ("config.toml", "site_title = \"X\"\n")]);
        let lines = format_scan_output(&discovery);
        assert!(lines.contains(&"    config.toml".to_string()));
        assert!(!lines.iter().any(|l| l == "Canvases"));
    }

    #[test]
    fn page_built_event_lines() {
        let event = BuildEvent::PageBuilt {
            index: 1,
            total: 3,
            relative: PathBuf::from("Projects/Alpha.md"),
            title: "Alpha".to_string(),
            kind: PageKind::Markdown,
            tags: 2,
        };
        assert_eq!(
            format_build_event(&event),
            vec!["002/003 Alpha (2 tags)", "    Source: Projects/Alpha.md"]
        );
    }

    #[test]
    fn canvas_event_is_marked() {
        let event = BuildEvent::PageBuilt {
            index: 0,
            total: 1,
            relative: PathBuf::from("Board.canvas"),
            title: "Board".to_string(),
            kind: PageKind::Canvas,
            tags: 0,
        };
        assert_eq!(format_build_event(&event)[0], "001/001 Board [canvas]");
    }

    #[test]
    fn stage_events_are_single_lines() {
        assert_eq!(
            format_build_event(&BuildEvent::Discovered { pages: 1, assets: 2 }),
            vec!["Discovered 1 page, 2 assets"]
        );
        assert_eq!(
            format_build_event(&BuildEvent::Feed { items: 5 }),
            vec!["Feed: 5 items"]
        );
    }

    #[test]
    fn summary_includes_feed_only_when_enabled() {
        let summary = BuildSummary {
            pages: 3,
            assets: 1,
            tags: 2,
            feed_items: None,
        };
        let lines = format_build_summary(&summary, Path::new("site"));
        assert_eq!(lines[0], "Built site \u{2192} site");
        assert!(!lines.iter().any(|l| l.contains("feed.xml")));

        let lines = format_build_summary(
            &BuildSummary {
                feed_items: Some(3),
                ..summary
            },
            Path::new("site"),
        );
        assert_eq!(lines.last().unwrap(), "    feed.xml (3 items)");
    }
}
