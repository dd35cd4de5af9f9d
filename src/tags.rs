//! Tag pages.
//!
//! Every tag gets `tags/<slug>.html` listing the pages that carry it, and
//! `tags/index.html` lists all tags with their page counts. Both are built
//! from the [`Aggregate`] after the end pass.

use crate::build::{Aggregate, TagEntry};
use crate::escape::safe;
use crate::naming;
use crate::page::Page;
use crate::render;
use crate::site::Site;
use maud::{Markup, html};
use std::fs;
use std::path::Path;

/// Directory of the tag pages below the output root.
pub const TAG_DIR: &str = "tags";

/// Web path of the tag index.
pub const TAG_INDEX: &str = "tags/index.html";

/// File-name-safe form of a tag: `project/Alpha` → `project-alpha`.
///
/// Tags without letters or digits (`_`, `/`) fall back to the hex of their
/// bytes, `tag-5f`, so the slug is always a plain file name.
pub fn tag_slug(tag: &str) -> String {
    let slug = naming::slugify(tag);
    if !slug.is_empty() {
        return slug;
    }
    let hex: String = tag.bytes().map(|b| format!("{b:02x}")).collect();
    format!("tag-{hex}")
}

/// Web path of a tag's page.
pub fn tag_web_path(tag: &str) -> String {
    format!("{TAG_DIR}/{}.html", tag_slug(tag))
}

/// Write one page per tag plus the tag index. Returns the number of tags.
pub fn write_tag_pages(
    site: &Site,
    aggregate: &Aggregate,
    pages: &[Page],
    output: &Path,
) -> std::io::Result<usize> {
    let dir = output.join(TAG_DIR);
    fs::create_dir_all(&dir)?;

    for (slug, entry) in &aggregate.tags {
        let html = render_tag_page(site, entry, pages);
        fs::write(dir.join(format!("{slug}.html")), html.into_string())?;
    }
    let index = render_tag_index(site, aggregate);
    fs::write(output.join(TAG_INDEX), index.into_string())?;

    Ok(aggregate.tags.len())
}

fn render_tag_page(site: &Site, entry: &TagEntry, pages: &[Page]) -> Markup {
    let title = format!("#{}", entry.name);
    let content = html! {
        article.tag-listing {
            h1 { (safe(&title)) }
            ul.tagged-pages {
                @for page in entry.pages.iter().filter_map(|&i| pages.get(i)) {
                    li {
                        a href=(site.href(&page.web_path)) { (safe(&page.title)) }
                        @if !page.preview.is_empty() {
                            p.preview { (safe(&page.preview)) }
                        }
                    }
                }
            }
            a.tag-index-link href=(site.href(TAG_INDEX)) { "All tags" }
        }
    };
    render::base_document(site, &title, Some("tag-page"), None, content)
}

fn render_tag_index(site: &Site, aggregate: &Aggregate) -> Markup {
    let content = html! {
        article.tag-listing {
            h1 { "Tags" }
            @if aggregate.tags.is_empty() {
                p { "No tags yet." }
            } @else {
                ul.tag-index {
                    @for entry in aggregate.tags.values() {
                        li {
                            a.tag href=(site.href(&tag_web_path(&entry.name))) {
                                "#" (safe(&entry.name))
                            }
                            " "
                            span.tag-count { "(" (entry.pages.len()) ")" }
                        }
                    }
                }
            }
        }
    };
    render::base_document(site, "Tags", Some("tag-page"), None, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::page::PageKind;
    use crate::test_helpers::*;
    use std::path::PathBuf;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn page(rel: &str, tags: &[&str]) -> Page {
        let mut page = Page::new(
            Path::new("/vault").join(rel),
            PathBuf::from(rel),
            PageKind::Markdown,
            SystemTime::UNIX_EPOCH,
        );
        for tag in tags {
            page.add_tag(tag);
        }
        page
    }

    fn site() -> Site {
        Site::new(SiteConfig::default(), PathBuf::from("/vault"))
    }

    #[test]
    fn tag_paths() {
        assert_eq!(tag_web_path("rust"), "tags/rust.html");
        assert_eq!(tag_web_path("Project/Alpha"), "tags/project-alpha.html");
        assert_eq!(tag_slug("_"), "tag-5f");
    }

    #[test]
    fn symbol_only_tags_stay_inside_tag_dir() {
        assert_eq!(tag_web_path("/"), "tags/tag-2f.html");
        assert_eq!(tag_slug(".."), "tag-2e2e");
        assert_eq!(tag_slug("\\"), "tag-5c");

        let pages = vec![page("a.md", &["/", ".."])];
        let aggregate = Aggregate::collect(&pages);
        let out = TempDir::new().unwrap();
        write_tag_pages(&site(), &aggregate, &pages, out.path()).unwrap();
        assert!(out.path().join("tags/tag-2f.html").is_file());
        assert!(out.path().join("tags/tag-2e2e.html").is_file());
    }

    #[test]
    fn writes_one_page_per_tag_and_index() {
        let pages = vec![page("a.md", &["rust", "notes"]), page("b.md", &["rust"])];
        let aggregate = Aggregate::collect(&pages);
        let out = TempDir::new().unwrap();

        let count = write_tag_pages(&site(), &aggregate, &pages, out.path()).unwrap();
        assert_eq!(count, 2);

        let rust = read_output(out.path(), "tags/rust.html");
        assert_contains(&rust, "<h1>#rust</h1>");
        assert_contains(&rust, r#"<a href="/a.html">a</a>"#);
        assert_contains(&rust, r#"<a href="/b.html">b</a>"#);

        let index = read_output(out.path(), "tags/index.html");
        let notes = index.find("#notes").unwrap();
        let rust = index.find("#rust").unwrap();
        assert!(notes < rust, "tags sorted");
        assert_contains(&index, r#"<span class="tag-count">(2)</span>"#);
    }

    #[test]
    fn tag_names_escaped() {
        let pages = vec![page("a.md", &["<b>"])];
        let aggregate = Aggregate::collect(&pages);
        let out = TempDir::new().unwrap();
        write_tag_pages(&site(), &aggregate, &pages, out.path()).unwrap();

        let index = read_output(out.path(), "tags/index.html");
        assert_contains(&index, "#&lt;b&gt;");
        assert!(!index.contains("#<b>"));
    }

    #[test]
    fn empty_index_when_no_tags() {
        let out = TempDir::new().unwrap();
        let count = write_tag_pages(&site(), &Aggregate::default(), &[], out.path()).unwrap();
        assert_eq!(count, 0);
        assert_contains(&read_output(out.path(), "tags/index.html"), "No tags yet.");
    }
}
