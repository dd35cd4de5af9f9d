//! Filesystem discovery.
//!
//! First barrier of the build. Walks the content root and registers every
//! file before any page is processed:
//!
//! ```text
//! notes/                       # Content root
//! ├── config.toml              # Site configuration (optional, not a page)
//! ├── index.md                 # Page
//! ├── Projects/
//! │   ├── Alpha.md             # Page, nested in the navigation tree
//! │   └── Roadmap.canvas       # Canvas page
//! ├── attachments/
//! │   └── diagram.png          # Asset: title index + copied to images/
//! └── .obsidian/               # Hidden: skipped
//! ```
//!
//! ## Output
//!
//! A [`Discovery`]: the read-only [`Site`] (config, path tree, title index,
//! assets) and the list of [`Page`]s, all `Unbuilt`, in walk order.
//!
//! Entries are visited sorted by file name, so page indices and title-index
//! collisions (first registration wins) are deterministic.

use crate::config::{self, SiteConfig};
use crate::page::{Page, PageKind};
use crate::path_tree::{NavLink, PathTreeError};
use crate::site::Site;
use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Path tree error: {0}")]
    Tree(#[from] PathTreeError),
    #[error("Content root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("{} and {} would both be written to {web_path}", first.display(), second.display())]
    WebPathCollision {
        web_path: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Everything known after discovery.
#[derive(Debug)]
pub struct Discovery {
    pub site: Site,
    pub pages: Vec<Page>,
}

/// Discover the content root, loading `config.toml` from it.
///
/// `excluded` lists directories to leave out (e.g. an output directory
/// placed inside the content root).
pub fn scan(root: &Path, excluded: &[PathBuf]) -> Result<Discovery, ScanError> {
    let config = config::load_config(root)?;
    scan_with_config(root, config, excluded)
}

/// Discover the content root with an already loaded config.
pub fn scan_with_config(
    root: &Path,
    config: SiteConfig,
    excluded: &[PathBuf],
) -> Result<Discovery, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let root = root.canonicalize()?;
    let excluded: Vec<PathBuf> = excluded
        .iter()
        .filter_map(|p| p.canonicalize().ok())
        .collect();
    let config_file = root.join(config::CONFIG_FILE);
    let ignore = config.ignore.clone();

    let mut site = Site::new(config, root.clone());
    let mut pages: Vec<Page> = Vec::new();
    let mut web_paths: HashMap<String, usize> = HashMap::new();

    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e, &ignore, &excluded));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.path() == config_file {
            continue;
        }
        let path = entry.path();

        match PageKind::from_path(path) {
            Some(kind) => {
                let relative = path.strip_prefix(&root).unwrap_or(path).to_path_buf();
                let created = created_time(&entry.metadata()?);
                let page = Page::new(path.to_path_buf(), relative, kind, created);
                if let Some(&first) = web_paths.get(&page.web_path) {
                    return Err(ScanError::WebPathCollision {
                        web_path: page.web_path,
                        first: pages[first].relative.clone(),
                        second: page.relative,
                    });
                }
                web_paths.insert(page.web_path.clone(), pages.len());

                site.tree.insert(path)?;
                site.register_page(
                    pages.len(),
                    path,
                    NavLink {
                        title: page.title.clone(),
                        web_path: page.web_path.clone(),
                    },
                );
                pages.push(page);
            }
            None => site.register_asset(path),
        }
    }

    Ok(Discovery { site, pages })
}

fn is_skipped(entry: &DirEntry, ignore: &[String], excluded: &[PathBuf]) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    if entry.file_type().is_dir() {
        return ignore.iter().any(|i| *i == name) || excluded.iter().any(|e| e == entry.path());
    }
    false
}

/// Creation time where the platform records it, modification time otherwise.
fn created_time(metadata: &Metadata) -> SystemTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_tree::NavResolver;
    use crate::site::{Resolved, Target};
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    fn relative_pages(discovery: &Discovery) -> Vec<String> {
        discovery
            .pages
            .iter()
            .map(|p| p.relative.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn finds_markdown_and_canvas_pages() {
        let tmp = write_tree(&[
            ("notes/a.md", "# A\n"),
            ("notes/b.md", "# B\n"),
            ("board.canvas", r#"{"nodes":[],"edges":[]}"#),
        ]);
        let discovery = scan(tmp.path(), &[]).unwrap();

        assert_eq!(
            relative_pages(&discovery),
            vec!["board.canvas", "notes/a.md", "notes/b.md"]
        );
        assert_eq!(find_page(&discovery.pages, "board").kind, PageKind::Canvas);
        assert_eq!(find_page(&discovery.pages, "a").kind, PageKind::Markdown);
    }

    #[test]
    fn other_files_become_assets() {
        let tmp = write_tree(&[("a.md", "text"), ("img/pic.png", "png")]);
        let discovery = scan(tmp.path(), &[]).unwrap();

        assert_eq!(discovery.pages.len(), 1);
        assert_eq!(discovery.site.assets.len(), 1);
        assert_eq!(
            discovery.site.lookup("pic.png"),
            Some(Resolved::Asset("images/pic.png".to_string()))
        );
    }

    #[test]
    fn config_toml_is_neither_page_nor_asset() {
        let tmp = write_tree(&[("a.md", "text"), ("config.toml", "site_title = \"X\"\n")]);
        let discovery = scan(tmp.path(), &[]).unwrap();

        assert!(discovery.site.assets.is_empty());
        assert_eq!(discovery.site.config.site_title, "X");
    }

    #[test]
    fn hidden_entries_skipped() {
        let tmp = write_tree(&[
            ("a.md", "text"),
            (".obsidian/workspace.md", "x"),
            (".hidden.md", "x"),
        ]);
        let discovery = scan(tmp.path(), &[]).unwrap();
        assert_eq!(relative_pages(&discovery), vec!["a.md"]);
        assert!(discovery.site.assets.is_empty());
    }

    #[test]
    fn ignored_directories_skipped() {
        let tmp = write_tree(&[
            ("a.md", "text"),
            ("templates/t.md", "x"),
            ("config.toml", "ignore = [\"templates\"]\n"),
        ]);
        let discovery = scan(tmp.path(), &[]).unwrap();
        assert_eq!(relative_pages(&discovery), vec!["a.md"]);
    }

    #[test]
    fn excluded_directory_skipped() {
        let tmp = write_tree(&[("a.md", "text"), ("site/old.md", "x")]);
        let discovery = scan(tmp.path(), &[tmp.path().join("site")]).unwrap();
        assert_eq!(relative_pages(&discovery), vec!["a.md"]);
    }

    #[test]
    fn pages_registered_in_tree_and_titles() {
        let tmp = write_tree(&[("notes/Daily Log.md", "text")]);
        let discovery = scan(tmp.path(), &[]).unwrap();
        let site = &discovery.site;

        assert_eq!(site.titles.get("daily log"), Some(&Target::Page(0)));
        let files = site.tree.files();
        assert_eq!(files.len(), 1);
        let link = site.nav_link(files[0]).unwrap();
        assert_eq!(link.web_path, "notes/Daily%20Log.html");
    }

    #[test]
    fn duplicate_titles_resolve_to_first_in_walk_order() {
        let tmp = write_tree(&[("b/Note.md", "x"), ("a/Note.md", "y")]);
        let discovery = scan(tmp.path(), &[]).unwrap();

        let Some(Resolved::Page(link)) = discovery.site.lookup("Note") else {
            panic!("expected page");
        };
        assert_eq!(link.web_path, "a/Note.html");
    }

    #[test]
    fn note_and_canvas_with_same_stem_collide() {
        let tmp = write_tree(&[("Plans/a.canvas", "{}"), ("Plans/a.md", "x")]);
        match scan(tmp.path(), &[]) {
            Err(ScanError::WebPathCollision {
                web_path,
                first,
                second,
            }) => {
                assert_eq!(web_path, "Plans/a.html");
                assert_eq!(first, PathBuf::from("Plans/a.canvas"));
                assert_eq!(second, PathBuf::from("Plans/a.md"));
            }
            other => panic!("expected a collision, got {other:?}"),
        }
    }

    #[test]
    fn same_stem_in_different_folders_is_fine() {
        let tmp = write_tree(&[("x/a.md", "x"), ("y/a.canvas", "{}")]);
        assert_eq!(scan(tmp.path(), &[]).unwrap().pages.len(), 2);
    }

    #[test]
    fn invalid_config_is_error() {
        let tmp = write_tree(&[("a.md", "x"), ("config.toml", "webroot = \"nope\"\n")]);
        assert!(matches!(scan(tmp.path(), &[]), Err(ScanError::Config(_))));
    }

    #[test]
    fn missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            scan_with_config(&missing, SiteConfig::default(), &[]),
            Err(ScanError::NotADirectory(_))
        ));
    }

    #[test]
    fn pages_start_unbuilt() {
        let tmp = write_tree(&[("a.md", "x")]);
        fs::write(tmp.path().join("b.md"), "y").unwrap();
        let discovery = scan(tmp.path(), &[]).unwrap();
        for page in &discovery.pages {
            assert_eq!(page.state(), &crate::page::PageState::Unbuilt);
            assert!(page.path.is_absolute());
        }
    }
}
