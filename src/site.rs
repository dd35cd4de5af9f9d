//! Shared build context.
//!
//! A [`Site`] is assembled once by [`scan`](crate::scan::scan) and is
//! read-only for the rest of the build: the configuration, the
//! [`PathTree`] of pages, the navigation entry of every page, and the
//! [`TitleIndex`] used to resolve `[[wiki links]]` and embeds.

use crate::config::SiteConfig;
use crate::naming;
use crate::path_tree::{NavLink, NavResolver, PathTree};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Where copied assets live below the output root.
pub const ASSET_DIR: &str = "images";

/// What a title resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Index into the build's page list.
    Page(usize),
    /// Absolute path of a non-page file.
    Asset(PathBuf),
}

/// Case-insensitive lookup from note titles and file names to targets.
///
/// Pages are registered under their file stem and their file name
/// (`Daily Log` and `Daily Log.md`); assets under their file name
/// (`diagram.png`). The first registration of a key wins.
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    entries: HashMap<String, Target>,
}

impl TitleIndex {
    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Register `name`. Returns `false` when the key was already taken.
    pub fn insert(&mut self, name: &str, target: Target) -> bool {
        let key = Self::key(name);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, target);
        true
    }

    /// Explicit "not found" as `None`; callers decide the policy.
    pub fn get(&self, name: &str) -> Option<&Target> {
        self.entries.get(&Self::key(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A resolved cross-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<'a> {
    Page(&'a NavLink),
    /// Web path of the copied asset, relative to the webroot.
    Asset(String),
}

#[derive(Debug, Clone)]
pub struct Site {
    pub config: SiteConfig,
    /// Absolute content root.
    pub root: PathBuf,
    pub tree: PathTree,
    pub titles: TitleIndex,
    /// Navigation entry per page, in page-list order.
    links: Vec<NavLink>,
    by_path: HashMap<PathBuf, usize>,
    /// Non-page files, copied verbatim to the asset directory.
    pub assets: Vec<PathBuf>,
}

impl Site {
    pub fn new(config: SiteConfig, root: PathBuf) -> Self {
        Self {
            tree: PathTree::new(root.clone()),
            config,
            root,
            titles: TitleIndex::default(),
            links: Vec::new(),
            by_path: HashMap::new(),
            assets: Vec::new(),
        }
    }

    /// Record page number `index`: its navigation entry and its titles.
    pub fn register_page(&mut self, index: usize, path: &Path, link: NavLink) {
        if let Some(name) = path.file_name() {
            self.titles
                .insert(&name.to_string_lossy(), Target::Page(index));
        }
        self.titles.insert(&link.title, Target::Page(index));
        self.by_path.insert(path.to_path_buf(), index);
        if self.links.len() <= index {
            self.links.resize_with(index + 1, || NavLink {
                title: String::new(),
                web_path: String::new(),
            });
        }
        self.links[index] = link;
    }

    /// Record a non-page file.
    pub fn register_asset(&mut self, path: &Path) {
        if let Some(name) = path.file_name() {
            self.titles
                .insert(&name.to_string_lossy(), Target::Asset(path.to_path_buf()));
        }
        self.assets.push(path.to_path_buf());
    }

    /// Resolve a wiki-link target by title or file name.
    pub fn lookup(&self, name: &str) -> Option<Resolved<'_>> {
        match self.titles.get(name)? {
            Target::Page(i) => self.links.get(*i).map(Resolved::Page),
            Target::Asset(path) => Some(Resolved::Asset(asset_web_path(path))),
        }
    }

    /// Absolute link for a web path.
    pub fn href(&self, web_path: &str) -> String {
        format!("{}{}", self.config.webroot, web_path)
    }
}

impl NavResolver for Site {
    fn nav_link(&self, path: &Path) -> Option<&NavLink> {
        self.by_path.get(path).and_then(|i| self.links.get(*i))
    }
}

/// Web path of a copied asset: `images/<file name>`.
pub fn asset_web_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}/{}", ASSET_DIR, naming::encode_segment(&name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Site {
        let mut site = Site::new(SiteConfig::default(), PathBuf::from("/vault"));
        site.register_page(
            0,
            Path::new("/vault/notes/Daily Log.md"),
            NavLink {
                title: "Daily Log".to_string(),
                web_path: "notes/Daily%20Log.html".to_string(),
            },
        );
        site.register_asset(Path::new("/vault/img/My Diagram.png"));
        site
    }

    #[test]
    fn lookup_page_by_title_case_insensitive() {
        let site = site();
        let Some(Resolved::Page(link)) = site.lookup("daily log") else {
            panic!("expected page");
        };
        assert_eq!(link.web_path, "notes/Daily%20Log.html");
    }

    #[test]
    fn lookup_page_by_file_name() {
        assert!(matches!(site().lookup("Daily Log.md"), Some(Resolved::Page(_))));
    }

    #[test]
    fn lookup_asset() {
        assert_eq!(
            site().lookup("My Diagram.png"),
            Some(Resolved::Asset("images/My%20Diagram.png".to_string()))
        );
    }

    #[test]
    fn lookup_missing_is_none() {
        assert_eq!(site().lookup("Nowhere"), None);
    }

    #[test]
    fn first_registration_wins() {
        let mut index = TitleIndex::default();
        assert!(index.insert("Note", Target::Page(0)));
        assert!(!index.insert("note", Target::Page(1)));
        assert_eq!(index.get("NOTE"), Some(&Target::Page(0)));
    }

    #[test]
    fn nav_resolver_by_absolute_path() {
        let site = site();
        let link = site.nav_link(Path::new("/vault/notes/Daily Log.md")).unwrap();
        assert_eq!(link.title, "Daily Log");
        assert!(site.nav_link(Path::new("/vault/other.md")).is_none());
    }

    #[test]
    fn href_uses_webroot() {
        let mut site = site();
        site.config.webroot = "/garden/".to_string();
        assert_eq!(site.href("a.html"), "/garden/a.html");
    }
}
