//! Hierarchical folder/file index of the note tree.
//!
//! Every page path discovered under the source root is inserted into a
//! [`PathTree`]. The tree is built once, never mutated afterwards, and drives
//! both the navigation menu embedded in every page and the deterministic
//! ordering of files and folders.
//!
//! ```text
//! notes/a.md          root
//! notes/b.md    →     └── notes/
//! todo.canvas             ├── a.md
//!                         └── b.md
//!                     └── todo.canvas
//! ```
//!
//! Directories keep their children in insertion order; ordering for display
//! is applied when reading (see [`Directory::sorted`]).

use crate::escape::{escape_html, safe};
use maud::{Markup, PreEscaped, html};
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathTreeError {
    #[error("{0} is not inside the tree root {1}")]
    OutsideRoot(PathBuf, PathBuf),
    #[error("{0} has no file name")]
    Empty(PathBuf),
    #[error("{0} conflicts with an existing entry at '{1}'")]
    Conflict(PathBuf, String),
}

/// A node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Directory(Directory),
    /// Absolute filesystem path of the file.
    File(PathBuf),
}

/// Insertion-ordered mapping from entry name to child node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    children: Vec<(String, Node)>,
}

/// What the navigation needs to know about a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub title: String,
    /// Path relative to the webroot, e.g. `notes/a.html`.
    pub web_path: String,
}

/// Maps a file leaf back to its navigation entry.
pub trait NavResolver {
    fn nav_link(&self, path: &Path) -> Option<&NavLink>;
}

/// Byte-lexicographic order. A strict prefix sorts before the longer name.
pub fn lexical_cmp(a: &str, b: &str) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

impl Directory {
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(n, node)| (n.as_str(), node))
    }

    /// Sub-directories and files, each sorted by [`lexical_cmp`].
    pub fn sorted(&self) -> (Vec<(&str, &Directory)>, Vec<(&str, &Path)>) {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for (name, node) in &self.children {
            match node {
                Node::Directory(d) => dirs.push((name.as_str(), d)),
                Node::File(p) => files.push((name.as_str(), p.as_path())),
            }
        }
        dirs.sort_by(|a, b| lexical_cmp(a.0, b.0));
        files.sort_by(|a, b| lexical_cmp(a.0, b.0));
        (dirs, files)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|(n, _)| n == name)
    }

    fn contains_file(&self, pred: &dyn Fn(&Path) -> bool) -> bool {
        self.children.iter().any(|(_, node)| match node {
            Node::Directory(d) => d.contains_file(pred),
            Node::File(p) => pred(p),
        })
    }
}

/// Folder/file tree rooted at the source directory.
#[derive(Debug, Clone)]
pub struct PathTree {
    root_path: PathBuf,
    root: Directory,
}

impl PathTree {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            root: Directory::default(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn root(&self) -> &Directory {
        &self.root
    }

    /// Insert an absolute path below the root.
    ///
    /// Every segment but the last becomes (or reuses) a directory; the last
    /// becomes a file leaf. Inserting the same path again changes nothing.
    pub fn insert(&mut self, path: &Path) -> Result<(), PathTreeError> {
        let relative = path
            .strip_prefix(&self.root_path)
            .map_err(|_| PathTreeError::OutsideRoot(path.to_path_buf(), self.root_path.clone()))?;
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let Some((file_name, parents)) = segments.split_last() else {
            return Err(PathTreeError::Empty(path.to_path_buf()));
        };

        let mut dir = &mut self.root;
        for segment in parents {
            let idx = match dir.index_of(segment) {
                Some(i) => i,
                None => {
                    dir.children
                        .push((segment.clone(), Node::Directory(Directory::default())));
                    dir.children.len() - 1
                }
            };
            dir = match &mut dir.children[idx].1 {
                Node::Directory(d) => d,
                Node::File(_) => {
                    return Err(PathTreeError::Conflict(path.to_path_buf(), segment.clone()));
                }
            };
        }

        match dir.get(file_name) {
            Some(Node::File(_)) => Ok(()),
            Some(Node::Directory(_)) => {
                Err(PathTreeError::Conflict(path.to_path_buf(), file_name.clone()))
            }
            None => {
                dir.children
                    .push((file_name.clone(), Node::File(path.to_path_buf())));
                Ok(())
            }
        }
    }

    /// All files in display order: sub-directories first (recursively), then
    /// the files of each level, each group sorted lexicographically.
    pub fn files(&self) -> Vec<&Path> {
        let mut out = Vec::new();
        collect_files(&self.root, &mut out);
        out
    }

    /// Render the navigation menu.
    ///
    /// When `current` is the web path of a listed file, that entry is marked
    /// as the current page and the folders containing it start open.
    pub fn render(&self, resolver: &dyn NavResolver, current: Option<&str>, webroot: &str) -> Markup {
        html! {
            nav.file-tree {
                (render_directory(&self.root, resolver, current, webroot))
            }
        }
    }
}

fn collect_files<'a>(dir: &'a Directory, out: &mut Vec<&'a Path>) {
    let (dirs, files) = dir.sorted();
    for (_, sub) in dirs {
        collect_files(sub, out);
    }
    out.extend(files.into_iter().map(|(_, p)| p));
}

fn render_directory(
    dir: &Directory,
    resolver: &dyn NavResolver,
    current: Option<&str>,
    webroot: &str,
) -> Markup {
    let (dirs, files) = dir.sorted();
    let is_current = |path: &Path| {
        current.is_some_and(|c| resolver.nav_link(path).is_some_and(|l| l.web_path == c))
    };

    html! {
        ul {
            @for (name, sub) in &dirs {
                li.folder {
                    details open[sub.contains_file(&is_current)] {
                        summary { (safe(name)) }
                        (render_directory(sub, resolver, current, webroot))
                    }
                }
            }
            @for (_, path) in &files {
                @if let Some(link) = resolver.nav_link(path) {
                    @let here = current == Some(link.web_path.as_str());
                    @let href = escape_html(&format!("{}{}", webroot, link.web_path));
                    li.file {
                        a href=(PreEscaped(href))
                            class=[here.then_some("current")]
                            aria-current=[here.then_some("page")] {
                            (safe(&link.title))
                        }
                    }
                }
            }
        }
    }
}
