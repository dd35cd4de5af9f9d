//! The page entity and its build state machine.
//!
//! A [`Page`] is created for every `.md` or `.canvas` file found during
//! discovery. Its state only ever moves forward:
//!
//! ```text
//! Unbuilt ──pre──▶ Pre(scratch) ──main──▶ Main ──post──▶ Post
//! ```
//!
//! The end pass runs on `Post` pages but is not recorded as a state.
//! Every transition names the state it expects; a mismatch is a
//! [`SequenceError`], never a silent skip.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Source format of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Markdown,
    Canvas,
}

impl PageKind {
    /// Page kind for a file extension, or `None` for non-page files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "md" => Some(Self::Markdown),
            "canvas" => Some(Self::Canvas),
            _ => None,
        }
    }
}

/// Where a page is in the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Unbuilt,
    /// Pre-processing done; the rewritten source sits in the scratch file.
    Pre(PathBuf),
    Main,
    Post,
}

/// State without its payload, for precondition checks and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unbuilt,
    Pre,
    Main,
    Post,
}

impl PageState {
    pub fn stage(&self) -> Stage {
        match self {
            PageState::Unbuilt => Stage::Unbuilt,
            PageState::Pre(_) => Stage::Pre,
            PageState::Main => Stage::Main,
            PageState::Post => Stage::Post,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unbuilt => "unbuilt",
            Stage::Pre => "pre-processed",
            Stage::Main => "rendered",
            Stage::Post => "post-processed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: pass expects a {expected} page, found {found}", .path.display())]
pub struct SequenceError {
    pub path: PathBuf,
    pub expected: Stage,
    pub found: Stage,
}

/// A heading collected for the in-page heading index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

#[derive(Debug, Clone)]
pub struct Page {
    /// Absolute source path; the page's identity.
    pub path: PathBuf,
    /// Source path relative to the content root.
    pub relative: PathBuf,
    /// File stem, or the front-matter title once pre-processing has run.
    pub title: String,
    pub kind: PageKind,
    pub created: SystemTime,
    pub tags: Vec<String>,
    pub headings: Vec<Heading>,
    /// Web path (relative to the webroot) of the first embedded image.
    pub first_image: Option<String>,
    /// Path of the rendered page relative to the webroot.
    pub web_path: String,
    /// Plain-text excerpt used by the feed and the recent pages list.
    pub preview: String,
    state: PageState,
}

impl Page {
    pub fn new(
        path: PathBuf,
        relative: PathBuf,
        kind: PageKind,
        created: SystemTime,
    ) -> Self {
        Self {
            title: crate::naming::title_from_path(&relative),
            web_path: crate::naming::web_path(&relative),
            path,
            relative,
            kind,
            created,
            tags: Vec::new(),
            headings: Vec::new(),
            first_image: None,
            preview: String::new(),
            state: PageState::Unbuilt,
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Fail unless the page is at `stage`.
    pub fn require(&self, stage: Stage) -> Result<(), SequenceError> {
        let found = self.state.stage();
        if found == stage {
            Ok(())
        } else {
            Err(SequenceError {
                path: self.path.clone(),
                expected: stage,
                found,
            })
        }
    }

    /// Scratch file holding the pre-processed source. Requires `Pre`.
    pub fn scratch(&self) -> Result<&Path, SequenceError> {
        match &self.state {
            PageState::Pre(scratch) => Ok(scratch),
            other => Err(SequenceError {
                path: self.path.clone(),
                expected: Stage::Pre,
                found: other.stage(),
            }),
        }
    }

    /// Move to `next`, provided the page is currently at `from`.
    pub fn advance(&mut self, from: Stage, next: PageState) -> Result<(), SequenceError> {
        self.require(from)?;
        self.state = next;
        Ok(())
    }

    /// Record a tag once, keeping discovery order.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Where the rendered page is written below the output directory.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.relative.with_extension("html"))
    }
}
