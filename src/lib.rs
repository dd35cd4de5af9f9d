//! # Notegarden
//!
//! A static site generator for a folder of linked notes. Markdown files and
//! JSON canvas boards become HTML pages; `[[wiki links]]`, `#tags` and
//! embedded images are resolved against everything else in the folder.
//!
//! # Architecture: Three Barriers
//!
//! ```text
//! 1. Discover   notes/  →  Site + pages     (walk, path tree, title index)
//! 2. Process    page by page                (pre → main → post)
//! 3. End        all pages known             (end processors, tags, feed, assets)
//! ```
//!
//! Each barrier completes for every page before the next one starts. Cross
//! references resolve against the read-only [`site::Site`] built in the
//! first barrier; aggregate content (tag listings, recent pages) needs the
//! metadata of every page and therefore waits for the third.
//!
//! Inside a page, text passes through ordered groups of
//! [`pipeline::Processor`]s. A processor is a regex plus a transform: the
//! [`scanner`] finds non-overlapping matches and [`rewrite`] splices the
//! transformed text back in place, copying everything between matches
//! unchanged.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Barrier 1: walks the content directory into a [`scan::Discovery`] |
//! | [`build`] | Barriers 2 and 3, progress events, the build summary |
//! | [`pipeline`] | Processor trait, the three processor groups, per-page stages |
//! | [`processors`] | Front matter, headings, wiki links, tags, anchors, external links, recent pages |
//! | [`scanner`] | Non-overlapping regex match iteration |
//! | [`rewrite`] | Splice transformed matches into an output buffer |
//! | [`page`] | Page record and its build state machine |
//! | [`site`] | Path tree, title index, asset list, link resolution |
//! | [`path_tree`] | Directory tree of pages, rendered as navigation |
//! | [`markdown`] | Markdown to HTML with pulldown-cmark, plain-text previews |
//! | [`canvas`] | JSON canvas parsing and positioned-node rendering |
//! | [`render`] | Maud page skeleton and page renderers |
//! | [`tags`] | Tag pages and tag index |
//! | [`feed`] | RSS feed of recent pages |
//! | [`config`] | `config.toml` loading, validation, merging, color CSS |
//! | [`naming`] | Titles, slugs, web paths from file names |
//! | [`escape`] | HTML escaping of user text |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/). Malformed markup
//! is a compile error and there is no template directory to ship. User text
//! is escaped through [`escape::safe`], which also escapes backslashes.
//!
//! ## The Filesystem Is the Database
//!
//! Folder structure is the navigation, file names are titles, and the
//! creation time of a file orders the recent pages list. There is no
//! separate index to keep in sync.

pub mod build;
pub mod canvas;
pub mod config;
pub mod escape;
pub mod feed;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod page;
pub mod path_tree;
pub mod pipeline;
pub mod processors;
pub mod render;
pub mod rewrite;
pub mod scan;
pub mod scanner;
pub mod site;
pub mod tags;

#[cfg(test)]
pub(crate) mod test_helpers;
