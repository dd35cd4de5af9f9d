//! The whole build, as three barriers.
//!
//! ```text
//! 1. Discover   notes/ → Site + pages          (scan)
//! 2. Process    each page: pre → main → post   (one page at a time)
//! 3. End        aggregates → end pass on every page,
//!               tag pages, feed, assets, static files
//! ```
//!
//! No page enters barrier 3 before every page has finished barrier 2: the
//! tag map and the recent list are built from the complete page set in
//! [`Aggregate::collect`]. Any error aborts the build; there is no partial
//! success.
//!
//! Progress is reported as [`BuildEvent`]s over an optional channel, the
//! CLI prints them with [`crate::output::format_build_event`].

use crate::config;
use crate::feed::{self, FeedError};
use crate::page::{Page, PageKind};
use crate::pipeline::{Pipeline, PipelineError};
use crate::scan::{self, Discovery, ScanError};
use crate::site::{ASSET_DIR, Site};
use crate::tags;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::SystemTime;
use thiserror::Error;

const CSS_STATIC: &str = include_str!("../static/style.css");
const CANVAS_JS: &str = include_str!("../static/canvas.js");

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("{}: {source}", .path.display())]
    Page {
        path: PathBuf,
        #[source]
        source: PipelineError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Progress of a build.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    Discovered {
        pages: usize,
        assets: usize,
    },
    PageBuilt {
        index: usize,
        total: usize,
        relative: PathBuf,
        title: String,
        kind: PageKind,
        tags: usize,
    },
    EndPass {
        pages: usize,
    },
    TagPages {
        tags: usize,
    },
    Feed {
        items: usize,
    },
    AssetsCopied {
        count: usize,
    },
}

/// A page in the recent list.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentEntry {
    pub title: String,
    pub web_path: String,
    pub created: SystemTime,
    pub preview: String,
}

/// Pages carrying one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagEntry {
    /// Tag as first written.
    pub name: String,
    /// Indices into the page list, in page order.
    pub pages: Vec<usize>,
}

/// Build-wide data only known once every page is processed.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    /// Keyed by tag slug, so `#Rust` and `#rust` share a page.
    pub tags: BTreeMap<String, TagEntry>,
    /// Every page, newest first.
    pub recent: Vec<RecentEntry>,
}

impl Aggregate {
    pub fn collect(pages: &[Page]) -> Self {
        let mut tags: BTreeMap<String, TagEntry> = BTreeMap::new();
        for (index, page) in pages.iter().enumerate() {
            for tag in &page.tags {
                let entry = tags.entry(tags::tag_slug(tag)).or_insert_with(|| TagEntry {
                    name: tag.clone(),
                    pages: Vec::new(),
                });
                if entry.pages.last() != Some(&index) {
                    entry.pages.push(index);
                }
            }
        }

        let mut recent: Vec<RecentEntry> = pages
            .iter()
            .map(|p| RecentEntry {
                title: p.title.clone(),
                web_path: p.web_path.clone(),
                created: p.created,
                preview: p.preview.clone(),
            })
            .collect();
        recent.sort_by(|a, b| {
            b.created
                .cmp(&a.created)
                .then_with(|| a.web_path.cmp(&b.web_path))
        });

        Self { tags, recent }
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub pages: usize,
    pub assets: usize,
    pub tags: usize,
    /// Number of feed items, `None` when the feed is disabled.
    pub feed_items: Option<usize>,
}

fn emit(events: Option<&Sender<BuildEvent>>, event: BuildEvent) {
    if let Some(tx) = events {
        // a closed receiver only means nobody is listening
        tx.send(event).ok();
    }
}

/// Build the site in `source` into `output`.
///
/// `temp_dir` holds the scratch file. Both directories are left out of
/// discovery when they sit inside `source`.
pub fn build(
    source: &Path,
    output: &Path,
    temp_dir: &Path,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildSummary, BuildError> {
    fs::create_dir_all(output)?;
    fs::create_dir_all(temp_dir)?;

    let Discovery { site, mut pages } =
        scan::scan(source, &[output.to_path_buf(), temp_dir.to_path_buf()])?;
    emit(
        events.as_ref(),
        BuildEvent::Discovered {
            pages: pages.len(),
            assets: site.assets.len(),
        },
    );

    let pipeline = Pipeline::standard(output, temp_dir);
    build_pages(&site, &mut pages, &pipeline, events.as_ref())
}

/// Barriers 2 and 3 over discovered pages.
pub fn build_pages(
    site: &Site,
    pages: &mut [Page],
    pipeline: &Pipeline,
    events: Option<&Sender<BuildEvent>>,
) -> Result<BuildSummary, BuildError> {
    let output = pipeline.output_dir();
    let total = pages.len();

    for (index, page) in pages.iter_mut().enumerate() {
        process_page(pipeline, site, page).map_err(|source| BuildError::Page {
            path: page.path.clone(),
            source,
        })?;
        emit(
            events,
            BuildEvent::PageBuilt {
                index,
                total,
                relative: page.relative.clone(),
                title: page.title.clone(),
                kind: page.kind,
                tags: page.tags.len(),
            },
        );
    }

    let aggregate = Aggregate::collect(pages);
    for page in pages.iter_mut() {
        pipeline
            .run_end_processors(site, &aggregate, page)
            .map_err(|source| BuildError::Page {
                path: page.path.clone(),
                source,
            })?;
    }
    emit(events, BuildEvent::EndPass { pages: total });

    let tag_count = tags::write_tag_pages(site, &aggregate, pages, output)?;
    emit(events, BuildEvent::TagPages { tags: tag_count });

    let feed_items = if site.config.feed.enabled {
        let items = feed::write_feed(site, &aggregate, output)?;
        emit(events, BuildEvent::Feed { items });
        Some(items)
    } else {
        None
    };

    let assets = copy_assets(site, output)?;
    emit(events, BuildEvent::AssetsCopied { count: assets });
    write_static(site, output)?;

    Ok(BuildSummary {
        pages: total,
        assets,
        tags: tag_count,
        feed_items,
    })
}

fn process_page(pipeline: &Pipeline, site: &Site, page: &mut Page) -> Result<(), PipelineError> {
    pipeline.run_pre_processors(site, page)?;
    pipeline.run_main_render(site, page)?;
    pipeline.run_post_processors(site, page)
}

/// Copy assets to `<output>/images/<file name>`. When two assets share a
/// name the first one wins, matching the title index.
fn copy_assets(site: &Site, output: &Path) -> std::io::Result<usize> {
    let dir = output.join(ASSET_DIR);
    let mut seen = HashSet::new();
    for asset in &site.assets {
        let Some(name) = asset.file_name() else {
            continue;
        };
        if !seen.insert(name.to_os_string()) {
            continue;
        }
        fs::create_dir_all(&dir)?;
        fs::copy(asset, dir.join(name))?;
    }
    Ok(seen.len())
}

/// Write `static/style.css` (with the configured colors) and
/// `static/canvas.js`.
fn write_static(site: &Site, output: &Path) -> std::io::Result<()> {
    let dir = output.join("static");
    fs::create_dir_all(&dir)?;
    let css = format!(
        "{}\n\n{}",
        config::generate_color_css(&site.config.colors),
        CSS_STATIC
    );
    fs::write(dir.join("style.css"), css)?;
    fs::write(dir.join("canvas.js"), CANVAS_JS)?;
    Ok(())
}
