//! The page pipeline: four ordered passes over every page.
//!
//! ```text
//! Unbuilt ── run_pre_processors ──▶ Pre(scratch)     source → scratch file
//!         ── run_main_render ─────▶ Main             scratch → <output>/<page>.html
//!         ── run_post_processors ─▶ Post             html rewritten in place
//!         ── run_end_processors ──▶ (Post)           after every page is Post
//! ```
//!
//! Each pass except the main render runs a group of [`Processor`]s through
//! [`rewrite`](crate::rewrite::rewrite). Processors in a group run in the
//! order they were added, each one over the output of the previous.
//!
//! Every pass checks the page state first. Running a pass out of order is a
//! [`PipelineError::Sequencing`] error and leaves the page untouched.
//!
//! Canvas pages go through the same passes. Their pre-processors run on the
//! text of each text node rather than on the raw JSON.

use crate::build::Aggregate;
use crate::canvas::{self, CanvasDoc};
use crate::markdown;
use crate::page::{Page, PageKind, PageState, SequenceError, Stage};
use crate::processors;
use crate::render;
use crate::rewrite::rewrite;
use crate::scanner::{Match, MatchError};
use crate::site::Site;
use regex::bytes::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Length of the plain-text preview kept for the feed and recent lists.
pub const PREVIEW_CHARS: usize = 280;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Sequencing error: {0}")]
    Sequencing(#[from] SequenceError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Match error: {0}")]
    Match(#[from] MatchError),
    #[error("Canvas JSON error: {0}")]
    Canvas(#[from] serde_json::Error),
    #[error("Front matter error: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
    #[error("{page}: unresolved link [[{target}]]")]
    UnresolvedLink { page: String, target: String },
    #[error("{}: not valid UTF-8", .0.display())]
    Encoding(PathBuf),
}

/// What a processor may see and change while rewriting one page.
pub struct ProcessContext<'a> {
    pub site: &'a Site,
    pub page: &'a mut Page,
    /// Tag map and recent list. Only present during the end pass.
    pub aggregate: Option<&'a Aggregate>,
}

/// A compiled pattern plus the transform applied to each of its matches.
pub trait Processor {
    fn name(&self) -> &'static str;

    fn pattern(&self) -> &Regex;

    /// Write the replacement for `m` into `out`.
    ///
    /// `buffer` is the whole buffer being rewritten; match offsets are
    /// absolute within it.
    fn transform(
        &self,
        cx: &mut ProcessContext<'_>,
        buffer: &[u8],
        m: &Match,
        out: &mut Vec<u8>,
    ) -> Result<(), PipelineError>;
}

pub struct Pipeline {
    pre: Vec<Box<dyn Processor>>,
    post: Vec<Box<dyn Processor>>,
    end: Vec<Box<dyn Processor>>,
    scratch: PathBuf,
    output_dir: PathBuf,
}

impl Pipeline {
    /// A pipeline with no processors. The scratch file lives in `temp_dir`.
    pub fn new(output_dir: &Path, temp_dir: &Path) -> Self {
        Self {
            pre: Vec::new(),
            post: Vec::new(),
            end: Vec::new(),
            scratch: temp_dir.join("scratch"),
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// A pipeline with the built-in processors.
    pub fn standard(output_dir: &Path, temp_dir: &Path) -> Self {
        let mut pipeline = Self::new(output_dir, temp_dir);
        pipeline
            .pre(processors::FrontMatter)
            .pre(processors::Headings)
            .pre(processors::WikiLinks)
            .pre(processors::Tags)
            .post(processors::HeadingAnchors)
            .post(processors::ExternalLinks)
            .end(processors::RecentPages);
        pipeline
    }

    pub fn pre(&mut self, processor: impl Processor + 'static) -> &mut Self {
        self.pre.push(Box::new(processor));
        self
    }

    pub fn post(&mut self, processor: impl Processor + 'static) -> &mut Self {
        self.post.push(Box::new(processor));
        self
    }

    pub fn end(&mut self, processor: impl Processor + 'static) -> &mut Self {
        self.end.push(Box::new(processor));
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Processor names per group, in run order.
    pub fn processor_names(&self) -> [(&'static str, Vec<&'static str>); 3] {
        let names = |group: &[Box<dyn Processor>]| -> Vec<&'static str> {
            group.iter().map(|p| p.name()).collect()
        };
        [
            ("pre", names(&self.pre)),
            ("post", names(&self.post)),
            ("end", names(&self.end)),
        ]
    }

    /// Copy the source to the scratch file and rewrite it there.
    pub fn run_pre_processors(&self, site: &Site, page: &mut Page) -> Result<(), PipelineError> {
        page.require(Stage::Unbuilt)?;

        if let Some(parent) = self.scratch.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&page.path, &self.scratch)?;
        let source = fs::read(&self.scratch)?;
        let path = page.path.clone();
        let kind = page.kind;

        let mut cx = ProcessContext {
            site,
            page: &mut *page,
            aggregate: None,
        };
        let rewritten = match kind {
            PageKind::Markdown => apply(&self.pre, &mut cx, source)?,
            PageKind::Canvas => {
                let source = String::from_utf8(source)
                    .map_err(|_| PipelineError::Encoding(path.clone()))?;
                let mut doc = CanvasDoc::parse(&source)?;
                doc.map_text(|text| {
                    let out = apply(&self.pre, &mut cx, text.as_bytes().to_vec())?;
                    String::from_utf8(out).map_err(|_| PipelineError::Encoding(path.clone()))
                })?;
                doc.to_json()?.into_bytes()
            }
        };

        fs::write(&self.scratch, rewritten)?;
        page.advance(Stage::Unbuilt, PageState::Pre(self.scratch.clone()))?;
        Ok(())
    }

    /// Render the scratch content into the page's public HTML file.
    pub fn run_main_render(&self, site: &Site, page: &mut Page) -> Result<(), PipelineError> {
        let scratch = page.scratch()?.to_path_buf();
        let source = fs::read(&scratch)?;
        let source =
            String::from_utf8(source).map_err(|_| PipelineError::Encoding(page.path.clone()))?;

        let document = match page.kind {
            PageKind::Markdown => {
                page.preview = markdown::preview_text(&source, PREVIEW_CHARS);
                let body = markdown::to_html(&source);
                render::markdown_page(site, page, &body)
            }
            PageKind::Canvas => {
                let doc = CanvasDoc::parse(&source)?;
                page.preview = markdown::preview_text(&doc.plain_text(), PREVIEW_CHARS);
                render::canvas_page(site, page, canvas::render(&doc, site)?)
            }
        };

        let out = page.output_path(&self.output_dir);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out, document.into_string())?;
        page.advance(Stage::Pre, PageState::Main)?;
        Ok(())
    }

    /// Rewrite the rendered HTML file in place.
    pub fn run_post_processors(&self, site: &Site, page: &mut Page) -> Result<(), PipelineError> {
        page.require(Stage::Main)?;
        self.rewrite_output(&self.post, site, page, None)?;
        page.advance(Stage::Main, PageState::Post)?;
        Ok(())
    }

    /// Rewrite the rendered HTML file with the build-wide aggregates at hand.
    ///
    /// Only valid once every page of the build reached `Post`; the page
    /// state is left as is.
    pub fn run_end_processors(
        &self,
        site: &Site,
        aggregate: &Aggregate,
        page: &mut Page,
    ) -> Result<(), PipelineError> {
        page.require(Stage::Post)?;
        self.rewrite_output(&self.end, site, page, Some(aggregate))
    }

    fn rewrite_output(
        &self,
        group: &[Box<dyn Processor>],
        site: &Site,
        page: &mut Page,
        aggregate: Option<&Aggregate>,
    ) -> Result<(), PipelineError> {
        if group.is_empty() {
            return Ok(());
        }
        let out = page.output_path(&self.output_dir);
        let html = fs::read(&out)?;
        let mut cx = ProcessContext {
            site,
            page: &mut *page,
            aggregate,
        };
        let rewritten = apply(group, &mut cx, html)?;
        fs::write(&out, rewritten)?;
        Ok(())
    }
}

/// Run each processor of `group` over the output of the previous one.
fn apply(
    group: &[Box<dyn Processor>],
    cx: &mut ProcessContext<'_>,
    mut buffer: Vec<u8>,
) -> Result<Vec<u8>, PipelineError> {
    for processor in group {
        buffer = rewrite(processor.pattern(), &buffer, |buf, m, out| {
            processor.transform(cx, buf, m, out)
        })?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::sync::LazyLock;
    use tempfile::TempDir;

    /// Replaces every match with a fixed string.
    struct Replace(&'static str, &'static LazyLock<Regex>);

    impl Processor for Replace {
        fn name(&self) -> &'static str {
            "replace"
        }
        fn pattern(&self) -> &Regex {
            self.1
        }
        fn transform(
            &self,
            _cx: &mut ProcessContext<'_>,
            _buffer: &[u8],
            _m: &Match,
            out: &mut Vec<u8>,
        ) -> Result<(), PipelineError> {
            out.extend_from_slice(self.0.as_bytes());
            Ok(())
        }
    }

    static FOO: LazyLock<Regex> = LazyLock::new(|| Regex::new("foo").unwrap());
    static BAR: LazyLock<Regex> = LazyLock::new(|| Regex::new("bar").unwrap());
    static BODY: LazyLock<Regex> = LazyLock::new(|| Regex::new("<body>").unwrap());

    fn setup(files: &[(&str, &str)]) -> (TempDir, TempDir, crate::scan::Discovery) {
        let (src, discovery) = discover(files);
        let out = TempDir::new().unwrap();
        (src, out, discovery)
    }

    #[test]
    fn main_render_on_unbuilt_is_sequencing_error() {
        let (_src, out, mut d) = setup(&[("a.md", "hello")]);
        let pipeline = Pipeline::new(out.path(), &out.path().join("tmp"));

        let err = pipeline.run_main_render(&d.site, &mut d.pages[0]).unwrap_err();
        assert!(matches!(err, PipelineError::Sequencing(_)));
        assert_eq!(d.pages[0].state(), &PageState::Unbuilt);
    }

    #[test]
    fn post_requires_main() {
        let (_src, out, mut d) = setup(&[("a.md", "hello")]);
        let pipeline = Pipeline::new(out.path(), &out.path().join("tmp"));
        let page = &mut d.pages[0];

        pipeline.run_pre_processors(&d.site, page).unwrap();
        let err = pipeline.run_post_processors(&d.site, page).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Sequencing(SequenceError {
                expected: Stage::Main,
                found: Stage::Pre,
                ..
            })
        ));
    }

    #[test]
    fn pre_processors_cannot_run_twice() {
        let (_src, out, mut d) = setup(&[("a.md", "hello")]);
        let pipeline = Pipeline::new(out.path(), &out.path().join("tmp"));
        let page = &mut d.pages[0];

        pipeline.run_pre_processors(&d.site, page).unwrap();
        assert!(pipeline.run_pre_processors(&d.site, page).is_err());
    }

    #[test]
    fn end_requires_post() {
        let (_src, out, mut d) = setup(&[("a.md", "hello")]);
        let pipeline = Pipeline::new(out.path(), &out.path().join("tmp"));
        let aggregate = Aggregate::collect(&d.pages);
        let page = &mut d.pages[0];

        pipeline.run_pre_processors(&d.site, page).unwrap();
        pipeline.run_main_render(&d.site, page).unwrap();
        assert!(pipeline.run_end_processors(&d.site, &aggregate, page).is_err());
        pipeline.run_post_processors(&d.site, page).unwrap();
        pipeline.run_end_processors(&d.site, &aggregate, page).unwrap();
        assert_eq!(page.state(), &PageState::Post);
    }

    #[test]
    fn pre_processors_run_in_order_on_scratch() {
        let (_src, out, mut d) = setup(&[("a.md", "foo")]);
        let mut pipeline = Pipeline::new(out.path(), &out.path().join("tmp"));
        // foo -> bar, then bar -> baz; reversed order would leave "bar"
        pipeline.pre(Replace("bar", &FOO)).pre(Replace("baz", &BAR));
        let page = &mut d.pages[0];

        pipeline.run_pre_processors(&d.site, page).unwrap();
        let scratch = page.scratch().unwrap().to_path_buf();
        assert_eq!(scratch, out.path().join("tmp/scratch"));
        assert_eq!(fs::read_to_string(scratch).unwrap(), "baz");
    }

    #[test]
    fn source_file_is_not_modified() {
        let (src, out, mut d) = setup(&[("a.md", "foo")]);
        let mut pipeline = Pipeline::new(out.path(), &out.path().join("tmp"));
        pipeline.pre(Replace("bar", &FOO));

        pipeline.run_pre_processors(&d.site, &mut d.pages[0]).unwrap();
        assert_eq!(fs::read_to_string(src.path().join("a.md")).unwrap(), "foo");
    }

    #[test]
    fn main_render_writes_mirrored_output() {
        let (_src, out, mut d) = setup(&[("notes/a.md", "Some *text*")]);
        let pipeline = Pipeline::new(out.path(), &out.path().join("tmp"));
        let page = &mut d.pages[0];

        pipeline.run_pre_processors(&d.site, page).unwrap();
        pipeline.run_main_render(&d.site, page).unwrap();

        let html = read_output(out.path(), "notes/a.html");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert_contains(&html, "<em>text</em>");
        assert_eq!(page.preview, "Some text");
        assert_eq!(page.state(), &PageState::Main);
    }

    #[test]
    fn post_processors_rewrite_output_in_place() {
        let (_src, out, mut d) = setup(&[("a.md", "x")]);
        let mut pipeline = Pipeline::new(out.path(), &out.path().join("tmp"));
        pipeline.post(Replace("<body data-post>", &BODY));
        let page = &mut d.pages[0];

        pipeline.run_pre_processors(&d.site, page).unwrap();
        pipeline.run_main_render(&d.site, page).unwrap();
        pipeline.run_post_processors(&d.site, page).unwrap();

        assert_contains(&read_output(out.path(), "a.html"), "<body data-post>");
    }

    #[test]
    fn canvas_pre_processors_see_node_text_only() {
        let canvas = r#"{"nodes":[{"id":"foo","x":0,"y":0,"width":1,"height":1,"text":"foo"}],"edges":[]}"#;
        let (_src, out, mut d) = setup(&[("board.canvas", canvas)]);
        let mut pipeline = Pipeline::new(out.path(), &out.path().join("tmp"));
        pipeline.pre(Replace("bar", &FOO));
        let page = &mut d.pages[0];

        pipeline.run_pre_processors(&d.site, page).unwrap();
        let doc = CanvasDoc::parse(&fs::read_to_string(page.scratch().unwrap()).unwrap()).unwrap();
        assert_eq!(doc.nodes[0].id, "foo");
        assert_eq!(doc.nodes[0].text, "bar");

        pipeline.run_main_render(&d.site, page).unwrap();
        assert_contains(&read_output(out.path(), "board.html"), r#"data-node="foo""#);
    }

    #[test]
    fn malformed_canvas_is_error() {
        let (_src, out, mut d) = setup(&[("board.canvas", "{not json")]);
        let pipeline = Pipeline::new(out.path(), &out.path().join("tmp"));
        let err = pipeline
            .run_pre_processors(&d.site, &mut d.pages[0])
            .unwrap_err();
        assert!(matches!(err, PipelineError::Canvas(_)));
    }

    #[test]
    fn standard_pipeline_names() {
        let out = TempDir::new().unwrap();
        let pipeline = Pipeline::standard(out.path(), out.path());
        let [(_, pre), (_, post), (_, end)] = pipeline.processor_names();
        assert_eq!(pre, vec!["front-matter", "headings", "wiki-links", "tags"]);
        assert_eq!(post, vec!["heading-anchors", "external-links"]);
        assert_eq!(end, vec!["recent-pages"]);
    }
}
