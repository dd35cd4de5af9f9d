//! Canvas documents: JSON node/edge graphs rendered as positioned HTML.
//!
//! A `.canvas` file is a JSON object with a node list and an edge list:
//!
//! ```json
//! {
//!   "nodes": [
//!     {"id": "a", "x": 0, "y": 0, "width": 250, "height": 60, "type": "text", "text": "# Idea"},
//!     {"id": "b", "x": 0, "y": 200, "width": 250, "height": 60, "type": "file", "file": "Notes/Plan.md"}
//!   ],
//!   "edges": [{"id": "e", "fromNode": "a", "toNode": "b"}]
//! }
//! ```
//!
//! Every node becomes an absolutely positioned element inside the canvas
//! container, shifted so the top-left node sits at the origin. Edges are not
//! drawn server-side: the edge list is embedded as JSON and
//! `static/canvas.js` draws them between the rendered node boxes.

use crate::escape::safe;
use crate::markdown;
use crate::naming;
use crate::site::{Resolved, Site};
use maud::{Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Id of the `<script>` element carrying the edge list.
pub const EDGES_ELEMENT_ID: &str = "canvas-edges";

/// Space kept around the outermost nodes, in pixels.
const PADDING: f64 = 40.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasDoc {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// `text`, `file`, `link` or `group`.
    #[serde(rename = "type", default = "default_node_type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    /// Preset number (`"1"`..`"6"`) or a `#rrggbb` color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Content-root relative path of a `file` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Address of a `link` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Caption of a `group` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    pub from_node: String,
    #[serde(default = "default_from_side")]
    pub from_side: String,
    #[serde(default = "default_from_end")]
    pub from_end: String,
    pub to_node: String,
    #[serde(default = "default_to_side")]
    pub to_side: String,
    #[serde(default = "default_to_end")]
    pub to_end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn default_node_type() -> String {
    "text".to_string()
}
fn default_from_side() -> String {
    "bottom".to_string()
}
fn default_from_end() -> String {
    "none".to_string()
}
fn default_to_side() -> String {
    "top".to_string()
}
fn default_to_end() -> String {
    "arrow".to_string()
}

impl CanvasDoc {
    pub fn parse(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Replace the text of every text node with `f(text)`.
    pub fn map_text<F, E>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&str) -> Result<String, E>,
    {
        for node in self.nodes.iter_mut().filter(|n| n.kind == "text") {
            node.text = f(&node.text)?;
        }
        Ok(())
    }

    /// All node text joined, used for the page preview.
    pub fn plain_text(&self) -> String {
        self.nodes
            .iter()
            .map(|n| n.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Top-left corner and size of the box enclosing every node.
    fn bounds(&self) -> (f64, f64, f64, f64) {
        if self.nodes.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }
        let min_x = self.nodes.iter().map(|n| n.x).fold(f64::INFINITY, f64::min);
        let min_y = self.nodes.iter().map(|n| n.y).fold(f64::INFINITY, f64::min);
        let max_x = self
            .nodes
            .iter()
            .map(|n| n.x + n.width)
            .fold(f64::NEG_INFINITY, f64::max);
        let max_y = self
            .nodes
            .iter()
            .map(|n| n.y + n.height)
            .fold(f64::NEG_INFINITY, f64::max);
        (min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Edge list as JSON safe to embed inside a `<script>` element.
pub fn edges_json(edges: &[CanvasEdge]) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(edges)?.replace("</", "<\\/"))
}

/// Render the canvas body: positioned nodes plus the embedded edge list.
pub fn render(doc: &CanvasDoc, site: &Site) -> Result<Markup, serde_json::Error> {
    let (min_x, min_y, width, height) = doc.bounds();
    let edges = edges_json(&doc.edges)?;
    let container = format!(
        "width:{}px;height:{}px",
        width + 2.0 * PADDING,
        height + 2.0 * PADDING
    );

    Ok(html! {
        div.canvas style=(container) {
            // groups first so they sit underneath their members
            @for node in doc.nodes.iter().filter(|n| n.kind == "group") {
                (render_node(node, site, min_x, min_y))
            }
            @for node in doc.nodes.iter().filter(|n| n.kind != "group") {
                (render_node(node, site, min_x, min_y))
            }
        }
        script type="application/json" id=(EDGES_ELEMENT_ID) { (PreEscaped(edges)) }
        script src=(site.href("static/canvas.js")) defer {}
    })
}

fn render_node(node: &CanvasNode, site: &Site, min_x: f64, min_y: f64) -> Markup {
    let mut style = format!(
        "left:{}px;top:{}px;width:{}px;height:{}px",
        node.x - min_x + PADDING,
        node.y - min_y + PADDING,
        node.width,
        node.height
    );
    let mut preset = None;
    if let Some(color) = &node.color {
        if color.starts_with('#') {
            style.push_str(&format!(";--node-color:{color}"));
        } else {
            preset = Some(color.as_str());
        }
    }
    let class = format!("canvas-node canvas-{}", node.kind);

    html! {
        div class=(class) id=(format!("node-{}", node.id)) data-node=(node.id)
            data-color=[preset] style=(style) {
            (node_content(node, site))
        }
    }
}

fn node_content(node: &CanvasNode, site: &Site) -> Markup {
    match node.kind.as_str() {
        "file" => file_content(node.file.as_deref().unwrap_or_default(), site),
        "link" => {
            let url = node.url.as_deref().unwrap_or_default();
            html! { a.external-link href=(url) { (url) } }
        }
        "group" => html! {
            @if let Some(label) = &node.label {
                div.canvas-group-label { (safe(label)) }
            }
        },
        _ => html! { (PreEscaped(markdown::to_html(&node.text))) },
    }
}

fn file_content(file: &str, site: &Site) -> Markup {
    let path = Path::new(file);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match site.lookup(&name) {
        Some(Resolved::Asset(web_path)) if naming::is_image(path) => html! {
            img src=(site.href(&web_path)) alt=(name) loading="lazy";
        },
        Some(Resolved::Asset(web_path)) => html! {
            a.internal-link href=(site.href(&web_path)) { (safe(&name)) }
        },
        Some(Resolved::Page(link)) => html! {
            a.internal-link href=(site.href(&link.web_path)) { (safe(&link.title)) }
        },
        None => html! { span.broken-link { (safe(file)) } },
    }
}
