//! vis-network graph of collaborations: one node per person, one edge per shared song.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::popup::{edge_popup, media_tag, node_label};
use super::{script_json, write_html};
use crate::config::Paths;
use crate::data::dataset::State;
use crate::data::table::Table;
use crate::error::{Error, Result};
use crate::media::audio::PROCESSED_STATE;
use crate::media::{MediaKind, MediaRef};

pub const DEFAULT_NODE_COLOR: &str = "white";
pub const EDGE_VALUE: u32 = 4;

/// Same color on both ends keeps it for the edge; mixed ends fall back to white.
pub fn get_edge_color(source_color: &str, target_color: &str) -> String {
    if source_color == target_color {
        source_color.to_string()
    } else {
        DEFAULT_NODE_COLOR.to_string()
    }
}

/// Edge table columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkColumns {
    pub source: String,
    pub target: String,
    pub edge_title: String,
    pub edge_subtitle: String,
}

impl Default for NetworkColumns {
    fn default() -> Self {
        NetworkColumns {
            source: "artist_start".to_string(),
            target: "artist_end".to_string(),
            edge_title: "value".to_string(),
            edge_subtitle: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkOptions {
    pub height: String,
    pub width: String,
    pub bg_color: String,
    pub font_color: String,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        NetworkOptions {
            height: "750px".to_string(),
            width: "100%".to_string(),
            bg_color: "#222222".to_string(),
            font_color: "white".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub title: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub title: String,
    pub value: u32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub options: NetworkOptions,
}

pub struct NetworkVisualizer<'a> {
    data: &'a Table,
    columns: NetworkColumns,
    paths: &'a Paths,
    node_titles: HashMap<String, String>,
    node_categories: HashMap<String, String>,
    category_colors: HashMap<String, String>,
    edge_audio_category: Option<String>,
    options: NetworkOptions,
    network: Option<NetworkModel>,
}

impl<'a> NetworkVisualizer<'a> {
    pub fn new(data: &'a Table, columns: NetworkColumns, paths: &'a Paths) -> NetworkVisualizer<'a> {
        NetworkVisualizer {
            data,
            columns,
            paths,
            node_titles: HashMap::new(),
            node_categories: HashMap::new(),
            category_colors: HashMap::new(),
            edge_audio_category: None,
            options: NetworkOptions::default(),
            network: None,
        }
    }

    /// node id → displayed name
    pub fn with_node_titles(mut self, titles: HashMap<String, String>) -> Self {
        self.node_titles = titles;
        self
    }

    /// node id → category
    pub fn with_node_categories(mut self, categories: HashMap<String, String>) -> Self {
        self.node_categories = categories;
        self
    }

    /// category → css color
    pub fn with_category_colors(mut self, colors: HashMap<String, String>) -> Self {
        self.category_colors = colors;
        self
    }

    /// Processed audio category searched for a file named after the edge title.
    pub fn with_edge_audio_category(mut self, category: impl Into<String>) -> Self {
        self.edge_audio_category = Some(category.into());
        self
    }

    pub fn with_options(mut self, options: NetworkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn network(&self) -> Option<&NetworkModel> {
        self.network.as_ref()
    }

    fn node_color(&self, id: &str) -> String {
        self.node_categories
            .get(id)
            .and_then(|category| self.category_colors.get(category))
            .cloned()
            .unwrap_or_else(|| DEFAULT_NODE_COLOR.to_string())
    }

    fn node_name(&self, id: &str) -> String {
        self.node_titles
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn edge_audio(&self, title: &str) -> Result<String> {
        let Some(category) = self.edge_audio_category.as_deref() else {
            return Ok(String::new());
        };
        if title.is_empty() {
            return Ok(String::new());
        }
        let audio = MediaRef::discover(
            MediaKind::Audio,
            title,
            Some(category),
            State::named(PROCESSED_STATE),
            self.paths,
        )?;
        media_tag(audio.as_ref())
    }

    pub fn create_net_viz(&mut self) -> Result<&NetworkModel> {
        let source_idx = self.data.require_column(&self.columns.source)?;
        let target_idx = self.data.require_column(&self.columns.target)?;
        let title_idx = self.data.require_column(&self.columns.edge_title)?;
        let subtitle_idx = self.data.require_column(&self.columns.edge_subtitle)?;

        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut seen = HashSet::new();
        for row in self.data.rows() {
            let source_id = row[source_idx].to_string();
            let target_id = row[target_idx].to_string();
            let source_color = self.node_color(&source_id);
            let target_color = self.node_color(&target_id);
            let source = self.node_name(&source_id);
            let target = self.node_name(&target_id);

            for (label, color) in [(&source, &source_color), (&target, &target_color)] {
                if seen.insert(label.clone()) {
                    nodes.push(Node {
                        id: label.clone(),
                        label: label.clone(),
                        title: node_label(label),
                        color: color.clone(),
                    });
                }
            }

            let title = row[title_idx].to_string();
            let subtitle = row[subtitle_idx].to_string();
            edges.push(Edge {
                color: get_edge_color(&source_color, &target_color),
                from: source,
                to: target,
                title: edge_popup(&title, &subtitle, &self.edge_audio(&title)?),
                value: EDGE_VALUE,
            });
        }

        info!(nodes = nodes.len(), edges = edges.len(), "network created");
        Ok(self.network.insert(NetworkModel {
            nodes,
            edges,
            options: self.options.clone(),
        }))
    }

    pub fn render_html(&self) -> Result<String> {
        let network = self.network.as_ref().ok_or(Error::InvalidState {
            operation: "render a network before create_net_viz",
            state: State::Unset,
        })?;
        Ok(NETWORK_TEMPLATE
            .replace("__HEIGHT__", &network.options.height)
            .replace("__WIDTH__", &network.options.width)
            .replace("__BG_COLOR__", &network.options.bg_color)
            .replace("__NETWORK_PAYLOAD__", &script_json(network)?))
    }

    /// Write the graph page to `path`.
    pub fn show(&self, path: &Path) -> Result<PathBuf> {
        write_html(path, &self.render_html()?)
    }
}

const NETWORK_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<script src="https://unpkg.com/vis-network@9.1.9/standalone/umd/vis-network.min.js"></script>
<style>
  #network { width: __WIDTH__; height: __HEIGHT__; background-color: __BG_COLOR__; border: 1px solid lightgray; position: relative; }
</style>
</head>
<body>
<div id="network"></div>
<script>
  const payload = __NETWORK_PAYLOAD__;
  function htmlTitle(html) {
    const frame = document.createElement("iframe");
    frame.srcdoc = html;
    frame.style.border = "none";
    return frame;
  }
  const nodes = new vis.DataSet(payload.nodes.map(function (node) {
    return Object.assign({}, node, { title: htmlTitle(node.title), shape: "dot" });
  }));
  const edges = new vis.DataSet(payload.edges.map(function (edge) {
    return Object.assign({}, edge, { title: htmlTitle(edge.title) });
  }));
  const options = {
    nodes: { font: { color: payload.options.font_color } },
    edges: { smooth: false },
    physics: {
      solver: "barnesHut",
      barnesHut: {
        gravitationalConstant: -80000,
        centralGravity: 0.3,
        springLength: 250,
        springConstant: 0.001,
        damping: 0.09,
        avoidOverlap: 0
      }
    }
  };
  new vis.Network(document.getElementById("network"), { nodes: nodes, edges: edges }, options);
</script>
</body>
</html>
"#;
