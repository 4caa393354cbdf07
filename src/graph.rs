//! Abstract directed graph with nested subgraphs.
//!
//! The model only records rendering directives (labels, shapes, colours,
//! styles, ports, logical heads and tails); layout is left to the renderer.
//! Nodes, edges and subgraphs live in arenas and are addressed by handles
//! minted by [`GraphModel`]. Nothing is ever removed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(usize);

impl GraphId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl EdgeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankDir {
    #[serde(rename = "TB")]
    TopBottom,
    #[default]
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "BT")]
    BottomTop,
    #[serde(rename = "RL")]
    RightLeft,
}

impl RankDir {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "TB" | "TD" => Some(Self::TopBottom),
            "LR" => Some(Self::LeftRight),
            "BT" => Some(Self::BottomTop),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopBottom => "TB",
            Self::LeftRight => "LR",
            Self::BottomTop => "BT",
            Self::RightLeft => "RL",
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Box,
    Record,
    Plain,
}

impl NodeShape {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Record => "record",
            Self::Plain => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Solid,
    Dashed,
    Filled,
    Invisible,
}

impl Style {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Dashed => "dashed",
            Self::Filled => "filled",
            Self::Invisible => "invis",
        }
    }
}

/// Key/value rendering directives attached to a graph, node or edge.
///
/// Keys are Graphviz attribute names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<&'static str, String>);

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn label(&self) -> Option<&str> {
        self.get("label")
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.set("label", label);
    }

    pub fn set_shape(&mut self, shape: NodeShape) {
        self.set("shape", shape.as_str());
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.set("color", color);
    }

    pub fn set_fill_color(&mut self, color: impl Into<String>) {
        self.set("fillcolor", color);
    }

    pub fn set_style(&mut self, style: Style) {
        self.set("style", style.as_str());
    }

    pub fn set_tooltip(&mut self, tooltip: impl Into<String>) {
        self.set("tooltip", tooltip);
    }

    pub fn set_head_label(&mut self, label: impl Into<String>) {
        self.set("headlabel", label);
    }

    /// Clip the edge head at the boundary of the named cluster.
    pub fn set_logical_head(&mut self, cluster: impl Into<String>) {
        self.set("lhead", cluster);
    }

    /// Clip the edge tail at the boundary of the named cluster.
    pub fn set_logical_tail(&mut self, cluster: impl Into<String>) {
        self.set("ltail", cluster);
    }

    pub fn set_tail_port(&mut self, port: impl Into<String>) {
        self.set("tailport", port);
    }

    pub fn set_rank_dir(&mut self, dir: RankDir) {
        self.set("rankdir", dir.as_str());
    }

    pub fn set_compound(&mut self, compound: bool) {
        self.set("compound", compound.to_string());
    }

    pub fn set_overlap(&mut self, overlap: impl Into<String>) {
        self.set("overlap", overlap);
    }

    /// Border and fill colour; a fill switches the element to filled style.
    pub fn set_colors(&mut self, border: &str, fill: Option<&str>) {
        self.set_color(border);
        if let Some(fill) = fill.filter(|fill| !fill.is_empty()) {
            self.set_fill_color(fill);
            self.set_style(Style::Filled);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Subgraph {
    pub name: String,
    pub parent: Option<GraphId>,
    pub cluster: bool,
    pub attrs: Attributes,
}

impl Subgraph {
    /// Name as the renderer sees it; clusters carry the `cluster_` prefix.
    pub fn dot_name(&self) -> String {
        if self.cluster && !self.name.starts_with("cluster_") {
            format!("cluster_{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub graph: GraphId,
    pub attrs: Attributes,
    /// Set when this node only stands in for a whole subgraph.
    pub proxy_for: Option<GraphId>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub name: String,
    pub graph: GraphId,
    pub from: NodeId,
    pub to: NodeId,
    pub attrs: Attributes,
}

#[derive(Debug, Clone)]
pub struct GraphModel {
    subgraphs: Vec<Subgraph>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_ids: HashMap<String, NodeId>,
    subgraph_names: HashMap<String, GraphId>,
}

impl GraphModel {
    pub fn new(name: &str) -> Self {
        let root = Subgraph {
            name: name.to_string(),
            parent: None,
            cluster: false,
            attrs: Attributes::default(),
        };
        Self {
            subgraphs: vec![root],
            nodes: Vec::new(),
            edges: Vec::new(),
            node_ids: HashMap::new(),
            subgraph_names: HashMap::new(),
        }
    }

    pub fn root(&self) -> GraphId {
        GraphId(0)
    }

    pub fn name(&self) -> &str {
        &self.subgraphs[0].name
    }

    pub fn create_subgraph(
        &mut self,
        parent: GraphId,
        name: &str,
        cluster: bool,
    ) -> Result<GraphId> {
        if parent.0 >= self.subgraphs.len() {
            return Err(Error::StackGraphNotFound(format!("#{}", parent.0)));
        }
        if self.subgraph_names.contains_key(name) {
            return Err(Error::DuplicateStackGraph(name.to_string()));
        }
        let id = GraphId(self.subgraphs.len());
        self.subgraphs.push(Subgraph {
            name: name.to_string(),
            parent: Some(parent),
            cluster,
            attrs: Attributes::default(),
        });
        self.subgraph_names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn create_node(&mut self, graph: GraphId, id: &str) -> Result<NodeId> {
        if graph.0 >= self.subgraphs.len() {
            return Err(Error::StackGraphNotFound(format!("#{}", graph.0)));
        }
        if self.node_ids.contains_key(id) {
            return Err(Error::DuplicateNode(id.to_string()));
        }
        let node = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id: id.to_string(),
            graph,
            attrs: Attributes::default(),
            proxy_for: None,
        });
        self.node_ids.insert(id.to_string(), node);
        Ok(node)
    }

    pub fn create_edge(
        &mut self,
        graph: GraphId,
        name: &str,
        from: NodeId,
        to: NodeId,
    ) -> Result<EdgeId> {
        if graph.0 >= self.subgraphs.len() {
            return Err(Error::StackGraphNotFound(format!("#{}", graph.0)));
        }
        for endpoint in [from, to] {
            if endpoint.0 >= self.nodes.len() {
                return Err(Error::NodeNotFound(format!("#{}", endpoint.0)));
            }
        }
        let edge = EdgeId(self.edges.len());
        self.edges.push(Edge {
            name: name.to_string(),
            graph,
            from,
            to,
            attrs: Attributes::default(),
        });
        Ok(edge)
    }

    pub fn find_node(&self, id: &str) -> Option<NodeId> {
        self.node_ids.get(id).copied()
    }

    pub fn subgraph(&self, id: GraphId) -> &Subgraph {
        &self.subgraphs[id.0]
    }

    pub fn subgraph_mut(&mut self, id: GraphId) -> &mut Subgraph {
        &mut self.subgraphs[id.0]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.0]
    }

    pub fn root_attrs_mut(&mut self) -> &mut Attributes {
        &mut self.subgraphs[0].attrs
    }

    pub fn subgraphs(&self) -> impl Iterator<Item = (GraphId, &Subgraph)> {
        self.subgraphs
            .iter()
            .enumerate()
            .map(|(idx, graph)| (GraphId(idx), graph))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().enumerate().map(|(idx, edge)| (EdgeId(idx), edge))
    }

    pub fn children(&self, graph: GraphId) -> impl Iterator<Item = GraphId> + '_ {
        self.subgraphs()
            .filter(move |(_, sub)| sub.parent == Some(graph))
            .map(|(id, _)| id)
    }

    pub fn nodes_in(&self, graph: GraphId) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes().filter(move |(_, node)| node.graph == graph)
    }

    pub fn edges_in(&self, graph: GraphId) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges().filter(move |(_, edge)| edge.graph == graph)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_are_unique_across_subgraphs() {
        let mut model = GraphModel::new("cs");
        let child = model.create_subgraph(model.root(), "child", true).unwrap();
        model.create_node(model.root(), "app.A").unwrap();
        let err = model.create_node(child, "app.A").unwrap_err();
        assert!(matches!(err, Error::DuplicateNode(_)));
        assert_eq!(model.find_node("app.A"), Some(NodeId(0)));
    }

    #[test]
    fn subgraph_names_are_unique() {
        let mut model = GraphModel::new("cs");
        model.create_subgraph(model.root(), "child", true).unwrap();
        let err = model.create_subgraph(model.root(), "child", true).unwrap_err();
        assert!(matches!(err, Error::DuplicateStackGraph(_)));
    }

    #[test]
    fn colors_only_fill_when_given() {
        let mut attrs = Attributes::default();
        attrs.set_colors("/paired10/2", None);
        assert_eq!(attrs.get("color"), Some("/paired10/2"));
        assert_eq!(attrs.get("style"), None);
        attrs.set_colors("/paired10/2", Some("/paired10/1"));
        assert_eq!(attrs.get("fillcolor"), Some("/paired10/1"));
        assert_eq!(attrs.get("style"), Some("filled"));
    }

    #[test]
    fn cluster_names_are_prefixed() {
        let mut model = GraphModel::new("cs");
        let child = model.create_subgraph(model.root(), "child", true).unwrap();
        let plain = model.create_subgraph(model.root(), "plain", false).unwrap();
        assert_eq!(model.subgraph(child).dot_name(), "cluster_child");
        assert_eq!(model.subgraph(plain).dot_name(), "plain");
        assert_eq!(model.children(model.root()).count(), 2);
    }

    #[test]
    fn rank_dir_tokens() {
        assert_eq!(RankDir::from_token("lr"), Some(RankDir::LeftRight));
        assert_eq!(RankDir::from_token("TD"), Some(RankDir::TopBottom));
        assert_eq!(RankDir::from_token("sideways"), None);
        assert!(RankDir::RightLeft.is_horizontal());
    }
}
