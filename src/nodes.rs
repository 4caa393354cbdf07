use crate::changeset::{ChangeAction, Replacement, ResourceChange};
use crate::error::{Error, Result};
use crate::graph::{Attributes, GraphId, GraphModel, Node, NodeId, NodeShape, Style};
use crate::theme::Palette;
use std::collections::HashMap;
use tracing::{info, warn};

/// Synthetic node collecting all parameters referenced in a stack.
pub const PARAMETERS_NODE: &str = "Parameters";
/// Synthetic node standing in for a nested stack's own subgraph.
pub const STACK_ROOT_NODE: &str = "_";
pub const DIRECT_MODIFICATION_NODE: &str = "Direct modification";

pub fn node_id(stack_name: &str, name: &str) -> String {
    format!("{stack_name}.{name}")
}

/// The visual anchor of a resource change: a plain node, or the cluster of
/// a nested stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAnchor {
    Node(NodeId),
    Cluster(GraphId),
}

impl ResourceAnchor {
    fn attrs_mut(self, model: &mut GraphModel) -> &mut Attributes {
        match self {
            Self::Node(id) => &mut model.node_mut(id).attrs,
            Self::Cluster(id) => &mut model.subgraph_mut(id).attrs,
        }
    }

    pub fn set_label(self, model: &mut GraphModel, label: impl Into<String>) {
        self.attrs_mut(model).set_label(label);
    }

    pub fn set_colors(self, model: &mut GraphModel, border: &str, fill: Option<&str>) {
        self.attrs_mut(model).set_colors(border, fill);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    pub prefix: &'static str,
    pub border: Option<String>,
    pub fill: Option<String>,
}

/// Border, fill and label prefix for a resource change.
pub fn encoding(
    action: &ChangeAction,
    replacement: Option<&Replacement>,
    palette: &Palette,
) -> Encoding {
    let fill = match replacement {
        Some(Replacement::True) => Some(palette.replaced_fill.clone()),
        Some(Replacement::Conditional) => Some(palette.maybe_replaced_fill.clone()),
        _ => None,
    };
    let (prefix, border, fill) = match action {
        ChangeAction::Add => ("+", Some(&palette.added), fill),
        ChangeAction::Remove => ("-", Some(&palette.removed), Some(palette.removed_fill.clone())),
        ChangeAction::Modify => ("~", Some(&palette.modified), fill),
        ChangeAction::Import => ("*", Some(&palette.imported), fill),
        ChangeAction::Dynamic => ("?", Some(&palette.dynamic), fill),
        ChangeAction::Other(_) => ("", None, None),
    };
    Encoding {
        prefix,
        border: border.cloned(),
        fill,
    }
}

pub fn resource_label(prefix: &str, logical_id: &str, resource_type: &str) -> String {
    format!("{prefix} {logical_id}\n{resource_type}")
}

fn configure_resource_node(node: &mut Node) {
    node.attrs.set_shape(NodeShape::Box);
}

/// Creates and looks up the nodes and stack subgraphs of one build.
///
/// Both indices are flat: stacks by name, nodes by `stack.logicalId`. A
/// nested stack's proxy node is registered under two ids.
#[derive(Debug)]
pub struct ResourceNodeFactory {
    model: GraphModel,
    palette: Palette,
    stacks: HashMap<String, GraphId>,
    nodes: HashMap<String, NodeId>,
}

impl ResourceNodeFactory {
    pub fn new(model: GraphModel, root_stack: &str, palette: Palette) -> Self {
        let mut stacks = HashMap::new();
        stacks.insert(root_stack.to_string(), model.root());
        Self {
            model,
            palette,
            stacks,
            nodes: HashMap::new(),
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut GraphModel {
        &mut self.model
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn into_model(self) -> GraphModel {
        self.model
    }

    /// Subgraph for a nested stack, as a cluster inside its parent's graph.
    pub fn make_stack(
        &mut self,
        parent_stack: &str,
        stack_name: &str,
        name: &str,
    ) -> Result<GraphId> {
        if self.stacks.contains_key(stack_name) {
            return Err(Error::DuplicateStackGraph(stack_name.to_string()));
        }
        let parent = *self
            .stacks
            .get(parent_stack)
            .ok_or_else(|| Error::ParentStackNotFound(parent_stack.to_string()))?;
        let graph = self.model.create_subgraph(parent, stack_name, true)?;
        self.model
            .subgraph_mut(graph)
            .attrs
            .set_label(format!("{name}\n{stack_name}"));
        self.stacks.insert(stack_name.to_string(), graph);
        Ok(graph)
    }

    pub fn stack_graph(&self, stack_name: &str) -> Result<GraphId> {
        self.stacks
            .get(stack_name)
            .copied()
            .ok_or_else(|| Error::StackGraphNotFound(stack_name.to_string()))
    }

    pub fn find_node(&self, stack_name: &str, name: &str) -> Result<NodeId> {
        let id = node_id(stack_name, name);
        self.nodes.get(&id).copied().ok_or(Error::NodeNotFound(id))
    }

    pub fn make_or_find_node(
        &mut self,
        stack_name: &str,
        name: &str,
        configure: impl FnOnce(&mut Node),
    ) -> Result<NodeId> {
        let id = node_id(stack_name, name);
        if let Some(node) = self.nodes.get(&id) {
            return Ok(*node);
        }

        info!(node = %id, "creating node");
        let graph = self.stack_graph(stack_name)?;
        let node = self.model.create_node(graph, &id)?;
        configure(self.model.node_mut(node));
        self.nodes.insert(id, node);
        Ok(node)
    }

    pub fn make_or_find_resource_node(
        &mut self,
        stack_name: &str,
        logical_id: &str,
    ) -> Result<NodeId> {
        self.make_or_find_node(stack_name, logical_id, configure_resource_node)
    }

    /// Invisible node inside a nested stack's cluster; edges to it are
    /// clipped at the cluster boundary.
    pub fn make_stack_proxy(&mut self, stack_name: &str) -> Result<NodeId> {
        let graph = self.stack_graph(stack_name)?;
        let node = self.make_or_find_node(stack_name, STACK_ROOT_NODE, |node| {
            node.proxy_for = Some(graph);
        })?;
        let attrs = &mut self.model.node_mut(node).attrs;
        attrs.set_shape(NodeShape::Plain);
        attrs.set_label("");
        attrs.set_style(Style::Invisible);
        Ok(node)
    }

    /// Make `node` reachable as `stack_name.name` as well.
    pub fn alias_node(&mut self, stack_name: &str, name: &str, node: NodeId) {
        let id = node_id(stack_name, name);
        if let Some(existing) = self.nodes.get(&id).copied() {
            if existing != node {
                // Nodes cannot be removed from the model, hide it instead.
                warn!(node = %id, "found existing node, hiding it");
                self.model.node_mut(existing).attrs.set_style(Style::Invisible);
            }
        }
        self.nodes.insert(id, node);
    }

    pub fn apply_resource_encoding(&mut self, anchor: ResourceAnchor, change: &ResourceChange) {
        let encoding = encoding(&change.action, change.replacement.as_ref(), &self.palette);
        if let Some(border) = &encoding.border {
            anchor.set_colors(&mut self.model, border, encoding.fill.as_deref());
        }
        anchor.set_label(
            &mut self.model,
            resource_label(encoding.prefix, &change.logical_resource_id, &change.resource_type),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> ResourceNodeFactory {
        ResourceNodeFactory::new(GraphModel::new("cs"), "app", Palette::paired())
    }

    #[test]
    fn encoding_table() {
        let palette = Palette::paired();
        let add = encoding(&ChangeAction::Add, None, &palette);
        assert_eq!(add.prefix, "+");
        assert_eq!(add.border.as_deref(), Some("/paired10/4"));
        assert_eq!(add.fill, None);

        let replaced = encoding(&ChangeAction::Modify, Some(&Replacement::True), &palette);
        assert_eq!(replaced.prefix, "~");
        assert_eq!(replaced.fill.as_deref(), Some("/paired10/2"));

        let maybe = encoding(&ChangeAction::Import, Some(&Replacement::Conditional), &palette);
        assert_eq!(maybe.prefix, "*");
        assert_eq!(maybe.fill.as_deref(), Some("/paired10/1"));

        let dynamic = encoding(&ChangeAction::Dynamic, Some(&Replacement::False), &palette);
        assert_eq!(dynamic.prefix, "?");
        assert_eq!(dynamic.fill, None);
    }

    #[test]
    fn removal_always_uses_removed_fill() {
        let palette = Palette::paired();
        for replacement in [None, Some(Replacement::True), Some(Replacement::False)] {
            let remove = encoding(&ChangeAction::Remove, replacement.as_ref(), &palette);
            assert_eq!(remove.prefix, "-");
            assert_eq!(remove.fill.as_deref(), Some("/paired10/5"));
        }
    }

    #[test]
    fn repeated_lookups_return_the_same_node() {
        let mut factory = factory();
        let a = factory.make_or_find_resource_node("app", "Bucket").unwrap();
        let b = factory.make_or_find_resource_node("app", "Bucket").unwrap();
        assert_eq!(a, b);
        assert_eq!(factory.find_node("app", "Bucket").unwrap(), a);
        assert_eq!(factory.model().node(a).attrs.get("shape"), Some("box"));
        assert_eq!(factory.model().node_count(), 1);
    }

    #[test]
    fn unknown_stacks_and_nodes_are_errors() {
        let mut factory = factory();
        assert!(matches!(
            factory.make_or_find_resource_node("other", "Bucket"),
            Err(Error::StackGraphNotFound(_))
        ));
        assert!(matches!(factory.find_node("app", "Missing"), Err(Error::NodeNotFound(_))));
        assert!(matches!(
            factory.make_stack("nowhere", "child", "Child"),
            Err(Error::ParentStackNotFound(_))
        ));
    }

    #[test]
    fn stacks_are_created_once() {
        let mut factory = factory();
        let graph = factory.make_stack("app", "app-Child", "Child").unwrap();
        assert_eq!(factory.model().subgraph(graph).attrs.label(), Some("Child\napp-Child"));
        assert!(matches!(
            factory.make_stack("app", "app-Child", "Child"),
            Err(Error::DuplicateStackGraph(_))
        ));
    }

    #[test]
    fn stack_proxies_are_invisible() {
        let mut factory = factory();
        let graph = factory.make_stack("app", "app-Child", "Child").unwrap();
        let proxy = factory.make_stack_proxy("app-Child").unwrap();
        let node = factory.model().node(proxy);
        assert_eq!(node.proxy_for, Some(graph));
        assert_eq!(node.attrs.get("style"), Some("invis"));
        assert_eq!(node.attrs.label(), Some(""));
    }

    #[test]
    fn aliasing_hides_a_colliding_node() {
        let mut factory = factory();
        factory.make_stack("app", "app-Child", "Child").unwrap();
        let stale = factory.make_or_find_resource_node("app", "Child").unwrap();
        let proxy = factory.make_stack_proxy("app-Child").unwrap();
        factory.alias_node("app", "Child", proxy);
        assert_eq!(factory.find_node("app", "Child").unwrap(), proxy);
        assert_eq!(factory.model().node(stale).attrs.get("style"), Some("invis"));
    }

    #[test]
    fn cluster_anchor_takes_the_resource_encoding() {
        let mut factory = factory();
        let graph = factory.make_stack("app", "app-Child", "Child").unwrap();
        let change: ResourceChange = serde_json::from_str(
            r#"{"Action": "Modify", "LogicalResourceId": "Child", "ResourceType": "AWS::CloudFormation::Stack", "Replacement": "False"}"#,
        )
        .unwrap();
        factory.apply_resource_encoding(ResourceAnchor::Cluster(graph), &change);
        let attrs = &factory.model().subgraph(graph).attrs;
        assert_eq!(attrs.label(), Some("~ Child\nAWS::CloudFormation::Stack"));
        assert_eq!(attrs.get("color"), Some("/paired10/2"));
        assert_eq!(attrs.get("style"), None);
    }
}
