//! Two-pass construction of the change graph for a stack and its nested
//! stacks.
//!
//! Pass one creates a node (or a cluster, for nested stacks) for every
//! change; pass two connects each change to its causes. Nested stacks are
//! expanded depth-first during pass one, so all nodes of a stack and its
//! descendants exist before any of its edges are built.

use crate::causes::{ChangeCause, ChangeCauseResolver};
use crate::changeset::{
    ChangeSet, ChangeType, Evaluation, ResourceAttribute, ResourceChange, ResourceTargetDefinition,
};
use crate::error::Result;
use crate::graph::{Attributes, GraphModel, RankDir, Style};
use crate::nodes::{ResourceAnchor, ResourceNodeFactory};
use crate::provider::ChangeSetProvider;
use crate::theme::Palette;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub palette: Palette,
    pub rank_dir: RankDir,
}

pub struct StackGraphBuilder<'p, P: ChangeSetProvider + ?Sized> {
    pub(crate) provider: &'p P,
    pub(crate) nodes: ResourceNodeFactory,
    resolver: ChangeCauseResolver,
}

impl<'p, P: ChangeSetProvider + ?Sized> StackGraphBuilder<'p, P> {
    /// Fetch the root change set and build the graph for it.
    pub fn build(
        provider: &'p P,
        stack_name: Option<&str>,
        change_set: &str,
        options: BuildOptions,
    ) -> Result<GraphModel> {
        let root = provider.describe_change_set(change_set, stack_name)?;
        Self::build_from(provider, &root, options)
    }

    /// Build the graph for an already fetched root change set. The provider
    /// is only used for nested stacks.
    pub fn build_from(
        provider: &'p P,
        root: &ChangeSet,
        options: BuildOptions,
    ) -> Result<GraphModel> {
        let name = root.change_set_name.as_deref().unwrap_or(&root.stack_name);
        let mut model = GraphModel::new(name);
        // Logical heads and tails need compound edges
        model.root_attrs_mut().set_compound(true);
        model.root_attrs_mut().set_rank_dir(options.rank_dir);

        let mut builder = Self {
            provider,
            nodes: ResourceNodeFactory::new(model, &root.stack_name, options.palette),
            resolver: ChangeCauseResolver::new(options.rank_dir),
        };
        builder.populate(root)?;
        Ok(builder.nodes.into_model())
    }

    pub(crate) fn populate(&mut self, change_set: &ChangeSet) -> Result<()> {
        let stack_name = change_set.stack_name.as_str();
        let mut pending: Vec<&ResourceChange> = Vec::new();

        for (idx, change) in change_set.changes.iter().enumerate() {
            let Some(resource) = &change.resource_change else {
                let node = self.nodes.make_or_find_node(stack_name, &format!("#{idx}"), |_| {})?;
                ResourceAnchor::Node(node).set_label(self.nodes.model_mut(), change.kind.as_str());
                continue;
            };

            let anchor = if resource.is_nested_stack() {
                self.expand_nested_stack(stack_name, resource)?
            } else {
                ResourceAnchor::Node(
                    self.nodes
                        .make_or_find_resource_node(stack_name, &resource.logical_resource_id)?,
                )
            };

            if change.kind != ChangeType::Resource {
                // Nothing known about these beyond their type
                anchor.set_label(self.nodes.model_mut(), change.kind.as_str());
                continue;
            }

            self.nodes.apply_resource_encoding(anchor, resource);
            if !resource.details.is_empty() {
                pending.push(resource);
            }
        }

        for resource in pending {
            self.connect_causes(stack_name, resource)?;
        }
        Ok(())
    }

    fn connect_causes(&mut self, stack_name: &str, change: &ResourceChange) -> Result<()> {
        let causes = self.resolver.resolve(&mut self.nodes, stack_name, change)?;
        let changed = self.nodes.find_node(stack_name, &change.logical_resource_id)?;
        let graph = self.nodes.stack_graph(stack_name)?;
        let model = self.nodes.model_mut();

        for cause in causes {
            let name = cause
                .detail
                .change_source
                .as_ref()
                .map(|source| source.as_str())
                .unwrap_or_default();
            info!(
                edge = %name,
                from = %model.node(cause.node).id,
                to = %model.node(changed).id,
                "creating edge"
            );
            let edge = model.create_edge(graph, name, cause.node, changed)?;
            configure_edge(&mut model.edge_mut(edge).attrs, &cause);

            if let Some(cluster) = model.node(cause.node).proxy_for {
                let cluster = model.subgraph(cluster).dot_name();
                model.edge_mut(edge).attrs.set_logical_tail(cluster);
            }
            if let Some(cluster) = model.node(changed).proxy_for {
                let cluster = model.subgraph(cluster).dot_name();
                model.edge_mut(edge).attrs.set_logical_head(cluster);
            }
        }
        Ok(())
    }
}

fn configure_edge(attrs: &mut Attributes, cause: &ChangeCause) {
    if let Some(port) = &cause.port {
        attrs.set_tail_port(port.clone());
    }
    match cause.detail.evaluation {
        Some(Evaluation::Static) => {
            attrs.set_style(Style::Solid);
            attrs.set_tooltip("Static evaluation");
        }
        Some(Evaluation::Dynamic) => {
            attrs.set_style(Style::Dashed);
            attrs.set_tooltip("Dynamic evaluation");
        }
        _ => {}
    }
    if let Some(label) = head_label(&cause.detail.target) {
        attrs.set_head_label(label);
    }
}

/// Label for the changed end of an edge: the property name, or the attribute
/// for anything but properties.
///
/// Nested stack parameters all target the `Parameters` property, which only
/// repeats what the Parameters node already shows.
pub fn head_label(target: &ResourceTargetDefinition) -> Option<String> {
    match &target.attribute {
        ResourceAttribute::Properties if target.name() != "Parameters" => {
            Some(target.name().to_string())
        }
        ResourceAttribute::Properties => None,
        attribute => Some(attribute.to_string()),
    }
}
