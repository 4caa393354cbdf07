//! Resolution of change details into the nodes that caused them.
//!
//! See the change set samples in the CloudFormation user guide for how the
//! details of a resource change are meant to be read.

use crate::changeset::{ChangeSource, ResourceChange, ResourceChangeDetail};
use crate::error::Result;
use crate::graph::{NodeId, NodeShape, RankDir};
use crate::nodes::{DIRECT_MODIFICATION_NODE, PARAMETERS_NODE, ResourceNodeFactory};
use std::collections::HashMap;
use tracing::debug;

/// One cause of a resource change, to be turned into an edge.
#[derive(Debug, Clone)]
pub struct ChangeCause {
    pub node: NodeId,
    /// Port on `node` the edge starts from.
    pub port: Option<String>,
    pub detail: ResourceChangeDetail,
}

#[derive(Debug)]
pub struct ChangeCauseResolver {
    rank_dir: RankDir,
    parameters: HashMap<NodeId, Vec<String>>,
}

impl ChangeCauseResolver {
    pub fn new(rank_dir: RankDir) -> Self {
        Self {
            rank_dir,
            parameters: HashMap::new(),
        }
    }

    pub fn resolve(
        &mut self,
        nodes: &mut ResourceNodeFactory,
        stack_name: &str,
        change: &ResourceChange,
    ) -> Result<Vec<ChangeCause>> {
        let mut causes = Vec::new();

        for detail in &change.details {
            if is_superseded(detail, &change.details) {
                continue;
            }

            let causing_entity = detail.causing_entity();
            let cause = match &detail.change_source {
                Some(ChangeSource::DirectModification) => {
                    let node =
                        nodes.make_or_find_node(stack_name, DIRECT_MODIFICATION_NODE, |node| {
                            node.attrs.set_label(DIRECT_MODIFICATION_NODE);
                            node.attrs.set_shape(NodeShape::Plain);
                        })?;
                    Some((node, None))
                }
                Some(ChangeSource::ParameterReference) => {
                    let node = self.add_parameter(nodes, stack_name, causing_entity)?;
                    Some((node, Some(causing_entity.to_string())))
                }
                Some(ChangeSource::ResourceReference) => {
                    let node = nodes.make_or_find_resource_node(stack_name, causing_entity)?;
                    Some((node, None))
                }
                Some(ChangeSource::ResourceAttribute) => {
                    // "LogicalId.Attribute", or "LogicalId.Outputs.Name" for nested stacks
                    let logical_id = causing_entity.split('.').next().unwrap_or_default();
                    let node = nodes.make_or_find_resource_node(stack_name, logical_id)?;
                    Some((node, None))
                }
                other => {
                    debug!(
                        resource = %change.logical_resource_id,
                        source = ?other,
                        "unrecognized change source"
                    );
                    None
                }
            };

            if let Some((node, port)) = cause {
                causes.push(ChangeCause {
                    node,
                    port,
                    detail: detail.clone(),
                });
            }
        }

        if causes.is_empty() {
            debug!(
                stack = %stack_name,
                resource = %change.logical_resource_id,
                "cannot find any understood change cause"
            );
        }
        Ok(causes)
    }

    /// Add `parameter` as a field of the stack's Parameters record.
    fn add_parameter(
        &mut self,
        nodes: &mut ResourceNodeFactory,
        stack_name: &str,
        parameter: &str,
    ) -> Result<NodeId> {
        let node = nodes.make_or_find_node(stack_name, PARAMETERS_NODE, |node| {
            // Label is built as parameters get referenced
            node.attrs.set_label("");
            node.attrs.set_shape(NodeShape::Record);
        })?;

        let fields = self.parameters.entry(node).or_default();
        if !fields.iter().any(|field| field == parameter) {
            fields.push(parameter.to_string());
        }
        let label = record_label(fields, self.rank_dir);
        let color = nodes.palette().used_parameter.clone();
        let attrs = &mut nodes.model_mut().node_mut(node).attrs;
        attrs.set_label(label);
        attrs.set_color(color);
        Ok(node)
    }

    #[cfg(test)]
    pub(crate) fn parameter_fields(&self, node: NodeId) -> &[String] {
        self.parameters.get(&node).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Changes to parameters show up as a dynamic detail without causing entity
/// plus a static detail for the same target; only the static one is useful.
fn is_superseded(detail: &ResourceChangeDetail, details: &[ResourceChangeDetail]) -> bool {
    if !detail.causing_entity().is_empty() || !detail.is_dynamic() {
        return false;
    }
    details
        .iter()
        .any(|other| other.is_static() && other.target.same_target(&detail.target))
}

/// Record label with one port per field.
///
/// Records flip their field direction with the rank direction, so the fields
/// are wrapped once more for horizontal layouts to keep them in a row.
pub fn record_label(fields: &[String], rank_dir: RankDir) -> String {
    let body = fields
        .iter()
        .map(|field| {
            let field = escape_record_field(field);
            format!("<{field}>{field}")
        })
        .collect::<Vec<_>>()
        .join("|");
    if rank_dir.is_horizontal() {
        format!("{{{body}}}")
    } else {
        body
    }
}

fn escape_record_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for ch in field.chars() {
        if matches!(ch, '{' | '}' | '|' | '<' | '>') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
