use crate::arn;
use crate::builder::StackGraphBuilder;
use crate::changeset::{ChangeSet, ResourceChange};
use crate::error::Result;
use crate::nodes::ResourceAnchor;
use crate::provider::ChangeSetProvider;
use tracing::info;

impl<P: ChangeSetProvider + ?Sized> StackGraphBuilder<'_, P> {
    /// Expand a nested stack change into its own cluster.
    ///
    /// The nested stack's changes are populated into the cluster, and an
    /// invisible proxy node inside it takes over the resource's logical id in
    /// the parent stack, so that edges from and to the resource end at the
    /// cluster boundary.
    pub(crate) fn expand_nested_stack(
        &mut self,
        stack_name: &str,
        change: &ResourceChange,
    ) -> Result<ResourceAnchor> {
        info!(
            action = %change.action,
            stack = %stack_name,
            resource = %change.logical_resource_id,
            "processing nested stack"
        );

        let (nested_stack, nested_change_set) = self.nested_stack_source(change)?;
        let graph = self
            .nodes
            .make_stack(stack_name, &nested_stack, &change.logical_resource_id)?;

        if let Some(nested_change_set) = &nested_change_set {
            self.populate(nested_change_set)?;
        }

        let proxy = self.nodes.make_stack_proxy(&nested_stack)?;
        self.nodes
            .alias_node(stack_name, &change.logical_resource_id, proxy);
        Ok(ResourceAnchor::Cluster(graph))
    }

    /// Name of the nested stack, plus its change set when it has one.
    fn nested_stack_source(&self, change: &ResourceChange) -> Result<(String, Option<ChangeSet>)> {
        if let Some(change_set_id) = &change.change_set_id {
            // The nested change set also reveals the actual stack name
            let mut nested = self.provider.describe_change_set(change_set_id, None)?;
            if nested.stack_name.is_empty() {
                nested.stack_name = physical_stack_name(change)?;
            }
            return Ok((nested.stack_name.clone(), Some(nested)));
        }
        Ok((physical_stack_name(change)?, None))
    }
}

fn physical_stack_name(change: &ResourceChange) -> Result<String> {
    arn::stack_name(change.physical_resource_id.as_deref().unwrap_or_default())
}
