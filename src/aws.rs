//! Live change set descriptions through the AWS SDK.

use crate::changeset::{
    Change, ChangeAction, ChangeSet, ChangeSource, ChangeType, Evaluation, Replacement,
    ResourceAttribute, ResourceChange, ResourceChangeDetail, ResourceTargetDefinition,
};
use crate::error::{Error, Result};
use crate::provider::ChangeSetProvider;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::operation::describe_change_set::{
    DescribeChangeSetError, DescribeChangeSetOutput,
};
use aws_sdk_cloudformation::types;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Fetches change sets with `DescribeChangeSet`, following `NextToken`
/// until all changes are collected.
///
/// The SDK is async; calls are driven to completion on a private
/// current-thread runtime.
#[derive(Debug)]
pub struct CloudFormationProvider {
    runtime: Runtime,
    client: Client,
}

impl CloudFormationProvider {
    /// Client from the default credential chain, optionally pinned to a
    /// region and a named profile.
    pub fn new(region: Option<String>, profile: Option<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = runtime.block_on(loader.load());

        Ok(Self {
            runtime,
            client: Client::new(&config),
        })
    }

    async fn describe(&self, change_set: &str, stack_name: Option<&str>) -> Result<ChangeSet> {
        let mut result = self.fetch_page(change_set, stack_name, None).await?;
        while let Some(token) = result.next_token.take() {
            debug!(change_set = %change_set, "fetching next page of changes");
            let page = self.fetch_page(change_set, stack_name, Some(token)).await?;
            result.changes.extend(page.changes);
            result.next_token = page.next_token;
        }
        Ok(result)
    }

    async fn fetch_page(
        &self,
        change_set: &str,
        stack_name: Option<&str>,
        next_token: Option<String>,
    ) -> Result<ChangeSet> {
        let output = self
            .client
            .describe_change_set()
            .change_set_name(change_set)
            .set_stack_name(stack_name.filter(|name| !name.is_empty()).map(str::to_string))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| fetch_error(change_set, err.into_service_error()))?;
        Ok(ChangeSet::from(&output))
    }
}

impl ChangeSetProvider for CloudFormationProvider {
    fn describe_change_set(&self, change_set: &str, stack_name: Option<&str>) -> Result<ChangeSet> {
        info!(change_set = %change_set, "fetching change set");
        self.runtime.block_on(self.describe(change_set, stack_name))
    }
}

fn fetch_error(change_set: &str, err: DescribeChangeSetError) -> Error {
    if err.is_change_set_not_found_exception() {
        return Error::ChangeSetNotFound(change_set.to_string());
    }
    let message = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (None, Some(message)) => message.to_string(),
        _ => DisplayErrorContext(&err).to_string(),
    };
    Error::Fetch {
        name: change_set.to_string(),
        message,
    }
}

impl From<&DescribeChangeSetOutput> for ChangeSet {
    fn from(output: &DescribeChangeSetOutput) -> Self {
        ChangeSet {
            stack_name: output.stack_name().unwrap_or_default().to_string(),
            stack_id: output.stack_id().map(str::to_string),
            change_set_name: output.change_set_name().map(str::to_string),
            change_set_id: output.change_set_id().map(str::to_string),
            description: output.description().map(str::to_string),
            status: output.status().map(|status| status.as_str().to_string()),
            execution_status: output
                .execution_status()
                .map(|status| status.as_str().to_string()),
            changes: output.changes().iter().map(change).collect(),
            next_token: output.next_token().map(str::to_string),
        }
    }
}

fn change(change: &types::Change) -> Change {
    Change {
        kind: ChangeType::from(change.r#type().map(|kind| kind.as_str()).unwrap_or_default()),
        resource_change: change.resource_change().map(resource_change),
    }
}

fn resource_change(change: &types::ResourceChange) -> ResourceChange {
    ResourceChange {
        action: ChangeAction::from(
            change.action().map(|action| action.as_str()).unwrap_or_default(),
        ),
        logical_resource_id: change.logical_resource_id().unwrap_or_default().to_string(),
        physical_resource_id: change.physical_resource_id().map(str::to_string),
        resource_type: change.resource_type().unwrap_or_default().to_string(),
        replacement: change
            .replacement()
            .map(|replacement| Replacement::from(replacement.as_str())),
        scope: change
            .scope()
            .iter()
            .map(|attribute| ResourceAttribute::from(attribute.as_str()))
            .collect(),
        details: change.details().iter().map(detail).collect(),
        change_set_id: change.change_set_id().map(str::to_string),
    }
}

fn detail(detail: &types::ResourceChangeDetail) -> ResourceChangeDetail {
    let target = detail.target();
    ResourceChangeDetail {
        target: ResourceTargetDefinition {
            attribute: ResourceAttribute::from(
                target
                    .and_then(|target| target.attribute())
                    .map(|attribute| attribute.as_str())
                    .unwrap_or_default(),
            ),
            name: target.and_then(|target| target.name()).map(str::to_string),
            requires_recreation: target
                .and_then(|target| target.requires_recreation())
                .map(|recreation| recreation.as_str().to_string()),
        },
        evaluation: detail
            .evaluation()
            .map(|evaluation| Evaluation::from(evaluation.as_str())),
        change_source: detail
            .change_source()
            .map(|source| ChangeSource::from(source.as_str())),
        causing_entity: detail.causing_entity().map(str::to_string),
    }
}
