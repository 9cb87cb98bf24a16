//! CloudFormation stack management

use crate::aws::context::AwsContext;
use crate::aws::error::{AwsError, classify_sdk_error};
use anyhow::{Context, Result};
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::types::{Capability, Tag};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Snapshot of a deployed stack
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StackDescription {
    pub name: String,
    pub status: String,
    pub status_reason: Option<String>,
    pub outputs: BTreeMap<String, String>,
}

impl StackDescription {
    pub fn phase(&self) -> StackPhase {
        StackPhase::from_status(&self.status)
    }
}

/// Coarse lifecycle phase of a stack status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPhase {
    /// An operation is running (`*_IN_PROGRESS`)
    InProgress,
    /// Last operation succeeded and the stack is usable
    Complete,
    /// Last operation failed; an update rolled back to the previous template
    RolledBack,
    /// Stack is unusable and must be deleted before it can be recreated
    Failed,
    /// Stack was deleted
    Deleted,
}

impl StackPhase {
    pub fn from_status(status: &str) -> Self {
        match status {
            "DELETE_COMPLETE" => StackPhase::Deleted,
            "UPDATE_ROLLBACK_COMPLETE" => StackPhase::RolledBack,
            "ROLLBACK_COMPLETE" => StackPhase::Failed,
            s if s.ends_with("_IN_PROGRESS") => StackPhase::InProgress,
            s if s.ends_with("_FAILED") => StackPhase::Failed,
            s if s.ends_with("_COMPLETE") => StackPhase::Complete,
            _ => StackPhase::Failed,
        }
    }
}

/// Result of submitting a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackChange {
    Created,
    Updated,
    Unchanged,
}

/// CloudFormation client for face-auth stacks
pub struct CloudFormationClient {
    client: Client,
}

impl CloudFormationClient {
    /// Create a CloudFormation client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudformation_client(),
        }
    }

    /// Describe a stack, or `None` if it does not exist
    pub async fn describe_stack(&self, stack_name: &str) -> Result<Option<StackDescription>> {
        let response = match self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let classified = classify_sdk_error(&e);
                if classified.is_not_found() {
                    return Ok(None);
                }
                return Err(anyhow::Error::new(classified))
                    .with_context(|| format!("Failed to describe stack {}", stack_name));
            }
        };

        let Some(stack) = response.stacks().first() else {
            return Ok(None);
        };

        let outputs = stack
            .outputs()
            .iter()
            .filter_map(|o| Some((o.output_key()?.to_string(), o.output_value()?.to_string())))
            .collect();

        Ok(Some(StackDescription {
            name: stack.stack_name().unwrap_or(stack_name).to_string(),
            status: stack
                .stack_status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            status_reason: stack.stack_status_reason().map(|s| s.to_string()),
            outputs,
        }))
    }

    /// Create a stack from a template body, returning the stack id
    pub async fn create_stack(
        &self,
        stack_name: &str,
        template_body: &str,
        tags: &[(String, String)],
    ) -> Result<String> {
        info!(stack = %stack_name, "Creating stack");

        let mut request = self
            .client
            .create_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityIam);
        for (key, value) in tags {
            request = request.tags(Tag::builder().key(key).value(value).build());
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to create stack {}", stack_name))?;

        let stack_id = response.stack_id().unwrap_or(stack_name).to_string();
        debug!(stack = %stack_name, stack_id = %stack_id, "Stack creation started");
        Ok(stack_id)
    }

    /// Update a stack; returns `false` when the template is unchanged
    pub async fn update_stack(&self, stack_name: &str, template_body: &str) -> Result<bool> {
        info!(stack = %stack_name, "Updating stack");

        match self
            .client
            .update_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityIam)
            .send()
            .await
        {
            Ok(_) => {
                debug!(stack = %stack_name, "Stack update started");
                Ok(true)
            }
            Err(e) => match classify_sdk_error(&e) {
                AwsError::NoUpdates => {
                    info!(stack = %stack_name, "Stack is up to date");
                    Ok(false)
                }
                other => Err(anyhow::Error::new(other))
                    .with_context(|| format!("Failed to update stack {}", stack_name)),
            },
        }
    }

    /// Start deleting a stack
    pub async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        info!(stack = %stack_name, "Deleting stack");
        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to delete stack {}", stack_name))?;
        Ok(())
    }
}

/// Trait for CloudFormation operations that can be mocked in tests.
///
/// Tags are passed as owned pairs to work around mockall lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait StackOperations: Send + Sync {
    /// Describe a stack, or `None` if it does not exist
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StackDescription>>;

    /// Create a stack, returning its id
    async fn create_stack(
        &self,
        stack_name: &str,
        template_body: &str,
        tags: Vec<(String, String)>,
    ) -> Result<String>;

    /// Update a stack; `false` when nothing changed
    async fn update_stack(&self, stack_name: &str, template_body: &str) -> Result<bool>;

    /// Start deleting a stack
    async fn delete_stack(&self, stack_name: &str) -> Result<()>;
}

impl StackOperations for CloudFormationClient {
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StackDescription>> {
        CloudFormationClient::describe_stack(self, stack_name).await
    }

    async fn create_stack(
        &self,
        stack_name: &str,
        template_body: &str,
        tags: Vec<(String, String)>,
    ) -> Result<String> {
        CloudFormationClient::create_stack(self, stack_name, template_body, &tags).await
    }

    async fn update_stack(&self, stack_name: &str, template_body: &str) -> Result<bool> {
        CloudFormationClient::update_stack(self, stack_name, template_body).await
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        CloudFormationClient::delete_stack(self, stack_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_phases() {
        assert_eq!(StackPhase::from_status("CREATE_IN_PROGRESS"), StackPhase::InProgress);
        assert_eq!(
            StackPhase::from_status("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS"),
            StackPhase::InProgress
        );
        assert_eq!(StackPhase::from_status("CREATE_COMPLETE"), StackPhase::Complete);
        assert_eq!(StackPhase::from_status("UPDATE_COMPLETE"), StackPhase::Complete);
        assert_eq!(StackPhase::from_status("IMPORT_COMPLETE"), StackPhase::Complete);
        assert_eq!(
            StackPhase::from_status("UPDATE_ROLLBACK_COMPLETE"),
            StackPhase::RolledBack
        );
        assert_eq!(StackPhase::from_status("ROLLBACK_COMPLETE"), StackPhase::Failed);
        assert_eq!(StackPhase::from_status("CREATE_FAILED"), StackPhase::Failed);
        assert_eq!(StackPhase::from_status("DELETE_COMPLETE"), StackPhase::Deleted);
    }

    #[test]
    fn test_description_phase() {
        let desc = StackDescription {
            name: "rfl-dev".to_string(),
            status: "CREATE_COMPLETE".to_string(),
            ..Default::default()
        };
        assert_eq!(desc.phase(), StackPhase::Complete);
    }
}
