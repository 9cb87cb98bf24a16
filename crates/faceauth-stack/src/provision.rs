//! Stack provisioning
//!
//! Deploys the native part of a validated resource graph as one CloudFormation
//! stack, waits for it to settle, then runs the graph's bootstrap actions in
//! order. Any failure aborts; rolling back native resources is left to
//! CloudFormation.

use crate::aws::{CollectionOperations, CollectionOutcome, StackChange, StackOperations, StackPhase};
use crate::context::StackContext;
use crate::graph::{LogicalId, ResourceGraph, SdkCall};
use crate::template;
use crate::wait::{PollConfig, poll_until};
use anyhow::{Context, Result};
use chrono::Utc;
use faceauth_common::tags;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What happened to one bootstrap action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The SDK call created its object
    Executed { logical_id: LogicalId },
    /// The object identified by the physical resource id was already there
    AlreadyPresent { logical_id: LogicalId },
}

/// Summary of a deployment
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub stack_name: String,
    pub change: StackChange,
    pub outputs: BTreeMap<String, String>,
    pub bootstrap: Vec<BootstrapOutcome>,
}

/// Deploys and destroys face-auth stacks
pub struct Provisioner<'a, S, C> {
    stacks: &'a S,
    collections: &'a C,
    poll: PollConfig,
    cancel: Option<CancellationToken>,
}

impl<'a, S: StackOperations, C: CollectionOperations> Provisioner<'a, S, C> {
    pub fn new(stacks: &'a S, collections: &'a C) -> Self {
        Self {
            stacks,
            collections,
            poll: PollConfig::default(),
            cancel: None,
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Deploy the graph as the stack named by `context`
    pub async fn deploy(&self, context: &StackContext, graph: &ResourceGraph) -> Result<DeployReport> {
        let stack_name = context.name();
        let body = template::render_body(context, graph).context("Failed to render template")?;

        let existing = self.stacks.describe_stack(stack_name).await?;
        let change = match existing {
            None => {
                let tags = tags::stack_tags(stack_name, Utc::now());
                self.stacks.create_stack(stack_name, &body, tags).await?;
                StackChange::Created
            }
            Some(desc) => match desc.phase() {
                StackPhase::Complete | StackPhase::RolledBack => {
                    if self.stacks.update_stack(stack_name, &body).await? {
                        StackChange::Updated
                    } else {
                        StackChange::Unchanged
                    }
                }
                StackPhase::InProgress => {
                    anyhow::bail!(
                        "Stack {} has an operation in progress ({})",
                        stack_name,
                        desc.status
                    );
                }
                StackPhase::Failed => {
                    anyhow::bail!(
                        "Stack {} is in state {} and must be destroyed before it can be deployed",
                        stack_name,
                        desc.status
                    );
                }
                StackPhase::Deleted => {
                    let tags = tags::stack_tags(stack_name, Utc::now());
                    self.stacks.create_stack(stack_name, &body, tags).await?;
                    StackChange::Created
                }
            },
        };

        let outputs = match change {
            StackChange::Unchanged => self
                .stacks
                .describe_stack(stack_name)
                .await?
                .map(|d| d.outputs)
                .unwrap_or_default(),
            StackChange::Created | StackChange::Updated => {
                self.wait_for_stack(stack_name).await?
            }
        };
        info!(stack = %stack_name, ?change, "Native resources deployed");

        let mut bootstrap = Vec::new();
        for (logical_id, action) in graph.bootstrap_actions() {
            let outcome = match &action.call {
                SdkCall::CreateCollection { collection_id } => {
                    match self
                        .collections
                        .create_collection(collection_id)
                        .await
                        .with_context(|| format!("Bootstrap action {} failed", logical_id))?
                    {
                        CollectionOutcome::Created { .. } => BootstrapOutcome::Executed {
                            logical_id: logical_id.clone(),
                        },
                        CollectionOutcome::AlreadyExists => BootstrapOutcome::AlreadyPresent {
                            logical_id: logical_id.clone(),
                        },
                    }
                }
            };
            info!(
                logical_id = %logical_id,
                physical_resource_id = %action.physical_resource_id,
                ?outcome,
                "Bootstrap action complete"
            );
            bootstrap.push(outcome);
        }

        Ok(DeployReport {
            stack_name: stack_name.to_string(),
            change,
            outputs,
            bootstrap,
        })
    }

    /// Delete the stack; returns `false` if it did not exist
    ///
    /// The face collection is not a stack resource and is kept, as is the
    /// retained user pool.
    pub async fn destroy(&self, stack_name: &str) -> Result<bool> {
        match self.stacks.describe_stack(stack_name).await? {
            None => {
                info!(stack = %stack_name, "Stack does not exist");
                return Ok(false);
            }
            Some(desc) if desc.phase() == StackPhase::Deleted => return Ok(false),
            Some(_) => {}
        }

        self.stacks.delete_stack(stack_name).await?;

        let stacks = self.stacks;
        poll_until(
            self.poll.clone(),
            self.cancel.as_ref(),
            || async move {
                match stacks.describe_stack(stack_name).await? {
                    None => Ok(Some(())),
                    Some(desc) => match desc.phase() {
                        StackPhase::Deleted => Ok(Some(())),
                        StackPhase::InProgress => Ok(None),
                        _ => Err(anyhow::anyhow!(
                            "Deleting stack {} failed: {} ({})",
                            stack_name,
                            desc.status,
                            desc.status_reason.as_deref().unwrap_or("no reason given")
                        )),
                    },
                }
            },
            &format!("stack {} deletion", stack_name),
        )
        .await?;

        info!(
            stack = %stack_name,
            "Stack deleted; the face collection and user pool are retained"
        );
        Ok(true)
    }

    /// Wait for a create or update to settle and return the stack outputs
    async fn wait_for_stack(&self, stack_name: &str) -> Result<BTreeMap<String, String>> {
        let stacks = self.stacks;
        poll_until(
            self.poll.clone(),
            self.cancel.as_ref(),
            || async move {
                let Some(desc) = stacks.describe_stack(stack_name).await? else {
                    anyhow::bail!("Stack {} disappeared while deploying", stack_name);
                };
                match desc.phase() {
                    StackPhase::InProgress => Ok(None),
                    StackPhase::Complete => Ok(Some(desc.outputs)),
                    _ => Err(anyhow::anyhow!(
                        "Stack {} deployment failed: {} ({})",
                        stack_name,
                        desc.status,
                        desc.status_reason.as_deref().unwrap_or("no reason given")
                    )),
                }
            },
            &format!("stack {}", stack_name),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::{MockCollectionOperations, MockStackOperations, StackDescription};
    use crate::builder::ResourceGraphBuilder;
    use faceauth_common::COLLECTION_ID;
    use mockall::Sequence;
    use std::time::Duration;
    use tracing_test::traced_test;

    fn fast_poll() -> PollConfig {
        PollConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            timeout: Duration::from_secs(5),
        }
    }

    fn stack(status: &str) -> StackDescription {
        StackDescription {
            name: "rfl-dev".to_string(),
            status: status.to_string(),
            status_reason: None,
            outputs: BTreeMap::from([(
                "IdentityPoolId".to_string(),
                "us-east-1:1234".to_string(),
            )]),
        }
    }

    fn setup() -> (StackContext, ResourceGraph) {
        let context = StackContext::new("rfl-dev").unwrap();
        let graph = ResourceGraphBuilder::build(&context).unwrap();
        (context, graph)
    }

    #[tokio::test]
    async fn test_deploy_creates_stack_then_bootstraps() {
        let (context, graph) = setup();
        let mut seq = Sequence::new();
        let mut stacks = MockStackOperations::new();

        stacks
            .expect_describe_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        stacks
            .expect_create_stack()
            .withf(|name, body, stack_tags| {
                name == "rfl-dev"
                    && body.contains("AWS::Cognito::IdentityPool")
                    && stack_tags
                        .iter()
                        .any(|(k, v)| k == tags::TAG_STACK && v == "rfl-dev")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("stack-id".to_string()));
        stacks
            .expect_describe_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(stack("CREATE_IN_PROGRESS"))));
        stacks
            .expect_describe_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(stack("CREATE_COMPLETE"))));

        let mut collections = MockCollectionOperations::new();
        collections
            .expect_create_collection()
            .withf(|id| id == COLLECTION_ID)
            .times(1)
            .returning(|_| Ok(CollectionOutcome::Created { arn: None }));

        let report = Provisioner::new(&stacks, &collections)
            .with_poll_config(fast_poll())
            .deploy(&context, &graph)
            .await
            .unwrap();

        assert_eq!(report.change, StackChange::Created);
        assert_eq!(report.outputs["IdentityPoolId"], "us-east-1:1234");
        assert_eq!(
            report.bootstrap,
            vec![BootstrapOutcome::Executed {
                logical_id: LogicalId::new("FaceCollection").unwrap()
            }]
        );
    }

    #[tokio::test]
    async fn test_redeploy_is_idempotent() {
        let (context, graph) = setup();
        let mut stacks = MockStackOperations::new();
        stacks
            .expect_describe_stack()
            .times(2)
            .returning(|_| Ok(Some(stack("UPDATE_COMPLETE"))));
        stacks
            .expect_update_stack()
            .times(1)
            .returning(|_, _| Ok(false));
        stacks.expect_create_stack().never();

        let mut collections = MockCollectionOperations::new();
        collections
            .expect_create_collection()
            .times(1)
            .returning(|_| Ok(CollectionOutcome::AlreadyExists));

        let report = Provisioner::new(&stacks, &collections)
            .with_poll_config(fast_poll())
            .deploy(&context, &graph)
            .await
            .unwrap();

        assert_eq!(report.change, StackChange::Unchanged);
        assert!(matches!(
            report.bootstrap[0],
            BootstrapOutcome::AlreadyPresent { .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_deploy_skips_bootstrap() {
        let (context, graph) = setup();
        let mut stacks = MockStackOperations::new();
        let mut seq = Sequence::new();
        stacks
            .expect_describe_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        stacks
            .expect_create_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("stack-id".to_string()));
        stacks
            .expect_describe_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(Some(StackDescription {
                    status_reason: Some("Role creation failed".to_string()),
                    ..stack("ROLLBACK_COMPLETE")
                }))
            });

        let mut collections = MockCollectionOperations::new();
        collections.expect_create_collection().never();

        let err = Provisioner::new(&stacks, &collections)
            .with_poll_config(fast_poll())
            .deploy(&context, &graph)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ROLLBACK_COMPLETE"), "got: {message}");
        assert!(message.contains("Role creation failed"), "got: {message}");
    }

    #[tokio::test]
    async fn test_deploy_refuses_busy_stack() {
        let (context, graph) = setup();
        let mut stacks = MockStackOperations::new();
        stacks
            .expect_describe_stack()
            .returning(|_| Ok(Some(stack("UPDATE_IN_PROGRESS"))));
        stacks.expect_update_stack().never();
        let collections = MockCollectionOperations::new();

        let err = Provisioner::new(&stacks, &collections)
            .deploy(&context, &graph)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("in progress"));
    }

    #[tokio::test]
    async fn test_bootstrap_failure_aborts() {
        let (context, graph) = setup();
        let mut stacks = MockStackOperations::new();
        stacks
            .expect_describe_stack()
            .returning(|_| Ok(Some(stack("CREATE_COMPLETE"))));
        stacks.expect_update_stack().returning(|_, _| Ok(false));

        let mut collections = MockCollectionOperations::new();
        collections
            .expect_create_collection()
            .returning(|_| Err(anyhow::anyhow!("AccessDeniedException")));

        let err = Provisioner::new(&stacks, &collections)
            .deploy(&context, &graph)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("FaceCollection"));
    }

    #[tokio::test]
    async fn test_destroy_missing_stack() {
        let mut stacks = MockStackOperations::new();
        stacks.expect_describe_stack().returning(|_| Ok(None));
        stacks.expect_delete_stack().never();
        let collections = MockCollectionOperations::new();

        let existed = Provisioner::new(&stacks, &collections)
            .destroy("rfl-dev")
            .await
            .unwrap();
        assert!(!existed);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_destroy_waits_for_deletion() {
        let mut stacks = MockStackOperations::new();
        let mut seq = Sequence::new();
        stacks
            .expect_describe_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(stack("CREATE_COMPLETE"))));
        stacks
            .expect_delete_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        stacks
            .expect_describe_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(stack("DELETE_IN_PROGRESS"))));
        stacks
            .expect_describe_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        let collections = MockCollectionOperations::new();

        let existed = Provisioner::new(&stacks, &collections)
            .with_poll_config(fast_poll())
            .destroy("rfl-dev")
            .await
            .unwrap();
        assert!(existed);

        logs_assert(|lines: &[&str]| {
            let deleted: Vec<&&str> = lines
                .iter()
                .filter(|line| line.contains("Stack deleted"))
                .collect();
            match deleted.as_slice() {
                [line] if line.contains("INFO") && line.contains("user pool are retained") => {
                    Ok(())
                }
                other => Err(format!("unexpected deletion log lines: {other:?}")),
            }
        });
    }
}
