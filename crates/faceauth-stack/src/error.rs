//! Stack configuration and graph validation errors

use crate::graph::{Attribute, LogicalId};
use faceauth_common::ResourceKind;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// stack_name field is empty
    #[error("stack_name cannot be empty")]
    EmptyStackName,

    /// stack_name does not satisfy CloudFormation naming rules
    #[error(
        "stack_name must start with a letter and contain only letters, digits and hyphens (max 128 chars), got: {0}"
    )]
    InvalidStackName(String),

    /// Scoped role policy has no statements
    #[error("unauth_policy must contain at least one statement")]
    EmptyPolicy,

    /// A policy statement has no actions or no resources
    #[error("policy statement {index} must list at least one action and one resource")]
    IncompleteStatement { index: usize },

    /// Managed role policy has no policy names
    #[error("unauth_policy must name at least one managed policy")]
    EmptyManagedPolicies,

    /// Failed to parse JSON configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read configuration file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Resource graph construction and validation errors
///
/// Any of these aborts the whole build; a graph is never partially usable.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Logical id is not a valid CloudFormation logical id
    #[error("invalid logical id '{0}': must be 1-255 ASCII alphanumeric characters")]
    InvalidLogicalId(String),

    /// Two declarations share a logical id
    #[error("duplicate logical id '{0}'")]
    DuplicateLogicalId(LogicalId),

    /// A declaration references a node that is not in the graph
    #[error("'{from}' references '{target}', which is not declared")]
    DanglingReference { from: LogicalId, target: LogicalId },

    /// A declaration references an output the target kind does not expose
    #[error("'{from}' references {attribute} of '{target}', but a {kind} does not expose it")]
    UnsupportedAttribute {
        from: LogicalId,
        target: LogicalId,
        kind: ResourceKind,
        attribute: Attribute,
    },

    /// The declarations form a reference cycle
    #[error("reference cycle between: {}", .0.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", "))]
    Cycle(Vec<LogicalId>),

    /// A reference points at a node of the wrong kind
    #[error("'{from}' expects '{target}' to be a {expected}, found a {found}")]
    KindMismatch {
        from: LogicalId,
        target: LogicalId,
        expected: ResourceKind,
        found: ResourceKind,
    },

    /// A role is attached to an identity pool its trust policy does not name
    #[error(
        "role '{role}' is attached to identity pool '{attached_pool}' but its trust policy names '{trusted_pool}'"
    )]
    TrustMismatch {
        role: LogicalId,
        attached_pool: LogicalId,
        trusted_pool: LogicalId,
    },

    /// Two stack outputs share a key
    #[error("duplicate stack output '{0}'")]
    DuplicateOutput(String),
}
