//! Declared resource kinds and their provisioning order
//!
//! Every node of a stack's resource graph has one of these kinds. The kind
//! decides which output attributes other nodes may reference and whether the
//! node is rendered as a native CloudFormation resource.

use std::fmt;

/// Types of resources declared by a face-auth stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Cognito user pool
    UserPool,
    /// Cognito user pool client (app client)
    UserPoolClient,
    /// Cognito identity pool
    IdentityPool,
    /// IAM role assumed by identity pool identities
    IamRole,
    /// Mapping of roles onto an identity pool
    IdentityPoolRoleAttachment,
    /// One-shot SDK call executed after the stack is deployed
    BootstrapAction,
}

impl ResourceKind {
    /// CloudFormation resource type, or `None` for kinds outside the native vocabulary
    pub fn cfn_type(self) -> Option<&'static str> {
        match self {
            ResourceKind::UserPool => Some("AWS::Cognito::UserPool"),
            ResourceKind::UserPoolClient => Some("AWS::Cognito::UserPoolClient"),
            ResourceKind::IdentityPool => Some("AWS::Cognito::IdentityPool"),
            ResourceKind::IamRole => Some("AWS::IAM::Role"),
            ResourceKind::IdentityPoolRoleAttachment => {
                Some("AWS::Cognito::IdentityPoolRoleAttachment")
            }
            ResourceKind::BootstrapAction => None,
        }
    }

    /// Whether the deployment engine provisions this kind natively
    pub fn is_native(self) -> bool {
        self.cfn_type().is_some()
    }

    /// Get provisioning tier (lower = provisioned first)
    ///
    /// Only used to break ties between independent nodes so that graph order
    /// is stable; references always take precedence.
    pub fn provision_tier(self) -> u8 {
        match self {
            ResourceKind::UserPool => 0,
            ResourceKind::UserPoolClient => 1,
            ResourceKind::IdentityPool => 2,
            ResourceKind::IamRole => 3,
            ResourceKind::IdentityPoolRoleAttachment => 4,
            ResourceKind::BootstrapAction => 5,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::UserPool => "user pool",
            ResourceKind::UserPoolClient => "user pool client",
            ResourceKind::IdentityPool => "identity pool",
            ResourceKind::IamRole => "IAM role",
            ResourceKind::IdentityPoolRoleAttachment => "identity pool role attachment",
            ResourceKind::BootstrapAction => "bootstrap action",
        };
        f.write_str(name)
    }
}
