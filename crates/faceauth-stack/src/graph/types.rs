//! Identifiers and typed output references between graph nodes

use crate::error::GraphError;
use faceauth_common::ResourceKind;
use serde_json::{Value, json};
use std::fmt;

/// Logical id of a declaration, unique within a graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalId(String);

impl LogicalId {
    /// Create a logical id, checking CloudFormation's naming rules
    pub fn new(id: impl Into<String>) -> Result<Self, GraphError> {
        let id = id.into();
        if id.is_empty() || id.len() > 255 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(GraphError::InvalidLogicalId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output attribute of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Primary identifier (pool id, client id, role name)
    Id,
    /// User pool provider name used by identity pools
    ProviderName,
    /// Amazon Resource Name
    Arn,
}

impl Attribute {
    /// Whether a resource of `kind` exposes this attribute
    pub fn exposed_by(self, kind: ResourceKind) -> bool {
        match (kind, self) {
            (ResourceKind::BootstrapAction, _) => false,
            (_, Attribute::Id) => true,
            (ResourceKind::UserPool, Attribute::ProviderName | Attribute::Arn) => true,
            (ResourceKind::IamRole, Attribute::Arn) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Id => f.write_str("Id"),
            Attribute::ProviderName => f.write_str("ProviderName"),
            Attribute::Arn => f.write_str("Arn"),
        }
    }
}

/// Reference to an output of another declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub target: LogicalId,
    pub attribute: Attribute,
}

impl OutputRef {
    pub fn new(target: &LogicalId, attribute: Attribute) -> Self {
        Self {
            target: target.clone(),
            attribute,
        }
    }

    /// Reference to the target's primary identifier
    pub fn id(target: &LogicalId) -> Self {
        Self::new(target, Attribute::Id)
    }

    pub fn arn(target: &LogicalId) -> Self {
        Self::new(target, Attribute::Arn)
    }

    pub fn provider_name(target: &LogicalId) -> Self {
        Self::new(target, Attribute::ProviderName)
    }

    /// Render as a CloudFormation intrinsic
    pub fn to_cfn(&self) -> Value {
        match self.attribute {
            Attribute::Id => json!({ "Ref": self.target.as_str() }),
            attribute => json!({ "Fn::GetAtt": [self.target.as_str(), attribute.to_string()] }),
        }
    }
}

/// Value of a stack output
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValue {
    /// Output of a declared resource
    Resource(OutputRef),
    /// CloudFormation pseudo parameter such as `AWS::Region`
    Pseudo(&'static str),
    /// Fixed string
    Literal(String),
}

impl OutputValue {
    pub fn to_cfn(&self) -> Value {
        match self {
            OutputValue::Resource(r) => r.to_cfn(),
            OutputValue::Pseudo(name) => json!({ "Ref": name }),
            OutputValue::Literal(s) => Value::String(s.clone()),
        }
    }
}

/// Named value exported by the deployed stack
#[derive(Debug, Clone, PartialEq)]
pub struct StackOutput {
    pub key: String,
    pub description: String,
    pub value: OutputValue,
}
