//! Stack context and configuration loading

use crate::error::ConfigError;
use crate::policy::RolePolicy;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Stack configuration loaded from JSON
///
/// ```json
/// {
///   "stack_name": "rfl-dev",
///   "with_face_id_attribute": true,
///   "unauth_policy": { "type": "managed", "policy_names": ["AmazonRekognitionFullAccess"] }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct StackConfig {
    /// Stack name, used to name every declared resource
    pub stack_name: String,

    /// Add a mutable `faceId` custom attribute to the user pool
    #[serde(default)]
    pub with_face_id_attribute: bool,

    /// Permissions of the unauthenticated role (scoped default when absent)
    #[serde(default)]
    pub unauth_policy: Option<RolePolicy>,
}

impl StackConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Validated input of the resource graph builder
#[derive(Debug, Clone, PartialEq)]
pub struct StackContext {
    name: String,
    with_face_id_attribute: bool,
    unauth_policy: RolePolicy,
}

impl StackContext {
    /// Create a context with default settings for the named stack
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        validate_stack_name(&name)?;
        Ok(Self {
            name,
            with_face_id_attribute: false,
            unauth_policy: RolePolicy::default(),
        })
    }

    /// Build a context from a loaded configuration file
    pub fn from_config(config: StackConfig) -> Result<Self, ConfigError> {
        let context = Self::new(config.stack_name)?.with_face_id_attribute(config.with_face_id_attribute);
        match config.unauth_policy {
            Some(policy) => context.with_unauth_policy(policy),
            None => Ok(context),
        }
    }

    /// Combine an optional config file with command-line overrides
    ///
    /// `name` replaces the file's `stack_name`; the face id attribute is
    /// enabled if either source enables it.
    pub fn resolve(
        name: Option<&str>,
        config: Option<&Path>,
        with_face_id_attribute: bool,
    ) -> Result<Self, ConfigError> {
        let context = match (config, name) {
            (Some(path), name) => {
                let mut config = StackConfig::load(path)?;
                if let Some(name) = name {
                    config.stack_name = name.to_string();
                }
                Self::from_config(config)?
            }
            (None, Some(name)) => Self::new(name)?,
            (None, None) => return Err(ConfigError::EmptyStackName),
        };
        let enabled = context.with_face_id_attribute || with_face_id_attribute;
        Ok(context.with_face_id_attribute(enabled))
    }

    pub fn with_face_id_attribute(mut self, enabled: bool) -> Self {
        self.with_face_id_attribute = enabled;
        self
    }

    pub fn with_unauth_policy(mut self, policy: RolePolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        self.unauth_policy = policy;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn face_id_attribute(&self) -> bool {
        self.with_face_id_attribute
    }

    pub fn unauth_policy(&self) -> &RolePolicy {
        &self.unauth_policy
    }

    /// Name usable for an identity pool (word characters and spaces only)
    pub fn identity_pool_name(&self) -> String {
        self.name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == ' ' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// CloudFormation stack names: a letter, then letters, digits and hyphens
fn validate_stack_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyStackName);
    }
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter
        || name.len() > 128
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ConfigError::InvalidStackName(name.to_string()));
    }
    Ok(())
}
