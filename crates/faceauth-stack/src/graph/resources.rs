//! Typed resource declarations
//!
//! Each declaration kind carries its input attributes as fields and its
//! dependencies as [`OutputRef`]s, so the graph can be validated without
//! inspecting rendered properties.

use super::types::{LogicalId, OutputRef};
use crate::policy::{RolePolicy, RoleTrustPolicy};
use faceauth_common::ResourceKind;
use serde_json::{Map, Value, json};

/// Custom string attribute on a user pool
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttribute {
    pub name: String,
    pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPoolSpec {
    pub name: String,
    pub custom_attributes: Vec<CustomAttribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPoolClientSpec {
    pub name: String,
    pub user_pool: OutputRef,
}

/// Cognito user pool registered as an identity pool provider
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityProvider {
    pub client_id: OutputRef,
    pub provider_name: OutputRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityPoolSpec {
    pub name: String,
    pub allow_unauthenticated: bool,
    pub providers: Vec<IdentityProvider>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleSpec {
    pub description: String,
    pub trust: RoleTrustPolicy,
    pub policy: RolePolicy,
    pub policy_name: String,
}

/// Role mapping of an identity pool
#[derive(Debug, Clone, PartialEq)]
pub struct RoleAttachmentSpec {
    pub identity_pool: OutputRef,
    pub unauthenticated_role: OutputRef,
}

/// SDK call executed by a bootstrap action
#[derive(Debug, Clone, PartialEq)]
pub enum SdkCall {
    /// Rekognition `CreateCollection`
    CreateCollection { collection_id: String },
}

impl SdkCall {
    pub fn service(&self) -> &'static str {
        match self {
            SdkCall::CreateCollection { .. } => "Rekognition",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            SdkCall::CreateCollection { .. } => "CreateCollection",
        }
    }

    pub fn parameters(&self) -> Value {
        match self {
            SdkCall::CreateCollection { collection_id } => json!({ "CollectionId": collection_id }),
        }
    }
}

/// One-shot SDK call run after the native resources are deployed
///
/// The physical resource id identifies the created object; running the
/// action again with the same id is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapActionSpec {
    pub call: SdkCall,
    pub physical_resource_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceSpec {
    UserPool(UserPoolSpec),
    UserPoolClient(UserPoolClientSpec),
    IdentityPool(IdentityPoolSpec),
    IamRole(RoleSpec),
    IdentityPoolRoleAttachment(RoleAttachmentSpec),
    BootstrapAction(BootstrapActionSpec),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::UserPool(_) => ResourceKind::UserPool,
            ResourceSpec::UserPoolClient(_) => ResourceKind::UserPoolClient,
            ResourceSpec::IdentityPool(_) => ResourceKind::IdentityPool,
            ResourceSpec::IamRole(_) => ResourceKind::IamRole,
            ResourceSpec::IdentityPoolRoleAttachment(_) => ResourceKind::IdentityPoolRoleAttachment,
            ResourceSpec::BootstrapAction(_) => ResourceKind::BootstrapAction,
        }
    }

    /// Outputs of other declarations this one consumes
    pub fn references(&self) -> Vec<&OutputRef> {
        match self {
            ResourceSpec::UserPool(_) | ResourceSpec::BootstrapAction(_) => Vec::new(),
            ResourceSpec::UserPoolClient(spec) => vec![&spec.user_pool],
            ResourceSpec::IdentityPool(spec) => spec
                .providers
                .iter()
                .flat_map(|p| [&p.client_id, &p.provider_name])
                .collect(),
            ResourceSpec::IamRole(spec) => vec![&spec.trust.identity_pool],
            ResourceSpec::IdentityPoolRoleAttachment(spec) => {
                vec![&spec.identity_pool, &spec.unauthenticated_role]
            }
        }
    }

    /// CloudFormation `Properties` for native kinds
    pub fn properties(&self) -> Option<Value> {
        let props = match self {
            ResourceSpec::UserPool(spec) => {
                let mut props = Map::new();
                props.insert("UserPoolName".into(), json!(spec.name));
                if !spec.custom_attributes.is_empty() {
                    let schema: Vec<Value> = spec
                        .custom_attributes
                        .iter()
                        .map(|attr| {
                            json!({
                                "Name": attr.name,
                                "AttributeDataType": "String",
                                "Mutable": attr.mutable,
                                "StringAttributeConstraints": {}
                            })
                        })
                        .collect();
                    props.insert("Schema".into(), Value::Array(schema));
                }
                Value::Object(props)
            }
            ResourceSpec::UserPoolClient(spec) => json!({
                "ClientName": spec.name,
                "UserPoolId": spec.user_pool.to_cfn(),
                "GenerateSecret": false
            }),
            ResourceSpec::IdentityPool(spec) => {
                let providers: Vec<Value> = spec
                    .providers
                    .iter()
                    .map(|p| {
                        json!({
                            "ClientId": p.client_id.to_cfn(),
                            "ProviderName": p.provider_name.to_cfn()
                        })
                    })
                    .collect();
                json!({
                    "IdentityPoolName": spec.name,
                    "AllowUnauthenticatedIdentities": spec.allow_unauthenticated,
                    "CognitoIdentityProviders": providers
                })
            }
            ResourceSpec::IamRole(spec) => {
                let mut props = Map::new();
                props.insert("AssumeRolePolicyDocument".into(), spec.trust.to_cfn());
                props.insert("Description".into(), json!(spec.description));
                if let Some(arns) = spec.policy.managed_policy_arns() {
                    props.insert("ManagedPolicyArns".into(), arns);
                }
                if let Some(policies) = spec.policy.inline_policies(&spec.policy_name) {
                    props.insert("Policies".into(), policies);
                }
                Value::Object(props)
            }
            ResourceSpec::IdentityPoolRoleAttachment(spec) => json!({
                "IdentityPoolId": spec.identity_pool.to_cfn(),
                "Roles": { "unauthenticated": spec.unauthenticated_role.to_cfn() }
            }),
            ResourceSpec::BootstrapAction(_) => return None,
        };
        Some(props)
    }
}

/// Node of the resource graph
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDeclaration {
    pub logical_id: LogicalId,
    pub spec: ResourceSpec,
}

impl ResourceDeclaration {
    pub fn new(logical_id: LogicalId, spec: ResourceSpec) -> Self {
        Self { logical_id, spec }
    }

    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }

    /// Whether deleting the stack should keep this resource
    ///
    /// User pools hold user identities and are retained.
    pub fn retain_on_delete(&self) -> bool {
        matches!(self.spec, ResourceSpec::UserPool(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    #[test]
    fn test_user_pool_schema() {
        let spec = ResourceSpec::UserPool(UserPoolSpec {
            name: "rfl-dev".to_string(),
            custom_attributes: vec![CustomAttribute {
                name: "faceId".to_string(),
                mutable: true,
            }],
        });
        let props = spec.properties().unwrap();
        assert_eq!(props["UserPoolName"], "rfl-dev");
        assert_eq!(props["Schema"][0]["Name"], "faceId");
        assert_eq!(props["Schema"][0]["Mutable"], true);

        let plain = ResourceSpec::UserPool(UserPoolSpec {
            name: "rfl-dev".to_string(),
            custom_attributes: vec![],
        });
        assert!(plain.properties().unwrap().get("Schema").is_none());
    }

    #[test]
    fn test_identity_pool_references() {
        let spec = ResourceSpec::IdentityPool(IdentityPoolSpec {
            name: "rfl_dev".to_string(),
            allow_unauthenticated: true,
            providers: vec![IdentityProvider {
                client_id: OutputRef::id(&id("UserPoolClient")),
                provider_name: OutputRef::provider_name(&id("UserPool")),
            }],
        });
        let targets: Vec<&str> = spec.references().iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["UserPoolClient", "UserPool"]);

        let props = spec.properties().unwrap();
        assert_eq!(props["AllowUnauthenticatedIdentities"], true);
        assert_eq!(
            props["CognitoIdentityProviders"][0]["ProviderName"],
            json!({ "Fn::GetAtt": ["UserPool", "ProviderName"] })
        );
    }

    #[test]
    fn test_attachment_properties() {
        let spec = ResourceSpec::IdentityPoolRoleAttachment(RoleAttachmentSpec {
            identity_pool: OutputRef::id(&id("IdentityPool")),
            unauthenticated_role: OutputRef::arn(&id("UnauthRole")),
        });
        let props = spec.properties().unwrap();
        assert_eq!(props["IdentityPoolId"], json!({ "Ref": "IdentityPool" }));
        assert_eq!(
            props["Roles"]["unauthenticated"],
            json!({ "Fn::GetAtt": ["UnauthRole", "Arn"] })
        );
    }

    #[test]
    fn test_bootstrap_action_is_not_rendered() {
        let spec = ResourceSpec::BootstrapAction(BootstrapActionSpec {
            call: SdkCall::CreateCollection {
                collection_id: "FaceAuthCollection".to_string(),
            },
            physical_resource_id: "FaceAuthCollection".to_string(),
        });
        assert!(spec.properties().is_none());
        assert!(spec.references().is_empty());
    }

    #[test]
    fn test_sdk_call_metadata() {
        let call = SdkCall::CreateCollection {
            collection_id: "FaceAuthCollection".to_string(),
        };
        assert_eq!(call.service(), "Rekognition");
        assert_eq!(call.action(), "CreateCollection");
        assert_eq!(call.parameters(), json!({ "CollectionId": "FaceAuthCollection" }));
    }
}
