//! IAM trust and permission policies for identity pool roles

use crate::error::ConfigError;
use crate::graph::OutputRef;
use faceauth_common::COLLECTION_ID;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Principal that issues identity pool credentials
pub const COGNITO_IDENTITY_PRINCIPAL: &str = "cognito-identity.amazonaws.com";

/// Action identity pool identities use to assume a role
pub const ASSUME_ROLE_WITH_WEB_IDENTITY: &str = "sts:AssumeRoleWithWebIdentity";

/// Access-method tag carried by unauthenticated identities
pub const AMR_UNAUTHENTICATED: &str = "unauthenticated";

/// AWS managed policy granting every Rekognition action
pub const REKOGNITION_FULL_ACCESS: &str = "AmazonRekognitionFullAccess";

/// Trust policy binding a role to one identity pool and one access method
#[derive(Debug, Clone, PartialEq)]
pub struct RoleTrustPolicy {
    /// Identity pool whose identities may assume the role (`aud` condition)
    pub identity_pool: OutputRef,
    /// Access method the identity must present (`amr` condition)
    pub amr: &'static str,
}

impl RoleTrustPolicy {
    /// Trust policy for unauthenticated identities of `identity_pool`
    pub fn unauthenticated(identity_pool: OutputRef) -> Self {
        Self {
            identity_pool,
            amr: AMR_UNAUTHENTICATED,
        }
    }

    pub fn to_cfn(&self) -> Value {
        json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": { "Federated": COGNITO_IDENTITY_PRINCIPAL },
                    "Action": ASSUME_ROLE_WITH_WEB_IDENTITY,
                    "Condition": {
                        "StringEquals": {
                            "cognito-identity.amazonaws.com:aud": self.identity_pool.to_cfn()
                        },
                        "ForAnyValue:StringLike": {
                            "cognito-identity.amazonaws.com:amr": self.amr
                        }
                    }
                }
            ]
        })
    }
}

/// One allow statement of a scoped permission policy
///
/// Resources may use `${AWS::Region}`-style placeholders; they are rendered
/// through `Fn::Sub`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

/// Permissions granted to the unauthenticated role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RolePolicy {
    /// Inline policy with explicit actions and resources
    Scoped { statements: Vec<PolicyStatement> },
    /// AWS managed policies attached by name
    Managed { policy_names: Vec<String> },
}

impl Default for RolePolicy {
    /// Index and search on the face collection only
    fn default() -> Self {
        RolePolicy::Scoped {
            statements: vec![PolicyStatement {
                actions: vec![
                    "rekognition:IndexFaces".to_string(),
                    "rekognition:SearchFacesByImage".to_string(),
                ],
                resources: vec![collection_arn_pattern(COLLECTION_ID)],
            }],
        }
    }
}

impl RolePolicy {
    /// Full Rekognition access; only used when configured explicitly
    pub fn rekognition_full_access() -> Self {
        RolePolicy::Managed {
            policy_names: vec![REKOGNITION_FULL_ACCESS.to_string()],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            RolePolicy::Scoped { statements } => {
                if statements.is_empty() {
                    return Err(ConfigError::EmptyPolicy);
                }
                for (index, statement) in statements.iter().enumerate() {
                    if statement.actions.is_empty() || statement.resources.is_empty() {
                        return Err(ConfigError::IncompleteStatement { index });
                    }
                }
                Ok(())
            }
            RolePolicy::Managed { policy_names } if policy_names.is_empty() => {
                Err(ConfigError::EmptyManagedPolicies)
            }
            RolePolicy::Managed { .. } => Ok(()),
        }
    }

    /// `ManagedPolicyArns` property value, if any
    pub fn managed_policy_arns(&self) -> Option<Value> {
        match self {
            RolePolicy::Managed { policy_names } => Some(Value::Array(
                policy_names
                    .iter()
                    .map(|name| {
                        json!({
                            "Fn::Join": ["", ["arn:", { "Ref": "AWS::Partition" }, ":iam::aws:policy/", name]]
                        })
                    })
                    .collect(),
            )),
            RolePolicy::Scoped { .. } => None,
        }
    }

    /// `Policies` property value, if any
    pub fn inline_policies(&self, policy_name: &str) -> Option<Value> {
        match self {
            RolePolicy::Scoped { statements } => {
                let statements: Vec<Value> = statements
                    .iter()
                    .map(|s| {
                        let resources: Vec<Value> =
                            s.resources.iter().map(|r| substitute(r)).collect();
                        json!({
                            "Effect": "Allow",
                            "Action": s.actions,
                            "Resource": resources
                        })
                    })
                    .collect();
                Some(json!([
                    {
                        "PolicyName": policy_name,
                        "PolicyDocument": {
                            "Version": "2012-10-17",
                            "Statement": statements
                        }
                    }
                ]))
            }
            RolePolicy::Managed { .. } => None,
        }
    }
}

/// ARN pattern of a Rekognition collection in the deploying account and region
pub fn collection_arn_pattern(collection_id: &str) -> String {
    format!(
        "arn:${{AWS::Partition}}:rekognition:${{AWS::Region}}:${{AWS::AccountId}}:collection/{}",
        collection_id
    )
}

fn substitute(s: &str) -> Value {
    if s.contains("${") {
        json!({ "Fn::Sub": s })
    } else {
        Value::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LogicalId;

    #[test]
    fn test_trust_policy_conditions() {
        let pool = LogicalId::new("IdentityPool").unwrap();
        let doc = RoleTrustPolicy::unauthenticated(OutputRef::id(&pool)).to_cfn();
        let statement = &doc["Statement"][0];

        assert_eq!(statement["Principal"]["Federated"], COGNITO_IDENTITY_PRINCIPAL);
        assert_eq!(statement["Action"], ASSUME_ROLE_WITH_WEB_IDENTITY);
        assert_eq!(
            statement["Condition"]["StringEquals"]["cognito-identity.amazonaws.com:aud"],
            json!({ "Ref": "IdentityPool" })
        );
        assert_eq!(
            statement["Condition"]["ForAnyValue:StringLike"]["cognito-identity.amazonaws.com:amr"],
            "unauthenticated"
        );
    }

    #[test]
    fn test_default_policy_is_scoped_to_collection() {
        let policy = RolePolicy::default();
        assert!(policy.validate().is_ok());
        assert!(policy.managed_policy_arns().is_none());

        let inline = policy.inline_policies("FaceAccess").unwrap();
        let statement = &inline[0]["PolicyDocument"]["Statement"][0];
        assert_eq!(
            statement["Action"],
            json!(["rekognition:IndexFaces", "rekognition:SearchFacesByImage"])
        );
        let resource = statement["Resource"][0]["Fn::Sub"].as_str().unwrap();
        assert!(resource.ends_with(":collection/FaceAuthCollection"));
    }

    #[test]
    fn test_managed_policy_arns() {
        let policy = RolePolicy::rekognition_full_access();
        let arns = policy.managed_policy_arns().unwrap();
        assert_eq!(arns.as_array().unwrap().len(), 1);
        assert_eq!(arns[0]["Fn::Join"][1][3], "AmazonRekognitionFullAccess");
        assert!(policy.inline_policies("FaceAccess").is_none());
    }

    #[test]
    fn test_validate_rejects_empty_policies() {
        assert!(matches!(
            RolePolicy::Scoped { statements: vec![] }.validate(),
            Err(ConfigError::EmptyPolicy)
        ));
        assert!(matches!(
            RolePolicy::Managed {
                policy_names: vec![]
            }
            .validate(),
            Err(ConfigError::EmptyManagedPolicies)
        ));
        let incomplete = RolePolicy::Scoped {
            statements: vec![PolicyStatement {
                actions: vec!["rekognition:IndexFaces".to_string()],
                resources: vec![],
            }],
        };
        assert!(matches!(
            incomplete.validate(),
            Err(ConfigError::IncompleteStatement { index: 0 })
        ));
    }

    #[test]
    fn test_policy_from_json() {
        let policy: RolePolicy = serde_json::from_str(
            r#"{"type": "managed", "policy_names": ["AmazonRekognitionReadOnlyAccess"]}"#,
        )
        .unwrap();
        assert_eq!(
            policy,
            RolePolicy::Managed {
                policy_names: vec!["AmazonRekognitionReadOnlyAccess".to_string()]
            }
        );
    }

    #[test]
    fn test_plain_resource_is_not_substituted() {
        assert_eq!(substitute("*"), json!("*"));
    }
}
