//! Resource graph builder for face-auth stacks
//!
//! Declares, in order:
//! 1. a user pool named after the stack (optionally with a `faceId` attribute)
//! 2. a user pool client bound to it
//! 3. an identity pool allowing unauthenticated identities, with the client
//!    as its only identity provider
//! 4. an unauthenticated role trusting only that identity pool
//! 5. the role attachment mapping the role onto the pool
//! 6. the bootstrap action creating the face collection

use crate::context::StackContext;
use crate::error::GraphError;
use crate::graph::{
    BootstrapActionSpec, CustomAttribute, IdentityPoolSpec, IdentityProvider, LogicalId, OutputRef,
    OutputValue, ResourceDeclaration, ResourceGraph, ResourceSpec, RoleAttachmentSpec, RoleSpec,
    SdkCall, StackOutput, UserPoolClientSpec, UserPoolSpec,
};
use crate::policy::RoleTrustPolicy;
use faceauth_common::COLLECTION_ID;
use tracing::debug;

/// Logical ids of the declared resources
pub mod logical_ids {
    pub const USER_POOL: &str = "UserPool";
    pub const USER_POOL_CLIENT: &str = "UserPoolClient";
    pub const IDENTITY_POOL: &str = "IdentityPool";
    pub const UNAUTH_ROLE: &str = "IdentityPoolUnauthRole";
    pub const ROLE_ATTACHMENT: &str = "IdentityPoolRoleAttachment";
    pub const FACE_COLLECTION: &str = "FaceCollection";
}

/// Output keys of the deployed stack
pub mod output_keys {
    pub const USER_POOL_ID: &str = "UserPoolId";
    pub const USER_POOL_CLIENT_ID: &str = "UserPoolClientId";
    pub const IDENTITY_POOL_ID: &str = "IdentityPoolId";
    pub const UNAUTH_ROLE_ARN: &str = "UnauthRoleArn";
    pub const REGION: &str = "Region";
    pub const FACE_COLLECTION_ID: &str = "FaceCollectionId";
}

/// Name of the `faceId` custom user attribute
pub const FACE_ID_ATTRIBUTE: &str = "faceId";

/// Name of the unauthenticated role's inline policy
pub const UNAUTH_POLICY_NAME: &str = "FaceAuthUnauthenticatedAccess";

/// Builds the resource graph of a stack
pub struct ResourceGraphBuilder<'a> {
    context: &'a StackContext,
}

impl<'a> ResourceGraphBuilder<'a> {
    pub fn new(context: &'a StackContext) -> Self {
        Self { context }
    }

    /// Build and validate the graph for `context`
    pub fn build(context: &StackContext) -> Result<ResourceGraph, GraphError> {
        ResourceGraphBuilder::new(context).into_graph()
    }

    /// Declare every resource and validate the result
    pub fn into_graph(self) -> Result<ResourceGraph, GraphError> {
        let name = self.context.name();

        let user_pool_id = LogicalId::new(logical_ids::USER_POOL)?;
        let client_id = LogicalId::new(logical_ids::USER_POOL_CLIENT)?;
        let identity_pool_id = LogicalId::new(logical_ids::IDENTITY_POOL)?;
        let role_id = LogicalId::new(logical_ids::UNAUTH_ROLE)?;
        let attachment_id = LogicalId::new(logical_ids::ROLE_ATTACHMENT)?;
        let collection_id = LogicalId::new(logical_ids::FACE_COLLECTION)?;

        let custom_attributes = if self.context.face_id_attribute() {
            vec![CustomAttribute {
                name: FACE_ID_ATTRIBUTE.to_string(),
                mutable: true,
            }]
        } else {
            Vec::new()
        };

        let declarations = vec![
            ResourceDeclaration::new(
                user_pool_id.clone(),
                ResourceSpec::UserPool(UserPoolSpec {
                    name: name.to_string(),
                    custom_attributes,
                }),
            ),
            ResourceDeclaration::new(
                client_id.clone(),
                ResourceSpec::UserPoolClient(UserPoolClientSpec {
                    name: name.to_string(),
                    user_pool: OutputRef::id(&user_pool_id),
                }),
            ),
            ResourceDeclaration::new(
                identity_pool_id.clone(),
                ResourceSpec::IdentityPool(IdentityPoolSpec {
                    name: self.context.identity_pool_name(),
                    allow_unauthenticated: true,
                    providers: vec![IdentityProvider {
                        client_id: OutputRef::id(&client_id),
                        provider_name: OutputRef::provider_name(&user_pool_id),
                    }],
                }),
            ),
            ResourceDeclaration::new(
                role_id.clone(),
                ResourceSpec::IamRole(RoleSpec {
                    description: format!(
                        "Unauthenticated access to Rekognition for identity pool of {}",
                        name
                    ),
                    trust: RoleTrustPolicy::unauthenticated(OutputRef::id(&identity_pool_id)),
                    policy: self.context.unauth_policy().clone(),
                    policy_name: UNAUTH_POLICY_NAME.to_string(),
                }),
            ),
            ResourceDeclaration::new(
                attachment_id,
                ResourceSpec::IdentityPoolRoleAttachment(RoleAttachmentSpec {
                    identity_pool: OutputRef::id(&identity_pool_id),
                    unauthenticated_role: OutputRef::arn(&role_id),
                }),
            ),
            ResourceDeclaration::new(
                collection_id,
                ResourceSpec::BootstrapAction(BootstrapActionSpec {
                    call: SdkCall::CreateCollection {
                        collection_id: COLLECTION_ID.to_string(),
                    },
                    physical_resource_id: COLLECTION_ID.to_string(),
                }),
            ),
        ];

        let outputs = vec![
            output(
                output_keys::USER_POOL_ID,
                "Cognito user pool id",
                OutputValue::Resource(OutputRef::id(&user_pool_id)),
            ),
            output(
                output_keys::USER_POOL_CLIENT_ID,
                "Cognito user pool web client id",
                OutputValue::Resource(OutputRef::id(&client_id)),
            ),
            output(
                output_keys::IDENTITY_POOL_ID,
                "Cognito identity pool id",
                OutputValue::Resource(OutputRef::id(&identity_pool_id)),
            ),
            output(
                output_keys::UNAUTH_ROLE_ARN,
                "Role assumed by unauthenticated identities",
                OutputValue::Resource(OutputRef::arn(&role_id)),
            ),
            output(
                output_keys::REGION,
                "Region the stack is deployed to",
                OutputValue::Pseudo("AWS::Region"),
            ),
            output(
                output_keys::FACE_COLLECTION_ID,
                "Rekognition face collection created by the bootstrap action",
                OutputValue::Literal(COLLECTION_ID.to_string()),
            ),
        ];

        let graph = ResourceGraph::new(declarations, outputs)?;
        debug!(
            stack = %name,
            declarations = graph.len(),
            face_id_attribute = self.context.face_id_attribute(),
            "Resource graph built"
        );
        Ok(graph)
    }
}

fn output(key: &str, description: &str, value: OutputValue) -> StackOutput {
    StackOutput {
        key: key.to_string(),
        description: description.to_string(),
        value,
    }
}
