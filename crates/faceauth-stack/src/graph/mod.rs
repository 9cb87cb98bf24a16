//! Resource graph of a face-auth stack
//!
//! A [`ResourceGraph`] is a validated directed acyclic graph of typed resource
//! declarations. Validation happens once, in [`ResourceGraph::new`], before
//! anything is rendered or provisioned:
//!
//! - logical ids are unique
//! - every reference names a declared node and an attribute its kind exposes
//! - roles referenced by attachments are roles, pools are identity pools
//! - a role attached to an identity pool trusts exactly that pool
//! - there are no reference cycles
//!
//! Declarations are stored in provisioning order: every node comes after the
//! nodes it references.

mod resources;
mod types;

pub use resources::{
    BootstrapActionSpec, CustomAttribute, IdentityPoolSpec, IdentityProvider, ResourceDeclaration,
    ResourceSpec, RoleAttachmentSpec, RoleSpec, SdkCall, UserPoolClientSpec, UserPoolSpec,
};
pub use types::{Attribute, LogicalId, OutputRef, OutputValue, StackOutput};

use crate::error::GraphError;
use faceauth_common::ResourceKind;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Validated, topologically ordered set of declarations
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    declarations: Vec<ResourceDeclaration>,
    outputs: Vec<StackOutput>,
}

impl ResourceGraph {
    /// Validate declarations and outputs and order them for provisioning
    pub fn new(
        declarations: Vec<ResourceDeclaration>,
        outputs: Vec<StackOutput>,
    ) -> Result<Self, GraphError> {
        let index = index_declarations(&declarations)?;

        for decl in &declarations {
            for reference in decl.spec.references() {
                check_reference(&declarations, &index, &decl.logical_id, reference)?;
            }
        }

        let mut output_keys = HashSet::new();
        for output in &outputs {
            if !output_keys.insert(output.key.as_str()) {
                return Err(GraphError::DuplicateOutput(output.key.clone()));
            }
            if let OutputValue::Resource(reference) = &output.value {
                let from = LogicalId::new(output.key.clone())?;
                check_reference(&declarations, &index, &from, reference)?;
            }
        }

        check_role_bindings(&declarations, &index)?;

        let order = topological_order(&declarations, &index)?;
        let mut slots: Vec<Option<ResourceDeclaration>> =
            declarations.into_iter().map(Some).collect();
        let declarations = order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect();

        Ok(Self {
            declarations,
            outputs,
        })
    }

    /// All declarations in provisioning order
    pub fn declarations(&self) -> &[ResourceDeclaration] {
        &self.declarations
    }

    /// Stack outputs
    pub fn outputs(&self) -> &[StackOutput] {
        &self.outputs
    }

    /// Look up a declaration by logical id
    pub fn get(&self, logical_id: &LogicalId) -> Option<&ResourceDeclaration> {
        self.declarations
            .iter()
            .find(|d| &d.logical_id == logical_id)
    }

    /// Declarations the deployment engine provisions natively
    pub fn native(&self) -> impl Iterator<Item = &ResourceDeclaration> {
        self.declarations.iter().filter(|d| d.kind().is_native())
    }

    /// Bootstrap actions in provisioning order
    pub fn bootstrap_actions(&self) -> impl Iterator<Item = (&LogicalId, &BootstrapActionSpec)> {
        self.declarations.iter().filter_map(|d| match &d.spec {
            ResourceSpec::BootstrapAction(spec) => Some((&d.logical_id, spec)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

fn index_declarations(
    declarations: &[ResourceDeclaration],
) -> Result<HashMap<LogicalId, usize>, GraphError> {
    let mut index = HashMap::with_capacity(declarations.len());
    for (i, decl) in declarations.iter().enumerate() {
        if index.insert(decl.logical_id.clone(), i).is_some() {
            return Err(GraphError::DuplicateLogicalId(decl.logical_id.clone()));
        }
    }
    Ok(index)
}

fn check_reference(
    declarations: &[ResourceDeclaration],
    index: &HashMap<LogicalId, usize>,
    from: &LogicalId,
    reference: &OutputRef,
) -> Result<(), GraphError> {
    let Some(&target) = index.get(&reference.target) else {
        return Err(GraphError::DanglingReference {
            from: from.clone(),
            target: reference.target.clone(),
        });
    };
    let kind = declarations[target].kind();
    if !reference.attribute.exposed_by(kind) {
        return Err(GraphError::UnsupportedAttribute {
            from: from.clone(),
            target: reference.target.clone(),
            kind,
            attribute: reference.attribute,
        });
    }
    Ok(())
}

fn expect_kind<'a>(
    declarations: &'a [ResourceDeclaration],
    index: &HashMap<LogicalId, usize>,
    from: &LogicalId,
    target: &LogicalId,
    expected: ResourceKind,
) -> Result<&'a ResourceDeclaration, GraphError> {
    // references were resolved before this runs
    let decl = &declarations[index[target]];
    if decl.kind() != expected {
        return Err(GraphError::KindMismatch {
            from: from.clone(),
            target: target.clone(),
            expected,
            found: decl.kind(),
        });
    }
    Ok(decl)
}

/// A role mapped onto an identity pool must trust that same pool
fn check_role_bindings(
    declarations: &[ResourceDeclaration],
    index: &HashMap<LogicalId, usize>,
) -> Result<(), GraphError> {
    for decl in declarations {
        if let ResourceSpec::IamRole(role_spec) = &decl.spec {
            expect_kind(
                declarations,
                index,
                &decl.logical_id,
                &role_spec.trust.identity_pool.target,
                ResourceKind::IdentityPool,
            )?;
        }
    }

    for decl in declarations {
        let ResourceSpec::IdentityPoolRoleAttachment(attachment) = &decl.spec else {
            continue;
        };
        let pool = &attachment.identity_pool.target;
        expect_kind(
            declarations,
            index,
            &decl.logical_id,
            pool,
            ResourceKind::IdentityPool,
        )?;

        let role_id = &attachment.unauthenticated_role.target;
        let role = expect_kind(
            declarations,
            index,
            &decl.logical_id,
            role_id,
            ResourceKind::IamRole,
        )?;
        if let ResourceSpec::IamRole(role_spec) = &role.spec {
            let trusted = &role_spec.trust.identity_pool.target;
            if trusted != pool {
                return Err(GraphError::TrustMismatch {
                    role: role_id.clone(),
                    attached_pool: pool.clone(),
                    trusted_pool: trusted.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Kahn's algorithm; ties broken by kind tier, then declaration order
fn topological_order(
    declarations: &[ResourceDeclaration],
    index: &HashMap<LogicalId, usize>,
) -> Result<Vec<usize>, GraphError> {
    let n = declarations.len();
    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, decl) in declarations.iter().enumerate() {
        let deps: BTreeSet<usize> = decl
            .spec
            .references()
            .iter()
            .map(|r| index[&r.target])
            .collect();
        in_degree[i] = deps.len();
        for dep in deps {
            dependents[dep].push(i);
        }
    }

    let tier = |i: usize| declarations[i].kind().provision_tier();
    let mut ready: BTreeSet<(u8, usize)> = (0..n)
        .filter(|&i| in_degree[i] == 0)
        .map(|i| (tier(i), i))
        .collect();
    let mut order = Vec::with_capacity(n);

    while let Some((_, i)) = ready.pop_first() {
        order.push(i);
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert((tier(dependent), dependent));
            }
        }
    }

    if order.len() < n {
        let stuck = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| declarations[i].logical_id.clone())
            .collect();
        return Err(GraphError::Cycle(stuck));
    }
    Ok(order)
}
