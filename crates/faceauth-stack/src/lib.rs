//! faceauth-stack - Declarative stack definition for face-auth
//!
//! Builds the face-auth infrastructure as a typed resource graph (user pool,
//! app client, identity pool, unauthenticated role, role attachment and the
//! face collection bootstrap action), renders it as a CloudFormation template
//! and provisions it.

pub mod aws;
pub mod builder;
pub mod context;
pub mod error;
pub mod graph;
pub mod policy;
pub mod provision;
pub mod template;
pub mod wait;

pub use builder::ResourceGraphBuilder;
pub use context::{StackConfig, StackContext};
pub use error::{ConfigError, GraphError};
pub use graph::ResourceGraph;
