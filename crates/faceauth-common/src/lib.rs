//! faceauth-common - Shared types and constants
//!
//! This crate holds the contract shared by the stack builder and the face
//! handlers, without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Collection identifier and handler defaults
//! - [`resource_kind`]: Kinds of declared resources and their provisioning order
//! - [`tags`]: Resource tag constants applied to deployed stacks

pub mod defaults;
pub mod resource_kind;
pub mod tags;

pub use defaults::COLLECTION_ID;
pub use resource_kind::ResourceKind;
