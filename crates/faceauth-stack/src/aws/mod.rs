//! AWS client modules for stack provisioning
//!
//! This module provides wrappers around AWS SDK clients for:
//! - CloudFormation: stack create/update/delete and status polling
//! - Rekognition: face collection bootstrap

pub mod cloudformation;
pub mod context;
pub mod error;
pub mod rekognition;

pub use cloudformation::{
    CloudFormationClient, StackChange, StackDescription, StackOperations, StackPhase,
};
pub use context::AwsContext;
pub use error::{AwsError, classify_aws_error, classify_sdk_error};
pub use rekognition::{CollectionOperations, CollectionOutcome, RekognitionClient};

#[cfg(test)]
pub use cloudformation::MockStackOperations;
#[cfg(test)]
pub use rekognition::MockCollectionOperations;
