//! AWS error classification
//!
//! Classifies SDK errors from their `.code()` and `.message()` metadata
//! instead of string matching on the Debug format.

use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use thiserror::Error;

/// AWS error categories relevant to provisioning
#[derive(Debug, Error)]
pub enum AwsError {
    /// Stack or resource does not exist
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Resource already exists (safe to ignore in create operations)
    #[error("Resource already exists: {message}")]
    AlreadyExists { message: String },

    /// Stack update would not change anything
    #[error("No updates are to be performed")]
    NoUpdates,

    /// Generic AWS SDK error with code and message
    #[error("AWS error{}: {message}", code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists { .. })
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException", "StackNotFoundException"];

/// Known AWS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &[
    "ResourceAlreadyExistsException",
    "AlreadyExistsException",
];

/// CloudFormation reports a missing stack as a validation error
const STACK_MISSING_MESSAGE: &str = "does not exist";

/// CloudFormation reports an empty update as a validation error
const NO_UPDATES_MESSAGE: &str = "No updates are to be performed";

/// Classify an AWS error from its code and message.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists { message },
        Some("ValidationError") if message.contains(NO_UPDATES_MESSAGE) => AwsError::NoUpdates,
        Some("ValidationError") if message.contains(STACK_MISSING_MESSAGE) => {
            AwsError::NotFound { message }
        }
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK error that carries error metadata.
///
/// Works for both `SdkError<E>` and the modeled operation errors of every
/// service crate.
pub fn classify_sdk_error<E: ProvideErrorMetadata>(error: &E) -> AwsError {
    let meta = error.meta();
    classify_aws_error(meta.code(), meta.message())
}
