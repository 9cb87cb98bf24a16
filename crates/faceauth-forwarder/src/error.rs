//! Handler error types

use crate::provider::ProviderError;
use thiserror::Error;

/// Whether an error is the caller's fault or the provider's
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing image or no face found (400)
    Validation,
    /// Unreadable payload or provider failure (500)
    Provider,
}

/// Everything that can go wrong in a face handler
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Event is not a JSON object
    #[error("Invalid event: {0}")]
    InvalidEvent(#[source] serde_json::Error),

    /// Required event field is absent or null
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Event field holds something other than a string
    #[error("Invalid type for {field}: expected a string, found {found}")]
    InvalidType {
        field: &'static str,
        found: &'static str,
    },

    /// Provider found no face in the image
    #[error("Nenhum rosto detectado.")]
    NoFaceDetected,

    /// Image payload is not valid base64
    #[error("{0}")]
    Decode(#[from] base64::DecodeError),

    /// Provider call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl HandlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandlerError::MissingField(_) | HandlerError::NoFaceDetected => ErrorKind::Validation,
            HandlerError::InvalidEvent(_)
            | HandlerError::InvalidType { .. }
            | HandlerError::Decode(_)
            | HandlerError::Provider(_) => ErrorKind::Provider,
        }
    }

    /// HTTP-style status code for the response
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Provider => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(HandlerError::MissingField("image_base64").status_code(), 400);
        assert_eq!(HandlerError::NoFaceDetected.status_code(), 400);
        assert_eq!(
            HandlerError::InvalidType {
                field: "image_base64",
                found: "number"
            }
            .status_code(),
            500
        );
        assert_eq!(
            HandlerError::Decode(base64::DecodeError::InvalidPadding).status_code(),
            500
        );
        let provider = ProviderError::Service {
            operation: "IndexFaces",
            code: "InvalidParameterException".to_string(),
            message: "Request has invalid parameters".to_string(),
        };
        assert_eq!(HandlerError::from(provider).status_code(), 500);
    }

    #[test]
    fn test_provider_message_passes_through() {
        let err = HandlerError::from(ProviderError::Service {
            operation: "SearchFacesByImage",
            code: "ResourceNotFoundException".to_string(),
            message: "The collection id: missing does not exist".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "An error occurred (ResourceNotFoundException) when calling the SearchFacesByImage operation: The collection id: missing does not exist"
        );
    }
}
