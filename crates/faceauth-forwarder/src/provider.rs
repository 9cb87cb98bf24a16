//! Face provider abstraction
//!
//! Response types keep the provider's own field names so a search result
//! can be returned to callers as the provider shaped it. Response metadata
//! carries the request id and status only; the SDK does not expose raw
//! HTTP headers or retry counts on operation outputs.

use serde::Serialize;
use thiserror::Error;

/// Failure reported by a face provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Service rejected the call
    #[error("An error occurred ({code}) when calling the {operation} operation: {message}")]
    Service {
        operation: &'static str,
        code: String,
        message: String,
    },

    /// Call never produced a service response (network, credentials, timeout)
    #[error("{0}")]
    Transport(String),

    /// Service response lacks a field the handler needs
    #[error("{operation} response is missing {field}")]
    MalformedResponse {
        operation: &'static str,
        field: &'static str,
    },
}

/// Add a face to a collection
#[derive(Debug, Clone, PartialEq)]
pub struct IndexFacesRequest {
    pub collection_id: String,
    pub image: Vec<u8>,
    pub external_image_id: String,
    pub detection_attributes: Vec<String>,
}

/// One face added by an index call
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedFace {
    pub face_id: String,
}

/// Search a collection for the largest face in an image
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFacesRequest {
    pub collection_id: String,
    pub image: Vec<u8>,
    pub max_faces: i32,
    pub face_match_threshold: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoundingBox {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f32>,
}

/// Stored face metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Face {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_faces_model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaceMatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<Face>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseMetadata {
    #[serde(rename = "RequestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(rename = "HTTPStatusCode")]
    pub http_status_code: u16,
}

/// Search response as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaceSearchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searched_face_bounding_box: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searched_face_confidence: Option<f32>,
    pub face_matches: Vec<FaceMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_metadata: Option<ResponseMetadata>,
}

/// Face operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait FaceProvider: Send + Sync {
    /// Detect faces in an image and add them to a collection
    async fn index_faces(
        &self,
        request: IndexFacesRequest,
    ) -> Result<Vec<IndexedFace>, ProviderError>;

    /// Search a collection for faces matching the largest face in an image
    async fn search_faces_by_image(
        &self,
        request: SearchFacesRequest,
    ) -> Result<FaceSearchResult, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::to_body;

    #[test]
    fn test_search_result_field_names() {
        let result = FaceSearchResult {
            searched_face_bounding_box: Some(BoundingBox {
                width: Some(0.5),
                height: Some(0.25),
                left: Some(0.125),
                top: Some(0.0625),
            }),
            searched_face_confidence: Some(99.5),
            face_matches: vec![FaceMatch {
                similarity: Some(98.0),
                face: Some(Face {
                    face_id: Some("f-1".to_string()),
                    external_image_id: Some("user-1".to_string()),
                    user_id: Some("user-9".to_string()),
                    ..Default::default()
                }),
            }],
            face_model_version: Some("7.0".to_string()),
            response_metadata: None,
        };

        assert_eq!(
            to_body(&result).unwrap(),
            concat!(
                r#"{"SearchedFaceBoundingBox": {"Width": 0.5, "Height": 0.25, "Left": 0.125, "Top": 0.0625}, "#,
                r#""SearchedFaceConfidence": 99.5, "#,
                r#""FaceMatches": [{"Similarity": 98.0, "Face": {"FaceId": "f-1", "ExternalImageId": "user-1", "UserId": "user-9"}}], "#,
                r#""FaceModelVersion": "7.0"}"#
            )
        );
    }

    #[test]
    fn test_empty_search_result() {
        let result = FaceSearchResult {
            response_metadata: Some(ResponseMetadata {
                request_id: Some("req-1".to_string()),
                http_status_code: 200,
            }),
            ..Default::default()
        };
        assert_eq!(
            to_body(&result).unwrap(),
            r#"{"FaceMatches": [], "ResponseMetadata": {"RequestId": "req-1", "HTTPStatusCode": 200}}"#
        );
    }
}
