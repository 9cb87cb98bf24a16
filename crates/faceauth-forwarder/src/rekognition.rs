//! Rekognition-backed face provider

use crate::provider::{
    BoundingBox, Face, FaceMatch, FaceProvider, FaceSearchResult, IndexFacesRequest, IndexedFace,
    ProviderError, ResponseMetadata, SearchFacesRequest,
};
use aws_config::SdkConfig;
use aws_sdk_rekognition::Client;
use aws_sdk_rekognition::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_rekognition::operation::RequestId;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::{self, Attribute, Image};
use tracing::debug;

/// Face provider calling Rekognition directly
///
/// Built once per process and shared by every invocation.
pub struct RekognitionProvider {
    client: Client,
}

impl RekognitionProvider {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

impl ProviderError {
    /// Classify an SDK error by its service error code
    fn from_sdk<E>(operation: &'static str, error: &E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        match error.code() {
            Some(code) => ProviderError::Service {
                operation,
                code: code.to_string(),
                message: error.message().unwrap_or_default().to_string(),
            },
            None => ProviderError::Transport(DisplayErrorContext(error).to_string()),
        }
    }
}

fn image(bytes: Vec<u8>) -> Image {
    Image::builder().bytes(Blob::new(bytes)).build()
}

fn bounding_box(b: &types::BoundingBox) -> BoundingBox {
    BoundingBox {
        width: b.width(),
        height: b.height(),
        left: b.left(),
        top: b.top(),
    }
}

fn face(f: &types::Face) -> Face {
    Face {
        face_id: f.face_id().map(str::to_string),
        bounding_box: f.bounding_box().map(bounding_box),
        image_id: f.image_id().map(str::to_string),
        external_image_id: f.external_image_id().map(str::to_string),
        confidence: f.confidence(),
        index_faces_model_version: f.index_faces_model_version().map(str::to_string),
        user_id: f.user_id().map(str::to_string),
    }
}

impl FaceProvider for RekognitionProvider {
    async fn index_faces(
        &self,
        request: IndexFacesRequest,
    ) -> Result<Vec<IndexedFace>, ProviderError> {
        const OPERATION: &str = "IndexFaces";

        let attributes = request
            .detection_attributes
            .iter()
            .map(|a| Attribute::from(a.as_str()))
            .collect();

        let response = self
            .client
            .index_faces()
            .collection_id(&request.collection_id)
            .image(image(request.image))
            .external_image_id(&request.external_image_id)
            .set_detection_attributes(Some(attributes))
            .send()
            .await
            .map_err(|e| ProviderError::from_sdk(OPERATION, &e))?;

        debug!(
            request_id = response.request_id().unwrap_or("unknown"),
            face_records = response.face_records().len(),
            unindexed = response.unindexed_faces().len(),
            "IndexFaces complete"
        );

        response
            .face_records()
            .iter()
            .map(|record| {
                let face = record.face().ok_or(ProviderError::MalformedResponse {
                    operation: OPERATION,
                    field: "Face",
                })?;
                let face_id = face.face_id().ok_or(ProviderError::MalformedResponse {
                    operation: OPERATION,
                    field: "FaceId",
                })?;
                Ok(IndexedFace {
                    face_id: face_id.to_string(),
                })
            })
            .collect()
    }

    async fn search_faces_by_image(
        &self,
        request: SearchFacesRequest,
    ) -> Result<FaceSearchResult, ProviderError> {
        let response = self
            .client
            .search_faces_by_image()
            .collection_id(&request.collection_id)
            .image(image(request.image))
            .max_faces(request.max_faces)
            .face_match_threshold(request.face_match_threshold)
            .send()
            .await
            .map_err(|e| ProviderError::from_sdk("SearchFacesByImage", &e))?;

        let result = FaceSearchResult {
            searched_face_bounding_box: response.searched_face_bounding_box().map(bounding_box),
            searched_face_confidence: response.searched_face_confidence(),
            face_matches: response
                .face_matches()
                .iter()
                .map(|m| FaceMatch {
                    similarity: m.similarity(),
                    face: m.face().map(face),
                })
                .collect(),
            face_model_version: response.face_model_version().map(str::to_string),
            // Only successful responses reach this point
            response_metadata: Some(ResponseMetadata {
                request_id: response.request_id().map(str::to_string),
                http_status_code: 200,
            }),
        };

        debug!(
            request_id = response.request_id().unwrap_or("unknown"),
            matches = result.face_matches.len(),
            "SearchFacesByImage complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_rekognition::error::ErrorMetadata;

    #[test]
    fn test_service_error_message() {
        let meta = ErrorMetadata::builder()
            .code("InvalidParameterException")
            .message("Request has invalid parameters")
            .build();
        let err = ProviderError::from_sdk("IndexFaces", &meta);
        assert_eq!(
            err.to_string(),
            "An error occurred (InvalidParameterException) when calling the IndexFaces operation: Request has invalid parameters"
        );
    }

    #[test]
    fn test_error_without_code() {
        let meta = ErrorMetadata::builder().message("dispatch failure").build();
        let err = ProviderError::from_sdk("IndexFaces", &meta);
        assert!(matches!(err, ProviderError::Transport(_)));
    }

    #[test]
    fn test_face_conversion() {
        let sdk_face = types::Face::builder()
            .face_id("f-1")
            .external_image_id("user-1")
            .confidence(99.5)
            .bounding_box(types::BoundingBox::builder().width(0.5).top(0.25).build())
            .build();
        let converted = face(&sdk_face);
        assert_eq!(converted.face_id.as_deref(), Some("f-1"));
        assert_eq!(converted.external_image_id.as_deref(), Some("user-1"));
        assert_eq!(converted.confidence, Some(99.5));
        let bbox = converted.bounding_box.unwrap();
        assert_eq!(bbox.width, Some(0.5));
        assert_eq!(bbox.left, None);
    }

    #[test]
    fn test_face_user_id_kept() {
        let sdk_face = types::Face::builder()
            .face_id("f-1")
            .user_id("user-9")
            .build();
        assert_eq!(
            crate::body::to_body(&face(&sdk_face)).unwrap(),
            r#"{"FaceId": "f-1", "UserId": "user-9"}"#
        );
    }
}
