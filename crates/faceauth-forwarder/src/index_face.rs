//! IndexFace handler
//!
//! Adds the face in `image_base64` to the shared face collection and returns
//! the id assigned to it.

use crate::error::HandlerError;
use crate::event::{FaceEvent, FaceResponse, decode_image, text_field};
use crate::provider::{FaceProvider, IndexFacesRequest};
use faceauth_common::COLLECTION_ID;
use faceauth_common::defaults::{DETECTION_ATTRIBUTES, default_external_id};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct IndexedFaceBody<'a> {
    #[serde(rename = "faceId")]
    face_id: &'a str,
}

/// Handle a raw invocation payload
pub async fn handle_value<P: FaceProvider>(provider: &P, payload: Value) -> FaceResponse {
    match FaceEvent::from_value(payload) {
        Ok(event) => handle(provider, event).await,
        Err(e) => error_response(&e),
    }
}

/// Index the face in `event` into the shared collection
pub async fn handle<P: FaceProvider>(provider: &P, event: FaceEvent) -> FaceResponse {
    match index(provider, event).await {
        Ok(face_id) => {
            info!(face_id = %face_id, "Face indexed");
            FaceResponse::json(200, &IndexedFaceBody { face_id: &face_id })
        }
        Err(e) => error_response(&e),
    }
}

async fn index<P: FaceProvider>(provider: &P, event: FaceEvent) -> Result<String, HandlerError> {
    let encoded = event
        .image_base64
        .ok_or(HandlerError::MissingField("image_base64"))?;
    let image = decode_image(&text_field("image_base64", encoded)?)?;
    let external_image_id = match event.external_id {
        Some(value) => text_field("external_id", value)?,
        None => default_external_id(),
    };

    let faces = provider
        .index_faces(IndexFacesRequest {
            collection_id: COLLECTION_ID.to_string(),
            image,
            external_image_id,
            detection_attributes: DETECTION_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
        })
        .await?;

    faces
        .into_iter()
        .next()
        .map(|face| face.face_id)
        .ok_or(HandlerError::NoFaceDetected)
}

fn error_response(e: &HandlerError) -> FaceResponse {
    warn!(error = %e, status = e.status_code(), "IndexFace failed");
    let message = match e {
        HandlerError::MissingField(_) => "Erro: Nenhuma imagem fornecida".to_string(),
        HandlerError::NoFaceDetected => e.to_string(),
        other => format!("Erro: {other}"),
    };
    FaceResponse::json(e.status_code(), &message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{IndexedFace, MockFaceProvider, ProviderError};
    use serde_json::json;

    const FACE_ID: &str = "8b6a2c8e-2b3c-4d5e-9f10-1a2b3c4d5e6f";

    fn face(id: &str) -> IndexedFace {
        IndexedFace {
            face_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_indexes_first_face() {
        let mut provider = MockFaceProvider::new();
        provider
            .expect_index_faces()
            .withf(|req| {
                req.collection_id == "FaceAuthCollection"
                    && req.image == b"hello"
                    && req.external_image_id == "unknown"
                    && req.detection_attributes == vec!["DEFAULT".to_string()]
            })
            .times(1)
            .returning(|_| Ok(vec![face(FACE_ID), face("other")]));

        let response = handle(
            &provider,
            FaceEvent {
                image_base64: Some(json!("aGVsbG8=")),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            format!(r#"{{"statusCode":200,"body":"{{\"faceId\": \"{FACE_ID}\"}}"}}"#)
        );
    }

    #[tokio::test]
    async fn test_external_id_forwarded() {
        let mut provider = MockFaceProvider::new();
        provider
            .expect_index_faces()
            .withf(|req| req.external_image_id == "user-42")
            .times(1)
            .returning(|_| Ok(vec![face(FACE_ID)]));

        let response = handle_value(
            &provider,
            json!({ "image_base64": "aGVsbG8=", "external_id": "user-42" }),
        )
        .await;
        assert_eq!(response.status_code, 200);
    }

    #[tokio::test]
    async fn test_missing_image() {
        let mut provider = MockFaceProvider::new();
        provider.expect_index_faces().never();

        let response = handle_value(&provider, json!({})).await;
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"statusCode":400,"body":"\"Erro: Nenhuma imagem fornecida\""}"#
        );
    }

    #[tokio::test]
    async fn test_no_face_detected() {
        let mut provider = MockFaceProvider::new();
        provider.expect_index_faces().returning(|_| Ok(vec![]));

        let response = handle_value(&provider, json!({ "image_base64": "aGVsbG8=" })).await;
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#""Nenhum rosto detectado.""#);
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let mut provider = MockFaceProvider::new();
        provider.expect_index_faces().returning(|_| {
            Err(ProviderError::Service {
                operation: "IndexFaces",
                code: "ResourceNotFoundException".to_string(),
                message: "The collection id: FaceAuthCollection does not exist".to_string(),
            })
        });

        let response = handle_value(&provider, json!({ "image_base64": "aGVsbG8=" })).await;
        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.body,
            r#""Erro: An error occurred (ResourceNotFoundException) when calling the IndexFaces operation: The collection id: FaceAuthCollection does not exist""#
        );
    }

    #[tokio::test]
    async fn test_invalid_base64() {
        let mut provider = MockFaceProvider::new();
        provider.expect_index_faces().never();

        let response = handle_value(&provider, json!({ "image_base64": "aGVsbG8" })).await;
        assert_eq!(response.status_code, 500);
        assert!(response.body.starts_with(r#""Erro: "#));
    }

    #[tokio::test]
    async fn test_lenient_padding_accepted() {
        let mut provider = MockFaceProvider::new();
        provider
            .expect_index_faces()
            .withf(|req| req.image == b"hello")
            .times(1)
            .returning(|_| Ok(vec![face(FACE_ID)]));

        let response = handle_value(&provider, json!({ "image_base64": "aGVsbG8===" })).await;
        assert_eq!(response.status_code, 200);
    }

    #[tokio::test]
    async fn test_wrongly_typed_image() {
        let mut provider = MockFaceProvider::new();
        provider.expect_index_faces().never();

        let response = handle_value(&provider, json!({ "image_base64": 42 })).await;
        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.body,
            r#""Erro: Invalid type for image_base64: expected a string, found number""#
        );
    }

    #[tokio::test]
    async fn test_wrongly_typed_external_id() {
        let mut provider = MockFaceProvider::new();
        provider.expect_index_faces().never();

        let response = handle_value(
            &provider,
            json!({ "image_base64": "aGVsbG8=", "external_id": 7 }),
        )
        .await;
        assert_eq!(response.status_code, 500);
        assert!(response.body.starts_with(r#""Erro: Invalid type for external_id"#));
    }

    #[tokio::test]
    async fn test_null_image_is_missing() {
        let mut provider = MockFaceProvider::new();
        provider.expect_index_faces().never();

        let response = handle_value(&provider, json!({ "image_base64": null })).await;
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#""Erro: Nenhuma imagem fornecida""#);
    }

    #[tokio::test]
    async fn test_non_object_event() {
        let mut provider = MockFaceProvider::new();
        provider.expect_index_faces().never();

        let response = handle_value(&provider, json!("not an object")).await;
        assert_eq!(response.status_code, 500);
        assert!(response.body.starts_with(r#""Erro: Invalid event"#));
    }
}
