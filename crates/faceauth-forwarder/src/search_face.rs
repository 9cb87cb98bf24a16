//! SearchFaceByImage handler
//!
//! Searches `collection_id` for the best match of the face in `image_base64`
//! and returns the provider response as-is.

use crate::error::HandlerError;
use crate::event::{FaceEvent, FaceResponse, decode_image, text_field};
use crate::provider::{FaceProvider, FaceSearchResult, SearchFacesRequest};
use faceauth_common::defaults::{SEARCH_MATCH_THRESHOLD, SEARCH_MAX_FACES};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Handle a raw invocation payload
pub async fn handle_value<P: FaceProvider>(provider: &P, payload: Value) -> FaceResponse {
    match FaceEvent::from_value(payload) {
        Ok(event) => handle(provider, event).await,
        Err(e) => error_response(&e),
    }
}

/// Search for the face in `event`
pub async fn handle<P: FaceProvider>(provider: &P, event: FaceEvent) -> FaceResponse {
    match search(provider, event).await {
        Ok(result) => {
            info!(matches = result.face_matches.len(), "Face search complete");
            FaceResponse::json(200, &result)
        }
        Err(e) => error_response(&e),
    }
}

async fn search<P: FaceProvider>(
    provider: &P,
    event: FaceEvent,
) -> Result<FaceSearchResult, HandlerError> {
    let collection_id = event
        .collection_id
        .ok_or(HandlerError::MissingField("collection_id"))?;
    let encoded = event
        .image_base64
        .ok_or(HandlerError::MissingField("image_base64"))?;
    let image = decode_image(&text_field("image_base64", encoded)?)?;
    let collection_id = text_field("collection_id", collection_id)?;

    Ok(provider
        .search_faces_by_image(SearchFacesRequest {
            collection_id,
            image,
            max_faces: SEARCH_MAX_FACES,
            face_match_threshold: SEARCH_MATCH_THRESHOLD,
        })
        .await?)
}

fn error_response(e: &HandlerError) -> FaceResponse {
    warn!(error = %e, status = e.status_code(), "SearchFaceByImage failed");
    match e {
        HandlerError::MissingField("image_base64") => {
            FaceResponse::json(e.status_code(), "Erro: Nenhuma imagem Base64 fornecida.")
        }
        other => FaceResponse::json(
            other.status_code(),
            &ErrorBody {
                error: other.to_string(),
            },
        ),
    }
}
