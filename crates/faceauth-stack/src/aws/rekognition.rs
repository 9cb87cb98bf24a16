//! Rekognition face collection bootstrap

use crate::aws::context::AwsContext;
use crate::aws::error::classify_sdk_error;
use anyhow::{Context, Result};
use aws_sdk_rekognition::Client;
use tracing::{debug, info};

/// Outcome of creating a face collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// Collection was created
    Created { arn: Option<String> },
    /// Collection already existed; nothing changed
    AlreadyExists,
}

/// Rekognition client for collection management
pub struct RekognitionClient {
    client: Client,
}

impl RekognitionClient {
    /// Create a Rekognition client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.rekognition_client(),
        }
    }

    /// Create a face collection; an existing collection is not an error
    pub async fn create_collection(&self, collection_id: &str) -> Result<CollectionOutcome> {
        info!(collection_id = %collection_id, "Creating face collection");

        match self
            .client
            .create_collection()
            .collection_id(collection_id)
            .send()
            .await
        {
            Ok(response) => {
                debug!(
                    collection_id = %collection_id,
                    face_model_version = response.face_model_version().unwrap_or("unknown"),
                    "Face collection created"
                );
                Ok(CollectionOutcome::Created {
                    arn: response.collection_arn().map(|s| s.to_string()),
                })
            }
            Err(e) => {
                let classified = classify_sdk_error(&e);
                if classified.is_already_exists() {
                    info!(collection_id = %collection_id, "Face collection already exists");
                    return Ok(CollectionOutcome::AlreadyExists);
                }
                Err(anyhow::Error::new(classified))
                    .with_context(|| format!("Failed to create collection {}", collection_id))
            }
        }
    }
}

/// Trait for collection operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait CollectionOperations: Send + Sync {
    /// Create a face collection, tolerating one that already exists
    async fn create_collection(&self, collection_id: &str) -> Result<CollectionOutcome>;
}

impl CollectionOperations for RekognitionClient {
    async fn create_collection(&self, collection_id: &str) -> Result<CollectionOutcome> {
        RekognitionClient::create_collection(self, collection_id).await
    }
}
