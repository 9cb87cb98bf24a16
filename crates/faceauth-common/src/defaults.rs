//! Default values shared between the stack builder and the face handlers
//!
//! The collection identifier is the textual contract between provisioning and
//! runtime: the bootstrap action creates this collection and the index handler
//! writes into it.

/// Face collection created at deploy time and used by the index handler
pub const COLLECTION_ID: &str = "FaceAuthCollection";

/// External image id recorded when the caller does not supply one
pub const DEFAULT_EXTERNAL_ID: &str = "unknown";

/// Facial attributes requested when indexing a face
pub const DETECTION_ATTRIBUTES: &[&str] = &["DEFAULT"];

/// Maximum number of matches requested from a face search
pub const SEARCH_MAX_FACES: i32 = 1;

/// Minimum similarity (percent) for a face search match
pub const SEARCH_MATCH_THRESHOLD: f32 = 90.0;

/// Default AWS region for the stack CLI
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default deploy timeout in seconds
pub const DEFAULT_DEPLOY_TIMEOUT_SECS: u64 = 1800;

/// Returns the default external image id
pub fn default_external_id() -> String {
    DEFAULT_EXTERNAL_ID.to_string()
}
