//! faceauth-forwarder - Lambda handlers for face indexing and search
//!
//! Each handler validates a flat JSON event, decodes the base64 image,
//! makes exactly one Rekognition call and shapes the result into a
//! `{statusCode, body}` response. Failures never escape to the runtime.
//!
//! ## Modules
//!
//! - [`index_face`]: Add a face to the shared collection
//! - [`search_face`]: Find the best match for a face in a collection
//! - [`provider`]: Face provider trait and its request/response types
//! - [`rekognition`]: Provider backed by the Rekognition SDK
//! - [`body`]: Response body serialization

pub mod body;
pub mod error;
pub mod event;
pub mod index_face;
pub mod logging;
pub mod provider;
pub mod rekognition;
pub mod search_face;

pub use error::{ErrorKind, HandlerError};
pub use event::{FaceEvent, FaceResponse};
pub use provider::FaceProvider;
