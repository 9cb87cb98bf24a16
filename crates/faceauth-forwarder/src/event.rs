//! Handler event and response shapes

use crate::body::to_body;
use crate::error::HandlerError;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

/// Flat invocation payload shared by both handlers
///
/// Unknown fields are ignored; a `null` field counts as absent. Field types
/// are only checked when a handler reads the field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FaceEvent {
    #[serde(default)]
    pub image_base64: Option<Value>,
    #[serde(default)]
    pub external_id: Option<Value>,
    #[serde(default)]
    pub collection_id: Option<Value>,
}

impl FaceEvent {
    /// Parse a raw invocation payload
    pub fn from_value(value: Value) -> Result<Self, HandlerError> {
        serde_json::from_value(value).map_err(HandlerError::InvalidEvent)
    }
}

/// Read a present event field as a string
pub fn text_field(field: &'static str, value: Value) -> Result<String, HandlerError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(HandlerError::InvalidType {
            field,
            found: json_type(&other),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64 image payload
///
/// Characters outside the base64 alphabet (line breaks, spaces) are
/// discarded. Decoding stops at the first padding run that completes a
/// quad; stray `=` before that point is ignored. Unpadded input whose
/// length is not a multiple of four is rejected.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>, HandlerError> {
    let mut data = String::with_capacity(encoded.len());
    let mut pads = 0;
    let mut terminated = false;
    for c in encoded.chars() {
        if c == '=' {
            let quad_pos = data.len() % 4;
            if quad_pos >= 2 {
                pads += 1;
                if quad_pos + pads >= 4 {
                    terminated = true;
                    break;
                }
            }
        } else if c.is_ascii_alphanumeric() || c == '+' || c == '/' {
            data.push(c);
            pads = 0;
        }
    }

    match data.len() % 4 {
        0 => {}
        1 => return Err(base64::DecodeError::InvalidLength(data.len()).into()),
        _ if !terminated => return Err(base64::DecodeError::InvalidPadding.into()),
        _ => {}
    }
    Ok(LENIENT.decode(data)?)
}

/// Handler result returned to the Lambda runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceResponse {
    pub status_code: u16,
    /// JSON document encoded as a string
    pub body: String,
}

impl FaceResponse {
    /// Build a response whose body is `value` serialized as JSON
    pub fn json<T>(status_code: u16, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        match to_body(value) {
            Ok(body) => Self { status_code, body },
            Err(e) => {
                error!(error = %e, "Failed to serialize response body");
                Self {
                    status_code: 500,
                    body: to_body(&format!("Erro: {e}")).unwrap_or_default(),
                }
            }
        }
    }
}
