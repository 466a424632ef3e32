//! Captured directional images.
//!
//! Images arrive from the robot as JPEG data URIs tagged with the camera
//! direction. Their order matters: the describe phase attributes response *i*
//! to image *i*.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// One image captured by the robot, tagged with the direction it faces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedImage {
    /// Camera direction, e.g. "front", "left", "right"
    #[serde(alias = "position")]
    pub sector_tag: String,

    /// Encoded image bytes (JPEG). Travels as a data URI on the wire.
    #[serde(
        rename = "image_uri",
        serialize_with = "serialize_data_uri",
        deserialize_with = "deserialize_data_uri"
    )]
    pub encoded_image: Vec<u8>,
}

impl CapturedImage {
    pub fn new(sector_tag: impl Into<String>, encoded_image: Vec<u8>) -> Self {
        Self {
            sector_tag: sector_tag.into(),
            encoded_image,
        }
    }

    /// Parse a `data:image/jpeg;base64,...` URI, or a bare base64 payload.
    pub fn from_data_uri(sector_tag: impl Into<String>, uri: &str) -> Result<Self, String> {
        Ok(Self::new(sector_tag, decode_data_uri(uri)?))
    }

    /// The image as a JPEG data URI, as sent to vision models.
    pub fn data_uri(&self) -> String {
        format!("{JPEG_DATA_URI_PREFIX}{}", self.base64())
    }

    /// The bare base64 payload.
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.encoded_image)
    }
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, String> {
    let payload = match uri.split_once(";base64,") {
        Some((_, data)) => data,
        None => uri,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 image payload: {e}"))
}

fn serialize_data_uri<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    let uri = format!("{JPEG_DATA_URI_PREFIX}{}", STANDARD.encode(bytes));
    serializer.serialize_str(&uri)
}

fn deserialize_data_uri<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let uri = String::deserialize(deserializer)?;
    decode_data_uri(&uri).map_err(serde::de::Error::custom)
}
