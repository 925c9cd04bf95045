//! Serde helpers for optional binary blobs that travel over JSON as base64 strings, such as rendered QR code images.
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(bytes) => serializer.serialize_str(&base64::encode(bytes)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
    let encoded = Option::<String>::deserialize(deserializer)?;
    match encoded {
        Some(s) if !s.is_empty() => base64::decode(s).map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Decodes a base64 image as supplied by the payment gateway. Invalid or empty data is treated as "no image".
pub fn decode_image(encoded: Option<&str>) -> Option<Vec<u8>> {
    encoded.filter(|s| !s.is_empty()).and_then(|s| base64::decode(s).ok())
}
