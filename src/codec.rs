//! JSON encoding and decoding for post data.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("cannot serialize value: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("malformed JSON: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Compact JSON text for `value`.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(CodecError::Serialize)
}

/// Indented JSON text for `value`.
pub fn encode_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string_pretty(value).map_err(CodecError::Serialize)
}

pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Parse)
}
