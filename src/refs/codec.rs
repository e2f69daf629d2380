//! # Value Codecs
//!
//! Conversion between the API representation of a referenced value and the
//! way the target kind stores it. Secrets keep their data base64 encoded;
//! every other kind stores values verbatim.

use crate::schema::KubeType;
use crate::unstructured::type_name;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("expected a string for secret data but got {actual}")]
    ExpectedString { actual: &'static str },

    #[error("secret data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("secret data is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCodec {
    Identity,
    Base64,
}

impl ValueCodec {
    #[must_use]
    pub fn for_type(kube_type: &KubeType) -> Self {
        if kube_type.is_secret() {
            ValueCodec::Base64
        } else {
            ValueCodec::Identity
        }
    }

    /// API value to stored value
    ///
    /// # Errors
    ///
    /// [`CodecError::ExpectedString`] when base64 encoding a non-string.
    pub fn encode(self, value: &Value) -> Result<Value, CodecError> {
        match self {
            ValueCodec::Identity => Ok(value.clone()),
            ValueCodec::Base64 => Ok(Value::String(STANDARD.encode(expect_str(value)?))),
        }
    }

    /// Stored value to API value
    ///
    /// # Errors
    ///
    /// Fails on non-string, non-base64 or non-UTF-8 secret data.
    pub fn decode(self, value: &Value) -> Result<Value, CodecError> {
        match self {
            ValueCodec::Identity => Ok(value.clone()),
            ValueCodec::Base64 => {
                let bytes = STANDARD.decode(expect_str(value)?)?;
                Ok(Value::String(String::from_utf8(bytes)?))
            }
        }
    }
}

fn expect_str(value: &Value) -> Result<&str, CodecError> {
    value.as_str().ok_or_else(|| CodecError::ExpectedString {
        actual: type_name(value),
    })
}
