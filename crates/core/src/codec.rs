//! Pluggable value codecs.
//!
//! The cache only ever stores opaque bytes. Callers that want typed values
//! (search result lists, fetched page records) pick a codec and go through
//! [`crate::CacheFacade::get_as`] / [`crate::CacheFacade::put_as`].

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::Error;

/// Converts typed values to and from cache payloads.
pub trait Codec: Send + Sync {
    /// # Errors
    ///
    /// Returns `Error::Codec` if the value cannot be serialized.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Bytes, Error>;

    /// # Errors
    ///
    /// Returns `Error::Codec` if the payload is not a valid `T`.
    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T, Error>;
}

/// JSON via serde_json.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Bytes, Error> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T, Error> {
        Ok(serde_json::from_slice(payload)?)
    }
}
