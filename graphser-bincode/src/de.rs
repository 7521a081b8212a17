//! Decoding half of the bincode opaque codec.
use bytes::Bytes;
use serde::de::DeserializeOwned;

use graphser::{Error, ErrorKind};

/// Decodes a value of type `T` out of the bytes `encode` produced.
pub fn decode<T: DeserializeOwned>(buf: &Bytes) -> Result<T, Error> {
    bincode::deserialize(buf).map_err(|err| Error::new(ErrorKind::Codec, "bincode decode failed").with_source(*err))
}
