//! Encoding half of the bincode opaque codec.
use bytes::Bytes;
use serde::Serialize;

use graphser::{Error, ErrorKind};

/// Encodes `value` into a flat byte buffer using bincode's fixed,
/// self-contained binary encoding.
pub fn encode<T: Serialize>(value: &T) -> Result<Bytes, Error> {
    bincode::serialize(value)
        .map(Bytes::from)
        .map_err(|err| Error::new(ErrorKind::Codec, "bincode encode failed").with_source(*err))
}
