//! Codec ID 2: `Bytes`.
//!
//! A single buffer is passed through untouched — `bytes::Bytes` clones are
//! O(1) refcount bumps, so round-tripping a large payload never copies it.
use bytes::Bytes as ByteBuf;

use crate::codec::{Codec, Serialized, Subs};
use crate::dedup::{DeContext, ObjId, SerContext};
use crate::error::{Error, ErrorKind};
use crate::header::Header;
use crate::registry::Registry;
use crate::value::Value;

#[derive(Debug)]
pub struct BytesCodec;

impl Codec for BytesCodec {
    fn serializer_id(&self) -> u32 {
        2
    }

    fn serial(&self, value: &Value, _obj_id: ObjId, _ctx: &mut SerContext, _registry: &Registry) -> Result<Serialized, Error> {
        let buf = match value {
            Value::Bytes(b) => b.clone(),
            other => unreachable!("BytesCodec dispatched for non-bytes {other:?}"),
        };
        Ok(Serialized::Final { header: Header::Unit, buffers: vec![buf] })
    }

    fn deserial(&self, _tail: &Header, subs: Subs<'_>, _ctx: &mut DeContext, _registry: &Registry) -> Result<Value, Error> {
        let buffers = match subs {
            Subs::Buffers(b) => b,
            Subs::Children(_) => return Err(Error::new(ErrorKind::MalformedHeader, "bytes node has children instead of a buffer")),
        };
        let [buf]: &[ByteBuf; 1] = buffers
            .try_into()
            .map_err(|_| Error::new(ErrorKind::BufferCountMismatch, "bytes node did not claim exactly one buffer"))?;
        Ok(Value::Bytes(buf.clone()))
    }
}
