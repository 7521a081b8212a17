//! Codec ID 3: `Text`.
//!
//! Unlike `Bytes`, text is always encoded into a fresh UTF-8 buffer on
//! serialize and decoded back on load — there is no zero-copy promise for
//! strings, only for raw byte payloads.
use bytes::Bytes;

use crate::codec::{Codec, Serialized, Subs};
use crate::dedup::{DeContext, ObjId, SerContext};
use crate::error::{Error, ErrorKind};
use crate::header::Header;
use crate::registry::Registry;
use crate::value::Value;

#[derive(Debug)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn serializer_id(&self) -> u32 {
        3
    }

    fn serial(&self, value: &Value, _obj_id: ObjId, _ctx: &mut SerContext, _registry: &Registry) -> Result<Serialized, Error> {
        let text = match value {
            Value::Text(t) => t,
            other => unreachable!("TextCodec dispatched for non-text {other:?}"),
        };
        Ok(Serialized::Final {
            header: Header::Unit,
            buffers: vec![Bytes::copy_from_slice(text.as_bytes())],
        })
    }

    fn deserial(&self, _tail: &Header, subs: Subs<'_>, _ctx: &mut DeContext, _registry: &Registry) -> Result<Value, Error> {
        let buffers = match subs {
            Subs::Buffers(b) => b,
            Subs::Children(_) => return Err(Error::new(ErrorKind::MalformedHeader, "text node has children instead of a buffer")),
        };
        let [buf]: &[Bytes; 1] = buffers
            .try_into()
            .map_err(|_| Error::new(ErrorKind::BufferCountMismatch, "text node did not claim exactly one buffer"))?;
        let s = std::str::from_utf8(buf).map_err(|e| Error::new(ErrorKind::MalformedHeader, "text buffer is not valid utf-8").with_source(e))?;
        Ok(Value::text(s))
    }
}
