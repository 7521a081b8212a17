//! Codec ID 1: `Null`/`Bool`/`Int`/`UInt`/`Float`.
//!
//! Primitives never carry identity (`ObjId::NONE`) and never recurse; the
//! header tail alone round-trips the value.
use crate::codec::{Codec, Serialized, Subs};
use crate::dedup::{DeContext, ObjId, SerContext};
use crate::error::{Error, ErrorKind};
use crate::header::Header;
use crate::registry::Registry;
use crate::value::Value;

#[derive(Debug)]
pub struct PrimitiveCodec;

impl Codec for PrimitiveCodec {
    fn serializer_id(&self) -> u32 {
        1
    }

    fn serial(&self, value: &Value, _obj_id: ObjId, _ctx: &mut SerContext, _registry: &Registry) -> Result<Serialized, Error> {
        let header = match value {
            Value::Null => Header::Unit,
            Value::Bool(b) => Header::Bool(*b),
            Value::Int(i) => Header::Int(*i),
            Value::UInt(u) => Header::UInt(*u),
            Value::Float(f) => Header::Float(*f),
            other => unreachable!("PrimitiveCodec dispatched for non-primitive {other:?}"),
        };
        Ok(Serialized::Final { header, buffers: Vec::new() })
    }

    fn deserial(&self, tail: &Header, _subs: Subs<'_>, _ctx: &mut DeContext, _registry: &Registry) -> Result<Value, Error> {
        Ok(match tail {
            Header::Unit => Value::Null,
            Header::Bool(b) => Value::Bool(*b),
            Header::Int(i) => Value::Int(*i),
            Header::UInt(u) => Value::UInt(*u),
            Header::Float(f) => Value::Float(*f),
            _ => return Err(Error::new(ErrorKind::MalformedHeader, "primitive node's tail is not a primitive header")),
        })
    }
}
