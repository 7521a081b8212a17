//! Codec ID 0: `Opaque`, the registry-backed escape hatch.
//!
//! Like [`crate::builtins::placeholder`], this isn't dispatched through
//! the `Codec` trait: serializing an opaque value means an exact `TypeId`
//! lookup in the [`Registry`], not a fixed wire shape, so the driver calls
//! straight into these two functions instead of going through a static
//! `&dyn Codec`.
//!
//! There is deliberately no "any unregistered type" fallback here. The
//! host this engine was modeled after can walk a live type's ancestors
//! looking for a handler; Rust's closed, monomorphized type system has no
//! equivalent runtime walk, so dispatch degenerates to an exact match —
//! callers register a codec per concrete type up front (see
//! `graphser-bincode`) or get [`ErrorKind::NoHandler`].
use std::any::Any;
use std::rc::Rc;

use bytes::Bytes;

use crate::dedup::DeContext;
use crate::error::{Error, ErrorKind};
use crate::header::Header;
use crate::registry::Registry;
use crate::value::ObjectValue;

pub fn serial(value: &Rc<dyn ObjectValue>, registry: &Registry) -> Result<(u32, Header, Vec<Bytes>), Error> {
    let type_id = (**value).as_any().type_id();
    let codec = registry.codec_for_type(type_id).ok_or_else(|| {
        tracing::warn!(?type_id, "no opaque codec registered for this type");
        Error::new(ErrorKind::NoHandler, format!("no codec registered for opaque type {type_id:?}"))
    })?;
    let (header, buffers) = codec.serial(value.as_ref())?;
    Ok((codec.serializer_id(), header, buffers))
}

pub fn deserial(serializer_id: u32, tail: &Header, buffers: &[Bytes], ctx: &mut DeContext, registry: &Registry) -> Result<Rc<dyn ObjectValue>, Error> {
    let codec = registry.codec_for_serializer_id(serializer_id)?;
    codec.deserial(tail, buffers, ctx)
}
