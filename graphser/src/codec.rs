//! The codec trait every built-in serializer implements, plus the shapes
//! its methods pass around.
use bytes::Bytes;

use crate::dedup::{DeContext, ObjId, SerContext};
use crate::error::Error;
use crate::header::Header;
use crate::registry::Registry;
use crate::value::Value;

/// What a codec's `serial` step produced, before the driver wraps it in a
/// [`crate::header::Node`] and assigns it a `serializer_id`/`obj_id`.
pub enum Serialized {
    /// A leaf node: no children, just buffers consumed from the flat list.
    Final { header: Header, buffers: Vec<Bytes> },
    /// A non-leaf node. `header` is already final — for the collection and
    /// mapping codecs it is a residual sequence with a
    /// [`Header::Hole`] at each position `children` fills, left to right —
    /// `children` still need to be serialized by the driver and attached
    /// as this node's `children` field, in the same left-to-right order.
    Open { header: Header, children: Vec<Value> },
}

/// What a codec's `deserial` step consumes: either the buffers a final
/// node claimed, or the already-deserialized values of a non-final node's
/// children (each possibly still a placeholder awaiting a fixup).
pub enum Subs<'a> {
    Buffers(&'a [Bytes]),
    Children(Vec<ChildSlot>),
}

/// The result of deserializing one child node: either its value is known,
/// or it is a placeholder whose target has not materialized yet.
#[derive(Clone)]
pub enum ChildSlot {
    Ready(Value),
    Pending(ObjId),
}

/// A built-in serializer. Each variant of [`Value`] (other than the
/// primitives, which share one identity-free codec) maps to exactly one
/// `Codec` impl; dispatch is a static match in `crate::driver`, not a
/// registry lookup — the registry exists only for the `Opaque` escape
/// hatch.
pub trait Codec: std::fmt::Debug {
    /// The wire id this codec occupies (see the built-in codec table).
    fn serializer_id(&self) -> u32;

    /// Builds the header/children (or header/buffers) for `value`. Called
    /// only once the driver's dedup check has confirmed this identity
    /// hasn't already been walked in this call.
    fn serial(
        &self,
        value: &Value,
        obj_id: ObjId,
        ctx: &mut SerContext,
        registry: &Registry,
    ) -> Result<Serialized, Error>;

    /// Reconstructs a value from a node's header tail and its already
    /// resolved buffers or children.
    fn deserial(
        &self,
        tail: &Header,
        subs: Subs<'_>,
        ctx: &mut DeContext,
        registry: &Registry,
    ) -> Result<Value, Error>;
}
