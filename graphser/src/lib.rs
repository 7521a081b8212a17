//! graphser: a zero-copy object-graph serializer for distributed compute
//! systems.
//!
//! The defining property is **zero-copy buffer passthrough**: bulk
//! payloads (raw byte strings, encoded blobs) travel as a flat list of
//! [`bytes::Bytes`] alongside a compact, picklable [`Header`] tree, so a
//! transport can use scatter/gather I/O instead of copying large payloads
//! through an intermediate buffer.
//!
//! The engine is built from four coupled pieces:
//!
//! * a closed [`Value`] object model plus a [`Registry`] escape hatch for
//!   opaque user types ([`mod@registry`], [`mod@value`]);
//! * the [`Codec`] protocol every built-in serializer implements
//!   ([`mod@codec`], [`mod@builtins`]);
//! * identity-keyed placeholder/dedup bookkeeping so a shared or cyclic
//!   object graph is only ever fully walked once per call ([`mod@dedup`]);
//! * an explicit-stack traversal driving both directions without risking
//!   the host call stack ([`mod@driver`]).
//!
//! ```
//! use graphser::{deserialize, serialize, Registry, Value};
//!
//! let registry = Registry::new();
//! let v = Value::list(vec![Value::Int(1), Value::text("hi")]);
//! let (envelope, buffers) = serialize(&v, &registry).unwrap();
//! let back = deserialize(&envelope, &buffers).unwrap();
//! ```
pub mod builtins;
pub mod codec;
pub mod dedup;
#[cfg(feature = "derive")]
pub mod derive_support;
pub mod driver;
pub mod error;
pub mod header;
pub mod ids;
pub mod registry;
pub mod value;

#[cfg(feature = "derive")]
#[doc(no_inline)]
pub use derive_support as derive;

pub use codec::{ChildSlot, Codec, Serialized, Subs};
pub use dedup::{DeContext, Fixup, ObjId, SerContext};
pub use driver::{
    deserialize, deserialize_with, deserialize_with_context, serialize, serialize_with_context, serialize_with_options, DriverOptions,
};
pub use error::{Error, ErrorKind};
pub use header::{Envelope, Header, Node};
pub use ids::derive_serializer_id;
pub use registry::{ObjectCodec, Registry};
pub use value::{ObjectValue, Shared, Value};

#[cfg(feature = "derive")]
pub use graphser_derive::GraphCodec;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_roundtrip_smoke_test() {
        let registry = Registry::new();
        let v = Value::map(vec![(Value::text("k"), Value::text("v"))]);
        let (envelope, buffers) = serialize(&v, &registry).unwrap();
        let back = deserialize_with(&envelope, &buffers, &registry, &DriverOptions::default()).unwrap();
        match back {
            Value::Map(m) => {
                let m = m.borrow();
                assert_eq!(m.len(), 1);
            }
            other => panic!("expected a map, got {other:?}"),
        }
    }
}
