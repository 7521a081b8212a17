//! Codec ID 7: `Placeholder`.
//!
//! Never dispatched through the ordinary `Value` match in `crate::driver`
//! (no `Value` variant represents "a reference to an object already
//! serialized elsewhere") — emitted directly by the driver whenever a
//! dedup check finds an identity has already been walked, and consumed
//! directly by the driver's deserialize step when it sees
//! `serializer_id == 7`. Kept here mainly to document the wire shape.
use crate::dedup::ObjId;
use crate::header::{Header, Node};

/// Builds the node a repeated identity serializes to: `(id,)` alongside
/// the common `(serializer_id=7, obj_id, num_subs=0, final=true)` prefix.
pub fn node(obj_id: ObjId) -> Node {
    Node {
        serializer_id: 7,
        obj_id: obj_id.0,
        num_subs: 0,
        final_: true,
        tail: Header::List(vec![Header::UInt(obj_id.0 as u64)]),
        children: Vec::new(),
    }
}
