//! Codec IDs 4 (`Tuple`) and 5 (`List`): the collection rule.
//!
//! Elements short enough to be self-describing (primitives, and short
//! text/bytes) are inlined directly into the header; everything else is
//! propagated as a child node, leaving a [`Header::Hole`] behind at its
//! position.
use crate::codec::{ChildSlot, Codec, Serialized, Subs};
use crate::dedup::{DeContext, ObjId, SerContext};
use crate::error::{Error, ErrorKind};
use crate::header::Header;
use crate::registry::Registry;
use crate::value::{shared, Shared, Value};

/// Elements shorter than this many units (bytes, for `Bytes`/`Text`) are
/// inlined into the residual header rather than propagated as a child.
pub const INLINE_THRESHOLD: usize = 1024;

pub(crate) fn inline_header(value: &Value) -> Option<Header> {
    match value {
        Value::Null => Some(Header::Unit),
        Value::Bool(b) => Some(Header::Bool(*b)),
        Value::Int(i) => Some(Header::Int(*i)),
        Value::UInt(u) => Some(Header::UInt(*u)),
        Value::Float(f) => Some(Header::Float(*f)),
        Value::Text(t) if t.len() < INLINE_THRESHOLD => Some(Header::Str(t.to_string())),
        Value::Bytes(b) if b.len() < INLINE_THRESHOLD => Some(Header::Bytes(b.to_vec())),
        _ => None,
    }
}

fn inline_value(header: &Header) -> Option<Value> {
    match header {
        Header::Unit => Some(Value::Null),
        Header::Bool(b) => Some(Value::Bool(*b)),
        Header::Int(i) => Some(Value::Int(*i)),
        Header::UInt(u) => Some(Value::UInt(*u)),
        Header::Float(f) => Some(Value::Float(*f)),
        Header::Str(s) => Some(Value::text(s.clone())),
        Header::Bytes(b) => Some(Value::bytes(b.clone())),
        Header::Hole => None,
        _ => None,
    }
}

/// Partitions `items` into a residual header sequence (holes at
/// propagated positions) and the propagated children, left to right.
pub(crate) fn partition(items: &[Value]) -> (Vec<Header>, Vec<Value>) {
    let mut residual = Vec::with_capacity(items.len());
    let mut children = Vec::new();
    for item in items {
        match inline_header(item) {
            Some(h) => residual.push(h),
            None => {
                residual.push(Header::Hole);
                children.push(item.clone());
            }
        }
    }
    (residual, children)
}

/// Rebuilds a `Shared<Vec<Value>>` from a residual sequence and the
/// resolved (or still-pending) child slots, registering fixups for any
/// slot that is still a placeholder.
pub(crate) fn rebuild(residual: &[Header], subs: Vec<ChildSlot>, ctx: &mut DeContext) -> Shared<Vec<Value>> {
    let container = shared(Vec::with_capacity(residual.len()));
    {
        let mut vec = container.borrow_mut();
        for header in residual {
            vec.push(inline_value(header).unwrap_or(Value::Null));
        }
    }
    let mut holes = residual.iter().enumerate().filter(|(_, h)| matches!(h, Header::Hole)).map(|(i, _)| i);
    for slot in subs {
        let index = holes.next().expect("residual hole count must match resolved child count");
        match slot {
            ChildSlot::Ready(v) => container.borrow_mut()[index] = v,
            ChildSlot::Pending(obj_id) => {
                let target = container.clone();
                ctx.register_fixup(
                    obj_id,
                    Box::new(move |real| {
                        target.borrow_mut()[index] = real;
                    }),
                );
            }
        }
    }
    container
}

fn parse_tail(tail: &Header) -> Result<&[Header], Error> {
    let parts = tail
        .as_list()
        .ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "collection node's tail is not a 2-tuple"))?;
    let [residual, _marker] = parts else {
        return Err(Error::new(ErrorKind::MalformedHeader, "collection node's tail does not have exactly 2 parts"));
    };
    residual
        .as_list()
        .ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "collection node's residual is not a list"))
}

#[derive(Debug)]
pub struct TupleCodec;

impl Codec for TupleCodec {
    fn serializer_id(&self) -> u32 {
        4
    }

    fn serial(&self, value: &Value, _obj_id: ObjId, _ctx: &mut SerContext, _registry: &Registry) -> Result<Serialized, Error> {
        let items = match value {
            Value::Tuple(r) => r.borrow().clone(),
            other => unreachable!("TupleCodec dispatched for non-tuple {other:?}"),
        };
        let (residual, children) = partition(&items);
        let header = Header::List(vec![Header::List(residual), Header::Unit]);
        Ok(Serialized::Open { header, children })
    }

    fn deserial(&self, tail: &Header, subs: Subs<'_>, ctx: &mut DeContext, _registry: &Registry) -> Result<Value, Error> {
        let residual = parse_tail(tail)?;
        let subs = match subs {
            Subs::Children(c) => c,
            Subs::Buffers(_) => return Err(Error::new(ErrorKind::MalformedHeader, "tuple node claimed buffers instead of children")),
        };
        Ok(Value::Tuple(rebuild(residual, subs, ctx)))
    }
}

#[derive(Debug)]
pub struct ListCodec;

impl Codec for ListCodec {
    fn serializer_id(&self) -> u32 {
        5
    }

    fn serial(&self, value: &Value, _obj_id: ObjId, _ctx: &mut SerContext, _registry: &Registry) -> Result<Serialized, Error> {
        let items = match value {
            Value::List(r) => r.borrow().clone(),
            other => unreachable!("ListCodec dispatched for non-list {other:?}"),
        };
        let (residual, children) = partition(&items);
        let header = Header::List(vec![Header::List(residual), Header::Unit]);
        Ok(Serialized::Open { header, children })
    }

    fn deserial(&self, tail: &Header, subs: Subs<'_>, ctx: &mut DeContext, _registry: &Registry) -> Result<Value, Error> {
        let residual = parse_tail(tail)?;
        let subs = match subs {
            Subs::Children(c) => c,
            Subs::Buffers(_) => return Err(Error::new(ErrorKind::MalformedHeader, "list node claimed buffers instead of children")),
        };
        Ok(Value::List(rebuild(residual, subs, ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_inlines_primitives_and_short_strings() {
        let items = vec![Value::Int(1), Value::text("hi"), Value::bytes(vec![1, 2, 3])];
        let (residual, children) = partition(&items);
        assert_eq!(residual, vec![Header::Int(1), Header::Str("hi".into()), Header::Bytes(vec![1, 2, 3])]);
        assert!(children.is_empty());
    }

    #[test]
    fn partition_holes_out_oversized_strings() {
        let long = "x".repeat(INLINE_THRESHOLD);
        let items = vec![Value::text(long.clone())];
        let (residual, children) = partition(&items);
        assert_eq!(residual, vec![Header::Hole]);
        assert_eq!(children.len(), 1);
    }
}
