//! Codec ID 6: `Map`. The collection rule applied separately to the key
//! sequence and the value sequence, concatenating the two sets of
//! propagated children (keys first) into one child list.
use crate::builtins::collection::partition;
use crate::codec::{ChildSlot, Codec, Serialized, Subs};
use crate::dedup::{DeContext, ObjId, SerContext};
use crate::error::{Error, ErrorKind};
use crate::header::Header;
use crate::registry::Registry;
use crate::value::{shared, Value};

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

#[derive(Debug)]
pub struct MappingCodec;

impl Codec for MappingCodec {
    fn serializer_id(&self) -> u32 {
        6
    }

    fn serial(&self, value: &Value, _obj_id: ObjId, _ctx: &mut SerContext, _registry: &Registry) -> Result<Serialized, Error> {
        let pairs = match value {
            Value::Map(r) => r.borrow().clone(),
            other => unreachable!("MappingCodec dispatched for non-map {other:?}"),
        };
        let keys: Vec<Value> = pairs.iter().map(|(k, _)| k.clone()).collect();
        let values: Vec<Value> = pairs.iter().map(|(_, v)| v.clone()).collect();
        let (key_residual, mut key_children) = partition(&keys);
        let (value_residual, value_children) = partition(&values);
        key_children.extend(value_children);
        let header = Header::List(vec![Header::List(key_residual), Header::List(value_residual), Header::Unit]);
        Ok(Serialized::Open { header, children: key_children })
    }

    fn deserial(&self, tail: &Header, subs: Subs<'_>, ctx: &mut DeContext, _registry: &Registry) -> Result<Value, Error> {
        let parts = tail
            .as_list()
            .ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "map node's tail is not a 3-tuple"))?;
        let [key_residual, value_residual, _marker] = parts else {
            return Err(Error::new(ErrorKind::MalformedHeader, "map node's tail does not have exactly 3 parts"));
        };
        let key_residual = key_residual
            .as_list()
            .ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "map node's key residual is not a list"))?;
        let value_residual = value_residual
            .as_list()
            .ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "map node's value residual is not a list"))?;
        if key_residual.len() != value_residual.len() {
            return Err(Error::new(ErrorKind::MalformedHeader, "map node's key and value residuals differ in length"));
        }
        let mut subs = match subs {
            Subs::Children(c) => c.into_iter(),
            Subs::Buffers(_) => return Err(Error::new(ErrorKind::MalformedHeader, "map node claimed buffers instead of children")),
        };

        let pairs = shared(Vec::with_capacity(key_residual.len()));
        {
            let mut vec = pairs.borrow_mut();
            for (k, v) in key_residual.iter().zip(value_residual.iter()) {
                vec.push((inline_value(k).unwrap_or(Value::Null), inline_value(v).unwrap_or(Value::Null)));
            }
        }

        let key_holes: Vec<usize> = key_residual.iter().enumerate().filter(|(_, h)| matches!(h, Header::Hole)).map(|(i, _)| i).collect();
        for index in key_holes {
            let slot = subs.next().expect("key residual hole count must match resolved child count");
            place(&pairs, index, slot, ctx, true);
        }
        let value_holes: Vec<usize> = value_residual.iter().enumerate().filter(|(_, h)| matches!(h, Header::Hole)).map(|(i, _)| i).collect();
        for index in value_holes {
            let slot = subs.next().expect("value residual hole count must match resolved child count");
            place(&pairs, index, slot, ctx, false);
        }

        Ok(Value::Map(pairs))
    }
}

fn place(pairs: &crate::value::Shared<Vec<(Value, Value)>>, index: usize, slot: ChildSlot, ctx: &mut DeContext, is_key: bool) {
    match slot {
        ChildSlot::Ready(v) => {
            let mut vec = pairs.borrow_mut();
            if is_key {
                vec[index].0 = v;
            } else {
                vec[index].1 = v;
            }
        }
        ChildSlot::Pending(obj_id) => {
            let target = pairs.clone();
            ctx.register_fixup(
                obj_id,
                Box::new(move |real| {
                    let mut vec = target.borrow_mut();
                    if is_key {
                        vec[index].0 = real;
                    } else {
                        vec[index].1 = real;
                    }
                }),
            );
        }
    }
}
