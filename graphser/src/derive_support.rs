//! Runtime support consumed by code generated by `#[derive(GraphCodec)]`
//! (see the `graphser-derive` crate). Kept in the main crate rather than
//! the proc-macro crate itself — a proc-macro crate can only export
//! macros, so anything the generated code calls back into has to live
//! here.
//!
//! A `#[derive(GraphCodec)]` struct is represented on the wire as a
//! [`Value::Map`] keyed by field name: a named-tuple reconstructed via a
//! field constructor, applied through the opaque fallback rather than a
//! dedicated `Value` variant. [`ToValue`]/[`FromValue`] convert a field's native
//! Rust type to and from that representation; [`encode_struct`]/
//! [`decode_struct`] wrap the whole map through the ordinary
//! `serialize`/`deserialize` driver and flatten the resulting node tree
//! into the single `Header` an [`crate::registry::ObjectCodec`] returns,
//! so nested `Bytes`/`Text` fields keep their zero-copy buffers instead of
//! being re-encoded into an opaque blob.
use std::rc::Rc;

use bytes::Bytes;

use crate::error::{Error, ErrorKind};
use crate::header::{Envelope, Header, Node};
use crate::value::Value;

/// Converts a native Rust value into the [`Value`] tree graphser's
/// built-in codecs understand.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// The dual of [`ToValue`]: reconstructs a native Rust value from its
/// [`Value`] representation.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, Error>;
}

macro_rules! impl_value_conv_for_int {
    ($($ty:ty => $via:ident),* $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::$via(*self as _)
                }
            }
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, Error> {
                    match value {
                        Value::Int(v) => Ok(*v as $ty),
                        Value::UInt(v) => Ok(*v as $ty),
                        other => Err(wrong_kind("an integer", other)),
                    }
                }
            }
        )*
    };
}

impl_value_conv_for_int!(
    i8 => Int, i16 => Int, i32 => Int, i64 => Int, isize => Int,
    u8 => UInt, u16 => UInt, u32 => UInt, u64 => UInt, usize => UInt,
);

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(wrong_kind("a bool", other)),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Float(f) => Ok(*f as f32),
            other => Err(wrong_kind("a float", other)),
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Float(f) => Ok(*f),
            other => Err(wrong_kind("a float", other)),
        }
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::text(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Text(t) => Ok(t.to_string()),
            other => Err(wrong_kind("text", other)),
        }
    }
}

/// `Vec<u8>` is treated as a zero-copy byte buffer, not a list of
/// per-element integers.
impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::bytes(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Bytes(b) => Ok(b.to_vec()),
            other => Err(wrong_kind("bytes", other)),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(None),
            other => Ok(Some(T::from_value(other)?)),
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::list(self.iter().map(ToValue::to_value))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::List(items) => items.borrow().iter().map(T::from_value).collect(),
            other => Err(wrong_kind("a list", other)),
        }
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, Error> {
        Ok(value.clone())
    }
}

fn wrong_kind(expected: &str, got: &Value) -> Error {
    Error::new(ErrorKind::MalformedHeader, format!("expected {expected}, got {}", got.kind_name()))
}

/// Builds the error `#[derive(GraphCodec)]`-generated `FromValue` impls
/// raise for a field that was never present in the map.
pub fn missing_field_error(name: &str) -> Error {
    Error::new(ErrorKind::MalformedHeader, format!("missing field '{name}'"))
}

/// Packs a [`Node`] (recursively) into a single picklable [`Header`], so a
/// whole field-value tree can travel as an `ObjectCodec`'s header tail.
fn node_to_header(node: &Node) -> Header {
    Header::List(vec![
        Header::UInt(u64::from(node.serializer_id)),
        Header::UInt(u64::from(node.obj_id)),
        Header::UInt(u64::from(node.num_subs)),
        Header::Bool(node.final_),
        node.tail.clone(),
        Header::List(node.children.iter().map(node_to_header).collect()),
    ])
}

fn header_to_node(header: &Header) -> Result<Node, Error> {
    let parts = header
        .as_list()
        .ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "expected a packed node header"))?;
    let [serializer_id, obj_id, num_subs, final_, tail, children] = parts else {
        return Err(Error::new(ErrorKind::MalformedHeader, "packed node header has the wrong arity"));
    };
    let children = children
        .as_list()
        .ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "packed node's children is not a list"))?
        .iter()
        .map(header_to_node)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Node {
        serializer_id: serializer_id.as_u32().ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "packed node's serializer_id is invalid"))?,
        obj_id: obj_id.as_u32().ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "packed node's obj_id is invalid"))?,
        num_subs: num_subs.as_u32().ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "packed node's num_subs is invalid"))?,
        final_: matches!(final_, Header::Bool(true)),
        tail: tail.clone(),
        children,
    })
}

/// Serializes a field-value tree (built by a generated `ToValue` impl)
/// into the `(Header, Vec<Bytes>)` pair an `ObjectCodec::serial` returns.
pub fn encode_struct(fields: Value) -> Result<(Header, Vec<Bytes>), Error> {
    let (envelope, buffers) = crate::driver::serialize(&fields, &crate::registry::Registry::new())?;
    Ok((node_to_header(&envelope.root), buffers))
}

/// The dual of [`encode_struct`]: reconstructs the field-value tree a
/// generated `FromValue` impl consumes.
pub fn decode_struct(tail: &Header, buffers: &[Bytes]) -> Result<Value, Error> {
    let node = header_to_node(tail)?;
    crate::driver::deserialize(&Envelope::new(node), buffers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_field_map_roundtrips_through_packed_header() {
        let fields = Value::map(vec![
            (Value::text("id"), Value::UInt(7)),
            (Value::text("name"), Value::text("ada")),
        ]);
        let (header, buffers) = encode_struct(fields).unwrap();
        let back = decode_struct(&header, &buffers).unwrap();
        match back {
            Value::Map(m) => assert_eq!(m.borrow().len(), 2),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn vec_u8_round_trips_as_zero_copy_bytes_not_a_list() {
        let v: Vec<u8> = vec![1, 2, 3];
        let value = v.to_value();
        assert!(matches!(value, Value::Bytes(_)));
        assert_eq!(Vec::<u8>::from_value(&value).unwrap(), v);
    }

    #[test]
    fn option_none_round_trips_through_null() {
        let none: Option<u32> = None;
        assert!(matches!(none.to_value(), Value::Null));
        assert_eq!(Option::<u32>::from_value(&Value::Null).unwrap(), None);
    }
}
