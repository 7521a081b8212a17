use std::rc::Rc;
use std::sync::Arc;

use bytes::Bytes;

use graphser::{deserialize, deserialize_with, serialize, DriverOptions, GraphCodec, ObjectValue, Registry, Value};
use graphser_debug::ToDebug;

/// A plain round trip: build a value, serialize it, and read it back.
fn round_trip() {
    let value = Value::map(vec![
        (Value::text("id"), Value::UInt(23)),
        (Value::text("emailAddress"), Value::text("jane@example.com")),
    ]);

    let registry = Registry::new();
    let (envelope, buffers) = serialize(&value, &registry).unwrap();
    println!("round trip -> {:?}", ToDebug::new(&envelope, &buffers));

    let back = deserialize(&envelope, &buffers).unwrap();
    assert!(matches!(back, Value::Map(_)));
}

/// The same nested list aliased from two places in the graph serializes
/// once and deserializes back to a single shared allocation.
fn shared_nested_list() {
    let shared = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    let outer = Value::tuple(vec![shared.clone(), shared]);

    let registry = Registry::new();
    let (envelope, buffers) = serialize(&outer, &registry).unwrap();
    println!("shared list -> {:?}", ToDebug::new(&envelope, &buffers));

    let back = deserialize(&envelope, &buffers).unwrap();
    if let Value::Tuple(items) = back {
        let items = items.borrow();
        let (Value::List(a), Value::List(b)) = (&items[0], &items[1]) else {
            panic!("expected two lists");
        };
        assert!(std::rc::Rc::ptr_eq(a, b), "aliasing should survive the round trip");
    } else {
        panic!("expected a tuple");
    }
}

/// A list that contains itself. The dedup bookkeeping in `graphser::dedup`
/// visits it once and ties the knot with a placeholder/fixup instead of
/// looping forever.
fn self_referential_cycle() {
    let list = Value::list(vec![Value::Int(1)]);
    if let Value::List(items) = &list {
        items.borrow_mut().push(list.clone());
    }

    let registry = Registry::new();
    let (envelope, buffers) = serialize(&list, &registry).unwrap();
    println!("cycle -> {} node(s) in the header tree", count_nodes(&envelope.root));

    let back = deserialize(&envelope, &buffers).unwrap();
    if let Value::List(items) = &back {
        let items = items.borrow();
        assert_eq!(items.len(), 2);
        if let Value::List(inner) = &items[1] {
            assert!(std::rc::Rc::ptr_eq(inner, items_as_shared(&back)));
        } else {
            panic!("expected the second element to tie back to the outer list");
        }
    } else {
        panic!("expected a list");
    }
}

fn items_as_shared(value: &Value) -> &graphser::Shared<Vec<Value>> {
    match value {
        Value::List(items) => items,
        _ => panic!("expected a list"),
    }
}

fn count_nodes(node: &graphser::Node) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

/// A large byte payload travels as a single buffer alongside a tiny
/// header, instead of being copied into the header tree itself.
fn large_buffer_passthrough() {
    let payload = vec![0x42u8; 64 * 1024 * 1024];
    let value = Value::bytes(Bytes::from(payload));

    let registry = Registry::new();
    let (envelope, buffers) = serialize(&value, &registry).unwrap();
    assert_eq!(buffers.len(), 1);
    assert_eq!(buffers[0].len(), 64 * 1024 * 1024);
    println!("large buffer -> header is {:?}, 1 buffer of {} bytes", envelope.root.tail, buffers[0].len());

    let back = deserialize(&envelope, &buffers).unwrap();
    assert!(matches!(back, Value::Bytes(_)));
}

/// A struct carrying `#[derive(GraphCodec)]` round trips through
/// `Value::Opaque` once its generated codec is registered, instead of
/// being hand-built field by field like `round_trip`'s map.
#[derive(Debug, Clone, PartialEq, GraphCodec)]
struct Account {
    id: u64,
    #[graphser(rename = "emailAddress")]
    email_address: String,
    tags: Vec<String>,
}

fn derive_roundtrip() {
    let registry = Registry::new();
    registry.register::<Account>(Arc::new(AccountGraphCodec::new()));

    let account = Account {
        id: 7,
        email_address: "jane@example.com".to_string(),
        tags: vec!["admin".to_string()],
    };

    let value = Value::Opaque(Rc::new(account.clone()));
    let (envelope, buffers) = serialize(&value, &registry).unwrap();
    println!("derived struct -> {:?}", ToDebug::new(&envelope, &buffers));

    let back = deserialize_with(&envelope, &buffers, &registry, &DriverOptions::default()).unwrap();
    match back {
        Value::Opaque(rc) => {
            let back: &Account = rc.as_any().downcast_ref().unwrap();
            assert_eq!(back, &account);
        }
        other => panic!("expected an opaque value, got {other:?}"),
    }
}

fn main() {
    round_trip();
    shared_nested_list();
    self_referential_cycle();
    large_buffer_passthrough();
    derive_roundtrip();
}
