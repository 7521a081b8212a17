//! End-to-end coverage for `#[derive(GraphCodec)]`: a struct round trips
//! through `Value::Opaque` once its generated codec is registered.
use std::rc::Rc;
use std::sync::Arc;

use graphser::{deserialize_with, serialize, DriverOptions, GraphCodec, ObjectValue, Registry, Value};

#[derive(Debug, Clone, PartialEq, GraphCodec)]
struct User {
    id: u64,
    #[graphser(rename = "emailAddress")]
    email_address: String,
    tags: Vec<String>,
    nickname: Option<String>,
}

fn registry_with_user() -> Registry {
    let registry = Registry::new();
    registry.register::<User>(Arc::new(UserGraphCodec::new()));
    registry
}

#[test]
fn derived_struct_round_trips_through_opaque() {
    let registry = registry_with_user();
    let user = User {
        id: 42,
        email_address: "jane@example.com".to_string(),
        tags: vec!["admin".to_string(), "staff".to_string()],
        nickname: None,
    };

    let value = Value::Opaque(Rc::new(user.clone()));
    let (envelope, buffers) = serialize(&value, &registry).unwrap();
    let back = deserialize_with(&envelope, &buffers, &registry, &DriverOptions::default()).unwrap();

    match back {
        Value::Opaque(rc) => {
            let back: &User = rc.as_any().downcast_ref().unwrap();
            assert_eq!(back, &user);
        }
        other => panic!("expected an opaque value, got {other:?}"),
    }
}

#[test]
fn rename_attribute_controls_the_wire_field_name() {
    use graphser::derive::ToValue;

    let user = User {
        id: 1,
        email_address: "a@b.com".to_string(),
        tags: vec![],
        nickname: Some("j".to_string()),
    };
    match user.to_value() {
        Value::Map(pairs) => {
            let pairs = pairs.borrow();
            let has_renamed_key = pairs.iter().any(|(k, _)| matches!(k, Value::Text(t) if t.as_ref() == "emailAddress"));
            assert!(has_renamed_key, "rename attribute should control the wire key");
        }
        other => panic!("expected a map, got {other:?}"),
    }
}
