use std::rc::Rc;

use graphser::{serialize, ErrorKind, Registry, Value};
use graphser_bincode::register;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: u64,
    is_active: bool,
    flags: Vec<String>,
}

#[test]
fn registered_opaque_type_serializes_to_a_single_buffer() {
    let registry = Registry::new();
    register::<User>(&registry);

    let user = User { id: 42, is_active: true, flags: vec!["german".into(), "staff".into()] };
    let (envelope, buffers) = serialize(&Value::Opaque(Rc::new(user)), &registry).unwrap();

    assert!(envelope.root.final_);
    assert_eq!(envelope.root.num_subs, 1);
    assert_eq!(buffers.len(), 1);
}

#[test]
fn unregistered_opaque_type_fails_with_no_handler() {
    #[derive(Debug, Serialize, Deserialize)]
    struct Unregistered;

    let registry = Registry::new();
    let err = serialize(&Value::Opaque(Rc::new(Unregistered)), &registry).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoHandler);
}
