use std::rc::Rc;

use graphser::{deserialize_with, serialize, DriverOptions, ObjectValue, Registry, Value};
use graphser_bincode::register;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Account {
    id: u64,
    holder: String,
    flags: Vec<String>,
}

#[test]
fn opaque_value_roundtrips_through_bincode() {
    let registry = Registry::new();
    register::<Account>(&registry);

    let account = Account { id: 7, holder: "ada".into(), flags: vec!["admin".into()] };
    let (envelope, buffers) = serialize(&Value::Opaque(Rc::new(account.clone())), &registry).unwrap();
    let back = deserialize_with(&envelope, &buffers, &registry, &DriverOptions::default()).unwrap();

    match back {
        Value::Opaque(o) => {
            let got = o.as_any().downcast_ref::<Account>().unwrap();
            assert_eq!(*got, account);
        }
        other => panic!("expected opaque, got {other:?}"),
    }
}
