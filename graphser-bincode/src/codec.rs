//! A concrete opaque-fallback [`ObjectCodec`] backed by `serde` + `bincode`.
//!
//! A user type implementing `serde::Serialize`/`DeserializeOwned` is
//! encoded into a single buffer and round-tripped through it, with no
//! extra out-of-band buffers: bincode's format is not itself zero-copy, so
//! nested `Bytes`/`Vec<u8>` fields inside `T` are copied like any other
//! field rather than split out (see `DESIGN.md` for the tradeoff).
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use graphser::{derive_serializer_id, DeContext, Error, ErrorKind, Header, ObjectCodec, ObjectValue};

use crate::{de, ser};

/// Binds a concrete Rust type `T` to the bincode wire format.
///
/// Construct with [`BincodeCodec::new`] (id derived from `T`'s type name)
/// or [`BincodeCodec::with_id`] (explicit id, for callers that need a
/// stable id independent of `std::any::type_name`'s output, which is not
/// guaranteed stable across compiler versions).
pub struct BincodeCodec<T> {
    serializer_id: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for BincodeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BincodeCodec").field("serializer_id", &self.serializer_id).finish()
    }
}

impl<T: 'static> BincodeCodec<T> {
    pub fn new() -> BincodeCodec<T> {
        BincodeCodec::with_id(derive_serializer_id(std::any::type_name::<T>()))
    }

    pub fn with_id(serializer_id: u32) -> BincodeCodec<T> {
        BincodeCodec { serializer_id, _marker: PhantomData }
    }
}

impl<T: 'static> Default for BincodeCodec<T> {
    fn default() -> BincodeCodec<T> {
        BincodeCodec::new()
    }
}

impl<T> ObjectCodec for BincodeCodec<T>
where
    T: Serialize + DeserializeOwned + fmt::Debug + 'static,
{
    fn serializer_id(&self) -> u32 {
        self.serializer_id
    }

    fn serial(&self, value: &dyn ObjectValue) -> Result<(Header, Vec<Bytes>), Error> {
        let concrete = value
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| Error::new(ErrorKind::MalformedHeader, "opaque value did not match the registered codec's type"))?;
        let buf = ser::encode(concrete)?;
        Ok((Header::Unit, vec![buf]))
    }

    fn deserial(&self, _tail: &Header, buffers: &[Bytes], _ctx: &mut DeContext) -> Result<Rc<dyn ObjectValue>, Error> {
        let [buf]: &[Bytes; 1] = buffers
            .try_into()
            .map_err(|_| Error::new(ErrorKind::BufferCountMismatch, "opaque bincode node did not claim exactly one buffer"))?;
        let value: T = de::decode(buf)?;
        Ok(Rc::new(value) as Rc<dyn ObjectValue>)
    }
}

/// Helper for binding a `BincodeCodec<T>` into a [`graphser::Registry`] in
/// one call, as `graphser-bincode`'s equivalent of registering a data
/// format plugin.
pub fn register<T>(registry: &graphser::Registry)
where
    T: Serialize + DeserializeOwned + fmt::Debug + Any + 'static,
{
    registry.register::<T>(std::sync::Arc::new(BincodeCodec::<T>::new()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphser::Registry;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn roundtrips_a_concrete_opaque_type() {
        let registry = Registry::new();
        register::<Point>(&registry);

        let value = graphser::Value::Opaque(Rc::new(Point { x: 3, y: 4 }));
        let (envelope, buffers) = graphser::serialize(&value, &registry).unwrap();
        let back = graphser::deserialize_with(&envelope, &buffers, &registry, &graphser::DriverOptions::default()).unwrap();
        match back {
            graphser::Value::Opaque(o) => {
                let p = o.as_any().downcast_ref::<Point>().unwrap();
                assert_eq!(*p, Point { x: 3, y: 4 });
            }
            other => panic!("expected opaque, got {other:?}"),
        }
    }
}
