//! The process-wide type-dispatch registry for [`crate::value::Value::Opaque`].
//!
//! Mirrors the `TypeKey`/`Extensions` pattern this engine's serializer
//! layer uses for per-call extension state, but keyed on `TypeId` alone
//! (there is no need for the `Ord`/name-carrying variant here) and scoped
//! to the lifetime of the process rather than one call.
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, RwLock};

use bytes::Bytes;

use crate::dedup::DeContext;
use crate::error::{Error, ErrorKind};
use crate::header::Header;
use crate::value::ObjectValue;

/// A user-supplied codec for one concrete opaque type.
///
/// Unlike the built-in [`crate::codec::Codec`] impls, an `ObjectCodec`
/// always produces (and consumes) a final node: opaque values are not
/// decomposed into propagated children, only a header tail and a flat
/// buffer list.
///
/// The registry holding these codecs is `Send + Sync` (it is process-wide
/// and may be shared across threads), but a codec's own `serial`/`deserial`
/// calls happen on whichever thread is driving one `serialize`/
/// `deserialize` call, and hand back `Rc`-rooted values local to it.
pub trait ObjectCodec: Send + Sync {
    /// The serializer id this codec claims on the wire. Must be >= 8 (ids
    /// 0-7 are reserved for the built-ins); see `crate::builtins`.
    fn serializer_id(&self) -> u32;

    fn serial(&self, value: &dyn ObjectValue) -> Result<(Header, Vec<Bytes>), Error>;

    fn deserial(&self, tail: &Header, buffers: &[Bytes], ctx: &mut DeContext) -> Result<Rc<dyn ObjectValue>, Error>;
}

impl fmt::Debug for dyn ObjectCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectCodec(id={})", self.serializer_id())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct TypeKey(TypeId, &'static str);

impl TypeKey {
    fn of<T: 'static>() -> TypeKey {
        TypeKey(TypeId::of::<T>(), type_name::<T>())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.1)
    }
}

struct Entry {
    key: TypeKey,
    codec: Arc<dyn ObjectCodec>,
}

/// Maps a live `TypeId` to its codec, and a wire `serializer_id` back to
/// the same codec for deserialization. Mutations take a write lock;
/// lookups take a read lock, so registering new types concurrently with
/// in-flight `serialize`/`deserialize` calls is safe but callers should
/// still avoid racing registration against a call that depends on it, per
/// the crate docs.
#[derive(Default)]
pub struct Registry {
    by_type: RwLock<HashMap<TypeId, Entry>>,
    by_serializer_id: RwLock<HashMap<u32, Arc<dyn ObjectCodec>>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let by_type = self.by_type.read().unwrap();
        f.debug_struct("Registry")
            .field("types", &by_type.values().map(|e| &e.key).collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Equivalent to [`Registry::new`].
    ///
    /// The source system's registry bootstrap wires a fallback codec to
    /// the universal root type at startup; Rust has no such root type to
    /// bind ahead of time; an opaque value's concrete type is always
    /// exact, so there is nothing to pre-register until a caller supplies
    /// a concrete `ObjectCodec` for a concrete type (see
    /// `graphser_bincode::register`). Kept as its own constructor so call
    /// sites can say "start from the default bootstrap" the way the
    /// source system's `init_defaults()` does, even though today that
    /// bootstrap is empty.
    pub fn with_defaults() -> Registry {
        Registry::new()
    }

    /// Registers `codec` for `T`. Replaces any codec previously registered
    /// for the same type or the same `serializer_id`.
    pub fn register<T: 'static>(&self, codec: Arc<dyn ObjectCodec>) {
        let key = TypeKey::of::<T>();
        tracing::debug!(type_name = key.1, serializer_id = codec.serializer_id(), "registering opaque codec");
        self.by_serializer_id
            .write()
            .unwrap()
            .insert(codec.serializer_id(), codec.clone());
        self.by_type.write().unwrap().insert(
            key.0,
            Entry { key, codec },
        );
    }

    /// Removes both the dispatch and deserializer-id entries for `T`, if
    /// any are registered. No-op if `T` was never registered.
    pub fn unregister<T: 'static>(&self) {
        let type_id = TypeId::of::<T>();
        let removed = self.by_type.write().unwrap().remove(&type_id);
        if let Some(entry) = removed {
            tracing::debug!(type_name = entry.key.1, "unregistering opaque codec");
            self.by_serializer_id.write().unwrap().remove(&entry.codec.serializer_id());
        }
    }

    pub fn codec_for_type(&self, type_id: TypeId) -> Option<Arc<dyn ObjectCodec>> {
        self.by_type.read().unwrap().get(&type_id).map(|e| e.codec.clone())
    }

    pub fn codec_for_serializer_id(&self, id: u32) -> Result<Arc<dyn ObjectCodec>, Error> {
        self.by_serializer_id
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                tracing::warn!(serializer_id = id, "no opaque codec registered for this id");
                Error::new(ErrorKind::UnknownSerializerId, format!("no codec registered for serializer id {id}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::DeContext;

    #[derive(Debug)]
    struct Point(i32, i32);

    #[derive(Debug)]
    struct PointCodec;

    impl ObjectCodec for PointCodec {
        fn serializer_id(&self) -> u32 {
            9000
        }

        fn serial(&self, value: &dyn crate::value::ObjectValue) -> Result<(Header, Vec<Bytes>), Error> {
            let p = value.as_any().downcast_ref::<Point>().unwrap();
            Ok((Header::List(vec![Header::Int(p.0 as i64), Header::Int(p.1 as i64)]), Vec::new()))
        }

        fn deserial(&self, tail: &Header, _buffers: &[Bytes], _ctx: &mut DeContext) -> Result<Rc<dyn crate::value::ObjectValue>, Error> {
            let parts = tail.as_list().unwrap();
            let [Header::Int(x), Header::Int(y)] = parts else { panic!("bad tail") };
            Ok(Rc::new(Point(*x as i32, *y as i32)))
        }
    }

    #[test]
    fn with_defaults_starts_empty_like_new() {
        let registry = Registry::with_defaults();
        assert!(registry.codec_for_type(TypeId::of::<Point>()).is_none());
    }

    #[test]
    fn register_then_unregister_clears_both_lookup_tables() {
        let registry = Registry::new();
        registry.register::<Point>(Arc::new(PointCodec));
        assert!(registry.codec_for_type(TypeId::of::<Point>()).is_some());
        assert!(registry.codec_for_serializer_id(9000).is_ok());

        registry.unregister::<Point>();
        assert!(registry.codec_for_type(TypeId::of::<Point>()).is_none());
        assert!(registry.codec_for_serializer_id(9000).is_err());
    }

    #[test]
    fn unregister_on_a_never_registered_type_is_a_no_op() {
        let registry = Registry::new();
        registry.unregister::<Point>();
        assert!(registry.codec_for_type(TypeId::of::<Point>()).is_none());
    }
}
