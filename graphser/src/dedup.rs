//! Placeholder and shared-reference deduplication.
//!
//! Every non-primitive codec's `serial` begins with a dedup check: has this
//! object identity already been serialized once during this call? If so,
//! a placeholder is emitted instead of re-walking the value. On the
//! deserialize side, [`DeContext`] plays the dual role: it remembers which
//! identities have already materialized, and queues "fixup" callbacks for
//! identities that are referenced (as a placeholder) before they exist.
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// A 32-bit truncation of a value's backing allocation's address.
///
/// Collisions are possible but unlikely (see the crate-level docs); a
/// caller needing stronger guarantees should widen this or keep a
/// second-level equality check of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjId(pub u32);

impl ObjId {
    /// The fixed identity used for primitive (value-type) nodes, which
    /// have no stable address in Rust and therefore never participate in
    /// dedup.
    pub const NONE: ObjId = ObjId(0);
}

fn truncate(addr: usize) -> ObjId {
    ObjId(addr as u32)
}

/// Computes the identity of a value, or `None` for primitives (which carry
/// no stable address and are never deduplicated).
pub fn identity(value: &Value) -> Option<ObjId> {
    match value {
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::UInt(_) | Value::Float(_) => None,
        Value::Bytes(b) => Some(truncate(b.as_ptr() as usize)),
        Value::Text(t) => Some(truncate(Rc::as_ptr(t) as *const u8 as usize)),
        Value::Tuple(r) | Value::List(r) => Some(truncate(Rc::as_ptr(r) as usize)),
        Value::Map(r) => Some(truncate(Rc::as_ptr(r) as usize)),
        Value::Opaque(o) => Some(truncate(Rc::as_ptr(o) as *const () as usize)),
    }
}

/// Per-call serialization context: which identities have already been
/// walked, plus the flat buffer list being accumulated.
#[derive(Debug, Default)]
pub struct SerContext {
    seen: HashMap<u32, ()>,
    pub(crate) buffers: Vec<bytes::Bytes>,
}

impl SerContext {
    pub fn new() -> SerContext {
        SerContext::default()
    }

    /// Marks `obj_id` as seen. Returns `true` the first time an id is
    /// marked (proceed to fully serialize), `false` on any later call
    /// (emit a placeholder instead).
    pub fn mark(&mut self, obj_id: ObjId) -> bool {
        self.seen.insert(obj_id.0, ()).is_none()
    }
}

/// A callback queued against a not-yet-resolved identity, invoked with the
/// real value once it materializes.
pub type Fixup = Box<dyn FnOnce(Value)>;

enum DeSlot {
    Pending(Vec<Fixup>),
    Ready(Value),
}

/// Per-call deserialization context: resolved identities, and fixup
/// callbacks queued against identities that were referenced as a
/// placeholder before the real object materialized.
#[derive(Default)]
pub struct DeContext {
    slots: HashMap<u32, DeSlot>,
}

impl DeContext {
    pub fn new() -> DeContext {
        DeContext::default()
    }

    /// Returns the resolved value for `obj_id`, if it has already
    /// materialized.
    pub fn lookup(&self, obj_id: ObjId) -> Option<Value> {
        match self.slots.get(&obj_id.0) {
            Some(DeSlot::Ready(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Registers a fixup to run against `obj_id`'s real value. If the
    /// identity has already resolved, the fixup runs immediately.
    pub fn register_fixup(&mut self, obj_id: ObjId, fixup: Fixup) {
        match self.slots.get_mut(&obj_id.0) {
            Some(DeSlot::Ready(v)) => fixup(v.clone()),
            Some(DeSlot::Pending(list)) => list.push(fixup),
            None => {
                self.slots.insert(obj_id.0, DeSlot::Pending(vec![fixup]));
            }
        }
    }

    /// Records the just-materialized value for `obj_id`, firing (and
    /// draining) any fixups that were queued against it.
    pub fn resolve(&mut self, obj_id: ObjId, value: Value) {
        let previous = self.slots.insert(obj_id.0, DeSlot::Ready(value.clone()));
        if let Some(DeSlot::Pending(fixups)) = previous {
            for fixup in fixups {
                fixup(value.clone());
            }
        }
    }

    /// True if any identity is still awaiting resolution. Checked once the
    /// whole tree has been walked: a remaining pending entry means the
    /// header referenced an identity that never actually materialized.
    pub fn has_dangling_references(&self) -> bool {
        self.slots.values().any(|s| matches!(s, DeSlot::Pending(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_have_no_identity() {
        assert!(identity(&Value::Int(5)).is_none());
        assert!(identity(&Value::Null).is_none());
    }

    #[test]
    fn shared_list_has_stable_identity() {
        let v = Value::list(vec![Value::Int(1)]);
        let id1 = identity(&v).unwrap();
        let id2 = identity(&v.clone()).unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn mark_returns_true_once() {
        let mut ctx = SerContext::new();
        let id = ObjId(42);
        assert!(ctx.mark(id));
        assert!(!ctx.mark(id));
    }

    #[test]
    fn fixup_fires_immediately_when_already_resolved() {
        let mut ctx = DeContext::new();
        ctx.resolve(ObjId(1), Value::Int(7));
        let seen = Rc::new(std::cell::RefCell::new(None));
        let seen2 = seen.clone();
        ctx.register_fixup(
            ObjId(1),
            Box::new(move |v| {
                *seen2.borrow_mut() = Some(v);
            }),
        );
        assert!(matches!(*seen.borrow(), Some(Value::Int(7))));
    }

    #[test]
    fn fixup_fires_on_later_resolve() {
        let mut ctx = DeContext::new();
        let seen = Rc::new(std::cell::RefCell::new(None));
        let seen2 = seen.clone();
        ctx.register_fixup(
            ObjId(9),
            Box::new(move |v| {
                *seen2.borrow_mut() = Some(v);
            }),
        );
        assert!(seen.borrow().is_none());
        ctx.resolve(ObjId(9), Value::Bool(true));
        assert!(matches!(*seen.borrow(), Some(Value::Bool(true))));
    }

    #[test]
    fn dangling_reference_is_detected() {
        let mut ctx = DeContext::new();
        ctx.register_fixup(ObjId(3), Box::new(|_| {}));
        assert!(ctx.has_dangling_references());
        ctx.resolve(ObjId(3), Value::Null);
        assert!(!ctx.has_dangling_references());
    }
}
