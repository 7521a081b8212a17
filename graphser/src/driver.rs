//! The explicit-stack serialize/deserialize machine.
//!
//! Both directions walk the value/header tree with a plain `Vec`-based
//! frame stack rather than host recursion, so a few thousand levels of
//! nesting never risks a stack overflow in the caller's process. This is
//! simpler than it would be in a codec framework built around borrowed
//! trait objects: every [`Value`] and [`Node`] here is owned (or
//! `Rc`-shared), so a frame can just hold the data it needs directly
//! instead of juggling lifetimes across suspension points.
use bytes::Bytes;

use crate::builtins::{opaque, placeholder, BytesCodec, ListCodec, MappingCodec, PrimitiveCodec, TextCodec, TupleCodec};
use crate::codec::{ChildSlot, Codec, Serialized, Subs};
use crate::dedup::{identity, DeContext, ObjId, SerContext};
use crate::error::{Error, ErrorKind};
use crate::header::{Envelope, Header, Node};
use crate::registry::Registry;
use crate::value::Value;

/// Tuning knobs for one `serialize`/`deserialize` call.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Upper bound on the explicit stack's depth. This guards against
    /// pathological or adversarial inputs; it has nothing to do with the
    /// host call stack, which this driver never recurses on.
    pub max_depth: usize,
}

impl Default for DriverOptions {
    fn default() -> DriverOptions {
        DriverOptions { max_depth: 65536 }
    }
}

fn dispatch(value: &Value) -> &'static dyn Codec {
    match value {
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::UInt(_) | Value::Float(_) => &PrimitiveCodec,
        Value::Bytes(_) => &BytesCodec,
        Value::Text(_) => &TextCodec,
        Value::Tuple(_) => &TupleCodec,
        Value::List(_) => &ListCodec,
        Value::Map(_) => &MappingCodec,
        Value::Opaque(_) => unreachable!("Value::Opaque is dispatched directly in serialize_one/deserialize_one"),
    }
}

// --- serialize ---------------------------------------------------------

struct SerFrame {
    serializer_id: u32,
    obj_id: u32,
    tail: Header,
    pending: std::vec::IntoIter<Value>,
    done: Vec<Node>,
}

enum SerStep {
    Leaf(Node),
    Open(SerFrame),
}

fn serialize_one(value: &Value, ctx: &mut SerContext, registry: &Registry) -> Result<SerStep, Error> {
    if let Value::Opaque(rc) = value {
        let obj_id = identity(value).expect("Opaque values always have identity");
        if !ctx.mark(obj_id) {
            return Ok(SerStep::Leaf(placeholder::node(obj_id)));
        }
        let (serializer_id, tail, buffers) = opaque::serial(rc, registry)?;
        let num_subs = buffers.len() as u32;
        ctx.buffers.extend(buffers);
        return Ok(SerStep::Leaf(Node { serializer_id, obj_id: obj_id.0, num_subs, final_: true, tail, children: Vec::new() }));
    }

    let obj_id = identity(value);
    if let Some(id) = obj_id {
        if !ctx.mark(id) {
            return Ok(SerStep::Leaf(placeholder::node(id)));
        }
    }
    let obj_id = obj_id.unwrap_or(ObjId::NONE);
    let codec = dispatch(value);
    match codec.serial(value, obj_id, ctx, registry)? {
        Serialized::Final { header, buffers } => {
            let num_subs = buffers.len() as u32;
            ctx.buffers.extend(buffers);
            Ok(SerStep::Leaf(Node { serializer_id: codec.serializer_id(), obj_id: obj_id.0, num_subs, final_: true, tail: header, children: Vec::new() }))
        }
        Serialized::Open { header, children } => Ok(SerStep::Open(SerFrame {
            serializer_id: codec.serializer_id(),
            obj_id: obj_id.0,
            tail: header,
            pending: children.into_iter(),
            done: Vec::new(),
        })),
    }
}

fn fold_ser_frame(frame: SerFrame) -> Node {
    let num_subs = frame.done.len() as u32;
    Node { serializer_id: frame.serializer_id, obj_id: frame.obj_id, num_subs, final_: false, tail: frame.tail, children: frame.done }
}

/// Walks `root`, returning its node header and the flat buffer list every
/// `Bytes`/`Text`/opaque leaf contributed, in traversal order.
///
/// `ctx`'s dedup bookkeeping (`seen`) is left untouched on return so a
/// caller-supplied context can be threaded through several calls that
/// share substructure; only the buffers this particular call accumulated
/// are drained and returned, per §6's "context is per-call by default,
/// but caller-scoped" contract.
#[tracing::instrument(level = "trace", skip_all)]
fn serialize_value(root: &Value, registry: &Registry, opts: &DriverOptions, ctx: &mut SerContext) -> Result<(Node, Vec<Bytes>), Error> {
    let mut stack: Vec<SerFrame> = Vec::new();
    let mut current = root.clone();

    'walk: loop {
        if stack.len() > opts.max_depth {
            tracing::warn!(depth = stack.len(), "serialize stack exceeded max_depth");
            return Err(Error::new(ErrorKind::RecursionDepthExceeded, "object graph nesting exceeded max_depth"));
        }
        let mut finished = match serialize_one(&current, ctx, registry)? {
            SerStep::Leaf(node) => node,
            SerStep::Open(mut frame) => match frame.pending.next() {
                Some(next) => {
                    current = next;
                    stack.push(frame);
                    continue 'walk;
                }
                None => fold_ser_frame(frame),
            },
        };
        loop {
            match stack.pop() {
                None => return Ok((finished, std::mem::take(&mut ctx.buffers))),
                Some(mut parent) => {
                    parent.done.push(finished);
                    match parent.pending.next() {
                        Some(next) => {
                            current = next;
                            stack.push(parent);
                            continue 'walk;
                        }
                        None => {
                            finished = fold_ser_frame(parent);
                        }
                    }
                }
            }
        }
    }
}

/// Serializes `value` into a picklable header tree plus a flat list of
/// zero-copy buffers, using a fresh, call-scoped dedup context.
pub fn serialize(value: &Value, registry: &Registry) -> Result<(Envelope, Vec<Bytes>), Error> {
    serialize_with_options(value, registry, &DriverOptions::default())
}

/// Like [`serialize`], but with explicit [`DriverOptions`] and a fresh
/// call-scoped context.
pub fn serialize_with_options(value: &Value, registry: &Registry, opts: &DriverOptions) -> Result<(Envelope, Vec<Bytes>), Error> {
    serialize_with_context(value, registry, None, opts)
}

/// The most general serialize entry point: `ctx` is `Some` when a caller
/// wants dedup bookkeeping to persist across more than one `serialize`
/// call (e.g. several top-level values that alias the same shared
/// substructure), or `None` for a fresh, call-scoped context — matching
/// the `context?` optional parameter in the external interface.
pub fn serialize_with_context(value: &Value, registry: &Registry, ctx: Option<&mut SerContext>, opts: &DriverOptions) -> Result<(Envelope, Vec<Bytes>), Error> {
    let mut owned_ctx;
    let ctx = match ctx {
        Some(ctx) => ctx,
        None => {
            owned_ctx = SerContext::new();
            &mut owned_ctx
        }
    };
    let (root, buffers) = serialize_value(value, registry, opts, ctx)?;
    Ok((Envelope::new(root), buffers))
}

// --- deserialize ---------------------------------------------------------

struct DeFrame {
    node: Node,
    serializer_id: u32,
    obj_id: u32,
    remaining: std::vec::IntoIter<Node>,
    done: Vec<ChildSlot>,
}

enum DeStep {
    Leaf(ChildSlot),
    Open(DeFrame),
}

struct BufferCursor<'a> {
    buffers: &'a [Bytes],
    offset: usize,
}

impl<'a> BufferCursor<'a> {
    fn take(&mut self, count: u32) -> Result<&'a [Bytes], Error> {
        let count = count as usize;
        let end = self.offset.checked_add(count).ok_or_else(|| Error::new(ErrorKind::BufferCountMismatch, "buffer count overflowed"))?;
        if end > self.buffers.len() {
            return Err(Error::new(ErrorKind::BufferCountMismatch, "node claimed more buffers than were supplied"));
        }
        let slice = &self.buffers[self.offset..end];
        self.offset = end;
        Ok(slice)
    }
}

fn deserialize_one(node: Node, bufs: &mut BufferCursor<'_>, ctx: &mut DeContext, registry: &Registry) -> Result<DeStep, Error> {
    if node.serializer_id == 7 {
        let obj_id = ObjId(node.obj_id);
        return Ok(DeStep::Leaf(match ctx.lookup(obj_id) {
            Some(v) => ChildSlot::Ready(v),
            None => ChildSlot::Pending(obj_id),
        }));
    }

    if node.final_ {
        let buffers = bufs.take(node.num_subs)?;
        let value = match node.serializer_id {
            1 => PrimitiveCodec.deserial(&node.tail, Subs::Buffers(buffers), ctx, registry)?,
            2 => BytesCodec.deserial(&node.tail, Subs::Buffers(buffers), ctx, registry)?,
            3 => TextCodec.deserial(&node.tail, Subs::Buffers(buffers), ctx, registry)?,
            id if id >= 8 => Value::Opaque(opaque::deserial(id, &node.tail, buffers, ctx, registry)?),
            id => {
                tracing::error!(serializer_id = id, "header node claimed a final serializer id with no matching codec");
                return Err(Error::new(ErrorKind::UnknownSerializerId, format!("unknown final serializer id {id}")));
            }
        };
        if node.obj_id != 0 {
            ctx.resolve(ObjId(node.obj_id), value.clone());
        }
        return Ok(DeStep::Leaf(ChildSlot::Ready(value)));
    }

    let serializer_id = node.serializer_id;
    let obj_id = node.obj_id;
    let children = node.children.clone();
    Ok(DeStep::Open(DeFrame { node, serializer_id, obj_id, remaining: children.into_iter(), done: Vec::new() }))
}

fn fold_de_frame(frame: DeFrame, ctx: &mut DeContext, registry: &Registry) -> Result<ChildSlot, Error> {
    let value = match frame.serializer_id {
        4 => TupleCodec.deserial(&frame.node.tail, Subs::Children(frame.done), ctx, registry)?,
        5 => ListCodec.deserial(&frame.node.tail, Subs::Children(frame.done), ctx, registry)?,
        6 => MappingCodec.deserial(&frame.node.tail, Subs::Children(frame.done), ctx, registry)?,
        id => {
            tracing::error!(serializer_id = id, "header node claimed a non-final serializer id with no matching codec");
            return Err(Error::new(ErrorKind::UnknownSerializerId, format!("unknown non-final serializer id {id}")));
        }
    };
    ctx.resolve(ObjId(frame.obj_id), value.clone());
    Ok(ChildSlot::Ready(value))
}

/// Reconstructs a value from a header tree and the buffers `serialize`
/// produced alongside it, using a fresh, call-scoped context.
#[tracing::instrument(level = "trace", skip_all)]
pub fn deserialize(envelope: &Envelope, buffers: &[Bytes]) -> Result<Value, Error> {
    deserialize_with(envelope, buffers, &Registry::new(), &DriverOptions::default())
}

/// Like [`deserialize`], but with an explicit registry (for resolving
/// opaque values) and driver options, and a fresh call-scoped context.
pub fn deserialize_with(envelope: &Envelope, buffers: &[Bytes], registry: &Registry, opts: &DriverOptions) -> Result<Value, Error> {
    deserialize_with_context(envelope, buffers, registry, None, opts)
}

/// The most general deserialize entry point: `ctx` is `Some` when a
/// caller wants placeholder-resolution bookkeeping to persist across more
/// than one `deserialize` call against envelopes that reference shared
/// identities, or `None` for a fresh, call-scoped context — the dual of
/// [`serialize_with_context`].
pub fn deserialize_with_context(
    envelope: &Envelope,
    buffers: &[Bytes],
    registry: &Registry,
    ctx: Option<&mut DeContext>,
    opts: &DriverOptions,
) -> Result<Value, Error> {
    let mut owned_ctx;
    let ctx = match ctx {
        Some(ctx) => ctx,
        None => {
            owned_ctx = DeContext::new();
            &mut owned_ctx
        }
    };
    let mut bufs = BufferCursor { buffers, offset: 0 };
    let mut stack: Vec<DeFrame> = Vec::new();
    let mut current = envelope.root.clone();

    let root = 'walk: loop {
        if stack.len() > opts.max_depth {
            tracing::warn!(depth = stack.len(), "deserialize stack exceeded max_depth");
            return Err(Error::new(ErrorKind::RecursionDepthExceeded, "header tree nesting exceeded max_depth"));
        }
        let mut finished = match deserialize_one(current, &mut bufs, ctx, registry)? {
            DeStep::Leaf(slot) => slot,
            DeStep::Open(mut frame) => match frame.remaining.next() {
                Some(next) => {
                    current = next;
                    stack.push(frame);
                    continue 'walk;
                }
                None => fold_de_frame(frame, ctx, registry)?,
            },
        };
        loop {
            match stack.pop() {
                None => break 'walk finished,
                Some(mut parent) => {
                    parent.done.push(finished);
                    match parent.remaining.next() {
                        Some(next) => {
                            current = next;
                            stack.push(parent);
                            continue 'walk;
                        }
                        None => {
                            finished = fold_de_frame(parent, ctx, registry)?;
                        }
                    }
                }
            }
        }
    };

    if ctx.has_dangling_references() {
        tracing::error!("header referenced an object identity that never materialized");
        return Err(Error::new(ErrorKind::MalformedHeader, "header referenced an object identity that never materialized"));
    }

    match root {
        ChildSlot::Ready(v) => Ok(v),
        ChildSlot::Pending(_) => {
            tracing::error!("root node resolved to an unresolved placeholder");
            Err(Error::new(ErrorKind::MalformedHeader, "root node resolved to an unresolved placeholder"))
        }
    }
}
