//! Pretty-prints a [`graphser::Envelope`]/buffer pair produced by
//! `graphser::serialize` in `Debug` format, for tests and ad-hoc
//! inspection.
//!
//! Mirrors how `deser-debug` walks its source crate's event stream and
//! renders scalars/collections with hex-escaped byte strings; here the
//! walk is over a [`graphser::Node`] tree instead of a flat event stream,
//! since that's graphser's own wire shape. Rendering builds plain
//! `String`s bottom-up (rather than writing straight into the
//! `fmt::Formatter`, as `deser-debug` does) because the mapping rule's
//! children are laid out "all keys, then all values" while the buffer
//! cursor must still be advanced in that same flat order even though
//! display interleaves key/value pairs row by row.
use std::fmt;

use bytes::Bytes;

use graphser::{Envelope, Header, Node};

/// Formats a serialized header tree (and its buffers) as `Debug`/`Display`
/// output, resolving buffers and header holes back into readable values
/// without performing a full `deserialize` (no `Registry`, no placeholder
/// fixups — this is a display helper, not a second deserializer).
pub struct ToDebug<'a> {
    root: &'a Node,
    buffers: &'a [Bytes],
}

impl<'a> ToDebug<'a> {
    pub fn new(envelope: &'a Envelope, buffers: &'a [Bytes]) -> ToDebug<'a> {
        ToDebug { root: &envelope.root, buffers }
    }
}

impl fmt::Display for ToDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Debug for ToDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cursor = BufferCursor { buffers: self.buffers, offset: 0 };
        write!(f, "{}", render_node(self.root, &mut cursor))
    }
}

struct BufferCursor<'a> {
    buffers: &'a [Bytes],
    offset: usize,
}

impl<'a> BufferCursor<'a> {
    fn take(&mut self, count: u32) -> &'a [Bytes] {
        let count = count as usize;
        let end = (self.offset + count).min(self.buffers.len());
        let slice = &self.buffers[self.offset..end];
        self.offset = end;
        slice
    }
}

fn render_bytes(bytes: &[u8]) -> String {
    let mut out = String::from("b\"");
    for &b in bytes {
        match b {
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'\\' | b'"' => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('"');
    out
}

fn render_header_scalar(header: &Header) -> String {
    match header {
        Header::Unit => "()".to_string(),
        Header::Hole => "<pending>".to_string(),
        Header::Bool(v) => format!("{v:?}"),
        Header::Int(v) => format!("{v:?}"),
        Header::UInt(v) => format!("{v:?}"),
        Header::Float(v) => format!("{v:?}"),
        Header::Str(v) => format!("{v:?}"),
        Header::Bytes(v) => render_bytes(v),
        Header::List(items) => {
            let parts: Vec<String> = items.iter().map(render_header_scalar).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

fn render_node(node: &Node, cursor: &mut BufferCursor<'_>) -> String {
    match node.serializer_id {
        1 => render_header_scalar(&node.tail),
        2 => {
            let bufs = cursor.take(node.num_subs);
            render_bytes(bufs.first().map_or(&[][..], |b| &b[..]))
        }
        3 => {
            let bufs = cursor.take(node.num_subs);
            let text = bufs.first().map(|b| String::from_utf8_lossy(b).into_owned()).unwrap_or_default();
            format!("{text:?}")
        }
        4 | 5 => render_collection(node, cursor),
        6 => render_mapping(node, cursor),
        7 => format!("Placeholder(#{})", node.obj_id),
        id => {
            let bufs = cursor.take(node.num_subs);
            format!("Opaque(id={id}, {} buffer(s))", bufs.len())
        }
    }
}

fn residual_of(tail: &Header, index: usize) -> &[Header] {
    tail.as_list().and_then(|parts| parts.get(index)).and_then(Header::as_list).unwrap_or(&[])
}

fn render_collection(node: &Node, cursor: &mut BufferCursor<'_>) -> String {
    let residual = residual_of(&node.tail, 0);
    let mut children = node.children.iter();
    let parts: Vec<String> = residual
        .iter()
        .map(|header| match header {
            Header::Hole => children.next().map(|child| render_node(child, cursor)).unwrap_or_default(),
            other => render_header_scalar(other),
        })
        .collect();
    format!("[{}]", parts.join(", "))
}

fn render_mapping(node: &Node, cursor: &mut BufferCursor<'_>) -> String {
    let key_residual = residual_of(&node.tail, 0);
    let value_residual = residual_of(&node.tail, 1);
    // Children are appended key-holes-first, then value-holes, per the
    // mapping rule (`key_children.extend(value_children)`), so each side
    // must be fully rendered (and its buffers consumed) before the other,
    // even though the final `{key: value, ...}` display interleaves them.
    let key_hole_count = key_residual.iter().filter(|h| matches!(h, Header::Hole)).count();
    let (key_children, value_children) = node.children.split_at(key_hole_count.min(node.children.len()));

    let mut key_children = key_children.iter();
    let key_rendered: Vec<String> = key_residual
        .iter()
        .map(|header| match header {
            Header::Hole => key_children.next().map(|child| render_node(child, cursor)).unwrap_or_default(),
            other => render_header_scalar(other),
        })
        .collect();

    let mut value_children = value_children.iter();
    let value_rendered: Vec<String> = value_residual
        .iter()
        .map(|header| match header {
            Header::Hole => value_children.next().map(|child| render_node(child, cursor)).unwrap_or_default(),
            other => render_header_scalar(other),
        })
        .collect();

    let parts: Vec<String> = key_rendered
        .into_iter()
        .zip(value_rendered)
        .map(|(k, v)| format!("{k}: {v}"))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphser::{serialize, Registry, Value};

    #[test]
    fn formats_scalars_and_collections() {
        let v = Value::list(vec![Value::Int(1), Value::text("hi")]);
        let (envelope, buffers) = serialize(&v, &Registry::new()).unwrap();
        let rendered = format!("{:?}", ToDebug::new(&envelope, &buffers));
        assert_eq!(rendered, "[1, \"hi\"]");
    }

    #[test]
    fn formats_a_map() {
        let v = Value::map(vec![(Value::text("k"), Value::text("v"))]);
        let (envelope, buffers) = serialize(&v, &Registry::new()).unwrap();
        let rendered = format!("{:?}", ToDebug::new(&envelope, &buffers));
        assert_eq!(rendered, "{\"k\": \"v\"}");
    }

    #[test]
    fn escapes_raw_bytes() {
        let v = Value::bytes(vec![b'a', 0, b'\n']);
        let (envelope, buffers) = serialize(&v, &Registry::new()).unwrap();
        let rendered = format!("{:?}", ToDebug::new(&envelope, &buffers));
        assert_eq!(rendered, "b\"a\\x00\\n\"");
    }

    #[test]
    fn renders_a_mapping_with_mixed_inline_and_propagated_values() {
        let long_value = "y".repeat(2000);
        let v = Value::map(vec![(Value::text("short"), Value::text(long_value.clone()))]);
        let (envelope, buffers) = serialize(&v, &Registry::new()).unwrap();
        let rendered = format!("{:?}", ToDebug::new(&envelope, &buffers));
        assert_eq!(rendered, format!("{{\"short\": {:?}}}", long_value));
    }
}
