//! `DATA_UPDATE` record codec: the concatenated value-record format carried
//! inside a `DATA_UPDATE` frame payload.
//!
//! Decoding produces `(id, RecordBody)` pairs; applying them to a
//! [`Graph`](companion_types::Graph) is [`Graph::apply`]'s job, kept in
//! `companion-types` so the graph's own invariants live next to its data.
//! This keeps [`RecordDecoder`] a plain iterator a caller can drive in
//! bounded chunks — the cooperative-yield point belongs to the service
//! runtime, not to this decoder.

use std::collections::BTreeMap;

use companion_types::graph::{Id, Node, RecordBody};
use companion_types::{Graph, ValueType};

use crate::error::RecordError;
use crate::primitive;

/// Decodes one `value_type ∥ id ∥ body` record from the front of `input`.
pub fn decode_record(input: &[u8]) -> Result<(&[u8], (Id, RecordBody)), RecordError> {
    let (rest, tag) = primitive::decode_u8(input).map_err(|_| RecordError::Incomplete)?;
    let value_type = ValueType::from_tag(tag).ok_or_else(|| {
        log::warn!("unknown value_type tag {tag}, cannot continue decoding this payload");
        RecordError::UnknownValueType(tag)
    })?;
    let (rest, id) = primitive::decode_u32(rest).map_err(|_| RecordError::Incomplete)?;
    let (rest, body) = decode_body(value_type, rest)?;
    Ok((rest, (id, body)))
}

fn decode_body(value_type: ValueType, input: &[u8]) -> Result<(&[u8], RecordBody), RecordError> {
    let incomplete = |_| RecordError::Incomplete;
    match value_type {
        ValueType::Bool => {
            let (rest, v) = primitive::decode_bool(input).map_err(incomplete)?;
            Ok((rest, RecordBody::Bool(v)))
        }
        ValueType::Int8 => {
            let (rest, v) = primitive::decode_i8(input).map_err(incomplete)?;
            Ok((rest, RecordBody::Int8(v)))
        }
        ValueType::Uint8 => {
            let (rest, v) = primitive::decode_u8(input).map_err(incomplete)?;
            Ok((rest, RecordBody::Uint8(v)))
        }
        ValueType::Int32 => {
            let (rest, v) = primitive::decode_i32(input).map_err(incomplete)?;
            Ok((rest, RecordBody::Int32(v)))
        }
        ValueType::Uint32 => {
            let (rest, v) = primitive::decode_u32(input).map_err(incomplete)?;
            Ok((rest, RecordBody::Uint32(v)))
        }
        ValueType::Float => {
            let (rest, v) = primitive::decode_f32(input).map_err(incomplete)?;
            Ok((rest, RecordBody::Float(v)))
        }
        ValueType::String => {
            let (rest, v) = primitive::parse_cstring_lossy(input).map_err(incomplete)?;
            Ok((rest, RecordBody::String(v)))
        }
        ValueType::Array => decode_array_body(input),
        ValueType::Object => decode_object_body(input),
    }
}

fn decode_array_body(input: &[u8]) -> Result<(&[u8], RecordBody), RecordError> {
    let (mut rest, n) = primitive::decode_u16(input).map_err(|_| RecordError::Incomplete)?;
    let mut children = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let (next, child) = primitive::decode_u32(rest).map_err(|_| RecordError::Incomplete)?;
        children.push(child);
        rest = next;
    }
    Ok((rest, RecordBody::Array(children)))
}

fn decode_object_body(input: &[u8]) -> Result<(&[u8], RecordBody), RecordError> {
    let (mut rest, na) = primitive::decode_u16(input).map_err(|_| RecordError::Incomplete)?;
    let mut added = BTreeMap::new();
    for _ in 0..na {
        let (next, child_id) = primitive::decode_u32(rest).map_err(|_| RecordError::Incomplete)?;
        let (next, key) = primitive::parse_cstring_lossy(next).map_err(|_| RecordError::Incomplete)?;
        added.insert(key, child_id);
        rest = next;
    }
    let (mut rest, nr) = primitive::decode_u16(rest).map_err(|_| RecordError::Incomplete)?;
    let mut removed = Vec::with_capacity(nr as usize);
    for _ in 0..nr {
        let (next, child_id) = primitive::decode_u32(rest).map_err(|_| RecordError::Incomplete)?;
        removed.push(child_id);
        rest = next;
    }
    Ok((rest, RecordBody::Object { added, removed }))
}

/// Iterates the records of one `DATA_UPDATE` payload. An empty payload is a
/// legal, immediately-exhausted sequence.
pub struct RecordDecoder<'a> {
    remaining: &'a [u8],
}

impl<'a> RecordDecoder<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { remaining: payload }
    }
}

impl<'a> Iterator for RecordDecoder<'a> {
    type Item = Result<(Id, RecordBody), RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        match decode_record(self.remaining) {
            Ok((rest, record)) => {
                self.remaining = rest;
                Some(Ok(record))
            }
            Err(err) => {
                // A malformed tail is not recoverable by feeding more bytes
                // here — the DATA_UPDATE frame payload is already whole.
                self.remaining = &[];
                Some(Err(err))
            }
        }
    }
}

fn encode_absolute_body(node: &Node, out: &mut Vec<u8>) {
    match node {
        Node::Bool(v) => primitive::encode_bool(*v, out),
        Node::Int8(v) => primitive::encode_i8(*v, out),
        Node::Uint8(v) => primitive::encode_u8(*v, out),
        Node::Int32(v) => primitive::encode_i32(*v, out),
        Node::Uint32(v) => primitive::encode_u32(*v, out),
        Node::Float(v) => primitive::encode_f32(*v, out),
        Node::String(v) => primitive::encode_cstring(v, out),
        Node::Array(children) => {
            primitive::encode_u16(children.len() as u16, out);
            for child in children {
                primitive::encode_u32(*child, out);
            }
        }
        Node::Object(entries) => {
            primitive::encode_u16(entries.len() as u16, out);
            for (key, child) in entries {
                primitive::encode_u32(*child, out);
                primitive::encode_cstring(key, out);
            }
            primitive::encode_u16(0, out); // removed: absolute encode has none
        }
    }
}

/// Encodes `id`'s current node as one absolute record.
pub fn encode_record(id: Id, node: &Node) -> Vec<u8> {
    let mut out = Vec::new();
    primitive::encode_u8(node.value_type().tag(), &mut out);
    primitive::encode_u32(id, &mut out);
    encode_absolute_body(node, &mut out);
    out
}

/// Encodes an OBJECT `id` as a diff relative to `prev_state`: removed
/// entries are values present in `prev_state` but absent, or changed, in
/// `current`; added entries are the reverse.
pub fn encode_object_diff(id: Id, prev_state: &BTreeMap<String, Id>, current: &BTreeMap<String, Id>) -> Vec<u8> {
    let mut removed = Vec::new();
    let mut added = BTreeMap::new();
    for (key, prev_value) in prev_state {
        match current.get(key) {
            Some(current_value) if current_value == prev_value => {}
            Some(current_value) => {
                removed.push(*prev_value);
                added.insert(key.clone(), *current_value);
            }
            None => removed.push(*prev_value),
        }
    }
    for (key, current_value) in current {
        if prev_state.get(key) != Some(current_value) {
            added.insert(key.clone(), *current_value);
        }
    }

    let mut out = Vec::new();
    primitive::encode_u8(ValueType::Object.tag(), &mut out);
    primitive::encode_u32(id, &mut out);
    primitive::encode_u16(added.len() as u16, &mut out);
    for (key, child) in &added {
        primitive::encode_u32(*child, &mut out);
        primitive::encode_cstring(key, &mut out);
    }
    primitive::encode_u16(removed.len() as u16, &mut out);
    for child in &removed {
        primitive::encode_u32(*child, &mut out);
    }
    out
}

/// A full-snapshot `DATA_UPDATE` payload for `roots` and everything they
/// reach, in referenced-before-referencing order.
pub fn full_snapshot(graph: &Graph, roots: &[Id]) -> Vec<u8> {
    let mut out = Vec::new();
    for id in graph.snapshot_order(roots) {
        if let Some(node) = graph.get(id) {
            out.extend_from_slice(&encode_record(id, node));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_types::graph::RecordBody;

    #[test]
    fn decodes_a_root_object_record_with_one_added_child() {
        let payload = [
            0x00, 0x00, 0x00, 0x00, 0x00, // OBJECT id=0
            0x01, 0x00, // na=1
            0x02, 0x00, 0x00, 0x00, b'f', b'o', b'o', 0x00, // child_id=2, key="foo\0"
            0x00, 0x00, // nr=0
        ];
        let (rest, (id, body)) = decode_record(&payload).unwrap();
        assert!(rest.is_empty());
        assert_eq!(id, 0);
        assert_eq!(
            body,
            RecordBody::Object {
                added: BTreeMap::from([("foo".to_string(), 2)]),
                removed: Vec::new(),
            }
        );
    }

    #[test]
    fn decodes_a_primitive_uint32_record() {
        let payload = [0x04, 0x02, 0x00, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00];
        let (rest, (id, body)) = decode_record(&payload).unwrap();
        assert!(rest.is_empty());
        assert_eq!(id, 2);
        assert_eq!(body, RecordBody::Uint32(42));
    }

    #[test]
    fn decodes_an_object_diff_that_only_removes_an_entry() {
        let payload = [
            0x08, 0x00, 0x00, 0x00, 0x00, // OBJECT id=0
            0x00, 0x00, // na=0
            0x01, 0x00, 0x02, 0x00, 0x00, 0x00, // nr=1, removed=[2]
        ];
        let (rest, (id, body)) = decode_record(&payload).unwrap();
        assert!(rest.is_empty());
        assert_eq!(id, 0);
        assert_eq!(
            body,
            RecordBody::Object {
                added: BTreeMap::new(),
                removed: vec![2],
            }
        );
    }

    #[test]
    fn object_diff_removing_from_an_unseen_id_decodes_fine_but_fails_to_apply() {
        // Decoding never fails for this payload; the error only fires in
        // `Graph::apply` once the id's prior state (unknown) is known.
        let payload = [
            0x08, 0x07, 0x00, 0x00, 0x00, // OBJECT id=7
            0x00, 0x00, // na=0
            0x01, 0x00, 0x09, 0x00, 0x00, 0x00, // nr=1, removed=[9]
        ];
        let (_, (id, body)) = decode_record(&payload).unwrap();
        let mut graph = Graph::new();
        let err = graph.apply(id, body).unwrap_err();
        assert_eq!(
            err,
            companion_types::GraphError::NonEmptyRemovedOnNewObject { id: 7 }
        );
    }

    #[test]
    fn empty_payload_has_no_records() {
        assert!(RecordDecoder::new(&[]).next().is_none());
    }

    #[test]
    fn unknown_value_type_is_reported() {
        let payload = [0xFF, 0, 0, 0, 0];
        assert_eq!(decode_record(&payload), Err(RecordError::UnknownValueType(0xFF)));
    }

    #[test]
    fn record_decoder_yields_every_record_in_order() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&encode_record(1, &Node::Bool(true)));
        payload.extend_from_slice(&encode_record(2, &Node::Uint8(9)));
        let decoded: Vec<_> = RecordDecoder::new(&payload).map(|r| r.unwrap()).collect();
        assert_eq!(decoded, vec![(1, RecordBody::Bool(true)), (2, RecordBody::Uint8(9))]);
    }

    #[test]
    fn object_diff_encode_matches_direct_mutation() {
        let prev = BTreeMap::from([("a".to_string(), 1u32), ("b".to_string(), 2)]);
        let current = BTreeMap::from([("a".to_string(), 1u32), ("b".to_string(), 3)]);

        let mut graph = Graph::new();
        graph
            .apply(
                0,
                RecordBody::Object {
                    added: prev.clone(),
                    removed: Vec::new(),
                },
            )
            .unwrap();

        let diff_bytes = encode_object_diff(0, &prev, &current);
        let (_, (id, body)) = decode_record(&diff_bytes).unwrap();
        graph.apply(id, body).unwrap();

        assert_eq!(graph.get(0), Some(&Node::Object(current)));
    }

    #[test]
    fn full_snapshot_reproduces_graph_after_fresh_decode() {
        let mut graph = Graph::new();
        graph.apply(2, RecordBody::Uint32(42)).unwrap();
        graph
            .apply(
                0,
                RecordBody::Object {
                    added: BTreeMap::from([("foo".to_string(), 2)]),
                    removed: Vec::new(),
                },
            )
            .unwrap();

        let snapshot = full_snapshot(&graph, &[0]);

        let mut fresh = Graph::new();
        for record in RecordDecoder::new(&snapshot) {
            let (id, body) = record.unwrap();
            fresh.apply(id, body).unwrap();
        }

        assert_eq!(fresh.materialize(0), graph.materialize(0));
        assert_eq!(fresh.get(2), graph.get(2));
    }

    #[test]
    fn applying_the_same_absolute_update_twice_is_idempotent() {
        let mut graph = Graph::new();
        graph.apply(5, RecordBody::Uint32(7)).unwrap();
        let snapshot_once = graph.clone();
        graph.apply(5, RecordBody::Uint32(7)).unwrap();
        assert_eq!(graph.get(5), snapshot_once.get(5));
    }
}
