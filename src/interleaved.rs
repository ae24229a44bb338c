//! Interleaved region decompression.
//!
//! A region starts with one of three control bytes, then carries a reference
//! object describing row shape, then the value sections of every leaf merged
//! into a single byte stream, then an end byte. Decompression runs one or
//! both of two cooperating passes:
//!
//! * The row pass replays the reference shape once per row, pulling the next
//!   value of each leaf as the traversal reaches it. It can rebuild whole
//!   subtrees, so any requested path goes through it.
//! * The stream pass never looks at row shape. It keeps a min-heap of
//!   streams keyed by values produced so far, and hands the next section to
//!   the stream the encoder must have written it for. Requests for a single
//!   scalar leaf are filled here, and the pass always runs to cross-check
//!   where the region ends.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use bumpalo::Bump;

use crate::buffer::{ColumnValue, Request};
use crate::element::{element_size, Element, Parser};
use crate::error::{Error, Result};
use crate::marker::{Control, MAX_BLOCKS_PER_SECTION};
use crate::reference::{RefKind, RefTree, WalkEvent};
use crate::simple8b::SlotCursor;
use crate::stream::{DecodingState, LeafValue};
use crate::subobj::Assembler;

/// Decompress one interleaved region, filling each request with one value
/// per row. Returns the number of bytes the region occupied at the front of
/// `data`.
///
/// Values borrow from `data` where they can and from `arena` where a subtree
/// had to be reassembled.
///
/// Requested paths must not nest: asking for both a subtree and something
/// inside it is rejected up front. A path that addresses nothing in this
/// region's shape just leaves its buffer empty.
pub fn decompress<'a>(
    arena: &'a Bump,
    data: &'a [u8],
    requests: &mut [Request<'a>],
) -> Result<usize> {
    let start = *data.first().ok_or(Error::LengthTooShort {
        step: "region start",
        actual: 0,
        expected: 1,
    })?;
    let (traverse_arrays, array_root) = match Control::from_u8(start) {
        Control::InterleavedObject => (false, false),
        Control::InterleavedObjectFull => (true, false),
        Control::InterleavedArray => (true, true),
        _ => {
            return Err(Error::Corrupt(format!(
                "Expected an interleaved region start, got byte 0x{:02x}",
                start
            )))
        }
    };
    let tree = RefTree::parse(&data[1..], traverse_arrays, array_root)?;
    let body = &data[1 + tree.size()..];

    let matches: Vec<Vec<usize>> = requests
        .iter()
        .map(|r| tree.match_path(r.path()))
        .collect();

    for i in 0..matches.len() {
        for j in i + 1..matches.len() {
            for &a in &matches[i] {
                for &b in &matches[j] {
                    if tree.is_ancestor(a, b) || tree.is_ancestor(b, a) {
                        return Err(Error::Unsupported(format!(
                            "Requested paths nest: \"{}\" and \"{}\"",
                            requests[i].path(),
                            requests[j].path()
                        )));
                    }
                }
            }
        }
    }

    // A request is stream-pass material when it lands on exactly one leaf
    // holding a plain scalar. Everything else needs row replay.
    let mut stream_filled = vec![true; requests.len()];
    let mut need_rows = false;
    for (req, nodes) in matches.iter().enumerate() {
        let fast = match nodes.as_slice() {
            [] => true,
            &[node] => {
                let node = tree.node(node);
                node.is_leaf() && leaf_is_scalar(node.raw)?
            }
            _ => false,
        };
        stream_filled[req] = fast;
        need_rows |= !fast;
    }

    let row_end = if need_rows {
        Some(row_pass(
            arena,
            &tree,
            body,
            requests,
            &matches,
            &stream_filled,
        )?)
    } else {
        None
    };

    let stream_end = stream_pass(&tree, body, requests, &matches, &stream_filled)?;
    if let Some(row_end) = row_end {
        if row_end != stream_end {
            return Err(Error::InternalConsistency(format!(
                "Row and stream passes consumed {} and {} body bytes",
                row_end, stream_end
            )));
        }
    }

    Ok(1 + tree.size() + stream_end)
}

/// One value section of the merged stream.
enum Section<'a> {
    /// A complete encoded element, contributing one value.
    Literal(&'a [u8]),
    /// Packed delta blocks, contributing one value per slot.
    Blocks(&'a [u8]),
    End,
}

fn read_section<'a>(body: &'a [u8], pos: &mut usize) -> Result<Section<'a>> {
    let byte = *body.get(*pos).ok_or(Error::LengthTooShort {
        step: "control byte",
        actual: *pos,
        expected: *pos + 1,
    })?;
    match Control::from_u8(byte) {
        Control::Literal => {
            let size = element_size(&body[*pos..])?;
            let raw = &body[*pos..*pos + size];
            *pos += size;
            Ok(Section::Literal(raw))
        }
        Control::DeltaBlocks => {
            let count = *body.get(*pos + 1).ok_or(Error::LengthTooShort {
                step: "block count",
                actual: *pos + 1,
                expected: *pos + 2,
            })? as usize;
            if count == 0 || count > MAX_BLOCKS_PER_SECTION {
                return Err(Error::Corrupt(format!(
                    "Delta section with a block count of {}",
                    count
                )));
            }
            let start = *pos + 2;
            let end = start + 8 * count;
            if end > body.len() {
                return Err(Error::LengthTooShort {
                    step: "delta blocks",
                    actual: body.len().saturating_sub(start),
                    expected: 8 * count,
                });
            }
            *pos = end;
            Ok(Section::Blocks(&body[start..end]))
        }
        Control::DeltaOfDelta => Err(Error::Unsupported(
            "Delta-of-delta sections are not handled".into(),
        )),
        Control::Wide128 => Err(Error::Unsupported(
            "128-bit wide sections are not handled".into(),
        )),
        Control::InterleavedObject
        | Control::InterleavedObjectFull
        | Control::InterleavedArray => Err(Error::Corrupt(
            "Interleaved region start inside an interleaved region".into(),
        )),
        Control::End => {
            *pos += 1;
            Ok(Section::End)
        }
    }
}

fn leaf_is_scalar(raw: &[u8]) -> Result<bool> {
    let mut parser = Parser::new(raw);
    let elem = parser.next().ok_or(Error::LengthTooShort {
        step: "leaf element",
        actual: 0,
        expected: 1,
    })??;
    Ok(!matches!(elem, Element::Map(_) | Element::Array(_)))
}

fn to_column_value<'a>(value: Option<LeafValue<'a>>) -> ColumnValue<'a> {
    match value {
        None => ColumnValue::Missing,
        Some(LeafValue::Bool(v)) => ColumnValue::Bool(v),
        Some(LeafValue::Int(v)) => ColumnValue::Int(v),
        Some(LeafValue::Raw(bytes)) => ColumnValue::Raw(bytes),
    }
}

struct RowStream<'a> {
    state: DecodingState<'a>,
    cursor: Option<SlotCursor<'a>>,
}

impl<'a> RowStream<'a> {
    fn is_exhausted(&self) -> bool {
        self.cursor.as_ref().map_or(true, |c| c.is_exhausted())
    }

    /// Pull this stream's next value, reading sections off the shared
    /// position as needed.
    fn next_value(&mut self, body: &'a [u8], pos: &mut usize) -> Result<Option<LeafValue<'a>>> {
        loop {
            if let Some(cursor) = &mut self.cursor {
                match cursor.next() {
                    Some(slot) => return self.state.apply_slot(slot?),
                    None => {
                        self.state.set_seed(cursor.last_slot());
                        self.cursor = None;
                    }
                }
            }
            match read_section(body, pos)? {
                Section::Literal(raw) => {
                    self.state.load_literal(raw)?;
                    return Ok(Some(self.state.last()));
                }
                Section::Blocks(blocks) => {
                    self.cursor = Some(SlotCursor::new(blocks, self.state.seed())?);
                }
                Section::End => {
                    return Err(Error::Corrupt(
                        "Region ended in the middle of a row".into(),
                    ))
                }
            }
        }
    }
}

fn row_pass<'a>(
    arena: &'a Bump,
    tree: &RefTree<'a>,
    body: &'a [u8],
    requests: &mut [Request<'a>],
    matches: &[Vec<usize>],
    stream_filled: &[bool],
) -> Result<usize> {
    let events = tree.events();
    let mut targets: Vec<Vec<usize>> = vec![Vec::new(); tree.len()];
    for (req, nodes) in matches.iter().enumerate() {
        if stream_filled[req] {
            continue;
        }
        for &node in nodes {
            targets[node].push(req);
        }
    }

    let mut streams: Vec<RowStream<'a>> = Vec::with_capacity(tree.leaves());
    for node in tree.nodes() {
        if node.is_leaf() {
            streams.push(RowStream {
                state: DecodingState::new(node.raw)?,
                cursor: None,
            });
        }
    }

    let mut asm = Assembler::new();
    let mut pos = 0;
    loop {
        // The region can only end on a row boundary, so the end byte shows
        // up exactly when the first stream is out of slots.
        if streams[0].is_exhausted() {
            let byte = *body.get(pos).ok_or(Error::LengthTooShort {
                step: "region end",
                actual: pos,
                expected: pos + 1,
            })?;
            if Control::from_u8(byte) == Control::End {
                for (leaf, stream) in streams.iter().enumerate() {
                    if !stream.is_exhausted() {
                        return Err(Error::Corrupt(format!(
                            "Stream {} still has values at region end",
                            leaf
                        )));
                    }
                }
                pos += 1;
                return Ok(pos);
            }
        }

        for event in &events {
            match *event {
                WalkEvent::Enter(idx) => {
                    let node = tree.node(idx);
                    let targeted = !targets[idx].is_empty();
                    if asm.active() || targeted {
                        let is_array = matches!(node.kind, RefKind::Array { .. });
                        asm.enter(node.key, is_array, targeted);
                    }
                }
                WalkEvent::Leaf(idx) => {
                    let node = tree.node(idx);
                    let leaf = node.leaf_index.ok_or_else(|| {
                        Error::InternalConsistency("Leaf node without a stream".into())
                    })?;
                    let value = streams[leaf].next_value(body, &mut pos)?;
                    if asm.active() {
                        if let Some(ref value) = value {
                            asm.leaf(node.key, value);
                        }
                    }
                    for &req in &targets[idx] {
                        requests[req].buffer_mut().push(to_column_value(value));
                    }
                }
                WalkEvent::Leave(idx) => {
                    if asm.active() {
                        if let Some(doc) = asm.leave() {
                            let bytes: &'a [u8] = arena.alloc_slice_copy(&doc);
                            for &req in &targets[idx] {
                                requests[req].buffer_mut().push(ColumnValue::Raw(bytes));
                            }
                            asm.recycle(doc);
                        }
                    }
                }
            }
        }
    }
}

struct FastStream<'a> {
    state: DecodingState<'a>,
    produced: u64,
}

fn stream_pass<'a>(
    tree: &RefTree<'a>,
    body: &'a [u8],
    requests: &mut [Request<'a>],
    matches: &[Vec<usize>],
    stream_filled: &[bool],
) -> Result<usize> {
    let mut targets: Vec<Vec<usize>> = vec![Vec::new(); tree.leaves()];
    for (req, nodes) in matches.iter().enumerate() {
        if !stream_filled[req] {
            continue;
        }
        for &node in nodes {
            if let Some(leaf) = tree.node(node).leaf_index {
                targets[leaf].push(req);
            }
        }
    }

    let mut streams: Vec<FastStream<'a>> = Vec::with_capacity(tree.leaves());
    for node in tree.nodes() {
        if node.is_leaf() {
            streams.push(FastStream {
                state: DecodingState::new(node.raw)?,
                produced: 0,
            });
        }
    }

    // The encoder drains whichever stream has produced the fewest values,
    // lowest stream first on ties. Replaying that order tells us which
    // stream each section belongs to without ever touching row shape.
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> =
        (0..streams.len()).map(|leaf| Reverse((0, leaf))).collect();

    let mut pos = 0;
    loop {
        let byte = *body.get(pos).ok_or(Error::LengthTooShort {
            step: "control byte",
            actual: pos,
            expected: pos + 1,
        })?;
        if Control::from_u8(byte) == Control::End {
            pos += 1;
            let rows = streams[0].produced;
            for (leaf, stream) in streams.iter().enumerate() {
                if stream.produced != rows {
                    return Err(Error::Corrupt(format!(
                        "Stream {} produced {} values where stream 0 produced {}",
                        leaf, stream.produced, rows
                    )));
                }
            }
            return Ok(pos);
        }

        let Reverse((_, leaf)) = heap.pop().ok_or_else(|| {
            Error::InternalConsistency("Stream heap drained before region end".into())
        })?;
        let stream = &mut streams[leaf];
        match read_section(body, &mut pos)? {
            Section::Literal(raw) => {
                stream.state.load_literal(raw)?;
                stream.produced += 1;
                push_all(requests, &targets[leaf], to_column_value(Some(stream.state.last())));
            }
            Section::Blocks(blocks) => {
                let mut cursor = SlotCursor::new(blocks, stream.state.seed())?;
                while let Some(slot) = cursor.next() {
                    let value = stream.state.apply_slot(slot?)?;
                    stream.produced += 1;
                    push_all(requests, &targets[leaf], to_column_value(value));
                }
                stream.state.set_seed(cursor.last_slot());
            }
            Section::End => {
                return Err(Error::InternalConsistency(
                    "End byte reached the section reader".into(),
                ))
            }
        }
        heap.push(Reverse((streams[leaf].produced, leaf)));
    }
}

fn push_all<'a>(requests: &mut [Request<'a>], targets: &[usize], value: ColumnValue<'a>) {
    for &req in targets {
        requests[req].buffer_mut().push(value);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::ColumnBuilder;
    use crate::marker::{CONTROL_DELTA_OF_DELTA, CONTROL_END, CONTROL_WIDE_128};
    use crate::value::Value;
    use crate::ValueRef;
    use std::collections::BTreeMap;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<String, Value>>(),
        )
    }

    fn compress(rows: &[Value]) -> Vec<u8> {
        let mut builder = ColumnBuilder::new();
        for row in rows {
            builder.append(row).unwrap();
        }
        builder.finish().unwrap()
    }

    #[test]
    fn two_scalar_fields() {
        let rows = vec![
            map(vec![("a", Value::from(1u8)), ("b", Value::from(true))]),
            map(vec![("a", Value::from(2u8)), ("b", Value::from(true))]),
            map(vec![("a", Value::from(2u8)), ("b", Value::from(false))]),
        ];
        let bytes = compress(&rows);
        let arena = Bump::new();
        let mut requests = [Request::new("a"), Request::new("b")];
        let used = decompress(&arena, &bytes, &mut requests).unwrap();
        assert_eq!(used, bytes.len());
        let a: Vec<u64> = requests[0]
            .buffer()
            .iter()
            .map(|v| v.as_u64().unwrap())
            .collect();
        assert_eq!(a, [1, 2, 2]);
        let b: Vec<bool> = requests[1]
            .buffer()
            .iter()
            .map(|v| v.as_bool().unwrap())
            .collect();
        assert_eq!(b, [true, true, false]);
    }

    #[test]
    fn root_request_rebuilds_every_row() {
        let rows = vec![
            map(vec![
                ("n", Value::from(100u64)),
                ("s", Value::from("alpha")),
                ("sub", map(vec![("x", Value::from(-3i64))])),
            ]),
            map(vec![
                ("n", Value::from(101u64)),
                ("s", Value::from("alpha")),
                ("sub", map(vec![("x", Value::from(-2i64))])),
            ]),
            map(vec![("n", Value::from(250u64)), ("s", Value::from("beta"))]),
        ];
        let bytes = compress(&rows);
        let arena = Bump::new();
        let mut requests = [Request::new(crate::Path::root())];
        decompress(&arena, &bytes, &mut requests).unwrap();
        assert_eq!(requests[0].buffer().len(), rows.len());
        for (row, value) in rows.iter().zip(requests[0].buffer().iter()) {
            let decoded = value.value_ref().unwrap().unwrap();
            assert_eq!(*row, decoded);
        }
    }

    #[test]
    fn scalar_agrees_with_rebuilt_rows() {
        let rows = vec![
            map(vec![("a", Value::from(5u8)), ("b", map(vec![("c", Value::from(7u8))]))]),
            map(vec![("a", Value::from(9u8)), ("b", map(vec![("c", Value::from(7u8))]))]),
            map(vec![("b", map(vec![("c", Value::from(8u8))]))]),
        ];
        let bytes = compress(&rows);

        let arena = Bump::new();
        let mut whole = [Request::new(crate::Path::root())];
        decompress(&arena, &bytes, &mut whole).unwrap();

        let arena2 = Bump::new();
        let mut parts = [Request::new("a"), Request::new("b")];
        decompress(&arena2, &bytes, &mut parts).unwrap();

        for row in 0..rows.len() {
            let doc = whole[0].buffer().get(row).unwrap().value_ref().unwrap().unwrap();
            let a = parts[0].buffer().get(row).unwrap();
            match a.value_ref().unwrap() {
                Some(v) => assert_eq!(doc["a"], v),
                None => assert!(doc.as_map().unwrap().get("a").is_none()),
            }
            let b = parts[1].buffer().get(row).unwrap().value_ref().unwrap().unwrap();
            assert_eq!(doc["b"], b);
        }
    }

    #[test]
    fn wholly_missing_subtree_comes_back_empty() {
        let rows = vec![
            map(vec![("a", map(vec![("x", Value::from(1u8))]))]),
            map(vec![]),
        ];
        let bytes = compress(&rows);
        let arena = Bump::new();
        let mut requests = [Request::new("a")];
        decompress(&arena, &bytes, &mut requests).unwrap();
        let row0 = requests[0].buffer().get(0).unwrap().value_ref().unwrap().unwrap();
        assert_eq!(row0["x"], ValueRef::Int(1u8.into()));
        let row1 = requests[0].buffer().get(1).unwrap().value_ref().unwrap().unwrap();
        assert_eq!(row1, ValueRef::Map(BTreeMap::new()));
    }

    #[test]
    fn nested_requests_rejected() {
        let rows = vec![map(vec![("a", map(vec![("x", Value::from(1u8))]))])];
        let bytes = compress(&rows);
        let arena = Bump::new();
        let mut requests = [Request::new("a"), Request::new("a.x")];
        let err = decompress(&arena, &bytes, &mut requests).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn unknown_path_stays_empty() {
        let rows = vec![map(vec![("a", Value::from(1u8))])];
        let bytes = compress(&rows);
        let arena = Bump::new();
        let mut requests = [Request::new("zzz"), Request::new("a")];
        decompress(&arena, &bytes, &mut requests).unwrap();
        assert!(requests[0].buffer().is_empty());
        assert_eq!(requests[1].buffer().len(), 1);
    }

    #[test]
    fn path_through_arrays_lands_on_every_slot() {
        let rows = vec![
            map(vec![(
                "rows",
                Value::Array(vec![
                    map(vec![("v", Value::from(1u8))]),
                    map(vec![("v", Value::from(2u8))]),
                ]),
            )]),
            map(vec![(
                "rows",
                Value::Array(vec![
                    map(vec![("v", Value::from(3u8))]),
                    map(vec![("v", Value::from(4u8))]),
                ]),
            )]),
        ];
        let bytes = compress(&rows);
        let arena = Bump::new();
        let mut requests = [Request::new("rows.v")];
        decompress(&arena, &bytes, &mut requests).unwrap();
        // Two matched leaves, so two entries per row
        let got: Vec<u64> = requests[0]
            .buffer()
            .iter()
            .map(|v| v.as_u64().unwrap())
            .collect();
        assert_eq!(got, [1, 2, 3, 4]);
    }

    #[test]
    fn opaque_arrays_come_back_whole() {
        let rows = vec![
            map(vec![("y", Value::Array(vec![Value::from(1u8), Value::from(2u8)]))]),
            map(vec![("y", Value::Array(vec![Value::from(9u8)]))]),
        ];
        let mut builder = ColumnBuilder::opaque_arrays();
        for row in &rows {
            builder.append(row).unwrap();
        }
        let bytes = builder.finish().unwrap();
        let arena = Bump::new();
        let mut requests = [Request::new("y")];
        decompress(&arena, &bytes, &mut requests).unwrap();
        for (row, value) in rows.iter().zip(requests[0].buffer().iter()) {
            let decoded = value.value_ref().unwrap().unwrap();
            assert_eq!(row["y"], decoded);
        }
    }

    #[test]
    fn array_root() {
        let rows = vec![
            Value::Array(vec![Value::from(10u8), Value::from(20u8)]),
            Value::Array(vec![Value::from(11u8), Value::from(21u8)]),
        ];
        let bytes = compress(&rows);
        let arena = Bump::new();
        let mut requests = [Request::new(crate::Path::root())];
        decompress(&arena, &bytes, &mut requests).unwrap();
        for (row, value) in rows.iter().zip(requests[0].buffer().iter()) {
            assert_eq!(*row, value.value_ref().unwrap().unwrap());
        }
    }

    #[test]
    fn no_requests_still_measures_the_region() {
        let rows = vec![map(vec![("a", Value::from(1u8))])];
        let mut bytes = compress(&rows);
        // Trailing bytes after the region don't count
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let arena = Bump::new();
        let used = decompress(&arena, &bytes, &mut []).unwrap();
        assert_eq!(used, bytes.len() - 2);
    }

    #[test]
    fn delta_of_delta_is_unsupported() {
        // start, {"n": 5}, then a delta-of-delta section
        let bytes = [0xde, 0x81, 0xa1, b'n', 0x05, CONTROL_DELTA_OF_DELTA, CONTROL_END];
        let arena = Bump::new();
        let err = decompress(&arena, &bytes, &mut []).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn wide_values_are_unsupported() {
        let bytes = [0xde, 0x81, 0xa1, b'n', 0x05, CONTROL_WIDE_128, CONTROL_END];
        let arena = Bump::new();
        let err = decompress(&arena, &bytes, &mut []).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn truncated_region_fails() {
        let rows = vec![map(vec![("a", Value::from(1u8))])];
        let mut bytes = compress(&rows);
        bytes.pop();
        let arena = Bump::new();
        let err = decompress(&arena, &bytes, &mut []).unwrap_err();
        assert!(matches!(err, Error::LengthTooShort { .. }));
    }

    #[test]
    fn unequal_stream_lengths_fail() {
        // {"a": 1, "b": 2}, two zero-delta slots for "a" but one for "b"
        let mut bytes = vec![0xde, 0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x02];
        bytes.extend_from_slice(&[0xc7, 0x01]);
        bytes.extend_from_slice(&13u64.to_le_bytes()); // selector 13: two slots
        bytes.extend_from_slice(&[0xc7, 0x01]);
        bytes.extend_from_slice(&14u64.to_le_bytes()); // selector 14: one slot
        bytes.push(CONTROL_END);
        let arena = Bump::new();
        let err = decompress(&arena, &bytes, &mut []).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)));
    }

    #[test]
    fn nested_region_start_fails() {
        let bytes = [0xde, 0x81, 0xa1, b'n', 0x05, 0xde, CONTROL_END];
        let arena = Bump::new();
        let err = decompress(&arena, &bytes, &mut []).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)));
    }

    #[test]
    fn not_a_region_fails() {
        let arena = Bump::new();
        let err = decompress(&arena, &[0x81, 0xa1, b'n', 0x05], &mut []).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)));
    }

    #[test]
    fn randomized_roundtrip_with_missing_fields() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(0xC01);

        // Fixed shape: {"id": int, "name": str, "pos": {"x": int, "y": int}}
        let reference = map(vec![
            ("id", Value::from(0u64)),
            ("name", Value::from("seed")),
            (
                "pos",
                map(vec![("x", Value::from(0i64)), ("y", Value::from(0i64))]),
            ),
        ]);

        for _ in 0..20 {
            let mut rows = vec![reference.clone()];
            for _ in 0..rng.gen_range(1..40) {
                let mut row = Vec::new();
                if rng.gen_bool(0.9) {
                    row.push(("id", Value::from(rng.gen_range(0u64..1_000))));
                }
                if rng.gen_bool(0.7) {
                    let name = if rng.gen_bool(0.8) { "seed" } else { "other" };
                    row.push(("name", Value::from(name)));
                }
                let mut pos = Vec::new();
                if rng.gen_bool(0.8) {
                    pos.push(("x", Value::from(rng.gen_range(-50i64..50))));
                }
                if rng.gen_bool(0.5) {
                    pos.push(("y", Value::from(rng.gen_range(-50i64..50))));
                }
                if !pos.is_empty() {
                    row.push(("pos", map(pos)));
                }
                rows.push(map(row));
            }

            let bytes = compress(&rows);

            // Whole rows in one call; a rebuilt subtree and a scalar stream
            // side by side in another, sharing one cursor
            let arena = Bump::new();
            let mut whole = [Request::new(crate::Path::root())];
            let used = decompress(&arena, &bytes, &mut whole).unwrap();
            assert_eq!(used, bytes.len());
            assert_eq!(whole[0].buffer().len(), rows.len());

            let arena2 = Bump::new();
            let mut parts = [Request::new("pos"), Request::new("id")];
            let used = decompress(&arena2, &bytes, &mut parts).unwrap();
            assert_eq!(used, bytes.len());
            assert_eq!(parts[0].buffer().len(), rows.len());
            assert_eq!(parts[1].buffer().len(), rows.len());

            for (i, row) in rows.iter().enumerate() {
                let doc = whole[0].buffer().get(i).unwrap().value_ref().unwrap().unwrap();
                assert_eq!(*row, doc);

                // A requested subtree materializes every row, empty when the
                // row omits it entirely
                let pos = parts[0].buffer().get(i).unwrap().value_ref().unwrap().unwrap();
                match row.as_map().unwrap().get("pos") {
                    Some(v) => assert_eq!(*v, pos),
                    None => assert_eq!(pos, ValueRef::Map(BTreeMap::new())),
                }
                match row.as_map().unwrap().get("pos").and_then(|p| p["x"].as_i64()) {
                    Some(v) => assert_eq!(pos["x"].as_i64(), Some(v)),
                    None => assert!(pos["x"].is_null()),
                }

                let id = parts[1].buffer().get(i).unwrap();
                match row.as_map().unwrap().get("id").and_then(|v| v.as_u64()) {
                    Some(v) => assert_eq!(id.as_u64(), Some(v)),
                    None => assert!(id.is_missing()),
                }
            }
        }
    }
}

