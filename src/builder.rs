//! Interleaved region encoding. The first appended row becomes the reference
//! object; every row after it must fit the reference's shape, with fields
//! allowed to go missing. Each leaf accumulates delta slots, falling back to
//! a literal whenever a value can't be reached by a packable delta, and
//! [`ColumnBuilder::finish`] merges the finished sections of every leaf in
//! the order the decoder's stream heap will ask for them.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::element::{Element, Parser};
use crate::error::{Error, Result};
use crate::marker::{
    CONTROL_DELTA_BLOCKS, CONTROL_END, CONTROL_INTERLEAVED_ARRAY, CONTROL_INTERLEAVED_OBJECT,
    CONTROL_INTERLEAVED_OBJECT_FULL, MAX_BLOCKS_PER_SECTION,
};
use crate::reference::{RefKind, RefTree};
use crate::simple8b::{self, Slot};
use crate::stream::{in_i32, DeltaKind};
use crate::value::Value;
use crate::{Integer, MAX_DOC_SIZE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShapeKind {
    Map,
    Array,
    Leaf,
}

struct ShapeNode {
    key: Option<String>,
    kind: ShapeKind,
    subtree_end: usize,
    leaf_index: Option<usize>,
}

struct Shape {
    nodes: Vec<ShapeNode>,
    /// The encoded reference object.
    bytes: Vec<u8>,
    array_root: bool,
}

impl Shape {
    fn children(&self, idx: usize) -> ShapeChildIter {
        ShapeChildIter {
            next: idx + 1,
            end: self.nodes[idx].subtree_end,
            nodes: &self.nodes,
        }
    }
}

struct ShapeChildIter<'s> {
    next: usize,
    end: usize,
    nodes: &'s [ShapeNode],
}

impl<'s> Iterator for ShapeChildIter<'s> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.end {
            return None;
        }
        let child = self.next;
        self.next = self.nodes[child].subtree_end;
        Some(child)
    }
}

/// The last value a stream produced, in owned form.
#[derive(Clone, Debug)]
enum EncValue {
    Bool(bool),
    Int(Integer),
    Raw(Vec<u8>),
}

struct Section {
    /// Complete section bytes, control byte included. For a literal this is
    /// just the encoded element.
    bytes: Vec<u8>,
    values: u64,
}

struct EncStream {
    last: EncValue,
    kind: Option<DeltaKind>,
    base: i128,
    /// The slot emitted just before `pending` began, seeding a repeat block
    /// at the front of the next packed run.
    prev_slot: Slot,
    pending: Vec<Slot>,
    sections: Vec<Section>,
    produced: u64,
}

impl EncStream {
    fn new(literal: &[u8]) -> Result<EncStream> {
        let (last, kind, base) = classify(literal)?;
        Ok(EncStream {
            last,
            kind,
            base,
            prev_slot: Some(0),
            pending: Vec::new(),
            sections: Vec::new(),
            produced: 0,
        })
    }

    fn push_slot(&mut self, slot: Slot) {
        self.pending.push(slot);
        self.produced += 1;
    }

    fn push_literal(&mut self, bytes: &[u8]) -> Result<()> {
        self.flush_pending();
        let (last, kind, base) = classify(bytes)?;
        self.last = last;
        self.kind = kind;
        self.base = base;
        self.prev_slot = Some(0);
        self.sections.push(Section {
            bytes: bytes.to_vec(),
            values: 1,
        });
        self.produced += 1;
        Ok(())
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut blocks = Vec::new();
        simple8b::pack(self.prev_slot, &self.pending, &mut blocks);
        self.prev_slot = *self.pending.last().unwrap();
        self.pending.clear();
        for chunk in blocks.chunks(8 * MAX_BLOCKS_PER_SECTION) {
            let mut bytes = Vec::with_capacity(2 + chunk.len());
            bytes.push(CONTROL_DELTA_BLOCKS);
            bytes.push((chunk.len() / 8) as u8);
            bytes.extend_from_slice(chunk);
            let values = chunk
                .chunks(8)
                .map(|b| simple8b::slots_in_block(u64::from_le_bytes(b.try_into().unwrap())))
                .sum();
            self.sections.push(Section { bytes, values });
        }
    }
}

/// What delta domain a literal element opens, mirroring the decoder.
fn classify(bytes: &[u8]) -> Result<(EncValue, Option<DeltaKind>, i128)> {
    let mut parser = Parser::new(bytes);
    let elem = parser.next().ok_or(Error::LengthTooShort {
        step: "literal element",
        actual: 0,
        expected: 1,
    })??;
    Ok(match elem {
        Element::Bool(v) => (EncValue::Bool(v), Some(DeltaKind::Bool), v as i128),
        Element::Int(v) => {
            let wide = v.as_i128();
            let kind = if in_i32(wide) {
                DeltaKind::Int32
            } else {
                DeltaKind::Int64
            };
            (EncValue::Int(v), Some(kind), wide)
        }
        _ => (EncValue::Raw(bytes.to_vec()), None, 0),
    })
}

/// Builds one compressed interleaved region from a sequence of rows.
///
/// ```
/// # use colpack::{ColumnBuilder, Value};
/// # use std::collections::BTreeMap;
/// let mut row = BTreeMap::new();
/// row.insert("n".to_string(), Value::from(1u8));
/// let mut builder = ColumnBuilder::new();
/// builder.append(&Value::Map(row)).unwrap();
/// let bytes = builder.finish().unwrap();
/// ```
pub struct ColumnBuilder {
    opaque_arrays: bool,
    shape: Option<Shape>,
    streams: Vec<EncStream>,
    rows: usize,
    scratch: Vec<u8>,
}

impl Default for ColumnBuilder {
    fn default() -> Self {
        ColumnBuilder::new()
    }
}

impl ColumnBuilder {
    /// A builder that traverses arrays, giving each array slot its own
    /// stream.
    pub fn new() -> ColumnBuilder {
        ColumnBuilder {
            opaque_arrays: false,
            shape: None,
            streams: Vec::new(),
            rows: 0,
            scratch: Vec::new(),
        }
    }

    /// A builder that keeps arrays whole, treating each one as a single
    /// opaque value. Only map-rooted rows can be encoded this way.
    pub fn opaque_arrays() -> ColumnBuilder {
        ColumnBuilder {
            opaque_arrays: true,
            ..ColumnBuilder::new()
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn append(&mut self, row: &Value) -> Result<()> {
        let row_idx = self.rows;
        let encoded = row.encode_vec();
        if encoded.len() > MAX_DOC_SIZE {
            return Err(Error::ParseLimit(format!(
                "Row of {} bytes exceeds the document size cap",
                encoded.len()
            )));
        }

        if self.shape.is_none() {
            let array_root = match row {
                Value::Map(_) => false,
                Value::Array(_) => true,
                _ => {
                    return Err(Error::ShapeMismatch {
                        row: 0,
                        detail: "Row root must be a map or an array".into(),
                    })
                }
            };
            if array_root && self.opaque_arrays {
                return Err(Error::Unsupported(
                    "Array-rooted rows always traverse arrays".into(),
                ));
            }
            let tree = RefTree::parse(&encoded, !self.opaque_arrays, array_root)?;
            let mut nodes = Vec::with_capacity(tree.len());
            let mut streams = Vec::with_capacity(tree.leaves());
            for node in tree.nodes() {
                let kind = match node.kind {
                    RefKind::Map { .. } => ShapeKind::Map,
                    RefKind::Array { .. } => ShapeKind::Array,
                    RefKind::Leaf => ShapeKind::Leaf,
                };
                if node.is_leaf() {
                    streams.push(EncStream::new(node.raw)?);
                }
                nodes.push(ShapeNode {
                    key: node.key.map(String::from),
                    kind,
                    subtree_end: node.subtree_end,
                    leaf_index: node.leaf_index,
                });
            }
            self.streams = streams;
            self.shape = Some(Shape {
                nodes,
                bytes: encoded,
                array_root,
            });
        }

        let shape = self.shape.as_ref().unwrap();
        append_tree(
            shape,
            &mut self.streams,
            &mut self.scratch,
            0,
            Some(row),
            row_idx,
        )?;
        self.rows += 1;
        Ok(())
    }

    /// Encode the finished region. Fails when nothing was appended.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let shape = self.shape.take().ok_or_else(|| {
            Error::BadEncode("Cannot encode a region with no rows".to_string())
        })?;
        for stream in &mut self.streams {
            stream.flush_pending();
        }

        let mut out = Vec::new();
        out.push(if shape.array_root {
            CONTROL_INTERLEAVED_ARRAY
        } else if self.opaque_arrays {
            CONTROL_INTERLEAVED_OBJECT
        } else {
            CONTROL_INTERLEAVED_OBJECT_FULL
        });
        out.extend_from_slice(&shape.bytes);

        // Emit sections in the order the decoder's stream heap will pop:
        // fewest values produced first, lowest stream first on ties.
        let mut cursors = vec![0usize; self.streams.len()];
        let mut heap: BinaryHeap<Reverse<(u64, usize)>> = (0..self.streams.len())
            .map(|leaf| Reverse((0, leaf)))
            .collect();
        while let Some(Reverse((produced, leaf))) = heap.pop() {
            let sections = &self.streams[leaf].sections;
            if cursors[leaf] == sections.len() {
                // The least-advanced stream is done, so every stream is
                break;
            }
            let section = &sections[cursors[leaf]];
            cursors[leaf] += 1;
            out.extend_from_slice(&section.bytes);
            heap.push(Reverse((produced + section.values, leaf)));
        }
        for (leaf, &cursor) in cursors.iter().enumerate() {
            if cursor != self.streams[leaf].sections.len() {
                return Err(Error::InternalConsistency(format!(
                    "Stream {} still has sections after the merge",
                    leaf
                )));
            }
        }

        out.push(CONTROL_END);
        Ok(out)
    }
}

/// Walk one row against the reference shape, pushing one slot or literal per
/// leaf. Returns how many leaves were present in this subtree.
fn append_tree(
    shape: &Shape,
    streams: &mut [EncStream],
    scratch: &mut Vec<u8>,
    idx: usize,
    value: Option<&Value>,
    row: usize,
) -> Result<usize> {
    let node = &shape.nodes[idx];
    match node.kind {
        ShapeKind::Leaf => {
            let leaf = node.leaf_index.expect("shape leaf without a stream");
            append_leaf(&mut streams[leaf], scratch, value, row)
        }
        ShapeKind::Map => {
            let entries = match value {
                None => None,
                Some(Value::Map(entries)) => Some(entries),
                Some(other) => {
                    return Err(Error::ShapeMismatch {
                        row,
                        detail: format!(
                            "Expected a map at \"{}\", got {:?}",
                            node.key.as_deref().unwrap_or(""),
                            other
                        ),
                    })
                }
            };
            let mut present = 0;
            let mut matched = 0;
            for child in shape.children(idx) {
                let key = shape.nodes[child].key.as_deref().expect("map child key");
                let child_value = entries.and_then(|e| e.get(key));
                if child_value.is_some() {
                    matched += 1;
                }
                present += append_tree(shape, streams, scratch, child, child_value, row)?;
            }
            if let Some(entries) = entries {
                if matched != entries.len() {
                    return Err(Error::ShapeMismatch {
                        row,
                        detail: "Row has keys the reference object lacks".into(),
                    });
                }
                if present == 0 && idx != 0 {
                    return Err(Error::ShapeMismatch {
                        row,
                        detail: "Present map holds no present values".into(),
                    });
                }
            }
            Ok(present)
        }
        ShapeKind::Array => {
            let items = match value {
                None => None,
                Some(Value::Array(items)) => Some(items),
                Some(other) => {
                    return Err(Error::ShapeMismatch {
                        row,
                        detail: format!("Expected an array, got {:?}", other),
                    })
                }
            };
            let len = shape.children(idx).count();
            if let Some(items) = items {
                if items.len() > len {
                    return Err(Error::ShapeMismatch {
                        row,
                        detail: format!(
                            "Array of {} items where the reference holds {}",
                            items.len(),
                            len
                        ),
                    });
                }
            }
            let mut present = 0;
            for (slot, child) in shape.children(idx).enumerate() {
                let child_value = items.and_then(|items| items.get(slot));
                present += append_tree(shape, streams, scratch, child, child_value, row)?;
            }
            if items.is_some() && present == 0 && idx != 0 {
                return Err(Error::ShapeMismatch {
                    row,
                    detail: "Present array holds no present values".into(),
                });
            }
            Ok(present)
        }
    }
}

fn append_leaf(
    stream: &mut EncStream,
    scratch: &mut Vec<u8>,
    value: Option<&Value>,
    row: usize,
) -> Result<usize> {
    let value = match value {
        None => {
            stream.push_slot(None);
            return Ok(0);
        }
        Some(value) => value,
    };

    // Unchanged value: a zero delta regardless of type
    let unchanged = match (&stream.last, value) {
        (EncValue::Bool(last), Value::Bool(v)) => last == v,
        (EncValue::Int(last), Value::Int(v)) => last == v,
        (EncValue::Raw(last), v) => {
            scratch.clear();
            v.encode(scratch);
            last.as_slice() == scratch.as_slice()
        }
        _ => false,
    };
    if unchanged {
        stream.push_slot(Some(0));
        return Ok(1);
    }

    // A packable delta in the stream's current domain
    let delta_target = match (stream.kind, value) {
        (Some(DeltaKind::Bool), Value::Bool(v)) => Some((*v as i128, EncValue::Bool(*v))),
        (Some(DeltaKind::Int32), Value::Int(v)) if in_i32(v.as_i128()) => {
            Some((v.as_i128(), EncValue::Int(*v)))
        }
        (Some(DeltaKind::Int64), Value::Int(v)) => Some((v.as_i128(), EncValue::Int(*v))),
        _ => None,
    };
    if let Some((next, new_last)) = delta_target {
        let delta = next - stream.base;
        if delta >= i64::MIN as i128
            && delta <= i64::MAX as i128
            && simple8b::packable(delta as i64)
        {
            stream.push_slot(Some(delta as i64));
            stream.base = next;
            stream.last = new_last;
            return Ok(1);
        }
    }

    // Anything else restarts the stream with a literal
    scratch.clear();
    value.encode(scratch);
    if scratch.len() > MAX_DOC_SIZE {
        return Err(Error::ParseLimit(format!(
            "Literal of {} bytes in row {} exceeds the document size cap",
            scratch.len(),
            row
        )));
    }
    stream.push_literal(scratch)?;
    Ok(1)
}
