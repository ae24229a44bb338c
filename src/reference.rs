//! The reference object of an interleaved region. Its shape decides how many
//! value streams follow and what order row traversal visits them in.

use crate::element::{element_size, Element, Parser};
use crate::error::{Error, Result};
use crate::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RefKind {
    /// Structural map with this many key/value children.
    Map { len: usize },
    /// Structural array with this many children. Only present when the
    /// region's start byte traverses arrays.
    Array { len: usize },
    /// Carries a value stream. Scalars always; arrays when the region treats
    /// them as opaque; empty maps and arrays in either mode.
    Leaf,
}

#[derive(Clone, Debug)]
pub(crate) struct RefNode<'a> {
    /// Key under a map parent.
    pub key: Option<&'a str>,
    /// The full encoded subtree, head element included.
    pub raw: &'a [u8],
    pub kind: RefKind,
    pub parent: Option<usize>,
    /// One past the last pre-order index inside this subtree.
    pub subtree_end: usize,
    /// Dense stream number, assigned to leaves in pre-order.
    pub leaf_index: Option<usize>,
}

impl<'a> RefNode<'a> {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, RefKind::Leaf)
    }
}

/// Flat pre-order form of a reference object.
#[derive(Clone, Debug)]
pub(crate) struct RefTree<'a> {
    nodes: Vec<RefNode<'a>>,
    leaves: usize,
    /// Total encoded size of the reference object.
    size: usize,
}

impl<'a> RefTree<'a> {
    /// Parse the reference object at the start of `data`. `traverse_arrays`
    /// matches the region's start byte; `array_root` permits (and requires)
    /// an array at the root instead of a map.
    pub fn parse(data: &'a [u8], traverse_arrays: bool, array_root: bool) -> Result<RefTree<'a>> {
        let mut nodes: Vec<RefNode<'a>> = Vec::new();
        // Structural nodes still waiting on children: (node, children left)
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut leaves = 0;
        let mut pos = 0;

        loop {
            let parent = stack.last().map(|&(node, _)| node);

            // Map children are keyed; parse the key element first
            let key = match parent {
                Some(p) if matches!(nodes[p].kind, RefKind::Map { .. }) => {
                    let mut parser = Parser::new(&data[pos..]);
                    let key = match parser.next() {
                        Some(Ok(Element::Str(key))) => key,
                        Some(Ok(other)) => {
                            return Err(Error::BadEncode(format!(
                                "Map key must be a Str, got {}",
                                other.name()
                            )))
                        }
                        Some(Err(e)) => return Err(e),
                        None => {
                            return Err(Error::LengthTooShort {
                                step: "reference object key",
                                actual: 0,
                                expected: 1,
                            })
                        }
                    };
                    pos += data.len() - pos - parser.remaining().len();
                    Some(key)
                }
                _ => None,
            };

            // This node fills one child slot of the open parent
            if let Some((_, remaining)) = stack.last_mut() {
                *remaining -= 1;
            }

            let size = element_size(&data[pos..])?;
            let raw = &data[pos..pos + size];
            let mut head = Parser::new(raw);
            let elem = head.next().ok_or(Error::LengthTooShort {
                step: "reference object element",
                actual: 0,
                expected: 1,
            })??;
            let head_len = raw.len() - head.remaining().len();

            let idx = nodes.len();
            if idx == 0 {
                match (&elem, array_root) {
                    (Element::Map(_), false) | (Element::Array(_), true) => (),
                    _ => {
                        return Err(Error::Corrupt(format!(
                            "Reference root must be {}, got {}",
                            if array_root { "an Array" } else { "a Map" },
                            elem.name()
                        )))
                    }
                }
            }

            let structural = match elem {
                Element::Map(len) if len > 0 => Some((RefKind::Map { len }, len)),
                Element::Array(len) if len > 0 && (traverse_arrays || idx == 0) => {
                    Some((RefKind::Array { len }, len))
                }
                _ => None,
            };

            match structural {
                Some((kind, len)) => {
                    nodes.push(RefNode {
                        key,
                        raw,
                        kind,
                        parent,
                        subtree_end: 0,
                        leaf_index: None,
                    });
                    stack.push((idx, len));
                    pos += head_len;
                }
                None => {
                    nodes.push(RefNode {
                        key,
                        raw,
                        kind: RefKind::Leaf,
                        parent,
                        subtree_end: idx + 1,
                        leaf_index: Some(leaves),
                    });
                    leaves += 1;
                    pos += size;
                }
            }

            // Close out any structural nodes whose children are all in
            while let Some(&(node, remaining)) = stack.last() {
                if remaining > 0 {
                    break;
                }
                nodes[node].subtree_end = nodes.len();
                stack.pop();
            }
            if stack.is_empty() {
                break;
            }
        }

        if leaves == 0 {
            return Err(Error::Corrupt(
                "Reference object carries no value streams".into(),
            ));
        }
        Ok(RefTree {
            nodes,
            leaves,
            size: pos,
        })
    }

    pub fn nodes(&self) -> &[RefNode<'a>] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &RefNode<'a> {
        &self.nodes[idx]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of value streams, one per leaf.
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    /// Encoded byte length of the whole reference object.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Child node indices of a structural node, in order.
    pub fn children(&self, idx: usize) -> ChildIter {
        ChildIter {
            next: idx + 1,
            end: self.nodes[idx].subtree_end,
            nodes: &self.nodes,
        }
    }

    /// True when `a` is a strict ancestor of `b`.
    pub fn is_ancestor(&self, a: usize, b: usize) -> bool {
        a < b && b < self.nodes[a].subtree_end
    }

    /// Every node a path addresses. Map segments consume path segments;
    /// structural arrays are transparent, so one path can land on several
    /// nodes. An empty result just means the path names nothing in this
    /// shape.
    pub fn match_path(&self, path: &Path) -> Vec<usize> {
        let mut matches = Vec::new();
        self.match_into(0, path.segments(), &mut matches);
        matches
    }

    fn match_into(&self, idx: usize, segments: &[String], matches: &mut Vec<usize>) {
        match self.nodes[idx].kind {
            RefKind::Array { .. } => {
                if segments.is_empty() {
                    matches.push(idx);
                } else {
                    for child in self.children(idx) {
                        self.match_into(child, segments, matches);
                    }
                }
            }
            RefKind::Map { .. } => {
                if segments.is_empty() {
                    matches.push(idx);
                } else {
                    for child in self.children(idx) {
                        if self.nodes[child].key == Some(segments[0].as_str()) {
                            self.match_into(child, &segments[1..], matches);
                        }
                    }
                }
            }
            RefKind::Leaf => {
                if segments.is_empty() {
                    matches.push(idx);
                }
            }
        }
    }

    /// The pre-order event sequence a row traversal replays.
    pub fn events(&self) -> Vec<WalkEvent> {
        let mut out = Vec::with_capacity(2 * self.nodes.len());
        let mut open: Vec<(usize, usize)> = Vec::new();
        for idx in 0..self.nodes.len() {
            while let Some(&(node, end)) = open.last() {
                if end == idx {
                    out.push(WalkEvent::Leave(node));
                    open.pop();
                } else {
                    break;
                }
            }
            let node = &self.nodes[idx];
            if node.is_leaf() {
                out.push(WalkEvent::Leaf(idx));
            } else {
                out.push(WalkEvent::Enter(idx));
                open.push((idx, node.subtree_end));
            }
        }
        while let Some((node, _)) = open.pop() {
            out.push(WalkEvent::Leave(node));
        }
        out
    }
}

pub(crate) struct ChildIter<'t, 'a> {
    next: usize,
    end: usize,
    nodes: &'t [RefNode<'a>],
}

impl<'t, 'a> Iterator for ChildIter<'t, 'a> {
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

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WalkEvent {
    Enter(usize),
    Leaf(usize),
    Leave(usize),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use std::collections::BTreeMap;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<String, Value>>(),
        )
    }

    fn nested() -> Vec<u8> {
        // {"a": {"x": 1, "y": [2, 3]}, "b": true}
        map(vec![
            (
                "a",
                map(vec![
                    ("x", Value::from(1u8)),
                    ("y", Value::Array(vec![Value::from(2u8), Value::from(3u8)])),
                ]),
            ),
            ("b", Value::from(true)),
        ])
        .encode_vec()
    }

    #[test]
    fn preorder_and_leaves() {
        let enc = nested();
        let tree = RefTree::parse(&enc, true, false).unwrap();
        // root, a, x, y, y[0], y[1], b
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.leaves(), 4);
        assert_eq!(tree.size(), enc.len());
        assert_eq!(tree.node(0).subtree_end, 7);
        let leaf_streams: Vec<_> = tree
            .nodes()
            .iter()
            .filter_map(|n| n.leaf_index)
            .collect();
        assert_eq!(leaf_streams, vec![0, 1, 2, 3]);
    }

    #[test]
    fn opaque_arrays_are_leaves() {
        let enc = nested();
        let tree = RefTree::parse(&enc, false, false).unwrap();
        // root, a, x, y, b
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.leaves(), 3);
        // y is a leaf whose raw bytes cover the whole array
        let y = tree
            .nodes()
            .iter()
            .find(|n| n.key == Some("y"))
            .unwrap();
        assert!(y.is_leaf());
        assert_eq!(y.raw.len(), 3);
    }

    #[test]
    fn empty_map_is_a_leaf() {
        let enc = map(vec![("a", Value::Map(BTreeMap::new())), ("b", Value::from(1u8))]).encode_vec();
        let tree = RefTree::parse(&enc, true, false).unwrap();
        assert_eq!(tree.len(), 3);
        assert!(tree.node(1).is_leaf());
    }

    #[test]
    fn path_matching() {
        let enc = nested();
        let tree = RefTree::parse(&enc, true, false).unwrap();
        assert_eq!(tree.match_path(&Path::parse("a.x")).len(), 1);
        // Arrays are transparent: "a.y" lands on the array node itself
        assert_eq!(tree.match_path(&Path::parse("a.y")).len(), 1);
        assert_eq!(tree.match_path(&Path::parse("nope")).len(), 0);
        assert_eq!(tree.match_path(&Path::root()), vec![0]);
    }

    #[test]
    fn path_through_array_multi_match() {
        // {"rows": [{"v": 1}, {"v": 2}]}
        let enc = map(vec![(
            "rows",
            Value::Array(vec![
                map(vec![("v", Value::from(1u8))]),
                map(vec![("v", Value::from(2u8))]),
            ]),
        )])
        .encode_vec();
        let tree = RefTree::parse(&enc, true, false).unwrap();
        assert_eq!(tree.match_path(&Path::parse("rows.v")).len(), 2);
    }

    #[test]
    fn ancestor() {
        let enc = nested();
        let tree = RefTree::parse(&enc, true, false).unwrap();
        assert!(tree.is_ancestor(0, 1));
        assert!(tree.is_ancestor(1, 2));
        assert!(!tree.is_ancestor(2, 1));
        assert!(!tree.is_ancestor(1, 6));
        assert!(!tree.is_ancestor(1, 1));
    }

    #[test]
    fn events_bracket_properly() {
        let enc = nested();
        let tree = RefTree::parse(&enc, true, false).unwrap();
        let events = tree.events();
        use WalkEvent::*;
        assert_eq!(
            events,
            vec![
                Enter(0),
                Enter(1),
                Leaf(2),
                Enter(3),
                Leaf(4),
                Leaf(5),
                Leave(3),
                Leave(1),
                Leaf(6),
                Leave(0),
            ]
        );
    }

    #[test]
    fn array_root() {
        let enc = Value::Array(vec![Value::from(1u8), Value::from(2u8)]).encode_vec();
        let tree = RefTree::parse(&enc, true, true).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.leaves(), 2);
        assert!(RefTree::parse(&enc, true, false).is_err());
    }
}
