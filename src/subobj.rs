//! Row document assembly. While a row traversal replays the reference
//! object's shape, this builds the encoded bytes of any requested subtree,
//! dropping missing leaves and the interior nodes they empty out.

use crate::element::{serialize_elem, Element};
use crate::stream::LeafValue;

struct Scope<'a> {
    /// Key under the enclosing map scope.
    key: Option<&'a str>,
    is_array: bool,
    /// A requested subtree root. Targeted scopes produce a document even
    /// when every leaf under them is missing.
    targeted: bool,
    /// Encoded children, keys included for map scopes.
    body: Vec<u8>,
    count: usize,
}

/// Assembles requested subtrees during a row traversal. Only one targeted
/// scope is ever open at a time; requested paths that nest are rejected
/// before decoding starts.
#[derive(Default)]
pub(crate) struct Assembler<'a> {
    scopes: Vec<Scope<'a>>,
    free: Vec<Vec<u8>>,
}

impl<'a> Assembler<'a> {
    pub fn new() -> Assembler<'a> {
        Assembler::default()
    }

    /// True while inside a targeted subtree, meaning every structural node
    /// entered needs a scope and every present leaf needs its bytes written.
    pub fn active(&self) -> bool {
        !self.scopes.is_empty()
    }

    /// Open a scope. Call for a targeted structural node, or for any
    /// structural node while active.
    pub fn enter(&mut self, key: Option<&'a str>, is_array: bool, targeted: bool) {
        let body = self.free.pop().unwrap_or_default();
        self.scopes.push(Scope {
            key,
            is_array,
            targeted,
            body,
            count: 0,
        });
    }

    /// Record a present leaf value inside the open scope.
    pub fn leaf(&mut self, key: Option<&'a str>, value: &LeafValue<'a>) {
        let top = self.scopes.last_mut().expect("leaf outside any scope");
        if !top.is_array {
            if let Some(key) = key {
                serialize_elem(&mut top.body, Element::Str(key));
            }
        }
        match *value {
            LeafValue::Raw(bytes) => top.body.extend_from_slice(bytes),
            LeafValue::Bool(v) => serialize_elem(&mut top.body, Element::Bool(v)),
            LeafValue::Int(v) => serialize_elem(&mut top.body, Element::Int(v)),
        }
        top.count += 1;
    }

    /// Close the innermost scope. Returns the assembled document when the
    /// closed scope was targeted; hand the buffer back through [`recycle`]
    /// once copied out.
    ///
    /// An untargeted scope that ended up empty vanishes from its parent,
    /// key and all.
    ///
    /// [`recycle`]: Assembler::recycle
    pub fn leave(&mut self) -> Option<Vec<u8>> {
        let scope = self.scopes.pop().expect("leave outside any scope");
        let head = if scope.is_array {
            Element::Array(scope.count)
        } else {
            Element::Map(scope.count)
        };
        if scope.targeted {
            let mut out = self.free.pop().unwrap_or_default();
            serialize_elem(&mut out, head);
            out.extend_from_slice(&scope.body);
            self.recycle(scope.body);
            return Some(out);
        }
        let parent = self
            .scopes
            .last_mut()
            .expect("untargeted scope without a parent");
        if scope.count > 0 {
            if !parent.is_array {
                if let Some(key) = scope.key {
                    serialize_elem(&mut parent.body, Element::Str(key));
                }
            }
            serialize_elem(&mut parent.body, head);
            parent.body.extend_from_slice(&scope.body);
            parent.count += 1;
        }
        self.recycle(scope.body);
        None
    }

    pub fn recycle(&mut self, mut buf: Vec<u8>) {
        buf.clear();
        self.free.push(buf);
    }
}
