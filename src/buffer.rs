use crate::error::Result;
use crate::path::Path;
use crate::value_ref::ValueRef;
use crate::Integer;

/// One row's worth of output for a requested path.
///
/// Scalar values that moved through delta streams come back directly as
/// `Bool` or `Int`. Everything else arrives as `Raw`: one complete encoded
/// element, borrowed from the compressed bytes or from the decompression
/// arena.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnValue<'a> {
    /// The path has no value in this row.
    Missing,
    Bool(bool),
    Int(Integer),
    Raw(&'a [u8]),
}

impl<'a> ColumnValue<'a> {
    pub fn is_missing(&self) -> bool {
        matches!(self, ColumnValue::Missing)
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let ColumnValue::Bool(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_int(&self) -> Option<Integer> {
        if let ColumnValue::Int(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_int().and_then(|v| v.as_i64())
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_int().and_then(|v| v.as_u64())
    }

    pub fn as_raw(&self) -> Option<&'a [u8]> {
        if let ColumnValue::Raw(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    /// Decode into a borrowed document tree. `None` for a missing value.
    pub fn value_ref(&self) -> Result<Option<ValueRef<'a>>> {
        Ok(Some(match *self {
            ColumnValue::Missing => return Ok(None),
            ColumnValue::Bool(v) => ValueRef::Bool(v),
            ColumnValue::Int(v) => ValueRef::Int(v),
            ColumnValue::Raw(bytes) => ValueRef::from_slice(bytes)?,
        }))
    }
}

/// Append-only output vector for one requested path, one entry per row.
#[derive(Clone, Debug, Default)]
pub struct ColumnBuffer<'a> {
    values: Vec<ColumnValue<'a>>,
}

impl<'a> ColumnBuffer<'a> {
    pub fn new() -> ColumnBuffer<'a> {
        ColumnBuffer::default()
    }

    pub(crate) fn push(&mut self, value: ColumnValue<'a>) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&ColumnValue<'a>> {
        self.values.get(row)
    }

    pub fn values(&self) -> &[ColumnValue<'a>] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<ColumnValue<'a>> {
        self.values.iter()
    }
}

impl<'a> IntoIterator for ColumnBuffer<'a> {
    type Item = ColumnValue<'a>;
    type IntoIter = std::vec::IntoIter<ColumnValue<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a, 'b> IntoIterator for &'b ColumnBuffer<'a> {
    type Item = &'b ColumnValue<'a>;
    type IntoIter = std::slice::Iter<'b, ColumnValue<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// A path to pull out of a compressed column, and the values found at it.
#[derive(Clone, Debug, Default)]
pub struct Request<'a> {
    path: Path,
    buffer: ColumnBuffer<'a>,
}

impl<'a> Request<'a> {
    pub fn new(path: impl Into<Path>) -> Request<'a> {
        Request {
            path: path.into(),
            buffer: ColumnBuffer::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buffer(&self) -> &ColumnBuffer<'a> {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut ColumnBuffer<'a> {
        &mut self.buffer
    }

    pub fn into_buffer(self) -> ColumnBuffer<'a> {
        self.buffer
    }
}

impl<'a> From<Path> for Request<'a> {
    fn from(path: Path) -> Request<'a> {
        Request::new(path)
    }
}
