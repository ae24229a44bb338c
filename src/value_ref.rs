use crate::element::{serialize_elem, Element, Parser};
use crate::error::{Error, Result};
use crate::value::{build_value_ref, Value};
use crate::Integer;
use std::ops::Index;
use std::{collections::BTreeMap, fmt::Debug};

/// A borrowed document tree. Strings and byte sequences point into the
/// encoded bytes they were decoded from.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ValueRef<'a> {
    #[default]
    Null,
    Bool(bool),
    Int(Integer),
    Str(&'a str),
    F32(f32),
    F64(f64),
    Bin(&'a [u8]),
    Array(Vec<ValueRef<'a>>),
    Map(BTreeMap<&'a str, ValueRef<'a>>),
}

impl<'a> ValueRef<'a> {
    pub fn to_owned(&self) -> Value {
        match *self {
            ValueRef::Null => Value::Null,
            ValueRef::Bool(v) => Value::Bool(v),
            ValueRef::Int(v) => Value::Int(v),
            ValueRef::Str(v) => Value::Str(v.into()),
            ValueRef::F32(v) => Value::F32(v),
            ValueRef::F64(v) => Value::F64(v),
            ValueRef::Bin(v) => Value::Bin(v.into()),
            ValueRef::Array(ref v) => Value::Array(v.iter().map(|i| i.to_owned()).collect()),
            ValueRef::Map(ref v) => Value::Map(
                v.iter()
                    .map(|(f, i)| (String::from(*f), i.to_owned()))
                    .collect(),
            ),
        }
    }

    /// Decode a single complete encoded element tree, borrowing from `data`.
    /// Fails if any bytes remain after the tree.
    pub fn from_slice(data: &'a [u8]) -> Result<ValueRef<'a>> {
        let mut parser = Parser::new(data);
        let value = build_value_ref(&mut parser)?;
        if !parser.remaining().is_empty() {
            return Err(Error::BadEncode(format!(
                "{} bytes remain after the decoded value",
                parser.remaining().len()
            )));
        }
        Ok(value)
    }

    /// Encode onto the end of a byte vector.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        match *self {
            ValueRef::Null => serialize_elem(buf, Element::Null),
            ValueRef::Bool(v) => serialize_elem(buf, Element::Bool(v)),
            ValueRef::Int(v) => serialize_elem(buf, Element::Int(v)),
            ValueRef::Str(v) => serialize_elem(buf, Element::Str(v)),
            ValueRef::F32(v) => serialize_elem(buf, Element::F32(v)),
            ValueRef::F64(v) => serialize_elem(buf, Element::F64(v)),
            ValueRef::Bin(v) => serialize_elem(buf, Element::Bin(v)),
            ValueRef::Array(ref v) => {
                serialize_elem(buf, Element::Array(v.len()));
                for item in v {
                    item.encode(buf);
                }
            }
            ValueRef::Map(ref v) => {
                serialize_elem(buf, Element::Map(v.len()));
                for (key, item) in v {
                    serialize_elem(buf, Element::Str(key));
                    item.encode(buf);
                }
            }
        }
    }

    pub fn encode_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ValueRef::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, ValueRef::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, ValueRef::Int(_))
    }

    pub fn is_i64(&self) -> bool {
        if let ValueRef::Int(ref v) = *self {
            v.is_i64()
        } else {
            false
        }
    }

    pub fn is_u64(&self) -> bool {
        if let ValueRef::Int(ref v) = *self {
            v.is_u64()
        } else {
            false
        }
    }

    pub fn is_f32(&self) -> bool {
        matches!(self, ValueRef::F32(_))
    }

    pub fn is_f64(&self) -> bool {
        matches!(self, ValueRef::F64(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, ValueRef::Str(_))
    }

    pub fn is_bin(&self) -> bool {
        matches!(self, ValueRef::Bin(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ValueRef::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ValueRef::Map(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let ValueRef::Bool(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_int(&self) -> Option<Integer> {
        if let ValueRef::Int(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ValueRef::Int(ref n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            ValueRef::Int(ref n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            ValueRef::F32(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ValueRef::F64(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_floating(&self) -> Option<f64> {
        match *self {
            ValueRef::F32(n) => Some(n.into()),
            ValueRef::F64(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let ValueRef::Str(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_bin(&self) -> Option<&[u8]> {
        if let ValueRef::Bin(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&[ValueRef<'a>]> {
        if let ValueRef::Array(ref array) = *self {
            Some(array)
        } else {
            None
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut [ValueRef<'a>]> {
        match *self {
            ValueRef::Array(ref mut array) => Some(array),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<&'a str, ValueRef<'a>>> {
        match *self {
            ValueRef::Map(ref map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<&'a str, ValueRef<'a>>> {
        match *self {
            ValueRef::Map(ref mut map) => Some(map),
            _ => None,
        }
    }
}

static NULL_REF: ValueRef<'static> = ValueRef::Null;

/// Support indexing into arrays. If the index is out of range or the value isn't an array, this
/// returns a [`ValueRef::Null`].
impl<'a> Index<usize> for ValueRef<'a> {
    type Output = ValueRef<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        self.as_array()
            .and_then(|v| v.get(index))
            .unwrap_or(&NULL_REF)
    }
}

/// Support indexing into maps. If the index string is not in the map, this returns a
/// [`ValueRef::Null`].
impl<'a> Index<&str> for ValueRef<'a> {
    type Output = ValueRef<'a>;

    fn index(&self, index: &str) -> &Self::Output {
        self.as_map()
            .and_then(|v| v.get(index))
            .unwrap_or(&NULL_REF)
    }
}

impl<'a> PartialEq<Value> for ValueRef<'a> {
    fn eq(&self, other: &Value) -> bool {
        match self {
            ValueRef::Null => other == &Value::Null,
            ValueRef::Bool(s) => {
                if let Value::Bool(o) = other {
                    s == o
                } else {
                    false
                }
            }
            ValueRef::Int(s) => {
                if let Value::Int(o) = other {
                    s == o
                } else {
                    false
                }
            }
            ValueRef::Str(s) => {
                if let Value::Str(o) = other {
                    s == o
                } else {
                    false
                }
            }
            ValueRef::F32(s) => {
                if let Value::F32(o) = other {
                    s == o
                } else {
                    false
                }
            }
            ValueRef::F64(s) => {
                if let Value::F64(o) = other {
                    s == o
                } else {
                    false
                }
            }
            ValueRef::Bin(s) => {
                if let Value::Bin(o) = other {
                    s == o
                } else {
                    false
                }
            }
            ValueRef::Array(s) => {
                if let Value::Array(o) = other {
                    s == o
                } else {
                    false
                }
            }
            ValueRef::Map(s) => {
                if let Value::Map(o) = other {
                    s.len() == o.len()
                        && s.iter()
                            .zip(o)
                            .all(|((ks, vs), (ko, vo))| (ks == ko) && (vs == vo))
                } else {
                    false
                }
            }
        }
    }
}

macro_rules! impl_valueref_from_integer {
    ($t: ty) => {
        impl<'a> From<$t> for ValueRef<'a> {
            fn from(v: $t) -> Self {
                ValueRef::Int(From::from(v))
            }
        }
    };
}

impl_valueref_from_integer!(u8);
impl_valueref_from_integer!(u16);
impl_valueref_from_integer!(u32);
impl_valueref_from_integer!(u64);
impl_valueref_from_integer!(usize);
impl_valueref_from_integer!(i8);
impl_valueref_from_integer!(i16);
impl_valueref_from_integer!(i32);
impl_valueref_from_integer!(i64);
impl_valueref_from_integer!(isize);

impl<'a> From<bool> for ValueRef<'a> {
    fn from(v: bool) -> Self {
        ValueRef::Bool(v)
    }
}

impl<'a> From<Integer> for ValueRef<'a> {
    fn from(v: Integer) -> Self {
        ValueRef::Int(v)
    }
}

impl<'a> From<&'a str> for ValueRef<'a> {
    fn from(v: &'a str) -> Self {
        ValueRef::Str(v)
    }
}

impl<'a> From<&'a [u8]> for ValueRef<'a> {
    fn from(v: &'a [u8]) -> Self {
        ValueRef::Bin(v)
    }
}

impl<'a> serde::Serialize for ValueRef<'a> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ValueRef::Null => serializer.serialize_unit(),
            ValueRef::Bool(v) => serializer.serialize_bool(*v),
            ValueRef::Int(v) => v.serialize(serializer),
            ValueRef::Str(v) => serializer.serialize_str(v),
            ValueRef::F32(v) => serializer.serialize_f32(*v),
            ValueRef::F64(v) => serializer.serialize_f64(*v),
            ValueRef::Bin(v) => serializer.serialize_bytes(v),
            ValueRef::Array(v) => v.serialize(serializer),
            ValueRef::Map(v) => v.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn borrowed_roundtrip() {
        let mut map = BTreeMap::new();
        map.insert("name", ValueRef::Str("station-4"));
        map.insert("count", ValueRef::from(3u64));
        let doc = ValueRef::Map(map);
        let enc = doc.encode_vec();
        let dec = ValueRef::from_slice(&enc).unwrap();
        assert_eq!(doc, dec);
        assert_eq!(dec.to_owned().as_ref(), doc);
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut enc = ValueRef::Null.encode_vec();
        enc.push(0xc0);
        assert!(ValueRef::from_slice(&enc).is_err());
    }

    #[test]
    fn eq_across_owned_and_borrowed() {
        let owned = Value::Array(vec![Value::from(1u8), Value::from("x")]);
        let borrowed = ValueRef::Array(vec![ValueRef::from(1u8), ValueRef::Str("x")]);
        assert!(owned == borrowed);
        assert!(borrowed == owned);
    }
}
