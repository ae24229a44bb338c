use crate::{
    error::{Error, Result},
    integer,
    marker::Marker,
    Integer, MAX_DEPTH,
};

use byteorder::{LittleEndian, ReadBytesExt};

/// One parsed element of the wire encoding. Structural elements (`Array`,
/// `Map`) carry only their length; their children follow as further elements.
#[derive(Clone, Debug)]
pub enum Element<'a> {
    Null,
    Bool(bool),
    Int(Integer),
    Str(&'a str),
    F32(f32),
    F64(f64),
    Bin(&'a [u8]),
    Array(usize),
    Map(usize),
}

impl<'a> Element<'a> {
    pub fn name(&self) -> &'static str {
        use self::Element::*;
        match self {
            Null => "Null",
            Bool(_) => "Bool",
            Int(_) => "Int",
            Str(_) => "Str",
            F32(_) => "F32",
            F64(_) => "F64",
            Bin(_) => "Bin",
            Array(_) => "Array",
            Map(_) => "Map",
        }
    }
}

/// Serialize an element onto a byte vector. Doesn't check if Array & Map
/// structures make sense, just writes elements out.
pub fn serialize_elem(buf: &mut Vec<u8>, elem: Element) {
    use self::Element::*;
    match elem {
        Null => buf.push(Marker::Null.into()),
        Bool(v) => buf.push(if v { Marker::True } else { Marker::False }.into()),
        Int(v) => match integer::get_int_internal(&v) {
            integer::IntPriv::PosInt(v) => {
                if v <= 127 {
                    buf.push(Marker::PosFixInt(v as u8).into());
                } else if v <= u8::MAX as u64 {
                    buf.push(Marker::UInt8.into());
                    buf.push(v as u8);
                } else if v <= u16::MAX as u64 {
                    buf.push(Marker::UInt16.into());
                    buf.extend_from_slice(&(v as u16).to_le_bytes());
                } else if v <= u32::MAX as u64 {
                    buf.push(Marker::UInt32.into());
                    buf.extend_from_slice(&(v as u32).to_le_bytes());
                } else {
                    buf.push(Marker::UInt64.into());
                    buf.extend_from_slice(&v.to_le_bytes());
                }
            }
            integer::IntPriv::NegInt(v) => {
                if v >= -32 {
                    buf.push(Marker::NegFixInt(v as i8).into());
                } else if v >= i8::MIN as i64 {
                    buf.push(Marker::Int8.into());
                    buf.push(v as u8);
                } else if v >= i16::MIN as i64 {
                    buf.push(Marker::Int16.into());
                    buf.extend_from_slice(&(v as i16).to_le_bytes());
                } else if v >= i32::MIN as i64 {
                    buf.push(Marker::Int32.into());
                    buf.extend_from_slice(&(v as i32).to_le_bytes());
                } else {
                    buf.push(Marker::Int64.into());
                    buf.extend_from_slice(&v.to_le_bytes());
                }
            }
        },
        Str(v) => {
            let len = v.len();
            assert!(len <= (u32::MAX as usize));
            if len <= 31 {
                buf.push(Marker::FixStr(len as u8).into());
            } else if len <= u8::MAX as usize {
                buf.push(Marker::Str8.into());
                buf.push(len as u8);
            } else if len <= u16::MAX as usize {
                buf.push(Marker::Str16.into());
                buf.extend_from_slice(&(len as u16).to_le_bytes());
            } else {
                buf.push(Marker::Str32.into());
                buf.extend_from_slice(&(len as u32).to_le_bytes());
            }
            buf.extend_from_slice(v.as_bytes());
        }
        F32(v) => {
            buf.push(Marker::F32.into());
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        F64(v) => {
            buf.push(Marker::F64.into());
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Bin(v) => {
            let len = v.len();
            assert!(len <= (u32::MAX as usize));
            if len <= u8::MAX as usize {
                buf.push(Marker::Bin8.into());
                buf.push(len as u8);
            } else if len <= u16::MAX as usize {
                buf.push(Marker::Bin16.into());
                buf.extend_from_slice(&(len as u16).to_le_bytes());
            } else {
                buf.push(Marker::Bin32.into());
                buf.extend_from_slice(&(len as u32).to_le_bytes());
            }
            buf.extend_from_slice(v);
        }
        Array(len) => {
            assert!(len <= (u32::MAX as usize));
            // Write marker
            if len <= 15 {
                buf.push(Marker::FixArray(len as u8).into());
            } else if len <= u8::MAX as usize {
                buf.push(Marker::Array8.into());
                buf.push(len as u8);
            } else if len <= u16::MAX as usize {
                buf.push(Marker::Array16.into());
                buf.extend_from_slice(&(len as u16).to_le_bytes());
            } else {
                buf.push(Marker::Array32.into());
                buf.extend_from_slice(&(len as u32).to_le_bytes());
            }
        }
        Map(len) => {
            assert!(len <= (u32::MAX as usize));
            // Write marker
            if len <= 15 {
                buf.push(Marker::FixMap(len as u8).into());
            } else if len <= u8::MAX as usize {
                buf.push(Marker::Map8.into());
                buf.push(len as u8);
            } else if len <= u16::MAX as usize {
                buf.push(Marker::Map16.into());
                buf.extend_from_slice(&(len as u16).to_le_bytes());
            } else {
                buf.push(Marker::Map32.into());
                buf.extend_from_slice(&(len as u32).to_le_bytes());
            }
        }
    }
}

/// Tracks how many elements remain in each open Array/Map so the parser can
/// cap nesting at [`MAX_DEPTH`].
#[derive(Clone, Debug, Default)]
struct DepthTracker {
    tracking: Vec<u32>,
}

impl DepthTracker {
    fn update_elem(&mut self, elem: &Element) -> Result<()> {
        // Subtract from count for next element
        if let Some(v) = self.tracking.last_mut() {
            *v -= 1;
        }

        // Increase nest depth if this is a nesting element
        match elem {
            Element::Map(len) => self.tracking.push(2 * (*len as u32)), // 2 elements per map item
            Element::Array(len) => self.tracking.push(*len as u32),
            _ => (),
        }

        // Check to see if we hit the nesting limit
        if self.tracking.len() > MAX_DEPTH {
            return Err(Error::ParseLimit("Depth limit exceeded".to_string()));
        }

        // Drop any depth tracking entries that have hit zero
        while let Some(0) = self.tracking.last() {
            self.tracking.pop();
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Parser<'a> {
    data: &'a [u8],
    depth_tracking: DepthTracker,
    errored: bool,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8]) -> Parser<'a> {
        Self {
            data,
            depth_tracking: DepthTracker::default(),
            errored: false,
        }
    }

    /// The bytes not yet consumed by the parser.
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    // Given a retrieved marker, try to turn it into the next element, which may move through the
    // indexed data. If we can't, error. This function *does not* set the the errored flag. That's
    // up to the caller.
    fn parse_element(&mut self, marker: Marker) -> Result<Element<'a>> {
        use self::Marker::*;
        let elem =
            match marker {
                Reserved => return Err(Error::BadEncode(String::from("Reserved marker found"))),
                Null => Element::Null,
                False => Element::Bool(false),
                True => Element::Bool(true),
                PosFixInt(v) => Element::Int(v.into()),
                UInt8 => {
                    let v = self.data.read_u8().map_err(|_| Error::LengthTooShort {
                        step: "decode UInt8",
                        actual: 0,
                        expected: 1,
                    })?;
                    if v < 128 {
                        return Err(Error::BadEncode(format!(
                            "Got UInt8 with value = {}. This is not the shortest encoding.",
                            v
                        )));
                    }
                    Element::Int(v.into())
                }
                UInt16 => {
                    let v = self.data.read_u16::<LittleEndian>().map_err(|_| {
                        Error::LengthTooShort {
                            step: "decode UInt16",
                            actual: self.data.len(),
                            expected: 2,
                        }
                    })?;
                    if v <= u8::MAX as u16 {
                        return Err(Error::BadEncode(format!(
                            "Got UInt16 with value = {}. This is not the shortest encoding.",
                            v
                        )));
                    }
                    Element::Int(v.into())
                }
                UInt32 => {
                    let v = self.data.read_u32::<LittleEndian>().map_err(|_| {
                        Error::LengthTooShort {
                            step: "decode UInt32",
                            actual: self.data.len(),
                            expected: 4,
                        }
                    })?;
                    if v <= u16::MAX as u32 {
                        return Err(Error::BadEncode(format!(
                            "Got UInt32 with value = {}. This is not the shortest encoding.",
                            v
                        )));
                    }
                    Element::Int(v.into())
                }
                UInt64 => {
                    let v = self.data.read_u64::<LittleEndian>().map_err(|_| {
                        Error::LengthTooShort {
                            step: "decode UInt64",
                            actual: self.data.len(),
                            expected: 8,
                        }
                    })?;
                    if v <= u32::MAX as u64 {
                        return Err(Error::BadEncode(format!(
                            "Got UInt64 with value = {}. This is not the shortest encoding.",
                            v
                        )));
                    }
                    Element::Int(v.into())
                }
                NegFixInt(v) => Element::Int(v.into()),
                Int8 => {
                    let v = self.data.read_i8().map_err(|_| Error::LengthTooShort {
                        step: "decode Int8",
                        actual: 0,
                        expected: 1,
                    })?;
                    if v >= -32 {
                        return Err(Error::BadEncode(format!(
                            "Got Int8 with value = {}. This is not the shortest encoding.",
                            v
                        )));
                    }
                    Element::Int(v.into())
                }
                Int16 => {
                    let v = self.data.read_i16::<LittleEndian>().map_err(|_| {
                        Error::LengthTooShort {
                            step: "decode Int16",
                            actual: self.data.len(),
                            expected: 2,
                        }
                    })?;
                    if v >= i8::MIN as i16 {
                        return Err(Error::BadEncode(format!(
                            "Got Int16 with value = {}. This is not the shortest encoding.",
                            v
                        )));
                    }
                    Element::Int(v.into())
                }
                Int32 => {
                    let v = self.data.read_i32::<LittleEndian>().map_err(|_| {
                        Error::LengthTooShort {
                            step: "decode Int32",
                            actual: self.data.len(),
                            expected: 4,
                        }
                    })?;
                    if v >= i16::MIN as i32 {
                        return Err(Error::BadEncode(format!(
                            "Got Int32 with value = {}. This is not the shortest encoding.",
                            v
                        )));
                    }
                    Element::Int(v.into())
                }
                Int64 => {
                    let v = self.data.read_i64::<LittleEndian>().map_err(|_| {
                        Error::LengthTooShort {
                            step: "decode Int64",
                            actual: self.data.len(),
                            expected: 8,
                        }
                    })?;
                    if v >= i32::MIN as i64 {
                        return Err(Error::BadEncode(format!(
                            "Got Int64 with value = {}. This is not the shortest encoding.",
                            v
                        )));
                    }
                    Element::Int(v.into())
                }
                Bin8 => {
                    let len = self.data.read_u8().map_err(|_| Error::LengthTooShort {
                        step: "decode Bin8 length",
                        actual: 0,
                        expected: 1,
                    })? as usize;
                    if len > self.data.len() {
                        return Err(Error::LengthTooShort {
                            step: "get Bin8 content",
                            actual: self.data.len(),
                            expected: len,
                        });
                    }
                    let (bytes, data) = self.data.split_at(len);
                    self.data = data;
                    Element::Bin(bytes)
                }
                Bin16 => {
                    let len =
                        self.data
                            .read_u16::<LittleEndian>()
                            .map_err(|_| Error::LengthTooShort {
                                step: "decode Bin16 length",
                                actual: self.data.len(),
                                expected: 2,
                            })? as usize;
                    if len <= (u8::MAX as usize) {
                        return Err(Error::BadEncode(format!(
                            "Got Bin16 with length = {}. This is not the shortest encoding.",
                            len
                        )));
                    }
                    if len > self.data.len() {
                        return Err(Error::LengthTooShort {
                            step: "get Bin16 content",
                            actual: self.data.len(),
                            expected: len,
                        });
                    }
                    let (bytes, data) = self.data.split_at(len);
                    self.data = data;
                    Element::Bin(bytes)
                }
                Bin32 => {
                    let len =
                        self.data
                            .read_u32::<LittleEndian>()
                            .map_err(|_| Error::LengthTooShort {
                                step: "decode Bin32 length",
                                actual: self.data.len(),
                                expected: 4,
                            })? as usize;
                    if len <= (u16::MAX as usize) {
                        return Err(Error::BadEncode(format!(
                            "Got Bin32 with length = {}. This is not the shortest encoding.",
                            len
                        )));
                    }
                    if len > self.data.len() {
                        return Err(Error::LengthTooShort {
                            step: "get Bin32 content",
                            actual: self.data.len(),
                            expected: len,
                        });
                    }
                    let (bytes, data) = self.data.split_at(len);
                    self.data = data;
                    Element::Bin(bytes)
                }
                F32 => {
                    let v = self.data.read_f32::<LittleEndian>().map_err(|_| {
                        Error::LengthTooShort {
                            step: "decode F32",
                            actual: self.data.len(),
                            expected: 4,
                        }
                    })?;
                    Element::F32(v)
                }
                F64 => {
                    let v = self.data.read_f64::<LittleEndian>().map_err(|_| {
                        Error::LengthTooShort {
                            step: "decode F64",
                            actual: self.data.len(),
                            expected: 8,
                        }
                    })?;
                    Element::F64(v)
                }
                FixStr(len) => self.parse_str(len as usize)?,
                Str8 => {
                    let len = self.data.read_u8().map_err(|_| Error::LengthTooShort {
                        step: "decode Str8 length",
                        actual: 0,
                        expected: 1,
                    })? as usize;
                    if len <= 31 {
                        return Err(Error::BadEncode(format!(
                            "Got Str8 with length = {}. This is not the shortest encoding.",
                            len
                        )));
                    }
                    self.parse_str(len)?
                }
                Str16 => {
                    let len =
                        self.data
                            .read_u16::<LittleEndian>()
                            .map_err(|_| Error::LengthTooShort {
                                step: "decode Str16 length",
                                actual: self.data.len(),
                                expected: 2,
                            })? as usize;
                    if len <= (u8::MAX as usize) {
                        return Err(Error::BadEncode(format!(
                            "Got Str16 with length = {}. This is not the shortest encoding.",
                            len
                        )));
                    }
                    self.parse_str(len)?
                }
                Str32 => {
                    let len =
                        self.data
                            .read_u32::<LittleEndian>()
                            .map_err(|_| Error::LengthTooShort {
                                step: "decode Str32 length",
                                actual: self.data.len(),
                                expected: 4,
                            })? as usize;
                    if len <= (u16::MAX as usize) {
                        return Err(Error::BadEncode(format!(
                            "Got Str32 with length = {}. This is not the shortest encoding.",
                            len
                        )));
                    }
                    self.parse_str(len)?
                }
                FixArray(len) => Element::Array(len as usize),
                Array8 => {
                    let len = self.data.read_u8().map_err(|_| Error::LengthTooShort {
                        step: "decode Array8 length",
                        actual: 0,
                        expected: 1,
                    })? as usize;
                    if len <= 15 {
                        return Err(Error::BadEncode(format!(
                        "Got Array8 marker with length = {}. This is not the shortest encoding.",
                        len
                    )));
                    }
                    Element::Array(len)
                }
                Array16 => {
                    let len =
                        self.data
                            .read_u16::<LittleEndian>()
                            .map_err(|_| Error::LengthTooShort {
                                step: "decode Array16 length",
                                actual: self.data.len(),
                                expected: 2,
                            })? as usize;
                    if len <= u8::MAX as usize {
                        return Err(Error::BadEncode(format!(
                        "Got Array16 marker with length = {}. This is not the shortest encoding.",
                        len
                    )));
                    }
                    if len > self.data.len() {
                        return Err(Error::BadEncode(format!(
                        "Got Array16 marker with length = {}, but there are only {} bytes left.",
                        len, self.data.len()
                    )));
                    }
                    Element::Array(len)
                }
                Array32 => {
                    let len =
                        self.data
                            .read_u32::<LittleEndian>()
                            .map_err(|_| Error::LengthTooShort {
                                step: "decode Array32 length",
                                actual: self.data.len(),
                                expected: 4,
                            })? as usize;
                    if len <= u16::MAX as usize {
                        return Err(Error::BadEncode(format!(
                        "Got Array32 marker with length = {}. This is not the shortest encoding.",
                        len
                    )));
                    }
                    if len > self.data.len() {
                        return Err(Error::BadEncode(format!(
                        "Got Array32 marker with length = {}, but there are only {} bytes left.",
                        len, self.data.len()
                    )));
                    }
                    Element::Array(len)
                }
                FixMap(len) => Element::Map(len as usize),
                Map8 => {
                    let len = self.data.read_u8().map_err(|_| Error::LengthTooShort {
                        step: "decode Map8 length",
                        actual: 0,
                        expected: 1,
                    })? as usize;
                    if len <= 15 {
                        return Err(Error::BadEncode(format!(
                            "Got Map8 marker with length = {}. This is not the shortest encoding.",
                            len
                        )));
                    }
                    Element::Map(len)
                }
                Map16 => {
                    let len =
                        self.data
                            .read_u16::<LittleEndian>()
                            .map_err(|_| Error::LengthTooShort {
                                step: "decode Map16 length",
                                actual: self.data.len(),
                                expected: 2,
                            })? as usize;
                    if len <= u8::MAX as usize {
                        return Err(Error::BadEncode(format!(
                            "Got Map16 marker with length = {}. This is not the shortest encoding.",
                            len
                        )));
                    }
                    if 2 * len > self.data.len() {
                        return Err(Error::BadEncode(format!(
                            "Got Map16 marker with length = {}, but there are only {} bytes left.",
                            len,
                            self.data.len()
                        )));
                    }
                    Element::Map(len)
                }
                Map32 => {
                    let len =
                        self.data
                            .read_u32::<LittleEndian>()
                            .map_err(|_| Error::LengthTooShort {
                                step: "decode Map32 length",
                                actual: self.data.len(),
                                expected: 4,
                            })? as usize;
                    if len <= u16::MAX as usize {
                        return Err(Error::BadEncode(format!(
                            "Got Map32 marker with length = {}. This is not the shortest encoding.",
                            len
                        )));
                    }
                    if 2 * len > self.data.len() {
                        return Err(Error::BadEncode(format!(
                            "Got Map32 marker with length = {}, but there are only {} bytes left.",
                            len,
                            self.data.len()
                        )));
                    }
                    Element::Map(len)
                }
            };
        self.depth_tracking.update_elem(&elem)?;
        Ok(elem)
    }

    fn parse_str(&mut self, len: usize) -> Result<Element<'a>> {
        if len > self.data.len() {
            return Err(Error::LengthTooShort {
                step: "get Str content",
                actual: self.data.len(),
                expected: len,
            });
        }
        let (string, data) = self.data.split_at(len);
        self.data = data;
        let string =
            std::str::from_utf8(string).map_err(|e| Error::BadEncode(format!("{}", e)))?;
        Ok(Element::Str(string))
    }
}

impl<'a> std::iter::Iterator for Parser<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }
        let (&marker, data) = self.data.split_first()?;
        self.data = data;
        let result = self.parse_element(Marker::from_u8(marker));
        if result.is_err() {
            self.errored = true;
        }
        Some(result)
    }
}

/// Measure the full encoded size of the element starting at `data[0]`,
/// including every child of a structural element. Fails if the bytes don't
/// hold one complete, well-formed element.
pub fn element_size(data: &[u8]) -> Result<usize> {
    let mut parser = Parser::new(data);
    let mut remaining: usize = 1;
    while remaining > 0 {
        let elem = match parser.next() {
            Some(elem) => elem?,
            None => {
                return Err(Error::LengthTooShort {
                    step: "measure element",
                    actual: data.len() - parser.remaining().len(),
                    expected: data.len() - parser.remaining().len() + 1,
                })
            }
        };
        remaining -= 1;
        match elem {
            Element::Map(len) => remaining += 2 * len,
            Element::Array(len) => remaining += len,
            _ => (),
        }
    }
    Ok(data.len() - parser.remaining().len())
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode(elem: Element) -> Vec<u8> {
        let mut enc = Vec::new();
        serialize_elem(&mut enc, elem);
        enc
    }

    #[test]
    fn reserved() {
        for byte in [0xc1u8, 0xc7, 0xc8, 0xc9, 0xdd, 0xde, 0xdf] {
            let data = [byte, 0x00];
            let mut parser = Parser::new(&data[..]);
            let result = parser.next().unwrap();
            assert!(
                result.is_err(),
                "0x{:x} should fail because it is a reserved marker byte",
                byte
            );
            assert!(parser.next().is_none());
        }
    }

    #[test]
    fn null_bytes() {
        assert_eq!(encode(Element::Null), &[0xc0]);
    }

    #[test]
    fn bool_bytes() {
        assert_eq!(encode(Element::Bool(false)), &[0xc2]);
        assert_eq!(encode(Element::Bool(true)), &[0xc3]);
    }

    #[test]
    fn roundtrip_pos_int() {
        // Run through all the boundary cases
        let mut test_cases: Vec<u64> = vec![0, 1];
        for i in 0..5 {
            test_cases.push(127 - 2 + i)
        }
        for i in 0..5 {
            test_cases.push(u8::MAX as u64 - 2 + i)
        }
        for i in 0..5 {
            test_cases.push(u16::MAX as u64 - 2 + i)
        }
        for i in 0..5 {
            test_cases.push(u32::MAX as u64 - 2 + i)
        }
        for i in 0..3 {
            test_cases.push(u64::MAX - 2 + i)
        }

        for case in test_cases {
            let enc = encode(Element::Int(case.into()));
            let mut parser = Parser::new(enc.as_ref());
            let val = parser.next().unwrap().unwrap();
            assert!(parser.next().is_none());
            if let Element::Int(val) = val {
                assert_eq!(val.as_u64().unwrap(), case);
            } else {
                panic!("Element wasn't an Integer");
            }
        }
    }

    #[test]
    fn roundtrip_neg_int() {
        // Run through all the boundary cases
        let mut test_cases: Vec<i64> = vec![-1];
        for i in -2..3 {
            test_cases.push(-32 - i)
        }
        for i in -2..3 {
            test_cases.push(i8::MIN as i64 - i)
        }
        for i in -2..3 {
            test_cases.push(i16::MIN as i64 - i)
        }
        for i in -2..3 {
            test_cases.push(i32::MIN as i64 - i)
        }
        for i in -2..0 {
            test_cases.push(i64::MIN - i)
        }

        for case in test_cases {
            let enc = encode(Element::Int(case.into()));
            let mut parser = Parser::new(enc.as_ref());
            let val = parser.next().unwrap().unwrap();
            assert!(parser.next().is_none());
            if let Element::Int(val) = val {
                assert_eq!(val.as_i64().unwrap(), case);
            } else {
                panic!("Element wasn't an Integer");
            }
        }
    }

    #[test]
    fn not_shortest_encoding() {
        // UInt8 carrying a value that fits a PosFixInt
        let data = [0xcc, 0x05];
        let mut parser = Parser::new(&data[..]);
        assert!(parser.next().unwrap().is_err());
    }

    #[test]
    fn size_of_scalar() {
        assert_eq!(element_size(&encode(Element::Null)).unwrap(), 1);
        assert_eq!(element_size(&encode(Element::Int(300.into()))).unwrap(), 3);
        assert_eq!(element_size(&encode(Element::Str("abc"))).unwrap(), 4);
    }

    #[test]
    fn size_of_tree() {
        // {"a": [1, 2], "b": true}
        let mut enc = Vec::new();
        serialize_elem(&mut enc, Element::Map(2));
        serialize_elem(&mut enc, Element::Str("a"));
        serialize_elem(&mut enc, Element::Array(2));
        serialize_elem(&mut enc, Element::Int(1.into()));
        serialize_elem(&mut enc, Element::Int(2.into()));
        serialize_elem(&mut enc, Element::Str("b"));
        serialize_elem(&mut enc, Element::Bool(true));
        // Trailing bytes shouldn't count
        let mut padded = enc.clone();
        padded.push(0xc0);
        assert_eq!(element_size(&padded).unwrap(), enc.len());
    }

    #[test]
    fn size_of_truncated_tree() {
        let mut enc = Vec::new();
        serialize_elem(&mut enc, Element::Map(2));
        serialize_elem(&mut enc, Element::Str("a"));
        assert!(element_size(&enc).is_err());
    }
}
