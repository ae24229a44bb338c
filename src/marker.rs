/// Element format markers. For internal use only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Marker {
    PosFixInt(u8),
    FixMap(u8),
    FixArray(u8),
    FixStr(u8),
    Null,
    Reserved,
    False,
    True,
    Bin8,
    Bin16,
    Bin32,
    F32,
    F64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Str8,
    Str16,
    Str32,
    Array8,
    Array16,
    Array32,
    Map8,
    Map16,
    Map32,
    NegFixInt(i8),
}

impl Marker {
    /// Construct a marker from a single byte.
    pub fn from_u8(n: u8) -> Marker {
        match n {
            0x00..=0x7f => Marker::PosFixInt(n),
            0x80..=0x8f => Marker::FixMap(n & 0x0F),
            0x90..=0x9f => Marker::FixArray(n & 0x0F),
            0xa0..=0xbf => Marker::FixStr(n & 0x1F),
            0xc0 => Marker::Null,
            0xc1 => Marker::Reserved,
            0xc2 => Marker::False,
            0xc3 => Marker::True,
            0xc4 => Marker::Bin8,
            0xc5 => Marker::Bin16,
            0xc6 => Marker::Bin32,
            0xc7 => Marker::Reserved,
            0xc8 => Marker::Reserved,
            0xc9 => Marker::Reserved,
            0xca => Marker::F32,
            0xcb => Marker::F64,
            0xcc => Marker::UInt8,
            0xcd => Marker::UInt16,
            0xce => Marker::UInt32,
            0xcf => Marker::UInt64,
            0xd0 => Marker::Int8,
            0xd1 => Marker::Int16,
            0xd2 => Marker::Int32,
            0xd3 => Marker::Int64,
            0xd4 => Marker::Str8,
            0xd5 => Marker::Str16,
            0xd6 => Marker::Str32,
            0xd7 => Marker::Array8,
            0xd8 => Marker::Array16,
            0xd9 => Marker::Array32,
            0xda => Marker::Map8,
            0xdb => Marker::Map16,
            0xdc => Marker::Map32,
            0xdd => Marker::Reserved,
            0xde => Marker::Reserved,
            0xdf => Marker::Reserved,
            0xe0..=0xff => Marker::NegFixInt(n as i8),
        }
    }

    /// Converts a marker object into a single-byte representation.
    /// Assumes the content of the marker is already masked appropriately.
    pub fn into_u8(self) -> u8 {
        match self {
            Marker::PosFixInt(val) => val,
            Marker::FixMap(len) => 0x80 | len,
            Marker::FixArray(len) => 0x90 | len,
            Marker::FixStr(len) => 0xa0 | len,
            Marker::Null => 0xc0,
            Marker::Reserved => 0xc1,
            Marker::False => 0xc2,
            Marker::True => 0xc3,
            Marker::Bin8 => 0xc4,
            Marker::Bin16 => 0xc5,
            Marker::Bin32 => 0xc6,
            Marker::F32 => 0xca,
            Marker::F64 => 0xcb,
            Marker::UInt8 => 0xcc,
            Marker::UInt16 => 0xcd,
            Marker::UInt32 => 0xce,
            Marker::UInt64 => 0xcf,
            Marker::Int8 => 0xd0,
            Marker::Int16 => 0xd1,
            Marker::Int32 => 0xd2,
            Marker::Int64 => 0xd3,
            Marker::Str8 => 0xd4,
            Marker::Str16 => 0xd5,
            Marker::Str32 => 0xd6,
            Marker::Array8 => 0xd7,
            Marker::Array16 => 0xd8,
            Marker::Array32 => 0xd9,
            Marker::Map8 => 0xda,
            Marker::Map16 => 0xdb,
            Marker::Map32 => 0xdc,
            Marker::NegFixInt(val) => val as u8,
        }
    }
}

impl From<u8> for Marker {
    fn from(val: u8) -> Marker {
        Marker::from_u8(val)
    }
}

impl From<Marker> for u8 {
    fn from(val: Marker) -> u8 {
        val.into_u8()
    }
}

/// Control bytes for the column layer. These reuse reserved element marker
/// values, so whenever the column layer expects a control section the leading
/// byte is either one of these or the first marker byte of a literal element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// The control byte is itself the first marker byte of one complete
    /// encoded element.
    Literal,
    /// A count byte follows, then that many 8-byte packed delta blocks for
    /// the currently active field.
    DeltaBlocks,
    /// Delta-of-delta section. Defined by the format, declined by this
    /// implementation.
    DeltaOfDelta,
    /// 128-bit wide value section. Defined by the format, declined by this
    /// implementation.
    Wide128,
    /// Interleaved region start, object root, arrays treated as opaque
    /// leaves.
    InterleavedObject,
    /// Interleaved region start, object root, arrays traversed.
    InterleavedObjectFull,
    /// Interleaved region start, array root, arrays traversed.
    InterleavedArray,
    /// End of the current interleaved region.
    End,
}

pub const CONTROL_END: u8 = 0xc1;
pub const CONTROL_DELTA_BLOCKS: u8 = 0xc7;
pub const CONTROL_DELTA_OF_DELTA: u8 = 0xc8;
pub const CONTROL_WIDE_128: u8 = 0xc9;
pub const CONTROL_INTERLEAVED_OBJECT: u8 = 0xdd;
pub const CONTROL_INTERLEAVED_OBJECT_FULL: u8 = 0xde;
pub const CONTROL_INTERLEAVED_ARRAY: u8 = 0xdf;

/// The most packed delta blocks one section can carry.
pub const MAX_BLOCKS_PER_SECTION: usize = 16;

impl Control {
    pub fn from_u8(n: u8) -> Control {
        match n {
            CONTROL_END => Control::End,
            CONTROL_DELTA_BLOCKS => Control::DeltaBlocks,
            CONTROL_DELTA_OF_DELTA => Control::DeltaOfDelta,
            CONTROL_WIDE_128 => Control::Wide128,
            CONTROL_INTERLEAVED_OBJECT => Control::InterleavedObject,
            CONTROL_INTERLEAVED_OBJECT_FULL => Control::InterleavedObjectFull,
            CONTROL_INTERLEAVED_ARRAY => Control::InterleavedArray,
            _ => Control::Literal,
        }
    }
}
