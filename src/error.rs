use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// Basic colpack element encoding failure: a reserved marker, a
    /// non-shortest encoding, invalid UTF-8, or similar. The bytes are
    /// corrupt; the whole blob should be discarded.
    BadEncode(String),
    /// An element or control section ended before its declared content did.
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// Column-layer corruption: the control byte sequence is structurally
    /// invalid, a delta was applied to a type that cannot take one, streams
    /// ended with unequal value counts, or a value fell outside its declared
    /// width. Never recoverable.
    Corrupt(String),
    /// The bytes are valid per the format, but this implementation declines
    /// to handle the shape: overlapping requested paths, delta-of-delta
    /// sections, or 128-bit wide sections.
    Unsupported(String),
    /// The general and fast decompression paths disagreed about where the
    /// interleaved region ends. This is a logic defect, not bad input.
    InternalConsistency(String),
    /// A row handed to the builder does not share the reference object's
    /// shape.
    ShapeMismatch { row: usize, detail: String },
    /// Parsing hit a structural limit, such as the nesting depth cap.
    ParseLimit(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::BadEncode(ref err) => write!(f, "Basic data encoding failure: {}", err),
            Error::LengthTooShort {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected data length {}, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::Corrupt(ref err) => write!(f, "Corrupt compressed column: {}", err),
            Error::Unsupported(ref err) => write!(f, "Unsupported column shape: {}", err),
            Error::InternalConsistency(ref err) => {
                write!(f, "Internal consistency violation: {}", err)
            }
            Error::ShapeMismatch { row, ref detail } => write!(
                f,
                "Row {} does not match the reference object: {}",
                row, detail
            ),
            Error::ParseLimit(ref err) => write!(f, "Hit parsing limit: {}", err),
        }
    }
}

impl std::error::Error for Error {}
