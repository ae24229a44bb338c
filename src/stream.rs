//! Per-stream value state. Each leaf of the reference object owns one of
//! these; literals load it and delta slots advance it.

use crate::element::{Element, Parser};
use crate::error::{Error, Result};
use crate::simple8b::Slot;
use crate::Integer;

/// Which delta domain the last literal put this stream in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DeltaKind {
    /// Results must stay 0 or 1.
    Bool,
    /// The literal fit an `i32`, so results must too.
    Int32,
    /// Results may span the full `i64::MIN ..= u64::MAX` range.
    Int64,
}

/// The value a stream most recently produced.
#[derive(Clone, Copy, Debug)]
pub(crate) enum LeafValue<'a> {
    /// A complete encoded element, repeatable but not delta-adjustable.
    Raw(&'a [u8]),
    Bool(bool),
    Int(Integer),
}

#[derive(Clone, Debug)]
pub(crate) struct DecodingState<'a> {
    last: LeafValue<'a>,
    /// `None` when the last literal's type takes no deltas.
    kind: Option<DeltaKind>,
    /// The last produced value in delta space. Unused when `kind` is `None`.
    base: i128,
    /// Slot carried between delta sections of this stream, so a repeat block
    /// at a section start has something to repeat.
    seed: Option<Slot>,
}

impl<'a> DecodingState<'a> {
    /// Start a stream from its reference-object literal.
    pub fn new(raw: &'a [u8]) -> Result<DecodingState<'a>> {
        let mut state = DecodingState {
            last: LeafValue::Raw(raw),
            kind: None,
            base: 0,
            seed: None,
        };
        state.load_literal(raw)?;
        Ok(state)
    }

    /// Load a literal element, resetting the delta domain. A literal also
    /// reseeds the slot carried between sections: the value just produced
    /// is a zero delta away from itself.
    pub fn load_literal(&mut self, raw: &'a [u8]) -> Result<()> {
        let mut parser = Parser::new(raw);
        let elem = parser.next().ok_or(Error::LengthTooShort {
            step: "literal element",
            actual: 0,
            expected: 1,
        })??;
        match elem {
            Element::Bool(v) => {
                self.last = LeafValue::Bool(v);
                self.kind = Some(DeltaKind::Bool);
                self.base = v as i128;
            }
            Element::Int(v) => {
                self.last = LeafValue::Int(v);
                self.kind = Some(if in_i32(v.as_i128()) {
                    DeltaKind::Int32
                } else {
                    DeltaKind::Int64
                });
                self.base = v.as_i128();
            }
            _ => {
                self.last = LeafValue::Raw(raw);
                self.kind = None;
                self.base = 0;
            }
        }
        self.seed = Some(Some(0));
        Ok(())
    }

    /// Apply one delta slot. `None` means the value is absent from this row;
    /// neither the last value nor the delta base moves. A zero delta re-emits
    /// the last value whatever its type; any other delta needs a delta-capable
    /// stream and must land inside the stream's domain.
    pub fn apply_slot(&mut self, slot: Slot) -> Result<Option<LeafValue<'a>>> {
        let delta = match slot {
            None => return Ok(None),
            Some(0) => return Ok(Some(self.last)),
            Some(delta) => delta,
        };
        let kind = self.kind.ok_or_else(|| {
            Error::Corrupt(format!(
                "Nonzero delta {} on a stream whose type takes no deltas",
                delta
            ))
        })?;
        let next = self.base + delta as i128;
        self.last = match kind {
            DeltaKind::Bool => {
                if next != 0 && next != 1 {
                    return Err(Error::Corrupt(format!(
                        "Delta pushed a Bool stream to {}",
                        next
                    )));
                }
                LeafValue::Bool(next == 1)
            }
            DeltaKind::Int32 => {
                if !in_i32(next) {
                    return Err(Error::Corrupt(format!(
                        "Delta pushed a 32-bit Int stream to {}",
                        next
                    )));
                }
                LeafValue::Int(Integer::from(next as i32))
            }
            DeltaKind::Int64 => LeafValue::Int(Integer::from_i128(next).ok_or_else(|| {
                Error::Corrupt(format!("Delta pushed an Int stream to {}", next))
            })?),
        };
        self.base = next;
        Ok(Some(self.last))
    }

    /// The value most recently produced.
    pub fn last(&self) -> LeafValue<'a> {
        self.last
    }

    pub fn seed(&self) -> Option<Slot> {
        self.seed
    }

    pub fn set_seed(&mut self, seed: Option<Slot>) {
        self.seed = seed;
    }
}

#[inline]
pub(crate) fn in_i32(v: i128) -> bool {
    v >= i32::MIN as i128 && v <= i32::MAX as i128
}
