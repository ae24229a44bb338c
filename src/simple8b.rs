//! Packed delta blocks. Each block is a little-endian `u64`: the low 4 bits
//! select a packing width and the remaining 60 bits hold slots, lowest slot
//! first. A slot is either a zigzag-coded delta or the all-ones "missing"
//! pattern. Selector 0 repeats the most recently produced slot, which lets a
//! run reach back across a block or section boundary.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// One slot of a packed block: a delta to apply, or `None` for a missing
/// value.
pub type Slot = Option<i64>;

/// Packing width table, indexed by selector. Each entry is
/// `(bits per slot, slots per block)`.
const SELECTOR_TABLE: [(u32, usize); 14] = [
    (1, 60),
    (2, 30),
    (3, 20),
    (4, 15),
    (5, 12),
    (6, 10),
    (7, 8),
    (8, 7),
    (10, 6),
    (12, 5),
    (15, 4),
    (20, 3),
    (30, 2),
    (60, 1),
];

const SELECTOR_RLE: u64 = 0;
const SELECTOR_RESERVED: u64 = 15;

/// Runs at least this long get a repeat block instead of packed slots.
const RLE_MIN_RUN: u64 = 16;

#[inline]
fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

#[inline]
fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Iterator over the slots of a run of packed blocks.
///
/// `seed` is the slot most recently produced before these blocks, so a repeat
/// block at the very start has something to repeat. After a literal value the
/// seed is a zero delta; between two block sections it is whatever slot the
/// previous section ended on.
#[derive(Clone, Debug)]
pub struct SlotCursor<'a> {
    blocks: &'a [u8],
    // Remaining packed slots of the current block
    payload: u64,
    bits: u32,
    count: usize,
    // Remaining repetitions of `last`
    repeat: u64,
    last: Option<Slot>,
}

impl<'a> SlotCursor<'a> {
    pub fn new(blocks: &'a [u8], seed: Option<Slot>) -> Result<SlotCursor<'a>> {
        if blocks.len() % 8 != 0 {
            return Err(Error::Corrupt(format!(
                "Packed block run of {} bytes is not a whole number of blocks",
                blocks.len()
            )));
        }
        Ok(SlotCursor {
            blocks,
            payload: 0,
            bits: 0,
            count: 0,
            repeat: 0,
            last: seed,
        })
    }

    /// The slot most recently produced, or the seed if none has been. Carried
    /// forward as the seed of the next section of the same field.
    pub fn last_slot(&self) -> Option<Slot> {
        self.last
    }

    /// True once every slot has been produced. Blocks never pack zero slots,
    /// so remaining bytes always mean remaining slots.
    pub fn is_exhausted(&self) -> bool {
        self.repeat == 0 && self.count == 0 && self.blocks.is_empty()
    }

    fn load_block(&mut self) -> Result<bool> {
        if self.blocks.is_empty() {
            return Ok(false);
        }
        let block = LittleEndian::read_u64(self.blocks);
        self.blocks = &self.blocks[8..];
        let selector = block & 0xf;
        let payload = block >> 4;
        match selector {
            SELECTOR_RLE => {
                if payload == 0 {
                    return Err(Error::Corrupt("Repeat block with a count of zero".into()));
                }
                if self.last.is_none() {
                    return Err(Error::Corrupt(
                        "Repeat block with no slot to repeat".into(),
                    ));
                }
                self.repeat = payload;
            }
            SELECTOR_RESERVED => {
                return Err(Error::Corrupt("Reserved packing selector 15".into()));
            }
            sel => {
                let (bits, count) = SELECTOR_TABLE[sel as usize - 1];
                self.payload = payload;
                self.bits = bits;
                self.count = count;
            }
        }
        Ok(true)
    }
}

impl<'a> Iterator for SlotCursor<'a> {
    type Item = Result<Slot>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.repeat > 0 {
                self.repeat -= 1;
                // load_block verified a last slot exists
                return Some(Ok(self.last.unwrap()));
            }
            if self.count > 0 {
                let mask = if self.bits == 64 {
                    u64::MAX
                } else {
                    (1u64 << self.bits) - 1
                };
                let raw = self.payload & mask;
                self.payload >>= self.bits;
                self.count -= 1;
                let slot = if raw == mask {
                    None
                } else {
                    Some(zigzag_decode(raw))
                };
                self.last = Some(slot);
                return Some(Ok(slot));
            }
            match self.load_block() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Pack a run of slots into blocks. `prev` is the slot produced just before
/// this run, available as a repeat target for a run that starts immediately.
///
/// The caller must already have checked that every delta fits a 60-bit slot,
/// i.e. its zigzag form is below `2^60 - 1`.
pub fn pack(prev: Slot, slots: &[Slot], out: &mut Vec<u8>) {
    let mut i = 0;
    while i < slots.len() {
        let last = if i == 0 { prev } else { slots[i - 1] };
        // Repeat block when a long enough run of the previous slot follows
        let run = slots[i..].iter().take_while(|&&s| s == last).count() as u64;
        if run >= RLE_MIN_RUN {
            out.extend_from_slice(&((run << 4) | SELECTOR_RLE).to_le_bytes());
            i += run as usize;
            continue;
        }
        // Otherwise the widest-count selector whose slots all fit
        let (selector, bits, count) = SELECTOR_TABLE
            .iter()
            .enumerate()
            .map(|(idx, &(bits, count))| (idx as u64 + 1, bits, count))
            .find(|&(_, bits, count)| {
                count <= slots.len() - i
                    && slots[i..i + count].iter().all(|slot| fits(*slot, bits))
            })
            .expect("single-slot selector always fits");
        let mut payload = 0u64;
        for (j, slot) in slots[i..i + count].iter().enumerate() {
            let mask = (1u64 << bits) - 1;
            let raw = match slot {
                None => mask,
                Some(v) => zigzag_encode(*v),
            };
            payload |= raw << (j as u32 * bits);
        }
        out.extend_from_slice(&((payload << 4) | selector).to_le_bytes());
        i += count;
    }
}

#[inline]
fn fits(slot: Slot, bits: u32) -> bool {
    let mask = (1u64 << bits) - 1;
    match slot {
        None => true,
        Some(v) => zigzag_encode(v) < mask,
    }
}

/// Largest delta magnitude check for the builder: a delta is packable when
/// its zigzag form leaves room for the missing pattern in a full-width slot.
pub fn packable(delta: i64) -> bool {
    fits(Some(delta), 60)
}

/// Slots carried by one block. Only meaningful for blocks produced by
/// [`pack`]; the reserved selector counts as zero.
pub fn slots_in_block(block: u64) -> u64 {
    match block & 0xf {
        SELECTOR_RLE => block >> 4,
        SELECTOR_RESERVED => 0,
        sel => SELECTOR_TABLE[sel as usize - 1].1 as u64,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn unpack(blocks: &[u8], seed: Option<Slot>) -> Vec<Slot> {
        SlotCursor::new(blocks, seed)
            .unwrap()
            .map(|s| s.unwrap())
            .collect()
    }

    #[test]
    fn zigzag() {
        for v in [0i64, 1, -1, 2, -2, i64::MAX, i64::MIN] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
    }

    #[test]
    fn roundtrip_small() {
        let slots: Vec<Slot> = vec![Some(0), Some(1), Some(-1), None, Some(5), Some(-100)];
        let mut blocks = Vec::new();
        pack(Some(0), &slots, &mut blocks);
        assert_eq!(unpack(&blocks, Some(Some(0))), slots);
    }

    #[test]
    fn roundtrip_wide() {
        let slots: Vec<Slot> = vec![
            Some((1i64 << 58) - 1),
            Some(-(1i64 << 58)),
            None,
            Some(1),
            Some(1 << 40),
        ];
        let mut blocks = Vec::new();
        pack(Some(0), &slots, &mut blocks);
        assert_eq!(unpack(&blocks, Some(Some(0))), slots);
    }

    #[test]
    fn rle_run() {
        let mut slots: Vec<Slot> = vec![Some(3)];
        slots.extend(std::iter::repeat(Some(3)).take(100));
        slots.push(Some(4));
        let mut blocks = Vec::new();
        pack(Some(0), &slots, &mut blocks);
        // First slot packs normally, the run of 100 repeats it
        assert!(blocks.len() <= 3 * 8);
        assert_eq!(unpack(&blocks, Some(Some(0))), slots);
    }

    #[test]
    fn rle_of_missing() {
        let slots: Vec<Slot> = std::iter::repeat(None).take(40).collect();
        let mut blocks = Vec::new();
        // The run starts immediately against a missing previous slot
        pack(None, &slots, &mut blocks);
        assert_eq!(blocks.len(), 8);
        assert_eq!(unpack(&blocks, Some(None)), slots);
    }

    #[test]
    fn rle_at_start_repeats_seed() {
        let slots: Vec<Slot> = std::iter::repeat(Some(0)).take(32).collect();
        let mut blocks = Vec::new();
        pack(Some(0), &slots, &mut blocks);
        assert_eq!(blocks.len(), 8);
        assert_eq!(unpack(&blocks, Some(Some(0))), slots);
    }

    #[test]
    fn rle_without_seed_is_corrupt() {
        let block = ((5u64 << 4) | SELECTOR_RLE).to_le_bytes();
        let mut cursor = SlotCursor::new(&block, None).unwrap();
        assert!(cursor.next().unwrap().is_err());
    }

    #[test]
    fn rle_zero_count_is_corrupt() {
        let block = (0u64 | SELECTOR_RLE).to_le_bytes();
        let mut cursor = SlotCursor::new(&block, Some(Some(0))).unwrap();
        assert!(cursor.next().unwrap().is_err());
    }

    #[test]
    fn reserved_selector_is_corrupt() {
        let block = SELECTOR_RESERVED.to_le_bytes();
        let mut cursor = SlotCursor::new(&block, None).unwrap();
        assert!(cursor.next().unwrap().is_err());
    }

    #[test]
    fn ragged_length_is_corrupt() {
        assert!(SlotCursor::new(&[0u8; 7], None).is_err());
    }

    #[test]
    fn last_slot_carries_across_sections() {
        let slots: Vec<Slot> = vec![Some(7), None, Some(2)];
        let mut blocks = Vec::new();
        pack(Some(0), &slots, &mut blocks);
        let mut cursor = SlotCursor::new(&blocks, Some(Some(0))).unwrap();
        for expected in &slots {
            assert_eq!(cursor.next().unwrap().unwrap(), *expected);
        }
        assert!(cursor.next().is_none());
        assert_eq!(cursor.last_slot(), Some(Some(2)));
    }

    #[test]
    fn randomized_roundtrip() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x51077);
        for _ in 0..200 {
            let len = rng.gen_range(0..200);
            let slots: Vec<Slot> = (0..len)
                .map(|_| match rng.gen_range(0..10) {
                    0 => None,
                    1 => Some(0),
                    2 => Some(rng.gen_range(-3..=3)),
                    _ => Some(rng.gen_range(-1_000_000i64..=1_000_000)),
                })
                .collect();
            let mut blocks = Vec::new();
            pack(Some(0), &slots, &mut blocks);
            assert_eq!(unpack(&blocks, Some(Some(0))), slots);
        }
    }
}
