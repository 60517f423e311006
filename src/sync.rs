//! Frame synchronization patterns and the sliding correlator that finds them.
//!
//! Incoming bits are shifted through a 64-bit register and compared against each
//! pattern under its mask. A window within the configured number of bit errors of a
//! pattern is reported as a match.

use crate::bit_buffer::BitBuffer;
use crate::error::{P25Error, Result};

/// Largest pattern that fits in the rolling register with room to shift.
pub const MAX_PATTERN_BITS: usize = 63;

/// Largest supported bit-error tolerance.
pub const MAX_TOLERANCE: usize = 8;

/// P25 Phase 1 frame sync, 24 dibits.
pub const P25_SYNC: u64 = 0x5575_F5FF_77FF;

/// Number of bits in the P25 frame sync.
pub const P25_SYNC_BITS: usize = 48;

/// Named, fixed-length sequence of bits marking a frame boundary.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SyncPattern {
    name: &'static str,
    bits: u64,
    len: usize,
    mask: u64,
}

impl SyncPattern {
    /// Create a pattern from the `len` LSBs of `bits`, first bit in the MSB.
    pub fn new(name: &'static str, bits: u64, len: usize) -> Result<SyncPattern> {
        if len == 0 || len > MAX_PATTERN_BITS {
            return Err(P25Error::SyncPatternTooLong(len));
        }

        let mask = (1 << len) - 1;

        Ok(SyncPattern { name, bits: bits & mask, len, mask })
    }

    /// Create a pattern from a sequence of `width`-bit symbols, first symbol first.
    pub fn from_symbols(name: &'static str, symbols: &[u8], width: usize)
        -> Result<SyncPattern>
    {
        let len = symbols.len() * width;

        if len > MAX_PATTERN_BITS {
            return Err(P25Error::SyncPatternTooLong(len));
        }

        let mask = (1u64 << width) - 1;
        let bits = symbols.iter().fold(0, |word, &s| word << width | s as u64 & mask);

        SyncPattern::new(name, bits, len)
    }

    /// The standard P25 Phase 1 frame sync.
    pub fn p25() -> SyncPattern {
        SyncPattern {
            name: "P25 Phase 1",
            bits: P25_SYNC,
            len: P25_SYNC_BITS,
            mask: (1 << P25_SYNC_BITS) - 1,
        }
    }

    pub fn name(&self) -> &'static str { self.name }

    /// Pattern bits, first bit in the MSB of the `len` LSBs.
    pub fn bits(&self) -> u64 { self.bits }

    /// Number of bits in the pattern.
    pub fn len(&self) -> usize { self.len }

    /// Check if the pattern has no bits, which construction never allows.
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Number of bits that differ between the pattern and the newest bits of the given
    /// register.
    pub fn distance(&self, reg: u64) -> u32 {
        ((reg ^ self.bits) & self.mask).count_ones()
    }

    /// Pattern bits as a buffer, used to seed a frame.
    pub fn to_buffer(&self) -> BitBuffer {
        let mut buf = BitBuffer::new(self.len);
        buf.write(0, self.len, self.bits);
        buf
    }
}

/// A sync pattern found in the bit stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SyncMatch {
    /// Index of the matching pattern.
    pub pattern: usize,
    /// Number of bits that differed from the pattern.
    pub errors: u32,
}

/// Correlates a bit stream against one or more sync patterns.
#[derive(Clone, Debug)]
pub struct SyncCorrelator {
    patterns: Vec<SyncPattern>,
    /// Most recent bits, newest in the LSB.
    reg: u64,
    /// Number of bits seen, saturating at the register width.
    seen: usize,
    tolerance: u32,
}

impl SyncCorrelator {
    /// Create a new `SyncCorrelator` matching any of the given patterns with up to
    /// `tolerance` bit errors.
    pub fn new(patterns: Vec<SyncPattern>, tolerance: usize) -> Result<SyncCorrelator> {
        if tolerance > MAX_TOLERANCE {
            return Err(P25Error::InvalidTolerance(tolerance));
        }

        Ok(SyncCorrelator {
            patterns,
            reg: 0,
            seen: 0,
            tolerance: tolerance as u32,
        })
    }

    pub fn patterns(&self) -> &[SyncPattern] { &self.patterns }

    pub fn tolerance(&self) -> usize { self.tolerance as usize }

    /// Shift in the given bit and return the closest pattern matching the newest bits,
    /// if any.
    pub fn feed(&mut self, bit: bool) -> Option<SyncMatch> {
        self.reg = self.reg << 1 | bit as u64;
        self.seen = (self.seen + 1).min(64);

        self.patterns.iter().enumerate()
            .filter(|&(_, p)| self.seen >= p.len())
            .map(|(i, p)| SyncMatch { pattern: i, errors: p.distance(self.reg) })
            .filter(|m| m.errors <= self.tolerance)
            .min_by_key(|m| m.errors)
    }

    /// Forget all previous bits.
    pub fn reset(&mut self) {
        self.reg = 0;
        self.seen = 0;
    }
}
