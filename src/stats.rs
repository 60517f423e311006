//! Counters describing how much work error correction is doing on a channel.

use std::ops::AddAssign;

use crate::coding::CorrectionResult;

/// Counters for a single error correction code.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CodeStats {
    /// Bits (or symbols) in one codeword.
    symbols: usize,
    words: usize,
    /// Total bits (or symbols) repaired across all words.
    corrected: usize,
    /// Words that couldn't be repaired.
    failed: usize,
}

impl CodeStats {
    fn new(symbols: usize) -> CodeStats {
        CodeStats { symbols, words: 0, corrected: 0, failed: 0 }
    }

    /// Count one decoded word by its correction outcome.
    pub fn record(&mut self, res: CorrectionResult) {
        self.words += 1;

        match res {
            CorrectionResult::Failed => self.failed += 1,
            res => {
                debug_assert!(res.errors() <= self.symbols);
                self.corrected += res.errors();
            },
        }
    }

    pub fn symbols(&self) -> usize { self.symbols }
    pub fn words(&self) -> usize { self.words }
    pub fn corrected(&self) -> usize { self.corrected }
    pub fn failed(&self) -> usize { self.failed }

    /// Fraction of words that couldn't be repaired, or 0 if none were seen.
    pub fn failure_rate(&self) -> f32 {
        if self.words == 0 {
            0.0
        } else {
            self.failed as f32 / self.words as f32
        }
    }
}

impl AddAssign for CodeStats {
    fn add_assign(&mut self, rhs: CodeStats) {
        debug_assert_eq!(self.symbols, rhs.symbols);

        self.words += rhs.words;
        self.corrected += rhs.corrected;
        self.failed += rhs.failed;
    }
}

/// Error correction and framing counters for one decoder.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Stats {
    /// NID words.
    pub bch: CodeStats,
    /// Link control Golay words.
    pub golay: CodeStats,
    /// Link control Reed-Solomon words.
    pub rs: CodeStats,
    /// Half-rate trellis blocks: TSBKs, packet headers, and unconfirmed data.
    pub trellis_half: CodeStats,
    /// Three-quarter-rate trellis blocks: confirmed data.
    pub trellis_three_quarter: CodeStats,
    /// Frames handed to the parser.
    pub frames: usize,
    /// Blocks whose CRC didn't match.
    pub crc_failed: usize,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            bch: CodeStats::new(64),
            golay: CodeStats::new(24),
            rs: CodeStats::new(24),
            trellis_half: CodeStats::new(196),
            trellis_three_quarter: CodeStats::new(196),
            frames: 0,
            crc_failed: 0,
        }
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        self.bch += rhs.bch;
        self.golay += rhs.golay;
        self.rs += rhs.rs;
        self.trellis_half += rhs.trellis_half;
        self.trellis_three_quarter += rhs.trellis_three_quarter;
        self.frames += rhs.frames;
        self.crc_failed += rhs.crc_failed;
    }
}

impl Stats {
    /// Move the counters collected by `other` into these, leaving `other` zeroed.
    pub fn merge<T: HasStats>(&mut self, other: &mut T) {
        *self += std::mem::take(other.stats());
    }

    pub fn clear(&mut self) {
        *self = Stats::default();
    }

    pub fn record_crc(&mut self, ok: bool) {
        self.crc_failed += !ok as usize;
    }
}

/// Implemented by stages that count their own error correction work.
pub trait HasStats {
    fn stats(&mut self) -> &mut Stats;
}
