//! Encoding and decoding for the several error correction coding schemes used in P25.
//!
//! Each code exposes word-level `encode`/`decode` functions along with a `correct`
//! function that repairs a codeword in place within a `BitBuffer`. Correction is
//! all-or-nothing: a buffer is only modified when the whole word decodes.

mod bmcf;

pub mod bch;
pub mod galois;
pub mod golay;
pub mod hamming;
pub mod reed_solomon;
pub mod trellis;

/// Outcome of an error correction pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CorrectionResult {
    /// No errors were detected.
    Passed,
    /// The given number of bit or symbol errors were corrected.
    Corrected(usize),
    /// Too many errors were detected, and the word was left unmodified.
    Failed,
}

impl CorrectionResult {
    /// Convert a word decoder's `(data, errors)` result.
    pub fn from_errors(errors: Option<usize>) -> CorrectionResult {
        match errors {
            Some(0) => CorrectionResult::Passed,
            Some(n) => CorrectionResult::Corrected(n),
            None => CorrectionResult::Failed,
        }
    }

    /// Check if the word is usable.
    pub fn is_ok(&self) -> bool { *self != CorrectionResult::Failed }

    /// Number of corrected errors.
    pub fn errors(&self) -> usize {
        match *self {
            CorrectionResult::Corrected(n) => n,
            _ => 0,
        }
    }

    /// Combine the results of correcting multiple words of the same frame.
    pub fn and(self, other: CorrectionResult) -> CorrectionResult {
        use self::CorrectionResult::*;

        match (self, other) {
            (Failed, _) | (_, Failed) => Failed,
            (Passed, Passed) => Passed,
            (a, b) => Corrected(a.errors() + b.errors()),
        }
    }
}
