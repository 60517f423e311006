//! Encoding and decoding of the (15, 11, 3) Hamming code described by P25.
//!
//! The code is perfect: every nonzero syndrome maps to a single-bit error. It corrects 1
//! error per word, and any 2-bit error aliases onto a single-bit syndrome and is
//! "corrected" to the wrong codeword. That is a property of the code, so callers must
//! rely on an outer CRC to catch such words.

use binfield_matrix::{matrix_mul, matrix_mul_systematic};

use crate::bit_buffer::BitBuffer;
use crate::coding::CorrectionResult;

/// Number of bits in a codeword.
pub const WORD_BITS: usize = 15;

/// Encode the given 11 bits of data into a 15-bit codeword.
pub fn encode(data: u16) -> u16 {
    assert!(data >> 11 == 0);
    matrix_mul_systematic(data, GEN)
}

/// Try to decode the given 15-bit word to the nearest codeword, correcting up to 1
/// error.
///
/// If decoding was successful, return `Some((data, err))`, where `data` is the 11 data
/// bits and `err` is the number of corrected bits.
pub fn decode(word: u16) -> Option<(u16, usize)> {
    assert!(word >> 15 == 0);

    let s: usize = matrix_mul(word, PAR);

    match LOCATIONS.get(s) {
        Some(&0) => Some((word >> 4, 0)),
        Some(&loc) => Some(((word ^ loc) >> 4, 1)),
        None => None,
    }
}

/// Correct the 15-bit codeword starting at the given bit offset.
pub fn correct(buf: &mut BitBuffer, offset: usize) -> CorrectionResult {
    if offset + WORD_BITS > buf.len() {
        return CorrectionResult::Failed;
    }

    let word = buf.read(offset, WORD_BITS) as u16;

    match decode(word) {
        Some((data, err)) => {
            buf.write(offset, WORD_BITS, encode(data) as u64);
            buf.record_corrections(err);
            CorrectionResult::from_errors(Some(err))
        },
        None => CorrectionResult::Failed,
    }
}

/// Generator matrix from the standard, without identity part.
const GEN: &[u16] = &[
    0b11111110000,
    0b11110001110,
    0b11001101101,
    0b10101011011,
];

/// Parity-check matrix derived from generator using standard method.
const PAR: &[u16] = &[
    0b111111100001000,
    0b111100011100100,
    0b110011011010010,
    0b101010110110001,
];

/// Maps 4-bit syndrome values to bit error locations.
const LOCATIONS: &[u16] = &[
    0,
    0b0000000000000001,
    0b0000000000000010,
    0b0000000000010000,
    0b0000000000000100,
    0b0000000000100000,
    0b0000000001000000,
    0b0000000010000000,
    0b0000000000001000,
    0b0000000100000000,
    0b0000001000000000,
    0b0000010000000000,
    0b0000100000000000,
    0b0001000000000000,
    0b0010000000000000,
    0b0100000000000000,
];
