//! Encoding and decoding of the (63, 16, 23) BCH code described by P25.
//!
//! The code protects the 16-bit network ID and corrects up to 11 bit errors. P25 appends
//! an extra parity bit to make a 64-bit word, which decoding ignores.
//!
//! These algorithms are derived from *Coding Theory and Cryptography: The Essentials*,
//! Hankerson, Hoffman, et al, 2000.

use binfield_matrix::matrix_mul_systematic;

use crate::bit_buffer::BitBuffer;
use crate::coding::bmcf::Errors;
use crate::coding::galois::{Codeword, Polynomial, FIELD_SIZE};
use crate::coding::CorrectionResult;

/// Number of bits in a codeword, including the trailing parity bit.
pub const WORD_BITS: usize = 64;

/// Number of data bits at the start of the codeword.
pub const DATA_BITS: usize = 16;

/// Number of syndromes: 2t.
const SYNDROMES: usize = 22;

/// Polynomial large enough for the Berlekamp-Massey state, 2t+2 terms.
type BchPolynomial = Polynomial<24>;

/// Encode the given 16 data bits into a 64-bit codeword.
pub fn encode(word: u16) -> u64 {
    matrix_mul_systematic(word, GEN)
}

/// Try to decode the given 64-bit word to the nearest codeword, correcting up to 11
/// bit errors.
///
/// If decoding was successful, return `Some((data, err))`, where `data` is the 16 data
/// bits and `err` is the number of bits corrected. Otherwise, return `None` to indicate
/// an unrecoverable error.
pub fn decode(bits: u64) -> Option<(u16, usize)> {
    // The BCH code is only over the first 63 bits, so strip off the P25 parity bit.
    let word = bits >> 1;

    let (nerr, errs) = Errors::new(syndromes(word), SYNDROMES)?;
    let mut fixed = word;

    for (loc, pat) in errs {
        // Binary code, so every error pattern must be a single bit.
        if pat.power() != Some(0) {
            return None;
        }

        fixed ^= 1 << loc;
    }

    // Strip off the parity bits.
    Some(((fixed >> 47) as u16, nerr))
}

/// Correct the 64-bit codeword starting at the given bit offset.
///
/// Only the 16 data bits are rewritten, even when errors were located in the parity
/// bits, and only the data bits that changed count toward the buffer's corrections. A
/// codeword running past the end of the buffer fails without modifying it.
pub fn correct(buf: &mut BitBuffer, offset: usize) -> CorrectionResult {
    if offset + WORD_BITS > buf.len() {
        return CorrectionResult::Failed;
    }

    match decode(buf.read(offset, WORD_BITS)) {
        Some((data, err)) => {
            let prev = buf.read(offset, DATA_BITS) as u16;

            buf.write(offset, DATA_BITS, data as u64);
            buf.record_corrections((prev ^ data).count_ones() as usize);

            CorrectionResult::from_errors(Some(err))
        },
        None => CorrectionResult::Failed,
    }
}

/// Generator matrix from P25, transformed for more efficient codeword generation.
const GEN: &[u16] = &[
    0b1110110001000111,
    0b1001101001100100,
    0b0100110100110010,
    0b0010011010011001,
    0b1111111100001011,
    0b1001001111000010,
    0b0100100111100001,
    0b1100100010110111,
    0b1000100000011100,
    0b0100010000001110,
    0b0010001000000111,
    0b1111110101000100,
    0b0111111010100010,
    0b0011111101010001,
    0b1111001111101111,
    0b1001010110110000,
    0b0100101011011000,
    0b0010010101101100,
    0b0001001010110110,
    0b0000100101011011,
    0b1110100011101010,
    0b0111010001110101,
    0b1101011001111101,
    0b1000011101111001,
    0b1010111111111011,
    0b1011101110111010,
    0b0101110111011101,
    0b1100001010101001,
    0b1000110100010011,
    0b1010101011001110,
    0b0101010101100111,
    0b1100011011110100,
    0b0110001101111010,
    0b0011000110111101,
    0b1111010010011001,
    0b1001011000001011,
    0b1010011101000010,
    0b0101001110100001,
    0b1100010110010111,
    0b1000111010001100,
    0b0100011101000110,
    0b0010001110100011,
    0b1111110110010110,
    0b0111111011001011,
    0b1101001100100010,
    0b0110100110010001,
    0b1101100010001111,
    0b0000000000000011,
];

/// Generate the syndrome polynomial s(x) = s<sub>1</sub> + s<sub>2</sub>x + ··· +
/// s<sub>2t</sub>x<sup>2t-1</sup> from the given received word r(x), where s<sub>i</sub> =
/// r(α<sup>i</sup>).
fn syndromes(word: u64) -> BchPolynomial {
    BchPolynomial::new((1..=SYNDROMES).map(|p| {
        // The LSB of `word` maps to the coefficient of the degree-0 term.
        (0..FIELD_SIZE)
            .filter(|b| word >> b & 1 == 1)
            .fold(Codeword::default(), |s, b| s + Codeword::for_power(b * p))
    }))
}
