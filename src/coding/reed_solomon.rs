//! Encoding and decoding of the (24, 12, 13) Reed-Solomon code described by P25.
//!
//! The code is a shortened form of the (63, 51) code over GF(2<sup>6</sup>), so a received
//! word is treated as the low-order 24 symbols of a 63-symbol word whose high-order 39
//! symbols are zero. Symbols are hexbits, transmitted first data symbol first, which maps
//! to the highest-degree coefficient.
//!
//! These algorithms are sourced from *Coding Theory and Cryptography: The Essentials*,
//! Hankerson, Hoffman, et al, 2000.

use crate::bit_buffer::BitBuffer;
use crate::coding::bmcf::Errors;
use crate::coding::galois::{Codeword, Polynomial};
use crate::coding::CorrectionResult;

/// Number of hexbit symbols in a codeword.
pub const WORD_SYMBOLS: usize = 24;

/// Number of data hexbits at the start of a codeword.
pub const DATA_SYMBOLS: usize = 12;

/// Number of syndromes: 2t.
const SYNDROMES: usize = 12;

/// Large enough to hold a whole received word.
type RsPolynomial = Polynomial<WORD_SYMBOLS>;

/// Transpose of G_LC.
const GEN: [[u8; 12]; 12] = [
    [0o62, 0o11, 0o03, 0o21, 0o30, 0o01, 0o61, 0o24, 0o72, 0o72, 0o73, 0o71],
    [0o44, 0o12, 0o01, 0o70, 0o22, 0o41, 0o76, 0o22, 0o42, 0o14, 0o65, 0o05],
    [0o03, 0o11, 0o05, 0o27, 0o03, 0o27, 0o21, 0o71, 0o05, 0o65, 0o36, 0o55],
    [0o25, 0o11, 0o75, 0o45, 0o75, 0o56, 0o55, 0o56, 0o20, 0o54, 0o61, 0o03],
    [0o14, 0o16, 0o14, 0o16, 0o15, 0o76, 0o76, 0o21, 0o43, 0o35, 0o42, 0o71],
    [0o16, 0o64, 0o06, 0o67, 0o15, 0o64, 0o01, 0o35, 0o47, 0o25, 0o22, 0o34],
    [0o27, 0o67, 0o20, 0o23, 0o33, 0o21, 0o63, 0o73, 0o33, 0o41, 0o17, 0o60],
    [0o03, 0o55, 0o44, 0o64, 0o15, 0o53, 0o35, 0o42, 0o56, 0o16, 0o04, 0o11],
    [0o53, 0o01, 0o66, 0o73, 0o51, 0o04, 0o30, 0o57, 0o01, 0o15, 0o44, 0o74],
    [0o04, 0o76, 0o06, 0o33, 0o03, 0o25, 0o13, 0o74, 0o16, 0o40, 0o20, 0o02],
    [0o36, 0o26, 0o70, 0o44, 0o53, 0o01, 0o64, 0o43, 0o13, 0o71, 0o25, 0o41],
    [0o47, 0o73, 0o66, 0o21, 0o50, 0o12, 0o70, 0o76, 0o76, 0o26, 0o05, 0o50],
];

/// Calculate the 12 parity hexbits for the given 12 data hexbits and return the full
/// codeword.
pub fn encode(data: &[u8; DATA_SYMBOLS]) -> [u8; WORD_SYMBOLS] {
    let mut word = [0; WORD_SYMBOLS];
    word[..DATA_SYMBOLS].copy_from_slice(&data[..]);

    for (row, parity) in GEN.iter().zip(word[DATA_SYMBOLS..].iter_mut()) {
        *parity = row.iter()
            .zip(data.iter())
            .fold(Codeword::default(), |s, (&col, &d)| {
                s + Codeword::new(d) * Codeword::new(col)
            })
            .bits();
    }

    word
}

/// Try to fix the given 24-hexbit word in place, correcting up to 6 hexbit errors (up to
/// 36 bit errors.)
///
/// If decoding was successful, return `Some(err)`, where `err` is the number of corrected
/// hexbits. Otherwise, return `None` and leave the word untouched.
pub fn decode(word: &mut [u8; WORD_SYMBOLS]) -> Option<usize> {
    let mut poly = RsPolynomial::new(word.iter().rev().map(|&b| Codeword::new(b)));

    let (nerr, errs) = Errors::new(syndromes(&poly), SYNDROMES)?;

    for (loc, pat) in errs {
        // An error located in the zero padding means the word is unrecoverable.
        let coef = poly.get_mut(loc)?;
        *coef = *coef + pat;
    }

    for (dest, coef) in word.iter_mut().rev().zip(poly.iter()) {
        *dest = coef.bits();
    }

    Some(nerr)
}

/// Correct the 24-hexbit (144-bit) codeword starting at the given bit offset.
pub fn correct(buf: &mut BitBuffer, offset: usize) -> CorrectionResult {
    if offset + WORD_SYMBOLS * 6 > buf.len() {
        return CorrectionResult::Failed;
    }

    let mut word = [0; WORD_SYMBOLS];

    for (i, sym) in word.iter_mut().enumerate() {
        *sym = buf.read(offset + i * 6, 6) as u8;
    }

    let orig = word;

    match decode(&mut word) {
        Some(err) => {
            let bits = word.iter().zip(orig.iter())
                .map(|(a, b)| (a ^ b).count_ones() as usize)
                .sum();

            for (i, &sym) in word.iter().enumerate() {
                buf.write(offset + i * 6, 6, sym as u64);
            }

            buf.record_corrections(bits);
            CorrectionResult::from_errors(Some(err))
        },
        None => CorrectionResult::Failed,
    }
}

/// Calculate the syndrome polynomial for the given word.
fn syndromes(word: &RsPolynomial) -> RsPolynomial {
    RsPolynomial::new((1..=SYNDROMES).map(|pow| word.eval(Codeword::for_power(pow))))
}
