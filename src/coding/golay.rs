//! Encoding and decoding of the (24, 12, 8) extended and (18, 6, 8) shortened Golay codes
//! described by P25.
//!
//! The extended code appends an overall parity bit to the perfect (23, 12, 7) code, so a
//! syndrome table covering every error pattern of weight ≤ 3 decodes the 23-bit part and
//! the parity bit then detects (without correcting) any 4-bit error.

use crate::bit_buffer::BitBuffer;
use crate::coding::CorrectionResult;

/// Generator polynomial g(x) = x<sup>11</sup> + x<sup>10</sup> + x<sup>6</sup> +
/// x<sup>5</sup> + x<sup>4</sup> + x<sup>2</sup> + 1.
const GEN: u32 = 0xC75;

/// Maps each 11-bit syndrome of the (23, 12, 7) code to its error pattern.
static PATTERNS: [u32; 2048] = build_patterns();

/// Compute the remainder of the given 23-bit word divided by g(x).
const fn syndrome(word: u32) -> u32 {
    let mut w = word;
    let mut i: u32 = 22;

    while i >= 11 {
        if w >> i & 1 == 1 {
            w ^= GEN << (i - 11);
        }

        i -= 1;
    }

    w
}

const fn build_patterns() -> [u32; 2048] {
    let mut table = [0; 2048];
    let mut a = 0;

    while a < 23 {
        table[syndrome(1 << a) as usize] = 1 << a;

        let mut b = 0;

        while b < a {
            table[syndrome(1 << a | 1 << b) as usize] = 1 << a | 1 << b;

            let mut c = 0;

            while c < b {
                let e = 1 << a | 1 << b | 1 << c;
                table[syndrome(e) as usize] = e;
                c += 1;
            }

            b += 1;
        }

        a += 1;
    }

    table
}

/// Encoding and decoding of the (24, 12, 8) code.
pub mod extended {
    use super::*;

    /// Number of bits in a codeword.
    pub const WORD_BITS: usize = 24;

    /// Encode the given 12 data bits into a 24-bit codeword.
    pub fn encode(data: u16) -> u32 {
        assert!(data >> 12 == 0);

        let word = (data as u32) << 11;
        let word = word | syndrome(word);

        word << 1 | word.count_ones() & 1
    }

    /// Try to decode the given 24-bit word to the nearest codeword, correcting up to 3
    /// errors.
    ///
    /// If decoding was successful, return `Some((data, err))`, where `data` is the 12
    /// data bits and `err` is the number of corrected bits. Otherwise, return `None` to
    /// indicate an unrecoverable error.
    pub fn decode(word: u32) -> Option<(u16, usize)> {
        assert!(word >> 24 == 0);

        let pattern = PATTERNS[syndrome(word >> 1) as usize];
        let fixed = (word >> 1) ^ pattern;
        let err = pattern.count_ones() as usize;

        // The parity bit makes every codeword even weight.
        let parity_err = ((fixed.count_ones() ^ word) & 1) as usize;

        match err + parity_err {
            n if n <= 3 => Some(((fixed >> 11) as u16, n)),
            _ => None,
        }
    }

    /// Correct the 24-bit codeword starting at the given bit offset.
    pub fn correct(buf: &mut BitBuffer, offset: usize) -> CorrectionResult {
        if offset + WORD_BITS > buf.len() {
            return CorrectionResult::Failed;
        }

        let word = buf.read(offset, WORD_BITS) as u32;

        match decode(word) {
            Some((data, err)) => {
                buf.write(offset, WORD_BITS, encode(data) as u64);
                buf.record_corrections(err);
                CorrectionResult::from_errors(Some(err))
            },
            None => CorrectionResult::Failed,
        }
    }
}

/// Encoding and decoding of the (18, 6, 8) code.
///
/// The shortened code is the extended code with its 6 leading data bits fixed at zero,
/// so words are decoded by zero-padding them to 24 bits.
pub mod shortened {
    use super::*;

    /// Number of bits in a codeword.
    pub const WORD_BITS: usize = 18;

    /// Encode the given 6 data bits to an 18-bit codeword.
    pub fn encode(data: u8) -> u32 {
        assert_eq!(data >> 6, 0);
        extended::encode(data as u16)
    }

    /// Try to decode the given 18-bit word to the nearest codeword, correcting up to 3
    /// errors.
    ///
    /// A correction that would land in the zero padding means the word was
    /// unrecoverable.
    pub fn decode(word: u32) -> Option<(u8, usize)> {
        assert_eq!(word >> 18, 0);

        extended::decode(word).and_then(|(data, err)| if data >> 6 == 0 {
            Some((data as u8, err))
        } else {
            None
        })
    }

    /// Correct the 18-bit codeword starting at the given bit offset.
    pub fn correct(buf: &mut BitBuffer, offset: usize) -> CorrectionResult {
        if offset + WORD_BITS > buf.len() {
            return CorrectionResult::Failed;
        }

        let word = buf.read(offset, WORD_BITS) as u32;

        match decode(word) {
            Some((data, err)) => {
                buf.write(offset, WORD_BITS, encode(data) as u64);
                buf.record_corrections(err);
                CorrectionResult::from_errors(Some(err))
            },
            None => CorrectionResult::Failed,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_patterns() {
        // The (23, 12, 7) code is perfect, so every syndrome has a pattern.
        assert_eq!(PATTERNS[0], 0);
        assert!(PATTERNS[1..].iter().all(|&p| p != 0 && p.count_ones() <= 3));
    }

    #[test]
    fn test_extended() {
        assert_eq!(extended::encode(0), 0);
        assert_eq!(extended::encode(0xABC), 0xABC23C);
        assert_eq!(extended::encode(0xFFF), 0xFFFFFF);
        assert_eq!(extended::encode(0x800), 0x800C75);

        let w = 0xABC;
        let e = extended::encode(w);

        assert_eq!(extended::decode(e), Some((w, 0)));

        for i in 0..24 {
            assert_eq!(extended::decode(e ^ 1 << i), Some((w, 1)));

            for j in 0..i {
                assert_eq!(extended::decode(e ^ 1 << i ^ 1 << j), Some((w, 2)));
            }
        }

        assert_eq!(extended::decode(e ^ 0b111 << 9), Some((w, 3)));
        assert_eq!(extended::decode(e ^ 0b100000000001000000000001), Some((w, 3)));
        assert_eq!(extended::decode(e ^ 0b1111 << 3), None);
        assert_eq!(extended::decode(e ^ 0b100000010000000000100001), None);
        assert_eq!(extended::decode(e ^ 0b1111), None);
    }

    #[test]
    fn test_shortened() {
        assert_eq!(shortened::encode(0), 0);
        assert_eq!(shortened::encode(0b111111), 0b111111_001100101110);

        let w = 0b101010;
        let e = shortened::encode(w);
        assert_eq!(e, 0b101010_001000110101);

        assert_eq!(shortened::decode(e^0b100000000000000001), Some((w, 2)));
        assert_eq!(shortened::decode(e^0b000000001100000000), Some((w, 2)));
        assert_eq!(shortened::decode(e^0b000100000000000001), Some((w, 2)));
        assert_eq!(shortened::decode(e^0b111000000000000000), Some((w, 3)));
        assert_eq!(shortened::decode(e^0b000000000111000000), Some((w, 3)));
        assert_eq!(shortened::decode(e^0b001100000000000010), Some((w, 3)));
        assert_eq!(shortened::decode(e^0b000000000000000001), Some((w, 1)));
        assert_eq!(shortened::decode(e^0b000000000000000000), Some((w, 0)));
    }

    #[test]
    fn test_extended_weights() {
        let w = 0x3C9;
        let e = extended::encode(w);

        for a in 0..24 {
            for b in 0..a {
                for c in 0..b {
                    let err = 1 << a | 1 << b | 1 << c;
                    assert_eq!(extended::decode(e ^ err), Some((w, 3)));

                    for d in 0..c {
                        assert_eq!(extended::decode(e ^ err ^ 1 << d), None);
                    }
                }
            }
        }
    }

    #[test]
    fn test_shortened_embedding() {
        let codewords: Vec<u32> = (0..64).map(shortened::encode).collect();

        for word in 0..1 << 18 {
            // Decoding an 18-bit word matches decoding its zero-padded 24-bit form.
            let ext = extended::decode(word)
                .and_then(|(d, n)| if d >> 6 == 0 { Some((d as u8, n)) } else { None });

            // And both find the unique shortened codeword within distance 3, if any.
            let nearest = codewords.iter().enumerate()
                .map(|(d, &c)| (d as u8, (c ^ word).count_ones() as usize))
                .find(|&(_, n)| n <= 3);

            assert_eq!(shortened::decode(word), ext);
            assert_eq!(shortened::decode(word), nearest);
        }
    }

    #[test]
    fn test_correct() {
        let e = extended::encode(0x5A5);

        let mut buf = BitBuffer::new(30);
        buf.write(2, 24, (e ^ 0b100100) as u64);

        assert_eq!(extended::correct(&mut buf, 2), CorrectionResult::Corrected(2));
        assert_eq!(buf.read(2, 24), e as u64);

        buf.write(2, 24, (e ^ 0b1111) as u64);
        assert_eq!(extended::correct(&mut buf, 2), CorrectionResult::Failed);
        assert_eq!(buf.read(2, 24), (e ^ 0b1111) as u64);
        assert_eq!(buf.corrected_bit_count(), 2);

        // Codewords running off the end of the buffer are left alone.
        buf.write(2, 24, (e ^ 0b1) as u64);
        assert_eq!(extended::correct(&mut buf, 7), CorrectionResult::Failed);
        assert_eq!(shortened::correct(&mut buf, 13), CorrectionResult::Failed);
        assert_eq!(buf.read(2, 24), (e ^ 0b1) as u64);
        assert_eq!(buf.corrected_bit_count(), 2);
    }
}
