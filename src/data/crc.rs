//! Implements the 9, 16, and 32-bit CRCs defined by P25 for header, block, and packet
//! checksums.
//!
//! This implementation uses the typical long division and takes advantage of the short
//! lengths to use only a 64-bit word as a buffer, allowing simple bitwise operations.

use crate::bit_buffer::BitBuffer;

/// Parameters of a CRC.
#[derive(Copy, Clone, Debug)]
pub struct CrcParams {
    /// Generator polynomial, with the MSB being the coefficient of highest degree.
    pub gen: u64,
    /// Inversion polynomial XORed into the final remainder.
    pub inv: u64,
    /// Amount to left-shift the message (multiply by x^i) before division.
    pub shift: usize,
}

/// 9-bit CRC over confirmed data blocks.
pub const CRC9: CrcParams = CrcParams {
    gen: 0b1001011001,
    inv: 0b111111111,
    shift: 9,
};

/// 16-bit CRC-CCITT over headers and trunking blocks.
pub const CRC16: CrcParams = CrcParams {
    gen: 0b10001000000100001,
    inv: 0b1111111111111111,
    shift: 16,
};

/// 32-bit CRC over the user data of a packet.
pub const CRC32: CrcParams = CrcParams {
    gen: 0b100000100110000010001110110110111,
    inv: 0b11111111111111111111111111111111,
    shift: 32,
};

/// CRC calculator using long division.
pub struct Crc {
    params: CrcParams,
    /// Current remainder.
    word: u64,
}

impl Crc {
    /// Construct a new `Crc` with empty output.
    pub fn new(params: CrcParams) -> Crc {
        // Generator must leave room to shift in up to a byte at a time.
        debug_assert!(params.gen != 0 && degree(params.gen) < 64 - 8);

        Crc { params, word: 0 }
    }

    /// Feed in `num` LSBs of the given value.
    pub fn feed_bits(&mut self, bits: u8, num: usize) -> &mut Self {
        assert!(num <= 8);
        // Verify there are no stray MSBs.
        assert!((bits as u16) >> num == 0);

        self.word <<= num;
        self.word |= bits as u64;

        self.div();
        self
    }

    /// Feed in the given byte stream.
    pub fn feed_bytes<T: IntoIterator<Item = u8>>(&mut self, bytes: T) -> &mut Self {
        for byte in bytes {
            self.feed_bits(byte, 8);
        }

        self
    }

    /// Feed in `len` bits of the given buffer starting at `start`.
    pub fn feed_buffer(&mut self, buf: &BitBuffer, start: usize, len: usize) -> &mut Self {
        for i in 0..len {
            self.feed_bits(buf.get(start + i) as u8, 1);
        }

        self
    }

    /// Finish the CRC calculation and return the resulting CRC.
    pub fn finish(&mut self) -> u64 {
        for _ in 0..self.params.shift {
            self.word <<= 1;
            self.div();
        }

        self.word ^ self.params.inv
    }

    /// Reduce the current word by dividing by the generator.
    fn div(&mut self) {
        let gen = degree(self.params.gen);

        while self.word != 0 && degree(self.word) >= gen {
            // Bring the generator up to the same degree and knock off the word's MSB.
            self.word ^= self.params.gen << (degree(self.word) - gen);
        }
    }
}

/// Check the CRC stored at `crc_start` against the one computed over `len` bits of
/// the buffer starting at `start`.
pub fn check(params: CrcParams, buf: &BitBuffer, start: usize, len: usize,
             crc_start: usize) -> bool
{
    let width = degree(params.gen) as usize;
    Crc::new(params).feed_buffer(buf, start, len).finish() == buf.read(crc_start, width)
}

// Calculate the degree of the polynomial represented by x, where x > 0.
fn degree(x: u64) -> u32 {
    64 - 1 - x.leading_zeros()
}
