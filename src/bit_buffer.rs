//! Fixed-size, bit-addressable buffers and the field specs used to read them.

use std::fmt;

/// Describes the bits of one logical field within a buffer, MSB first.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldSpec {
    /// Contiguous bits starting at the given index.
    Range {
        /// Index of the field's MSB.
        start: usize,
        /// Number of bits.
        len: usize,
    },
    /// Arbitrary, possibly non-contiguous, bit indices.
    Indices(&'static [usize]),
}

impl FieldSpec {
    /// Create a contiguous field of `len` bits starting at `start`.
    pub const fn range(start: usize, len: usize) -> FieldSpec {
        FieldSpec::Range { start, len }
    }

    /// Create a contiguous field covering `first` through `last`, inclusive.
    pub const fn span(first: usize, last: usize) -> FieldSpec {
        FieldSpec::Range { start: first, len: last - first + 1 }
    }

    /// Create a field from a static list of bit indices.
    pub const fn indices(idx: &'static [usize]) -> FieldSpec {
        FieldSpec::Indices(idx)
    }

    /// Number of bits in the field.
    pub fn len(&self) -> usize {
        match *self {
            FieldSpec::Range { len, .. } => len,
            FieldSpec::Indices(idx) => idx.len(),
        }
    }

    /// Check if the field covers no bits.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Iterate over the bit indices of the field, MSB first.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let (range, idx) = match *self {
            FieldSpec::Range { start, len } => (start..start + len, &[][..]),
            FieldSpec::Indices(idx) => (0..0, idx),
        };

        range.chain(idx.iter().cloned())
    }

    /// Index one past the highest bit touched by the field.
    pub fn end(&self) -> usize {
        self.iter().max().map_or(0, |i| i + 1)
    }
}

/// An owned, fixed-size sequence of bits.
///
/// Bit 0 is the first bit received. The number of bits corrected by FEC stages is
/// tracked alongside the bits and only ever grows.
#[derive(Clone, PartialEq, Eq)]
pub struct BitBuffer {
    words: Vec<u64>,
    len: usize,
    corrected: usize,
}

impl BitBuffer {
    /// Create a buffer of `len` zero bits.
    pub fn new(len: usize) -> BitBuffer {
        BitBuffer {
            words: vec![0; (len + 63) / 64],
            len,
            corrected: 0,
        }
    }

    /// Create a buffer holding the bits of the given bytes, MSB first.
    pub fn from_bytes(bytes: &[u8]) -> BitBuffer {
        let mut buf = BitBuffer::new(bytes.len() * 8);

        for (i, &b) in bytes.iter().enumerate() {
            buf.write(i * 8, 8, b as u64);
        }

        buf
    }

    /// Create a buffer from the given bits.
    pub fn from_bits(bits: &[bool]) -> BitBuffer {
        let mut buf = BitBuffer::new(bits.len());

        for (i, &b) in bits.iter().enumerate() {
            buf.set(i, b);
        }

        buf
    }

    /// Create a buffer from a string of `0` and `1` characters. Any other characters,
    /// such as separating whitespace or underscores, are skipped.
    pub fn from_bitstr(s: &str) -> BitBuffer {
        let bits = s.chars()
            .filter_map(|c| match c {
                '0' => Some(false),
                '1' => Some(true),
                _ => None,
            })
            .collect::<Vec<_>>();

        BitBuffer::from_bits(&bits)
    }

    /// Number of bits in the buffer.
    pub fn len(&self) -> usize { self.len }

    /// Check if the buffer has no bits.
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Number of bits flipped by error correction.
    pub fn corrected_bit_count(&self) -> usize { self.corrected }

    /// Record that error correction flipped `n` more bits.
    pub fn record_corrections(&mut self, n: usize) {
        self.corrected = self.corrected.saturating_add(n);
    }

    /// Get the bit at the given index. Out of range bits read as zero.
    pub fn get(&self, idx: usize) -> bool {
        if idx >= self.len {
            return false;
        }

        self.words[idx / 64] >> (63 - idx % 64) & 1 == 1
    }

    /// Set the bit at the given index.
    pub fn set(&mut self, idx: usize, val: bool) {
        assert!(idx < self.len);

        let mask = 1 << (63 - idx % 64);

        if val {
            self.words[idx / 64] |= mask;
        } else {
            self.words[idx / 64] &= !mask;
        }
    }

    /// Invert the bit at the given index.
    pub fn flip(&mut self, idx: usize) {
        assert!(idx < self.len);
        self.words[idx / 64] ^= 1 << (63 - idx % 64);
    }

    /// Read `len` bits starting at `start` into the LSBs of a word, MSB first. Bits
    /// past the end of the buffer read as zero.
    pub fn read(&self, start: usize, len: usize) -> u64 {
        assert!(len <= 64);

        (start..start + len).fold(0, |word, i| word << 1 | self.get(i) as u64)
    }

    /// Write the `len` LSBs of `val` starting at `start`, MSB first.
    pub fn write(&mut self, start: usize, len: usize, val: u64) {
        assert!(len <= 64);
        assert!(start + len <= self.len);

        for i in 0..len {
            self.set(start + i, val >> (len - 1 - i) & 1 == 1);
        }
    }

    /// Extract the value of the given field, MSB first.
    pub fn int(&self, field: &FieldSpec) -> u64 {
        debug_assert!(field.len() <= 64);

        field.iter().fold(0, |word, i| word << 1 | self.get(i) as u64)
    }

    /// Extract the value of the given field as a zero-padded, uppercase hex string.
    pub fn hex(&self, field: &FieldSpec) -> String {
        let digits = (field.len() + 3) / 4;
        format!("{:01$X}", self.int(field), digits)
    }

    /// Copy out `len` bits starting at `start`.
    pub fn slice(&self, start: usize, len: usize) -> BitBuffer {
        let mut buf = BitBuffer::new(len);

        for i in 0..len {
            buf.set(i, self.get(start + i));
        }

        buf
    }

    /// Pack the buffer into bytes, MSB first, padding the last byte with zeros.
    pub fn to_bytes(&self) -> Vec<u8> {
        (0..(self.len + 7) / 8).map(|i| self.read(i * 8, 8) as u8).collect()
    }

    /// Iterate over the bits in the buffer.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

impl fmt::Display for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }

        Ok(())
    }
}

impl fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BitBuffer({} bits, {} corrected: {})", self.len, self.corrected, self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut b = BitBuffer::new(130);

        assert_eq!(b.len(), 130);
        assert!(!b.get(0));
        assert!(!b.get(200));

        b.set(0, true);
        b.set(63, true);
        b.set(64, true);
        b.set(129, true);

        assert!(b.get(0));
        assert!(b.get(63));
        assert!(b.get(64));
        assert!(b.get(129));
        assert!(!b.get(1));

        b.flip(63);
        assert!(!b.get(63));
        b.set(0, false);
        assert!(!b.get(0));
    }

    #[test]
    fn test_read_write() {
        let mut b = BitBuffer::new(100);

        b.write(60, 12, 0xABC);
        assert_eq!(b.read(60, 12), 0xABC);
        assert_eq!(b.read(60, 4), 0xA);
        assert_eq!(b.read(68, 4), 0xC);
        assert_eq!(b.read(0, 60), 0);

        // Reads past the end are zero-filled.
        b.write(96, 4, 0xF);
        assert_eq!(b.read(96, 8), 0xF0);
    }

    #[test]
    fn test_bytes() {
        let b = BitBuffer::from_bytes(&[0x12, 0x34, 0x56]);

        assert_eq!(b.len(), 24);
        assert_eq!(b.read(0, 24), 0x123456);
        assert_eq!(b.to_bytes(), vec![0x12, 0x34, 0x56]);

        let s = b.slice(4, 9);
        assert_eq!(s.len(), 9);
        assert_eq!(s.read(0, 9), 0b0010_0011_0);
        assert_eq!(s.to_bytes(), vec![0b00100011, 0]);
    }

    #[test]
    fn test_bitstr() {
        let b = BitBuffer::from_bitstr("1010_0000 1");

        assert_eq!(b.len(), 9);
        assert_eq!(b.read(0, 9), 0b101000001);
        assert_eq!(b.to_string(), "101000001");
    }

    #[test]
    fn test_fields() {
        const ADDR: FieldSpec = FieldSpec::indices(&[0, 2, 4, 6, 15]);
        const MID: FieldSpec = FieldSpec::span(4, 11);

        let b = BitBuffer::from_bytes(&[0b10101010, 0b11110001]);

        assert_eq!(ADDR.len(), 5);
        assert_eq!(ADDR.end(), 16);
        assert_eq!(b.int(&ADDR), 0b11111);
        assert_eq!(b.int(&MID), 0b10101111);
        assert_eq!(b.hex(&MID), "AF");
        assert_eq!(b.hex(&FieldSpec::range(0, 12)), "AAF");
        assert_eq!(b.hex(&FieldSpec::range(0, 5)), "15");
        assert_eq!(b.hex(&FieldSpec::range(8, 4)), "F");
        assert_eq!(b.hex(&FieldSpec::range(12, 8)), "10");
    }

    #[test]
    fn test_corrections() {
        let mut b = BitBuffer::new(8);

        assert_eq!(b.corrected_bit_count(), 0);
        b.record_corrections(3);
        b.record_corrections(0);
        b.record_corrections(2);
        assert_eq!(b.corrected_bit_count(), 5);
        b.record_corrections(usize::MAX);
        assert_eq!(b.corrected_bit_count(), usize::MAX);
    }
}
