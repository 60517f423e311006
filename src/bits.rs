//! Utilities for packing/unpacking dibits, tribits, and hexbits into/out of bytes.

/// Two bits.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Dibit(u8);

impl Dibit {
    /// Construct a new `Dibit` with the two given bits in the LSB position.
    pub fn new(bits: u8) -> Dibit {
        assert!(bits >> 2 == 0);
        Dibit(bits)
    }

    /// Get the wrapped dibit, which is guaranteed to have only 2 LSBs.
    pub fn bits(&self) -> u8 { self.0 }
    /// Get the MSB.
    pub fn hi(&self) -> u8 { self.0 >> 1 }
    /// Get the LSB.
    pub fn lo(&self) -> u8 { self.0 & 1 }
}

/// Iterates over the `W`-bit symbols of a byte source, MSB to LSB.
///
/// Trailing bits that don't fill a whole symbol are dropped.
pub struct Symbols<const W: u32, I: Iterator<Item = u8>> {
    src: I,
    /// Buffered bits, right-aligned.
    buf: u32,
    /// Number of valid bits in `buf`.
    avail: u32,
}

/// Iterate over the 2-bit symbols of a byte source.
pub type Dibits<I> = Symbols<2, I>;
/// Iterate over the 3-bit symbols of a byte source.
pub type Tribits<I> = Symbols<3, I>;
/// Iterate over the 6-bit symbols of a byte source.
pub type Hexbits<I> = Symbols<6, I>;

impl<const W: u32, I: Iterator<Item = u8>> Symbols<W, I> {
    /// Construct a new `Symbols` over the given byte source.
    pub fn new(src: I) -> Self {
        assert!(W > 0 && W <= 8);
        Symbols { src, buf: 0, avail: 0 }
    }
}

impl<const W: u32, I: Iterator<Item = u8>> Iterator for Symbols<W, I> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        while self.avail < W {
            self.buf = self.buf << 8 | self.src.next()? as u32;
            self.avail += 8;
        }

        self.avail -= W;

        Some((self.buf >> self.avail & ((1 << W) - 1)) as u8)
    }
}

/// Groups `W`-bit symbols into full bytes, MSB first.
///
/// A final partial byte is padded with zero bits.
pub struct SymbolBytes<const W: u32, I: Iterator<Item = u8>> {
    src: I,
    buf: u32,
    avail: u32,
    done: bool,
}

/// Group dibits into bytes.
pub type DibitBytes<I> = SymbolBytes<2, I>;
/// Group tribits into bytes.
pub type TribitBytes<I> = SymbolBytes<3, I>;
/// Group hexbits into bytes.
pub type HexbitBytes<I> = SymbolBytes<6, I>;

impl<const W: u32, I: Iterator<Item = u8>> SymbolBytes<W, I> {
    /// Construct a new `SymbolBytes` over the given symbol source.
    pub fn new(src: I) -> Self {
        assert!(W > 0 && W <= 8);
        SymbolBytes { src, buf: 0, avail: 0, done: false }
    }
}

impl<const W: u32, I: Iterator<Item = u8>> Iterator for SymbolBytes<W, I> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        while self.avail < 8 && !self.done {
            match self.src.next() {
                Some(sym) => {
                    debug_assert!(sym as u32 >> W == 0);
                    self.buf = self.buf << W | sym as u32;
                    self.avail += W;
                },
                None => self.done = true,
            }
        }

        match self.avail {
            0 => None,
            n if n < 8 => {
                self.avail = 0;
                Some((self.buf << (8 - n)) as u8)
            },
            n => {
                self.avail -= 8;
                Some((self.buf >> (n - 8)) as u8)
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dibit() {
        let d = Dibit::new(0b10);
        assert_eq!(d.hi(), 1);
        assert_eq!(d.lo(), 0);
        assert_eq!(d.bits(), 0b10);
    }

    #[test]
    fn test_dibits() {
        let bytes = [0b00110011, 0b10011001, 0b11111111];
        let d = Dibits::new(bytes.iter().cloned()).collect::<Vec<_>>();

        assert_eq!(d, vec![
            0b00, 0b11, 0b00, 0b11,
            0b10, 0b01, 0b10, 0b01,
            0b11, 0b11, 0b11, 0b11,
        ]);

        let b = DibitBytes::new(d.into_iter()).collect::<Vec<_>>();
        assert_eq!(&b[..], &bytes[..]);
    }

    #[test]
    fn test_tribits() {
        let bytes = [0b00101001, 0b11001011, 0b10111000];
        let t = Tribits::new(bytes.iter().cloned()).collect::<Vec<_>>();

        assert_eq!(t, vec![0b001, 0b010, 0b011, 0b100, 0b101, 0b110, 0b111, 0b000]);

        let b = TribitBytes::new(t.into_iter()).collect::<Vec<_>>();
        assert_eq!(&b[..], &bytes[..]);
    }

    #[test]
    fn test_hexbits() {
        let bytes = [0b11111100, 0b00001010, 0b10010101];
        let h = Hexbits::new(bytes.iter().cloned()).collect::<Vec<_>>();

        assert_eq!(h, vec![0b111111, 0b000000, 0b101010, 0b010101]);

        let b = HexbitBytes::new(h.into_iter()).collect::<Vec<_>>();
        assert_eq!(&b[..], &bytes[..]);
    }

    #[test]
    fn test_partial() {
        // 2 bytes only fill 2 hexbits.
        let h = Hexbits::new([0xFF, 0xFF].iter().cloned()).collect::<Vec<_>>();
        assert_eq!(h, vec![0b111111, 0b111111]);

        // 3 hexbits pad out to 3 bytes.
        let b = HexbitBytes::new([0b111111, 0b000001, 0b100000].iter().cloned())
            .collect::<Vec<_>>();
        assert_eq!(b, vec![0b11111100, 0b00011000, 0b00000000]);
    }
}
