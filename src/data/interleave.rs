//! Interleaving and deinterleaving of trellis-coded blocks.
//!
//! A coded block is 49 nibbles (dibit pairs). Transmitted nibble j carries coded nibble
//! `PERM[j]`, which walks the coded block in strides of 4.

use crate::bit_buffer::BitBuffer;

/// Number of nibbles in a coded block.
pub const NIBBLES: usize = 49;

/// Coded nibble index carried by each transmitted nibble.
static PERM: [usize; NIBBLES] = build_perm();

const fn build_perm() -> [usize; NIBBLES] {
    let mut perm = [0; NIBBLES];
    let mut j = 0;
    let mut start = 0;

    while start < 4 {
        let mut idx = start;

        while idx < NIBBLES {
            perm[j] = idx;
            j += 1;
            idx += 4;
        }

        start += 1;
    }

    perm
}

/// Interleave the given coded nibbles into transmission order.
pub fn interleave(coded: &[u8; NIBBLES]) -> [u8; NIBBLES] {
    let mut out = [0; NIBBLES];

    for (dest, &src) in out.iter_mut().zip(PERM.iter()) {
        *dest = coded[src];
    }

    out
}

/// Undo interleaving on the given received nibbles.
pub fn deinterleave(received: &[u8; NIBBLES]) -> [u8; NIBBLES] {
    let mut out = [0; NIBBLES];

    for (&nibble, &dest) in received.iter().zip(PERM.iter()) {
        out[dest] = nibble;
    }

    out
}

/// Read the 49 received nibbles of the block starting at the given bit offset.
pub fn read_nibbles(buf: &BitBuffer, offset: usize) -> [u8; NIBBLES] {
    let mut out = [0; NIBBLES];

    for (i, n) in out.iter_mut().enumerate() {
        *n = buf.read(offset + i * 4, 4) as u8;
    }

    out
}
