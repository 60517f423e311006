//! Implements encoding and decoding of the "trellis" convolutional error correcting code
//! specified by P25. Encoding is done with a state machine and decoding is done with the
//! Viterbi algorithm, adapted from \[1].
//!
//! Each input symbol becomes the next state of the machine, and the transition emits a
//! "constellation point" of two dibits. A block of 48 symbols plus a flushing zero symbol
//! produces 49 nibbles (196 bits), which are interleaved before transmission.
//!
//! \[1]: "Coding Theory and Cryptography: The Essentials", 2nd ed, Hankerson, Hoffman, et
//! al, 2000

use crate::bit_buffer::BitBuffer;
use crate::bits::{Dibit, Dibits, Tribits, DibitBytes, TribitBytes};
use crate::coding::CorrectionResult;
use crate::consts::{CODING_BITS, HALF_RATE_BYTES, THREE_QUARTER_RATE_BYTES};
use crate::data::interleave::{self, NIBBLES};

/// Number of data symbols in a block.
const SYMBOLS: usize = NIBBLES - 1;

/// Dibit pairs emitted on each constellation point.
const PAIRS: [(u8, u8); 16] = [
    (0b00, 0b10),
    (0b10, 0b10),
    (0b01, 0b11),
    (0b11, 0b11),
    (0b11, 0b10),
    (0b01, 0b10),
    (0b10, 0b11),
    (0b00, 0b11),
    (0b11, 0b01),
    (0b01, 0b01),
    (0b10, 0b00),
    (0b00, 0b00),
    (0b00, 0b01),
    (0b10, 0b01),
    (0b01, 0b00),
    (0b11, 0b00),
];

/// Constellation points on transitions of the half-rate (dibit input) code.
const DIBIT_STATES: [[usize; 4]; 4] = [
    [0, 15, 12, 3],
    [4, 11, 8, 7],
    [13, 2, 1, 14],
    [9, 6, 5, 10],
];

/// Constellation points on transitions of the 3/4-rate (tribit input) code.
const TRIBIT_STATES: [[usize; 8]; 8] = [
    [0,  8, 4, 12, 2, 10, 6, 14],
    [4, 12, 2, 10, 6, 14, 0,  8],
    [1,  9, 5, 13, 3, 11, 7, 15],
    [5, 13, 3, 11, 7, 15, 1,  9],
    [3, 11, 7, 15, 1,  9, 5, 13],
    [7, 15, 1,  9, 5, 13, 3, 11],
    [2, 10, 6, 14, 0,  8, 4, 12],
    [6, 14, 0,  8, 4, 12, 2, 10],
];

/// Get the nibble (high dibit then low dibit) emitted on the given constellation point.
fn nibble(point: usize) -> u8 {
    let (hi, lo) = PAIRS[point];
    let (hi, lo) = (Dibit::new(hi), Dibit::new(lo));

    hi.bits() << 2 | lo.bits()
}

/// Convolutional code finite state machine with the given transition table. Each fed-in
/// symbol is used as the next state.
struct TrellisFsm<const S: usize> {
    table: &'static [[usize; S]; S],
    state: usize,
}

impl<const S: usize> TrellisFsm<S> {
    fn new(table: &'static [[usize; S]; S]) -> Self {
        TrellisFsm { table, state: 0 }
    }

    /// Apply the given symbol and return the nibble emitted on the transition.
    fn feed(&mut self, input: u8) -> u8 {
        let next = input as usize;
        let point = self.table[self.state][next];

        self.state = next;

        nibble(point)
    }
}

/// Encode the 48 symbols into an interleaved 196-bit block.
fn encode<const S: usize, I>(table: &'static [[usize; S]; S], symbols: I) -> BitBuffer
    where I: Iterator<Item = u8>
{
    let mut fsm = TrellisFsm::new(table);
    let mut coded = [0; NIBBLES];

    // The final flushing symbol returns the machine to state 0.
    for (dest, sym) in coded.iter_mut().zip(symbols.take(SYMBOLS).chain(Some(0))) {
        *dest = fsm.feed(sym);
    }

    let mut buf = BitBuffer::new(CODING_BITS);

    for (i, &n) in interleave::interleave(&coded).iter().enumerate() {
        buf.write(i * 4, 4, n as u64);
    }

    buf
}

/// Find the most likely input symbols for the given coded (deinterleaved) nibbles,
/// returning them along with the Hamming distance of the chosen path.
fn viterbi<const S: usize>(table: &[[usize; S]; S], coded: &[u8; NIBBLES])
    -> (Vec<u8>, usize)
{
    let mut metrics = [usize::MAX; S];
    metrics[0] = 0;

    // Previous state chosen for each state at each step.
    let mut history = Vec::with_capacity(NIBBLES);

    for &rx in coded.iter() {
        let mut next_metrics = [usize::MAX; S];
        let mut prev = [0; S];

        for next in 0..S {
            for cur in 0..S {
                if metrics[cur] == usize::MAX {
                    continue;
                }

                let dist = (rx ^ nibble(table[cur][next])).count_ones() as usize;
                let m = metrics[cur] + dist;

                if m < next_metrics[next] {
                    next_metrics[next] = m;
                    prev[next] = cur;
                }
            }
        }

        history.push(prev);
        metrics = next_metrics;
    }

    // The flushing symbol forces the path to end in state 0.
    let mut state = 0;
    let mut symbols = vec![0; NIBBLES];

    for (sym, prev) in symbols.iter_mut().zip(history.iter()).rev() {
        *sym = state as u8;
        state = prev[state];
    }

    symbols.truncate(SYMBOLS);

    (symbols, metrics[0])
}

/// Decode the interleaved block starting at the given bit offset.
fn decode<const S: usize>(table: &[[usize; S]; S], buf: &BitBuffer, offset: usize)
    -> (Vec<u8>, CorrectionResult)
{
    let coded = interleave::deinterleave(&interleave::read_nibbles(buf, offset));
    let (symbols, dist) = viterbi(table, &coded);

    (symbols, CorrectionResult::from_errors(Some(dist)))
}

/// Half-rate code with dibit input, carrying 12 bytes per block.
pub mod dibit {
    use super::*;

    /// Encode the given 12 bytes into an interleaved 196-bit block.
    pub fn encode(bytes: &[u8; HALF_RATE_BYTES]) -> BitBuffer {
        super::encode(&DIBIT_STATES, Dibits::new(bytes.iter().cloned()))
    }

    /// Decode the 196-bit block starting at the given offset into 12 bytes.
    ///
    /// The number of corrected bits is recorded on the returned buffer.
    pub fn decode(buf: &BitBuffer, offset: usize) -> (BitBuffer, CorrectionResult) {
        let (symbols, res) = super::decode(&DIBIT_STATES, buf, offset);
        let bytes = DibitBytes::new(symbols.into_iter()).collect::<Vec<_>>();

        let mut out = BitBuffer::from_bytes(&bytes);
        out.record_corrections(res.errors());

        (out, res)
    }
}

/// 3/4-rate code with tribit input, carrying 18 bytes per block.
pub mod tribit {
    use super::*;

    /// Encode the given 18 bytes into an interleaved 196-bit block.
    pub fn encode(bytes: &[u8; THREE_QUARTER_RATE_BYTES]) -> BitBuffer {
        super::encode(&TRIBIT_STATES, Tribits::new(bytes.iter().cloned()))
    }

    /// Decode the 196-bit block starting at the given offset into 18 bytes.
    ///
    /// The number of corrected bits is recorded on the returned buffer.
    pub fn decode(buf: &BitBuffer, offset: usize) -> (BitBuffer, CorrectionResult) {
        let (symbols, res) = super::decode(&TRIBIT_STATES, buf, offset);
        let bytes = TribitBytes::new(symbols.into_iter()).collect::<Vec<_>>();

        let mut out = BitBuffer::from_bytes(&bytes);
        out.record_corrections(res.errors());

        (out, res)
    }
}
