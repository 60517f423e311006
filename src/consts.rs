/// Symbols (dibits) per second.
pub const SYMBOL_RATE: usize = 4800;
/// Baseband samples per second
pub const SAMPLE_RATE: usize = 48000;
/// Number of symbols in the frame sync sequence.
pub const SYNC_SYMBOLS: usize = 24;
/// Number of bits in the frame sync sequence.
pub const SYNC_BITS: usize = SYNC_SYMBOLS * 2;
/// Number of bits in a coded NID word, including the trailing parity bit.
pub const NID_BITS: usize = 64;
/// Number of bits from frame start through the end of the NID.
pub const PREAMBLE_BITS: usize = SYNC_BITS + NID_BITS;
/// Number of bits output by the 1/2 or 3/4-rate trellis coder.
pub const CODING_BITS: usize = 196;
/// Number of bytes in an uncoded TSBK packet.
pub const TSBK_BYTES: usize = 12;
/// Maximum number of TSBK blocks in a single frame.
pub const TSBK_MAX_BLOCKS: usize = 3;
/// Number of bytes in a 1/2-rate data block or packet header.
pub const HALF_RATE_BYTES: usize = 12;
/// Number of bytes in a 3/4-rate data block.
pub const THREE_QUARTER_RATE_BYTES: usize = 18;
/// Number of bytes in a link control word.
pub const LINK_CONTROL_BYTES: usize = 9;
/// Number of Golay(24, 12) words in a terminator with link control.
pub const LC_TERM_WORDS: usize = 12;
/// Number of bits in the body of a voice header, after the NID.
pub const HEADER_BODY_BITS: usize = 648;
/// Number of bits in the body of an LDU1 or LDU2, after the NID.
pub const LDU_BODY_BITS: usize = 1568;
/// Number of bits in the body of a simple terminator, after the NID.
pub const TERM_BODY_BITS: usize = 28;
/// Number of bits in the body of a terminator with link control, after the NID.
pub const LC_TERM_BODY_BITS: usize = 288;
/// Every dibit at this interval (counting from frame start) is a status symbol.
pub const STATUS_DIBIT_PERIOD: usize = 36;
