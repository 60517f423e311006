//! Frame assembly from a correlated bit stream.
//!
//! The framer runs a sync correlator over every incoming bit. Each sync match starts a
//! new `FrameAssembler`, seeded with the matched pattern, and every following bit is
//! fanned out to all live assemblers. Since a correlator can match at several nearby
//! offsets before the true frame boundary is known, overlapping candidates are all
//! assembled and any losers are discarded downstream when they fail to decode.
//!
//! A `FrameLayout` describes the protocol: which bits of the raw stream are status
//! symbols to drop, how long a frame is once its sync is seen, and whether a frame
//! must grow once enough of it has been assembled to know its real length.

use tracing::{debug, trace, warn};

use crate::bit_buffer::BitBuffer;
use crate::coding::trellis;
use crate::consts;
use crate::error::Result;
use crate::message::nid::{DataUnit, NetworkId};
use crate::sync::{SyncCorrelator, SyncMatch, SyncPattern};

/// Maximum number of frames assembled at once. Sync matches past this are ignored.
pub const MAX_ASSEMBLERS: usize = 8;

/// Describes the frame structure of a protocol.
pub trait FrameLayout {
    /// Sync patterns that begin a frame.
    fn patterns(&self) -> Vec<SyncPattern>;

    /// Number of frame bits, including sync, to assemble after the given pattern
    /// matched.
    fn initial_len(&self, pattern: usize) -> usize;

    /// Called each time the frame reaches its current target length. Return the new
    /// target length if the frame continues, or `None` if it's complete.
    fn extend(&self, frame: &BitBuffer) -> Option<usize>;

    /// Check if the bit at the given position of the raw stream, counting from the
    /// first sync bit, is an interleaved status bit to drop.
    fn is_status_bit(&self, _pos: usize) -> bool { false }
}

/// An assembled frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Frame bits, starting with the sync pattern.
    pub bits: BitBuffer,
    /// Index of the sync pattern that started the frame.
    pub pattern: usize,
    /// Number of bit errors in the received sync.
    pub sync_errors: u32,
    /// Whether the frame reached its full length, rather than being flushed early.
    pub complete: bool,
}

/// In-flight frame.
#[derive(Clone, Debug)]
pub struct FrameAssembler {
    bits: Vec<bool>,
    /// Number of bits to assemble.
    target: usize,
    /// Position in the raw stream, including status bits.
    pos: usize,
    sync: SyncMatch,
}

impl FrameAssembler {
    /// Create a new assembler seeded with the matched sync pattern.
    fn new(pattern: &SyncPattern, sync: SyncMatch, target: usize) -> FrameAssembler {
        let mut bits = Vec::with_capacity(target);
        bits.extend(pattern.to_buffer().iter());

        FrameAssembler {
            pos: bits.len(),
            bits,
            target,
            sync,
        }
    }

    /// Number of bits assembled so far.
    pub fn len(&self) -> usize { self.bits.len() }

    pub fn is_empty(&self) -> bool { self.bits.is_empty() }

    /// Number of bits the frame is currently expected to have.
    pub fn target(&self) -> usize { self.target }

    /// Add a bit, returning true when the frame is complete.
    fn feed<L: FrameLayout>(&mut self, layout: &L, bit: bool) -> bool {
        let pos = self.pos;
        self.pos += 1;

        if layout.is_status_bit(pos) {
            return false;
        }

        self.bits.push(bit);

        if self.bits.len() < self.target {
            return false;
        }

        match layout.extend(&BitBuffer::from_bits(&self.bits)) {
            Some(target) if target > self.target => {
                trace!(from = self.target, to = target, "extending frame");
                self.target = target;
                false
            },
            _ => true,
        }
    }

    fn finish(self, complete: bool) -> Frame {
        Frame {
            bits: BitBuffer::from_bits(&self.bits),
            pattern: self.sync.pattern,
            sync_errors: self.sync.errors,
            complete,
        }
    }
}

/// Locates frames in a bit stream and assembles them.
pub struct MessageFramer<L: FrameLayout> {
    layout: L,
    corr: SyncCorrelator,
    assemblers: Vec<FrameAssembler>,
}

impl<L: FrameLayout> MessageFramer<L> {
    /// Create a new `MessageFramer` for the given layout, matching sync patterns with up
    /// to `tolerance` bit errors.
    pub fn new(layout: L, tolerance: usize) -> Result<MessageFramer<L>> {
        let corr = SyncCorrelator::new(layout.patterns(), tolerance)?;

        Ok(MessageFramer {
            layout,
            corr,
            assemblers: Vec::new(),
        })
    }

    pub fn layout(&self) -> &L { &self.layout }

    /// Number of frames currently being assembled.
    pub fn pending(&self) -> usize { self.assemblers.len() }

    /// Feed in a bit, pushing any completed frames onto `out`.
    pub fn feed(&mut self, bit: bool, out: &mut Vec<Frame>) {
        let layout = &self.layout;
        let mut i = 0;

        while i < self.assemblers.len() {
            if self.assemblers[i].feed(layout, bit) {
                let frame = self.assemblers.remove(i).finish(true);
                debug!(bits = frame.bits.len(), sync_errors = frame.sync_errors,
                       "frame assembled");
                out.push(frame);
            } else {
                i += 1;
            }
        }

        if let Some(m) = self.corr.feed(bit) {
            self.start(m);
        }
    }

    /// Feed in a sequence of bits, returning all completed frames.
    pub fn feed_bits<I: IntoIterator<Item = bool>>(&mut self, bits: I) -> Vec<Frame> {
        let mut out = Vec::new();

        for bit in bits {
            self.feed(bit, &mut out);
        }

        out
    }

    /// Force-complete all pending frames, returning them marked incomplete.
    pub fn flush(&mut self) -> Vec<Frame> {
        if !self.assemblers.is_empty() {
            debug!(pending = self.assemblers.len(), "flushing frames");
        }

        self.assemblers.drain(..).map(|a| a.finish(false)).collect()
    }

    /// Dispose of all pending frames and sync history.
    pub fn reset(&mut self) {
        self.assemblers.clear();
        self.corr.reset();
    }

    fn start(&mut self, m: SyncMatch) {
        let pattern = match self.corr.patterns().get(m.pattern) {
            Some(p) => *p,
            None => return,
        };

        if self.assemblers.len() >= MAX_ASSEMBLERS {
            warn!(pattern = pattern.name(), pending = self.assemblers.len(),
                  "too many pending frames, ignoring sync");
            return;
        }

        debug!(pattern = pattern.name(), errors = m.errors, "sync matched");

        let target = self.layout.initial_len(m.pattern);
        self.assemblers.push(FrameAssembler::new(&pattern, m, target));
    }
}

/// P25 Phase 1 frame structure.
#[derive(Copy, Clone, Debug, Default)]
pub struct P25Layout;

impl P25Layout {
    /// Decode the last-block flag of the TSBK block starting at the given offset.
    fn last_block(frame: &BitBuffer, offset: usize) -> bool {
        let (block, _) = trellis::dibit::decode(frame, offset);
        block.get(0)
    }

    /// Decode the blocks-to-follow field of the PDU header block at the given offset.
    fn blocks_to_follow(frame: &BitBuffer, offset: usize) -> usize {
        let (block, _) = trellis::dibit::decode(frame, offset);
        let header = crate::data::header::PduHeader::new(block);

        if header.is_valid() {
            header.blocks_to_follow()
        } else {
            0
        }
    }
}

impl FrameLayout for P25Layout {
    fn patterns(&self) -> Vec<SyncPattern> { vec![SyncPattern::p25()] }

    fn initial_len(&self, _pattern: usize) -> usize { consts::PREAMBLE_BITS }

    fn extend(&self, frame: &BitBuffer) -> Option<usize> {
        const BLOCK: usize = consts::CODING_BITS;
        const START: usize = consts::PREAMBLE_BITS;

        let len = frame.len();
        let du = NetworkId::peek(frame, consts::SYNC_BITS)?.data_unit;

        if len == START {
            return Some(START + du.body_bits());
        }

        let blocks = (len - START) / BLOCK;

        match du {
            DataUnit::TrunkingSignaling if blocks < consts::TSBK_MAX_BLOCKS => {
                if P25Layout::last_block(frame, len - BLOCK) {
                    None
                } else {
                    Some(len + BLOCK)
                }
            },
            DataUnit::DataPacket if blocks == 1 => {
                match P25Layout::blocks_to_follow(frame, START) {
                    0 => None,
                    n => Some(len + n * BLOCK),
                }
            },
            _ => None,
        }
    }

    fn is_status_bit(&self, pos: usize) -> bool {
        pos / 2 % consts::STATUS_DIBIT_PERIOD == consts::STATUS_DIBIT_PERIOD - 1
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use super::test_frames::*;
    use crate::sync::P25_SYNC;

    /// Single 16-bit sync followed by a fixed 8-bit body, with every 10th bit a status
    /// bit.
    struct TestLayout;

    impl FrameLayout for TestLayout {
        fn patterns(&self) -> Vec<SyncPattern> {
            vec![SyncPattern::new("test", 0xA5C3, 16).unwrap()]
        }

        fn initial_len(&self, _: usize) -> usize { 24 }

        fn extend(&self, frame: &BitBuffer) -> Option<usize> {
            // A set first body bit doubles the body.
            if frame.len() == 24 && frame.get(16) {
                Some(32)
            } else {
                None
            }
        }

        fn is_status_bit(&self, pos: usize) -> bool { pos % 10 == 9 }
    }

    fn word_bits(word: u64, len: usize) -> Vec<bool> {
        (0..len).rev().map(|b| word >> b & 1 == 1).collect()
    }

    #[test]
    fn test_assemble() {
        let mut f = MessageFramer::new(TestLayout, 0).unwrap();

        let mut bits = word_bits(0x1234, 16);
        bits.extend(word_bits(0xA5C3, 16));
        // Status bits at stream positions 19 and 29.
        bits.extend(word_bits(0b011_0_1100_1_0, 10));

        let frames = f.feed_bits(bits);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].complete);
        assert_eq!(frames[0].bits.len(), 24);
        assert_eq!(frames[0].bits.read(0, 16), 0xA5C3);
        assert_eq!(frames[0].bits.read(16, 8), 0b0111_1001);
        assert_eq!(f.pending(), 0);
    }

    #[test]
    fn test_extend() {
        let mut f = MessageFramer::new(TestLayout, 0).unwrap();

        let mut bits = word_bits(0xA5C3, 16);
        bits.extend(word_bits(0b1111_1111_1111_1111_11, 18));

        let frames = f.feed_bits(bits);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].bits.len(), 32);
    }

    #[test]
    fn test_overlapping() {
        let mut f = MessageFramer::new(TestLayout, 0).unwrap();

        // Second sync begins inside the first frame's extended body.
        let mut bits = word_bits(0xA5C3, 16);
        bits.extend(word_bits(0xA5C3, 16));
        bits.extend(word_bits(0x0000, 16));

        let mut out = vec![];
        let mut seen = vec![];

        for b in bits {
            f.feed(b, &mut out);
            seen.push(f.pending());
        }

        assert_eq!(seen.iter().max(), Some(&2));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].bits.read(0, 16), 0xA5C3);
        assert_eq!(out[1].bits.read(0, 16), 0xA5C3);
    }

    /// Frames far longer than the stream, so every sync stays pending.
    struct LongLayout;

    impl FrameLayout for LongLayout {
        fn patterns(&self) -> Vec<SyncPattern> {
            vec![SyncPattern::new("long", 0xA5C3, 16).unwrap()]
        }

        fn initial_len(&self, _: usize) -> usize { 1000 }

        fn extend(&self, _: &BitBuffer) -> Option<usize> { None }
    }

    #[test]
    fn test_max_assemblers() {
        let mut f = MessageFramer::new(LongLayout, 0).unwrap();
        let mut bits = vec![];

        for _ in 0..MAX_ASSEMBLERS + 1 {
            bits.extend(word_bits(0xA5C3, 16));
            bits.extend(word_bits(0, 16));
        }

        assert!(f.feed_bits(bits).is_empty());
        assert_eq!(f.pending(), MAX_ASSEMBLERS);

        // The earliest frames are kept and the last sync is refused.
        let frames = f.flush();
        assert_eq!(frames.len(), MAX_ASSEMBLERS);
        assert_eq!(frames[0].bits.len(), 32 * (MAX_ASSEMBLERS + 1));
        assert_eq!(frames[MAX_ASSEMBLERS - 1].bits.len(), 64);
    }

    #[test]
    fn test_flush_reset() {
        let mut f = MessageFramer::new(TestLayout, 0).unwrap();

        let mut bits = word_bits(0xA5C3, 16);
        bits.extend(word_bits(0b010, 3));

        assert!(f.feed_bits(bits.clone()).is_empty());
        assert_eq!(f.pending(), 1);

        let frames = f.flush();
        assert_eq!(frames.len(), 1);
        assert!(!frames[0].complete);
        assert_eq!(frames[0].bits.len(), 19);
        assert_eq!(f.pending(), 0);
        assert!(f.flush().is_empty());

        f.feed_bits(bits);
        assert_eq!(f.pending(), 1);
        f.reset();
        assert_eq!(f.pending(), 0);
    }

    #[test]
    fn test_tolerance() {
        let mut f = MessageFramer::new(TestLayout, 1).unwrap();
        f.feed_bits(word_bits(0xA5C3 ^ 0x0100, 16));
        assert_eq!(f.pending(), 1);

        let mut f = MessageFramer::new(TestLayout, 1).unwrap();
        f.feed_bits(word_bits(0xA5C3 ^ 0x0101, 16));
        assert_eq!(f.pending(), 0);

        assert!(MessageFramer::new(TestLayout, 20).is_err());
    }

    #[test]
    fn test_status_bits() {
        let l = P25Layout;
        let status = (0..200).filter(|&p| l.is_status_bit(p)).collect::<Vec<_>>();
        assert_eq!(status, vec![70, 71, 142, 143]);
    }

    #[test]
    fn test_p25_tdu() {
        let body = BitBuffer::new(consts::TERM_BODY_BITS);
        let tx = frame(0x293, DataUnit::VoiceSimpleTerminator, &body);

        let mut f = MessageFramer::new(P25Layout, 2).unwrap();
        let mut bits = vec![false; 40];
        bits.extend(with_status(&tx));

        let frames = f.feed_bits(bits);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].bits, tx);
        assert_eq!(frames[0].bits.read(0, 48), P25_SYNC);
    }

    #[test]
    fn test_p25_tsbk_blocks() {
        let mut first = [0u8; 12];
        first[0] = 0x02;
        let mut last = [0u8; 12];
        last[0] = 0x82;

        let b1 = trellis::dibit::encode(&first);
        let b2 = trellis::dibit::encode(&last);
        let body = concat(&[&b1, &b2]);
        let tx = frame(0x293, DataUnit::TrunkingSignaling, &body);

        let mut f = MessageFramer::new(P25Layout, 0).unwrap();
        let mut bits = with_status(&tx);
        // Trailing bits for a third block that must not be collected.
        bits.extend(std::iter::repeat(false).take(300));

        let frames = f.feed_bits(bits);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].bits.len(), consts::PREAMBLE_BITS + 2 * consts::CODING_BITS);
        assert_eq!(frames[0].bits, tx);
    }

    #[test]
    fn test_p25_bad_nid() {
        let mut f = MessageFramer::new(P25Layout, 0).unwrap();
        let mut bits = word_bits(P25_SYNC, 48);
        // Alternating bits are far from any NID codeword.
        bits.extend((0..64).map(|i| i % 2 == 0));

        let frames = f.feed_bits(bits);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].bits.len(), consts::PREAMBLE_BITS);
    }
}
