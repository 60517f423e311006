//! Reassembly of multi-block packet data units.
//!
//! A PDU frame carries a header block followed by the number of data blocks the header
//! declares. Confirmed packets use 3/4-rate blocks, each with a serial number and CRC-9,
//! while all other formats use 1/2-rate blocks. Packets that carry user data end with a
//! CRC-32 over the data octets of every block.

use std::cell::OnceCell;
use std::fmt;

use tracing::{debug, warn};

use crate::bit_buffer::BitBuffer;
use crate::coding::{trellis, CorrectionResult};
use crate::consts::{CODING_BITS, PREAMBLE_BITS, THREE_QUARTER_RATE_BYTES};
use crate::data::crc::{self, Crc};
use crate::data::header::{PduFormat, PduHeader, ResponseClass};
use crate::identifier::{Identifier, IdentifierKind, Role};
use crate::message::tsbk::{TsbkOpcode, Vendor};
use crate::message::{Direction, Message, RawMessage};
use crate::stats::Stats;

/// Number of user data bits in a confirmed block.
pub const CONFIRMED_DATA_BITS: usize = 128;

/// Maximum number of blocks holding a missing-block bitmap.
pub const MAX_BITMAP_BLOCKS: usize = 2;

/// Number of bitmap bits taken from each block.
const BITMAP_BITS: usize = 64;

/// Number of octets in the packet CRC.
const PACKET_CRC_BYTES: usize = 4;

/// Reassembly progress.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PduState {
    AwaitingHeader,
    AccumulatingBlocks,
    /// All declared blocks were received.
    Complete,
    /// The sequence was flushed before all declared blocks arrived.
    Incomplete,
}

/// A data block following a PDU header.
#[derive(Clone, Debug)]
pub struct DataBlock {
    /// Data octets, without any serial number or CRC.
    data: BitBuffer,
    serial: Option<u8>,
    crc_ok: bool,
    fec: CorrectionResult,
}

impl DataBlock {
    /// Decode the trellis-coded block starting at the given bit offset.
    pub fn decode(buf: &BitBuffer, offset: usize, confirmed: bool) -> DataBlock {
        if confirmed {
            let (bits, fec) = trellis::tribit::decode(buf, offset);
            DataBlock::confirmed(bits, fec)
        } else {
            let (bits, fec) = trellis::dibit::decode(buf, offset);
            DataBlock::unconfirmed(bits, fec)
        }
    }

    /// Interpret the given 144 bits of a confirmed block: a 7-bit serial number, the
    /// CRC-9, then 16 data octets.
    pub fn confirmed(bits: BitBuffer, fec: CorrectionResult) -> DataBlock {
        let crc = Crc::new(crc::CRC9)
            .feed_buffer(&bits, 0, 7)
            .feed_buffer(&bits, 16, CONFIRMED_DATA_BITS)
            .finish();

        let mut data = bits.slice(16, CONFIRMED_DATA_BITS);
        data.record_corrections(bits.corrected_bit_count());

        DataBlock {
            data,
            serial: Some(bits.read(0, 7) as u8),
            crc_ok: crc == bits.read(7, 9),
            fec,
        }
    }

    /// Wrap the given 96 bits of a 1/2-rate block.
    pub fn unconfirmed(bits: BitBuffer, fec: CorrectionResult) -> DataBlock {
        DataBlock {
            data: bits,
            serial: None,
            crc_ok: true,
            fec,
        }
    }

    pub fn data(&self) -> &BitBuffer { &self.data }

    /// Serial number of a confirmed block.
    pub fn serial(&self) -> Option<u8> { self.serial }

    /// Whether the block CRC matched. Always true for blocks without one.
    pub fn crc_ok(&self) -> bool { self.crc_ok }

    pub fn fec(&self) -> CorrectionResult { self.fec }

    pub fn is_valid(&self) -> bool { self.fec.is_ok() && self.crc_ok }
}

/// Build the 18 octets of a confirmed block, computing its CRC-9.
pub fn build_confirmed(serial: u8, data: &[u8; 16]) -> [u8; THREE_QUARTER_RATE_BYTES] {
    let mut bits = BitBuffer::new(THREE_QUARTER_RATE_BYTES * 8);

    bits.write(0, 7, serial as u64 & 0x7F);

    for (i, &b) in data.iter().enumerate() {
        bits.write(16 + i * 8, 8, b as u64);
    }

    let crc = Crc::new(crc::CRC9)
        .feed_buffer(&bits, 0, 7)
        .feed_buffer(&bits, 16, CONFIRMED_DATA_BITS)
        .finish();
    bits.write(7, 9, crc);

    let mut out = [0; THREE_QUARTER_RATE_BYTES];
    out.copy_from_slice(&bits.to_bytes());
    out
}

/// Decode the missing-block bitmap of a selective retry response from the first 64
/// bits of each given block, returning the sorted indices of missing blocks.
///
/// A cleared bit marks a missing block. Bits are numbered LSB first within each octet,
/// so bit `p` of the bitmap refers to block `8 * (p / 8) + 7 - p % 8`.
pub fn decode_missing_blocks<'a, I>(blocks: I) -> Vec<usize>
    where I: IntoIterator<Item = &'a BitBuffer>
{
    let mut missing = blocks.into_iter()
        .take(MAX_BITMAP_BLOCKS)
        .enumerate()
        .flat_map(|(b, bits)| {
            (0..BITMAP_BITS)
                .filter(move |&p| !bits.get(p))
                .map(move |p| b * BITMAP_BITS + 8 * (p / 8) + 7 - p % 8)
        })
        .collect::<Vec<_>>();

    missing.sort_unstable();
    missing
}

/// Accumulates a header and its data blocks.
#[derive(Clone, Debug)]
pub struct PduSequence {
    state: PduState,
    header: Option<PduHeader>,
    blocks: Vec<DataBlock>,
}

impl Default for PduSequence {
    fn default() -> Self { PduSequence::new() }
}

impl PduSequence {
    pub fn new() -> PduSequence {
        PduSequence {
            state: PduState::AwaitingHeader,
            header: None,
            blocks: Vec::new(),
        }
    }

    pub fn state(&self) -> PduState { self.state }

    pub fn header(&self) -> Option<&PduHeader> { self.header.as_ref() }

    pub fn blocks(&self) -> &[DataBlock] { &self.blocks }

    pub fn is_complete(&self) -> bool { self.state == PduState::Complete }

    /// Number of data blocks declared by the header.
    pub fn expected_blocks(&self) -> usize {
        self.header.as_ref().map_or(0, |h| h.blocks_to_follow())
    }

    /// Start a new sequence with the given header, discarding any previous one.
    pub fn push_header(&mut self, header: PduHeader) -> PduState {
        if self.state == PduState::AccumulatingBlocks {
            debug!(received = self.blocks.len(), expected = self.expected_blocks(),
                   "header replaces unfinished sequence");
        }

        self.blocks.clear();
        self.state = if header.blocks_to_follow() == 0 {
            PduState::Complete
        } else {
            PduState::AccumulatingBlocks
        };

        debug!(format = ?header.format(), blocks = header.blocks_to_follow(),
               state = ?self.state, "pdu header");

        self.header = Some(header);
        self.state
    }

    /// Append the given data block, completing the sequence once every declared block
    /// has arrived.
    pub fn push_block(&mut self, block: DataBlock) -> PduState {
        match self.state {
            PduState::AccumulatingBlocks => {
                self.blocks.push(block);

                if self.blocks.len() >= self.expected_blocks() {
                    self.state = PduState::Complete;
                    debug!(blocks = self.blocks.len(), "pdu complete");
                }
            },
            PduState::AwaitingHeader => warn!("dropping data block without header"),
            PduState::Complete | PduState::Incomplete =>
                warn!("dropping data block past end of sequence"),
        }

        self.state
    }

    /// Give up on any blocks that haven't arrived.
    pub fn flush(&mut self) -> PduState {
        if self.state == PduState::AccumulatingBlocks {
            debug!(received = self.blocks.len(), expected = self.expected_blocks(),
                   "pdu incomplete");
            self.state = PduState::Incomplete;
        }

        self.state
    }

    /// Whether the final octets of the packet hold a CRC-32.
    fn has_packet_crc(&self) -> bool {
        self.header.as_ref().map_or(false, |h| match h.format() {
            PduFormat::Confirmed | PduFormat::Unconfirmed | PduFormat::Ambtc => true,
            PduFormat::Response | PduFormat::Unknown(_) => false,
        })
    }

    /// Data octets of every block, in order.
    fn data_octets(&self) -> Vec<u8> {
        self.blocks.iter().flat_map(|b| b.data().to_bytes()).collect()
    }

    /// Check the packet CRC of a complete sequence, or `None` if it doesn't carry one.
    pub fn packet_crc_ok(&self) -> Option<bool> {
        if !self.is_complete() || !self.has_packet_crc() || self.blocks.is_empty() {
            return None;
        }

        let octets = self.data_octets();
        let split = octets.len().checked_sub(PACKET_CRC_BYTES)?;
        let (data, tail) = octets.split_at(split);

        let crc = Crc::new(crc::CRC32).feed_bytes(data.iter().cloned()).finish();
        let expected = tail.iter().fold(0u64, |s, &b| s << 8 | b as u64);

        Some(crc == expected)
    }

    /// User data octets, with the packet CRC and pad octets removed.
    pub fn user_data(&self) -> Vec<u8> {
        let mut octets = self.data_octets();

        if self.has_packet_crc() {
            let pads = match self.header.as_ref().map(|h| h.format()) {
                Some(PduFormat::Ambtc) => 0,
                _ => self.header.as_ref().map_or(0, |h| h.pad_octets()),
            };

            let len = octets.len().saturating_sub(PACKET_CRC_BYTES + pads);
            octets.truncate(len);
        }

        octets
    }

    /// Missing blocks listed by a selective retry response.
    pub fn missing_blocks(&self) -> Option<Vec<usize>> {
        let resp = self.header.as_ref()?.response()?;

        if resp.class != ResponseClass::SelectiveRetry || self.blocks.is_empty() ||
           self.blocks.len() > MAX_BITMAP_BLOCKS
        {
            return None;
        }

        Some(decode_missing_blocks(self.blocks.iter().map(|b| b.data())))
    }

    /// Whether the sequence completed with every check passing.
    pub fn is_valid(&self) -> bool {
        self.header.as_ref().map_or(false, |h| h.is_valid()) &&
            self.is_complete() &&
            self.blocks.iter().all(|b| b.is_valid()) &&
            self.packet_crc_ok().unwrap_or(true)
    }
}

/// Decode the header and data blocks of the given PDU frame.
pub fn reassemble(frame: &BitBuffer, stats: &mut Stats) -> PduSequence {
    let mut seq = PduSequence::new();

    let (bits, fec) = trellis::dibit::decode(frame, PREAMBLE_BITS);
    stats.trellis_half.record(fec);

    let header = PduHeader::new(bits);
    stats.record_crc(header.is_valid());

    let confirmed = header.format().three_quarter_rate();
    let expected = header.blocks_to_follow();

    seq.push_header(header);

    for i in 0..expected {
        let offset = PREAMBLE_BITS + (i + 1) * CODING_BITS;

        if offset + CODING_BITS > frame.len() {
            break;
        }

        let block = DataBlock::decode(frame, offset, confirmed);

        if confirmed {
            stats.trellis_three_quarter.record(block.fec());
        } else {
            stats.trellis_half.record(block.fec());
        }

        stats.record_crc(block.crc_ok());
        seq.push_block(block);
    }

    seq.flush();
    seq
}

/// Identifiers addressed by a header.
fn header_identifiers(header: &PduHeader, nac: u16) -> Vec<Identifier> {
    let mut ids = vec![Identifier::nac(nac)];

    match header.response() {
        Some(resp) => {
            ids.push(Identifier::new(IdentifierKind::Llid, resp.target as u64, Role::To));

            if let Some(src) = resp.source {
                ids.push(Identifier::new(IdentifierKind::Llid, src as u64, Role::From));
            }
        },
        None => {
            let role = match header.direction() {
                Direction::Outbound => Role::To,
                Direction::Inbound => Role::From,
            };

            ids.push(Identifier::new(IdentifierKind::Llid, header.llid() as u64, role));
        },
    }

    ids
}

/// Convert a reassembled sequence into a message.
///
/// Trunking control packets with a vendor and opcode that aren't recognized become
/// unknown messages.
pub fn build(seq: PduSequence, nac: u16) -> Message {
    let header = match seq.header() {
        Some(h) => h.clone(),
        None => return Message::UnknownOutbound(RawMessage {
            kind: "PDU",
            bits: BitBuffer::new(0),
            vendor: 0,
            opcode: 0,
            valid: false,
            identifiers: vec![Identifier::nac(nac)],
        }),
    };

    let ambtc = match header.format() {
        PduFormat::Ambtc => {
            let vendor = Vendor::from_bits(header.mfg());

            match TsbkOpcode::lookup(header.direction(), vendor, header.opcode()) {
                Some(op) => Some(op),
                None => {
                    let raw = RawMessage {
                        kind: "PDU",
                        bits: header.bits().clone(),
                        vendor: header.mfg(),
                        opcode: header.opcode(),
                        valid: seq.is_valid(),
                        identifiers: header_identifiers(&header, nac),
                    };

                    return match header.direction() {
                        Direction::Outbound => Message::UnknownOutbound(raw),
                        Direction::Inbound => Message::UnknownInbound(raw),
                    };
                },
            }
        },
        _ => None,
    };

    Message::Pdu(PduMessage {
        header,
        sequence: seq,
        nac,
        ambtc,
        identifiers: OnceCell::new(),
    })
}

/// A reassembled packet.
#[derive(Clone, Debug)]
pub struct PduMessage {
    header: PduHeader,
    sequence: PduSequence,
    nac: u16,
    ambtc: Option<TsbkOpcode>,
    identifiers: OnceCell<Vec<Identifier>>,
}

impl PduMessage {
    pub fn header(&self) -> &PduHeader { &self.header }

    pub fn sequence(&self) -> &PduSequence { &self.sequence }

    pub fn nac(&self) -> u16 { self.nac }

    /// Kind of trunking message carried by an AMBTC packet.
    pub fn ambtc_opcode(&self) -> Option<TsbkOpcode> { self.ambtc }

    pub fn is_valid(&self) -> bool { self.sequence.is_valid() }

    pub fn user_data(&self) -> Vec<u8> { self.sequence.user_data() }

    pub fn missing_blocks(&self) -> Option<Vec<usize>> { self.sequence.missing_blocks() }

    /// Short name of the packet kind.
    pub fn label(&self) -> &'static str {
        if let Some(op) = self.ambtc {
            return op.label();
        }

        match self.header.format() {
            PduFormat::Confirmed => "CONFIRMED",
            PduFormat::Unconfirmed => "UNCONFIRMED",
            PduFormat::Response => "RESPONSE",
            PduFormat::Ambtc => "AMBTC",
            PduFormat::Unknown(_) => "UNKNOWN",
        }
    }

    pub fn identifiers(&self) -> &[Identifier] {
        self.identifiers.get_or_init(|| header_identifiers(&self.header, self.nac))
    }
}

impl fmt::Display for PduMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PDU {}", self.label())?;

        if let Some(resp) = self.header.response() {
            f.write_str(match resp.class {
                ResponseClass::Ack => " ACK",
                ResponseClass::Nack => " NACK",
                ResponseClass::SelectiveRetry => " SACK",
                ResponseClass::Reserved => " RESERVED",
            })?;
        }

        for id in self.identifiers() {
            write!(f, " {}", id)?;
        }

        write!(f, " BLOCKS:{}/{}", self.sequence.blocks().len(),
               self.sequence.expected_blocks())?;

        if let Some(missing) = self.missing_blocks() {
            write!(f, " MISSING:{:?}", missing)?;
        }

        if self.sequence.state() == PduState::Incomplete {
            f.write_str(" INCOMPLETE")?;
        }

        Ok(())
    }
}
