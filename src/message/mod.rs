//! Decoded messages and the parser that builds them from assembled frames.
//!
//! Every assembled frame has its NID corrected first, which selects how the rest of the
//! frame is decoded. Trunking frames yield a message per block, data frames yield a
//! single reassembled packet, and terminators with link control yield the decoded link
//! control word. Anything that can't be matched to a known message kind is still
//! delivered, as an unknown message carrying the raw bits.

pub mod fields;
pub mod link_control;
pub mod nid;
pub mod pdu;
pub mod tsbk;

use std::fmt;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::bit_buffer::BitBuffer;
use crate::coding::CorrectionResult;
use crate::consts::{CODING_BITS, LC_TERM_BODY_BITS, PREAMBLE_BITS, SYNC_BITS,
                    TSBK_MAX_BLOCKS};
use crate::framer::Frame;
use crate::identifier::{Identifier, IdentifierKind};
use crate::stats::{HasStats, Stats};
use crate::trunking::{BandTable, Channel, ChannelParams};

use self::link_control::LinkControl;
use self::nid::{DataUnit, NetworkId};
use self::pdu::PduMessage;
use self::tsbk::Tsbk;

/// Direction of the channel a message was received on.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by the site to subscribers.
    #[default]
    Outbound,
    /// Sent by subscribers to the site.
    Inbound,
}

/// A message that couldn't be matched to a known kind.
#[derive(Clone, Debug)]
pub struct RawMessage {
    /// Kind of block the message was found in, such as `TSBK` or `PDU`.
    pub kind: &'static str,
    pub bits: BitBuffer,
    pub vendor: u8,
    pub opcode: u8,
    pub valid: bool,
    pub identifiers: Vec<Identifier>,
}

impl fmt::Display for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} UNKNOWN VENDOR:{:02X} OPCODE:{:02X}", self.kind, self.vendor,
               self.opcode)?;

        for id in &self.identifiers {
            write!(f, " {}", id)?;
        }

        Ok(())
    }
}

/// A frame whose body isn't decoded further than its NID.
#[derive(Clone, Debug)]
pub struct DataUnitMessage {
    data_unit: DataUnit,
    bits: BitBuffer,
    fec: CorrectionResult,
    complete: bool,
    identifiers: Vec<Identifier>,
}

impl DataUnitMessage {
    pub fn new(data_unit: DataUnit, nac: u16, bits: BitBuffer, fec: CorrectionResult,
               complete: bool)
        -> DataUnitMessage
    {
        DataUnitMessage {
            data_unit,
            bits,
            fec,
            complete,
            identifiers: vec![Identifier::nac(nac)],
        }
    }

    pub fn data_unit(&self) -> DataUnit { self.data_unit }

    /// Frame bits, including sync and NID.
    pub fn bits(&self) -> &BitBuffer { &self.bits }

    pub fn is_valid(&self) -> bool { self.fec.is_ok() && self.complete }
}

impl fmt::Display for DataUnitMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.data_unit.abbrev())?;

        for id in &self.identifiers {
            write!(f, " {}", id)?;
        }

        if !self.complete {
            f.write_str(" INCOMPLETE")?;
        }

        Ok(())
    }
}

/// A decoded message.
#[derive(Clone, Debug)]
pub enum Message {
    Tsbk(Tsbk),
    LinkControl(LinkControl),
    Pdu(PduMessage),
    DataUnit(DataUnitMessage),
    UnknownInbound(RawMessage),
    UnknownOutbound(RawMessage),
}

impl Message {
    /// Whether every error check on the message passed.
    pub fn is_valid(&self) -> bool {
        match *self {
            Message::Tsbk(ref m) => m.is_valid(),
            Message::LinkControl(ref m) => m.is_valid(),
            Message::Pdu(ref m) => m.is_valid(),
            Message::DataUnit(ref m) => m.is_valid(),
            Message::UnknownInbound(ref m) | Message::UnknownOutbound(ref m) => m.valid,
        }
    }

    pub fn identifiers(&self) -> &[Identifier] {
        match *self {
            Message::Tsbk(ref m) => m.identifiers(),
            Message::LinkControl(ref m) => m.identifiers(),
            Message::Pdu(ref m) => m.identifiers(),
            Message::DataUnit(ref m) => &m.identifiers,
            Message::UnknownInbound(ref m) | Message::UnknownOutbound(ref m) =>
                &m.identifiers,
        }
    }

    pub fn protocol(&self) -> &'static str { "P25" }

    /// Short name of the message kind.
    pub fn opcode_tag(&self) -> &'static str {
        match *self {
            Message::Tsbk(ref m) => m.opcode().label(),
            Message::LinkControl(ref m) => m.opcode().label(),
            Message::Pdu(ref m) => m.label(),
            Message::DataUnit(ref m) => m.data_unit.abbrev(),
            Message::UnknownInbound(ref m) | Message::UnknownOutbound(ref m) => m.kind,
        }
    }

    /// Decoded bits the message was built from.
    pub fn bits(&self) -> &BitBuffer {
        match *self {
            Message::Tsbk(ref m) => m.bits(),
            Message::LinkControl(ref m) => m.bits(),
            Message::Pdu(ref m) => m.header().bits(),
            Message::DataUnit(ref m) => m.bits(),
            Message::UnknownInbound(ref m) | Message::UnknownOutbound(ref m) => &m.bits,
        }
    }

    /// Compute the downlink frequency of each channel identifier whose band is known.
    pub fn resolve(&self, bands: &BandTable) -> Vec<Identifier> {
        self.identifiers().iter()
            .filter(|id| id.kind == IdentifierKind::Channel)
            .filter_map(|id| {
                bands.downlink(Channel::new(id.value as u16)).map(|freq| {
                    Identifier::new(IdentifierKind::Frequency, freq, id.role)
                })
            })
            .collect()
    }

    /// Band parameters advertised by a valid band update.
    pub fn band_update(&self) -> Option<(u8, ChannelParams)> {
        match *self {
            Message::Tsbk(ref m) if m.is_valid() => m.band_update(),
            _ => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Message::Tsbk(ref m) => write!(f, "{}", m),
            Message::LinkControl(ref m) => write!(f, "{}", m),
            Message::Pdu(ref m) => write!(f, "{}", m),
            Message::DataUnit(ref m) => write!(f, "{}", m),
            Message::UnknownInbound(ref m) | Message::UnknownOutbound(ref m) =>
                write!(f, "{}", m),
        }
    }
}

/// Builds messages from assembled frames.
pub struct FrameParser {
    /// Direction of the channel being decoded.
    direction: Direction,
    stats: Stats,
}

impl FrameParser {
    pub fn new(direction: Direction) -> FrameParser {
        FrameParser {
            direction,
            stats: Stats::default(),
        }
    }

    pub fn direction(&self) -> Direction { self.direction }

    /// Decode the given frame into zero or more messages.
    pub fn parse(&mut self, frame: &Frame) -> Vec<Message> {
        use self::nid::DataUnit::*;

        self.stats.frames += 1;

        let mut bits = frame.bits.clone();

        // Frames cut off before the end of the NID carry nothing to decode.
        let (nid, res) = if bits.len() < PREAMBLE_BITS {
            (None, CorrectionResult::Failed)
        } else {
            NetworkId::correct(&mut bits, SYNC_BITS)
        };

        self.stats.bch.record(res);

        let nid = match nid {
            Some(nid) => nid,
            None => {
                debug!(?res, len = bits.len(), "unable to decode NID");
                return vec![self.invalid("NID", bits)];
            },
        };

        let nac = nid.access_code.to_bits();
        trace!(nac, data_unit = %nid.data_unit, len = bits.len(), "parsing frame");

        match nid.data_unit {
            TrunkingSignaling => match self.parse_tsbk(&bits, nac) {
                msgs if msgs.is_empty() => vec![Message::DataUnit(
                    DataUnitMessage::new(TrunkingSignaling, nac, bits, res, false))],
                msgs => msgs,
            },
            DataPacket => vec![pdu::build(pdu::reassemble(&bits, &mut self.stats), nac)],
            VoiceLCTerminator if bits.len() >= PREAMBLE_BITS + LC_TERM_BODY_BITS =>
                vec![self.parse_link_control(&bits, nac)],
            du => vec![Message::DataUnit(
                DataUnitMessage::new(du, nac, bits, res, frame.complete))],
        }
    }

    /// Wrap an unrecognized message according to the channel direction.
    fn unknown(&self, raw: RawMessage) -> Message {
        match self.direction {
            Direction::Outbound => Message::UnknownOutbound(raw),
            Direction::Inbound => Message::UnknownInbound(raw),
        }
    }

    /// Build an invalid message carrying no fields from the given undecodable bits.
    fn invalid(&self, kind: &'static str, bits: BitBuffer) -> Message {
        self.unknown(RawMessage {
            kind,
            bits,
            vendor: 0,
            opcode: 0,
            valid: false,
            identifiers: vec![],
        })
    }

    /// Decode every full block of a trunking frame.
    fn parse_tsbk(&mut self, bits: &BitBuffer, nac: u16) -> Vec<Message> {
        let mut msgs = Vec::new();
        let mut offset = PREAMBLE_BITS;

        while offset + CODING_BITS <= bits.len() && msgs.len() < TSBK_MAX_BLOCKS {
            let (block, fec, crc_ok) = tsbk::decode_block(bits, offset);
            offset += CODING_BITS;

            self.stats.trellis_half.record(fec);
            self.stats.record_crc(crc_ok);
            trace!(?fec, crc_ok, "tsbk block");

            let vendor = block.int(&fields::VENDOR) as u8;
            let opcode = block.int(&fields::OPCODE) as u8;

            let msg = match Tsbk::new(block.clone(), nac, self.direction, fec) {
                Some(t) => Message::Tsbk(t),
                None => self.unknown(RawMessage {
                    kind: "TSBK",
                    bits: block,
                    vendor,
                    opcode,
                    valid: fec.is_ok() && crc_ok,
                    identifiers: vec![Identifier::nac(nac)],
                }),
            };

            msgs.push(msg);
        }

        msgs
    }

    fn parse_link_control(&mut self, bits: &BitBuffer, nac: u16) -> Message {
        let lc = link_control::decode(bits, PREAMBLE_BITS);

        for &res in lc.golay.iter() {
            self.stats.golay.record(res);
        }

        self.stats.rs.record(lc.rs);

        if lc.rs == CorrectionResult::Failed {
            debug!(golay = ?lc.golay, "unable to correct link control");
            return self.invalid("TDULC", lc.bits);
        }

        let fec = CorrectionResult::from_errors(Some(lc.bits.corrected_bit_count()));
        trace!(?fec, "link control");

        let vendor = lc.bits.int(&fields::VENDOR) as u8;
        let opcode = lc.bits.int(&fields::LC_OPCODE) as u8;

        match LinkControl::new(lc.bits.clone(), nac, fec) {
            Some(m) => Message::LinkControl(m),
            None => self.unknown(RawMessage {
                kind: "TDULC",
                bits: lc.bits,
                vendor,
                opcode,
                valid: fec.is_ok(),
                identifiers: vec![Identifier::nac(nac)],
            }),
        }
    }
}

impl HasStats for FrameParser {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coding::{bch, trellis};
    use crate::framer::test_frames;
    use crate::identifier::Role;
    use crate::message::tsbk::{TsbkFields, TsbkOpcode};
    use crate::test_util::setup_logging;

    fn grant(last_block: bool) -> TsbkFields {
        TsbkFields {
            last_block,
            protected: false,
            opcode: 0x00,
            vendor: 0x00,
            payload: 0x00_1009_0101_123456,
        }
    }

    fn frame(bits: BitBuffer) -> Frame {
        Frame {
            bits,
            pattern: 0,
            sync_errors: 0,
            complete: true,
        }
    }

    fn tsbk_frame(blocks: &[TsbkFields]) -> Frame {
        let coded = blocks.iter().map(|b| b.encode()).collect::<Vec<_>>();
        let body = test_frames::concat(&coded.iter().collect::<Vec<_>>());

        frame(test_frames::frame(0x293, DataUnit::TrunkingSignaling, &body))
    }

    #[test]
    fn test_tsbk() {
        setup_logging();

        let unknown = TsbkFields { vendor: 0x55, ..grant(true) };
        let mut p = FrameParser::new(Direction::Outbound);
        let msgs = p.parse(&tsbk_frame(&[grant(false), unknown]));

        assert_eq!(msgs.len(), 2);
        assert!(msgs.iter().all(|m| m.is_valid()));
        assert_eq!(msgs[0].opcode_tag(), "GRP_V_CH_GRANT");
        assert_eq!(msgs[0].protocol(), "P25");
        assert_eq!(msgs[0].identifiers()[2],
                   Identifier::new(IdentifierKind::Talkgroup, 0x0101, Role::To));

        match msgs[1] {
            Message::UnknownOutbound(ref raw) => {
                assert_eq!(raw.kind, "TSBK");
                assert_eq!(raw.vendor, 0x55);
                assert_eq!(raw.opcode, 0x00);
            },
            ref m => panic!("unexpected {:?}", m),
        }

        assert_eq!(msgs[1].to_string(), "TSBK UNKNOWN VENDOR:55 OPCODE:00 NAC:293");

        let stats = p.stats();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.bch.words(), 1);
        assert_eq!(stats.trellis_half.words(), 2);
        assert_eq!(stats.crc_failed, 0);
    }

    #[test]
    fn test_inbound() {
        let mut p = FrameParser::new(Direction::Inbound);
        let msgs = p.parse(&tsbk_frame(&[grant(true)]));

        match msgs[0] {
            Message::Tsbk(ref t) => assert_eq!(t.opcode(), TsbkOpcode::GroupVoiceRequest),
            ref m => panic!("unexpected {:?}", m),
        }

        let unknown = TsbkFields { opcode: 0x3F, ..grant(true) };
        let msgs = p.parse(&tsbk_frame(&[unknown]));
        assert!(matches!(msgs[0], Message::UnknownInbound(_)));
    }

    #[test]
    fn test_round_trip() {
        let mut p = FrameParser::new(Direction::Outbound);
        let first = p.parse(&tsbk_frame(&[grant(true)]));

        let mut block = [0; 12];
        block.copy_from_slice(&first[0].bits().to_bytes());
        let body = trellis::dibit::encode(&block);
        let second = p.parse(&frame(test_frames::frame(0x293, DataUnit::TrunkingSignaling,
                                                       &body)));

        assert_eq!(first[0].identifiers(), second[0].identifiers());
        assert_eq!(first[0].to_string(), second[0].to_string());
    }

    #[test]
    fn test_corrupt_tsbk() {
        let mut bits = grant(true).build();
        bits.flip(40);

        let mut block = [0; 12];
        block.copy_from_slice(&bits.to_bytes());
        let body = trellis::dibit::encode(&block);

        let mut p = FrameParser::new(Direction::Outbound);
        let msgs = p.parse(&frame(test_frames::frame(0x293, DataUnit::TrunkingSignaling,
                                                     &body)));

        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], Message::Tsbk(_)));
        assert!(!msgs[0].is_valid());
        assert_eq!(p.stats().crc_failed, 1);
    }

    #[test]
    fn test_truncated_tsbk() {
        let f = tsbk_frame(&[grant(true)]);
        let short = Frame {
            bits: f.bits.slice(0, PREAMBLE_BITS + 50),
            complete: false,
            ..f
        };

        let msgs = FrameParser::new(Direction::Outbound).parse(&short);
        assert_eq!(msgs.len(), 1);
        assert!(!msgs[0].is_valid());
        assert_eq!(msgs[0].to_string(), "TSBK NAC:293 INCOMPLETE");
    }

    #[test]
    fn test_bad_nid() {
        let mut bits = BitBuffer::new(PREAMBLE_BITS);
        bits.write(0, SYNC_BITS, crate::sync::P25_SYNC);
        // Valid codeword holding an unassigned data unit.
        bits.write(SYNC_BITS, 64, bch::encode(0x2931));

        let mut p = FrameParser::new(Direction::Inbound);
        let msgs = p.parse(&frame(bits));

        assert_eq!(msgs.len(), 1);
        assert!(!msgs[0].is_valid());
        assert!(msgs[0].identifiers().is_empty());
        assert_eq!(msgs[0].opcode_tag(), "NID");
        assert!(matches!(msgs[0], Message::UnknownInbound(_)));
    }

    #[test]
    fn test_data_unit() {
        let body = BitBuffer::new(crate::consts::TERM_BODY_BITS);
        let bits = test_frames::frame(0x123, DataUnit::VoiceSimpleTerminator, &body);

        let msgs = FrameParser::new(Direction::Outbound).parse(&frame(bits));
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].is_valid());
        assert_eq!(msgs[0].opcode_tag(), "TDU");
        assert_eq!(msgs[0].identifiers(), &[Identifier::nac(0x123)]);
        assert_eq!(msgs[0].to_string(), "TDU NAC:123");
    }

    #[test]
    fn test_link_control() {
        let bytes = [0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x12, 0x34, 0x56];
        let mut body = link_control::encode(&bytes);
        body.flip(3);

        let bits = test_frames::frame(0x293, DataUnit::VoiceLCTerminator, &body);
        let mut p = FrameParser::new(Direction::Outbound);
        let msgs = p.parse(&frame(bits));

        match msgs[0] {
            Message::LinkControl(ref lc) => {
                assert!(lc.is_valid());
                assert_eq!(lc.fec(), CorrectionResult::Corrected(1));
            },
            ref m => panic!("unexpected {:?}", m),
        }

        assert_eq!(msgs[0].opcode_tag(), "LC_GRP_V_CH_USR");

        let stats = p.stats();
        assert_eq!(stats.golay.words(), 12);
        assert_eq!(stats.golay.corrected(), 1);
        assert_eq!(stats.rs.words(), 1);
    }

    #[test]
    fn test_short_frame() {
        let mut bits = BitBuffer::new(SYNC_BITS + 20);
        bits.write(0, SYNC_BITS, crate::sync::P25_SYNC);

        let mut p = FrameParser::new(Direction::Outbound);
        let msgs = p.parse(&Frame { complete: false, ..frame(bits) });

        assert_eq!(msgs.len(), 1);
        assert!(!msgs[0].is_valid());
        assert!(msgs[0].identifiers().is_empty());
        assert_eq!(msgs[0].opcode_tag(), "NID");
        assert_eq!(p.stats().bch.failed(), 1);
    }

    #[test]
    fn test_uncorrectable_link_control() {
        let bytes = [0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x12, 0x34, 0x56];
        let mut body = link_control::encode(&bytes);

        // Leave the opcode and vendor words intact but wreck the data bits of the rest.
        for word in 2..9 {
            for &bit in [0usize, 3, 6, 9].iter() {
                body.flip(word * 24 + bit);
            }
        }

        let bits = test_frames::frame(0x293, DataUnit::VoiceLCTerminator, &body);
        let mut p = FrameParser::new(Direction::Outbound);
        let msgs = p.parse(&frame(bits));

        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], Message::UnknownOutbound(_)));
        assert!(!msgs[0].is_valid());
        assert!(msgs[0].identifiers().is_empty());
        assert_eq!(msgs[0].opcode_tag(), "TDULC");

        let stats = p.stats();
        assert_eq!(stats.golay.failed(), 7);
        assert_eq!(stats.rs.failed(), 1);
    }

    #[test]
    fn test_resolve() {
        let mut bands = BandTable::new();
        let mut p = FrameParser::new(Direction::Outbound);
        let msgs = p.parse(&tsbk_frame(&[grant(true)]));

        assert!(msgs[0].resolve(&bands).is_empty());
        assert_eq!(msgs[0].band_update(), None);

        let update = TsbkFields {
            last_block: true,
            opcode: 0x3D,
            payload: 1 << 60 | 0x64 << 51 | 0b010110100 << 42 | 0x32 << 32 | 170201250,
            ..TsbkFields::default()
        };

        let (id, params) = p.parse(&tsbk_frame(&[update]))[0].band_update().unwrap();
        bands.update(id, params);

        assert_eq!(msgs[0].resolve(&bands), vec![
            Identifier::new(IdentifierKind::Frequency, 851_062_500, Role::Any),
        ]);
    }
}
