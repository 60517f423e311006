//! Link control words carried by terminators.
//!
//! The 72-bit word is split into 12 hexbits, protected by the (24, 12, 13) RS code, and
//! each pair of the resulting 24 hexbits is protected by an extended Golay word.

use std::cell::OnceCell;
use std::fmt;

use crate::bit_buffer::BitBuffer;
use crate::coding::{golay, reed_solomon, CorrectionResult};
use crate::consts::{LC_TERM_BODY_BITS, LC_TERM_WORDS, LINK_CONTROL_BYTES};
use crate::identifier::Identifier;
use crate::message::fields::{self, IdField, LC_GROUP_VOICE, LC_UNIT_VOICE};
use crate::message::tsbk::Vendor;

/// Number of bits in a decoded link control word.
pub const LC_BITS: usize = LINK_CONTROL_BYTES * 8;

/// Number of hexbits after RS coding.
const HEXBITS: usize = 24;

/// Kind of link control word.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LinkControlOpcode {
    GroupVoiceUser,
    UnitVoiceUser,
}

impl LinkControlOpcode {
    /// Find the kind of a standard link control word with the given 6-bit opcode.
    pub fn from_bits(bits: u8) -> Option<LinkControlOpcode> {
        match bits {
            0x00 => Some(LinkControlOpcode::GroupVoiceUser),
            0x03 => Some(LinkControlOpcode::UnitVoiceUser),
            _ => None,
        }
    }

    pub fn to_bits(self) -> u8 {
        match self {
            LinkControlOpcode::GroupVoiceUser => 0x00,
            LinkControlOpcode::UnitVoiceUser => 0x03,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LinkControlOpcode::GroupVoiceUser => "LC_GRP_V_CH_USR",
            LinkControlOpcode::UnitVoiceUser => "LC_UU_V_CH_USR",
        }
    }

    pub fn fields(self) -> &'static [IdField] {
        match self {
            LinkControlOpcode::GroupVoiceUser => LC_GROUP_VOICE,
            LinkControlOpcode::UnitVoiceUser => LC_UNIT_VOICE,
        }
    }
}

/// Outcome of decoding the coded link control word of a terminator.
#[derive(Clone, Debug)]
pub struct DecodedLinkControl {
    /// The 72 recovered bits.
    pub bits: BitBuffer,
    /// Result for each Golay word.
    pub golay: [CorrectionResult; LC_TERM_WORDS],
    /// Result of the RS pass, which decides whether the word is usable.
    pub rs: CorrectionResult,
}

/// Code the given link control word into the 288 bits sent in a terminator.
pub fn encode(bytes: &[u8; LINK_CONTROL_BYTES]) -> BitBuffer {
    let data = BitBuffer::from_bytes(bytes);
    let mut hexbits = [0; HEXBITS / 2];

    for (i, h) in hexbits.iter_mut().enumerate() {
        *h = data.read(i * 6, 6) as u8;
    }

    let word = reed_solomon::encode(&hexbits);
    let mut out = BitBuffer::new(LC_TERM_BODY_BITS);

    for (i, pair) in word.chunks(2).enumerate() {
        let data = (pair[0] as u16) << 6 | pair[1] as u16;
        out.write(i * 24, 24, golay::extended::encode(data) as u64);
    }

    out
}

/// Decode the coded link control word starting at the given bit offset.
///
/// Golay words that can't be corrected contribute their raw data bits, leaving the RS
/// pass to repair them.
pub fn decode(buf: &BitBuffer, offset: usize) -> DecodedLinkControl {
    let mut data = BitBuffer::new(HEXBITS * 6);
    let mut results = [CorrectionResult::Passed; LC_TERM_WORDS];

    for (i, res) in results.iter_mut().enumerate() {
        let word = buf.read(offset + i * 24, 24) as u32;

        let bits = match golay::extended::decode(word) {
            Some((bits, err)) => {
                data.record_corrections(err);
                *res = CorrectionResult::from_errors(Some(err));
                bits
            },
            None => {
                *res = CorrectionResult::Failed;
                (word >> 12) as u16
            },
        };

        data.write(i * 12, 12, bits as u64);
    }

    let rs = reed_solomon::correct(&mut data, 0);

    let mut bits = data.slice(0, LC_BITS);
    bits.record_corrections(data.corrected_bit_count());

    DecodedLinkControl { bits, golay: results, rs }
}

/// A decoded link control word.
#[derive(Clone, Debug)]
pub struct LinkControl {
    bits: BitBuffer,
    nac: u16,
    opcode: LinkControlOpcode,
    fec: CorrectionResult,
    identifiers: OnceCell<Vec<Identifier>>,
}

impl LinkControl {
    /// Interpret the given 72 decoded bits, returning `None` for vendor or unrecognized
    /// words.
    pub fn new(bits: BitBuffer, nac: u16, fec: CorrectionResult) -> Option<LinkControl> {
        if Vendor::from_bits(bits.int(&fields::VENDOR) as u8) != Vendor::Standard {
            return None;
        }

        let opcode = LinkControlOpcode::from_bits(bits.int(&fields::LC_OPCODE) as u8)?;

        Some(LinkControl {
            bits,
            nac,
            opcode,
            fec,
            identifiers: OnceCell::new(),
        })
    }

    pub fn opcode(&self) -> LinkControlOpcode { self.opcode }

    pub fn nac(&self) -> u16 { self.nac }

    pub fn bits(&self) -> &BitBuffer { &self.bits }

    pub fn fec(&self) -> CorrectionResult { self.fec }

    pub fn protected(&self) -> bool { self.bits.int(&fields::PROTECTED) == 1 }

    pub fn is_valid(&self) -> bool { self.fec.is_ok() }

    pub fn service_options(&self) -> fields::ServiceOptions {
        fields::ServiceOptions::new(self.bits.int(&fields::LC_SERVICE_OPTIONS) as u8)
    }

    pub fn identifiers(&self) -> &[Identifier] {
        self.identifiers.get_or_init(|| {
            let mut ids = vec![Identifier::nac(self.nac)];
            fields::extract(&self.bits, self.opcode.fields(), &mut ids);
            ids
        })
    }
}

impl fmt::Display for LinkControl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TDULC {}", self.opcode.label())?;

        if self.service_options().emergency() {
            f.write_str(" EMERGENCY")?;
        }

        for id in self.identifiers() {
            write!(f, " {}", id)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::identifier::{IdentifierKind, Role};

    // Group voice user: options, talkgroup 0x0101, source 0x123456.
    const GROUP: [u8; 9] = [0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x12, 0x34, 0x56];

    // Unit to unit: emergency, target 0x00ABCD, source 0x000042.
    const UNIT: [u8; 9] = [0x03, 0x00, 0x80, 0x00, 0xAB, 0xCD, 0x00, 0x00, 0x42];

    #[test]
    fn test_opcode() {
        assert_eq!(LinkControlOpcode::from_bits(0x00),
                   Some(LinkControlOpcode::GroupVoiceUser));
        assert_eq!(LinkControlOpcode::from_bits(0x03),
                   Some(LinkControlOpcode::UnitVoiceUser));
        assert_eq!(LinkControlOpcode::from_bits(0x04), None);
        assert_eq!(LinkControlOpcode::UnitVoiceUser.to_bits(), 0x03);
    }

    #[test]
    fn test_decode() {
        let buf = encode(&GROUP);
        assert_eq!(buf.len(), LC_TERM_BODY_BITS);

        let lc = decode(&buf, 0);
        assert_eq!(lc.rs, CorrectionResult::Passed);
        assert!(lc.golay.iter().all(|&r| r == CorrectionResult::Passed));
        assert_eq!(lc.bits.to_bytes(), &GROUP[..]);
        assert_eq!(lc.bits.corrected_bit_count(), 0);
    }

    #[test]
    fn test_golay_errors() {
        let mut buf = BitBuffer::new(LC_TERM_BODY_BITS + 10);
        for (i, b) in encode(&GROUP).iter().enumerate() {
            buf.set(10 + i, b);
        }

        buf.flip(10);
        buf.flip(15);
        buf.flip(33);
        buf.flip(10 + 24 * 11 + 23);

        let lc = decode(&buf, 10);
        assert_eq!(lc.golay[0], CorrectionResult::Corrected(3));
        assert_eq!(lc.golay[11], CorrectionResult::Corrected(1));
        assert_eq!(lc.rs, CorrectionResult::Passed);
        assert_eq!(lc.bits.to_bytes(), &GROUP[..]);
        assert_eq!(lc.bits.corrected_bit_count(), 4);
    }

    #[test]
    fn test_rs_errors() {
        let mut buf = encode(&UNIT);

        // Too many errors for two of the Golay words, leaving at most 4 bad hexbits.
        for i in 0..5 {
            buf.flip(24 * 4 + i);
            buf.flip(24 * 7 + 2 * i);
        }

        let lc = decode(&buf, 0);
        assert!(lc.rs.is_ok());
        assert_eq!(lc.bits.to_bytes(), &UNIT[..]);
    }

    #[test]
    fn test_link_control() {
        let lc = LinkControl::new(BitBuffer::from_bytes(&GROUP), 0x293,
                                  CorrectionResult::Passed).unwrap();

        assert!(lc.is_valid());
        assert!(!lc.protected());
        assert_eq!(lc.opcode(), LinkControlOpcode::GroupVoiceUser);
        assert_eq!(lc.identifiers(), &[
            Identifier::nac(0x293),
            Identifier::new(IdentifierKind::Talkgroup, 0x0101, Role::To),
            Identifier::new(IdentifierKind::Radio, 0x123456, Role::From),
        ]);
        assert_eq!(lc.to_string(), "TDULC LC_GRP_V_CH_USR NAC:293 TO:TG:257 \
                                    FROM:RADIO:1193046");

        let lc = LinkControl::new(BitBuffer::from_bytes(&UNIT), 0x293,
                                  CorrectionResult::Failed).unwrap();

        assert!(!lc.is_valid());
        assert!(lc.service_options().emergency());
        assert_eq!(&lc.identifiers()[1..], &[
            Identifier::new(IdentifierKind::Radio, 0xABCD, Role::To),
            Identifier::new(IdentifierKind::Radio, 0x42, Role::From),
        ]);
        assert_eq!(lc.to_string(), "TDULC LC_UU_V_CH_USR EMERGENCY NAC:293 TO:RADIO:43981 \
                                    FROM:RADIO:66");
    }

    #[test]
    fn test_unknown() {
        let mut bytes = GROUP;
        bytes[0] = 0x0F;
        assert!(LinkControl::new(BitBuffer::from_bytes(&bytes), 0x293,
                                 CorrectionResult::Passed).is_none());

        bytes = GROUP;
        bytes[1] = 0x90;
        assert!(LinkControl::new(BitBuffer::from_bytes(&bytes), 0x293,
                                 CorrectionResult::Passed).is_none());
    }
}
