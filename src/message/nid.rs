//! The network ID that follows every frame sync: a BCH-protected NAC and DUID.

use std::fmt;

use crate::bit_buffer::BitBuffer;
use crate::coding::{bch, CorrectionResult};
use crate::consts;

/// Network access code, the 12-bit "digital squelch" at the start of every NID.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NetworkAccessCode {
    /// 0x293, the code radios ship with.
    Default,
    /// 0xF7E: a receiver opens squelch on any code. Never transmitted.
    ReceiveAny,
    /// 0xF7F: a repeater retransmits any code. Never transmitted.
    RepeatAny,
    /// Site-assigned code.
    Other(u16),
}

const NAC_DEFAULT: u16 = 0x293;
const NAC_RECEIVE_ANY: u16 = 0xF7E;
const NAC_REPEAT_ANY: u16 = 0xF7F;

impl NetworkAccessCode {
    /// Interpret the low 12 bits of the given word.
    pub fn from_bits(bits: u16) -> NetworkAccessCode {
        match bits & 0xFFF {
            NAC_DEFAULT => NetworkAccessCode::Default,
            NAC_RECEIVE_ANY => NetworkAccessCode::ReceiveAny,
            NAC_REPEAT_ANY => NetworkAccessCode::RepeatAny,
            b => NetworkAccessCode::Other(b),
        }
    }

    pub fn to_bits(self) -> u16 {
        match self {
            NetworkAccessCode::Default => NAC_DEFAULT,
            NetworkAccessCode::ReceiveAny => NAC_RECEIVE_ANY,
            NetworkAccessCode::RepeatAny => NAC_REPEAT_ANY,
            NetworkAccessCode::Other(bits) => bits & 0xFFF,
        }
    }
}

/// Kind of frame announced by the DUID field of the NID.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DataUnit {
    /// HDU, opening a voice call.
    VoiceHeader,
    /// TDU, closing a voice call.
    VoiceSimpleTerminator,
    /// TDULC, closing a voice call with a final link control word.
    VoiceLCTerminator,
    /// LDU1, voice frames carrying link control.
    VoiceLCFrameGroup,
    /// LDU2, voice frames carrying encryption sync.
    VoiceCCFrameGroup,
    /// PDU, a packet data header and its blocks.
    DataPacket,
    /// One to three trunking signalling blocks.
    TrunkingSignaling,
}

/// DUID, short name, and body length of each data unit. Trunking and data packets
/// list their first block only.
const DATA_UNITS: &[(DataUnit, u8, &str, usize)] = &[
    (DataUnit::VoiceHeader, 0x0, "HDU", consts::HEADER_BODY_BITS),
    (DataUnit::VoiceSimpleTerminator, 0x3, "TDU", consts::TERM_BODY_BITS),
    (DataUnit::VoiceLCFrameGroup, 0x5, "LDU1", consts::LDU_BODY_BITS),
    (DataUnit::TrunkingSignaling, 0x7, "TSBK", consts::CODING_BITS),
    (DataUnit::VoiceCCFrameGroup, 0xA, "LDU2", consts::LDU_BODY_BITS),
    (DataUnit::DataPacket, 0xC, "PDU", consts::CODING_BITS),
    (DataUnit::VoiceLCTerminator, 0xF, "TDULC", consts::LC_TERM_BODY_BITS),
];

impl DataUnit {
    /// Look up the data unit for the low 4 bits of the given DUID, if assigned.
    pub fn from_bits(bits: u8) -> Option<DataUnit> {
        DATA_UNITS.iter().find(|e| e.1 == bits & 0xF).map(|e| e.0)
    }

    fn entry(self) -> &'static (DataUnit, u8, &'static str, usize) {
        // Every variant has a row.
        DATA_UNITS.iter().find(|e| e.0 == self).unwrap_or(&DATA_UNITS[0])
    }

    /// 4-bit DUID.
    pub fn to_bits(self) -> u8 { self.entry().1 }

    /// Number of bits following the NID, with status symbols removed.
    pub fn body_bits(self) -> usize { self.entry().3 }

    pub fn abbrev(self) -> &'static str { self.entry().2 }
}

impl fmt::Display for DataUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

/// The 16 data bits of a network ID codeword.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NetworkId {
    pub access_code: NetworkAccessCode,
    pub data_unit: DataUnit,
}

impl NetworkId {
    pub fn new(access_code: NetworkAccessCode, data_unit: DataUnit) -> NetworkId {
        NetworkId { access_code, data_unit }
    }

    /// Split a 16-bit word into its NAC and DUID, failing on an unassigned DUID.
    pub fn from_bits(bits: u16) -> Option<NetworkId> {
        let data_unit = DataUnit::from_bits(bits as u8 & 0xF)?;
        Some(NetworkId::new(NetworkAccessCode::from_bits(bits >> 4), data_unit))
    }

    pub fn to_bits(&self) -> u16 {
        self.access_code.to_bits() << 4 | self.data_unit.to_bits() as u16
    }

    /// BCH codeword with the trailing parity bit.
    pub fn encode(&self) -> u64 { bch::encode(self.to_bits()) }

    /// Decode the NID codeword at the given offset without modifying the buffer.
    pub fn peek(buf: &BitBuffer, offset: usize) -> Option<NetworkId> {
        bch::decode(buf.read(offset, bch::WORD_BITS))
            .and_then(|(data, _)| NetworkId::from_bits(data))
    }

    /// Correct the NID codeword at the given offset in place and parse it.
    pub fn correct(buf: &mut BitBuffer, offset: usize)
        -> (Option<NetworkId>, CorrectionResult)
    {
        let res = bch::correct(buf, offset);

        let nid = if res.is_ok() {
            NetworkId::from_bits(buf.read(offset, bch::DATA_BITS) as u16)
        } else {
            None
        };

        (nid, res)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_nac() {
        assert_eq!(NetworkAccessCode::from_bits(0x293), NetworkAccessCode::Default);
        assert_eq!(NetworkAccessCode::from_bits(0xF7E), NetworkAccessCode::ReceiveAny);
        assert_eq!(NetworkAccessCode::from_bits(0xF7F), NetworkAccessCode::RepeatAny);
        assert_eq!(NetworkAccessCode::from_bits(0x123), NetworkAccessCode::Other(0x123));
        assert_eq!(NetworkAccessCode::Other(0x123).to_bits(), 0x123);
        assert_eq!(NetworkAccessCode::Default.to_bits(), 0x293);
    }

    #[test]
    fn test_data_unit() {
        let assigned = (0..16).filter_map(|b| {
            DataUnit::from_bits(b).map(|du| (du, b))
        }).collect::<Vec<_>>();

        assert_eq!(assigned.len(), 7);

        for (du, b) in assigned {
            assert_eq!(du.to_bits(), b);
        }

        assert_eq!(DataUnit::from_bits(0x17), Some(DataUnit::TrunkingSignaling));
        assert_eq!(DataUnit::VoiceCCFrameGroup.abbrev(), "LDU2");

        assert_eq!(DataUnit::from_bits(0b0001), None);
        assert_eq!(DataUnit::VoiceLCTerminator.body_bits(), 288);
        assert_eq!(DataUnit::TrunkingSignaling.body_bits(), 196);
        assert_eq!(DataUnit::DataPacket.to_string(), "PDU");
    }

    #[test]
    fn test_nid() {
        let nid = NetworkId::new(NetworkAccessCode::Other(0x5A5),
                                 DataUnit::TrunkingSignaling);
        assert_eq!(nid.to_bits(), 0x5A57);
        assert_eq!(NetworkId::from_bits(0x5A57), Some(nid));
        assert_eq!(NetworkId::from_bits(0x5A51), None);

        let mut buf = BitBuffer::new(80);
        buf.write(8, 64, nid.encode());
        assert_eq!(NetworkId::peek(&buf, 8), Some(nid));

        for &i in &[8, 20, 33, 50, 70] {
            buf.flip(i);
        }

        assert_eq!(NetworkId::peek(&buf, 8), Some(nid));

        let (parsed, res) = NetworkId::correct(&mut buf, 8);
        assert_eq!(parsed, Some(nid));
        assert_eq!(res, CorrectionResult::Corrected(5));
        assert_eq!(buf.read(8, 16), 0x5A57);
        // Only the two flipped data bits were rewritten.
        assert_eq!(buf.corrected_bit_count(), 2);
    }
}
