//! PDU header blocks.
//!
//! A header is a 12-octet block, carried in a half-rate trellis block, with several
//! fields followed by a 16-bit CRC over those fields. Response packets reuse the same
//! block with a different interpretation of the SAP and address octets.

use crate::bit_buffer::{BitBuffer, FieldSpec};
use crate::data::crc::{self, Crc};
use crate::message::Direction;

/// Number of bits in a header block, including the CRC.
pub const HEADER_BITS: usize = 96;

/// Number of bits covered by the header CRC.
const CRC_COVERAGE: usize = 80;

const CONFIRMED: FieldSpec = FieldSpec::range(1, 1);
const OUTBOUND: FieldSpec = FieldSpec::range(2, 1);
const FORMAT: FieldSpec = FieldSpec::range(3, 5);
const SAP: FieldSpec = FieldSpec::range(10, 6);
const RESPONSE_CLASS: FieldSpec = FieldSpec::range(8, 2);
const RESPONSE_TYPE: FieldSpec = FieldSpec::range(10, 3);
const RESPONSE_STATUS: FieldSpec = FieldSpec::range(13, 3);
const MFG: FieldSpec = FieldSpec::range(16, 8);
const LLID: FieldSpec = FieldSpec::range(24, 24);
const FULL_MESSAGE: FieldSpec = FieldSpec::range(48, 1);
const SOURCE_ABSENT: FieldSpec = FieldSpec::range(48, 1);
const BLOCKS_TO_FOLLOW: FieldSpec = FieldSpec::range(49, 7);
const AMBTC_OPCODE: FieldSpec = FieldSpec::range(58, 6);
const PAD_OCTETS: FieldSpec = FieldSpec::range(59, 5);
const RESYNC: FieldSpec = FieldSpec::range(64, 1);
const PACKET_SEQ: FieldSpec = FieldSpec::range(65, 3);
const FRAGMENT_SEQ: FieldSpec = FieldSpec::range(68, 4);
const DATA_OFFSET: FieldSpec = FieldSpec::range(74, 6);
const SOURCE_LLID: FieldSpec = FieldSpec::range(56, 24);

/// Type of a data packet.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PduFormat {
    /// Confirmed data delivery, with 3/4-rate data blocks.
    Confirmed,
    /// Unconfirmed data delivery, with 1/2-rate data blocks.
    Unconfirmed,
    /// Response to a confirmed packet.
    Response,
    /// Alternate multi-block trunking control.
    Ambtc,
    /// Unrecognized format bits.
    Unknown(u8),
}

impl PduFormat {
    /// Parse a packet type from the given 5 bits.
    pub fn from_bits(bits: u8) -> PduFormat {
        use self::PduFormat::*;

        match bits & 0x1F {
            0b10110 => Confirmed,
            0b10101 => Unconfirmed,
            0b00011 => Response,
            0b10111 => Ambtc,
            b => Unknown(b),
        }
    }

    /// Convert a symbolic type to its associated identifier.
    pub fn to_bits(self) -> u8 {
        use self::PduFormat::*;

        match self {
            Confirmed => 0b10110,
            Unconfirmed => 0b10101,
            Response => 0b00011,
            Ambtc => 0b10111,
            Unknown(b) => b & 0x1F,
        }
    }

    /// Check if data blocks following the header use the 3/4-rate code.
    pub fn three_quarter_rate(self) -> bool { self == PduFormat::Confirmed }
}

/// Service access point (SAP) identifying the consumer of a packet.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ServiceAccessPoint {
    UnencryptedUserData,
    EncryptedUserData,
    CircuitData,
    CircuitDataControl,
    PacketData,
    AddressResolution,
    SndcpControl,
    ExtendedAddressing,
    RegistrationAuth,
    ChannelReassignment,
    SystemConfiguration,
    Loopback,
    Statistics,
    OutOfService,
    Paging,
    Configuration,
    UnencryptedKeyManagement,
    EncryptedKeyManagement,
    TrunkingControl,
    EncryptedTrunkingControl,
    Unknown(u8),
}

impl ServiceAccessPoint {
    /// Parse a SAP from the given 6 bits.
    pub fn from_bits(bits: u8) -> ServiceAccessPoint {
        use self::ServiceAccessPoint::*;

        match bits & 0x3F {
            0x00 => UnencryptedUserData,
            0x01 => EncryptedUserData,
            0x02 => CircuitData,
            0x03 => CircuitDataControl,
            0x04 => PacketData,
            0x05 => AddressResolution,
            0x06 => SndcpControl,
            0x1F => ExtendedAddressing,
            0x20 => RegistrationAuth,
            0x21 => ChannelReassignment,
            0x22 => SystemConfiguration,
            0x23 => Loopback,
            0x24 => Statistics,
            0x25 => OutOfService,
            0x26 => Paging,
            0x27 => Configuration,
            0x28 => UnencryptedKeyManagement,
            0x29 => EncryptedKeyManagement,
            0x3D => TrunkingControl,
            0x3F => EncryptedTrunkingControl,
            b => Unknown(b),
        }
    }

    /// Convert the SAP to its 6-bit identifier.
    pub fn to_bits(self) -> u8 {
        use self::ServiceAccessPoint::*;

        match self {
            UnencryptedUserData => 0x00,
            EncryptedUserData => 0x01,
            CircuitData => 0x02,
            CircuitDataControl => 0x03,
            PacketData => 0x04,
            AddressResolution => 0x05,
            SndcpControl => 0x06,
            ExtendedAddressing => 0x1F,
            RegistrationAuth => 0x20,
            ChannelReassignment => 0x21,
            SystemConfiguration => 0x22,
            Loopback => 0x23,
            Statistics => 0x24,
            OutOfService => 0x25,
            Paging => 0x26,
            Configuration => 0x27,
            UnencryptedKeyManagement => 0x28,
            EncryptedKeyManagement => 0x29,
            TrunkingControl => 0x3D,
            EncryptedTrunkingControl => 0x3F,
            Unknown(b) => b & 0x3F,
        }
    }
}

/// Class of a response packet.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ResponseClass {
    /// All blocks were received.
    Ack,
    /// The packet was rejected.
    Nack,
    /// Some blocks must be retried, listed in a following missing-block bitmap.
    SelectiveRetry,
    Reserved,
}

impl ResponseClass {
    /// Parse a response class from the given 2 bits.
    pub fn from_bits(bits: u8) -> ResponseClass {
        use self::ResponseClass::*;

        match bits & 0b11 {
            0b00 => Ack,
            0b01 => Nack,
            0b10 => SelectiveRetry,
            _ => Reserved,
        }
    }

    /// Convert the class to its 2-bit identifier.
    pub fn to_bits(self) -> u8 {
        use self::ResponseClass::*;

        match self {
            Ack => 0b00,
            Nack => 0b01,
            SelectiveRetry => 0b10,
            Reserved => 0b11,
        }
    }
}

/// Fields specific to a response packet header.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ResponseHeader {
    pub class: ResponseClass,
    /// Class-specific response type.
    pub kind: u8,
    /// Sequence number of the packet being responded to.
    pub status: u8,
    /// Address of the radio the response is directed at.
    pub target: u32,
    /// Address of the radio sending the response, if present.
    pub source: Option<u32>,
}

/// Received header block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PduHeader {
    bits: BitBuffer,
    crc_ok: bool,
}

impl PduHeader {
    /// Wrap the given decoded header block, verifying its CRC.
    pub fn new(bits: BitBuffer) -> PduHeader {
        let crc_ok = bits.len() >= HEADER_BITS &&
            crc::check(crc::CRC16, &bits, 0, CRC_COVERAGE, CRC_COVERAGE);

        PduHeader { bits, crc_ok }
    }

    /// Check if the header CRC matched.
    pub fn is_valid(&self) -> bool { self.crc_ok }

    /// Underlying header bits.
    pub fn bits(&self) -> &BitBuffer { &self.bits }

    /// Whether the packet requires confirmation.
    pub fn confirmed(&self) -> bool { self.bits.int(&CONFIRMED) == 1 }

    pub fn direction(&self) -> Direction {
        if self.bits.int(&OUTBOUND) == 1 {
            Direction::Outbound
        } else {
            Direction::Inbound
        }
    }

    pub fn format(&self) -> PduFormat {
        PduFormat::from_bits(self.bits.int(&FORMAT) as u8)
    }

    pub fn sap(&self) -> ServiceAccessPoint {
        ServiceAccessPoint::from_bits(self.bits.int(&SAP) as u8)
    }

    /// Manufacturer ID, with 0x00 and 0x01 standard.
    pub fn mfg(&self) -> u8 { self.bits.int(&MFG) as u8 }

    /// Logical link ID of the addressed radio.
    pub fn llid(&self) -> u32 { self.bits.int(&LLID) as u32 }

    /// Whether the packet is complete rather than a selective retransmission.
    pub fn full_message(&self) -> bool { self.bits.int(&FULL_MESSAGE) == 1 }

    /// Number of data blocks following the header.
    pub fn blocks_to_follow(&self) -> usize { self.bits.int(&BLOCKS_TO_FOLLOW) as usize }

    /// Number of pad octets at the end of the data.
    pub fn pad_octets(&self) -> usize { self.bits.int(&PAD_OCTETS) as usize }

    /// Trunking opcode carried by an AMBTC header.
    pub fn opcode(&self) -> u8 { self.bits.int(&AMBTC_OPCODE) as u8 }

    /// Whether the receiver should resynchronize its sequence numbers.
    pub fn resync(&self) -> bool { self.bits.int(&RESYNC) == 1 }

    pub fn packet_seq(&self) -> u8 { self.bits.int(&PACKET_SEQ) as u8 }

    pub fn fragment_seq(&self) -> u8 { self.bits.int(&FRAGMENT_SEQ) as u8 }

    /// Octet offset where the data header stops and user data begins.
    pub fn data_offset(&self) -> usize { self.bits.int(&DATA_OFFSET) as usize }

    /// Response fields, if this is a response packet header.
    pub fn response(&self) -> Option<ResponseHeader> {
        if self.format() != PduFormat::Response {
            return None;
        }

        Some(ResponseHeader {
            class: ResponseClass::from_bits(self.bits.int(&RESPONSE_CLASS) as u8),
            kind: self.bits.int(&RESPONSE_TYPE) as u8,
            status: self.bits.int(&RESPONSE_STATUS) as u8,
            target: self.llid(),
            source: if self.bits.int(&SOURCE_ABSENT) == 1 {
                None
            } else {
                Some(self.bits.int(&SOURCE_LLID) as u32)
            },
        })
    }
}

/// User-filled header fields, used to build a header block.
#[derive(Copy, Clone, Debug)]
pub struct HeaderFields {
    pub confirmed: bool,
    pub direction: Direction,
    pub format: PduFormat,
    pub sap: ServiceAccessPoint,
    pub mfg: u8,
    pub llid: u32,
    pub full_message: bool,
    pub blocks_to_follow: u8,
    /// Pad octet count, or the opcode for AMBTC headers.
    pub pads_or_opcode: u8,
    pub packet_seq: u8,
    pub data_offset: u8,
    /// Replaces the SAP and source fields for response headers.
    pub response: Option<ResponseHeader>,
}

impl HeaderFields {
    /// Write the fields into a header block, followed by the CRC.
    pub fn build(&self) -> PduHeader {
        let mut bits = BitBuffer::new(HEADER_BITS);

        bits.write(1, 1, self.confirmed as u64);
        bits.write(2, 1, (self.direction == Direction::Outbound) as u64);
        bits.write(3, 5, self.format.to_bits() as u64);
        bits.write(16, 8, self.mfg as u64);
        bits.write(49, 7, self.blocks_to_follow as u64 & 0x7F);
        bits.write(65, 3, self.packet_seq as u64 & 0x7);
        bits.write(74, 6, self.data_offset as u64 & 0x3F);

        match self.response {
            Some(resp) => {
                bits.write(8, 2, resp.class.to_bits() as u64);
                bits.write(10, 3, resp.kind as u64 & 0x7);
                bits.write(13, 3, resp.status as u64 & 0x7);
                bits.write(24, 24, resp.target as u64 & 0xFF_FFFF);

                match resp.source {
                    Some(src) => bits.write(56, 24, src as u64 & 0xFF_FFFF),
                    None => bits.write(48, 1, 1),
                }
            },
            None => {
                bits.write(8, 2, 0b11);
                bits.write(10, 6, self.sap.to_bits() as u64);
                bits.write(24, 24, self.llid as u64 & 0xFF_FFFF);
                bits.write(48, 1, self.full_message as u64);

                if self.format == PduFormat::Ambtc {
                    bits.write(58, 6, self.pads_or_opcode as u64 & 0x3F);
                } else {
                    bits.write(59, 5, self.pads_or_opcode as u64 & 0x1F);
                }
            },
        }

        let crc = Crc::new(crc::CRC16).feed_buffer(&bits, 0, CRC_COVERAGE).finish();
        bits.write(CRC_COVERAGE, 16, crc);

        PduHeader::new(bits)
    }
}

impl Default for HeaderFields {
    fn default() -> Self {
        HeaderFields {
            confirmed: false,
            direction: Direction::Outbound,
            format: PduFormat::Unconfirmed,
            sap: ServiceAccessPoint::PacketData,
            mfg: 0,
            llid: 0,
            full_message: true,
            blocks_to_follow: 0,
            pads_or_opcode: 0,
            packet_seq: 0,
            data_offset: 0,
            response: None,
        }
    }
}
