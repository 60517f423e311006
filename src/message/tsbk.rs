//! Trunking signalling blocks.
//!
//! A TSBK is a 12-octet block carried in a half-rate trellis block. Its first two
//! octets hold the last-block flag, protected flag, 6-bit opcode, and vendor ID, then
//! come 8 octets of payload and a 16-bit CRC. The payload layout depends on the
//! direction of the channel, the vendor, and the opcode together, so all three key the
//! dispatch table below.

use std::cell::OnceCell;
use std::fmt;

use crate::bit_buffer::BitBuffer;
use crate::coding::{trellis, CorrectionResult};
use crate::consts::TSBK_BYTES;
use crate::data::crc::{self, Crc};
use crate::identifier::Identifier;
use crate::message::fields::{self, IdField, AFFILIATION_RESPONSE, DATA_GRANT, DEREGISTRATION,
                             GROUP_GRANT, GROUP_SOURCE, GROUP_UPDATE, GROUP_UPDATE_EXPLICIT,
                             LOCATION_RESPONSE, NETWORK_STATUS, NO_FIELDS, PATCH_GRANT,
                             PATCH_GROUP, PHONE_GRANT, REGISTRATION_RESPONSE,
                             SECONDARY_CONTROL, SECONDARY_CONTROL_EXPLICIT, SITE_STATUS,
                             SOURCE, TARGET, TARGET_SOURCE, UNIT_GRANT};
use crate::message::Direction;
use crate::trunking::ChannelParams;

use self::TsbkOpcode as Op;

/// Number of bits in a decoded TSBK.
pub const TSBK_BITS: usize = 96;

/// Manufacturer that defined an opcode.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Vendor {
    /// Opcodes defined by the standard.
    Standard,
    Motorola,
    Harris,
    Other(u8),
}

impl Vendor {
    pub fn from_bits(bits: u8) -> Vendor {
        match bits {
            0x00 | 0x01 => Vendor::Standard,
            0x90 => Vendor::Motorola,
            0xA4 => Vendor::Harris,
            b => Vendor::Other(b),
        }
    }

    pub fn to_bits(self) -> u8 {
        match self {
            Vendor::Standard => 0x00,
            Vendor::Motorola => 0x90,
            Vendor::Harris => 0xA4,
            Vendor::Other(b) => b,
        }
    }
}

/// Kind of trunking message.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TsbkOpcode {
    GroupVoiceGrant,
    GroupVoiceGrantUpdate,
    GroupVoiceGrantUpdateExplicit,
    UnitVoiceGrant,
    UnitAnswerRequest,
    UnitVoiceGrantUpdate,
    PhoneGrant,
    PhoneGrantUpdate,
    PhoneAnswerRequest,
    IndividualDataGrant,
    GroupDataGrant,
    GroupDataAnnouncement,
    GroupDataAnnouncementExplicit,
    SndcpDataGrant,
    SndcpPageRequest,
    SndcpAnnouncementExplicit,
    StatusUpdate,
    StatusQuery,
    MessageUpdate,
    RadioMonitorCommand,
    CallAlert,
    AckResponse,
    QueuedResponse,
    ExtendedFunctionCommand,
    DenyResponse,
    GroupAffiliationResponse,
    SecondaryControlExplicit,
    GroupAffiliationQuery,
    LocationRegistrationResponse,
    UnitRegistrationResponse,
    UnitRegistrationCommand,
    AuthenticationCommand,
    DeregistrationAck,
    TdmaSync,
    AuthenticationDemand,
    AuthenticationFneResponse,
    IdentifierUpdateTdma,
    IdentifierUpdateVhfUhf,
    TimeDateAnnouncement,
    RoamingAddressCommand,
    RoamingAddressUpdate,
    SystemServiceBroadcast,
    SecondaryControlBroadcast,
    RfssStatusBroadcast,
    NetworkStatusBroadcast,
    AdjacentSiteBroadcast,
    IdentifierUpdate,
    ProtectionParameterBroadcast,
    ProtectionParameterUpdate,

    GroupVoiceRequest,
    UnitVoiceRequest,
    UnitAnswerResponse,
    PhoneDialRequest,
    PhonePstnRequest,
    PhoneAnswerResponse,
    IndividualDataRequest,
    GroupDataRequest,
    SndcpDataRequest,
    SndcpPageResponse,
    SndcpReconnectRequest,
    StatusUpdateRequest,
    StatusQueryResponse,
    StatusQueryRequest,
    MessageUpdateRequest,
    RadioMonitorRequest,
    CallAlertRequest,
    UnitAckResponse,
    CancelServiceRequest,
    ExtendedFunctionResponse,
    EmergencyAlarmRequest,
    GroupAffiliationRequest,
    GroupAffiliationQueryResponse,
    UnitDeregistrationRequest,
    UnitRegistrationRequest,
    LocationRegistrationRequest,
    AuthenticationQuery,
    AuthenticationResponseObsolete,
    ProtectionParameterRequest,
    IdentifierUpdateRequest,
    RoamingAddressRequest,
    RoamingAddressResponse,
    AuthenticationResponse,
    AuthenticationResponseMutual,
    AuthenticationFneResult,
    AuthenticationSuDemand,

    MotorolaPatchGroupAdd,
    MotorolaPatchGroupDelete,
    MotorolaPatchGroupGrant,
    MotorolaPatchGroupGrantUpdate,
    MotorolaTrafficChannel,
    MotorolaDenyResponse,
    MotorolaSystemLoading,
    MotorolaBaseStationId,
    MotorolaPlannedShutdown,

    HarrisTdmaSync,
}

/// One row of the dispatch table.
struct Entry {
    direction: Direction,
    vendor: Vendor,
    code: u8,
    opcode: TsbkOpcode,
    label: &'static str,
    fields: &'static [IdField],
}

const fn osp(code: u8, opcode: TsbkOpcode, label: &'static str, fields: &'static [IdField])
    -> Entry
{
    Entry { direction: Direction::Outbound, vendor: Vendor::Standard, code, opcode, label,
            fields }
}

const fn isp(code: u8, opcode: TsbkOpcode, label: &'static str, fields: &'static [IdField])
    -> Entry
{
    Entry { direction: Direction::Inbound, vendor: Vendor::Standard, code, opcode, label,
            fields }
}

const fn vendor_osp(vendor: Vendor, code: u8, opcode: TsbkOpcode, label: &'static str,
                    fields: &'static [IdField]) -> Entry
{
    Entry { direction: Direction::Outbound, vendor, code, opcode, label, fields }
}

const OPCODES: &[Entry] = &[
    osp(0x00, Op::GroupVoiceGrant, "GRP_V_CH_GRANT", GROUP_GRANT),
    osp(0x02, Op::GroupVoiceGrantUpdate, "GRP_V_CH_GRANT_UPDT", GROUP_UPDATE),
    osp(0x03, Op::GroupVoiceGrantUpdateExplicit, "GRP_V_CH_GRANT_UPDT_EXP",
        GROUP_UPDATE_EXPLICIT),
    osp(0x04, Op::UnitVoiceGrant, "UU_V_CH_GRANT", UNIT_GRANT),
    osp(0x05, Op::UnitAnswerRequest, "UU_ANS_REQ", TARGET_SOURCE),
    osp(0x06, Op::UnitVoiceGrantUpdate, "UU_V_CH_GRANT_UPDT", UNIT_GRANT),
    osp(0x08, Op::PhoneGrant, "TELE_INT_CH_GRANT", PHONE_GRANT),
    osp(0x09, Op::PhoneGrantUpdate, "TELE_INT_CH_GRANT_UPDT", PHONE_GRANT),
    osp(0x0A, Op::PhoneAnswerRequest, "TELE_INT_ANS_REQ", TARGET),
    osp(0x10, Op::IndividualDataGrant, "IND_D_CH_GRANT", NO_FIELDS),
    osp(0x11, Op::GroupDataGrant, "GRP_D_CH_GRANT", NO_FIELDS),
    osp(0x12, Op::GroupDataAnnouncement, "GRP_D_CH_ANN", NO_FIELDS),
    osp(0x13, Op::GroupDataAnnouncementExplicit, "GRP_D_CH_ANN_EXP", NO_FIELDS),
    osp(0x14, Op::SndcpDataGrant, "SN_D_CH_GRANT", DATA_GRANT),
    osp(0x15, Op::SndcpPageRequest, "SN_D_PAGE_REQ", TARGET),
    osp(0x16, Op::SndcpAnnouncementExplicit, "SN_D_CH_ANN_EXP", NO_FIELDS),
    osp(0x18, Op::StatusUpdate, "STS_UPDT", TARGET_SOURCE),
    osp(0x1A, Op::StatusQuery, "STS_Q", TARGET_SOURCE),
    osp(0x1C, Op::MessageUpdate, "MSG_UPDT", TARGET_SOURCE),
    osp(0x1D, Op::RadioMonitorCommand, "RAD_MON_CMD", TARGET_SOURCE),
    osp(0x1F, Op::CallAlert, "CALL_ALRT", TARGET_SOURCE),
    osp(0x20, Op::AckResponse, "ACK_RSP_FNE", TARGET_SOURCE),
    osp(0x21, Op::QueuedResponse, "QUE_RSP", TARGET),
    osp(0x24, Op::ExtendedFunctionCommand, "EXT_FNCT_CMD", TARGET),
    osp(0x27, Op::DenyResponse, "DENY_RSP", TARGET),
    osp(0x28, Op::GroupAffiliationResponse, "GRP_AFF_RSP", AFFILIATION_RESPONSE),
    osp(0x29, Op::SecondaryControlExplicit, "SCCB_EXP", SECONDARY_CONTROL_EXPLICIT),
    osp(0x2A, Op::GroupAffiliationQuery, "GRP_AFF_Q", TARGET_SOURCE),
    osp(0x2B, Op::LocationRegistrationResponse, "LOC_REG_RSP", LOCATION_RESPONSE),
    osp(0x2C, Op::UnitRegistrationResponse, "U_REG_RSP", REGISTRATION_RESPONSE),
    osp(0x2D, Op::UnitRegistrationCommand, "U_REG_CMD", TARGET_SOURCE),
    osp(0x2E, Op::AuthenticationCommand, "AUTH_CMD", TARGET),
    osp(0x2F, Op::DeregistrationAck, "U_DE_REG_ACK", DEREGISTRATION),
    osp(0x30, Op::TdmaSync, "SYNC_BCST", NO_FIELDS),
    osp(0x31, Op::AuthenticationDemand, "AUTH_DMD", TARGET),
    osp(0x32, Op::AuthenticationFneResponse, "AUTH_FNE_RESP", TARGET),
    osp(0x33, Op::IdentifierUpdateTdma, "IDEN_UP_TDMA", NO_FIELDS),
    osp(0x34, Op::IdentifierUpdateVhfUhf, "IDEN_UP_VU", NO_FIELDS),
    osp(0x35, Op::TimeDateAnnouncement, "TIME_DATE_ANN", NO_FIELDS),
    osp(0x36, Op::RoamingAddressCommand, "ROAM_ADDR_CMD", TARGET),
    osp(0x37, Op::RoamingAddressUpdate, "ROAM_ADDR_UPDT", TARGET),
    osp(0x38, Op::SystemServiceBroadcast, "SYS_SRV_BCST", NO_FIELDS),
    osp(0x39, Op::SecondaryControlBroadcast, "SCCB", SECONDARY_CONTROL),
    osp(0x3A, Op::RfssStatusBroadcast, "RFSS_STS_BCST", SITE_STATUS),
    osp(0x3B, Op::NetworkStatusBroadcast, "NET_STS_BCST", NETWORK_STATUS),
    osp(0x3C, Op::AdjacentSiteBroadcast, "ADJ_STS_BCST", SITE_STATUS),
    osp(0x3D, Op::IdentifierUpdate, "IDEN_UP", NO_FIELDS),
    osp(0x3E, Op::ProtectionParameterBroadcast, "P_PARM_BCST", NO_FIELDS),
    osp(0x3F, Op::ProtectionParameterUpdate, "P_PARM_UPDT", TARGET),

    isp(0x00, Op::GroupVoiceRequest, "GRP_V_REQ", GROUP_SOURCE),
    isp(0x04, Op::UnitVoiceRequest, "UU_V_REQ", TARGET_SOURCE),
    isp(0x05, Op::UnitAnswerResponse, "UU_ANS_RSP", TARGET_SOURCE),
    isp(0x08, Op::PhoneDialRequest, "TELE_INT_DIAL_REQ", SOURCE),
    isp(0x09, Op::PhonePstnRequest, "TELE_INT_PSTN_REQ", SOURCE),
    isp(0x0A, Op::PhoneAnswerResponse, "TELE_INT_ANS_RSP", SOURCE),
    isp(0x10, Op::IndividualDataRequest, "IND_DATA_REQ", SOURCE),
    isp(0x11, Op::GroupDataRequest, "GRP_DATA_REQ", SOURCE),
    isp(0x12, Op::SndcpDataRequest, "SN_D_CH_REQ", SOURCE),
    isp(0x13, Op::SndcpPageResponse, "SN_D_PAGE_RSP", SOURCE),
    isp(0x14, Op::SndcpReconnectRequest, "SN_REC_REQ", SOURCE),
    isp(0x18, Op::StatusUpdateRequest, "STS_UPDT_REQ", TARGET_SOURCE),
    isp(0x19, Op::StatusQueryResponse, "STS_Q_RSP", TARGET_SOURCE),
    isp(0x1A, Op::StatusQueryRequest, "STS_Q_REQ", TARGET_SOURCE),
    isp(0x1C, Op::MessageUpdateRequest, "MSG_UPDT_REQ", TARGET_SOURCE),
    isp(0x1D, Op::RadioMonitorRequest, "RAD_MON_REQ", TARGET_SOURCE),
    isp(0x1F, Op::CallAlertRequest, "CALL_ALRT_REQ", TARGET_SOURCE),
    isp(0x20, Op::UnitAckResponse, "ACK_RSP_U", TARGET_SOURCE),
    isp(0x23, Op::CancelServiceRequest, "CAN_SRV_REQ", SOURCE),
    isp(0x24, Op::ExtendedFunctionResponse, "EXT_FNCT_RSP", SOURCE),
    isp(0x27, Op::EmergencyAlarmRequest, "EMRG_ALRM_REQ", GROUP_SOURCE),
    isp(0x28, Op::GroupAffiliationRequest, "GRP_AFF_REQ", GROUP_SOURCE),
    isp(0x29, Op::GroupAffiliationQueryResponse, "GRP_AFF_Q_RSP", GROUP_SOURCE),
    isp(0x2B, Op::UnitDeregistrationRequest, "U_DE_REG_REQ", SOURCE),
    isp(0x2C, Op::UnitRegistrationRequest, "U_REG_REQ", SOURCE),
    isp(0x2D, Op::LocationRegistrationRequest, "LOC_REG_REQ", SOURCE),
    isp(0x2E, Op::AuthenticationQuery, "AUTH_Q", SOURCE),
    isp(0x2F, Op::AuthenticationResponseObsolete, "AUTH_RSP_OBS", SOURCE),
    isp(0x30, Op::ProtectionParameterRequest, "P_PARM_REQ", SOURCE),
    isp(0x32, Op::IdentifierUpdateRequest, "IDEN_UP_REQ", SOURCE),
    isp(0x36, Op::RoamingAddressRequest, "ROAM_ADDR_REQ", SOURCE),
    isp(0x37, Op::RoamingAddressResponse, "ROAM_ADDR_RSP", SOURCE),
    isp(0x38, Op::AuthenticationResponse, "AUTH_RSP", SOURCE),
    isp(0x39, Op::AuthenticationResponseMutual, "AUTH_RSP_M", SOURCE),
    isp(0x3A, Op::AuthenticationFneResult, "AUTH_FNE_RST", SOURCE),
    isp(0x3B, Op::AuthenticationSuDemand, "AUTH_SU_DMD", SOURCE),

    vendor_osp(Vendor::Motorola, 0x00, Op::MotorolaPatchGroupAdd, "MOT_PATCH_ADD",
               PATCH_GROUP),
    vendor_osp(Vendor::Motorola, 0x01, Op::MotorolaPatchGroupDelete, "MOT_PATCH_DEL",
               PATCH_GROUP),
    vendor_osp(Vendor::Motorola, 0x02, Op::MotorolaPatchGroupGrant, "MOT_PATCH_GRANT",
               PATCH_GRANT),
    vendor_osp(Vendor::Motorola, 0x03, Op::MotorolaPatchGroupGrantUpdate,
               "MOT_PATCH_GRANT_UPDT", GROUP_UPDATE),
    vendor_osp(Vendor::Motorola, 0x05, Op::MotorolaTrafficChannel, "MOT_TRAFFIC_CH",
               NO_FIELDS),
    vendor_osp(Vendor::Motorola, 0x07, Op::MotorolaDenyResponse, "MOT_DENY_RSP", TARGET),
    vendor_osp(Vendor::Motorola, 0x09, Op::MotorolaSystemLoading, "MOT_SYS_LOADING",
               NO_FIELDS),
    vendor_osp(Vendor::Motorola, 0x0B, Op::MotorolaBaseStationId, "MOT_CCH_BSI",
               NO_FIELDS),
    vendor_osp(Vendor::Motorola, 0x0E, Op::MotorolaPlannedShutdown, "MOT_CCH_SHUTDOWN",
               NO_FIELDS),

    vendor_osp(Vendor::Harris, 0x30, Op::HarrisTdmaSync, "HARRIS_TDMA_SYNC", NO_FIELDS),
];

impl TsbkOpcode {
    /// Find the message kind for the given direction, vendor, and 6-bit opcode.
    pub fn lookup(direction: Direction, vendor: Vendor, code: u8) -> Option<TsbkOpcode> {
        OPCODES.iter()
            .find(|e| e.direction == direction && e.vendor == vendor && e.code == code)
            .map(|e| e.opcode)
    }

    fn entry(self) -> &'static Entry {
        // Every variant is listed in the table.
        OPCODES.iter().find(|e| e.opcode == self).unwrap_or(&OPCODES[0])
    }

    /// Direction of channel the message is sent on.
    pub fn direction(self) -> Direction { self.entry().direction }

    pub fn vendor(self) -> Vendor { self.entry().vendor }

    /// 6-bit opcode.
    pub fn code(self) -> u8 { self.entry().code }

    /// Short name used in displayed messages.
    pub fn label(self) -> &'static str { self.entry().label }

    /// Fields carrying identifiers.
    pub fn fields(self) -> &'static [IdField] { self.entry().fields }

    /// Whether the payload begins with service options.
    pub fn has_service_options(self) -> bool {
        use self::TsbkOpcode::*;

        matches!(self, GroupVoiceGrant | GroupVoiceGrantUpdateExplicit | UnitAnswerRequest |
                 PhoneGrant | PhoneGrantUpdate | SndcpDataGrant | GroupVoiceRequest |
                 UnitVoiceRequest | MotorolaPatchGroupGrant)
    }
}

/// User-filled TSBK fields, used to build a block.
#[derive(Copy, Clone, Debug, Default)]
pub struct TsbkFields {
    pub last_block: bool,
    pub protected: bool,
    pub opcode: u8,
    pub vendor: u8,
    /// 64-bit payload following the vendor octet.
    pub payload: u64,
}

impl TsbkFields {
    /// Write the fields into a block, followed by the CRC.
    pub fn build(&self) -> BitBuffer {
        let mut bits = BitBuffer::new(TSBK_BITS);

        bits.write(0, 1, self.last_block as u64);
        bits.write(1, 1, self.protected as u64);
        bits.write(2, 6, self.opcode as u64 & 0x3F);
        bits.write(8, 8, self.vendor as u64);
        bits.write(16, 64, self.payload);

        let crc = Crc::new(crc::CRC16).feed_buffer(&bits, 0, fields::CRC_COVERAGE).finish();
        bits.write(fields::CRC_COVERAGE, 16, crc);

        bits
    }

    /// Build the block and trellis-code it for transmission.
    pub fn encode(&self) -> BitBuffer {
        let bytes = self.build().to_bytes();
        let mut block = [0; TSBK_BYTES];
        block.copy_from_slice(&bytes);

        trellis::dibit::encode(&block)
    }
}

/// Decode the trellis-coded TSBK starting at the given offset, returning the block and
/// whether its CRC matched.
pub fn decode_block(buf: &BitBuffer, offset: usize) -> (BitBuffer, CorrectionResult, bool) {
    let (bits, res) = trellis::dibit::decode(buf, offset);
    let crc_ok = crc::check(crc::CRC16, &bits, 0, fields::CRC_COVERAGE,
                            fields::CRC_COVERAGE);

    (bits, res, crc_ok)
}

/// A decoded trunking signalling block with a recognized opcode.
#[derive(Clone, Debug)]
pub struct Tsbk {
    bits: BitBuffer,
    nac: u16,
    opcode: TsbkOpcode,
    fec: CorrectionResult,
    crc_ok: bool,
    identifiers: OnceCell<Vec<Identifier>>,
}

impl Tsbk {
    /// Interpret the given decoded block, received on a channel of the given direction,
    /// returning `None` if the opcode isn't recognized.
    pub fn new(bits: BitBuffer, nac: u16, direction: Direction, fec: CorrectionResult)
        -> Option<Tsbk>
    {
        let vendor = Vendor::from_bits(bits.int(&fields::VENDOR) as u8);
        let opcode = TsbkOpcode::lookup(direction, vendor, bits.int(&fields::OPCODE) as u8)?;
        let crc_ok = crc::check(crc::CRC16, &bits, 0, fields::CRC_COVERAGE,
                                fields::CRC_COVERAGE);

        Some(Tsbk {
            bits,
            nac,
            opcode,
            fec,
            crc_ok,
            identifiers: OnceCell::new(),
        })
    }

    pub fn opcode(&self) -> TsbkOpcode { self.opcode }

    pub fn nac(&self) -> u16 { self.nac }

    /// The 96 decoded bits of the block.
    pub fn bits(&self) -> &BitBuffer { &self.bits }

    /// Whether this is the last block of the frame.
    pub fn last_block(&self) -> bool { self.bits.int(&fields::LAST_BLOCK) == 1 }

    /// Whether the payload is encrypted.
    pub fn protected(&self) -> bool { self.bits.int(&fields::PROTECTED) == 1 }

    pub fn crc_ok(&self) -> bool { self.crc_ok }

    pub fn fec(&self) -> CorrectionResult { self.fec }

    pub fn is_valid(&self) -> bool { self.fec.is_ok() && self.crc_ok }

    /// Service options for messages that carry them.
    pub fn service_options(&self) -> Option<fields::ServiceOptions> {
        if self.opcode.has_service_options() {
            Some(fields::ServiceOptions::new(self.bits.int(&fields::SERVICE_OPTIONS) as u8))
        } else {
            None
        }
    }

    /// Services advertised by site status broadcasts.
    pub fn system_services(&self) -> Option<fields::SystemServices> {
        use self::TsbkOpcode::*;

        match self.opcode {
            RfssStatusBroadcast | NetworkStatusBroadcast | AdjacentSiteBroadcast => Some(
                fields::SystemServices::new(self.bits.int(&fields::SITE_SERVICES) as u8)),
            _ => None,
        }
    }

    pub fn identifiers(&self) -> &[Identifier] {
        self.identifiers.get_or_init(|| {
            let mut ids = vec![Identifier::nac(self.nac)];
            fields::extract(&self.bits, self.opcode.fields(), &mut ids);
            ids
        })
    }

    /// Band ID and channel parameters advertised by a band update.
    pub fn band_update(&self) -> Option<(u8, ChannelParams)> {
        let b = &self.bits;
        let id = b.int(&fields::BAND_ID) as u8;
        let base = b.int(&fields::BAND_BASE) as u32;
        let spacing = b.int(&fields::BAND_SPACING) as u16;

        match self.opcode {
            TsbkOpcode::IdentifierUpdate => Some((id, ChannelParams::new(
                base,
                b.int(&fields::BAND_BANDWIDTH) as u16,
                b.int(&fields::BAND_OFFSET) as u16,
                spacing,
            ))),
            TsbkOpcode::IdentifierUpdateVhfUhf => Some((id, ChannelParams::vhf_uhf(
                base,
                b.int(&fields::BAND_VU_BANDWIDTH) as u8,
                b.int(&fields::BAND_VU_OFFSET) as u16,
                spacing,
            ))),
            _ => None,
        }
    }
}

impl fmt::Display for Tsbk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TSBK {}", self.opcode.label())?;

        if self.service_options().map_or(false, |o| o.emergency()) {
            f.write_str(" EMERGENCY")?;
        }

        for id in self.identifiers() {
            write!(f, " {}", id)?;
        }

        Ok(())
    }
}
