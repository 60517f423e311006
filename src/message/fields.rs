//! Static field tables for trunking and link control messages.
//!
//! Each message kind names the identifier-bearing fields it carries as a table of
//! `IdField`s, and identifiers are pulled out of a corrected buffer by walking the
//! table. Bit positions count from the first bit of the 12-octet TSBK or the 9-octet
//! link control word.

use crate::bit_buffer::{BitBuffer, FieldSpec};
use crate::identifier::{Identifier, IdentifierKind, Role};
use crate::identifier::IdentifierKind::*;

pub const LAST_BLOCK: FieldSpec = FieldSpec::range(0, 1);
pub const PROTECTED: FieldSpec = FieldSpec::range(1, 1);
pub const OPCODE: FieldSpec = FieldSpec::range(2, 6);
pub const VENDOR: FieldSpec = FieldSpec::range(8, 8);

/// Start of the TSBK payload.
pub const PAYLOAD_START: usize = 16;
/// Number of bits covered by the TSBK CRC.
pub const CRC_COVERAGE: usize = 80;

pub const SERVICE_OPTIONS: FieldSpec = FieldSpec::range(16, 8);
pub const GRANT_CHANNEL: FieldSpec = FieldSpec::range(24, 16);
pub const GRANT_GROUP: FieldSpec = FieldSpec::range(40, 16);
pub const SOURCE_ADDRESS: FieldSpec = FieldSpec::range(56, 24);
pub const TARGET_ADDRESS: FieldSpec = FieldSpec::range(32, 24);
pub const UNIT_CHANNEL: FieldSpec = FieldSpec::range(16, 16);

pub const UPDATE_CHANNEL_A: FieldSpec = FieldSpec::range(16, 16);
pub const UPDATE_GROUP_A: FieldSpec = FieldSpec::range(32, 16);
pub const UPDATE_CHANNEL_B: FieldSpec = FieldSpec::range(48, 16);
pub const UPDATE_GROUP_B: FieldSpec = FieldSpec::range(64, 16);

pub const EXPLICIT_TX_CHANNEL: FieldSpec = FieldSpec::range(32, 16);
pub const EXPLICIT_RX_CHANNEL: FieldSpec = FieldSpec::range(48, 16);
pub const EXPLICIT_GROUP: FieldSpec = FieldSpec::range(64, 16);

pub const DATA_TX_CHANNEL: FieldSpec = FieldSpec::range(24, 16);
pub const DATA_RX_CHANNEL: FieldSpec = FieldSpec::range(40, 16);

pub const ANNOUNCEMENT_GROUP: FieldSpec = FieldSpec::range(24, 16);
pub const AFFILIATED_GROUP: FieldSpec = FieldSpec::range(40, 16);

pub const LOCATION_GROUP: FieldSpec = FieldSpec::range(24, 16);
pub const LOCATION_RFSS: FieldSpec = FieldSpec::range(40, 8);
pub const LOCATION_SITE: FieldSpec = FieldSpec::range(48, 8);

pub const REGISTERED_SYSTEM: FieldSpec = FieldSpec::range(20, 12);
pub const REGISTERED_ID: FieldSpec = FieldSpec::range(32, 24);

pub const DEREGISTERED_WACN: FieldSpec = FieldSpec::range(24, 20);
pub const DEREGISTERED_SYSTEM: FieldSpec = FieldSpec::range(44, 12);

pub const SITE_SYSTEM: FieldSpec = FieldSpec::range(28, 12);
pub const SITE_RFSS: FieldSpec = FieldSpec::range(40, 8);
pub const SITE_ID: FieldSpec = FieldSpec::range(48, 8);
pub const SITE_CHANNEL: FieldSpec = FieldSpec::range(56, 16);
pub const SITE_SERVICES: FieldSpec = FieldSpec::range(72, 8);

pub const NETWORK_WACN: FieldSpec = FieldSpec::range(24, 20);
pub const NETWORK_SYSTEM: FieldSpec = FieldSpec::range(44, 12);

pub const SECONDARY_RFSS: FieldSpec = FieldSpec::range(16, 8);
pub const SECONDARY_SITE: FieldSpec = FieldSpec::range(24, 8);
pub const SECONDARY_CHANNEL_A: FieldSpec = FieldSpec::range(32, 16);
pub const SECONDARY_CHANNEL_B: FieldSpec = FieldSpec::range(56, 16);

pub const PATCH_SUPERGROUP: FieldSpec = FieldSpec::range(16, 16);
pub const PATCH_GROUP_1: FieldSpec = FieldSpec::range(32, 16);
pub const PATCH_GROUP_2: FieldSpec = FieldSpec::range(48, 16);
pub const PATCH_GROUP_3: FieldSpec = FieldSpec::range(64, 16);
pub const PATCH_GRANT_CHANNEL: FieldSpec = FieldSpec::range(24, 16);
pub const PATCH_GRANT_SUPERGROUP: FieldSpec = FieldSpec::range(40, 16);

pub const BAND_ID: FieldSpec = FieldSpec::range(16, 4);
pub const BAND_BANDWIDTH: FieldSpec = FieldSpec::range(20, 9);
pub const BAND_OFFSET: FieldSpec = FieldSpec::range(29, 9);
pub const BAND_SPACING: FieldSpec = FieldSpec::range(38, 10);
pub const BAND_BASE: FieldSpec = FieldSpec::range(48, 32);
pub const BAND_VU_BANDWIDTH: FieldSpec = FieldSpec::range(20, 4);
pub const BAND_VU_OFFSET: FieldSpec = FieldSpec::range(24, 14);

pub const LC_OPCODE: FieldSpec = FieldSpec::range(2, 6);
pub const LC_SERVICE_OPTIONS: FieldSpec = FieldSpec::range(16, 8);
pub const LC_GROUP: FieldSpec = FieldSpec::range(32, 16);
pub const LC_TARGET: FieldSpec = FieldSpec::range(24, 24);
pub const LC_SOURCE: FieldSpec = FieldSpec::range(48, 24);

/// A field that carries an identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IdField {
    pub field: FieldSpec,
    pub kind: IdentifierKind,
    pub role: Role,
    /// Whether a zero value means the field is unused.
    pub optional: bool,
}

impl IdField {
    pub const fn new(field: FieldSpec, kind: IdentifierKind, role: Role) -> IdField {
        IdField { field, kind, role, optional: false }
    }

    pub const fn optional(field: FieldSpec, kind: IdentifierKind, role: Role) -> IdField {
        IdField { field, kind, role, optional: true }
    }
}

/// Extract identifiers from the given buffer for each field in the table.
pub fn extract(bits: &BitBuffer, table: &[IdField], out: &mut Vec<Identifier>) {
    for f in table {
        let value = bits.int(&f.field);

        if f.optional && value == 0 {
            continue;
        }

        out.push(Identifier::new(f.kind, value, f.role));
    }
}

pub const NO_FIELDS: &[IdField] = &[];

pub const GROUP_GRANT: &[IdField] = &[
    IdField::new(GRANT_CHANNEL, Channel, Role::Any),
    IdField::new(GRANT_GROUP, Talkgroup, Role::To),
    IdField::new(SOURCE_ADDRESS, Radio, Role::From),
];

pub const GROUP_UPDATE: &[IdField] = &[
    IdField::new(UPDATE_CHANNEL_A, Channel, Role::Any),
    IdField::new(UPDATE_GROUP_A, Talkgroup, Role::To),
    IdField::optional(UPDATE_CHANNEL_B, Channel, Role::Any),
    IdField::optional(UPDATE_GROUP_B, Talkgroup, Role::To),
];

pub const GROUP_UPDATE_EXPLICIT: &[IdField] = &[
    IdField::new(EXPLICIT_TX_CHANNEL, Channel, Role::Any),
    IdField::optional(EXPLICIT_RX_CHANNEL, Channel, Role::Any),
    IdField::new(EXPLICIT_GROUP, Talkgroup, Role::To),
];

pub const UNIT_GRANT: &[IdField] = &[
    IdField::new(UNIT_CHANNEL, Channel, Role::Any),
    IdField::new(TARGET_ADDRESS, Radio, Role::To),
    IdField::new(SOURCE_ADDRESS, Radio, Role::From),
];

pub const TARGET_SOURCE: &[IdField] = &[
    IdField::new(TARGET_ADDRESS, Radio, Role::To),
    IdField::new(SOURCE_ADDRESS, Radio, Role::From),
];

/// Outbound messages addressed to a single unit in the low address field.
pub const TARGET: &[IdField] = &[
    IdField::new(SOURCE_ADDRESS, Radio, Role::To),
];

/// Inbound messages sent from a single unit in the low address field.
pub const SOURCE: &[IdField] = &[
    IdField::new(SOURCE_ADDRESS, Radio, Role::From),
];

pub const GROUP_SOURCE: &[IdField] = &[
    IdField::new(GRANT_GROUP, Talkgroup, Role::To),
    IdField::new(SOURCE_ADDRESS, Radio, Role::From),
];

pub const PHONE_GRANT: &[IdField] = &[
    IdField::new(GRANT_CHANNEL, Channel, Role::Any),
    IdField::new(SOURCE_ADDRESS, Radio, Role::To),
];

pub const DATA_GRANT: &[IdField] = &[
    IdField::new(DATA_TX_CHANNEL, Channel, Role::Any),
    IdField::optional(DATA_RX_CHANNEL, Channel, Role::Any),
    IdField::new(SOURCE_ADDRESS, Radio, Role::To),
];

pub const AFFILIATION_RESPONSE: &[IdField] = &[
    IdField::optional(ANNOUNCEMENT_GROUP, Talkgroup, Role::Any),
    IdField::new(AFFILIATED_GROUP, Talkgroup, Role::Any),
    IdField::new(SOURCE_ADDRESS, Radio, Role::To),
];

pub const LOCATION_RESPONSE: &[IdField] = &[
    IdField::new(LOCATION_GROUP, Talkgroup, Role::Any),
    IdField::new(LOCATION_RFSS, Rfss, Role::Any),
    IdField::new(LOCATION_SITE, Site, Role::Any),
    IdField::new(SOURCE_ADDRESS, Radio, Role::To),
];

pub const REGISTRATION_RESPONSE: &[IdField] = &[
    IdField::new(REGISTERED_SYSTEM, System, Role::Any),
    IdField::new(REGISTERED_ID, Radio, Role::To),
    IdField::new(SOURCE_ADDRESS, Radio, Role::To),
];

pub const DEREGISTRATION: &[IdField] = &[
    IdField::new(DEREGISTERED_WACN, Wacn, Role::Any),
    IdField::new(DEREGISTERED_SYSTEM, System, Role::Any),
    IdField::new(SOURCE_ADDRESS, Radio, Role::To),
];

pub const SITE_STATUS: &[IdField] = &[
    IdField::new(SITE_SYSTEM, System, Role::Broadcast),
    IdField::new(SITE_RFSS, Rfss, Role::Broadcast),
    IdField::new(SITE_ID, Site, Role::Broadcast),
    IdField::new(SITE_CHANNEL, Channel, Role::Broadcast),
];

pub const NETWORK_STATUS: &[IdField] = &[
    IdField::new(NETWORK_WACN, Wacn, Role::Broadcast),
    IdField::new(NETWORK_SYSTEM, System, Role::Broadcast),
    IdField::new(SITE_CHANNEL, Channel, Role::Broadcast),
];

pub const SECONDARY_CONTROL: &[IdField] = &[
    IdField::new(SECONDARY_RFSS, Rfss, Role::Broadcast),
    IdField::new(SECONDARY_SITE, Site, Role::Broadcast),
    IdField::new(SECONDARY_CHANNEL_A, Channel, Role::Broadcast),
    IdField::optional(SECONDARY_CHANNEL_B, Channel, Role::Broadcast),
];

pub const SECONDARY_CONTROL_EXPLICIT: &[IdField] = &[
    IdField::new(SECONDARY_RFSS, Rfss, Role::Broadcast),
    IdField::new(SECONDARY_SITE, Site, Role::Broadcast),
    IdField::new(EXPLICIT_TX_CHANNEL, Channel, Role::Broadcast),
    IdField::optional(EXPLICIT_RX_CHANNEL, Channel, Role::Broadcast),
];

pub const PATCH_GROUP: &[IdField] = &[
    IdField::new(PATCH_SUPERGROUP, Talkgroup, Role::Any),
    IdField::new(PATCH_GROUP_1, Talkgroup, Role::Any),
    IdField::optional(PATCH_GROUP_2, Talkgroup, Role::Any),
    IdField::optional(PATCH_GROUP_3, Talkgroup, Role::Any),
];

pub const PATCH_GRANT: &[IdField] = &[
    IdField::new(PATCH_GRANT_CHANNEL, Channel, Role::Any),
    IdField::new(PATCH_GRANT_SUPERGROUP, Talkgroup, Role::To),
    IdField::new(SOURCE_ADDRESS, Radio, Role::From),
];

pub const LC_GROUP_VOICE: &[IdField] = &[
    IdField::new(LC_GROUP, Talkgroup, Role::To),
    IdField::new(LC_SOURCE, Radio, Role::From),
];

pub const LC_UNIT_VOICE: &[IdField] = &[
    IdField::new(LC_TARGET, Radio, Role::To),
    IdField::new(LC_SOURCE, Radio, Role::From),
];

/// Options requested for a voice or data service.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ServiceOptions(u8);

impl ServiceOptions {
    pub fn new(opts: u8) -> ServiceOptions { ServiceOptions(opts) }

    pub fn emergency(&self) -> bool { self.0 >> 7 == 1 }
    pub fn protected(&self) -> bool { self.0 >> 6 & 1 == 1 }
    pub fn duplex(&self) -> bool { self.0 >> 5 & 1 == 1 }
    pub fn packet_switched(&self) -> bool { self.0 >> 4 & 1 == 1 }
    pub fn prio(&self) -> u8 { self.0 & 0x7 }
}

/// Identifies which group a message belongs to.
///
/// In a production P25 system, users can set their radios to receive one or more
/// talkgroups, and the radio will only unsquelch if one of those talkgroups is seen.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TalkGroup {
    /// Includes nobody.
    Nobody,
    /// Default talkgroup when no other is selected.
    Default,
    /// Includes everybody.
    Everybody,
    /// Specific group of users.
    Other(u16),
}

impl TalkGroup {
    pub fn from_bits(bits: u16) -> TalkGroup {
        use self::TalkGroup::*;

        match bits {
            0x0000 => Nobody,
            0x0001 => Default,
            0xFFFF => Everybody,
            _ => Other(bits),
        }
    }
}

/// Services advertised by a site.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SystemServices(u8);

impl SystemServices {
    pub fn new(ssc: u8) -> Self { SystemServices(ssc) }

    pub fn is_composite(&self) -> bool { self.0 & 0x01 != 0 }
    pub fn has_updates(&self) -> bool { self.0 & 0x02 != 0 }
    pub fn is_backup(&self) -> bool { self.0 & 0x04 != 0 }
    pub fn has_data(&self) -> bool { self.0 & 0x10 != 0 }
    pub fn has_voice(&self) -> bool { self.0 & 0x20 != 0 }
    pub fn has_registration(&self) -> bool { self.0 & 0x40 != 0 }
    pub fn has_auth(&self) -> bool { self.0 & 0x80 != 0 }
}
