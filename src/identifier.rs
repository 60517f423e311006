//! Typed, role-tagged values extracted from decoded messages.

use std::fmt;

/// What an identifier's value refers to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum IdentifierKind {
    /// 12-bit network access code.
    Nac,
    /// 24-bit subscriber unit address.
    Radio,
    /// 16-bit talkgroup.
    Talkgroup,
    /// 24-bit logical link ID of a data packet.
    Llid,
    /// 16-bit channel: 4-bit band ID and 12-bit channel number.
    Channel,
    /// Absolute frequency in Hz.
    Frequency,
    /// 12-bit system ID.
    System,
    /// 8-bit RF subsystem ID.
    Rfss,
    /// 8-bit site ID.
    Site,
    /// 20-bit wide area communication network ID.
    Wacn,
}

impl IdentifierKind {
    fn label(self) -> &'static str {
        use self::IdentifierKind::*;

        match self {
            Nac => "NAC",
            Radio => "RADIO",
            Talkgroup => "TG",
            Llid => "LLID",
            Channel => "CHAN",
            Frequency => "FREQ",
            System => "SYSTEM",
            Rfss => "RFSS",
            Site => "SITE",
            Wacn => "WACN",
        }
    }
}

/// How an identifier relates to the message that carried it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Role {
    /// Originator of the message or call.
    From,
    /// Addressed recipient.
    To,
    /// Applies to the message as a whole.
    Any,
    /// Advertised by the network rather than addressed.
    Broadcast,
}

impl Role {
    fn label(self) -> &'static str {
        match self {
            Role::From => "FROM",
            Role::To => "TO",
            Role::Any => "",
            Role::Broadcast => "BCAST",
        }
    }
}

/// A `(kind, value, role)` value object.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub value: u64,
    pub role: Role,
}

impl Identifier {
    pub fn new(kind: IdentifierKind, value: u64, role: Role) -> Identifier {
        Identifier { kind, value, role }
    }

    pub fn nac(nac: u16) -> Identifier {
        Identifier::new(IdentifierKind::Nac, nac as u64 & 0xFFF, Role::Any)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let role = self.role.label();

        if !role.is_empty() {
            write!(f, "{}:", role)?;
        }

        match self.kind {
            IdentifierKind::Nac => write!(f, "NAC:{:03X}", self.value),
            IdentifierKind::Channel => write!(f, "CHAN:{}-{}", self.value >> 12,
                                              self.value & 0xFFF),
            IdentifierKind::Frequency => write!(f, "FREQ:{:.5}MHz",
                                                self.value as f64 / 1e6),
            kind => write!(f, "{}:{}", kind.label(), self.value),
        }
    }
}
