//! Channel numbering and the per-site band table used to resolve frequencies.
//!
//! Trunking messages refer to channels by a 4-bit band ID and a 12-bit channel number.
//! The control channel periodically broadcasts the parameters of each band ID, and the
//! absolute frequency of a channel can only be computed once its band has been seen.

/// Number of band IDs a site can advertise.
pub const BANDS: usize = 16;

/// Uniquely identifies a channel within a site.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Channel(u16);

impl Channel {
    /// Create a new `Channel` from the given 16 bits.
    pub fn new(bits: u16) -> Channel { Channel(bits) }

    pub fn bits(&self) -> u16 { self.0 }

    /// Band ID whose parameters to use.
    pub fn id(&self) -> u8 { (self.0 >> 12) as u8 }

    /// Individual channel number within the band.
    pub fn number(&self) -> u16 { self.0 & 0xFFF }
}

/// Computes TX/RX frequencies and bandwidth for channel numbers within a band.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelParams {
    /// Base frequency in Hz.
    base: u64,
    /// Channel spacing in Hz.
    spacing: u64,
    /// Transmit frequency offset in Hz.
    offset: i64,
    /// Channel bandwidth in Hz.
    bandwidth: u32,
}

impl ChannelParams {
    /// Create a new `ChannelParams` from the given base frequency (5Hz steps), bandwidth
    /// (125Hz steps), TX offset (250kHz steps, MSB set for positive), and inter-channel
    /// spacing (125Hz steps.)
    pub fn new(base: u32, bandwidth: u16, offset: u16, spacing: u16) -> ChannelParams {
        let off = (offset as i64 & 0xFF) * 250_000;

        ChannelParams {
            base: base as u64 * 5,
            spacing: spacing as u64 * 125,
            offset: if offset >> 8 & 1 == 0 { -off } else { off },
            bandwidth: bandwidth as u32 * 125,
        }
    }

    /// Create a new `ChannelParams` from the VHF/UHF form of the band update, where the
    /// 4-bit bandwidth is a code and the 14-bit TX offset (MSB set for positive) counts
    /// channel spacings.
    pub fn vhf_uhf(base: u32, bandwidth: u8, offset: u16, spacing: u16) -> ChannelParams {
        let spacing = spacing as u64 * 125;
        let off = (offset as i64 & 0x1FFF) * spacing as i64;

        ChannelParams {
            base: base as u64 * 5,
            spacing,
            offset: if offset >> 13 & 1 == 0 { -off } else { off },
            bandwidth: match bandwidth & 0xF {
                0x4 => 6_250,
                0x5 => 12_500,
                _ => 0,
            },
        }
    }

    /// Base frequency in Hz.
    pub fn base(&self) -> u64 { self.base }

    /// Channel spacing in Hz.
    pub fn spacing(&self) -> u64 { self.spacing }

    /// Offset of the transmit (uplink) frequency from the receive frequency in Hz.
    pub fn offset(&self) -> i64 { self.offset }

    /// Channel bandwidth in Hz, or 0 if unknown.
    pub fn bandwidth(&self) -> u32 { self.bandwidth }

    /// Receive frequency for the given channel number in Hz.
    pub fn rx_freq(&self, ch: u16) -> u64 {
        self.base + self.spacing * ch as u64
    }

    /// Transmit frequency for the given channel number in Hz.
    pub fn tx_freq(&self, ch: u16) -> u64 {
        (self.rx_freq(ch) as i64 + self.offset).max(0) as u64
    }
}

/// Channel parameters for each band ID seen on a control channel.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BandTable {
    params: [Option<ChannelParams>; BANDS],
}

impl BandTable {
    pub fn new() -> BandTable { BandTable::default() }

    /// Store the parameters advertised for the given band ID, replacing any previous.
    pub fn update(&mut self, id: u8, params: ChannelParams) {
        self.params[id as usize % BANDS] = Some(params);
    }

    pub fn get(&self, id: u8) -> Option<&ChannelParams> {
        self.params.get(id as usize).and_then(|p| p.as_ref())
    }

    /// Number of bands with known parameters.
    pub fn len(&self) -> usize {
        self.params.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Frequency the site transmits the channel on, in Hz.
    pub fn downlink(&self, ch: Channel) -> Option<u64> {
        self.get(ch.id()).map(|p| p.rx_freq(ch.number()))
    }

    /// Frequency subscribers transmit the channel on, in Hz.
    pub fn uplink(&self, ch: Channel) -> Option<u64> {
        self.get(ch.id()).map(|p| p.tx_freq(ch.number()))
    }

    pub fn clear(&mut self) {
        self.params = [None; BANDS];
    }
}
