//! Trunking channel and band parameters.

pub mod band;

pub use self::band::{BandTable, Channel, ChannelParams};
