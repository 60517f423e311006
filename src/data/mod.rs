//! Packet data checks and headers.

pub mod crc;
pub mod header;
pub mod interleave;
