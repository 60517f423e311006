//! Decoding of Project 25 trunking, data packet, and link control messages from
//! binary-FSK baseband.

pub mod baseband;
pub mod bit_buffer;
pub mod bits;
pub mod coding;
pub mod config;
pub mod consts;
pub mod data;
pub mod error;
pub mod framer;
pub mod identifier;
pub mod message;
pub mod pipeline;
pub mod stats;
pub mod sync;
pub mod trunking;

#[cfg(test)]
mod test_util;

pub use crate::bit_buffer::BitBuffer;
pub use crate::config::Config;
pub use crate::error::{P25Error, Result};
pub use crate::message::{Direction, Message};
pub use crate::pipeline::{spawn_channel, Pipeline, SpawnedChannel};
