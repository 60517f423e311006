//! Decoder configuration, loaded from TOML.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use toml::Value;

use crate::baseband::slicer::{samples_per_symbol, Polarity};
use crate::consts;
use crate::error::{P25Error, Result};
use crate::message::Direction;
use crate::sync::MAX_TOLERANCE;

/// Settings for a single channel's decode pipeline.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Baseband samples per second.
    pub sample_rate: usize,
    /// Symbols per second.
    pub symbol_rate: usize,
    pub polarity: Polarity,
    /// Number of bit errors allowed in a received sync pattern.
    pub sync_tolerance: usize,
    /// How long a caller should hold an unfinished packet sequence before discarding
    /// it. The decoder itself never times out.
    pub pdu_timeout_ms: u64,
    /// Direction of the channel being decoded.
    pub direction: Direction,
    /// Capacity of the message queue between the decoder and its consumer.
    pub queue_capacity: usize,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sample_rate: consts::SAMPLE_RATE,
            symbol_rate: consts::SYMBOL_RATE,
            polarity: Polarity::Normal,
            sync_tolerance: 2,
            pdu_timeout_ms: 2000,
            direction: Direction::Outbound,
            queue_capacity: 256,
            extra: HashMap::new(),
        }
    }
}

impl Config {
    /// Parse and validate a configuration from TOML text. Missing keys take their
    /// default values.
    pub fn from_toml_str(toml_str: &str) -> Result<Config> {
        let cfg: Config = toml::from_str(toml_str)
            .map_err(|e| P25Error::ConfigParse(e.to_string()))?;

        if !cfg.extra.is_empty() {
            return Err(P25Error::ConfigUnknownKeys(sorted_keys(&cfg.extra)));
        }

        cfg.validate()?;

        Ok(cfg)
    }

    /// Parse a configuration from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Config> {
        let mut contents = String::new();
        let mut reader = BufReader::new(reader);

        reader.read_to_string(&mut contents)
            .map_err(|e| P25Error::ConfigIo(e.to_string()))?;

        Config::from_toml_str(&contents)
    }

    /// Parse a configuration from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let f = File::open(path).map_err(|e| P25Error::ConfigIo(e.to_string()))?;
        Config::from_reader(f)
    }

    /// Check that the settings describe a decoder that can be built.
    pub fn validate(&self) -> Result<()> {
        samples_per_symbol(self.sample_rate, self.symbol_rate)?;

        if self.sync_tolerance > MAX_TOLERANCE {
            return Err(P25Error::InvalidTolerance(self.sync_tolerance));
        }

        if self.queue_capacity == 0 {
            return Err(P25Error::EmptyQueue);
        }

        Ok(())
    }

    /// How long to hold an unfinished packet sequence.
    pub fn pdu_timeout(&self) -> Duration {
        Duration::from_millis(self.pdu_timeout_ms)
    }
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}
