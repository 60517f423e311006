//! Errors that may occur when configuring a P25 decoder.
//!
//! Nothing in the decode path returns these: a corrupted frame degrades into a message
//! marked invalid rather than an error.

use std::fmt;

/// P25 configuration and setup errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum P25Error {
    /// The sample rate isn't an integer multiple of the symbol rate.
    SamplesPerSymbol {
        /// Configured samples per second.
        sample_rate: usize,
        /// Configured symbols per second.
        symbol_rate: usize,
    },
    /// A sync pattern doesn't fit in the rolling correlation register.
    SyncPatternTooLong(usize),
    /// The sync bit-error tolerance is larger than the decoder supports.
    InvalidTolerance(usize),
    /// The message queue can't hold any messages.
    EmptyQueue,
    /// The configuration text couldn't be parsed.
    ConfigParse(String),
    /// The configuration source couldn't be read.
    ConfigIo(String),
    /// The configuration contained keys that aren't recognized.
    ConfigUnknownKeys(Vec<String>),
    /// The message sink was disconnected.
    QueueClosed,
}

impl fmt::Display for P25Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::P25Error::*;

        match self {
            SamplesPerSymbol { sample_rate, symbol_rate } => write!(f,
                "sample rate {} is not a multiple of symbol rate {}", sample_rate, symbol_rate),
            SyncPatternTooLong(len) =>
                write!(f, "sync pattern of {} bits exceeds 63 bits", len),
            InvalidTolerance(tol) => write!(f, "sync tolerance {} is too large", tol),
            EmptyQueue => write!(f, "message queue capacity must be nonzero"),
            ConfigParse(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigIo(msg) => write!(f, "failed to read config: {}", msg),
            ConfigUnknownKeys(keys) => write!(f, "unknown config keys: {}", keys.join(", ")),
            QueueClosed => write!(f, "message queue closed"),
        }
    }
}

impl std::error::Error for P25Error {}

/// Standard result using `P25Error`.
pub type Result<T> = std::result::Result<T, P25Error>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display() {
        let e = P25Error::SamplesPerSymbol { sample_rate: 48000, symbol_rate: 4700 };
        assert_eq!(e.to_string(), "sample rate 48000 is not a multiple of symbol rate 4700");

        let e = P25Error::ConfigUnknownKeys(vec!["foo".to_string(), "bar".to_string()]);
        assert_eq!(e.to_string(), "unknown config keys: foo, bar");
    }
}
