//! Helpers shared by unit tests.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT_LOG: Once = Once::new();

/// Install a log subscriber for tests, filtered by `RUST_LOG` and defaulting to debug.
pub fn setup_logging() {
    INIT_LOG.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// Modulate the given bits into baseband samples the way a binary FSK transmitter
/// would, with the signal level toggling for each set bit. An extra symbol is appended
/// so the decoder emits every bit.
pub fn modulate(bits: &[bool], period: usize) -> Vec<f32> {
    let mut level = false;

    bits.iter().chain(std::iter::once(&false))
        .flat_map(|&b| {
            level ^= b;
            std::iter::repeat(if level { 1.0 } else { -1.0 }).take(period)
        })
        .collect()
}
