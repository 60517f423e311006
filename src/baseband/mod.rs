//! Symbol recovery from demodulated baseband samples.

pub mod averaging;
pub mod fsk;
pub mod slicer;
