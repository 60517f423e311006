//! Binary FSK correlation decoder.
//!
//! Each sample is hard-limited to a bit and correlated against the bit one symbol
//! period earlier. The correlation bits are smoothed over a symbol period and then
//! sliced into symbols, so each output bit marks whether the signal changed state
//! between consecutive symbols.

use crate::baseband::averaging::BoolAverager;
use crate::baseband::slicer::{Polarity, Shift, Slicer};
use crate::error::Result;

/// Recovers binary symbols from real-valued demodulated samples.
#[derive(Clone, Debug)]
pub struct FskDecoder {
    /// Hard bits delayed by one symbol period.
    delay: BoolAverager,
    /// Low-pass filter over the correlation bits.
    smooth: BoolAverager,
    slicer: Slicer,
}

impl FskDecoder {
    /// Create a new `FskDecoder` for the given sample and symbol rates, which must
    /// divide evenly.
    pub fn new(sample_rate: usize, symbol_rate: usize, polarity: Polarity)
        -> Result<FskDecoder>
    {
        let slicer = Slicer::new(sample_rate, symbol_rate, polarity)?;
        let period = slicer.period();

        Ok(FskDecoder {
            delay: BoolAverager::new(period),
            smooth: BoolAverager::new(period),
            slicer,
        })
    }

    /// Samples per symbol.
    pub fn period(&self) -> usize { self.slicer.period() }

    /// Timing adjustment made at the most recent symbol decision.
    pub fn last_shift(&self) -> Shift { self.slicer.last_shift() }

    /// Feed in a sample, returning a bit at each symbol decision.
    pub fn feed(&mut self, sample: f32) -> Option<bool> {
        let bit = sample > 0.0;
        let corr = bit ^ self.delay.push(bit);

        self.slicer.feed(self.smooth.feed(corr))
    }

    /// Feed in a buffer of samples, appending decided bits to `out`.
    pub fn feed_all(&mut self, samples: &[f32], out: &mut Vec<bool>) {
        out.extend(samples.iter().filter_map(|&s| self.feed(s)));
    }

    /// Clear all sample history.
    pub fn reset(&mut self) {
        self.delay.reset();
        self.smooth.reset();
        self.slicer.reset();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SYMBOLS: [bool; 32] = [
        true, false, true, true, false, false, true, false,
        true, false, false, true, true, true, false, true,
        false, false, true, false, true, true, false, true,
        false, false, false, true, true, false, true, false,
    ];

    fn modulate(syms: &[bool], period: usize) -> Vec<f32> {
        syms.iter()
            .flat_map(|&b| std::iter::repeat(if b { 1.0 } else { -1.0 }).take(period))
            .collect()
    }

    #[test]
    fn test_config() {
        assert!(FskDecoder::new(44100, 4800, Polarity::Normal).is_err());
        assert_eq!(FskDecoder::new(48000, 4800, Polarity::Normal).unwrap().period(), 10);
    }

    #[test]
    fn test_transitions() {
        let mut d = FskDecoder::new(48000, 4800, Polarity::Normal).unwrap();
        let mut out = vec![];
        d.feed_all(&modulate(&SYMBOLS, 10), &mut out);

        // The filters delay output by one symbol.
        assert_eq!(out.len(), SYMBOLS.len() - 1);

        let mut prev = false;
        let expected = SYMBOLS[..31].iter().map(|&b| {
            let t = b != prev;
            prev = b;
            t
        }).collect::<Vec<_>>();

        assert_eq!(out, expected);
    }

    #[test]
    fn test_reset() {
        let mut d = FskDecoder::new(9600, 4800, Polarity::Inverted).unwrap();
        let mut out = vec![];

        d.feed_all(&[1.0, 1.0, -1.0], &mut out);
        d.reset();
        out.clear();

        d.feed_all(&[-1.0; 8], &mut out);
        assert_eq!(out, vec![true; 4]);
    }
}
