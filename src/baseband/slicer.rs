//! Self-aligning binary symbol slicer.
//!
//! The slicer collects one symbol period of hard bits into a window and decides the
//! symbol by majority. The bits at the edges of the window are then compared against
//! the decision: an edge bit that disagrees belongs to a neighboring symbol, so the
//! next window is moved one sample toward the current symbol. This is the only timing
//! recovery in the receiver and needs no reference clock.

use num::Integer;
use serde::{Deserialize, Serialize};

use crate::error::{P25Error, Result};

/// Output bit polarity.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Normal,
    Inverted,
}

impl Polarity {
    /// Apply the polarity to a decided bit.
    pub fn apply(self, bit: bool) -> bool {
        match self {
            Polarity::Normal => bit,
            Polarity::Inverted => !bit,
        }
    }
}

/// Timing adjustment made after a symbol decision.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Shift {
    /// Window was aligned with the symbol.
    None,
    /// First bit disagreed with the decision, so the next window starts one sample later.
    Left,
    /// Last bit disagreed with the decision, so it seeds the next window, which then
    /// completes one sample earlier.
    Right,
}

/// Decides binary symbols from a stream of hard bits at a fixed number of samples per
/// symbol.
#[derive(Clone, Debug)]
pub struct Slicer {
    /// Bits of the current symbol window.
    window: Vec<bool>,
    /// Samples per symbol.
    period: usize,
    /// Samples to drop before the next window begins.
    skip: usize,
    polarity: Polarity,
    shift: Shift,
}

impl Slicer {
    /// Create a new `Slicer` for the given sample and symbol rates, which must divide
    /// evenly.
    pub fn new(sample_rate: usize, symbol_rate: usize, polarity: Polarity) -> Result<Slicer> {
        Ok(Slicer::with_period(samples_per_symbol(sample_rate, symbol_rate)?, polarity))
    }

    /// Create a new `Slicer` with the given nonzero number of samples per symbol.
    pub fn with_period(period: usize, polarity: Polarity) -> Slicer {
        assert!(period > 0);

        Slicer {
            window: Vec::with_capacity(period),
            period,
            skip: 0,
            polarity,
            shift: Shift::None,
        }
    }

    /// Samples per symbol.
    pub fn period(&self) -> usize { self.period }

    /// Timing adjustment made at the most recent decision.
    pub fn last_shift(&self) -> Shift { self.shift }

    /// Feed in a hard bit, returning a decided symbol at each window completion.
    pub fn feed(&mut self, bit: bool) -> Option<bool> {
        if self.skip > 0 {
            self.skip -= 1;
            return None;
        }

        self.window.push(bit);

        if self.window.len() < self.period {
            return None;
        }

        let ones = self.window.iter().filter(|&&b| b).count();
        let decision = ones * 2 >= self.period;

        let first = self.window[0];
        let last = self.window[self.period - 1];

        self.window.clear();

        self.shift = match (first == decision, last == decision) {
            (false, true) => {
                self.skip = 1;
                Shift::Left
            },
            (true, false) => {
                self.window.push(last);
                Shift::Right
            },
            _ => Shift::None,
        };

        Some(self.polarity.apply(decision))
    }

    /// Drop the current window and timing adjustment.
    pub fn reset(&mut self) {
        self.window.clear();
        self.skip = 0;
        self.shift = Shift::None;
    }
}

/// Compute the integral number of samples per symbol for the given rates.
pub fn samples_per_symbol(sample_rate: usize, symbol_rate: usize) -> Result<usize> {
    let err = P25Error::SamplesPerSymbol { sample_rate, symbol_rate };

    if symbol_rate == 0 {
        return Err(err);
    }

    match sample_rate.div_rem(&symbol_rate) {
        (n, 0) if n > 0 => Ok(n),
        _ => Err(err),
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

    fn slice(s: &mut Slicer, samples: &[bool]) -> (Vec<bool>, Vec<Shift>) {
        let mut out = vec![];
        let mut shifts = vec![];

        for &b in samples {
            if let Some(sym) = s.feed(b) {
                out.push(sym);
                shifts.push(s.last_shift());
            }
        }

        (out, shifts)
    }

    fn upsample(syms: &[bool], period: usize) -> Vec<bool> {
        syms.iter().flat_map(|&b| std::iter::repeat(b).take(period)).collect()
    }

    #[test]
    fn test_rates() {
        assert_eq!(samples_per_symbol(48000, 4800), Ok(10));
        assert_eq!(samples_per_symbol(7200, 1200), Ok(6));
        assert_eq!(samples_per_symbol(44100, 4800), Err(P25Error::SamplesPerSymbol {
            sample_rate: 44100,
            symbol_rate: 4800,
        }));
        assert!(samples_per_symbol(48000, 0).is_err());
        assert!(samples_per_symbol(1000, 4800).is_err());

        assert!(Slicer::new(44100, 4800, Polarity::Normal).is_err());
        assert_eq!(Slicer::new(48000, 4800, Polarity::Normal).unwrap().period(), 10);
    }

    #[test]
    fn test_majority() {
        let mut s = Slicer::with_period(4, Polarity::Normal);

        // Ties go to set.
        assert_eq!(slice(&mut s, &[true, true, false, false]).0, vec![true]);
        s.reset();
        assert_eq!(slice(&mut s, &[false, true, true, false]).0, vec![true]);
        s.reset();
        assert_eq!(slice(&mut s, &[false, true, false, false]).0, vec![false]);
    }

    #[test]
    fn test_shift_direction() {
        let mut s = Slicer::with_period(5, Polarity::Normal);
        assert_eq!(s.feed(false), None);
        s.reset();

        // Leading bit belongs to the previous symbol.
        for &b in &[false, true, true, true] {
            assert_eq!(s.feed(b), None);
        }
        assert_eq!(s.feed(true), Some(true));
        assert_eq!(s.last_shift(), Shift::Left);

        // The next sample is dropped.
        assert_eq!(s.feed(false), None);

        // Trailing bit belongs to the next symbol.
        for &b in &[false, false, false, false] {
            assert_eq!(s.feed(b), None);
        }
        assert_eq!(s.feed(true), Some(false));
        assert_eq!(s.last_shift(), Shift::Right);

        // The seeded window completes one sample early.
        for &b in &[true, true, true] {
            assert_eq!(s.feed(b), None);
        }
        assert_eq!(s.feed(true), Some(true));
        assert_eq!(s.last_shift(), Shift::None);
    }

    #[test]
    fn test_aligned() {
        let mut s = Slicer::with_period(10, Polarity::Normal);
        let (out, shifts) = slice(&mut s, &upsample(&SYMBOLS, 10));

        assert_eq!(out, SYMBOLS.to_vec());
        assert!(shifts.iter().all(|&s| s == Shift::None));
    }

    #[test]
    fn test_converge_early() {
        let mut samples = vec![false; 3];
        samples.extend(upsample(&SYMBOLS, 10));

        let mut s = Slicer::with_period(10, Polarity::Normal);
        let (out, shifts) = slice(&mut s, &samples);

        assert_eq!(out, SYMBOLS.to_vec());
        assert_eq!(&shifts[..3], &[Shift::Left; 3]);
        assert!(shifts[3..].iter().all(|&s| s == Shift::None));
    }

    #[test]
    fn test_converge_late() {
        let mut samples = vec![false; 7];
        samples.extend(upsample(&SYMBOLS, 10));

        let mut s = Slicer::with_period(10, Polarity::Normal);
        let (out, shifts) = slice(&mut s, &samples);

        assert_eq!(out[0], false);
        assert_eq!(&out[1..], &SYMBOLS[..]);
        assert_eq!(&shifts[..3], &[Shift::Right; 3]);
        assert!(shifts[3..].iter().all(|&s| s == Shift::None));
    }

    #[test]
    fn test_phase_jump() {
        // One extra sample injected mid-stream.
        let mut samples = upsample(&SYMBOLS[..16], 10);
        samples.push(SYMBOLS[15]);
        samples.extend(upsample(&SYMBOLS[16..], 10));

        let mut s = Slicer::with_period(10, Polarity::Normal);
        let (out, shifts) = slice(&mut s, &samples);

        assert_eq!(out, SYMBOLS.to_vec());
        assert_eq!(shifts.iter().filter(|&&s| s != Shift::None).count(), 1);
        assert_eq!(shifts[16], Shift::Left);

        // One sample dropped mid-stream.
        let mut samples = upsample(&SYMBOLS, 10);
        samples.remove(16 * 10);

        let mut s = Slicer::with_period(10, Polarity::Normal);
        let (out, shifts) = slice(&mut s, &samples);

        assert_eq!(out, SYMBOLS.to_vec());
        assert_eq!(shifts.iter().filter(|&&s| s != Shift::None).count(), 1);
        assert_eq!(shifts[17], Shift::Right);
    }

    #[test]
    fn test_polarity() {
        let mut s = Slicer::with_period(5, Polarity::Inverted);
        let (out, _) = slice(&mut s, &upsample(&SYMBOLS, 5));

        assert_eq!(out, SYMBOLS.iter().map(|&b| !b).collect::<Vec<_>>());
    }
}
