//! Circular averaging of hard-limited samples.

/// Fixed-length circular buffer of boolean samples, tracking how many are set.
///
/// The buffer doubles as a delay line: each pushed sample evicts the one pushed
/// `len` samples earlier.
#[derive(Clone, Debug)]
pub struct BoolAverager {
    window: Vec<bool>,
    /// Index of the oldest sample.
    pos: usize,
    /// Number of set samples in the window.
    ones: usize,
}

impl BoolAverager {
    /// Create a new `BoolAverager` over `len` samples, initially all clear.
    pub fn new(len: usize) -> BoolAverager {
        assert!(len > 0);

        BoolAverager {
            window: vec![false; len],
            pos: 0,
            ones: 0,
        }
    }

    /// Number of samples in the window.
    pub fn len(&self) -> usize { self.window.len() }

    /// Number of set samples in the window.
    pub fn ones(&self) -> usize { self.ones }

    /// Add a sample, returning the sample it evicted.
    pub fn push(&mut self, bit: bool) -> bool {
        let old = std::mem::replace(&mut self.window[self.pos], bit);

        self.ones = self.ones + bit as usize - old as usize;
        self.pos = (self.pos + 1) % self.window.len();

        old
    }

    /// Majority decision over the window, with ties going to set.
    pub fn average(&self) -> bool { self.ones * 2 >= self.window.len() }

    /// Add a sample and return the new majority decision.
    pub fn feed(&mut self, bit: bool) -> bool {
        self.push(bit);
        self.average()
    }

    /// Clear all samples.
    pub fn reset(&mut self) {
        self.window.iter_mut().for_each(|b| *b = false);
        self.pos = 0;
        self.ones = 0;
    }
}
