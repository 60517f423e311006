//! Galois field arithmetic for codewords and polynomials.

use std::fmt;
use std::ops::{Add, Deref, DerefMut, Div, Mul, Sub};

use collect_slice::CollectSlice;

/// Number of nonzero codewords in GF(2<sup>6</sup>).
pub const FIELD_SIZE: usize = 63;

/// Characteristic polynomial h(x) = x<sup>6</sup> + x + 1.
const CHARACTERISTIC: u8 = 0b1000011;

/// Each entry α<sup>i</sup> represents the polynomial x<sup>i</sup> mod h(x).
const CODEWORDS: [u8; FIELD_SIZE] = build_codewords();

/// Maps each nonzero bit pattern back to its power i.
const POWERS: [u8; FIELD_SIZE + 1] = build_powers();

const fn build_codewords() -> [u8; FIELD_SIZE] {
    let mut table = [0; FIELD_SIZE];
    let mut x = 1u8;
    let mut i = 0;

    while i < FIELD_SIZE {
        table[i] = x;
        x <<= 1;

        if x & 0b1000000 != 0 {
            x ^= CHARACTERISTIC;
        }

        i += 1;
    }

    table
}

const fn build_powers() -> [u8; FIELD_SIZE + 1] {
    let mut table = [0; FIELD_SIZE + 1];
    let mut i = 0;

    while i < FIELD_SIZE {
        table[CODEWORDS[i] as usize] = i as u8;
        i += 1;
    }

    table
}

/// Codeword in the GF(2<sup>6</sup>) field characterized by α<sup>6</sup>+α+1, as used
/// throughout P25.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Codeword(u8);

impl Codeword {
    /// Construct a new `Codeword` from the given bit pattern. Panic if the pattern has
    /// more than 6 bits.
    pub fn new(bits: u8) -> Codeword {
        assert!(bits >> 6 == 0);
        Codeword(bits)
    }

    /// Construct the codeword α<sup>m</sup> ≡ α<sup>i</sup> (modulo the field) for the
    /// given power i.
    pub fn for_power(power: usize) -> Codeword {
        Codeword(CODEWORDS[power % FIELD_SIZE])
    }

    /// Retrieve the bit pattern of the codeword.
    pub fn bits(&self) -> u8 { self.0 }

    /// Check if the codeword is zero.
    pub fn zero(&self) -> bool { self.0 == 0 }

    /// Retrieve the power i of the current codeword α<sup>i</sup>, or `None` if the
    /// codeword is zero.
    pub fn power(&self) -> Option<usize> {
        if self.zero() {
            None
        } else {
            Some(POWERS[self.0 as usize] as usize)
        }
    }

    /// Find 1/α<sup>i</sup> for the current codeword α<sup>i</sup>. Panic if the codeword
    /// is zero.
    pub fn invert(self) -> Codeword {
        match self.power() {
            Some(p) => Codeword::for_power(FIELD_SIZE - p),
            None => panic!("invert zero"),
        }
    }

    /// Compute (α<sup>i</sup>)<sup>p</sup> for the current codeword α<sup>i</sup>.
    pub fn pow(&self, pow: usize) -> Codeword {
        match self.power() {
            Some(p) => Codeword::for_power(p * pow),
            None => Codeword::default(),
        }
    }
}

impl Add for Codeword {
    type Output = Codeword;

    fn add(self, rhs: Codeword) -> Codeword {
        Codeword(self.0 ^ rhs.0)
    }
}

/// "Subtraction" is equivalent to addition in GF(2<sup>r</sup>).
impl Sub for Codeword {
    type Output = Codeword;

    fn sub(self, rhs: Codeword) -> Codeword {
        self + rhs
    }
}

impl Mul for Codeword {
    type Output = Codeword;

    fn mul(self, rhs: Codeword) -> Codeword {
        match (self.power(), rhs.power()) {
            (Some(p), Some(q)) => Codeword::for_power(p + q),
            _ => Codeword::default(),
        }
    }
}

/// Panics if the divisor is zero.
impl Div for Codeword {
    type Output = Codeword;

    fn div(self, rhs: Codeword) -> Codeword {
        match (self.power(), rhs.power()) {
            // Ensure non-negative power.
            (Some(p), Some(q)) => Codeword::for_power(FIELD_SIZE + p - q),
            (None, Some(_)) => Codeword::default(),
            (_, None) => panic!("divide by zero"),
        }
    }
}

impl PartialEq<u8> for Codeword {
    fn eq(&self, other: &u8) -> bool {
        self.0 == *other
    }
}

impl fmt::Debug for Codeword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.power() {
            Some(p) => write!(f, "α^{}", p),
            None => write!(f, "0"),
        }
    }
}

/// Polynomial with GF(2<sup>6</sup>) coefficients and capacity for `N` terms.
///
/// Terms that would land beyond the capacity are silently discarded, so every operation
/// is effectively computed mod x<sup>N</sup>.
#[derive(Copy, Clone)]
pub struct Polynomial<const N: usize> {
    coefs: [Codeword; N],
    /// Index into `coefs` of the degree-0 coefficient. Coefficients with a lesser index
    /// are zero.
    start: usize,
}

impl<const N: usize> Polynomial<N> {
    /// Construct a new `Polynomial` from the given coefficients c<sub>0</sub>, ...,
    /// c<sub>k</sub>, giving p(x) = c<sub>0</sub> + c<sub>1</sub>x + ··· +
    /// c<sub>k</sub>x<sup>k</sup>.
    pub fn new<T: Iterator<Item = Codeword>>(mut init: T) -> Self {
        let mut coefs = [Codeword::default(); N];
        init.collect_slice_exhaust(&mut coefs[..]);

        Polynomial { coefs, start: 0 }
    }

    /// Construct the single term p(x) = x<sup>n</sup>.
    pub fn unit_power(n: usize) -> Self {
        let mut p = Self::default();
        p.coefs[n] = Codeword::for_power(0);
        p
    }

    /// Retrieve the degree-0 coefficient, c<sub>0</sub>.
    pub fn constant(&self) -> Codeword {
        self.coefs[self.start]
    }

    /// Compute deg(p(x)), or `None` if p(x) = 0.
    pub fn degree(&self) -> Option<usize> {
        self.coefs.iter()
            .rposition(|c| !c.zero())
            .map(|deg| deg - self.start)
    }

    /// Divide the polynomial by x. Panic if c<sub>0</sub> ≠ 0.
    pub fn shift(mut self) -> Self {
        assert!(self.constant().zero());

        self.start += 1;
        self
    }

    /// Retrieve the coefficient c<sub>i</sub> of the x<sup>i</sup> term, or zero if i is
    /// beyond the capacity.
    pub fn coef(&self, i: usize) -> Codeword {
        self.coefs.get(self.start + i).cloned().unwrap_or_default()
    }

    /// Evaluate p(x) at the given x using Horner's method.
    pub fn eval(&self, x: Codeword) -> Codeword {
        self.iter().rev().fold(Codeword::default(), |s, &coef| s * x + coef)
    }

    /// Truncate the polynomial so that deg(p(x)) ≤ `deg`.
    pub fn truncate(mut self, deg: usize) -> Self {
        for c in self.coefs.iter_mut().skip(self.start + deg + 1) {
            *c = Codeword::default();
        }

        self
    }

    /// Compute the formal derivative p'(x).
    pub fn deriv(self) -> Self {
        // Only odd-degree terms survive in characteristic 2.
        Polynomial::new((1..N).map(|i| {
            if i % 2 == 1 { self.coef(i) } else { Codeword::default() }
        }))
    }
}

impl<const N: usize> Default for Polynomial<N> {
    /// Construct the zero polynomial.
    fn default() -> Self {
        Polynomial { coefs: [Codeword::default(); N], start: 0 }
    }
}

/// Provides the coefficients starting at the degree-0 term.
impl<const N: usize> Deref for Polynomial<N> {
    type Target = [Codeword];
    fn deref(&self) -> &[Codeword] { &self.coefs[self.start..] }
}

impl<const N: usize> DerefMut for Polynomial<N> {
    fn deref_mut(&mut self) -> &mut [Codeword] { &mut self.coefs[self.start..] }
}

impl<const N: usize> Add for Polynomial<N> {
    type Output = Polynomial<N>;

    fn add(self, rhs: Polynomial<N>) -> Self::Output {
        Polynomial::new((0..N).map(|i| self.coef(i) + rhs.coef(i)))
    }
}

impl<const N: usize> Mul<Codeword> for Polynomial<N> {
    type Output = Polynomial<N>;

    fn mul(mut self, rhs: Codeword) -> Self::Output {
        for coef in self.iter_mut() {
            *coef = *coef * rhs;
        }

        self
    }
}

impl<const N: usize> Mul<Polynomial<N>> for Polynomial<N> {
    type Output = Polynomial<N>;

    fn mul(self, rhs: Polynomial<N>) -> Self::Output {
        let mut out = Polynomial::<N>::default();

        for (i, &coef) in self.iter().enumerate() {
            for (j, &mult) in rhs.iter().enumerate() {
                if let Some(c) = out.coefs.get_mut(i + j) {
                    *c = *c + coef * mult;
                }
            }
        }

        out
    }
}

impl<const N: usize> fmt::Debug for Polynomial<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Polynomial({:?})", &self[..])
    }
}
