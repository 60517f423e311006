//! Decodes Reed Solomon and BCH codes using the Berlekamp-Massey, Chien Search, and
//! Forney algorithms.
//!
//! Given the syndrome polynomial s(x) = s<sub>1</sub> + s<sub>2</sub>x + ··· +
//! s<sub>2t</sub>x<sup>2t-1</sup>, where s<sub>i</sub> = r(α<sup>i</sup>) for the
//! received word polynomial r(x):
//!
//! 1. Berlekamp-Massey builds the error locator polynomial Λ(x) = (1 +
//!    a<sub>1</sub>x) ··· (1 + a<sub>e</sub>x), where e = deg(Λ(x)) ≤ t.
//! 2. Chien Search finds the roots a<sub>i</sub><sup>-1</sup> of Λ(x). If the number of
//!    roots differs from e, the word is unrecoverable.
//! 3. Forney computes each error pattern b<sub>i</sub> = Ω(a<sub>i</sub><sup>-1</sup>) /
//!    Λ'(a<sub>i</sub><sup>-1</sup>), with the error evaluator Ω(x) = Λ(x)s(x) mod
//!    x<sup>2t</sup>.
//!
//! The Berlekamp-Massey variant here is Hankerson et al's, which views Λ(x) as the
//! connection polynomial of the shortest LFSR generating the syndromes and avoids any
//! inversion of intermediate polynomials.

use std::cmp;

use collect_slice::CollectSlice;

use crate::coding::galois::{Codeword, Polynomial, FIELD_SIZE};

/// Finds the error locator polynomial Λ(x) from the syndrome polynomial s(x).
///
/// The polynomial capacity `N` must be at least 2t + 2.
pub struct ErrorLocator<const N: usize> {
    /// Number of syndromes: 2t.
    syndromes: usize,
    /// Saved p polynomial: p<sub>zi-1</sub>.
    p_saved: Polynomial<N>,
    /// Previous iteration's p polynomial: p<sub>i-1</sub>.
    p_cur: Polynomial<N>,
    /// Saved q polynomial: q<sub>zi-1</sub>.
    q_saved: Polynomial<N>,
    /// Previous iteration's q polynomial: q<sub>i-1</sub>.
    q_cur: Polynomial<N>,
    /// Degree-related term of saved p polynomial: D<sub>zi-1</sub>
    deg_saved: usize,
    /// Degree-related term of previous p polynomial: D<sub>i-1</sub>.
    deg_cur: usize,
}

impl<const N: usize> ErrorLocator<N> {
    /// Construct a new `ErrorLocator` from the given 2t-term syndrome polynomial s(x).
    pub fn new(syn: Polynomial<N>, syndromes: usize) -> Self {
        assert!(syndromes + 2 <= N);

        ErrorLocator {
            syndromes,
            // 1 + s(x)
            q_saved: Polynomial::new(
                std::iter::once(Codeword::for_power(0))
                    .chain(syn.iter().take(syndromes).cloned())
            ),
            q_cur: syn,
            p_saved: Polynomial::unit_power(syndromes + 1),
            p_cur: Polynomial::unit_power(syndromes),
            deg_saved: 0,
            deg_cur: 1,
        }
    }

    /// Construct the error locator polynomial Λ(x).
    pub fn build(mut self) -> Polynomial<N> {
        for _ in 0..self.syndromes {
            self.step();
        }

        self.p_cur
    }

    fn step(&mut self) {
        let (save, q, p, d) = if self.q_cur.constant().zero() {
            // No degree-0 term, so just shift.
            (false, self.q_cur.shift(), self.p_cur.shift(), 2 + self.deg_cur)
        } else {
            // Normalize out the degree-0 term, then shift.
            let mult = self.q_cur.constant() / self.q_saved.constant();

            (
                self.deg_cur >= self.deg_saved,
                (self.q_cur + self.q_saved * mult).shift(),
                (self.p_cur + self.p_saved * mult).shift(),
                2 + cmp::min(self.deg_cur, self.deg_saved),
            )
        };

        if save {
            self.q_saved = self.q_cur;
            self.p_saved = self.p_cur;
            self.deg_saved = self.deg_cur;
        }

        self.q_cur = q;
        self.p_cur = p;
        self.deg_cur = d;
    }
}

/// Iterates over the powers i of all roots α<sup>i</sup> of an error locator polynomial,
/// using the Chien Search to avoid a full evaluation at each power.
pub struct PolynomialRoots<const N: usize> {
    /// Term values [Λ<sub>0</sub>α<sup>0i</sup>, ..., Λ<sub>e</sub>α<sup>ei</sup>] for the
    /// current power i, so Λ(α<sup>i</sup>) is their sum.
    terms: Polynomial<N>,
    pow: std::ops::Range<usize>,
}

impl<const N: usize> PolynomialRoots<N> {
    /// Construct a new `PolynomialRoots` from the given error locator polynomial Λ(x).
    pub fn new(loc: Polynomial<N>) -> Self {
        PolynomialRoots {
            terms: loc,
            pow: 0..FIELD_SIZE,
        }
    }

    fn update_terms(&mut self) {
        for (pow, term) in self.terms.iter_mut().enumerate() {
            *term = *term * Codeword::for_power(pow);
        }
    }

    fn eval(&self) -> Codeword {
        self.terms.iter().fold(Codeword::default(), |sum, &x| sum + x)
    }
}

impl<const N: usize> Iterator for PolynomialRoots<N> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            let pow = self.pow.next()?;

            let eval = self.eval();
            self.update_terms();

            if eval.zero() {
                return Some(pow);
            }
        }
    }
}

/// Decodes and iterates over the errors in a received word, yielding the location and
/// pattern of each.
pub struct Errors {
    errs: Vec<(usize, Codeword)>,
    pos: usize,
}

impl Errors {
    /// Create a new `Errors` decoder from the given 2t-term syndrome polynomial s(x).
    ///
    /// Return `Some((nerr, errs))` if decoding was successful, where `nerr` is the number
    /// of detected errors and `errs` iterates over them, or `None` if the word is
    /// unrecoverable.
    pub fn new<const N: usize>(syn: Polynomial<N>, syndromes: usize)
        -> Option<(usize, Errors)>
    {
        let loc = ErrorLocator::new(syn, syndromes).build();
        let errors = loc.degree()?;

        // Roots are collected before any evaluation: if their count differs from deg(Λ)
        // they are all invalid and the derivative may vanish at them.
        let mut roots = [0; N];
        let nroots = PolynomialRoots::new(loc).collect_slice(&mut roots[..]);

        if nroots != errors {
            return None;
        }

        let deriv = loc.deriv();
        let vals = (loc * syn).truncate(syndromes - 1);

        let errs = roots[..nroots].iter().map(|&pow| {
            let root = Codeword::for_power(pow);
            let denom = deriv.eval(root);

            if denom.zero() {
                return None;
            }

            // If Λ(α^i) = 0, the error location is m ≡ -i (modulo the field.)
            Some(((FIELD_SIZE - pow) % FIELD_SIZE, vals.eval(root) / denom))
        }).collect::<Option<Vec<_>>>()?;

        Some((errors, Errors { errs, pos: 0 }))
    }
}

impl Iterator for Errors {
    type Item = (usize, Codeword);

    fn next(&mut self) -> Option<Self::Item> {
        let err = self.errs.get(self.pos).cloned();
        self.pos += 1;
        err
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type TestPolynomial = Polynomial<10>;

    #[test]
    fn test_roots() {
        // p(x) = (1+α^42x)(1+α^13x)(1+α^57x)
        let p = TestPolynomial::new([
            Codeword::for_power(0),
            Codeword::for_power(42),
        ].iter().cloned()) * TestPolynomial::new([
            Codeword::for_power(0),
            Codeword::for_power(13),
        ].iter().cloned()) * TestPolynomial::new([
            Codeword::for_power(0),
            Codeword::for_power(57),
        ].iter().cloned());

        let roots = PolynomialRoots::new(p).collect::<Vec<_>>();

        assert_eq!(roots.len(), 3);
        assert!(roots.contains(&(63 - 42)));
        assert!(roots.contains(&(63 - 13)));
        assert!(roots.contains(&(63 - 57)));

        assert_eq!(PolynomialRoots::new(TestPolynomial::unit_power(0)).count(), 0);
    }

    /// Syndromes s_1..s_2t of a single error of pattern α^b at location m.
    fn single_error(m: usize, b: usize, syndromes: usize) -> TestPolynomial {
        TestPolynomial::new((1..=syndromes).map(|p| {
            Codeword::for_power(b) * Codeword::for_power(m * p)
        }))
    }

    #[test]
    fn test_single_error() {
        let syn = single_error(17, 5, 8);
        let (n, mut errs) = Errors::new(syn, 8).unwrap();

        assert_eq!(n, 1);

        let (loc, pat) = errs.next().unwrap();
        assert_eq!(loc, 17);
        assert_eq!(pat.power(), Some(5));
        assert!(errs.next().is_none());
    }

    #[test]
    fn test_double_error() {
        let mut syn = single_error(3, 0, 8);

        for (c, &e) in syn.iter_mut().zip(single_error(40, 22, 8).iter()) {
            *c = *c + e;
        }

        let (n, errs) = Errors::new(syn, 8).unwrap();
        assert_eq!(n, 2);

        let mut errs = errs.collect::<Vec<_>>();
        errs.sort_by_key(|&(loc, _)| loc);

        assert_eq!(errs[0].0, 3);
        assert_eq!(errs[0].1.power(), Some(0));
        assert_eq!(errs[1].0, 40);
        assert_eq!(errs[1].1.power(), Some(22));
    }

    #[test]
    fn test_no_error() {
        let (n, mut errs) = Errors::new(TestPolynomial::default(), 8).unwrap();
        assert_eq!(n, 0);
        assert!(errs.next().is_none());
    }
}
