use rand::Rng;
use std::f64::consts::PI;

use crate::error::{NnError, Result};

/// Below this trial count samples are drawn by counting Bernoulli successes.
const DIRECT_METHOD_LIMIT: u64 = 25;

/// Binomial distribution over `n` trials with success probability `p`.
///
/// Sampling follows Numerical Recipes (2nd ed., §7.3): the direct method for
/// small `n`, rejection with a Poisson proposal when the mean is below one,
/// and rejection with a Cauchy (Lorentzian) proposal otherwise. The random
/// source is always supplied by the caller so runs can be seeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binomial {
    n: u64,
    p: f64,
}

impl Binomial {
    pub fn new(n: u64, p: f64) -> Result<Binomial> {
        if n == 0 {
            return Err(NnError::InvalidHyperparameter(
                "binomial trial count must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(NnError::InvalidHyperparameter(format!(
                "binomial probability must be in [0, 1], got {p}"
            )));
        }
        Ok(Binomial { n, p })
    }

    pub fn trials(&self) -> u64 {
        self.n
    }

    pub fn probability(&self) -> f64 {
        self.p
    }

    pub fn mean(&self) -> f64 {
        self.n as f64 * self.p
    }

    /// Draws one variate in `0..=n`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        // Sample the smaller tail and mirror the result back.
        let flipped = self.p > 0.5;
        let p = if flipped { 1.0 - self.p } else { self.p };
        let n = self.n as f64;
        let am = n * p;

        let successes = if self.n < DIRECT_METHOD_LIMIT {
            (0..self.n).filter(|_| rng.gen::<f64>() < p).count() as f64
        } else if am < 1.0 {
            sample_poisson_rejection(rng, n, p, am)
        } else {
            sample_cauchy_rejection(rng, n, p, am)
        };

        let k = if flipped { n - successes } else { successes };
        k as u64
    }
}

fn exp1<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    -(1.0 - rng.gen::<f64>()).ln()
}

/// Padé approximant of `ln(1 + z)`.
fn log1p_pade(z: f64) -> f64 {
    (1.0 + 0.5 * z) * z / (1.0 + (1.0 + z / 6.0) * z)
}

fn sample_poisson_rejection<R: Rng + ?Sized>(rng: &mut R, n: f64, p: f64, am: f64) -> f64 {
    const LOG_M: f64 = 2.6e-2;
    let pclog = log1p_pade(-p);
    loop {
        let mut bnl = 0.0;
        let mut t = 0.0;
        for _ in 0..n as u64 {
            t += exp1(rng);
            if t >= am {
                break;
            }
            bnl += 1.0;
        }
        let bnlc = n - bnl;
        let log1p = log1p_pade(-bnl / n);
        // Stirling's expansion of ln(n!).
        let t = (bnlc + 0.5) * log1p + bnl - bnlc * pclog + 1.0 / (12.0 * bnlc) - am + LOG_M;
        if exp1(rng) >= t {
            return bnl;
        }
    }
}

fn sample_cauchy_rejection<R: Rng + ?Sized>(rng: &mut R, n: f64, p: f64, am: f64) -> f64 {
    let g = ln_gamma(n + 1.0);
    let plog = p.ln();
    let pclog = (-p).ln_1p();
    let sq = (2.0 * am * (1.0 - p)).sqrt();
    loop {
        let mut em;
        let mut y;
        loop {
            y = (PI * rng.gen::<f64>()).tan();
            em = sq * y + am;
            if em >= 0.0 && em < n + 1.0 {
                break;
            }
        }
        em = em.floor();
        let t = 1.2
            * sq
            * (1.0 + y * y)
            * (g - ln_gamma(em + 1.0) - ln_gamma(n - em + 1.0) + em * plog + (n - em) * pclog)
                .exp();
        if rng.gen::<f64>() <= t {
            return em;
        }
    }
}

/// Lanczos approximation of `ln Γ(x)` for `x > 0`.
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula.
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut a = COEFFS[0];
    let t = x + G + 0.5;
    for (i, c) in COEFFS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}
