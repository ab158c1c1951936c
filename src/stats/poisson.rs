use std::collections::HashMap;
use std::f64::consts::{LN_10, PI};

use crate::pileup::Pileup;

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
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

/// Terms below this fraction of the running sum no longer change the tail.
const TAIL_EPSILON: f64 = 1e-17;
const MAX_TAIL_TERMS: u64 = 1_000_000;

/// Natural log of the gamma function (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula.
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut acc = LANCZOS[0];
    for (i, &coef) in LANCZOS.iter().enumerate().skip(1) {
        acc += coef / (x + i as f64);
    }
    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

fn ln_pmf(k: u64, lambda: f64) -> f64 {
    let k = k as f64;
    k * lambda.ln() - lambda - ln_gamma(k + 1.0)
}

/// Natural log of `P(X > k)` for `X ~ Poisson(lambda)`, `lambda > 0`.
fn ln_upper_tail(k: u64, lambda: f64) -> f64 {
    if (k as f64) + 1.0 > lambda {
        // Terms decrease from k + 1 onwards: sum them relative to the first.
        let first = ln_pmf(k + 1, lambda);
        let mut term = 0.0f64;
        let mut total = 1.0f64;
        let mut i = k + 1;
        while i < k + MAX_TAIL_TERMS {
            i += 1;
            term += lambda.ln() - (i as f64).ln();
            let ratio = term.exp();
            total += ratio;
            if ratio < total * TAIL_EPSILON {
                break;
            }
        }
        first + total.ln()
    } else {
        let cdf: f64 = (0..=k).map(|i| ln_pmf(i, lambda).exp()).sum();
        (-cdf.min(1.0)).ln_1p()
    }
}

/// `-log10 P(X > floor(observed))` for `X ~ Poisson(expected)`.
///
/// An empty tail (zero expectation) scores `+inf`; a negative observation
/// leaves the whole distribution in the tail and scores 0.
pub fn poisson_p_score(expected: f64, observed: f64) -> f64 {
    let observed = observed.floor();
    if observed < 0.0 {
        return 0.0;
    }
    if expected <= 0.0 {
        return f64::INFINITY;
    }
    let score = -ln_upper_tail(observed as u64, expected) / LN_10;
    // Avoid reporting -0.0 for a certain tail.
    score.max(0.0)
}

/// Pointwise p-score of `sample` against `control`.
///
/// Scores are cached per distinct `(control, sample)` pair since the run
/// lengths of both tracks make pairs repeat heavily.
pub fn p_value_track(control: &Pileup, sample: &Pileup) -> Pileup {
    let mut cache: HashMap<(u64, u64), f64> = HashMap::new();
    control.combine(sample, |expected, observed| {
        *cache
            .entry((expected.to_bits(), observed.floor().to_bits()))
            .or_insert_with(|| poisson_p_score(expected, observed))
    })
}
