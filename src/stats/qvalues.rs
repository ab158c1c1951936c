use std::collections::HashMap;

use tracing::debug;

use crate::pileup::Pileup;

/// Monotone p-score to q-score lookup, fit once per run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QValueMapping {
    /// `(p, q)` pairs sorted by ascending `p`.
    points: Vec<(f64, f64)>,
}

impl QValueMapping {
    /// Fitted `(p, q)` pairs, ascending in `p`.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Number of distinct p-scores seen while fitting.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether nothing was fitted.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// q-score of the greatest fitted p-score not above `p`; 0 below all.
    pub fn q_value(&self, p: f64) -> f64 {
        let i = self.points.partition_point(|&(fitted, _)| fitted <= p);
        if i == 0 {
            0.0
        } else {
            self.points[i - 1].1
        }
    }

    /// Map a p-score track to q-scores.
    pub fn apply(&self, p_values: &Pileup) -> Pileup {
        p_values.map(|p| self.q_value(p))
    }
}

/// Accumulates base counts per p-score across any number of tracks.
///
/// Every base is one test; a run of length `l` contributes `l` tests with
/// the same p-score.
#[derive(Debug, Clone, Default)]
pub struct PToQMapper {
    counts: HashMap<u64, u64>,
    total: u64,
}

impl PToQMapper {
    /// Empty mapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every base of `p_values`.
    pub fn add_track(&mut self, p_values: &Pileup) {
        for node in p_values.iter() {
            for (start, end, p) in node.runs() {
                if p.is_nan() {
                    continue;
                }
                // Fold -0.0 into 0.0 so both share a key.
                let key = (p + 0.0).to_bits();
                *self.counts.entry(key).or_insert(0) += u64::from(end - start);
                self.total += u64::from(end - start);
            }
        }
    }

    /// Total number of bases counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Fit the Benjamini–Hochberg mapping in `-log10` space.
    ///
    /// Walking p-scores from largest to smallest, with `k` the rank of the
    /// first base carrying that p-score and `N` all bases,
    /// `q = max(0, min(q_prev, p + log10(k) - log10(N)))`.
    pub fn mapping(&self) -> QValueMapping {
        let mut by_p: Vec<(f64, u64)> = self
            .counts
            .iter()
            .map(|(&bits, &count)| (f64::from_bits(bits), count))
            .collect();
        by_p.sort_by(|a, b| b.0.total_cmp(&a.0));

        let log_total = (self.total.max(1) as f64).log10();
        let mut seen = 0u64;
        let mut previous = f64::INFINITY;
        let mut points = Vec::with_capacity(by_p.len());
        for (p, count) in by_p {
            let rank = (seen + 1) as f64;
            let q = (p + rank.log10() - log_total).min(previous).max(0.0);
            points.push((p, q));
            previous = q;
            seen += count;
        }
        points.reverse();
        debug!(
            distinct = points.len(),
            bases = self.total,
            "fitted p to q mapping"
        );
        QValueMapping { points }
    }
}
