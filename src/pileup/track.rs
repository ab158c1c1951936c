use crate::graph::{Graph, NodeId};

use super::PileupValue;

/// Sparse graph-wide track: one [`PileupValue`] per node, indexed by the
/// graph's node index.
#[derive(Debug, Clone, PartialEq)]
pub struct Pileup {
    values: Vec<PileupValue>,
}

impl Pileup {
    /// Wrap per-node functions already laid out by node index.
    pub fn from_values(values: Vec<PileupValue>) -> Self {
        Self { values }
    }

    /// Track holding `value` on every base of `graph`.
    pub fn constant(graph: &Graph, value: f64) -> Self {
        Self {
            values: (0..graph.node_count())
                .map(|idx| PileupValue::constant(graph.length_at(idx), value))
                .collect(),
        }
    }

    /// Number of nodes covered.
    pub fn node_count(&self) -> usize {
        self.values.len()
    }

    /// Function of the node at table index `idx`.
    pub fn node(&self, idx: usize) -> &PileupValue {
        &self.values[idx]
    }

    /// Function of a node looked up by id (strand ignored).
    pub fn get(&self, graph: &Graph, node: NodeId) -> Option<&PileupValue> {
        graph.index_of(node).and_then(|idx| self.values.get(idx))
    }

    /// Per-node functions in index order.
    pub fn iter(&self) -> impl Iterator<Item = &PileupValue> {
        self.values.iter()
    }

    /// Multiply every value by `factor` in place.
    pub fn scale(&mut self, factor: f64) {
        for value in &mut self.values {
            *value = value.map(|v| v * factor);
        }
    }

    /// Raise every value below `min` to `min`.
    pub fn floor(&mut self, min: f64) {
        for value in &mut self.values {
            *value = value.map(|v| v.max(min));
        }
    }

    /// Apply `f` to every value.
    pub fn map(&self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self {
            values: self.values.iter().map(|value| value.map(&mut f)).collect(),
        }
    }

    /// Pointwise combination with a track over the same graph.
    pub fn combine(&self, other: &Self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        debug_assert_eq!(self.values.len(), other.values.len());
        Self {
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| a.combine(b, &mut f))
                .collect(),
        }
    }

    /// Sum over a directed range: `[start, end)` in `node`'s own coordinates.
    pub fn directed_sum(&self, graph: &Graph, node: NodeId, start: u32, end: u32) -> f64 {
        let Some(value) = self.get(graph, node) else {
            return 0.0;
        };
        if node < 0 {
            let length = value.length();
            value.sum(length - end.min(length), length - start.min(length))
        } else {
            value.sum(start, end)
        }
    }

    /// Largest value anywhere on the track.
    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .map(PileupValue::max_value)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Per-node ranges whose value is at least `min_value`.
    pub fn threshold(&self, min_value: f64) -> Vec<Vec<(u32, u32)>> {
        self.values
            .iter()
            .map(|value| value.threshold(min_value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Graph {
        Graph::from_edges([(1, 10), (2, 10)], [(1, 2)]).unwrap()
    }

    #[test]
    fn scale_and_floor_apply_everywhere() {
        let graph = graph();
        let mut track = Pileup::from_values(vec![
            PileupValue::from_breakpoints(10, 2.0, vec![(5, 8.0)]),
            PileupValue::constant(10, 0.0),
        ]);
        track.scale(0.5);
        track.floor(1.5);
        assert_eq!(track.get(&graph, 1).unwrap().values(), &[4.0]);
        assert_eq!(track.get(&graph, 1).unwrap().start_value(), 1.5);
        assert_eq!(track.get(&graph, -2).unwrap().start_value(), 1.5);
        assert_eq!(track.max_value(), 4.0);
    }

    #[test]
    fn directed_sum_flips_reverse_coordinates() {
        let graph = graph();
        let track = Pileup::from_values(vec![
            PileupValue::from_breakpoints(10, 1.0, vec![(8, 5.0)]),
            PileupValue::constant(10, 0.0),
        ]);
        assert_eq!(track.directed_sum(&graph, 1, 0, 2), 2.0);
        assert_eq!(track.directed_sum(&graph, -1, 0, 2), 10.0);
        assert_eq!(track.directed_sum(&graph, 7, 0, 2), 0.0);
    }
}
