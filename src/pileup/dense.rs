use bitvec::prelude::*;

use crate::graph::{Graph, GraphError};
use crate::interval::{Areas, Interval, ValidationError};

use super::{Pileup, PileupValue};

/// Packed per-base depth array.
///
/// Node `idx` occupies `values[offsets[idx]..offsets[idx] + lengths[idx]]`,
/// offsets assigned in the graph's topological order. A node is "touched"
/// once any of its cells received a nonzero contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensePileup {
    offsets: Vec<usize>,
    lengths: Vec<u32>,
    values: Vec<u32>,
    touched: BitVec,
}

impl DensePileup {
    /// Zero-depth array laid out for `graph`.
    pub fn new(graph: &Graph) -> Self {
        let n = graph.node_count();
        let mut offsets = vec![0usize; n];
        let mut cursor = 0usize;
        for &idx in graph.topological_indices() {
            offsets[idx] = cursor;
            cursor += graph.length_at(idx) as usize;
        }
        Self {
            offsets,
            lengths: (0..n).map(|idx| graph.length_at(idx)).collect(),
            values: vec![0; cursor],
            touched: bitvec![0; n],
        }
    }

    /// Number of nodes in the layout.
    pub fn node_count(&self) -> usize {
        self.offsets.len()
    }

    /// Whole packed array in topological layout.
    pub fn as_slice(&self) -> &[u32] {
        &self.values
    }

    /// Offset of node `idx` in the packed array.
    pub fn offset(&self, idx: usize) -> usize {
        self.offsets[idx]
    }

    /// Depths of node `idx` in forward coordinates.
    pub fn node_values(&self, idx: usize) -> &[u32] {
        let start = self.offsets[idx];
        &self.values[start..start + self.lengths[idx] as usize]
    }

    /// Mutable depths of node `idx`.
    pub fn node_values_mut(&mut self, idx: usize) -> &mut [u32] {
        let start = self.offsets[idx];
        &mut self.values[start..start + self.lengths[idx] as usize]
    }

    /// Flag node `idx` as carrying coverage.
    pub fn mark_touched(&mut self, idx: usize) {
        self.touched.set(idx, true);
    }

    /// Whether node `idx` carries coverage.
    pub fn is_touched(&self, idx: usize) -> bool {
        self.touched[idx]
    }

    /// Number of touched nodes.
    pub fn touched_count(&self) -> usize {
        self.touched.count_ones()
    }

    /// Increment depth over `[start, end)` of node `idx` (forward coordinates).
    pub fn add_range(&mut self, idx: usize, start: u32, end: u32) {
        if start >= end {
            return;
        }
        for cell in &mut self.node_values_mut(idx)[start as usize..end as usize] {
            *cell += 1;
        }
        self.mark_touched(idx);
    }

    /// Add one unit of depth over every base of `interval`.
    pub fn add_interval(&mut self, graph: &Graph, interval: &Interval) -> Result<(), ValidationError> {
        for (node, start, end) in interval.forward_ranges(graph)? {
            let idx = graph
                .index_of(node)
                .ok_or(ValidationError::AbsentNode { node })?;
            self.add_range(idx, start, end);
        }
        Ok(())
    }

    /// Add one unit of depth over every covered base of `areas`.
    pub fn add_areas(&mut self, graph: &Graph, areas: &Areas) -> Result<(), GraphError> {
        for (node, ranges) in areas.iter() {
            let idx = graph.index_of(node).ok_or(GraphError::MissingNode(node))?;
            for &(start, end) in ranges {
                self.add_range(idx, start, end);
            }
        }
        Ok(())
    }

    /// Sum another pileup with the same layout into this one.
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.offsets, other.offsets);
        for (cell, &value) in self.values.iter_mut().zip(&other.values) {
            *cell += value;
        }
        self.touched |= other.touched.as_bitslice();
    }

    /// Total depth over all bases.
    pub fn total(&self) -> u64 {
        self.values.iter().map(|&v| u64::from(v)).sum()
    }

    /// Compress into a per-node run-length track.
    pub fn to_pileup(&self) -> Pileup {
        let values = (0..self.node_count())
            .map(|idx| {
                if self.is_touched(idx) {
                    PileupValue::from_dense(self.node_values(idx))
                } else {
                    PileupValue::constant(self.lengths[idx], 0.0)
                }
            })
            .collect();
        Pileup::from_values(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_follows_topological_order() {
        let graph = Graph::from_edges([(1, 3), (2, 4), (3, 2)], [(3, 1), (1, 2)]).unwrap();
        let pileup = DensePileup::new(&graph);
        assert_eq!(pileup.as_slice().len(), 9);
        assert_eq!(pileup.offset(graph.index_of(3).unwrap()), 0);
        assert_eq!(pileup.offset(graph.index_of(1).unwrap()), 2);
        assert_eq!(pileup.offset(graph.index_of(2).unwrap()), 5);
    }

    #[test]
    fn intervals_add_depth_in_forward_coordinates() {
        let graph = Graph::from_edges([(1, 5), (2, 5)], [(1, 2)]).unwrap();
        let mut pileup = DensePileup::new(&graph);
        pileup
            .add_interval(&graph, &Interval::new(3, 3, vec![1, 2]))
            .unwrap();
        pileup
            .add_interval(&graph, &Interval::new(0, 2, vec![-2]))
            .unwrap();
        assert_eq!(pileup.as_slice(), &[0, 0, 0, 1, 1, 1, 1, 1, 1, 1]);
        assert_eq!(pileup.touched_count(), 2);
        assert_eq!(pileup.total(), 7);
    }

    #[test]
    fn merge_sums_and_unions_touched() {
        let graph = Graph::from_edges([(1, 2), (2, 2)], [(1, 2)]).unwrap();
        let mut a = DensePileup::new(&graph);
        a.add_range(0, 0, 1);
        let mut b = DensePileup::new(&graph);
        b.add_range(1, 1, 2);
        a.merge(&b);
        assert_eq!(a.as_slice(), &[1, 0, 0, 1]);
        assert!(a.is_touched(0) && a.is_touched(1));
        let track = a.to_pileup();
        assert_eq!(track.node(1).value_at(1), 1.0);
    }
}
