use std::collections::{BTreeMap, HashMap};

use crate::graph::{Graph, NodeId};

use super::{node_length, to_forward, Interval, ValidationError};

/// Covered subranges per positive node, sorted and merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Areas {
    covered: BTreeMap<NodeId, Vec<(u32, u32)>>,
}

impl Areas {
    /// Empty area set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit positive-strand ranges (test and fixture helper).
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, u32, u32)>,
    {
        let mut areas = Self::new();
        for (node, start, end) in ranges {
            areas.insert(node, start, end);
        }
        areas
    }

    /// Add a directed range; negative nodes are flipped to forward coordinates.
    pub fn add(&mut self, node: NodeId, start: u32, end: u32, length: u32) {
        let (node, start, end) = to_forward(node, start, end, length);
        self.insert(node, start, end);
    }

    fn insert(&mut self, node: NodeId, start: u32, end: u32) {
        if start >= end {
            return;
        }
        let ranges = self.covered.entry(node).or_default();
        ranges.push((start, end));
        ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for &(s, e) in ranges.iter() {
            match merged.last_mut() {
                Some(last) if s <= last.1 => last.1 = last.1.max(e),
                _ => merged.push((s, e)),
            }
        }
        *ranges = merged;
    }

    /// Union with every range of `other`.
    pub fn merge(&mut self, other: &Areas) {
        for (node, ranges) in other.iter() {
            for &(start, end) in ranges {
                self.insert(node, start, end);
            }
        }
    }

    /// Covered ranges on a positive node.
    pub fn get(&self, node: NodeId) -> &[(u32, u32)] {
        self.covered.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(node, ranges)` in node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[(u32, u32)])> {
        self.covered.iter().map(|(&node, ranges)| (node, ranges.as_slice()))
    }

    /// Whether nothing is covered.
    pub fn is_empty(&self) -> bool {
        self.covered.is_empty()
    }

    /// Total covered bases.
    pub fn total_length(&self) -> u64 {
        self.covered
            .values()
            .flatten()
            .map(|&(s, e)| u64::from(e - s))
            .sum()
    }
}

/// Extends read intervals to their full fragment footprint.
#[derive(Debug, Clone, Copy)]
pub struct Extender<'g> {
    graph: &'g Graph,
    fragment_length: u32,
}

impl<'g> Extender<'g> {
    /// Create an extender for a fixed fragment length.
    pub fn new(graph: &'g Graph, fragment_length: u32) -> Self {
        Self {
            graph,
            fragment_length,
        }
    }

    /// Footprint of the fragment that starts with `interval`.
    ///
    /// Past the read's 3' end the walk follows every successor, since the
    /// true downstream path is unknown; walks stop at dead ends.
    pub fn extend(&self, interval: &Interval) -> Result<Areas, ValidationError> {
        let mut areas = Areas::new();
        let mut covered = 0u64;
        for (node, start, end) in interval.directed_ranges(self.graph)? {
            areas.add(node, start, end, node_length(self.graph, node)?);
            covered += u64::from(end - start);
        }

        let remaining = u64::from(self.fragment_length).saturating_sub(covered);
        let last = interval.last_node().ok_or(ValidationError::EmptyPath)?;
        if remaining == 0 {
            return Ok(areas);
        }
        let end = interval.end.min(node_length(self.graph, last)?);

        // Largest remainder seen entering each directed node at offset 0; a
        // smaller remainder covers a subset and is skipped.
        let mut entered: HashMap<NodeId, u64> = HashMap::new();
        let mut stack = vec![(last, end, remaining)];
        while let Some((node, offset, remaining)) = stack.pop() {
            let length = node_length(self.graph, node)?;
            let available = u64::from(length.saturating_sub(offset));
            if remaining <= available {
                areas.add(node, offset, offset + remaining as u32, length);
                continue;
            }
            areas.add(node, offset, length, length);
            let left = remaining - available;
            for &next in self.graph.successors(node) {
                let best = entered.entry(next).or_insert(0);
                if left > *best {
                    *best = left;
                    stack.push((next, 0, left));
                }
            }
        }
        Ok(areas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_graph() -> Graph {
        Graph::from_edges(
            [(1, 5), (2, 5), (3, 5), (4, 5)],
            [(1, 2), (1, 3), (2, 4), (3, 4)],
        )
        .unwrap()
    }

    #[test]
    fn extends_across_linear_boundary() {
        let graph = Graph::from_edges([(1, 5), (2, 5)], [(1, 2)]).unwrap();
        let areas = Extender::new(&graph, 5)
            .extend(&Interval::new(3, 5, vec![1]))
            .unwrap();
        assert_eq!(areas, Areas::from_ranges([(1, 3, 5), (2, 0, 3)]));
    }

    #[test]
    fn branches_are_both_recorded() {
        let graph = split_graph();
        let areas = Extender::new(&graph, 15)
            .extend(&Interval::new(0, 5, vec![1]))
            .unwrap();
        assert_eq!(
            areas,
            Areas::from_ranges([(1, 0, 5), (2, 0, 5), (3, 0, 5), (4, 0, 5)])
        );
    }

    #[test]
    fn boundary_footprint_has_no_overhang() {
        let graph = split_graph();
        let areas = Extender::new(&graph, 10)
            .extend(&Interval::new(0, 5, vec![1]))
            .unwrap();
        assert!(areas.get(4).is_empty());
        assert_eq!(areas.get(2), &[(0, 5)]);
        assert_eq!(areas.total_length(), 15);
    }

    #[test]
    fn dead_end_truncates() {
        let graph = Graph::from_edges([(1, 5), (2, 5)], [(1, 2)]).unwrap();
        let areas = Extender::new(&graph, 50)
            .extend(&Interval::new(0, 2, vec![1]))
            .unwrap();
        assert_eq!(areas, Areas::from_ranges([(1, 0, 5), (2, 0, 5)]));
    }

    #[test]
    fn reverse_strand_read_extends_backwards() {
        let graph = Graph::from_edges([(1, 5), (2, 5)], [(1, 2)]).unwrap();
        // Read on -2 at [0, 2) covers node 2 [3, 5) and extends towards node 1.
        let areas = Extender::new(&graph, 6)
            .extend(&Interval::new(0, 2, vec![-2]))
            .unwrap();
        assert_eq!(areas, Areas::from_ranges([(2, 0, 5), (1, 4, 5)]));
    }

    #[test]
    fn end_past_node_is_clamped() {
        let graph = Graph::from_edges([(1, 5), (2, 5)], [(1, 2)]).unwrap();
        let areas = Extender::new(&graph, 10)
            .extend(&Interval::new(0, 9, vec![-1]))
            .unwrap();
        assert_eq!(areas, Areas::from_ranges([(1, 0, 5)]));
        let areas = Extender::new(&graph, 7)
            .extend(&Interval::new(2, 9, vec![1]))
            .unwrap();
        assert_eq!(areas, Areas::from_ranges([(1, 2, 5), (2, 0, 4)]));
    }

    #[test]
    fn read_longer_than_fragment_is_unchanged() {
        let graph = split_graph();
        let areas = Extender::new(&graph, 2)
            .extend(&Interval::new(1, 4, vec![2]))
            .unwrap();
        assert_eq!(areas, Areas::from_ranges([(2, 1, 4)]));
    }
}
