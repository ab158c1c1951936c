use tracing::debug;

use crate::graph::{Graph, NodeId};
use crate::pileup::{Pileup, PileupValue};

use super::components::Pieces;
use super::PeakRegion;

/// Per-node covered ranges of a thresholded track (forward coordinates,
/// sorted, disjoint and non-touching).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryTrack {
    ranges: Vec<Vec<(u32, u32)>>,
}

impl BinaryTrack {
    /// Positions where `track` is at least `min_value`.
    pub fn threshold(track: &Pileup, min_value: f64) -> Self {
        Self {
            ranges: track.threshold(min_value),
        }
    }

    /// Build from explicit `(node, start, end)` ranges; overlaps are merged.
    pub fn from_ranges<I>(graph: &Graph, ranges: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, u32, u32)>,
    {
        let mut per_node = vec![Vec::new(); graph.node_count()];
        for (node, start, end) in ranges {
            if let Some(idx) = graph.index_of(node) {
                let end = end.min(graph.length_at(idx));
                if start < end {
                    per_node[idx].push((start, end));
                }
            }
        }
        for node_ranges in &mut per_node {
            *node_ranges = merged(std::mem::take(node_ranges));
        }
        Self { ranges: per_node }
    }

    /// Covered ranges of a node (strand ignored).
    pub fn get(&self, graph: &Graph, node: NodeId) -> &[(u32, u32)] {
        graph
            .index_of(node)
            .and_then(|idx| self.ranges.get(idx))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total covered bases.
    pub fn covered_length(&self) -> u64 {
        self.ranges
            .iter()
            .flatten()
            .map(|&(start, end)| u64::from(end - start))
            .sum()
    }

    /// Whether nothing is covered.
    pub fn is_empty(&self) -> bool {
        self.ranges.iter().all(Vec::is_empty)
    }

    /// Indicator track: 1 on covered bases, 0 elsewhere.
    pub fn to_pileup(&self, graph: &Graph) -> Pileup {
        let values = self
            .ranges
            .iter()
            .enumerate()
            .map(|(idx, ranges)| {
                let breakpoints = ranges
                    .iter()
                    .flat_map(|&(start, end)| [(start, 1.0), (end, 0.0)])
                    .collect();
                PileupValue::from_breakpoints(graph.length_at(idx), 0.0, breakpoints)
            })
            .collect();
        Pileup::from_values(values)
    }

    /// Cover every uncovered gap whose connected extent is shorter than
    /// `max_size`, unless it runs into a graph dead end.
    pub fn fill_small_holes(&mut self, graph: &Graph, max_size: u32) {
        let gaps: Vec<Vec<(u32, u32)>> = self
            .ranges
            .iter()
            .enumerate()
            .map(|(idx, ranges)| complement(ranges, graph.length_at(idx)))
            .collect();
        let pieces = Pieces::new(graph, &gaps);

        let mut filled = 0usize;
        for component in pieces.components(graph) {
            let size: u64 = component
                .iter()
                .map(|&id| {
                    let (_, start, end) = pieces.get(id);
                    u64::from(end - start)
                })
                .sum();
            if size >= u64::from(max_size)
                || component.iter().any(|&id| pieces.touches_dead_end(graph, id))
            {
                continue;
            }
            for &id in &component {
                let (idx, start, end) = pieces.get(id);
                self.ranges[idx].push((start, end));
            }
            filled += 1;
        }
        for node_ranges in &mut self.ranges {
            *node_ranges = merged(std::mem::take(node_ranges));
        }
        debug!(holes = filled, max_size, "filled small holes");
    }

    /// Drop connected regions covering fewer than `min_size` bases.
    pub fn remove_small_peaks(&self, graph: &Graph, min_size: u32) -> Self {
        let pieces = Pieces::new(graph, &self.ranges);
        let mut kept = vec![Vec::new(); self.ranges.len()];
        let mut removed = 0usize;
        for component in pieces.components(graph) {
            let size: u64 = component
                .iter()
                .map(|&id| {
                    let (_, start, end) = pieces.get(id);
                    u64::from(end - start)
                })
                .sum();
            if size < u64::from(min_size) {
                removed += 1;
                continue;
            }
            for id in component {
                let (idx, start, end) = pieces.get(id);
                kept[idx].push((start, end));
            }
        }
        for node_ranges in &mut kept {
            node_ranges.sort_unstable();
        }
        debug!(removed, min_size, "removed small peaks");
        Self { ranges: kept }
    }

    /// Maximal connected regions, classified piece by piece.
    pub fn to_regions(&self, graph: &Graph) -> Vec<PeakRegion> {
        let pieces = Pieces::new(graph, &self.ranges);
        pieces
            .components(graph)
            .into_iter()
            .map(|component| {
                let mut region = PeakRegion::default();
                for id in component {
                    let (idx, start, end) = pieces.get(id);
                    region.add_piece(graph.id_at(idx), start, end, graph.length_at(idx));
                }
                region
            })
            .collect()
    }
}

fn merged(mut ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    ranges.sort_unstable();
    let mut out: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match out.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => out.push((start, end)),
        }
    }
    out
}

fn complement(ranges: &[(u32, u32)], length: u32) -> Vec<(u32, u32)> {
    let mut gaps = Vec::with_capacity(ranges.len() + 1);
    let mut cursor = 0;
    for &(start, end) in ranges {
        if start > cursor {
            gaps.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < length {
        gaps.push((cursor, length));
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> Graph {
        Graph::from_edges([(1, 10), (2, 10), (3, 10)], [(1, 2), (2, 3)]).unwrap()
    }

    #[test]
    fn threshold_keeps_values_at_cutoff() {
        let graph = Graph::from_edges([(1, 10)], Vec::new()).unwrap();
        let track = Pileup::from_values(vec![PileupValue::from_breakpoints(
            10,
            1.0,
            vec![(3, 2.0), (6, 1.999), (8, 2.5)],
        )]);
        let binary = BinaryTrack::threshold(&track, 2.0);
        assert_eq!(binary.get(&graph, 1), &[(3, 6), (8, 10)]);
    }

    #[test]
    fn bounded_hole_across_nodes_is_filled() {
        let graph = linear();
        let mut track = BinaryTrack::from_ranges(&graph, [(1, 0, 8), (2, 2, 10), (3, 0, 10)]);
        track.fill_small_holes(&graph, 5);
        assert_eq!(track.get(&graph, 1), &[(0, 10)]);
        assert_eq!(track.get(&graph, 2), &[(0, 10)]);
    }

    #[test]
    fn holes_at_dead_ends_or_too_long_stay_open() {
        let graph = linear();
        let mut track = BinaryTrack::from_ranges(&graph, [(1, 2, 10), (2, 0, 3), (2, 9, 10)]);
        track.fill_small_holes(&graph, 5);
        // [0, 2) on node 1 touches the graph start, [3, 9) on node 2 is too
        // long and node 3 runs into the graph end.
        assert_eq!(track.get(&graph, 1), &[(2, 10)]);
        assert_eq!(track.get(&graph, 2), &[(0, 3), (9, 10)]);
        assert!(track.get(&graph, 3).is_empty());
    }

    #[test]
    fn small_regions_are_removed_by_connected_size() {
        let graph = linear();
        let track = BinaryTrack::from_ranges(&graph, [(1, 7, 10), (2, 0, 4), (3, 2, 5)]);
        let kept = track.remove_small_peaks(&graph, 5);
        assert_eq!(kept.get(&graph, 1), &[(7, 10)]);
        assert_eq!(kept.get(&graph, 2), &[(0, 4)]);
        assert!(kept.get(&graph, 3).is_empty());
        assert_eq!(kept.covered_length(), 7);
    }

    #[test]
    fn regions_classify_pieces() {
        let graph = linear();
        let track = BinaryTrack::from_ranges(&graph, [(1, 6, 10), (2, 0, 10), (3, 0, 4), (3, 6, 8)]);
        let regions = track.to_regions(&graph);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].full(), &[2]);
        assert_eq!(regions[0].starts().get(&-1), Some(&4));
        assert_eq!(regions[0].starts().get(&3), Some(&4));
        assert_eq!(regions[1].internal(), Some((3, 6, 8)));
        assert_eq!(regions[0].nodes(), vec![1, 2, 3]);
    }

    #[test]
    fn indicator_track_round_trips() {
        let graph = linear();
        let track = BinaryTrack::from_ranges(&graph, [(1, 6, 10), (2, 3, 4)]);
        assert_eq!(BinaryTrack::threshold(&track.to_pileup(&graph), 1.0), track);
    }
}
