use crate::graph::{Graph, NodeId};

/// Ranges on individual nodes, linked across node boundaries by graph edges.
///
/// A piece is `(node index, start, end)` in forward coordinates. Two pieces
/// are adjacent when one reaches the side of its node that an edge joins to
/// the side of the other's node that the other piece reaches.
#[derive(Debug)]
pub(crate) struct Pieces {
    pieces: Vec<(usize, u32, u32)>,
    /// Piece touching offset 0 of each node.
    at_start: Vec<Option<usize>>,
    /// Piece touching the last base of each node.
    at_end: Vec<Option<usize>>,
}

impl Pieces {
    /// Collect pieces from per-node sorted, disjoint ranges.
    pub(crate) fn new(graph: &Graph, ranges: &[Vec<(u32, u32)>]) -> Self {
        let n = graph.node_count();
        let mut pieces = Vec::new();
        let mut at_start = vec![None; n];
        let mut at_end = vec![None; n];
        for (idx, node_ranges) in ranges.iter().enumerate() {
            let length = graph.length_at(idx);
            for &(start, end) in node_ranges {
                if start >= end {
                    continue;
                }
                let id = pieces.len();
                pieces.push((idx, start, end));
                if start == 0 {
                    at_start[idx] = Some(id);
                }
                if end == length {
                    at_end[idx] = Some(id);
                }
            }
        }
        Self {
            pieces,
            at_start,
            at_end,
        }
    }

    pub(crate) fn get(&self, id: usize) -> (usize, u32, u32) {
        self.pieces[id]
    }

    /// Whether the piece reaches a node side with no edges.
    pub(crate) fn touches_dead_end(&self, graph: &Graph, id: usize) -> bool {
        let (idx, start, end) = self.pieces[id];
        let node = graph.id_at(idx);
        (start == 0 && graph.predecessors(node).is_empty())
            || (end == graph.length_at(idx) && graph.successors(node).is_empty())
    }

    /// Piece ids grouped into connected components, each sorted, components
    /// ordered by their first piece.
    pub(crate) fn components(&self, graph: &Graph) -> Vec<Vec<usize>> {
        let mut sets = DisjointSets::new(self.pieces.len());
        for (idx, piece) in self.at_start.iter().enumerate() {
            let Some(piece) = *piece else { continue };
            for &prev in graph.predecessors(graph.id_at(idx)) {
                if let Some(other) = self.side(graph, prev, prev > 0) {
                    sets.union(piece, other);
                }
            }
        }
        for (idx, piece) in self.at_end.iter().enumerate() {
            let Some(piece) = *piece else { continue };
            for &next in graph.successors(graph.id_at(idx)) {
                if let Some(other) = self.side(graph, next, next < 0) {
                    sets.union(piece, other);
                }
            }
        }

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut slot_of_root = vec![usize::MAX; self.pieces.len()];
        for id in 0..self.pieces.len() {
            let root = sets.find(id);
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot_of_root[root]].push(id);
        }
        groups
    }

    /// Piece on the end side (`end_side`) or start side of `node`'s forward
    /// coordinates.
    fn side(&self, graph: &Graph, node: NodeId, end_side: bool) -> Option<usize> {
        let idx = graph.index_of(node)?;
        if end_side {
            self.at_end[idx]
        } else {
            self.at_start[idx]
        }
    }
}

#[derive(Debug)]
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller root wins so components keep a stable representative.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
