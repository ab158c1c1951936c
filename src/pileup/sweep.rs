use std::collections::{HashMap, VecDeque};

use bitvec::prelude::*;
use tracing::{debug, warn};

use crate::graph::{Direction, Graph, GraphError, NodeId};

use super::DensePileup;

/// Fragment starts grouped by directed node.
///
/// Each entry is `(offset, extension)`: the fragment covers `extension` bases
/// beginning at `offset` in the directed node's own coordinates, continuing
/// into successors when it runs past the node end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentStarts {
    by_node: HashMap<NodeId, Vec<(u32, u64)>>,
}

impl FragmentStarts {
    /// No starts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fragment starting at `offset` on directed `node`.
    pub fn add(&mut self, node: NodeId, offset: u32, extension: u64) {
        self.by_node.entry(node).or_default().push((offset, extension));
    }

    /// Starts registered on directed `node`.
    pub fn get(&self, node: NodeId) -> &[(u32, u64)] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of fragments.
    pub fn len(&self) -> usize {
        self.by_node.values().map(Vec::len).sum()
    }

    /// Whether no fragment was registered.
    pub fn is_empty(&self) -> bool {
        self.by_node.values().all(Vec::is_empty)
    }

    fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.by_node.keys().copied()
    }
}

impl FromIterator<(NodeId, u32, u64)> for FragmentStarts {
    fn from_iter<I: IntoIterator<Item = (NodeId, u32, u64)>>(iter: I) -> Self {
        let mut starts = Self::new();
        for (node, offset, extension) in iter {
            starts.add(node, offset, extension);
        }
        starts
    }
}

/// Coverage of every fragment in `starts`, summed over both strands.
///
/// With `parallel` set the forward and reverse sweeps run on the rayon pool;
/// their arrays are only combined once both have finished.
pub fn build_pileup(
    graph: &Graph,
    starts: &FragmentStarts,
    parallel: bool,
) -> Result<DensePileup, GraphError> {
    for node in starts.nodes() {
        if !graph.contains(node) {
            return Err(GraphError::MissingNode(node));
        }
    }

    let (forward, reverse) = if parallel {
        rayon::join(
            || Sweep::new(graph, starts, Direction::Forward).run(),
            || Sweep::new(graph, starts, Direction::Reverse).run(),
        )
    } else {
        (
            Sweep::new(graph, starts, Direction::Forward).run(),
            Sweep::new(graph, starts, Direction::Reverse).run(),
        )
    };
    let mut pileup = forward;
    pileup.merge(&reverse);
    debug!(
        fragments = starts.len(),
        touched = pileup.touched_count(),
        "fragment sweep complete"
    );
    Ok(pileup)
}

/// Open fragments reaching a node, keyed by fragment id, plus the number of
/// incoming edges that have reported so far.
#[derive(Debug, Default)]
struct Inbox {
    open: HashMap<u64, u64>,
    received: usize,
}

/// One pass over a single strand.
struct Sweep<'a> {
    graph: &'a Graph,
    starts: &'a FragmentStarts,
    direction: Direction,
    in_degree: Vec<usize>,
    inboxes: HashMap<usize, Inbox>,
    done: BitVec,
    next_fragment: u64,
    pileup: DensePileup,
}

impl<'a> Sweep<'a> {
    fn new(graph: &'a Graph, starts: &'a FragmentStarts, direction: Direction) -> Self {
        let n = graph.node_count();
        let in_degree = (0..n)
            .map(|idx| {
                graph
                    .previous_in(idx, direction)
                    .iter()
                    .filter(|&&node| node > 0)
                    .count()
            })
            .collect();
        Self {
            graph,
            starts,
            direction,
            in_degree,
            inboxes: HashMap::new(),
            done: bitvec![0; n],
            next_fragment: 0,
            pileup: DensePileup::new(graph),
        }
    }

    fn pass_order(&self) -> Vec<usize> {
        let order = self.graph.topological_indices().iter().copied();
        match self.direction {
            Direction::Forward => order.collect(),
            Direction::Reverse => order.rev().collect(),
        }
    }

    fn run(mut self) -> DensePileup {
        let order = self.pass_order();
        let mut queue: VecDeque<usize> = order
            .iter()
            .copied()
            .filter(|&idx| self.in_degree[idx] == 0)
            .collect();
        let mut cursor = 0usize;
        let mut remaining = order.len();

        while remaining > 0 {
            let idx = match queue.pop_front() {
                Some(idx) => idx,
                None => {
                    // Only nodes on a cycle can still be waiting for an edge.
                    while self.done[order[cursor]] {
                        cursor += 1;
                    }
                    let idx = order[cursor];
                    warn!(
                        node = self.graph.id_at(idx),
                        direction = ?self.direction,
                        "flushing node before all incoming edges reported"
                    );
                    idx
                }
            };
            if self.done[idx] {
                continue;
            }
            self.done.set(idx, true);
            remaining -= 1;
            for target in self.process(idx) {
                queue.push_back(target);
            }
        }
        self.pileup
    }

    /// Finalise node `idx`; returns successors whose gate just opened.
    fn process(&mut self, idx: usize) -> Vec<usize> {
        let size = self.graph.length_at(idx);
        let size64 = u64::from(size);
        let directed = match self.direction {
            Direction::Forward => self.graph.id_at(idx),
            Direction::Reverse => -self.graph.id_at(idx),
        };

        let mut diff = vec![0i64; size as usize + 1];
        let mut outgoing: Vec<(u64, u64)> = Vec::new();
        let inbox = self.inboxes.remove(&idx).unwrap_or_default();
        for (fragment, distance) in inbox.open {
            if distance == 0 {
                continue;
            }
            diff[0] += 1;
            diff[distance.min(size64) as usize] -= 1;
            if distance > size64 {
                outgoing.push((fragment, distance - size64));
            }
        }
        for &(offset, extension) in self.starts.get(directed) {
            let begin = u64::from(offset.min(size));
            let end = (begin + extension).min(size64);
            if end > begin {
                diff[begin as usize] += 1;
                diff[end as usize] -= 1;
            }
            if begin + extension > size64 {
                outgoing.push((self.next_fragment, begin + extension - size64));
                self.next_fragment += 1;
            }
        }

        if diff.iter().any(|&delta| delta != 0) {
            let flip = self.direction == Direction::Reverse;
            let cells = self.pileup.node_values_mut(idx);
            let mut depth = 0i64;
            for (i, delta) in diff.iter().take(size as usize).enumerate() {
                depth += delta;
                let pos = if flip { size as usize - 1 - i } else { i };
                cells[pos] += depth as u32;
            }
            self.pileup.mark_touched(idx);
        }

        let mut ready = Vec::new();
        for &next in self.graph.next_in(idx, self.direction) {
            if next <= 0 {
                continue;
            }
            let Some(target) = self.graph.index_of(next) else {
                continue;
            };
            if self.done[target] {
                if !outgoing.is_empty() {
                    debug!(node = next, "dropping extension into an already flushed node");
                }
                continue;
            }
            let inbox = self.inboxes.entry(target).or_default();
            for &(fragment, distance) in &outgoing {
                let best = inbox.open.entry(fragment).or_insert(0);
                *best = (*best).max(distance);
            }
            inbox.received += 1;
            if inbox.received == self.in_degree[target] {
                ready.push(target);
            }
        }
        ready
    }
}
