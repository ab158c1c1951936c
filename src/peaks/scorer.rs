use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::graph::{Graph, NodeId};
use crate::interval::Interval;
use crate::pileup::Pileup;

use super::{PeakRegion, ScoreError};

/// Score assigned to an infinite piece when no finite piece exists.
const FALLBACK_FINITE_MAX: f64 = 100.0;

/// Best-supported path through a region together with its summed score.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaxPath {
    /// The path, offsets in directed node coordinates.
    pub interval: Interval,
    /// Sum of the value track over the path.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Role {
    /// Whole node, either orientation.
    Full,
    /// Partial piece entered from its open end; a path may start here.
    Entry,
    /// Partial piece reached from a neighbour; a path ends here.
    Exit,
}

#[derive(Debug, Clone, Copy)]
struct Item {
    node: NodeId,
    role: Role,
    piece: usize,
    score: f64,
}

#[derive(Debug)]
struct Candidate {
    score: f64,
    seq: u64,
    path: Vec<usize>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Highest score first, then earliest pushed.
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Highest-scoring path through `region`, scored with `values`.
///
/// A region strictly inside one node is returned as-is. Otherwise paths start
/// at a full node (either orientation) or at a partial piece entered from its
/// open end, and may finish at any piece. A piece is used at most once per
/// path.
pub fn max_path(region: &PeakRegion, graph: &Graph, values: &Pileup) -> Result<MaxPath, ScoreError> {
    if let Some((node, start, end)) = region.internal() {
        graph.require_length(node)?;
        let score = sanitize(vec![values.directed_sum(graph, node, start, end)])[0];
        return Ok(MaxPath {
            interval: Interval::new(start, end, vec![node]),
            score,
        });
    }

    let items = collect_items(region, graph, values)?;
    let lookup: HashMap<(NodeId, Role), usize> = items
        .iter()
        .enumerate()
        .map(|(id, item)| ((item.node, item.role), id))
        .collect();
    let full: HashSet<NodeId> = region.full().iter().copied().collect();

    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    for (id, item) in items.iter().enumerate() {
        if item.role != Role::Exit {
            heap.push(Candidate {
                score: item.score,
                seq,
                path: vec![id],
            });
            seq += 1;
        }
    }
    if heap.is_empty() {
        return Err(ScoreError::EmptyRegion);
    }

    let mut memo: HashMap<usize, f64> = HashMap::new();
    let mut best: Option<Candidate> = None;
    while let Some(candidate) = heap.pop() {
        let Some(&last) = candidate.path.last() else {
            continue;
        };
        if memo
            .get(&last)
            .is_some_and(|&recorded| recorded >= candidate.score)
        {
            continue;
        }
        memo.insert(last, candidate.score);

        let item = items[last];
        if item.role != Role::Exit {
            for &next in graph.successors(item.node) {
                let role = if full.contains(&next.abs()) {
                    Role::Full
                } else {
                    Role::Exit
                };
                let Some(&next_id) = lookup.get(&(next, role)) else {
                    continue;
                };
                let piece = items[next_id].piece;
                if candidate.path.iter().any(|&id| items[id].piece == piece) {
                    continue;
                }
                let mut path = candidate.path.clone();
                path.push(next_id);
                heap.push(Candidate {
                    score: candidate.score + items[next_id].score,
                    seq,
                    path,
                });
                seq += 1;
            }
        }

        if best.as_ref().map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }

    let best = best.ok_or(ScoreError::EmptyRegion)?;
    let interval = to_interval(region, graph, &items, &best.path)?;
    Ok(MaxPath {
        interval,
        score: best.score,
    })
}

fn collect_items(region: &PeakRegion, graph: &Graph, values: &Pileup) -> Result<Vec<Item>, ScoreError> {
    let mut pieces: Vec<(Vec<(NodeId, Role)>, f64)> = Vec::new();
    for (&node, &covered) in region.starts() {
        graph.require_length(node)?;
        let score = values.directed_sum(graph, node, 0, covered);
        pieces.push((vec![(-node, Role::Entry), (node, Role::Exit)], score));
    }
    for &node in region.full() {
        let length = graph.require_length(node)?;
        let score = values.directed_sum(graph, node, 0, length);
        pieces.push((vec![(node, Role::Full), (-node, Role::Full)], score));
    }

    let scores = sanitize(pieces.iter().map(|&(_, score)| score).collect());
    Ok(pieces
        .into_iter()
        .zip(scores)
        .enumerate()
        .flat_map(|(piece, ((roles, _), score))| {
            roles.into_iter().map(move |(node, role)| Item {
                node,
                role,
                piece,
                score,
            })
        })
        .collect())
}

/// Replace infinite scores by one more than the largest finite score.
fn sanitize(mut scores: Vec<f64>) -> Vec<f64> {
    let max_finite = scores
        .iter()
        .copied()
        .filter(|score| score.is_finite())
        .reduce(f64::max)
        .unwrap_or(FALLBACK_FINITE_MAX);
    for score in &mut scores {
        if score.is_infinite() {
            *score = max_finite + 1.0;
        }
    }
    scores
}

fn to_interval(
    region: &PeakRegion,
    graph: &Graph,
    items: &[Item],
    path: &[usize],
) -> Result<Interval, ScoreError> {
    let (first, last) = match (path.first(), path.last()) {
        (Some(&first), Some(&last)) => (items[first], items[last]),
        _ => return Err(ScoreError::EmptyRegion),
    };

    let start = match first.role {
        Role::Entry => {
            let length = graph.require_length(first.node)?;
            let covered = region.starts().get(&-first.node).copied().unwrap_or(length);
            length - covered.min(length)
        }
        _ => 0,
    };
    let end = match last.role {
        Role::Exit => region.starts().get(&last.node).copied().unwrap_or(0),
        _ => graph.require_length(last.node)?,
    };
    Ok(Interval::new(
        start,
        end,
        path.iter().map(|&id| items[id].node).collect(),
    ))
}
