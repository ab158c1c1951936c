//! Read and peak intervals expressed as paths through the graph.

mod extender;

use thiserror::Error;

use crate::graph::{Graph, NodeId};

pub use extender::{Areas, Extender};

/// Reasons an interval cannot be placed on the graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Interval has no nodes.
    #[error("interval has an empty node path")]
    EmptyPath,

    /// Interval references a node missing from the graph.
    #[error("node {node} is not in the graph")]
    AbsentNode {
        /// Offending node.
        node: NodeId,
    },

    /// Two consecutive path nodes are not joined by an edge.
    #[error("no edge {from} -> {to}")]
    Disconnected {
        /// Node preceding the gap.
        from: NodeId,
        /// Node following the gap.
        to: NodeId,
    },

    /// Offset lies outside its node, or start follows end on a single node.
    #[error("offset {offset} is invalid on node {node} of length {length}")]
    OffsetOutOfRange {
        /// Node the offset refers to.
        node: NodeId,
        /// Offending offset.
        offset: u32,
        /// Length of that node.
        length: u32,
    },
}

/// Path of directed nodes with a start offset on the first node and an end
/// offset on the last node, each in that directed node's own coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    /// Offset on the first node where the interval begins.
    pub start: u32,
    /// Offset on the last node where the interval ends (exclusive).
    pub end: u32,
    /// Directed node ids visited, in traversal order.
    pub path: Vec<NodeId>,
}

impl Interval {
    /// Construct a new interval.
    pub fn new(start: u32, end: u32, path: Vec<NodeId>) -> Self {
        Self { start, end, path }
    }

    /// First node of the path.
    pub fn first_node(&self) -> Option<NodeId> {
        self.path.first().copied()
    }

    /// Last node of the path.
    pub fn last_node(&self) -> Option<NodeId> {
        self.path.last().copied()
    }

    /// Check that every node exists, consecutive nodes are adjacent and both
    /// offsets fall inside their nodes.
    pub fn validate(&self, graph: &Graph) -> Result<(), ValidationError> {
        let (&first, &last) = match (self.path.first(), self.path.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ValidationError::EmptyPath),
        };
        for &node in &self.path {
            if !graph.contains(node) {
                return Err(ValidationError::AbsentNode { node });
            }
        }
        for pair in self.path.windows(2) {
            if !graph.has_edge(pair[0], pair[1]) {
                return Err(ValidationError::Disconnected {
                    from: pair[0],
                    to: pair[1],
                });
            }
        }

        let first_len = node_length(graph, first)?;
        let last_len = node_length(graph, last)?;
        if self.start > first_len {
            return Err(ValidationError::OffsetOutOfRange {
                node: first,
                offset: self.start,
                length: first_len,
            });
        }
        if self.end > last_len || (self.path.len() == 1 && self.end < self.start) {
            return Err(ValidationError::OffsetOutOfRange {
                node: last,
                offset: self.end,
                length: last_len,
            });
        }
        Ok(())
    }

    /// Number of bases covered.
    pub fn length(&self, graph: &Graph) -> Result<u64, ValidationError> {
        Ok(self
            .directed_ranges(graph)?
            .iter()
            .map(|&(_, start, end)| u64::from(end - start))
            .sum())
    }

    /// Covered `(directed node, start, end)` ranges in path order.
    pub fn directed_ranges(&self, graph: &Graph) -> Result<Vec<(NodeId, u32, u32)>, ValidationError> {
        let last = self.path.len().saturating_sub(1);
        self.path
            .iter()
            .enumerate()
            .map(|(i, &node)| {
                let length = node_length(graph, node)?;
                let start = if i == 0 { self.start.min(length) } else { 0 };
                let end = if i == last { self.end.min(length) } else { length };
                Ok((node, start, end.max(start)))
            })
            .collect()
    }

    /// Covered ranges converted to positive-strand node coordinates.
    pub fn forward_ranges(&self, graph: &Graph) -> Result<Vec<(NodeId, u32, u32)>, ValidationError> {
        self.directed_ranges(graph)?
            .into_iter()
            .map(|(node, start, end)| {
                let length = node_length(graph, node)?;
                Ok(to_forward(node, start, end, length))
            })
            .collect()
    }

    /// The same bases traversed on the opposite strand.
    pub fn reversed(&self, graph: &Graph) -> Result<Self, ValidationError> {
        let (first, last) = match (self.first_node(), self.last_node()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ValidationError::EmptyPath),
        };
        let first_len = node_length(graph, first)?;
        let last_len = node_length(graph, last)?;
        Ok(Self {
            start: last_len - self.end.min(last_len),
            end: first_len - self.start.min(first_len),
            path: self.path.iter().rev().map(|&node| -node).collect(),
        })
    }

    /// Content fingerprint used for duplicate detection.
    pub fn content_hash(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.start.to_le_bytes());
        hasher.update(&self.end.to_le_bytes());
        for node in &self.path {
            hasher.update(&node.to_le_bytes());
        }
        hasher.finalize()
    }
}

/// Map a directed `[start, end)` range to positive-strand coordinates.
pub fn to_forward(node: NodeId, start: u32, end: u32, length: u32) -> (NodeId, u32, u32) {
    if node < 0 {
        (-node, length - end, length - start)
    } else {
        (node, start, end)
    }
}

fn node_length(graph: &Graph, node: NodeId) -> Result<u32, ValidationError> {
    graph
        .length(node)
        .ok_or(ValidationError::AbsentNode { node })
}
