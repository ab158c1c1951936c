use std::collections::BTreeMap;

use crate::graph::NodeId;

/// One connected region of a thresholded track, classified for scoring.
///
/// `starts[n] = k` records a partial piece covering the first `k` bases of
/// directed node `n`; a piece touching the end of node `m` is therefore
/// stored under `-m`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakRegion {
    full: Vec<NodeId>,
    starts: BTreeMap<NodeId, u32>,
    internal: Option<(NodeId, u32, u32)>,
}

impl PeakRegion {
    /// Region consisting of a single interior piece of `node`.
    pub fn internal_only(node: NodeId, start: u32, end: u32) -> Self {
        Self {
            internal: Some((node.abs(), start, end)),
            ..Self::default()
        }
    }

    /// Region from fully covered nodes and partial pieces.
    pub fn from_parts<F, S>(full: F, starts: S) -> Self
    where
        F: IntoIterator<Item = NodeId>,
        S: IntoIterator<Item = (NodeId, u32)>,
    {
        let mut full: Vec<NodeId> = full.into_iter().map(NodeId::abs).collect();
        full.sort_unstable();
        full.dedup();
        Self {
            full,
            starts: starts.into_iter().collect(),
            internal: None,
        }
    }

    /// Classify a covered forward range `[start, end)` of positive `node`.
    pub(crate) fn add_piece(&mut self, node: NodeId, start: u32, end: u32, length: u32) {
        match (start == 0, end == length) {
            (true, true) => {
                if let Err(pos) = self.full.binary_search(&node) {
                    self.full.insert(pos, node);
                }
            }
            (true, false) => {
                self.starts.insert(node, end);
            }
            (false, true) => {
                self.starts.insert(-node, length - start);
            }
            (false, false) => self.internal = Some((node, start, end)),
        }
    }

    /// Fully covered positive nodes, ascending.
    pub fn full(&self) -> &[NodeId] {
        &self.full
    }

    /// Partial pieces keyed by the directed node whose start they cover.
    pub fn starts(&self) -> &BTreeMap<NodeId, u32> {
        &self.starts
    }

    /// Piece strictly inside one node, in forward coordinates.
    pub fn internal(&self) -> Option<(NodeId, u32, u32)> {
        self.internal
    }

    /// Positive ids of every node the region touches, ascending.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .full
            .iter()
            .copied()
            .chain(self.starts.keys().map(|node| node.abs()))
            .chain(self.internal.map(|(node, _, _)| node))
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Whether the region holds no piece at all.
    pub fn is_empty(&self) -> bool {
        self.full.is_empty() && self.starts.is_empty() && self.internal.is_none()
    }
}
