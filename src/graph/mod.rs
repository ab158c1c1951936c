//! Bidirected sequence graph used as the coordinate system for pileups.
//!
//! Nodes are stored in flat tables indexed by node index. Each node has two
//! adjacency slots (`2 * idx` for `+n`, `2 * idx + 1` for `-n`) in both the
//! successor and the predecessor table, so traversal never chases pointers.

mod topology;

use std::collections::HashMap;

use thiserror::Error;

pub use topology::topological_sort;

/// Signed node identifier; `-n` is the reverse strand of `n`.
pub type NodeId = i64;

/// Configuration errors raised while loading or querying a graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node referenced by an edge or a query but absent from the length table.
    #[error("node {0} is referenced but missing from the length table")]
    MissingNode(NodeId),

    /// Node listed twice in the length table.
    #[error("node {0} is defined more than once")]
    DuplicateNode(NodeId),

    /// Node id zero has no strand and cannot be stored.
    #[error("node id 0 is not a valid signed node id")]
    ZeroNodeId,

    /// Nodes must span at least one base.
    #[error("node {0} has zero length")]
    EmptyNode(NodeId),

    /// Successor and predecessor tables disagree about an edge.
    #[error("adjacency tables disagree on edge {from} -> {to}")]
    InconsistentAdjacency {
        /// Edge source.
        from: NodeId,
        /// Edge target.
        to: NodeId,
    },
}

/// Adjacency selector for strand-parameterized traversals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Follow successors of positive-strand nodes in topological order.
    Forward,
    /// Follow predecessors of positive-strand nodes in reverse topological order.
    Reverse,
}

/// Immutable bidirected graph with per-node lengths.
#[derive(Debug, Clone)]
pub struct Graph {
    ids: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    lengths: Vec<u32>,
    successors: Vec<Vec<NodeId>>,
    predecessors: Vec<Vec<NodeId>>,
    order: Vec<usize>,
}

impl Graph {
    /// Build a graph from `(id, length)` pairs and directed edges.
    ///
    /// Every edge `a -> b` also records its mirror `-b -> -a`. Repeated edges
    /// are stored once; successor order follows first insertion.
    pub fn from_edges<N, E>(nodes: N, edges: E) -> Result<Self, GraphError>
    where
        N: IntoIterator<Item = (NodeId, u32)>,
        E: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut graph = Self::with_nodes(nodes)?;
        for (from, to) in edges {
            graph.insert_edge(from, to)?;
            graph.insert_edge(-to, -from)?;
        }
        graph.order = topological_sort(&graph);
        Ok(graph)
    }

    /// Build a graph from precomputed successor and predecessor tables.
    ///
    /// The tables are taken as-is (no mirroring) and must describe the same
    /// edge set; any disagreement is reported as
    /// [`GraphError::InconsistentAdjacency`].
    pub fn from_tables<N>(
        nodes: N,
        successors: &HashMap<NodeId, Vec<NodeId>>,
        predecessors: &HashMap<NodeId, Vec<NodeId>>,
    ) -> Result<Self, GraphError>
    where
        N: IntoIterator<Item = (NodeId, u32)>,
    {
        let mut graph = Self::with_nodes(nodes)?;
        for (&from, targets) in successors {
            let slot = graph.slot(from)?;
            for &to in targets {
                graph.slot(to)?;
                graph.successors[slot].push(to);
            }
        }
        for (&to, sources) in predecessors {
            let slot = graph.slot(to)?;
            for &from in sources {
                graph.slot(from)?;
                graph.predecessors[slot].push(from);
            }
        }
        graph.check_consistency()?;
        graph.order = topological_sort(&graph);
        Ok(graph)
    }

    fn with_nodes<N>(nodes: N) -> Result<Self, GraphError>
    where
        N: IntoIterator<Item = (NodeId, u32)>,
    {
        let mut entries: Vec<(NodeId, u32)> = Vec::new();
        for (id, length) in nodes {
            if id == 0 {
                return Err(GraphError::ZeroNodeId);
            }
            if length == 0 {
                return Err(GraphError::EmptyNode(id.abs()));
            }
            entries.push((id.abs(), length));
        }
        entries.sort_unstable_by_key(|&(id, _)| id);

        let mut index = HashMap::with_capacity(entries.len());
        for (idx, &(id, _)) in entries.iter().enumerate() {
            if index.insert(id, idx).is_some() {
                return Err(GraphError::DuplicateNode(id));
            }
        }

        let slots = entries.len() * 2;
        Ok(Self {
            ids: entries.iter().map(|&(id, _)| id).collect(),
            lengths: entries.iter().map(|&(_, length)| length).collect(),
            index,
            successors: vec![Vec::new(); slots],
            predecessors: vec![Vec::new(); slots],
            order: Vec::new(),
        })
    }

    fn insert_edge(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let from_slot = self.slot(from)?;
        let to_slot = self.slot(to)?;
        if !self.successors[from_slot].contains(&to) {
            self.successors[from_slot].push(to);
            self.predecessors[to_slot].push(from);
        }
        Ok(())
    }

    fn check_consistency(&self) -> Result<(), GraphError> {
        for (slot, targets) in self.successors.iter().enumerate() {
            let from = self.slot_id(slot);
            for &to in targets {
                if !self.predecessors(to).contains(&from) {
                    return Err(GraphError::InconsistentAdjacency { from, to });
                }
            }
        }
        for (slot, sources) in self.predecessors.iter().enumerate() {
            let to = self.slot_id(slot);
            for &from in sources {
                if !self.successors(from).contains(&to) {
                    return Err(GraphError::InconsistentAdjacency { from, to });
                }
            }
        }
        Ok(())
    }

    fn slot(&self, id: NodeId) -> Result<usize, GraphError> {
        let idx = self.index_of(id).ok_or(GraphError::MissingNode(id))?;
        Ok(idx * 2 + usize::from(id < 0))
    }

    fn slot_id(&self, slot: usize) -> NodeId {
        let id = self.ids[slot / 2];
        if slot % 2 == 1 {
            -id
        } else {
            id
        }
    }

    /// Number of (unsigned) nodes.
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Table index of a node, ignoring strand.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id.abs()).copied()
    }

    /// Positive node id stored at `idx`.
    pub fn id_at(&self, idx: usize) -> NodeId {
        self.ids[idx]
    }

    /// Whether either strand of `id` exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id.abs())
    }

    /// Length of a node; identical for both strands.
    pub fn length(&self, id: NodeId) -> Option<u32> {
        self.index_of(id).map(|idx| self.lengths[idx])
    }

    /// Length lookup that reports an absent node as a configuration error.
    pub fn require_length(&self, id: NodeId) -> Result<u32, GraphError> {
        self.length(id).ok_or(GraphError::MissingNode(id))
    }

    /// Length of the node at table index `idx`.
    pub fn length_at(&self, idx: usize) -> u32 {
        self.lengths[idx]
    }

    /// Ordered successors of a directed node; empty for unknown nodes.
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        match self.slot(id) {
            Ok(slot) => &self.successors[slot],
            Err(_) => &[],
        }
    }

    /// Ordered predecessors of a directed node; empty for unknown nodes.
    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        match self.slot(id) {
            Ok(slot) => &self.predecessors[slot],
            Err(_) => &[],
        }
    }

    /// Neighbours of the positive strand of node `idx` in a sweep direction.
    pub fn next_in(&self, idx: usize, direction: Direction) -> &[NodeId] {
        match direction {
            Direction::Forward => &self.successors[idx * 2],
            Direction::Reverse => &self.predecessors[idx * 2],
        }
    }

    /// Neighbours feeding the positive strand of node `idx` in a sweep direction.
    pub fn previous_in(&self, idx: usize, direction: Direction) -> &[NodeId] {
        match direction {
            Direction::Forward => &self.predecessors[idx * 2],
            Direction::Reverse => &self.successors[idx * 2],
        }
    }

    /// Whether `to` directly follows `from`.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.successors(from).contains(&to)
    }

    /// Node indices in topological order of the positive strand.
    pub fn topological_indices(&self) -> &[usize] {
        &self.order
    }

    /// Positive node ids in topological order, optionally reversed.
    pub fn topological_order(&self, reverse: bool) -> Vec<NodeId> {
        let ids = self.order.iter().map(|&idx| self.ids[idx]);
        if reverse {
            ids.rev().collect()
        } else {
            ids.collect()
        }
    }

    /// Total number of bases over all nodes.
    pub fn genome_size(&self) -> u64 {
        self.lengths.iter().map(|&length| u64::from(length)).sum()
    }
}
