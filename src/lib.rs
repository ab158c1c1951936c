//! # Peak calling on pangenome graphs
//!
//! ChIP-seq reads are mapped to a sequence graph rather than a linear
//! reference. This crate turns those graph alignments into peaks:
//!
//! 1. **Extension**: each read is grown to the estimated fragment length,
//!    following every branch the graph offers.
//! 2. **Pileup**: fragment coverage is accumulated per base, either by
//!    explicit extension or by a branch-tolerant topological sweep.
//! 3. **Significance**: sample depth is tested against the control with a
//!    Poisson model and corrected to q-values.
//! 4. **Scoring**: each significant region reports its highest-scoring path.
//!
//! ## Usage Example
//!
//! ```ignore
//! use graphpeak::{CallPeaks, ExperimentInfo, Graph, Interval, PeakCallConfig};
//!
//! let graph = Graph::from_edges([(1, 50), (2, 50)], [(1, 2)])?;
//! let info = ExperimentInfo::from_graph(&graph, 40, 10);
//! let mut caller = CallPeaks::new(&graph, info, PeakCallConfig::default())?;
//! let result = caller.run(sample_reads, control_reads)?;
//! for peak in &result.peaks {
//!     println!("{:?} {}", peak.interval.path, peak.score);
//! }
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod graph;    // Node tables, adjacency and topological order
pub mod interval; // Paths on the graph and fragment extension
pub mod pileup;   // Per-base coverage tracks
pub mod stats;    // Poisson scores and q-value correction
pub mod peaks;    // Regions, max paths and trimming
pub mod pipeline; // End-to-end orchestration
pub mod io;       // Text formats for the binary

// Re-exports for convenience
pub use graph::{Direction, Graph, GraphError, NodeId};
pub use interval::{Areas, Extender, Interval, ValidationError};
pub use peaks::{max_path, BinaryTrack, MaxPath, PeakRegion, ScoreError};
pub use pileup::{
    build_pileup, fragment_pileup, DensePileup, FragmentStarts, Pileup, PileupStrategy, PileupValue,
};
pub use pipeline::{
    CallPeaks, CallPeaksError, ExperimentInfo, PeakCallConfig, PeakCallResult, ScoredPeak,
};
