//! From a significance track to scored peaks.
//!
//! A [`BinaryTrack`] is cleaned up (hole filling, size filter) and split into
//! connected [`PeakRegion`]s; each region is reduced to its best path by
//! [`max_path`].

mod components;
mod region;
mod scorer;
mod track;
mod trim;

use thiserror::Error;

use crate::graph::GraphError;

pub use region::PeakRegion;
pub use scorer::{max_path, MaxPath};
pub use track::BinaryTrack;
pub use trim::trim_zero_ends;

/// Reasons a region yields no peak.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// The region offers no piece a path could start from.
    #[error("no score: region has no entry point")]
    EmptyRegion,

    /// The region references a node the graph does not have.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
