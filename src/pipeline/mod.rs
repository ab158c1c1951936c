//! End-to-end peak calling: reads in, scored peaks out.
//!
//! The run is split in two phases so that several graphs (for example one
//! per chromosome) can share a single p to q mapping:
//!
//! 1. [`CallPeaks::run_to_p_values`] preprocesses reads, builds the sample
//!    pileup and the windowed control, normalises both and scores
//!    significance.
//! 2. [`q_value_mapping`] fits the mapping over every stage, then
//!    [`CallPeaks::call_peaks_from_q_values`] thresholds and scores peaks.
//!
//! [`CallPeaks::run`] chains both phases for a single graph.

mod callpeaks;
mod config;
mod control;
mod normalize;
mod preprocess;

use thiserror::Error;

use crate::graph::GraphError;
use crate::interval::ValidationError;
use crate::peaks::ScoreError;
use crate::pileup::PileupError;

pub use callpeaks::{q_value_mapping, CallPeaks, PValueStage, PeakCallResult, ScoredPeak};
pub use config::{
    ExperimentInfo, PeakCallConfig, DEFAULT_FRAGMENT_LENGTH, DEFAULT_LOCAL_WINDOWS,
    DEFAULT_Q_VALUE_CUTOFF, DEFAULT_READ_LENGTH,
};
pub use control::control_track;
pub use normalize::{normalization_factors, Scaling};
pub use preprocess::{preprocess_reads, Preprocessed, ReadSource};

/// Errors aborting a peak-calling run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CallPeaksError {
    /// A read failed validation and invalid reads are not tolerated.
    #[error("read {index} is invalid: {source}")]
    InvalidRead {
        /// Position of the read in its input batch.
        index: usize,
        /// Why the read was rejected.
        source: ValidationError,
    },

    /// Normalisation needs at least one control read.
    #[error("no control reads survived preprocessing")]
    NoControlReads,

    /// Run parameters are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Graph tables are inconsistent with the data.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// A peak interval could not be placed on the graph.
    #[error("interval error: {0}")]
    Interval(#[from] ValidationError),

    /// Accumulating reads failed.
    #[error("pileup error: {0}")]
    Pileup(#[from] PileupError),

    /// Scoring a region failed for a reason other than an empty region.
    #[error("scoring error: {0}")]
    Score(#[from] ScoreError),
}
