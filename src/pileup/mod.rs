//! Coverage tracks over the graph.
//!
//! [`DensePileup`] is the packed per-base array the sweep writes into;
//! [`Pileup`] is the run-length form every later stage consumes.

mod dense;
mod sample;
mod sweep;
mod track;
mod values;

use thiserror::Error;

use crate::graph::GraphError;
use crate::interval::ValidationError;

pub use dense::DensePileup;
pub use sample::{fragment_pileup, PileupStrategy};
pub use sweep::{build_pileup, FragmentStarts};
pub use track::Pileup;
pub use values::PileupValue;

/// Failures while accumulating reads into a pileup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PileupError {
    /// Graph tables do not match the fragment starts.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A read could not be placed on the graph.
    #[error(transparent)]
    Interval(#[from] ValidationError),
}
