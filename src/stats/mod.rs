//! Significance scoring: Poisson p-scores and the global p to q mapping.
//!
//! All scores are in `-log10` space, so larger means more significant.

mod poisson;
mod qvalues;

pub use poisson::{ln_gamma, p_value_track, poisson_p_score};
pub use qvalues::{PToQMapper, QValueMapping};
