use std::collections::HashSet;

use tracing::{debug, info};

use crate::graph::Graph;
use crate::interval::Interval;

use super::{CallPeaksError, ExperimentInfo};

/// Which experiment a batch of reads belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadSource {
    /// ChIP (sample) reads.
    Treatment,
    /// Input (control) reads.
    Control,
}

/// Reads that survived validation and deduplication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preprocessed {
    /// Unique valid reads in input order.
    pub reads: Vec<Interval>,
    /// Exact duplicates removed.
    pub duplicates: u64,
    /// Invalid reads dropped (only when validation failures are tolerated).
    pub dropped: u64,
}

/// Validate, deduplicate and count one batch of reads.
///
/// An invalid read aborts with [`CallPeaksError::InvalidRead`] unless
/// `skip_invalid` is set, in which case it is dropped. Surviving reads are
/// added to the matching counter of `info`.
pub fn preprocess_reads<I>(
    graph: &Graph,
    reads: I,
    source: ReadSource,
    info: &mut ExperimentInfo,
    skip_invalid: bool,
) -> Result<Preprocessed, CallPeaksError>
where
    I: IntoIterator<Item = Interval>,
{
    let mut seen: HashSet<blake3::Hash> = HashSet::new();
    let mut out = Preprocessed::default();
    for (index, read) in reads.into_iter().enumerate() {
        if let Err(source) = read.validate(graph) {
            if !skip_invalid {
                return Err(CallPeaksError::InvalidRead { index, source });
            }
            debug!(index, error = %source, "dropping invalid read");
            out.dropped += 1;
            continue;
        }
        if !seen.insert(read.content_hash()) {
            out.duplicates += 1;
            continue;
        }
        out.reads.push(read);
    }

    let kept = out.reads.len() as u64;
    match source {
        ReadSource::Treatment => info.n_sample_reads += kept,
        ReadSource::Control => info.n_control_reads += kept,
    }
    info!(
        ?source,
        kept,
        duplicates = out.duplicates,
        dropped = out.dropped,
        "preprocessed reads"
    );
    Ok(out)
}
