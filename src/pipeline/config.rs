use crate::graph::Graph;
use crate::pileup::PileupStrategy;

use super::CallPeaksError;

/// Fragment length assumed when none is given.
pub const DEFAULT_FRAGMENT_LENGTH: u32 = 125;
/// Read length assumed when none is given.
pub const DEFAULT_READ_LENGTH: u32 = 20;
/// Default q-value cutoff (before the `-log10` transform).
pub const DEFAULT_Q_VALUE_CUTOFF: f64 = 0.05;
/// Local background windows added on top of the fragment-length control.
pub const DEFAULT_LOCAL_WINDOWS: [u32; 2] = [2500, 5000];

/// Per-run experiment facts. Read counters are only advanced by
/// preprocessing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentInfo {
    /// Total number of bases in the graph.
    pub genome_size: u64,
    /// Expected fragment length.
    pub fragment_length: u32,
    /// Expected read length.
    pub read_length: u32,
    /// Treatment reads that survived preprocessing.
    pub n_sample_reads: u64,
    /// Control reads that survived preprocessing.
    pub n_control_reads: u64,
}

impl ExperimentInfo {
    /// Info with zeroed counters.
    pub fn new(genome_size: u64, fragment_length: u32, read_length: u32) -> Self {
        Self {
            genome_size,
            fragment_length,
            read_length,
            n_sample_reads: 0,
            n_control_reads: 0,
        }
    }

    /// Info for `graph`, genome size taken from its node lengths.
    pub fn from_graph(graph: &Graph, fragment_length: u32, read_length: u32) -> Self {
        Self::new(graph.genome_size(), fragment_length, read_length)
    }

    /// Expected control depth if control fragments were spread uniformly.
    pub fn background(&self) -> f64 {
        if self.genome_size == 0 {
            return 0.0;
        }
        self.n_control_reads as f64 * f64::from(self.fragment_length) / self.genome_size as f64
    }

    pub(crate) fn validate(&self) -> Result<(), CallPeaksError> {
        if self.fragment_length == 0 {
            return Err(CallPeaksError::InvalidConfig(
                "fragment length must be > 0".to_string(),
            ));
        }
        if self.genome_size == 0 {
            return Err(CallPeaksError::InvalidConfig(
                "genome size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tunables for a peak-calling run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakCallConfig {
    /// Significance cutoff; positions need `q >= -log10(cutoff)`.
    pub q_value_cutoff: f64,
    /// Drop invalid reads instead of failing the run.
    pub skip_read_validation: bool,
    /// Trim zero-coverage ends off each scored path.
    pub trim_max_paths: bool,
    /// Floor the control track at the genome-wide background.
    pub use_background: bool,
    /// Run forward and reverse sweeps concurrently.
    pub parallel_sweeps: bool,
    /// How fragments are piled up.
    pub strategy: PileupStrategy,
    /// Wider windows whose depth, rescaled to the fragment length, can raise
    /// the control locally.
    pub local_windows: Vec<u32>,
    /// Whether control reads are supplied. Without them the sample reads
    /// stand in, seen only through the widest local window.
    pub has_control: bool,
}

impl Default for PeakCallConfig {
    fn default() -> Self {
        Self {
            q_value_cutoff: DEFAULT_Q_VALUE_CUTOFF,
            skip_read_validation: false,
            trim_max_paths: false,
            use_background: true,
            parallel_sweeps: true,
            strategy: PileupStrategy::Sweep,
            local_windows: DEFAULT_LOCAL_WINDOWS.to_vec(),
            has_control: true,
        }
    }
}

impl PeakCallConfig {
    /// Set the q-value cutoff.
    pub fn with_q_value_cutoff(mut self, cutoff: f64) -> Self {
        self.q_value_cutoff = cutoff;
        self
    }

    /// Drop invalid reads silently instead of failing.
    pub fn with_skip_read_validation(mut self, enabled: bool) -> Self {
        self.skip_read_validation = enabled;
        self
    }

    /// Enable zero-end trimming of scored paths.
    pub fn with_trim_max_paths(mut self, enabled: bool) -> Self {
        self.trim_max_paths = enabled;
        self
    }

    /// Enable the control background floor.
    pub fn with_background(mut self, enabled: bool) -> Self {
        self.use_background = enabled;
        self
    }

    /// Enable concurrent forward/reverse sweeps.
    pub fn with_parallel_sweeps(mut self, enabled: bool) -> Self {
        self.parallel_sweeps = enabled;
        self
    }

    /// Select the pileup strategy.
    pub fn with_strategy(mut self, strategy: PileupStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replace the local background windows; an empty list keeps only the
    /// fragment-length control.
    pub fn with_local_windows(mut self, windows: Vec<u32>) -> Self {
        self.local_windows = windows;
        self
    }

    /// Declare whether control reads are supplied.
    pub fn with_control(mut self, enabled: bool) -> Self {
        self.has_control = enabled;
        self
    }

    /// Windows the control track is built from. A window no wider than the
    /// fragment is the plain fragment pileup.
    pub fn control_windows(&self, fragment_length: u32) -> Vec<u32> {
        if self.has_control {
            std::iter::once(fragment_length)
                .chain(self.local_windows.iter().copied())
                .collect()
        } else {
            vec![self
                .local_windows
                .iter()
                .copied()
                .max()
                .unwrap_or(fragment_length)]
        }
    }

    /// `-log10` of the cutoff, the threshold applied to the q-value track.
    pub fn score_threshold(&self) -> f64 {
        -self.q_value_cutoff.log10()
    }

    pub(crate) fn validate(&self) -> Result<(), CallPeaksError> {
        if !(self.q_value_cutoff > 0.0 && self.q_value_cutoff <= 1.0) {
            return Err(CallPeaksError::InvalidConfig(format!(
                "q-value cutoff must be in (0, 1], got {}",
                self.q_value_cutoff
            )));
        }
        if self.local_windows.contains(&0) {
            return Err(CallPeaksError::InvalidConfig(
                "local background windows must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
