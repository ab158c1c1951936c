use tracing::{debug, info, warn};

use crate::graph::{Graph, NodeId};
use crate::interval::Interval;
use crate::peaks::{max_path, trim_zero_ends, BinaryTrack, ScoreError};
use crate::pileup::{fragment_pileup, Pileup};
use crate::stats::{p_value_track, PToQMapper, QValueMapping};

use super::{
    control_track, normalization_factors, preprocess_reads, CallPeaksError, ExperimentInfo,
    PeakCallConfig, ReadSource,
};

/// A reported peak.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoredPeak {
    /// Best path through the peak's region.
    pub interval: Interval,
    /// Summed q-score along the path.
    pub score: f64,
    /// Positive ids of every node in the region.
    pub subgraph: Vec<NodeId>,
}

/// Peaks of one graph, best first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakCallResult {
    /// Accepted peaks sorted by descending score.
    pub peaks: Vec<ScoredPeak>,
    /// Regions for which no path could be scored.
    pub unscored_regions: usize,
}

/// Output of the first phase: significance before multiple-testing
/// correction, plus the normalised sample track used for trimming.
#[derive(Debug, Clone, PartialEq)]
pub struct PValueStage {
    /// Poisson p-scores of sample against control.
    pub p_values: Pileup,
    /// Normalised sample pileup.
    pub sample: Pileup,
    /// Experiment facts after preprocessing.
    pub info: ExperimentInfo,
}

/// Fit one q mapping over the p-scores of several stages.
pub fn q_value_mapping<'a, I>(stages: I) -> QValueMapping
where
    I: IntoIterator<Item = &'a PValueStage>,
{
    let mut mapper = PToQMapper::new();
    for stage in stages {
        mapper.add_track(&stage.p_values);
    }
    mapper.mapping()
}

/// Peak caller bound to one graph.
#[derive(Debug)]
pub struct CallPeaks<'g> {
    graph: &'g Graph,
    info: ExperimentInfo,
    config: PeakCallConfig,
}

impl<'g> CallPeaks<'g> {
    /// Create a caller; rejects an unusable configuration up front.
    pub fn new(
        graph: &'g Graph,
        info: ExperimentInfo,
        config: PeakCallConfig,
    ) -> Result<Self, CallPeaksError> {
        info.validate()?;
        config.validate()?;
        Ok(Self {
            graph,
            info,
            config,
        })
    }

    /// Experiment facts, counters included.
    pub fn info(&self) -> &ExperimentInfo {
        &self.info
    }

    /// Configuration in use.
    pub fn config(&self) -> &PeakCallConfig {
        &self.config
    }

    /// Full run on a single graph.
    pub fn run<S, C>(&mut self, sample: S, control: C) -> Result<PeakCallResult, CallPeaksError>
    where
        S: IntoIterator<Item = Interval>,
        C: IntoIterator<Item = Interval>,
    {
        let stage = self.run_to_p_values(sample, control)?;
        let mapping = q_value_mapping([&stage]);
        self.call_peaks_from_q_values(stage, &mapping)
    }

    /// Preprocess, pile up, normalise and score significance.
    pub fn run_to_p_values<S, C>(
        &mut self,
        sample: S,
        control: C,
    ) -> Result<PValueStage, CallPeaksError>
    where
        S: IntoIterator<Item = Interval>,
        C: IntoIterator<Item = Interval>,
    {
        self.info.n_sample_reads = 0;
        self.info.n_control_reads = 0;
        let skip = self.config.skip_read_validation;
        let sample = preprocess_reads(self.graph, sample, ReadSource::Treatment, &mut self.info, skip)?;
        let control = if self.config.has_control {
            preprocess_reads(self.graph, control, ReadSource::Control, &mut self.info, skip)?.reads
        } else {
            debug!("no control library; sample reads stand in for it");
            self.info.n_control_reads = self.info.n_sample_reads;
            sample.reads.clone()
        };
        let scaling = normalization_factors(self.info.n_sample_reads, self.info.n_control_reads)?;

        let mut sample_track = self.pileup(&sample.reads)?;
        drop(sample);
        let windows = self.config.control_windows(self.info.fragment_length);
        let mut control_pileup = control_track(self.graph, &control, &self.info, &self.config, &windows)?;
        drop(control);

        scaling.apply(&mut sample_track, &mut control_pileup);

        let p_values = p_value_track(&control_pileup, &sample_track);
        info!(
            sample_reads = self.info.n_sample_reads,
            control_reads = self.info.n_control_reads,
            "p-value track ready"
        );
        Ok(PValueStage {
            p_values,
            sample: sample_track,
            info: self.info.clone(),
        })
    }

    /// Threshold q-scores, clean up, and report the best path of each region.
    pub fn call_peaks_from_q_values(
        &self,
        stage: PValueStage,
        mapping: &QValueMapping,
    ) -> Result<PeakCallResult, CallPeaksError> {
        let q_values = mapping.apply(&stage.p_values);
        drop(stage.p_values);

        let fragment_length = stage.info.fragment_length;
        let mut binary = BinaryTrack::threshold(&q_values, self.config.score_threshold());
        binary.fill_small_holes(self.graph, stage.info.read_length);
        let binary = binary.remove_small_peaks(self.graph, fragment_length);
        let regions = binary.to_regions(self.graph);
        debug!(regions = regions.len(), "extracted peak regions");

        let mut result = PeakCallResult::default();
        for region in regions {
            let path = match max_path(&region, self.graph, &q_values) {
                Ok(path) => path,
                Err(ScoreError::EmptyRegion) => {
                    warn!(nodes = ?region.nodes(), "region has no score");
                    result.unscored_regions += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let interval = if self.config.trim_max_paths {
                match trim_zero_ends(&path.interval, self.graph, &stage.sample, fragment_length)? {
                    Some(trimmed) => trimmed,
                    None => {
                        debug!(nodes = ?region.nodes(), "peak dropped after trimming");
                        continue;
                    }
                }
            } else {
                path.interval
            };
            result.peaks.push(ScoredPeak {
                interval,
                score: path.score,
                subgraph: region.nodes(),
            });
        }

        result.peaks.sort_by(|a, b| b.score.total_cmp(&a.score));
        info!(
            peaks = result.peaks.len(),
            unscored = result.unscored_regions,
            "peak calling complete"
        );
        Ok(result)
    }

    fn pileup(&self, reads: &[Interval]) -> Result<Pileup, CallPeaksError> {
        let dense = fragment_pileup(
            self.graph,
            reads,
            self.info.fragment_length,
            self.config.strategy,
            self.config.parallel_sweeps,
        )?;
        Ok(dense.to_pileup())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(n: i64, length: u32) -> Graph {
        Graph::from_edges((1..=n).map(|id| (id, length)), (1..n).map(|id| (id, id + 1))).unwrap()
    }

    #[test]
    fn enriched_region_becomes_a_peak() {
        let graph = linear(10, 20);
        let info = ExperimentInfo::from_graph(&graph, 20, 10);
        let mut caller = CallPeaks::new(&graph, info, PeakCallConfig::default()).unwrap();

        // Ten distinct fragments stacked over the end of node 5, each read
        // three times; control covers every base once.
        let sample: Vec<Interval> = (0..30)
            .map(|i| Interval::new(i % 10, i % 10 + 10, vec![5]))
            .collect();
        let control: Vec<Interval> = (0..10)
            .map(|i| Interval::new(0, 10, vec![i as NodeId + 1]))
            .collect();

        let result = caller.run(sample, control).unwrap();
        assert_eq!(caller.info().n_sample_reads, 10);
        assert_eq!(caller.info().n_control_reads, 10);
        assert!(!result.peaks.is_empty());
        let best = &result.peaks[0];
        assert_eq!(best.subgraph, vec![5, 6]);
        assert!(best.score > 0.0);
        assert!(result
            .peaks
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn missing_control_is_degenerate() {
        let graph = linear(3, 20);
        let info = ExperimentInfo::from_graph(&graph, 40, 10);
        let mut caller = CallPeaks::new(&graph, info, PeakCallConfig::default()).unwrap();
        let sample = vec![Interval::new(0, 10, vec![1])];
        assert_eq!(
            caller.run(sample, Vec::new()),
            Err(CallPeaksError::NoControlReads)
        );
    }

    #[test]
    fn bad_configuration_is_rejected() {
        let graph = linear(3, 20);
        let info = ExperimentInfo::from_graph(&graph, 0, 10);
        assert!(matches!(
            CallPeaks::new(&graph, info, PeakCallConfig::default()),
            Err(CallPeaksError::InvalidConfig(_))
        ));
    }

    #[test]
    fn two_phase_run_matches_single_run() {
        let graph = linear(6, 25);
        let sample: Vec<Interval> = (0..12)
            .map(|i| Interval::new(i, i + 10, vec![3]))
            .collect();
        let control: Vec<Interval> = (0..6)
            .map(|i| Interval::new(0, 10, vec![i as NodeId + 1]))
            .collect();
        let config = PeakCallConfig::default().with_parallel_sweeps(false);

        let info = ExperimentInfo::from_graph(&graph, 30, 10);
        let single = CallPeaks::new(&graph, info.clone(), config.clone())
            .unwrap()
            .run(sample.clone(), control.clone())
            .unwrap();

        let mut caller = CallPeaks::new(&graph, info, config).unwrap();
        let stage = caller.run_to_p_values(sample, control).unwrap();
        let mapping = q_value_mapping([&stage]);
        let two_phase = caller.call_peaks_from_q_values(stage, &mapping).unwrap();
        assert_eq!(single, two_phase);
    }

    fn flat_control(n: i64) -> Vec<Interval> {
        (0..n).map(|i| Interval::new(0, 10, vec![i + 1])).collect()
    }

    #[test]
    fn repeated_runs_start_from_fresh_counters() {
        let graph = linear(10, 20);
        let info = ExperimentInfo::from_graph(&graph, 20, 10);
        let mut caller = CallPeaks::new(&graph, info, PeakCallConfig::default()).unwrap();
        let sample: Vec<Interval> = (0..10).map(|i| Interval::new(i, i + 10, vec![5])).collect();

        let first = caller.run_to_p_values(sample.clone(), flat_control(10)).unwrap();
        let second = caller.run_to_p_values(sample, flat_control(10)).unwrap();
        assert_eq!(second.info.n_sample_reads, 10);
        assert_eq!(second.info.n_control_reads, 10);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_sample_is_scored_against_unscaled_control() {
        let graph = linear(10, 20);
        let info = ExperimentInfo::from_graph(&graph, 20, 10);
        let mut caller = CallPeaks::new(&graph, info, PeakCallConfig::default()).unwrap();

        let stage = caller.run_to_p_values(Vec::new(), flat_control(10)).unwrap();
        assert_eq!(stage.info.n_sample_reads, 0);
        // Control depth stays at 1, so every base scores -log10(1 - e^-1).
        let expected = -(1.0 - (-1.0f64).exp()).log10();
        let max = stage.p_values.max_value();
        assert!(max.is_finite());
        assert!((max - expected).abs() < 1e-6);

        let mapping = q_value_mapping([&stage]);
        let result = caller.call_peaks_from_q_values(stage, &mapping).unwrap();
        assert!(result.peaks.is_empty());
    }

    #[test]
    fn control_free_run_uses_sample_as_control() {
        let graph = linear(10, 20);
        let info = ExperimentInfo::from_graph(&graph, 20, 10);
        let config = PeakCallConfig::default().with_control(false);
        let mut caller = CallPeaks::new(&graph, info, config).unwrap();
        let sample: Vec<Interval> = (0..30)
            .map(|i| Interval::new(i % 10, i % 10 + 10, vec![5]))
            .collect();

        // The control argument is ignored.
        let result = caller.run(sample, flat_control(3)).unwrap();
        assert_eq!(caller.info().n_sample_reads, 10);
        assert_eq!(caller.info().n_control_reads, 10);
        assert_eq!(result.peaks[0].subgraph, vec![5, 6]);
    }
}
