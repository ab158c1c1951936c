use std::collections::HashSet;

use blake3::hash;
use graphpeak::io::{read_graph, read_intervals, render_peaks};
use graphpeak::pipeline::q_value_mapping;
use graphpeak::{
    CallPeaks, CallPeaksError, ExperimentInfo, Graph, Interval, NodeId, PeakCallConfig,
    PeakCallResult, PileupStrategy,
};

/// Chain 1..4, a bubble 4 -> {5, 6} -> 7, then a chain 7..10. Every node is
/// 20 bases long.
const GRAPH: &str = "\
# bubble in the middle of a chain
N 1 20
N 2 20
N 3 20
N 4 20
N 5 20
N 6 20
N 7 20
N 8 20
N 9 20
N 10 20
E 1 2
E 2 3
E 3 4
E 4 5
E 4 6
E 5 7
E 6 7
E 7 8
E 8 9
E 9 10
";

fn graph() -> Graph {
    read_graph(GRAPH.as_bytes()).expect("graph parses")
}

/// Ten distinct reads stacked over the end of branch node 5, each sequenced
/// three times.
fn sample_reads() -> Vec<Interval> {
    let text: String = (0..30)
        .map(|i| format!("{} {} 5\n", i % 10, i % 10 + 10))
        .collect();
    read_intervals(text.as_bytes()).expect("reads parse")
}

/// One read per node, so the control is flat.
fn control_reads() -> Vec<Interval> {
    (1..=10)
        .map(|id: NodeId| Interval::new(0, 10, vec![id]))
        .collect()
}

fn call(graph: &Graph, config: PeakCallConfig) -> PeakCallResult {
    let info = ExperimentInfo::from_graph(graph, 20, 10);
    CallPeaks::new(graph, info, config)
        .expect("configuration is valid")
        .run(sample_reads(), control_reads())
        .expect("peak calling succeeds")
}

#[test]
fn enriched_branch_is_reported() {
    let graph = graph();
    let result = call(&graph, PeakCallConfig::default());

    assert_eq!(result.unscored_regions, 0);
    let best = result.peaks.first().expect("at least one peak");
    assert_eq!(best.subgraph, vec![5, 7]);
    let nodes: HashSet<NodeId> = best.interval.path.iter().map(|id| id.abs()).collect();
    assert_eq!(nodes, HashSet::from([5, 7]));
    assert!(best.score > 0.0);
    assert!(!result.peaks.iter().any(|peak| peak.subgraph.contains(&6)));
}

#[test]
fn strategies_and_scheduling_agree() {
    let graph = graph();
    let reference = call(&graph, PeakCallConfig::default().with_parallel_sweeps(false));
    let parallel = call(&graph, PeakCallConfig::default().with_parallel_sweeps(true));
    let extended = call(
        &graph,
        PeakCallConfig::default().with_strategy(PileupStrategy::Extender),
    );
    assert_eq!(reference, parallel);
    assert_eq!(reference, extended);
}

#[test]
fn peak_output_is_deterministic() {
    let graph = graph();
    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        let result = call(&graph, PeakCallConfig::default());
        let rendered = render_peaks(&result.peaks).expect("rendering succeeds");
        fingerprints.insert(hash(rendered.as_bytes()));
    }
    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}

#[test]
fn shared_mapping_across_graphs() {
    let graph = graph();
    let info = ExperimentInfo::from_graph(&graph, 20, 10);
    let config = PeakCallConfig::default();

    let mut first = CallPeaks::new(&graph, info.clone(), config.clone()).expect("valid");
    let mut second = CallPeaks::new(&graph, info, config).expect("valid");
    let stages = [
        first
            .run_to_p_values(sample_reads(), control_reads())
            .expect("first stage"),
        second
            .run_to_p_values(sample_reads(), control_reads())
            .expect("second stage"),
    ];
    let mapping = q_value_mapping(&stages);
    assert!(!mapping.is_empty());

    let [one, two] = stages;
    let one = first.call_peaks_from_q_values(one, &mapping).expect("first peaks");
    let two = second.call_peaks_from_q_values(two, &mapping).expect("second peaks");
    assert_eq!(one, two);
    assert_eq!(one.peaks[0].subgraph, vec![5, 7]);
}

#[test]
fn invalid_reads_fail_unless_skipped() {
    let graph = graph();
    let info = ExperimentInfo::from_graph(&graph, 20, 10);
    let mut sample = sample_reads();
    sample.push(Interval::new(0, 5, vec![5, 6]));

    let strict = CallPeaks::new(&graph, info.clone(), PeakCallConfig::default())
        .expect("valid")
        .run(sample.clone(), control_reads());
    assert!(matches!(
        strict,
        Err(CallPeaksError::InvalidRead { index: 30, .. })
    ));

    let mut lenient = CallPeaks::new(
        &graph,
        info,
        PeakCallConfig::default().with_skip_read_validation(true),
    )
    .expect("valid");
    let result = lenient.run(sample, control_reads()).expect("bad read skipped");
    assert_eq!(lenient.info().n_sample_reads, 10);
    assert_eq!(result.peaks[0].subgraph, vec![5, 7]);
}
