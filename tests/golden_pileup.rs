#[path = "common/mod.rs"]
mod common;
use common::{assert_snapshot, bubble_graph};
use graphpeak::io::render_pileup;
use graphpeak::{fragment_pileup, Interval, PileupStrategy};

#[test]
fn bubble_pileup_matches_golden() {
    let graph = bubble_graph(5);
    // One read at the source heading into the bubble, one on the reverse
    // strand of the sink heading back into it.
    let reads = vec![Interval::new(0, 2, vec![1]), Interval::new(0, 2, vec![-4])];

    let dense = fragment_pileup(&graph, &reads, 8, PileupStrategy::Sweep, true)
        .expect("pileup builds");
    let actual = render_pileup(&graph, &dense.to_pileup()).expect("rendering succeeds");
    assert_snapshot("pileup/bubble.tsv", &actual);
}
