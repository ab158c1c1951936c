#[path = "common/mod.rs"]
mod common;

use common::linear_graph;
use graphpeak::stats::PToQMapper;
use graphpeak::{BinaryTrack, Pileup, PileupValue};
use proptest::prelude::*;

fn track_from(nodes: &[Vec<u8>]) -> Pileup {
    Pileup::from_values(nodes.iter().map(|values| PileupValue::from_dense(values)).collect())
}

proptest! {
    #[test]
    fn threshold_marks_exactly_the_bases_at_or_above(
        nodes in proptest::collection::vec(proptest::collection::vec(0u8..5, 1..16), 1..5),
        cutoff in 0u8..6,
    ) {
        let lengths: Vec<u32> = nodes.iter().map(|values| values.len() as u32).collect();
        let graph = linear_graph(&lengths);
        let track = track_from(&nodes);

        let binary = BinaryTrack::threshold(&track, f64::from(cutoff));
        let indicator = binary.to_pileup(&graph);
        let mut expected_covered = 0u64;
        for (idx, values) in nodes.iter().enumerate() {
            for (pos, &value) in values.iter().enumerate() {
                let above = value >= cutoff;
                expected_covered += u64::from(above);
                let marked = indicator.node(idx).value_at(pos as u32);
                prop_assert_eq!(marked, if above { 1.0 } else { 0.0 });
            }
        }
        prop_assert_eq!(binary.covered_length(), expected_covered);
    }

    #[test]
    fn q_scores_are_monotone_and_bounded_by_p(
        runs in proptest::collection::vec((1u32..20, 0u32..60), 1..24),
    ) {
        let values: Vec<PileupValue> = runs
            .iter()
            .map(|&(length, tenths)| PileupValue::constant(length, f64::from(tenths) / 10.0))
            .collect();
        let mut mapper = PToQMapper::new();
        mapper.add_track(&Pileup::from_values(values));
        let mapping = mapper.mapping();

        let points = mapping.points();
        for pair in points.windows(2) {
            prop_assert!(pair[0].0 < pair[1].0);
            prop_assert!(pair[0].1 <= pair[1].1);
        }
        for &(p, q) in points {
            prop_assert!(q >= 0.0);
            prop_assert!(q <= p + 1e-12);
            prop_assert_eq!(mapping.q_value(p), q);
        }
    }
}
