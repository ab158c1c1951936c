use tracing::debug;

use crate::graph::Graph;
use crate::interval::{Extender, Interval};

use super::{build_pileup, DensePileup, FragmentStarts, PileupError};

/// How read fragments are turned into coverage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PileupStrategy {
    /// Read spans added directly, extensions resolved by the two-strand sweep.
    #[default]
    Sweep,
    /// Each read extended to its footprint on its own, then accumulated.
    Extender,
}

/// Coverage of reads extended to `fragment_length`.
///
/// Every read covers its own span plus `fragment_length - read length` bases
/// downstream of its end, following all branches. A read longer than the
/// fragment is counted as-is.
pub fn fragment_pileup(
    graph: &Graph,
    reads: &[Interval],
    fragment_length: u32,
    strategy: PileupStrategy,
    parallel: bool,
) -> Result<DensePileup, PileupError> {
    match strategy {
        PileupStrategy::Sweep => sweep_pileup(graph, reads, fragment_length, parallel),
        PileupStrategy::Extender => extender_pileup(graph, reads, fragment_length),
    }
}

fn sweep_pileup(
    graph: &Graph,
    reads: &[Interval],
    fragment_length: u32,
    parallel: bool,
) -> Result<DensePileup, PileupError> {
    let mut direct = DensePileup::new(graph);
    let mut starts = FragmentStarts::new();
    for read in reads {
        direct.add_interval(graph, read)?;
        let Some(last) = read.last_node() else {
            continue;
        };
        let extension = u64::from(fragment_length).saturating_sub(read.length(graph)?);
        if extension > 0 {
            starts.add(last, read.end, extension);
        }
    }
    debug!(reads = reads.len(), extensions = starts.len(), "read spans added");

    let extended = build_pileup(graph, &starts, parallel)?;
    direct.merge(&extended);
    Ok(direct)
}

fn extender_pileup(
    graph: &Graph,
    reads: &[Interval],
    fragment_length: u32,
) -> Result<DensePileup, PileupError> {
    let extender = Extender::new(graph, fragment_length);
    let mut pileup = DensePileup::new(graph);
    for read in reads {
        let areas = extender.extend(read)?;
        pileup.add_areas(graph, &areas)?;
    }
    Ok(pileup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn split_graph() -> Graph {
        Graph::from_edges(
            [(1, 5), (2, 5), (3, 5), (4, 5)],
            [(1, 2), (1, 3), (2, 4), (3, 4)],
        )
        .unwrap()
    }

    fn depths(graph: &Graph, pileup: &DensePileup, node: NodeId) -> Vec<u32> {
        pileup.node_values(graph.index_of(node).unwrap()).to_vec()
    }

    #[test]
    fn strategies_agree_on_branching_graph() {
        let graph = split_graph();
        let reads = vec![
            Interval::new(1, 3, vec![1]),
            Interval::new(3, 2, vec![1, 3]),
            Interval::new(0, 2, vec![-4]),
            Interval::new(2, 4, vec![-2]),
        ];
        let sweep = fragment_pileup(&graph, &reads, 8, PileupStrategy::Sweep, false).unwrap();
        let extender =
            fragment_pileup(&graph, &reads, 8, PileupStrategy::Extender, false).unwrap();
        assert_eq!(sweep.as_slice(), extender.as_slice());
        assert_eq!(sweep.touched_count(), extender.touched_count());
    }

    #[test]
    fn read_span_and_extension_are_both_counted() {
        let graph = Graph::from_edges([(1, 5), (2, 5)], [(1, 2)]).unwrap();
        let reads = vec![Interval::new(1, 3, vec![1])];
        let pileup = fragment_pileup(&graph, &reads, 6, PileupStrategy::Sweep, true).unwrap();
        assert_eq!(depths(&graph, &pileup, 1), vec![0, 1, 1, 1, 1]);
        assert_eq!(depths(&graph, &pileup, 2), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn strategies_agree_on_end_offsets_past_the_node() {
        let graph = Graph::from_edges([(1, 5), (2, 5)], [(1, 2)]).unwrap();
        let reads = vec![Interval::new(0, 9, vec![-1]), Interval::new(2, 9, vec![1])];
        let sweep = fragment_pileup(&graph, &reads, 10, PileupStrategy::Sweep, false).unwrap();
        let extender =
            fragment_pileup(&graph, &reads, 10, PileupStrategy::Extender, false).unwrap();
        assert_eq!(sweep.as_slice(), extender.as_slice());
        assert_eq!(depths(&graph, &sweep, 1), vec![1, 1, 2, 2, 2]);
    }

    #[test]
    fn invalid_read_is_reported() {
        let graph = split_graph();
        let reads = vec![Interval::new(0, 2, vec![7])];
        assert!(matches!(
            fragment_pileup(&graph, &reads, 8, PileupStrategy::Sweep, false),
            Err(PileupError::Interval(_))
        ));
    }
}
