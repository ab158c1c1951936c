use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::warn;

use super::{Direction, Graph};

/// Kahn ordering of the positive strand; ties broken by smallest node index.
///
/// Edges that switch strand are ignored. Nodes left over because they sit on
/// a cycle are appended in index order.
pub fn topological_sort(graph: &Graph) -> Vec<usize> {
    let n = graph.node_count();
    let mut in_degree = vec![0usize; n];
    for idx in 0..n {
        for &next in graph.next_in(idx, Direction::Forward) {
            if next > 0 {
                if let Some(target) = graph.index_of(next) {
                    in_degree[target] += 1;
                }
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&idx| in_degree[idx] == 0)
        .map(Reverse)
        .collect();
    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while let Some(Reverse(idx)) = ready.pop() {
        placed[idx] = true;
        order.push(idx);
        for &next in graph.next_in(idx, Direction::Forward) {
            if next <= 0 {
                continue;
            }
            if let Some(target) = graph.index_of(next) {
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    ready.push(Reverse(target));
                }
            }
        }
    }

    if order.len() < n {
        warn!(
            cyclic_nodes = n - order.len(),
            "graph has cycles on the forward strand; appending them in id order"
        );
        order.extend((0..n).filter(|&idx| !placed[idx]));
    }
    order
}

#[cfg(test)]
mod tests {
    use crate::graph::Graph;

    #[test]
    fn orders_branching_graph() {
        let graph = Graph::from_edges(
            [(1, 5), (2, 5), (3, 5), (4, 5)],
            [(1, 3), (1, 2), (3, 4), (2, 4)],
        )
        .unwrap();
        assert_eq!(graph.topological_order(false), vec![1, 2, 3, 4]);
        assert_eq!(graph.topological_order(true), vec![4, 3, 2, 1]);
    }

    #[test]
    fn ignores_strand_switching_edges() {
        let graph = Graph::from_edges([(1, 4), (2, 4), (3, 4)], [(2, 3), (3, -1)]).unwrap();
        assert_eq!(graph.topological_order(false), vec![1, 2, 3]);
    }

    #[test]
    fn cycles_are_appended() {
        let graph = Graph::from_edges([(1, 4), (2, 4), (3, 4)], [(1, 2), (2, 3), (3, 2)]).unwrap();
        assert_eq!(graph.topological_order(false), vec![1, 2, 3]);
    }
}
