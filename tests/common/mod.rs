#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use graphpeak::{DensePileup, Graph, NodeId};

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("GRAPHPEAK_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set GRAPHPEAK_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

/// Chain `1 -> 2 -> ... -> lengths.len()`.
pub fn linear_graph(lengths: &[u32]) -> Graph {
    let n = lengths.len() as NodeId;
    Graph::from_edges(
        lengths.iter().enumerate().map(|(i, &len)| (i as NodeId + 1, len)),
        (1..n).map(|id| (id, id + 1)),
    )
    .expect("linear graph builds")
}

/// `1 -> {2, 3} -> 4`, every node of the same length.
pub fn bubble_graph(length: u32) -> Graph {
    Graph::from_edges(
        [(1, length), (2, length), (3, length), (4, length)],
        [(1, 2), (1, 3), (2, 4), (3, 4)],
    )
    .expect("bubble graph builds")
}

/// Depth along a linear graph, nodes concatenated in id order.
pub fn concatenated(graph: &Graph, dense: &DensePileup) -> Vec<u32> {
    (1..=graph.node_count() as NodeId)
        .flat_map(|id| {
            let idx = graph.index_of(id).expect("node exists");
            dense.node_values(idx).to_vec()
        })
        .collect()
}
