//! Plain-text readers and writers used by the `graphpeak` binary.
//!
//! Graph files hold one record per line: `N <id> <length>` for a node and
//! `E <from> <to>` for a directed edge between signed node ids. Interval
//! files hold `<start> <end> <n1,n2,...>` per line. Blank lines and lines
//! starting with `#` are ignored in both.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::graph::{Graph, NodeId};
use crate::interval::Interval;
use crate::pileup::Pileup;
use crate::pipeline::ScoredPeak;

const PEAK_HEADER: &str = "#start\tend\tpath\tscore\tsubgraph\n";

fn records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<(usize, String)>> {
    reader.lines().enumerate().filter_map(|(idx, line)| match line {
        Ok(line) => {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                None
            } else {
                Some(Ok((idx + 1, trimmed.to_string())))
            }
        }
        Err(err) => Some(Err(err.into())),
    })
}

fn field<'a, T>(fields: &mut impl Iterator<Item = &'a str>, what: &str, line_no: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = fields
        .next()
        .ok_or_else(|| anyhow!("missing {what} on line {line_no}"))?;
    raw.parse()
        .with_context(|| format!("invalid {what} '{raw}' on line {line_no}"))
}

/// Parse a graph from `N`/`E` records.
pub fn read_graph<R: BufRead>(reader: R) -> Result<Graph> {
    let mut nodes: Vec<(NodeId, u32)> = Vec::new();
    let mut edges: Vec<(NodeId, NodeId)> = Vec::new();
    for record in records(reader) {
        let (line_no, line) = record?;
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("N") => {
                let id = field(&mut fields, "node id", line_no)?;
                let length = field(&mut fields, "node length", line_no)?;
                nodes.push((id, length));
            }
            Some("E") => {
                let from = field(&mut fields, "edge source", line_no)?;
                let to = field(&mut fields, "edge target", line_no)?;
                edges.push((from, to));
            }
            Some(other) => bail!("unknown record type '{other}' on line {line_no}"),
            None => {}
        }
    }
    Graph::from_edges(nodes, edges).context("graph tables are inconsistent")
}

/// Load a graph file.
pub fn read_graph_file<P: AsRef<Path>>(path: P) -> Result<Graph> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open graph file {}", path.display()))?;
    read_graph(BufReader::new(file))
        .with_context(|| format!("failed to read graph from {}", path.display()))
}

/// Parse intervals, one `<start> <end> <n1,n2,...>` record per line.
pub fn read_intervals<R: BufRead>(reader: R) -> Result<Vec<Interval>> {
    let mut intervals = Vec::new();
    for record in records(reader) {
        let (line_no, line) = record?;
        let mut fields = line.split_whitespace();
        let start = field(&mut fields, "start offset", line_no)?;
        let end = field(&mut fields, "end offset", line_no)?;
        let path_field = fields
            .next()
            .ok_or_else(|| anyhow!("missing node path on line {line_no}"))?;
        let path = path_field
            .split(',')
            .map(|node| {
                node.parse::<NodeId>()
                    .with_context(|| format!("invalid node '{node}' on line {line_no}"))
            })
            .collect::<Result<Vec<_>>>()?;
        intervals.push(Interval::new(start, end, path));
    }
    Ok(intervals)
}

/// Load an interval file.
pub fn read_intervals_file<P: AsRef<Path>>(path: P) -> Result<Vec<Interval>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open interval file {}", path.display()))?;
    read_intervals(BufReader::new(file))
        .with_context(|| format!("failed to read intervals from {}", path.display()))
}

fn join(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(NodeId::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Write peaks as tab-separated records, in the given order.
pub fn write_peaks<W: Write>(writer: &mut W, peaks: &[ScoredPeak]) -> Result<()> {
    writer.write_all(PEAK_HEADER.as_bytes())?;
    for peak in peaks {
        writeln!(
            writer,
            "{}\t{}\t{}\t{:.4}\t{}",
            peak.interval.start,
            peak.interval.end,
            join(&peak.interval.path),
            peak.score,
            join(&peak.subgraph)
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Render peaks into a string (tests and snapshots).
pub fn render_peaks(peaks: &[ScoredPeak]) -> Result<String> {
    let mut buffer = Vec::new();
    write_peaks(&mut buffer, peaks)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered peaks are not valid UTF-8"))
}

/// Write nonzero runs of a track as `node start end value` records, nodes in
/// topological order.
pub fn write_pileup<W: Write>(writer: &mut W, graph: &Graph, pileup: &Pileup) -> Result<()> {
    for &idx in graph.topological_indices() {
        let node = graph.id_at(idx);
        for (start, end, value) in pileup.node(idx).runs() {
            if value != 0.0 {
                writeln!(writer, "{node}\t{start}\t{end}\t{value}")?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Render a track into a string (tests and snapshots).
pub fn render_pileup(graph: &Graph, pileup: &Pileup) -> Result<String> {
    let mut buffer = Vec::new();
    write_pileup(&mut buffer, graph, pileup)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered pileup is not valid UTF-8"))
}
