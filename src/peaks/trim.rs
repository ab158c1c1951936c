use crate::graph::{Graph, NodeId};
use crate::interval::{Interval, ValidationError};
use crate::pileup::Pileup;

/// Strip leading and trailing bases where `sample` is exactly zero.
///
/// Returns `None` when nothing nonzero remains or the trimmed interval is
/// shorter than `min_length`.
pub fn trim_zero_ends(
    interval: &Interval,
    graph: &Graph,
    sample: &Pileup,
    min_length: u32,
) -> Result<Option<Interval>, ValidationError> {
    let ranges = interval.directed_ranges(graph)?;

    let head = ranges
        .iter()
        .enumerate()
        .find_map(|(i, &(node, start, end))| {
            first_nonzero(graph, sample, node, start, end).map(|pos| (i, pos))
        });
    let tail = ranges
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, &(node, start, end))| {
            last_nonzero(graph, sample, node, start, end).map(|pos| (i, pos))
        });
    let (Some((first, start)), Some((last, end))) = (head, tail) else {
        return Ok(None);
    };

    let trimmed = Interval::new(start, end + 1, interval.path[first..=last].to_vec());
    if trimmed.length(graph)? < u64::from(min_length) {
        return Ok(None);
    }
    Ok(Some(trimmed))
}

/// First directed position in `[start, end)` of `node` with a nonzero value.
fn first_nonzero(graph: &Graph, sample: &Pileup, node: NodeId, start: u32, end: u32) -> Option<u32> {
    let value = sample.get(graph, node)?;
    if node > 0 {
        return value.first_nonzero(start, end);
    }
    let length = value.length();
    value
        .last_nonzero(length - end, length - start)
        .map(|pos| length - 1 - pos)
}

/// Last directed position in `[start, end)` of `node` with a nonzero value.
fn last_nonzero(graph: &Graph, sample: &Pileup, node: NodeId, start: u32, end: u32) -> Option<u32> {
    let value = sample.get(graph, node)?;
    if node > 0 {
        return value.last_nonzero(start, end);
    }
    let length = value.length();
    value
        .first_nonzero(length - end, length - start)
        .map(|pos| length - 1 - pos)
}
