use tracing::debug;

use crate::graph::Graph;
use crate::interval::{Extender, Interval};
use crate::pileup::{fragment_pileup, DensePileup, Pileup};

use super::{CallPeaksError, ExperimentInfo, PeakCallConfig};

/// Control depth: the pointwise maximum over every window track, floored
/// at the genome-wide background when enabled.
///
/// A window no wider than the fragment is the plain fragment pileup. A wider
/// window counts every read within half a window on either side and is
/// rescaled by `fragment_length / window`, so a dense neighbourhood raises
/// the control even where no fragment reaches.
pub fn control_track(
    graph: &Graph,
    reads: &[Interval],
    info: &ExperimentInfo,
    config: &PeakCallConfig,
    windows: &[u32],
) -> Result<Pileup, CallPeaksError> {
    let mut combined: Option<Pileup> = None;
    for &window in windows {
        let track = if window <= info.fragment_length {
            fragment_pileup(
                graph,
                reads,
                info.fragment_length,
                config.strategy,
                config.parallel_sweeps,
            )?
            .to_pileup()
        } else {
            window_pileup(graph, reads, window, info.fragment_length)?
        };
        debug!(window, max = track.max_value(), "control window ready");
        combined = Some(match combined {
            Some(acc) => acc.combine(&track, f64::max),
            None => track,
        });
    }

    let mut control = combined.unwrap_or_else(|| Pileup::constant(graph, 0.0));
    if config.use_background {
        let background = info.background();
        debug!(background, "flooring control at background depth");
        control.floor(background);
    }
    Ok(control)
}

fn window_pileup(
    graph: &Graph,
    reads: &[Interval],
    window: u32,
    fragment_length: u32,
) -> Result<Pileup, CallPeaksError> {
    let extender = Extender::new(graph, window / 2);
    let mut dense = DensePileup::new(graph);
    for read in reads {
        let mut areas = extender.extend(read)?;
        areas.merge(&extender.extend(&read.reversed(graph)?)?);
        dense.add_areas(graph, &areas)?;
    }
    let mut track = dense.to_pileup();
    track.scale(f64::from(fragment_length) / f64::from(window));
    Ok(track)
}
