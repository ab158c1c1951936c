use tracing::{info, warn};

use crate::pileup::Pileup;

use super::CallPeaksError;

/// Which track gets scaled down so both represent the same read depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scaling {
    /// Equal read counts.
    None,
    /// Sample track multiplied by the factor.
    Sample(f64),
    /// Control track multiplied by the factor.
    Control(f64),
}

impl Scaling {
    /// Apply the factor to whichever track it targets.
    pub fn apply(self, sample: &mut Pileup, control: &mut Pileup) {
        match self {
            Scaling::None => {}
            Scaling::Sample(factor) => sample.scale(factor),
            Scaling::Control(factor) => control.scale(factor),
        }
    }
}

/// Scale the side with more reads down to the other.
///
/// `ratio = n_sample / n_control`; above 1 the sample is scaled by
/// `1 / ratio`, below 1 the control is scaled by `ratio`.
pub fn normalization_factors(n_sample: u64, n_control: u64) -> Result<Scaling, CallPeaksError> {
    if n_control == 0 {
        return Err(CallPeaksError::NoControlReads);
    }
    if n_sample == 0 {
        warn!("no sample reads; leaving tracks unscaled");
        return Ok(Scaling::None);
    }
    let ratio = n_sample as f64 / n_control as f64;
    let scaling = if ratio > 1.0 {
        Scaling::Sample(1.0 / ratio)
    } else if ratio < 1.0 {
        Scaling::Control(ratio)
    } else {
        Scaling::None
    };
    info!(n_sample, n_control, ?scaling, "normalising read depth");
    Ok(scaling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(200, 100 => Scaling::Sample(0.5); "more sample reads")]
    #[test_case(100, 200 => Scaling::Control(0.5); "more control reads")]
    #[test_case(150, 150 => Scaling::None; "balanced")]
    #[test_case(300, 400 => Scaling::Control(0.75); "fractional ratio")]
    #[test_case(0, 10 => Scaling::None; "empty sample")]
    fn scales_the_larger_side(n_sample: u64, n_control: u64) -> Scaling {
        normalization_factors(n_sample, n_control).unwrap()
    }

    #[test]
    fn zero_control_reads_are_degenerate() {
        assert_eq!(
            normalization_factors(10, 0),
            Err(CallPeaksError::NoControlReads)
        );
    }

    #[test]
    fn factors_apply_to_one_track() {
        let mut sample = Pileup::from_values(vec![crate::pileup::PileupValue::constant(4, 8.0)]);
        let mut control = sample.clone();
        Scaling::Sample(0.5).apply(&mut sample, &mut control);
        assert_eq!(sample.node(0).start_value(), 4.0);
        assert_eq!(control.node(0).start_value(), 8.0);
    }
}
