//! Live loudness metering.

/// RMS of `frame`, clamped to [0, 1].
///
/// An empty frame reads as silence (0.0) rather than NaN.
pub fn level(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = frame
        .iter()
        .map(|&s| {
            let s = f64::from(s);
            s * s
        })
        .sum();
    let rms = (sum_sq / frame.len() as f64).sqrt() as f32;
    if rms.is_nan() {
        return 0.0;
    }
    rms.clamp(0.0, 1.0)
}

/// Level expressed in dBFS, floored at -96 dB for silence.
pub fn level_dbfs(frame: &[f32]) -> f32 {
    to_dbfs(level(frame))
}

pub(crate) fn to_dbfs(amplitude: f32) -> f32 {
    const FLOOR_DB: f32 = -96.0;
    if amplitude <= 0.0 {
        return FLOOR_DB;
    }
    (20.0 * amplitude.log10()).max(FLOOR_DB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_zero() {
        assert_eq!(level(&[0.0; 512]), 0.0);
    }

    #[test]
    fn full_scale_is_one() {
        assert!((level(&[1.0; 512]) - 1.0).abs() < 1e-6);
        assert!((level(&[-1.0; 512]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_frame_is_zero() {
        assert_eq!(level(&[]), 0.0);
    }

    #[test]
    fn over_range_input_is_clamped() {
        assert_eq!(level(&[4.0; 16]), 1.0);
    }

    #[test]
    fn nan_does_not_leak() {
        assert_eq!(level(&[f32::NAN, 0.5]), 0.0);
    }

    #[test]
    fn square_wave_at_half_scale() {
        let frame: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        assert!((level(&frame) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn dbfs_of_half_scale() {
        assert!((level_dbfs(&[0.5; 64]) + 6.0206).abs() < 1e-3);
        assert_eq!(level_dbfs(&[]), -96.0);
    }
}
