//! Easing curves and interpolation helpers used by tethered motion.

use bevy::prelude::*;
use serde::Deserialize;

/// Maps normalized elapsed time to normalized progress.
///
/// All variants are evaluated on `u` clamped to [0, 1]. The output is not clamped,
/// so sampled curves may overshoot for springy motion.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub enum EaseCurve {
    /// Identity: progress equals time.
    Linear,
    /// Cubic Hermite with flat tangents at both ends (`3u² - 2u³`).
    #[default]
    EaseInOut,
    /// Uniformly spaced samples over [0, 1], linearly interpolated.
    Sampled(Vec<f32>),
}

impl EaseCurve {
    /// Evaluate the curve at `u`.
    pub fn evaluate(&self, u: f32) -> f32 {
        let u = u.clamp(0.0, 1.0);
        match self {
            EaseCurve::Linear => u,
            EaseCurve::EaseInOut => u * u * (3.0 - 2.0 * u),
            EaseCurve::Sampled(samples) => sample(samples, u),
        }
    }

    /// Whether the curve can be evaluated meaningfully.
    pub fn is_well_formed(&self) -> bool {
        match self {
            EaseCurve::Sampled(samples) => {
                samples.len() >= 2 && samples.iter().all(|s| s.is_finite())
            }
            _ => true,
        }
    }
}

fn sample(samples: &[f32], u: f32) -> f32 {
    match samples {
        [] => u,
        [only] => *only,
        _ => {
            let last = samples.len() - 1;
            if u >= 1.0 {
                return samples[last];
            }
            let scaled = u * last as f32;
            let index = (scaled.floor() as usize).min(last - 1);
            let frac = scaled - index as f32;
            samples[index] + (samples[index + 1] - samples[index]) * frac
        }
    }
}

/// Unclamped linear interpolation that lands exactly on `to` when `t == 1`.
pub fn lerp_unclamped(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    from * (1.0 - t) + to * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_in_out_endpoints() {
        let curve = EaseCurve::EaseInOut;
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(1.0), 1.0);
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_ease_in_out_is_slow_at_the_ends() {
        let curve = EaseCurve::EaseInOut;
        assert!(curve.evaluate(0.1) < 0.1);
        assert!(curve.evaluate(0.9) > 0.9);
    }

    #[test]
    fn test_sampled_curve_interpolates_between_samples() {
        let curve = EaseCurve::Sampled(vec![0.0, 0.2, 1.0]);
        assert!((curve.evaluate(0.25) - 0.1).abs() < 1e-6);
        assert!((curve.evaluate(0.75) - 0.6).abs() < 1e-6);
        assert_eq!(curve.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(EaseCurve::Linear.evaluate(2.0), 1.0);
        assert_eq!(EaseCurve::Linear.evaluate(-1.0), 0.0);
    }

    #[test]
    fn test_short_sample_lists_are_rejected() {
        assert!(!EaseCurve::Sampled(vec![1.0]).is_well_formed());
        assert!(!EaseCurve::Sampled(vec![0.0, f32::NAN]).is_well_formed());
        assert!(EaseCurve::Sampled(vec![0.0, 1.0]).is_well_formed());
    }

    #[test]
    fn test_lerp_unclamped_hits_target_exactly() {
        let from = Vec3::new(0.3, -1.7, 12.1);
        let to = Vec3::new(-4.9, 2.2, 0.7);
        assert_eq!(lerp_unclamped(from, to, 1.0), to);
        assert_eq!(lerp_unclamped(from, to, 0.0), from);
    }

    #[test]
    fn test_lerp_unclamped_extrapolates() {
        let p = lerp_unclamped(Vec3::ZERO, Vec3::X, 1.5);
        assert!((p.x - 1.5).abs() < 1e-6);
    }
}
