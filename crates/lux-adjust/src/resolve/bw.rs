//! Black & white master resolver.
//!
//! ```text
//! intensity = m^2 (3 - 2m)
//! neutrals  = clamp(0.25 * (2m - 1), -1, 1)
//! tone      = clamp(-0.10 + 0.60 m, -1, 1)
//! ```
//!
//! with `m` the master clamped to [0, 1]. Tone is already -0.10 at `m = 0`,
//! a slight flattening that is part of the look. Neutrals follow the same
//! rule: -0.25 at `m = 0`, crossing 0 only at `m = 0.5`. Grain is never derived
//! from the master; it only comes from `BW_Grain`.

use lux_core::color::smoothstep;

use crate::params::{AdjustmentVector, BwParams};

use super::{OverrideMode, apply_overrides};

/// Resolved `(intensity, neutrals, tone)` for a master value.
pub fn bw_curve(master: f32) -> (f32, f32, f32) {
    let m = master.clamp(0.0, 1.0);
    let intensity = smoothstep(0.0, 1.0, m);
    let neutrals = (0.25 * (2.0 * m - 1.0)).clamp(-1.0, 1.0);
    let tone = (-0.10 + 0.60 * m).clamp(-1.0, 1.0);
    (intensity, neutrals, tone)
}

/// Resolves the Black & White family as enabled.
///
/// Callers gate the result with [`BwParams::enabled`].
pub fn resolve_bw(master: f32, overrides: &AdjustmentVector, mode: OverrideMode) -> BwParams {
    let mut params = BwParams::from_master(master, 0.0);
    apply_overrides(&mut params, overrides, mode);
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_master_zero() {
        let p = resolve_bw(0.0, &AdjustmentVector::new(), OverrideMode::Delta);
        assert_eq!(p.intensity, 0.0);
        assert_abs_diff_eq!(p.tone, -0.10, epsilon = 1e-6);
        assert_abs_diff_eq!(p.neutrals, -0.25, epsilon = 1e-6);
        assert_eq!(p.grain, 0.0);
    }

    #[test]
    fn test_raw_master_zero_keeps_curve_offsets() {
        use crate::resolve::resolve_adjustments;
        use lux_core::ColorStats;

        // neutrals and tone are the curve values at 0, not zero
        let raw = AdjustmentVector::new().with(keys::BW_MASTER, 0.0);
        let p = resolve_adjustments(&raw, &ColorStats::neutral(), OverrideMode::Delta).bw;
        assert!(p.enabled);
        assert_eq!(p.intensity, 0.0);
        assert_abs_diff_eq!(p.neutrals, -0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(p.tone, -0.10, epsilon = 1e-6);
        assert_ne!(p.neutrals, 0.0);
    }

    #[test]
    fn test_master_endpoints() {
        let (i, n, t) = bw_curve(1.0);
        assert_abs_diff_eq!(i, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(n, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(t, 0.50, epsilon = 1e-6);

        let (i, n, _) = bw_curve(0.5);
        assert_abs_diff_eq!(i, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(n, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_master_is_clamped() {
        assert_eq!(bw_curve(-3.0), bw_curve(0.0));
        assert_eq!(bw_curve(7.0), bw_curve(1.0));
    }

    #[test]
    fn test_grain_override() {
        let overrides = AdjustmentVector::new().with(keys::BW_GRAIN, 0.4);
        let p = resolve_bw(0.6, &overrides, OverrideMode::Delta);
        assert_abs_diff_eq!(p.grain, 0.4, epsilon = 1e-6);
        let overrides = AdjustmentVector::new().with(keys::BW_GRAIN, -0.4);
        assert_eq!(resolve_bw(0.6, &overrides, OverrideMode::Delta).grain, 0.0);
    }

    #[test]
    fn test_intensity_monotonic() {
        let mut prev = -1.0;
        for i in 0..=10 {
            let (intensity, _, _) = bw_curve(i as f32 / 10.0);
            assert!(intensity >= prev);
            prev = intensity;
        }
    }
}
