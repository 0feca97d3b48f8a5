//! Light master resolver.
//!
//! The master is soft-clipped with `tanh(1.6 m) / tanh(1.6)` and scaled by
//! one of two coefficient sets. The sets are deliberately asymmetric:
//! brightening leans on exposure and shadow recovery while protecting
//! highlights, darkening pulls highlights down too and deepens the black
//! point.

use crate::params::{AdjustmentVector, LightParams};

use super::{OverrideMode, apply_overrides};

/// Soft-clip steepness.
pub const SOFT_CLIP: f32 = 1.6;

/// Coefficients for `master >= 0`, in [`LightParams`] field order
/// (brilliance, exposure, highlights, shadows, brightness, contrast, black point).
pub const POSITIVE: LightParams = LightParams {
    brilliance: 0.45,
    exposure: 0.55,
    highlights: -0.25,
    shadows: 0.60,
    brightness: 0.35,
    contrast: -0.10,
    black_point: -0.10,
};

/// Coefficients for `master < 0`.
pub const NEGATIVE: LightParams = LightParams {
    brilliance: 0.30,
    exposure: 0.50,
    highlights: 0.20,
    shadows: 0.50,
    brightness: 0.40,
    contrast: -0.15,
    black_point: -0.25,
};

/// `tanh(1.6 m) / tanh(1.6)` with `m` clamped to [-1, 1].
#[inline]
pub fn soft_clip(master: f32) -> f32 {
    (SOFT_CLIP * master.clamp(-1.0, 1.0)).tanh() / SOFT_CLIP.tanh()
}

/// Light values for `master` without overrides.
pub fn light_base(master: f32) -> LightParams {
    let soft = soft_clip(master);
    let k = if soft >= 0.0 { POSITIVE } else { NEGATIVE };
    LightParams {
        brilliance: k.brilliance * soft,
        exposure: k.exposure * soft,
        highlights: k.highlights * soft,
        shadows: k.shadows * soft,
        brightness: k.brightness * soft,
        contrast: k.contrast * soft,
        black_point: k.black_point * soft,
    }
    .clamp()
}

/// Resolves the Light family.
pub fn resolve_light(master: f32, overrides: &AdjustmentVector, mode: OverrideMode) -> LightParams {
    let mut params = light_base(master);
    apply_overrides(&mut params, overrides, mode);
    params
}
