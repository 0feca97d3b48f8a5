//! Color master resolver.
//!
//! Saturation and vibrance scale with how much headroom the image has:
//! already saturated images get a smaller boost, images with many blown
//! highlights or a lot of skin are damped further. Cast correction grows
//! with the measured white balance deviation.

use lux_core::ColorStats;
use lux_core::color::smoothstep;

use crate::params::{AdjustmentVector, ColorParams};

use super::{OverrideMode, apply_overrides};

/// Saturation gain at full master.
pub const SATURATION_GAIN: f32 = 1.44;
/// Vibrance gain at full master.
pub const VIBRANCE_GAIN: f32 = 0.98;
/// Cast correction gain at full master.
pub const CAST_GAIN: f32 = 0.8;
/// Cast magnitude treated as fully off-neutral.
pub const CAST_FULL_SCALE: f32 = 0.4;
/// Minimum effect as a fraction of `|master|`.
pub const MIN_EFFECT: f32 = 0.01;

#[inline]
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Statistics-aware `(saturation, vibrance, cast)` for master `t`.
///
/// ```text
/// k_hi     = max(0.35, 1 - smoothstep(0.02, 0.15, highlight_ratio))
/// k_skin   = 0.6 + 0.4 * (1 - skin_ratio)
/// base_sat = 0.25 + 0.75 * (1 - median)^0.6
/// base_vib = 0.25 + 0.75 * (1 - mean)
/// sat      = 1.44 * t * base_sat * k_hi * k_skin
/// vib      = 0.98 * t * base_vib * k_hi * k_skin
/// cast     = 0.8 * |t| * clamp(cast_magnitude / 0.4, 0, 1)
/// ```
///
/// Saturation and vibrance are floored at `0.01 * |t|` in the direction of
/// `t` so a non-zero master always does something.
pub fn aggregate_color(stats: &ColorStats, master: f32) -> (f32, f32, f32) {
    let t = master.clamp(-1.0, 1.0);

    let k_hi = (1.0 - smoothstep(0.02, 0.15, stats.highlight_ratio)).max(0.35);
    let k_skin = 0.6 + 0.4 * (1.0 - stats.skin_ratio.clamp(0.0, 1.0));
    let base_sat = 0.25 + 0.75 * (1.0 - stats.saturation_median).max(0.0).powf(0.6);
    let base_vib = 0.25 + 0.75 * (1.0 - stats.saturation_mean);

    let mut sat = SATURATION_GAIN * t * base_sat * k_hi * k_skin;
    let mut vib = VIBRANCE_GAIN * t * base_vib * k_hi * k_skin;
    let cast = CAST_GAIN * t.abs() * (stats.cast_magnitude / CAST_FULL_SCALE).clamp(0.0, 1.0);

    let eps = MIN_EFFECT * t.abs();
    if sat.abs() < eps {
        sat = sign(t) * eps;
    }
    if vib.abs() < eps {
        vib = sign(t) * eps;
    }

    (sat.clamp(-1.0, 1.0), vib.clamp(-1.0, 1.0), cast.clamp(0.0, 1.0))
}

/// Resolves the Color family; gains come from `stats`.
pub fn resolve_color(
    master: f32,
    stats: &ColorStats,
    overrides: &AdjustmentVector,
    mode: OverrideMode,
) -> ColorParams {
    let (saturation, vibrance, cast) = aggregate_color(stats, master);
    let mut params = ColorParams {
        saturation,
        vibrance,
        cast,
        gain: stats.white_balance_gain,
    };
    apply_overrides(&mut params, overrides, mode);
    params
}
