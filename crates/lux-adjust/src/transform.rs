//! Per-pixel adjustment transform.
//!
//! Three ordered stages, all in sRGB encoded [0, 1] floats:
//!
//! 1. **Tone** ([`apply_channel`]) - exposure, brightness, brilliance,
//!    highlight/shadow split, contrast and black point, per channel.
//! 2. **Color** ([`apply_color`]) - white balance mix, then saturation and
//!    mid-tone weighted vibrance on the Rec.601 chroma.
//! 3. **Black & white** ([`apply_bw`]) - only when enabled. Rec.709 luma
//!    through a soft/neutral/rich base curve, neutrals gamma, logistic tone
//!    contrast and optional grain.
//!
//! The WGSL render shader is a port of this module; the numeric constants
//! below are emitted into its prelude so both backends share one source.
//! Stage order matters: running the chain twice is not the same as running
//! it once with doubled parameters.

use lux_core::color::{clamp01, luma_rec601, luminance_rec709, mix};

use crate::params::{AdjustParams, BwParams, ColorParams, LightParams};

/// Exposure offset per unit slider.
pub const EXPOSURE_SCALE: f32 = 1.5;
/// Brightness offset per unit slider.
pub const BRIGHTNESS_SCALE: f32 = 0.75;
/// Brilliance mid-tone lift per unit slider.
pub const BRILLIANCE_SCALE: f32 = 0.6;
/// Values above this are moved by the Highlights slider.
pub const HIGHLIGHT_START: f32 = 0.65;
/// Values below this are moved by the Shadows slider.
pub const SHADOW_START: f32 = 0.35;
/// Largest highlight/shadow shift at full slider.
pub const SPLIT_RANGE: f32 = 0.35;

/// Exponent of the soft B&W base curve.
pub const BW_SOFT_GAMMA: f32 = 0.82;
/// Steepness of the rich B&W base curve.
pub const BW_RICH_STEEPNESS: f32 = 4.0;
/// Neutrals gamma exponent scale: `gamma = 2^(-scale * neutrals)`.
pub const BW_NEUTRALS_SCALE: f32 = 0.6;
/// Tone steepness gain for positive slider values (up to 2.2).
pub const BW_TONE_POSITIVE: f32 = 1.2;
/// Tone steepness gain for negative slider values (down to 0.6).
pub const BW_TONE_NEGATIVE: f32 = 0.4;
/// Keeps the logit finite at 0 and 1.
pub const BW_LOGIT_EPSILON: f32 = 1e-4;

/// Grain amplitude at full slider.
pub const GRAIN_AMPLITUDE: f32 = 0.2;
/// PCG hash constants `(multiplier, increment, output multiplier)`.
///
/// Grain is hashed from integer pixel positions in wrapping u32
/// arithmetic, which WGSL and Rust evaluate bit-identically.
pub const GRAIN_PCG: [u32; 3] = [747_796_405, 2_891_336_453, 277_803_737];

// ============================================================================
// Stage 1: tone
// ============================================================================

/// Tone curve for a single channel value.
#[inline]
pub fn apply_channel(value: f32, light: &LightParams) -> f32 {
    let mut adjusted = value + EXPOSURE_SCALE * light.exposure + BRIGHTNESS_SCALE * light.brightness;

    let centered = 2.0 * (value - 0.5);
    adjusted += BRILLIANCE_SCALE * light.brilliance * (1.0 - centered * centered);

    if adjusted > HIGHLIGHT_START {
        let ratio = (adjusted - HIGHLIGHT_START) / (1.0 - HIGHLIGHT_START);
        adjusted += light.highlights * ratio * SPLIT_RANGE;
    }
    if adjusted < SHADOW_START {
        let ratio = (SHADOW_START - adjusted) / SHADOW_START;
        adjusted += light.shadows * ratio * SPLIT_RANGE;
    }

    adjusted = (adjusted - 0.5) * (1.0 + light.contrast) + 0.5;

    if light.black_point > 0.0 {
        adjusted -= light.black_point * (1.0 - adjusted);
    } else {
        adjusted -= light.black_point * adjusted;
    }

    clamp01(adjusted)
}

/// Tone curve on all three channels.
#[inline]
pub fn apply_light(rgb: [f32; 3], light: &LightParams) -> [f32; 3] {
    rgb.map(|v| apply_channel(v, light))
}

// ============================================================================
// Stage 2: color
// ============================================================================

/// White balance, saturation and vibrance.
#[inline]
pub fn apply_color(rgb: [f32; 3], color: &ColorParams) -> [f32; 3] {
    let mut out = rgb;
    for c in 0..3 {
        out[c] *= (1.0 - color.cast) + color.gain[c] * color.cast;
    }

    let luma = luma_rec601(out);
    let weight = 1.0 - clamp01((luma - 0.5).abs() * 2.0);
    let scale = (1.0 + color.saturation) * (1.0 + color.vibrance * weight);

    out.map(|v| clamp01(luma + (v - luma) * scale))
}

// ============================================================================
// Stage 3: black & white
// ============================================================================

#[inline]
fn logistic(x: f32, k: f32) -> f32 {
    1.0 / (1.0 + (-k * (x - 0.5)).exp())
}

/// Normalised logistic S-curve through (0, 0) and (1, 1).
#[inline]
pub fn rich_curve(x: f32) -> f32 {
    let lo = logistic(0.0, BW_RICH_STEEPNESS);
    let hi = logistic(1.0, BW_RICH_STEEPNESS);
    (logistic(x, BW_RICH_STEEPNESS) - lo) / (hi - lo)
}

/// Blends the soft, neutral and rich base curves by `intensity`.
///
/// `intensity >= 0.5` moves from neutral to rich, below that from soft to
/// neutral.
#[inline]
pub fn bw_base_curve(luma: f32, intensity: f32) -> f32 {
    let l = clamp01(luma);
    let i = clamp01(intensity);
    if i >= 0.5 {
        mix(l, rich_curve(l), (i - 0.5) * 2.0)
    } else {
        mix(l.powf(BW_SOFT_GAMMA), l, i * 2.0)
    }
}

/// Midtone gamma keyed by the neutrals slider; positive values brighten.
#[inline]
pub fn bw_neutrals(x: f32, neutrals: f32) -> f32 {
    let gamma = (-BW_NEUTRALS_SCALE * neutrals).exp2();
    clamp01(x).powf(gamma)
}

/// Logistic contrast on the logit of `x`.
///
/// Steepness is `1 + 1.2 * tone` for positive tone and `1 + 0.4 * tone`
/// for negative tone, so the curve spans 0.6 to 2.2.
#[inline]
pub fn bw_tone(x: f32, tone: f32) -> f32 {
    if tone == 0.0 {
        return clamp01(x);
    }
    let k = if tone >= 0.0 {
        1.0 + BW_TONE_POSITIVE * tone
    } else {
        1.0 + BW_TONE_NEGATIVE * tone
    };
    let x = x.clamp(BW_LOGIT_EPSILON, 1.0 - BW_LOGIT_EPSILON);
    let logit = (x / (1.0 - x)).ln();
    clamp01(1.0 / (1.0 + (-logit * k).exp()))
}

/// One PCG step with an output permutation.
#[inline]
pub fn pcg_hash(v: u32) -> u32 {
    let state = v.wrapping_mul(GRAIN_PCG[0]).wrapping_add(GRAIN_PCG[1]);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(GRAIN_PCG[2]);
    (word >> 22) ^ word
}

/// Uniform value in [0, 1) for pixel `(x, y)`.
///
/// Only the top 24 bits are kept so the conversion to f32 is exact.
#[inline]
pub fn grain_hash(coord: [u32; 2]) -> f32 {
    let h = pcg_hash(coord[0].wrapping_add(pcg_hash(coord[1])));
    (h >> 8) as f32 / 16_777_216.0
}

/// Deterministic grain offset for pixel `coord`.
///
/// Zero when `grain <= 0`, otherwise in `[-0.1, 0.1] * grain`.
#[inline]
pub fn grain_noise(coord: [u32; 2], grain: f32) -> f32 {
    if grain <= 0.0 {
        return 0.0;
    }
    (grain_hash(coord) - 0.5) * GRAIN_AMPLITUDE * grain
}

/// Black & white conversion; returns `rgb` untouched when disabled.
#[inline]
pub fn apply_bw(rgb: [f32; 3], bw: &BwParams, coord: [u32; 2]) -> [f32; 3] {
    if !bw.enabled {
        return rgb;
    }
    let mut gray = bw_base_curve(luminance_rec709(rgb), bw.intensity);
    gray = bw_neutrals(gray, bw.neutrals);
    gray = bw_tone(gray, bw.tone);
    gray = clamp01(gray + grain_noise(coord, bw.grain));
    [gray; 3]
}

// ============================================================================
// Full chain
// ============================================================================

/// Runs all stages on one pixel.
///
/// `coord` is the integer pixel position; it only seeds grain.
#[inline]
pub fn apply(rgb: [f32; 3], params: &AdjustParams, coord: [u32; 2]) -> [f32; 3] {
    let rgb = apply_light(rgb, &params.light);
    let rgb = apply_color(rgb, &params.color);
    apply_bw(rgb, &params.bw, coord)
}

/// Runs all stages on an RGBA8 pixel at integer position `(x, y)`.
///
/// Alpha is passed through.
#[inline]
pub fn apply_rgba8(px: [u8; 4], params: &AdjustParams, x: u32, y: u32) -> [u8; 4] {
    use lux_core::color::{unit_from_u8, unit_to_u8};

    let rgb = [unit_from_u8(px[0]), unit_from_u8(px[1]), unit_from_u8(px[2])];
    let [r, g, b] = apply(rgb, params, [x, y]);
    [unit_to_u8(r), unit_to_u8(g), unit_to_u8(b), px[3]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn light(f: impl FnOnce(&mut LightParams)) -> LightParams {
        let mut p = LightParams::identity();
        f(&mut p);
        p
    }

    #[test]
    fn test_identity_is_noop() {
        let params = AdjustParams::identity();
        for v in 0..=255u8 {
            let px = [v, 255 - v, v / 2, 200];
            assert_eq!(apply_rgba8(px, &params, 3, 7), px);
        }
    }

    #[test]
    fn test_identity_float_close() {
        let params = AdjustParams::identity();
        let out = apply([0.1, 0.5, 0.9], &params, [0, 0]);
        for (a, b) in out.iter().zip([0.1, 0.5, 0.9]) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_exposure_offsets() {
        let p = light(|p| p.exposure = 0.1);
        // 0.3 + 0.15 = 0.45 stays between the split thresholds
        assert_abs_diff_eq!(apply_channel(0.3, &p), 0.45, epsilon = 1e-6);
        let p = light(|p| p.exposure = 1.0);
        assert_eq!(apply_channel(0.3, &p), 1.0);
    }

    #[test]
    fn test_brilliance_peaks_at_midtones() {
        let p = light(|p| p.brilliance = 0.5);
        let mid = apply_channel(0.5, &p) - 0.5;
        assert_abs_diff_eq!(mid, 0.3, epsilon = 1e-6);
        // endpoints receive no lift
        assert_abs_diff_eq!(apply_channel(0.0, &p), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_highlight_split() {
        let p = light(|p| p.highlights = -1.0);
        // ratio (0.825 - 0.65) / 0.35 = 0.5 -> shift -0.175
        assert_abs_diff_eq!(apply_channel(0.825, &p), 0.65, epsilon = 1e-5);
        // below the threshold nothing happens
        assert_abs_diff_eq!(apply_channel(0.5, &p), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_shadow_split() {
        let p = light(|p| p.shadows = 1.0);
        // ratio (0.35 - 0.175) / 0.35 = 0.5 -> shift +0.175
        assert_abs_diff_eq!(apply_channel(0.175, &p), 0.35, epsilon = 1e-5);
        assert_abs_diff_eq!(apply_channel(0.0, &p), 0.35, epsilon = 1e-6);
    }

    #[test]
    fn test_contrast_pivots_on_half() {
        let p = light(|p| p.contrast = 0.5);
        assert_abs_diff_eq!(apply_channel(0.5, &p), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(apply_channel(0.4, &p), 0.35, epsilon = 1e-6);
    }

    #[test]
    fn test_black_point_both_signs() {
        let p = light(|p| p.black_point = 0.5);
        // 0.4 - 0.5 * 0.6 = 0.1
        assert_abs_diff_eq!(apply_channel(0.4, &p), 0.1, epsilon = 1e-6);
        let p = light(|p| p.black_point = -0.5);
        // 0.4 + 0.5 * 0.4 = 0.6
        assert_abs_diff_eq!(apply_channel(0.4, &p), 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_chained_vector_differs_from_doubled_vector() {
        let once = light(|p| {
            p.exposure = 0.1;
            p.brilliance = 0.3;
        });
        let twice = light(|p| {
            p.exposure = 0.2;
            p.brilliance = 0.6;
        });
        let v = 0.3;
        let chained = apply_channel(apply_channel(v, &once), &once);
        assert!((chained - apply_channel(v, &twice)).abs() > 1e-3);
    }

    #[test]
    fn test_saturation_removes_chroma() {
        let color = ColorParams { saturation: -1.0, ..ColorParams::identity() };
        let out = apply_color([0.8, 0.2, 0.4], &color);
        assert_abs_diff_eq!(out[0], out[1], epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], out[2], epsilon = 1e-6);
    }

    #[test]
    fn test_vibrance_ignores_extremes() {
        let color = ColorParams { vibrance: 1.0, ..ColorParams::identity() };
        // luma 0 -> weight 0, so the pixel is unchanged
        let out = apply_color([0.0, 0.0, 0.0], &color);
        assert_eq!(out, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cast_mixes_gain() {
        let color = ColorParams { cast: 1.0, gain: [0.5, 1.0, 2.0], ..ColorParams::identity() };
        let out = apply_color([0.4, 0.4, 0.4], &color);
        assert_abs_diff_eq!(out[0], 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_base_curves() {
        assert_abs_diff_eq!(bw_base_curve(0.5, 0.5), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(bw_base_curve(0.25, 0.0), 0.25f32.powf(0.82), epsilon = 1e-6);
        assert_abs_diff_eq!(rich_curve(0.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rich_curve(1.0), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rich_curve(0.5), 0.5, epsilon = 1e-6);
        // rich darkens the lower half
        assert!(bw_base_curve(0.25, 1.0) < 0.25);
    }

    #[test]
    fn test_neutrals_direction() {
        assert!(bw_neutrals(0.5, 1.0) > 0.5);
        assert!(bw_neutrals(0.5, -1.0) < 0.5);
        assert_abs_diff_eq!(bw_neutrals(0.5, 0.0), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_tone_steepness() {
        assert_eq!(bw_tone(0.3, 0.0), 0.3);
        assert!(bw_tone(0.3, 1.0) < 0.3);
        assert!(bw_tone(0.3, -1.0) > 0.3);
        assert_abs_diff_eq!(bw_tone(0.5, 0.7), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_grain_bounded_and_deterministic() {
        assert_eq!(grain_noise([10, 3], 0.0), 0.0);
        for x in 0..32 {
            let c = [x, 17];
            let n = grain_noise(c, 1.0);
            assert!(n.abs() <= 0.1 + 1e-6);
            assert_eq!(n, grain_noise(c, 1.0));
        }
    }

    #[test]
    fn test_grain_hash_known_values() {
        // pinned so the WGSL port can be checked against fixed outputs
        assert_eq!(pcg_hash(0), 129_708_002);
        assert_eq!(pcg_hash(pcg_hash(0)), 817_759_070);
        assert_eq!(pcg_hash(1u32.wrapping_add(pcg_hash(0))), 1_583_546_800);
        assert_eq!(grain_hash([0, 0]), (817_759_070u32 >> 8) as f32 / 16_777_216.0);
        assert_eq!(grain_hash([3999, 2999]), (3_926_896_905u32 >> 8) as f32 / 16_777_216.0);
    }

    /// Same hash in u64 arithmetic truncated to 32 bits, as a second
    /// evaluation path.
    fn pcg_wide(v: u32) -> u32 {
        let mask = u32::MAX as u64;
        let state = (v as u64 * GRAIN_PCG[0] as u64 + GRAIN_PCG[1] as u64) & mask;
        let word = (((state >> ((state >> 28) + 4)) ^ state) * GRAIN_PCG[2] as u64) & mask;
        ((word >> 22) ^ word) as u32
    }

    #[test]
    fn test_grain_exact_across_large_frame() {
        let mut seen = std::collections::HashSet::new();
        for y in (0..3000u32).step_by(97) {
            for x in (0..4000u32).step_by(89) {
                let h = grain_hash([x, y]);
                assert!((0.0..1.0).contains(&h));
                let wide = pcg_wide(x.wrapping_add(pcg_wide(y)));
                assert_eq!(h, (wide >> 8) as f32 / 16_777_216.0, "pixel ({x}, {y})");
                seen.insert((h * 16.0) as u32);
            }
        }
        // noise covers the whole range, not a few values
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn test_bw_outputs_gray_and_keeps_alpha() {
        let mut params = AdjustParams::identity();
        params.bw = BwParams { enabled: true, intensity: 0.5, ..BwParams::disabled() };
        let out = apply_rgba8([200, 40, 90, 77], &params, 0, 0);
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
        assert_eq!(out[3], 77);
    }

    #[test]
    fn test_bw_disabled_ignores_values() {
        let mut params = AdjustParams::identity();
        params.bw = BwParams { enabled: false, intensity: 1.0, tone: 1.0, grain: 1.0, neutrals: 1.0 };
        assert_eq!(apply_rgba8([200, 40, 90, 255], &params, 0, 0), [200, 40, 90, 255]);
    }
}
