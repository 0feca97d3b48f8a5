//! Scalar color math shared by the statistics pass and the adjustment kernels.
//!
//! Everything here is `#[inline]` and branch-light so the CPU paths stay
//! close to what the WGSL kernels do per invocation. The GPU shaders carry
//! a port of the same functions; constants are emitted from this module
//! into the shader prelude, so a change here propagates to both backends.

/// Rec.709 red luminance coefficient.
pub const REC709_LUMA_R: f32 = 0.2126;
/// Rec.709 green luminance coefficient.
pub const REC709_LUMA_G: f32 = 0.7152;
/// Rec.709 blue luminance coefficient.
pub const REC709_LUMA_B: f32 = 0.0722;
/// Rec.709 luminance coefficients as an array [R, G, B].
pub const REC709_LUMA: [f32; 3] = [REC709_LUMA_R, REC709_LUMA_G, REC709_LUMA_B];

/// Rec.601 luma coefficients [R, G, B] used by the color stage.
pub const REC601_LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// Below this the HSV decomposition treats a pixel as achromatic.
pub const HSV_EPSILON: f32 = 1e-8;

/// sRGB EOTF linear segment breakpoint.
pub const SRGB_EOTF_BREAK: f32 = 0.04045;

/// Rec.709 luminance: `0.2126*R + 0.7152*G + 0.0722*B`.
///
/// ```
/// use lux_core::color::luminance_rec709;
/// let luma = luminance_rec709([0.5, 0.3, 0.2]);
/// assert!((luma - 0.3353).abs() < 0.0001);
/// ```
#[inline]
pub fn luminance_rec709(rgb: [f32; 3]) -> f32 {
    rgb[0] * REC709_LUMA_R + rgb[1] * REC709_LUMA_G + rgb[2] * REC709_LUMA_B
}

/// Rec.601 luma: `0.299*R + 0.587*G + 0.114*B`.
#[inline]
pub fn luma_rec601(rgb: [f32; 3]) -> f32 {
    rgb[0] * REC601_LUMA[0] + rgb[1] * REC601_LUMA[1] + rgb[2] * REC601_LUMA[2]
}

/// sRGB EOTF: decodes an sRGB encoded value in [0, 1] to linear light.
///
/// ```text
/// if V <= 0.04045:  L = V / 12.92
/// else:             L = ((V + 0.055) / 1.055)^2.4
/// ```
#[inline]
pub fn srgb_eotf(v: f32) -> f32 {
    if v <= SRGB_EOTF_BREAK {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Hue, saturation and value, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv {
    /// Hue as a fraction of a turn, in [0, 1).
    pub h: f32,
    /// Saturation `(max - min) / max`.
    pub s: f32,
    /// Value, the largest channel.
    pub v: f32,
}

impl Hsv {
    /// Hue in degrees, in [0, 360).
    #[inline]
    pub fn hue_degrees(&self) -> f32 {
        self.h * 360.0
    }
}

/// Six-sector RGB to HSV decomposition.
///
/// Achromatic pixels (`max - min <= 1e-8`) get hue 0 and saturation 0, so a
/// uniform gray image produces exactly zero saturation. Negative sector
/// offsets wrap by a full turn before normalising, which keeps the result
/// identical to the shader port where `%` truncates.
///
/// ```
/// use lux_core::color::rgb_to_hsv;
/// let hsv = rgb_to_hsv([1.0, 0.0, 0.0]);
/// assert_eq!((hsv.h, hsv.s, hsv.v), (0.0, 1.0, 1.0));
/// ```
#[inline]
pub fn rgb_to_hsv(rgb: [f32; 3]) -> Hsv {
    let [r, g, b] = rgb;
    let mx = r.max(g).max(b);
    let mn = r.min(g).min(b);
    let delta = mx - mn;

    let s = if mx > HSV_EPSILON { delta / mx } else { 0.0 };

    let mut h = 0.0;
    if delta > HSV_EPSILON {
        h = if mx == r {
            (g - b) / delta
        } else if mx == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        if h < 0.0 {
            h += 6.0;
        }
        h /= 6.0;
    }

    Hsv { h, s, v: mx }
}

/// Converts an 8-bit channel to [0, 1].
#[inline]
pub fn unit_from_u8(v: u8) -> f32 {
    v as f32 / 255.0
}

/// Converts a [0, 1] value to 8 bits, rounding half away from zero.
///
/// Out-of-range input saturates to 0 or 255.
#[inline]
pub fn unit_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Clamps to [0, 1].
#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Hermite smoothstep between `edge0` and `edge1`.
///
/// Degenerate edges (`edge0 == edge1`) return 0.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return 0.0;
    }
    let t = clamp01((x - edge0) / (edge1 - edge0));
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation `a + (b - a) * t`.
#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
