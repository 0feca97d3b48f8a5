//! Perceptual image statistics.
//!
//! [`ColorStats`] is the immutable snapshot the color resolver consumes.
//! It is derived from a [`StatsAccumulator`], the reduction record both
//! statistics paths fill: the CPU pass adds pixels directly, the GPU pass
//! adds one partial record per 16x16 tile. Either way the final derivation
//! in [`StatsAccumulator::finish`] is the same code, so the two backends can
//! only diverge in the per-pixel float sums.
//!
//! # Per-pixel classification
//!
//! | Counter    | Condition                                   |
//! |------------|---------------------------------------------|
//! | valid      | alpha > 0                                   |
//! | highlight  | V > 0.90                                    |
//! | dark       | V < 0.05                                    |
//! | skin       | hue in (10°, 50°) and S in (0.1, 0.6)       |
//! | histogram  | bin `floor(S * 64)` clamped to [0, 63]      |

use serde::{Deserialize, Serialize};

use crate::color::{Hsv, rgb_to_hsv, srgb_eotf, unit_from_u8};

/// Number of saturation histogram bins.
pub const HIST_BINS: usize = 64;
/// Value above which a pixel counts as a highlight.
pub const HIGHLIGHT_THRESHOLD: f32 = 0.90;
/// Value below which a pixel counts as dark.
pub const DARK_THRESHOLD: f32 = 0.05;
/// Skin band hue limits in degrees (exclusive).
pub const SKIN_HUE_DEGREES: (f32, f32) = (10.0, 50.0);
/// Skin band saturation limits (exclusive).
pub const SKIN_SATURATION: (f32, f32) = (0.1, 0.6);
/// White balance gain clamp range.
pub const GAIN_RANGE: (f32, f32) = (0.5, 2.5);
/// Channel means at or below this yield a neutral gain.
pub const MIN_CHANNEL_MEAN: f64 = 1e-6;

/// Snapshot of perceptual statistics for one image.
///
/// All ratios are in [0, 1], gains are in [0.5, 2.5].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStats {
    /// Mean HSV saturation.
    pub saturation_mean: f32,
    /// Median HSV saturation (64-bin histogram resolution).
    pub saturation_median: f32,
    /// Fraction of pixels with V > 0.90.
    pub highlight_ratio: f32,
    /// Fraction of pixels with V < 0.05.
    pub dark_ratio: f32,
    /// Fraction of pixels in the skin hue/saturation band.
    pub skin_ratio: f32,
    /// Gray-world gains that neutralise the average color.
    pub white_balance_gain: [f32; 3],
    /// Log-domain distance of the gains from neutral, clamped to [0, 1].
    pub cast_magnitude: f32,
}

impl ColorStats {
    /// Defaults used when an image has no valid pixels.
    pub const fn neutral() -> Self {
        Self {
            saturation_mean: 0.5,
            saturation_median: 0.5,
            highlight_ratio: 0.0,
            dark_ratio: 0.0,
            skin_ratio: 0.0,
            white_balance_gain: [1.0, 1.0, 1.0],
            cast_magnitude: 0.0,
        }
    }
}

impl Default for ColorStats {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Running totals of the statistics pass.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsAccumulator {
    /// Sum of HSV saturation over valid pixels.
    pub sum_saturation: f64,
    /// Per-channel sum of linear-light RGB.
    pub sum_linear: [f64; 3],
    /// Valid (alpha > 0) pixels.
    pub count: u64,
    /// Pixels with V above [`HIGHLIGHT_THRESHOLD`].
    pub highlight_count: u64,
    /// Pixels with V below [`DARK_THRESHOLD`].
    pub dark_count: u64,
    /// Pixels in the skin band.
    pub skin_count: u64,
    /// Saturation histogram.
    pub histogram: [u64; HIST_BINS],
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAccumulator {
    /// Creates an empty accumulator.
    pub const fn new() -> Self {
        Self {
            sum_saturation: 0.0,
            sum_linear: [0.0; 3],
            count: 0,
            highlight_count: 0,
            dark_count: 0,
            skin_count: 0,
            histogram: [0; HIST_BINS],
        }
    }

    /// Adds one RGBA8 pixel; fully transparent pixels are skipped.
    #[inline]
    pub fn add_rgba8(&mut self, px: &[u8]) {
        if px[3] == 0 {
            return;
        }
        self.add_pixel([unit_from_u8(px[0]), unit_from_u8(px[1]), unit_from_u8(px[2])]);
    }

    /// Adds one sRGB encoded pixel with channels in [0, 1].
    #[inline]
    pub fn add_pixel(&mut self, rgb: [f32; 3]) {
        let hsv = rgb_to_hsv(rgb);
        self.sum_saturation += hsv.s as f64;
        for c in 0..3 {
            self.sum_linear[c] += srgb_eotf(rgb[c]) as f64;
        }
        self.count += 1;
        if hsv.v > HIGHLIGHT_THRESHOLD {
            self.highlight_count += 1;
        }
        if hsv.v < DARK_THRESHOLD {
            self.dark_count += 1;
        }
        if is_skin(&hsv) {
            self.skin_count += 1;
        }
        self.histogram[saturation_bin(hsv.s)] += 1;
    }

    /// Folds another accumulator into this one.
    pub fn merge(&mut self, other: &Self) {
        self.sum_saturation += other.sum_saturation;
        for c in 0..3 {
            self.sum_linear[c] += other.sum_linear[c];
        }
        self.count += other.count;
        self.highlight_count += other.highlight_count;
        self.dark_count += other.dark_count;
        self.skin_count += other.skin_count;
        for (dst, src) in self.histogram.iter_mut().zip(other.histogram.iter()) {
            *dst += src;
        }
    }

    /// Derives the final statistics.
    ///
    /// An accumulator that saw no valid pixel yields [`ColorStats::neutral`].
    pub fn finish(&self) -> ColorStats {
        if self.count == 0 {
            return ColorStats::neutral();
        }
        let n = self.count as f64;

        let saturation_mean = (self.sum_saturation / n) as f32;
        let saturation_median = self.median_saturation();

        let means = self.sum_linear.map(|s| s / n);
        let gray = (means[0] + means[1] + means[2]) / 3.0;
        let white_balance_gain = means.map(|m| {
            if m <= MIN_CHANNEL_MEAN {
                1.0
            } else {
                ((gray / m) as f32).clamp(GAIN_RANGE.0, GAIN_RANGE.1)
            }
        });

        let log_norm = white_balance_gain
            .iter()
            .map(|g| {
                let l = g.ln();
                l * l
            })
            .sum::<f32>()
            .sqrt();

        ColorStats {
            saturation_mean: saturation_mean.clamp(0.0, 1.0),
            saturation_median,
            highlight_ratio: (self.highlight_count as f64 / n) as f32,
            dark_ratio: (self.dark_count as f64 / n) as f32,
            skin_ratio: (self.skin_count as f64 / n) as f32,
            white_balance_gain,
            cast_magnitude: log_norm.clamp(0.0, 1.0),
        }
    }

    fn median_saturation(&self) -> f32 {
        // every sample landed exactly on S = 0
        if self.sum_saturation == 0.0 {
            return 0.0;
        }
        // left-sided search of the cumulative histogram for N / 2; with a
        // single sample the target is 0 and bin 0 already satisfies it
        let half = self.count / 2;
        let mut cumulative = 0u64;
        for (bin, &count) in self.histogram.iter().enumerate() {
            cumulative += count;
            if cumulative >= half {
                return (bin as f32 + 0.5) / HIST_BINS as f32;
            }
        }
        (HIST_BINS as f32 - 0.5) / HIST_BINS as f32
    }
}

/// Histogram bin for a saturation value.
#[inline]
pub fn saturation_bin(s: f32) -> usize {
    ((s * HIST_BINS as f32).floor() as i64).clamp(0, HIST_BINS as i64 - 1) as usize
}

/// Returns `true` for hue/saturation pairs in the skin band.
#[inline]
pub fn is_skin(hsv: &Hsv) -> bool {
    let deg = hsv.hue_degrees();
    deg > SKIN_HUE_DEGREES.0
        && deg < SKIN_HUE_DEGREES.1
        && hsv.s > SKIN_SATURATION.0
        && hsv.s < SKIN_SATURATION.1
}
