//! Host-side mirrors of shader structs.
//!
//! Field order and sizes match the WGSL declarations in
//! [`crate::shaders`]; the shader tests compare both layouts.

use bytemuck::{Pod, Zeroable};

use lux_adjust::AdjustParams;
use lux_core::{HIST_BINS, StatsAccumulator};

/// Per-workgroup statistics written by the stats compute shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TileStats {
    /// Saturation sum.
    pub sum_s: f32,
    /// Linear-light RGB sums.
    pub sum_lin: [f32; 3],
    /// Pixels with alpha > 0.
    pub count: u32,
    /// Pixels with V above the highlight threshold.
    pub highlights: u32,
    /// Pixels with V below the dark threshold.
    pub darks: u32,
    /// Pixels in the skin band.
    pub skin: u32,
    /// Saturation histogram.
    pub hist: [u32; HIST_BINS],
}

impl TileStats {
    /// Byte size of one tile record in the storage buffer.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Adds this tile into a host accumulator.
    pub fn merge_into(&self, acc: &mut StatsAccumulator) {
        acc.sum_saturation += self.sum_s as f64;
        for c in 0..3 {
            acc.sum_linear[c] += self.sum_lin[c] as f64;
        }
        acc.count += self.count as u64;
        acc.highlight_count += self.highlights as u64;
        acc.dark_count += self.darks as u64;
        acc.skin_count += self.skin as u64;
        for (dst, src) in acc.histogram.iter_mut().zip(self.hist.iter()) {
            *dst += *src as u64;
        }
    }
}

/// Uniform block for the render shader: five `vec4<f32>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderUniform {
    /// brilliance, exposure, highlights, shadows
    pub light0: [f32; 4],
    /// brightness, contrast, black point, saturation
    pub light1: [f32; 4],
    /// vibrance, cast, bw enabled (0/1), bw intensity
    pub color: [f32; 4],
    /// white balance gain r, g, b, unused
    pub gain: [f32; 4],
    /// neutrals, tone, grain, unused
    pub bw: [f32; 4],
}

impl From<&AdjustParams> for RenderUniform {
    fn from(p: &AdjustParams) -> Self {
        let l = &p.light;
        let c = &p.color;
        let b = &p.bw;
        Self {
            light0: [l.brilliance, l.exposure, l.highlights, l.shadows],
            light1: [l.brightness, l.contrast, l.black_point, c.saturation],
            color: [c.vibrance, c.cast, if b.enabled { 1.0 } else { 0.0 }, b.intensity],
            gain: [c.gain[0], c.gain[1], c.gain[2], 0.0],
            bw: [b.neutrals, b.tone, b.grain, 0.0],
        }
    }
}

/// Merges a slice of tiles into one accumulator.
pub fn merge_tiles(tiles: &[TileStats]) -> StatsAccumulator {
    let mut acc = StatsAccumulator::new();
    for tile in tiles {
        tile.merge_into(&mut acc);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use lux_adjust::params::BwParams;

    #[test]
    fn test_sizes() {
        assert_eq!(TileStats::SIZE, 288);
        assert_eq!(std::mem::size_of::<RenderUniform>(), 80);
    }

    #[test]
    fn test_merge_tiles_matches_direct_accumulation() {
        let pixels: Vec<[u8; 4]> = vec![[200, 30, 30, 255], [10, 10, 10, 255], [250, 250, 250, 255]];

        let mut direct = StatsAccumulator::new();
        for px in &pixels {
            direct.add_rgba8(px);
        }

        let mut tile = TileStats::zeroed();
        tile.sum_s = direct.sum_saturation as f32;
        tile.sum_lin = direct.sum_linear.map(|v| v as f32);
        tile.count = direct.count as u32;
        tile.highlights = direct.highlight_count as u32;
        tile.darks = direct.dark_count as u32;
        tile.skin = direct.skin_count as u32;
        for (dst, src) in tile.hist.iter_mut().zip(direct.histogram.iter()) {
            *dst = *src as u32;
        }

        let merged = merge_tiles(&[tile, TileStats::zeroed()]);
        assert_eq!(merged.count, 3);
        assert_eq!(merged.histogram, direct.histogram);
        let a = merged.finish();
        let b = direct.finish();
        assert!((a.saturation_mean - b.saturation_mean).abs() < 1e-6);
        assert_eq!(a.highlight_ratio, b.highlight_ratio);
    }

    #[test]
    fn test_uniform_packing() {
        let mut params = AdjustParams::identity();
        params.light.exposure = 0.3;
        params.color.saturation = -0.2;
        params.bw = BwParams { enabled: true, intensity: 0.7, neutrals: 0.1, tone: -0.4, grain: 0.5 };

        let u = RenderUniform::from(&params);
        assert_eq!(u.light0[1], 0.3);
        assert_eq!(u.light1[3], -0.2);
        assert_eq!(u.color[2], 1.0);
        assert_eq!(u.color[3], 0.7);
        assert_eq!(u.gain, [1.0, 1.0, 1.0, 0.0]);
        assert_eq!(u.bw, [0.1, -0.4, 0.5, 0.0]);
        assert_eq!(bytemuck::bytes_of(&u).len(), 80);
    }
}
