//! Shared fixtures for the lux benchmarks.

use lux_core::RasterImage;

/// Deterministic photo-like test card: smooth gradients plus noise.
pub fn test_card(width: u32, height: u32) -> RasterImage {
    let mut seed: u32 = 0x9E37_79B9;
    let mut img = RasterImage::new(width, height);
    let data = img.data_mut();
    for (i, px) in data.chunks_exact_mut(4).enumerate() {
        let x = i as u32 % width.max(1);
        let y = i as u32 / width.max(1);
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        px[0] = ((x * 255) / width.max(1)) as u8;
        px[1] = ((y * 255) / height.max(1)) as u8;
        px[2] = 64 + (seed >> 26) as u8;
        px[3] = 255;
    }
    img
}
