//! CPU backend using rayon for parallelization.
//!
//! Statistics fold one [`StatsAccumulator`] per row chunk and merge them;
//! rendering maps output rows in parallel through the shared pixel kernel
//! in `lux_adjust::transform`. Single-threaded reference versions are kept
//! for parity tests.

use rayon::prelude::*;

use lux_adjust::AdjustParams;
use lux_adjust::transform::apply_rgba8;
use lux_core::{BYTES_PER_PIXEL, RasterImage, StatsAccumulator};

// ============================================================================
// Statistics
// ============================================================================

/// Single-threaded statistics pass in row-major order.
pub fn compute_stats_reference(image: &RasterImage) -> StatsAccumulator {
    let mut acc = StatsAccumulator::new();
    for row in image.rows() {
        for px in row.chunks_exact(BYTES_PER_PIXEL) {
            acc.add_rgba8(px);
        }
    }
    acc
}

/// Row-parallel statistics pass.
///
/// Counts and histogram match [`compute_stats_reference`] exactly; float
/// sums differ only by summation order.
pub fn compute_stats_parallel(image: &RasterImage) -> StatsAccumulator {
    (0..image.height())
        .into_par_iter()
        .fold(StatsAccumulator::new, |mut acc, y| {
            for px in image.row(y).chunks_exact(BYTES_PER_PIXEL) {
                acc.add_rgba8(px);
            }
            acc
        })
        .reduce(StatsAccumulator::new, |mut a, b| {
            a.merge(&b);
            a
        })
}

// ============================================================================
// Rendering
// ============================================================================

#[inline]
fn render_row(src: &[u8], dst: &mut [u8], y: usize, params: &AdjustParams) {
    for (x, (out, inp)) in dst
        .chunks_exact_mut(BYTES_PER_PIXEL)
        .zip(src.chunks_exact(BYTES_PER_PIXEL))
        .enumerate()
    {
        let px = [inp[0], inp[1], inp[2], inp[3]];
        out.copy_from_slice(&apply_rgba8(px, params, x as u32, y as u32));
    }
}

/// Single-threaded render into a packed image.
pub fn render_reference(image: &RasterImage, params: &AdjustParams) -> RasterImage {
    let (w, h) = image.dimensions();
    let mut out = RasterImage::new(w, h);
    if image.is_empty() {
        return out;
    }
    let row_bytes = w as usize * BYTES_PER_PIXEL;
    for (y, dst) in out.data_mut().chunks_exact_mut(row_bytes).enumerate() {
        render_row(image.row(y as u32), dst, y, params);
    }
    out
}

/// Row-parallel render into a packed image.
///
/// Packed input is walked as one contiguous slice; padded input goes
/// through per-row access.
pub fn render_parallel(image: &RasterImage, params: &AdjustParams) -> RasterImage {
    let (w, h) = image.dimensions();
    let mut out = RasterImage::new(w, h);
    if image.is_empty() {
        return out;
    }
    let row_bytes = w as usize * BYTES_PER_PIXEL;
    let dst = out.data_mut();

    match image.packed_data() {
        Some(src) => dst
            .par_chunks_mut(row_bytes)
            .zip(src.par_chunks(row_bytes))
            .enumerate()
            .for_each(|(y, (out_row, in_row))| render_row(in_row, out_row, y, params)),
        None => dst
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, out_row)| render_row(image.row(y as u32), out_row, y, params)),
    }
    out
}

// ============================================================================
// Backend
// ============================================================================

/// CPU tier: always available.
#[derive(Debug, Clone, Copy)]
pub struct CpuBackend {
    parallel: bool,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CpuBackend {
    /// Create a CPU backend; `parallel = false` runs single-threaded.
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Whether work is spread over the rayon pool.
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Statistics accumulator for an image.
    pub fn compute_stats(&self, image: &RasterImage) -> StatsAccumulator {
        if self.parallel {
            compute_stats_parallel(image)
        } else {
            compute_stats_reference(image)
        }
    }

    /// Adjusted copy of an image.
    pub fn render(&self, image: &RasterImage, params: &AdjustParams) -> RasterImage {
        if self.parallel {
            render_parallel(image, params)
        } else {
            render_reference(image, params)
        }
    }
}
