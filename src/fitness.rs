//─────────────────────────────────────────────────────────────────────────────
// fitness: sum of squared differences over RGB, plus derived metrics (MSE, PSNR)
//─────────────────────────────────────────────────────────────────────────────

use crate::pixels::PixelBuffer;

/// Sum of squared per-channel differences (lower is better, 0 only for identical buffers).
/// Worst case is w*h*3*255^2, which fits u64 for any realistic image.
///
/// Panics on a size mismatch: a wrong score would silently corrupt selection.
pub fn distance(a: &PixelBuffer, b: &PixelBuffer) -> u64 {
    profiling::scope!("distance");
    assert!(
        a.is_compatible(b),
        "image size mismatch: {}x{} vs {}x{}",
        a.width,
        a.height,
        b.width,
        b.height
    );

    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .map(|(&x, &y)| {
            let d = x as i64 - y as i64;
            (d * d) as u64
        })
        .sum()
}

/// PSNR in decibels, peak 255 for 8-bit channels. Higher is better.
#[inline]
pub fn psnr_from_mse(mse: f64, peak: f64) -> f64 {
    let mse = mse.max(1e-12);
    10.0 * ((peak * peak) / mse).log10()
}

/// snapshot of size-independent metrics derived from a raw score
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub mse: f64,
    pub psnr: f64,
}

impl MetricsSnapshot {
    pub const PSNR_PEAK: f64 = 255.0;

    pub fn from_sse(score: u64, num_pixels: usize) -> Self {
        let samples = (num_pixels * PixelBuffer::CHANNELS).max(1) as f64;
        let mse = score as f64 / samples;
        Self { mse, psnr: psnr_from_mse(mse, Self::PSNR_PEAK) }
    }
}
