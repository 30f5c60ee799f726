use crate::dna::{Circle, CircleSet};
use crate::pixels::PixelBuffer;

pub struct CpuRenderer;

impl CpuRenderer {
    /// Full-frame render onto a fresh black buffer, circles composited in sequence order.
    /// Never touches the input set.
    pub fn render(circles: &CircleSet, width: u32, height: u32) -> PixelBuffer {
        profiling::scope!("render");
        let mut buf = PixelBuffer::new(width, height);
        for circle in circles {
            draw_circle(&mut buf, circle);
        }
        buf
    }
}

/// Blend a single channel: (inv_alpha * dst >> 8) + (fill * alpha >> 8).
/// Shift-by-8 instead of /255 is intentional, scores depend on it.
#[inline(always)]
fn blend_channel(dst: u8, fill_blend: u32, inv_alpha: u32) -> u8 {
    (((inv_alpha * dst as u32) >> 8) + fill_blend) as u8
}

fn draw_circle(buf: &mut PixelBuffer, circle: &Circle) {
    profiling::scope!("draw_circle");
    let (w, h) = (buf.width as i64, buf.height as i64);
    let (cx, cy, r) = (circle.x as i64, circle.y as i64, circle.radius as i64);

    // Quick reject: bbox fully outside the buffer
    if cx + r < 0 || cy + r < 0 || cx - r >= w || cy - r >= h {
        return;
    }

    let alpha = circle.alpha as u32;
    let inv_alpha = 255 - alpha;
    let fill = [
        (circle.rgb[0] as u32 * alpha) >> 8,
        (circle.rgb[1] as u32 * alpha) >> 8,
        (circle.rgb[2] as u32 * alpha) >> 8,
    ];

    let y_from = (cy - r).max(0);
    let y_to = (cy + r).min(h - 1);
    let stride = buf.width as usize * PixelBuffer::CHANNELS;
    let data = buf.as_bytes_mut();

    for y in y_from..=y_to {
        let Some(half) = circle.half_width(y) else { continue };
        let x_from = (cx - half).max(0);
        let x_to = (cx + half).min(w - 1);
        if x_from > x_to {
            continue;
        }
        let row = y as usize * stride;
        let span = &mut data[row + x_from as usize * 3..row + (x_to as usize + 1) * 3];
        for px in span.chunks_exact_mut(3) {
            px[0] = blend_channel(px[0], fill[0], inv_alpha);
            px[1] = blend_channel(px[1], fill[1], inv_alpha);
            px[2] = blend_channel(px[2], fill[2], inv_alpha);
        }
    }
}
