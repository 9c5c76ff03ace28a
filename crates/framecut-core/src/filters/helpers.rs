// crates/framecut-core/src/filters/helpers.rs
//
// Math utilities for filter implementors.
//
// All functions operate on plain f32 or raw RGBA byte slices. No FFmpeg.
//
// Organised into sections:
//   - Channel clamp
//   - Row-parallel pixel iteration
//   - Spatial helpers              ← vignette and other radial effects

use rayon::prelude::*;

// ── Channel clamp ─────────────────────────────────────────────────────────────

/// Round `v` to the nearest integer and clamp to a valid channel value.
#[inline]
pub fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// 3×3 colour matrix applied to (R, G, B). Rows are output channels.
#[inline]
pub fn mix(m: &[[f32; 3]; 3], r: f32, g: f32, b: f32) -> [u8; 3] {
    [
        clamp_channel(m[0][0] * r + m[0][1] * g + m[0][2] * b),
        clamp_channel(m[1][0] * r + m[1][1] * g + m[1][2] * b),
        clamp_channel(m[2][0] * r + m[2][1] * g + m[2][2] * b),
    ]
}

// ── Row-parallel pixel iteration ──────────────────────────────────────────────
//
// Rows are the unit of parallel work. A single pixel is far too small for
// rayon to split on; a 1280-pixel row is about right.

/// Call `f(x, y, pixel)` for every pixel, rows in parallel.
pub fn for_each_pixel<F>(rgba: &mut [u8], width: u32, f: F)
where
    F: Fn(u32, u32, &mut [u8]) + Sync,
{
    let row_bytes = width as usize * 4;
    if row_bytes == 0 { return; }
    rgba.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                f(x as u32, y as u32, px);
            }
        });
}

/// Replace (R, G, B) of every pixel with `f(r, g, b)`. Alpha untouched.
pub fn map_rgb<F>(rgba: &mut [u8], width: u32, f: F)
where
    F: Fn(u8, u8, u8) -> [u8; 3] + Sync,
{
    for_each_pixel(rgba, width, |_, _, px| {
        let [r, g, b] = f(px[0], px[1], px[2]);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    });
}

/// Per-channel lookup table built from `f`, applied to R, G, B.
///
/// Point operations (brightness, contrast, invert) depend only on the input
/// channel value, so 256 evaluations replace `width × height × 3`.
pub fn apply_lut<F>(rgba: &mut [u8], width: u32, f: F)
where
    F: Fn(u8) -> u8,
{
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = f(i as u8);
    }
    map_rgb(rgba, width, |r, g, b| [lut[r as usize], lut[g as usize], lut[b as usize]]);
}

// ── Spatial helpers ───────────────────────────────────────────────────────────

/// Distance of pixel (`x`, `y`)'s centre from the frame centre, in pixels.
#[inline]
pub fn center_dist_px(x: u32, y: u32, width: u32, height: u32) -> f32 {
    let dx = x as f32 + 0.5 - width as f32 / 2.0;
    let dy = y as f32 + 0.5 - height as f32 / 2.0;
    (dx * dx + dy * dy).sqrt()
}

/// Half the frame diagonal: the distance from centre to a corner.
#[inline]
pub fn corner_radius(width: u32, height: u32) -> f32 {
    let (w, h) = (width as f32, height as f32);
    (w * w + h * h).sqrt() / 2.0
}

/// Linear ramp: 0.0 at `from`, 1.0 at `to`, clamped outside.
#[inline]
pub fn ramp(v: f32, from: f32, to: f32) -> f32 {
    if to <= from {
        return if v >= to { 1.0 } else { 0.0 };
    }
    ((v - from) / (to - from)).clamp(0.0, 1.0)
}
