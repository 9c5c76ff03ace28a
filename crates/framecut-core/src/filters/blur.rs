// crates/framecut-core/src/filters/blur.rs
//
// Gaussian-style blur with a 5 px standard deviation.
//
// Approximated by three successive box blurs (horizontal then vertical each
// pass), the standard trick from the central limit theorem: three box passes
// land within a few percent of a true Gaussian at a fraction of the cost.
// Box widths come from `boxes_for_gauss` so their combined variance matches
// SIGMA². Edges are clamped (the border pixel is repeated).
//
// Only R, G, B are blurred; alpha is carried through unchanged.

use rayon::prelude::*;

use crate::filters::{FilterId, PixelFilter};

/// Standard deviation of the target Gaussian, in pixels.
const SIGMA: f32 = 5.0;

/// Number of box passes.
const PASSES: usize = 3;

pub struct Blur;

impl PixelFilter for Blur {
    fn id(&self) -> FilterId {
        FilterId::Blur
    }

    fn label(&self) -> &'static str {
        "Blur"
    }

    fn apply(&self, rgba: &mut [u8], width: u32, height: u32) {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 { return; }

        let mut scratch = vec![0u8; rgba.len()];
        for size in boxes_for_gauss(SIGMA, PASSES) {
            let r = (size - 1) / 2;
            box_blur_h(rgba, &mut scratch, w, r);
            box_blur_v(&scratch, rgba, w, h, r);
        }
    }
}

/// Odd box widths whose summed variance approximates `sigma²` over `n` passes.
fn boxes_for_gauss(sigma: f32, n: usize) -> Vec<usize> {
    let nf      = n as f32;
    let w_ideal = (12.0 * sigma * sigma / nf + 1.0).sqrt();
    let mut wl  = w_ideal.floor() as i32;
    if wl % 2 == 0 { wl -= 1; }
    let wu = wl + 2;

    let wlf     = wl as f32;
    let m_ideal = (12.0 * sigma * sigma - nf * wlf * wlf - 4.0 * nf * wlf - 3.0 * nf)
        / (-4.0 * wlf - 4.0);
    let m = m_ideal.round() as usize;

    (0..n).map(|i| if i < m { wl as usize } else { wu as usize }).collect()
}

/// Horizontal box blur of radius `r` from `src` into `dst`, rows in parallel.
fn box_blur_h(src: &[u8], dst: &mut [u8], w: usize, r: usize) {
    let row_bytes = w * 4;
    let count     = (2 * r + 1) as u32;
    let clamp     = |i: isize| i.clamp(0, w as isize - 1) as usize;
    let r         = r as isize;

    dst.par_chunks_mut(row_bytes)
        .zip(src.par_chunks(row_bytes))
        .for_each(|(out, row)| {
            for c in 0..3 {
                // Running sum over the window [x − r, x + r], edge-clamped.
                let mut sum: u32 = (-r..=r).map(|k| row[clamp(k) * 4 + c] as u32).sum();
                for x in 0..w as isize {
                    out[x as usize * 4 + c] = ((sum + count / 2) / count) as u8;
                    sum += row[clamp(x + r + 1) * 4 + c] as u32;
                    sum -= row[clamp(x - r) * 4 + c] as u32;
                }
            }
            for x in 0..w {
                out[x * 4 + 3] = row[x * 4 + 3];
            }
        });
}

/// Vertical box blur of radius `r` from `src` into `dst`, output rows in parallel.
fn box_blur_v(src: &[u8], dst: &mut [u8], w: usize, h: usize, r: usize) {
    let row_bytes = w * 4;
    let count     = (2 * r + 1) as u32;
    dst.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, out)| {
            let lo = y as isize - r as isize;
            for x in 0..w {
                let mut acc = [0u32; 3];
                for k in 0..count as isize {
                    let sy = (lo + k).clamp(0, h as isize - 1) as usize;
                    let i  = sy * row_bytes + x * 4;
                    acc[0] += src[i] as u32;
                    acc[1] += src[i + 1] as u32;
                    acc[2] += src[i + 2] as u32;
                }
                let o = x * 4;
                out[o]     = ((acc[0] + count / 2) / count) as u8;
                out[o + 1] = ((acc[1] + count / 2) / count) as u8;
                out[o + 2] = ((acc[2] + count / 2) / count) as u8;
                out[o + 3] = src[y * row_bytes + o + 3];
            }
        });
}
