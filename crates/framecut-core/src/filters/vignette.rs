// crates/framecut-core/src/filters/vignette.rs
//
// Radial darkening toward the corners.
//
// Equivalent to multiply-compositing a black radial gradient over the frame:
// the gradient is centred on the frame, its radius is half the diagonal, it is
// fully transparent out to INNER of that radius and ramps linearly to
// MAX_DARKEN opacity at the corner. Multiplying by black at opacity `a` scales
// each colour channel by `1 − a`.

use crate::filters::{FilterId, PixelFilter};
use crate::filters::helpers::{center_dist_px, clamp_channel, corner_radius, for_each_pixel, ramp};

/// Fraction of the corner radius that stays untouched.
const INNER: f32 = 0.5;

/// Gradient opacity at the corner radius (70 % black).
const MAX_DARKEN: f32 = 0.7;

pub struct Vignette;

impl PixelFilter for Vignette {
    fn id(&self) -> FilterId {
        FilterId::Vignette
    }

    fn label(&self) -> &'static str {
        "Vignette"
    }

    fn apply(&self, rgba: &mut [u8], width: u32, height: u32) {
        let radius = corner_radius(width, height);
        if radius <= 0.0 { return; }

        for_each_pixel(rgba, width, |x, y, px| {
            let d    = center_dist_px(x, y, width, height) / radius;
            let gain = 1.0 - MAX_DARKEN * ramp(d, INNER, 1.0);
            px[0] = clamp_channel(px[0] as f32 * gain);
            px[1] = clamp_channel(px[1] as f32 * gain);
            px[2] = clamp_channel(px[2] as f32 * gain);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(w: u32, h: u32) -> Vec<u8> {
        vec![255u8; (w * h * 4) as usize]
    }

    #[test]
    fn centre_untouched_corners_darkened() {
        let (w, h) = (20, 10);
        let mut buf = white(w, h);
        Vignette.apply(&mut buf, w, h);

        let at = |x: u32, y: u32| buf[((y * w + x) * 4) as usize];
        assert_eq!(at(10, 5), 255, "centre pixel must be untouched");
        let corner = at(0, 0);
        // Corner pixel centre sits at ~94 % of the corner radius → ~38 % brightness.
        assert!(corner < 100 && corner >= 76, "corner = {corner}");
    }

    #[test]
    fn darkening_increases_with_distance() {
        let (w, h) = (32, 32);
        let mut buf = white(w, h);
        Vignette.apply(&mut buf, w, h);
        let row = 16;
        let samples: Vec<u8> = (0..16).rev()
            .map(|x| buf[((row * w + x) * 4) as usize])
            .collect();
        assert!(samples.windows(2).all(|p| p[0] >= p[1]), "{samples:?}");
    }
}
