// crates/framecut-core/src/filters/grayscale.rs
//
// Unweighted average of R, G and B. Not luma-weighted (no Rec.601/709
// coefficients), so green-heavy content reads slightly darker than a broadcast
// monochrome conversion would.

use crate::filters::{FilterId, PixelFilter};
use crate::filters::helpers::map_rgb;

pub struct Grayscale;

impl PixelFilter for Grayscale {
    fn id(&self) -> FilterId {
        FilterId::Grayscale
    }

    fn label(&self) -> &'static str {
        "Grayscale"
    }

    fn apply(&self, rgba: &mut [u8], width: u32, _height: u32) {
        map_rgb(rgba, width, |r, g, b| {
            let avg = ((r as u16 + g as u16 + b as u16) as f32 / 3.0).round() as u8;
            [avg, avg, avg]
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_channels() {
        let mut px = vec![30, 60, 90, 255, 1, 1, 2, 255];
        Grayscale.apply(&mut px, 2, 1);
        assert_eq!(px, vec![60, 60, 60, 255, 1, 1, 1, 255]);
    }

    #[test]
    fn white_and_black_are_fixed_points() {
        let mut px = vec![255, 255, 255, 255, 0, 0, 0, 255];
        let before = px.clone();
        Grayscale.apply(&mut px, 2, 1);
        assert_eq!(px, before);
    }
}
