// crates/framecut-core/src/filters/channel_mix.rs
//
// Linear colour-matrix looks. Each output channel is a weighted sum of the
// input R, G, B, saturated to [0, 255].
//
// Sepia weights are the classic Microsoft "sepia tone" matrix; their rows sum
// above 1.0 so bright input clips toward warm white. Vintage is a gentler
// cross-talk that lifts blue and mutes green.

use crate::filters::{FilterId, PixelFilter};
use crate::filters::helpers::{map_rgb, mix};

const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

const VINTAGE: [[f32; 3]; 3] = [
    [0.90, 0.05, 0.05],
    [0.07, 0.80, 0.05],
    [0.05, 0.10, 0.90],
];

fn apply_matrix(m: &[[f32; 3]; 3], rgba: &mut [u8], width: u32) {
    map_rgb(rgba, width, |r, g, b| mix(m, r as f32, g as f32, b as f32));
}

pub struct Sepia;

impl PixelFilter for Sepia {
    fn id(&self) -> FilterId {
        FilterId::Sepia
    }

    fn label(&self) -> &'static str {
        "Sepia"
    }

    fn apply(&self, rgba: &mut [u8], width: u32, _height: u32) {
        apply_matrix(&SEPIA, rgba, width);
    }
}

pub struct Vintage;

impl PixelFilter for Vintage {
    fn id(&self) -> FilterId {
        FilterId::Vintage
    }

    fn label(&self) -> &'static str {
        "Vintage"
    }

    fn apply(&self, rgba: &mut [u8], width: u32, _height: u32) {
        apply_matrix(&VINTAGE, rgba, width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sepia_matches_reference_weights() {
        let mut px = vec![100, 50, 20, 255];
        Sepia.apply(&mut px, 1, 1);
        // 39.3 + 38.45 + 3.78 = 81.53 → 82
        // 34.9 + 34.3  + 3.36 = 72.56 → 73
        // 27.2 + 26.7  + 2.62 = 56.52 → 57
        assert_eq!(px, vec![82, 73, 57, 255]);
    }

    #[test]
    fn sepia_saturates_white() {
        let mut px = vec![255, 255, 255, 255];
        Sepia.apply(&mut px, 1, 1);
        assert_eq!(&px[..2], &[255, 255]);
        // .272 + .534 + .131 = .937 → 238.9
        assert_eq!(px[2], 239);
    }

    #[test]
    fn vintage_matches_reference_weights() {
        let mut px = vec![200, 100, 40, 255];
        Vintage.apply(&mut px, 1, 1);
        // 180 + 5  + 2  = 187
        // 14  + 80 + 2  = 96
        // 10  + 10 + 36 = 56
        assert_eq!(px, vec![187, 96, 56, 255]);
    }
}
