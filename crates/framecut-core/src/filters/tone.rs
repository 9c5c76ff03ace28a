// crates/framecut-core/src/filters/tone.rs
//
// Point operations on each colour channel independently:
//
//   Brightness   c' = c × 1.3
//   Contrast     c' = 1.5 × (c − 128) + 128
//
// Both saturate at [0, 255] and run through a 256-entry lookup table.

use crate::filters::{FilterId, PixelFilter};
use crate::filters::helpers::{apply_lut, clamp_channel};

const BRIGHTNESS_GAIN: f32 = 1.3;
const CONTRAST_FACTOR: f32 = 1.5;
const MID_GREY:        f32 = 128.0;

pub struct Brightness;

impl PixelFilter for Brightness {
    fn id(&self) -> FilterId {
        FilterId::Brightness
    }

    fn label(&self) -> &'static str {
        "Brightness"
    }

    fn apply(&self, rgba: &mut [u8], width: u32, _height: u32) {
        apply_lut(rgba, width, |v| clamp_channel(v as f32 * BRIGHTNESS_GAIN));
    }
}

pub struct Contrast;

impl PixelFilter for Contrast {
    fn id(&self) -> FilterId {
        FilterId::Contrast
    }

    fn label(&self) -> &'static str {
        "Contrast"
    }

    fn apply(&self, rgba: &mut [u8], width: u32, _height: u32) {
        apply_lut(rgba, width, |v| {
            clamp_channel(CONTRAST_FACTOR * (v as f32 - MID_GREY) + MID_GREY)
        });
    }
}
