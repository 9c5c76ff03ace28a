// crates/framecut-core/src/filters/invert.rs
//
// Photographic negative: every colour channel becomes 255 − value.
// Exact in u8 arithmetic, so applying it twice restores the input.

use crate::filters::{FilterId, PixelFilter};
use crate::filters::helpers::apply_lut;

pub struct Invert;

impl PixelFilter for Invert {
    fn id(&self) -> FilterId {
        FilterId::Invert
    }

    fn label(&self) -> &'static str {
        "Invert"
    }

    fn apply(&self, rgba: &mut [u8], width: u32, _height: u32) {
        apply_lut(rgba, width, |v| 255 - v);
    }
}
