// crates/framecut-media/src/helpers/mod.rs
//
// Helpers shared by the FFmpeg and in-memory backends.
// Not re-exported from lib.rs; these are implementation details.

pub mod rgba;
pub mod seek;
pub mod timeout;
