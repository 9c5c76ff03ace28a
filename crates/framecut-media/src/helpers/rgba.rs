// crates/framecut-media/src/helpers/rgba.rs
//
// Packed RGBA ↔ strided VideoFrame copies.
//
// FFmpeg frame rows may carry padding past the visible width; every buffer
// that crosses into framecut-core is "packed" (each row exactly w × 4 bytes).
// `extract_rgba` strips the padding, `write_rgba` puts it back.

use ffmpeg_the_third::util::frame::video::Video as VideoFrame;

/// Copy the visible pixels of an RGBA `VideoFrame` into a packed buffer.
pub fn extract_rgba(frame: &VideoFrame, w: usize, h: usize) -> Vec<u8> {
    let stride    = frame.stride(0);
    let raw       = frame.data(0);
    let row_bytes = w * 4;
    let mut out = Vec::with_capacity(row_bytes * h);
    for row in 0..h {
        out.extend_from_slice(&raw[row * stride..row * stride + row_bytes]);
    }
    out
}

/// Copy a packed RGBA buffer into an RGBA `VideoFrame`, respecting stride.
pub fn write_rgba(packed: &[u8], frame: &mut VideoFrame, w: usize, h: usize) {
    let stride    = frame.stride(0);
    let row_bytes = w * 4;
    let dst       = frame.data_mut(0);
    for row in 0..h {
        dst[row * stride..row * stride + row_bytes]
            .copy_from_slice(&packed[row * row_bytes..(row + 1) * row_bytes]);
    }
}

/// Round a dimension down to the even size YUV420P encoders require.
pub fn even(v: u32) -> u32 {
    (v & !1).max(2)
}
