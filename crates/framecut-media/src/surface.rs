// crates/framecut-media/src/surface.rs
//
// Off-screen RGBA render target plus the capture stream that samples it.
//
// Every decoded frame is stretched to the export resolution with
// nearest-neighbour sampling, then filtered in place. The capture stream
// reads the buffer once per output frame interval and stamps each sample with
// a PTS counted in 1/frame_rate units, starting at zero.
//
// Sampling a buffer that has not been re-rendered since the previous sample
// repeats the previous frame. That happens when a seek fails mid-loop and
// the orchestrator carries on with the last good frame.

use std::sync::Arc;

use rayon::prelude::*;

use framecut_core::filters::{apply_filter, FilterId};
use framecut_core::media_types::Frame;
use framecut_core::settings::Resolution;

// ── RenderSurface ─────────────────────────────────────────────────────────────

pub struct RenderSurface {
    resolution: Resolution,
    buffer:     Vec<u8>,
    /// Bumped on every render; lets the capture stream spot repeats.
    generation: u64,
}

impl RenderSurface {
    /// Opaque black surface at `resolution`.
    pub fn new(resolution: Resolution) -> Self {
        let black = Frame::black(resolution.width, resolution.height);
        Self { resolution, buffer: black.data, generation: 0 }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn pixels(&self) -> &[u8] {
        &self.buffer
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stretch `frame` onto the surface, then apply `filter` in place.
    pub fn render_frame(&mut self, frame: &Frame, filter: FilterId) {
        let Resolution { width, height } = self.resolution;
        stretch_nearest(frame, width, height, &mut self.buffer);
        apply_filter(&mut self.buffer, filter, width, height);
        self.generation += 1;
    }

    /// Start sampling this surface at `frame_rate` samples per second.
    pub fn capture_stream(&self, frame_rate: u32) -> CaptureStream {
        CaptureStream {
            frame_rate:      frame_rate.max(1),
            next_pts:        0,
            last_generation: None,
            repeated:        0,
        }
    }

    /// Copy of the current buffer as a `Frame`.
    pub fn snapshot(&self, timestamp: f64) -> Frame {
        Frame::new(self.resolution.width, self.resolution.height, timestamp, self.buffer.clone())
    }
}

/// Nearest-neighbour stretch of `src` into a `dst_w × dst_h` RGBA buffer.
///
/// Destination pixel `d` reads source pixel `floor((d + 0.5) × src / dst)`,
/// clamped to the last column/row. Equal sizes take a straight copy.
pub fn stretch_nearest(src: &Frame, dst_w: u32, dst_h: u32, dst: &mut [u8]) {
    let (sw, sh) = (src.width as usize, src.height as usize);
    let (dw, dh) = (dst_w as usize, dst_h as usize);
    debug_assert_eq!(dst.len(), dw * dh * 4);

    if sw == 0 || sh == 0 || src.data.len() < sw * sh * 4 {
        tracing::warn!("[surface] empty or short source frame {}x{} — skipped", sw, sh);
        return;
    }
    if (sw, sh) == (dw, dh) {
        dst.copy_from_slice(&src.data[..dw * dh * 4]);
        return;
    }

    let col_map: Vec<usize> = (0..dw)
        .map(|dx| ((((dx as f64 + 0.5) * sw as f64) / dw as f64) as usize).min(sw - 1))
        .collect();

    dst.par_chunks_mut(dw * 4).enumerate().for_each(|(dy, row)| {
        let sy = ((((dy as f64 + 0.5) * sh as f64) / dh as f64) as usize).min(sh - 1);
        let src_row = &src.data[sy * sw * 4..(sy + 1) * sw * 4];
        for (dx, px) in row.chunks_exact_mut(4).enumerate() {
            let s = col_map[dx] * 4;
            px.copy_from_slice(&src_row[s..s + 4]);
        }
    });
}

// ── Capture stream ────────────────────────────────────────────────────────────

/// One sampled frame handed to a `CaptureSink`.
#[derive(Clone, Debug)]
pub struct CaptureSample {
    /// Presentation timestamp in 1/frame_rate units.
    pub pts:        i64,
    pub frame_rate: u32,
    pub width:      u32,
    pub height:     u32,
    pub data:       Arc<Vec<u8>>,
    /// True when the surface had not been re-rendered since the last sample.
    pub repeated:   bool,
}

impl CaptureSample {
    /// Seconds from the start of the output.
    pub fn time(&self) -> f64 {
        self.pts as f64 / self.frame_rate as f64
    }
}

pub struct CaptureStream {
    frame_rate:      u32,
    next_pts:        i64,
    last_generation: Option<u64>,
    repeated:        u64,
}

impl CaptureStream {
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Samples taken so far.
    pub fn samples(&self) -> i64 {
        self.next_pts
    }

    /// Samples that repeated the previous frame.
    pub fn repeated(&self) -> u64 {
        self.repeated
    }

    pub fn sample(&mut self, surface: &RenderSurface) -> CaptureSample {
        let gen = surface.generation();
        let repeated = self.last_generation == Some(gen);
        if repeated {
            self.repeated += 1;
            tracing::debug!("[surface] pts {} repeats the previous frame", self.next_pts);
        }
        self.last_generation = Some(gen);

        let sample = CaptureSample {
            pts:        self.next_pts,
            frame_rate: self.frame_rate,
            width:      surface.resolution.width,
            height:     surface.resolution.height,
            data:       Arc::new(surface.buffer.clone()),
            repeated,
        };
        self.next_pts += 1;
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2×2 frame with four distinct opaque colours.
    fn quad() -> Frame {
        Frame::new(2, 2, 0.0, vec![
            255, 0, 0, 255,    0, 255, 0, 255,
            0, 0, 255, 255,    255, 255, 255, 255,
        ])
    }

    #[test]
    fn upscale_replicates_quadrants() {
        let mut out = vec![0u8; 4 * 4 * 4];
        stretch_nearest(&quad(), 4, 4, &mut out);
        let px = |x: usize, y: usize| &out[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        assert_eq!(px(0, 0), [255, 0, 0, 255]);
        assert_eq!(px(1, 1), [255, 0, 0, 255]);
        assert_eq!(px(2, 0), [0, 255, 0, 255]);
        assert_eq!(px(0, 3), [0, 0, 255, 255]);
        assert_eq!(px(3, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn downscale_picks_centre_sample() {
        // 4×1 → 2×1: d=0 reads floor(0.5×2)=1, d=1 reads floor(1.5×2)=3.
        let src = Frame::new(4, 1, 0.0, vec![
            10, 0, 0, 255,  20, 0, 0, 255,  30, 0, 0, 255,  40, 0, 0, 255,
        ]);
        let mut out = vec![0u8; 2 * 4];
        stretch_nearest(&src, 2, 1, &mut out);
        assert_eq!(out[0], 20);
        assert_eq!(out[4], 40);
    }

    #[test]
    fn render_applies_filter() {
        let mut s = RenderSurface::new(Resolution::new(2, 2));
        s.render_frame(&quad(), FilterId::Invert);
        assert_eq!(&s.pixels()[..4], [0, 255, 255, 255]);
    }

    #[test]
    fn capture_counts_pts_and_repeats() {
        let mut s = RenderSurface::new(Resolution::new(2, 2));
        let mut cap = s.capture_stream(30);
        s.render_frame(&quad(), FilterId::None);
        let a = cap.sample(&s);
        let b = cap.sample(&s);
        s.render_frame(&quad(), FilterId::None);
        let c = cap.sample(&s);
        assert_eq!((a.pts, b.pts, c.pts), (0, 1, 2));
        assert!(!a.repeated && b.repeated && !c.repeated);
        assert_eq!(cap.repeated(), 1);
        assert!((c.time() - 2.0 / 30.0).abs() < 1e-12);
    }
}
