// crates/framecut-media/src/preview.rs
//
// Single-frame preview: decode the frame at a timestamp, apply a filter,
// return RGBA or write it out as a PNG.
//
// When the clip cannot be loaded, `preview_or_placeholder` hands back a flat
// placeholder frame instead of an error so a caller always has something to
// show.

use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};

use framecut_core::error::PipelineError;
use framecut_core::filters::FilterId;
use framecut_core::media_types::{Clip, Frame};
use framecut_core::settings::{PipelineConfig, Resolution};

use crate::backend::MediaBackend;
use crate::surface::RenderSurface;

/// Placeholder size when the clip's own dimensions are unknown.
pub const PLACEHOLDER_SIZE: Resolution = Resolution::new(640, 360);

/// Decode the frame at `timestamp` and apply `filter`.
///
/// The frame keeps the clip's native size unless `size` asks for another.
pub fn render_preview(
    backend:   &dyn MediaBackend,
    config:    &PipelineConfig,
    clip:      &Clip,
    timestamp: f64,
    filter:    FilterId,
    size:      Option<Resolution>,
) -> Result<Frame, PipelineError> {
    let mut source = backend.open_source(clip, config)?;
    let meta = source.load_metadata()?;
    source.seek(timestamp)?;
    let frame = source.current_frame()
        .ok_or_else(|| PipelineError::Playback(format!("no frame at {timestamp:.3}s")))?;

    let size = size.unwrap_or(Resolution::new(meta.width, meta.height));
    let mut surface = RenderSurface::new(size);
    surface.render_frame(frame, filter);
    Ok(surface.snapshot(frame.timestamp))
}

/// Like `render_preview`, but any failure yields `placeholder(size)`.
pub fn preview_or_placeholder(
    backend:   &dyn MediaBackend,
    config:    &PipelineConfig,
    clip:      &Clip,
    timestamp: f64,
    filter:    FilterId,
    size:      Option<Resolution>,
) -> Frame {
    match render_preview(backend, config, clip, timestamp, filter, size) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("[preview] {e} — showing placeholder");
            placeholder(size.unwrap_or(PLACEHOLDER_SIZE))
        }
    }
}

/// Neutral dark-grey frame with a lighter border.
pub fn placeholder(size: Resolution) -> Frame {
    let (w, h) = (size.width.max(1), size.height.max(1));
    let border = (w.min(h) / 40).max(1);
    let mut data = Vec::with_capacity(w as usize * h as usize * 4);
    for y in 0..h {
        for x in 0..w {
            let edge = x < border || y < border || x >= w - border || y >= h - border;
            let v = if edge { 96 } else { 40 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    Frame::new(w, h, 0.0, data)
}

/// Write `frame` as an 8-bit RGBA PNG.
pub fn write_png(frame: &Frame, dest: &Path) -> Result<()> {
    let file = std::fs::File::create(dest)
        .with_context(|| format!("create {}", dest.display()))?;
    let w = &mut BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().context("write PNG header")?;
    writer.write_image_data(&frame.data).context("write PNG data")?;
    tracing::info!("[preview] PNG saved → {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use framecut_core::media_types::ClipMetadata;

    use crate::memory::MemoryBackend;

    fn backend() -> MemoryBackend {
        MemoryBackend::new(ClipMetadata { duration: 5.0, width: 6, height: 4 })
    }

    #[test]
    fn preview_is_filtered_at_native_size() {
        let clip = Clip::new(vec![1], "video/mp4");
        let f = render_preview(&backend(), &PipelineConfig::default(), &clip, 1.0, FilterId::Grayscale, None)
            .unwrap();
        assert_eq!((f.width, f.height), (6, 4));
        assert!(f.data.chunks_exact(4).all(|p| p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn load_failure_gives_placeholder() {
        let b = backend().failing_load("bad header");
        let clip = Clip::new(vec![1], "video/mp4");
        let f = preview_or_placeholder(
            &b, &PipelineConfig::default(), &clip, 0.0, FilterId::None, Some(Resolution::new(80, 40)),
        );
        assert_eq!((f.width, f.height), (80, 40));
        assert_eq!(&f.data[..4], [96, 96, 96, 255]);
    }

    #[test]
    fn png_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        write_png(&placeholder(Resolution::new(8, 8)), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
