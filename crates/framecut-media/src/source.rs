// crates/framecut-media/src/source.rs
//
// FrameSource: a decodable clip that can be seeked to a timestamp and asked
// for the frame it landed on.
//
// Implementations:
//   ffmpeg::decode::FfmpegFrameSource   real decode via libavformat/libavcodec
//   memory::SyntheticSource             deterministic generated frames (tests, dry runs)

use framecut_core::error::PipelineError;
use framecut_core::media_types::{ClipMetadata, Frame};

/// Created and used on the job thread.
pub trait FrameSource {
    /// Resolve duration and native dimensions.
    ///
    /// Fails with `PipelineError::Load` when the input is unsupported,
    /// truncated, or the probe does not answer within the configured timeout.
    /// Called once per source, before any seek.
    fn load_metadata(&mut self) -> Result<ClipMetadata, PipelineError>;

    /// Block until the frame at `timestamp` is decoded.
    ///
    /// Timestamps outside `[0, duration]` are clamped. On error the previous
    /// `current_frame` is left in place so the caller can keep rendering it.
    fn seek(&mut self, timestamp: f64) -> Result<(), PipelineError>;

    /// Most recently decoded frame. Valid until the next `seek`.
    fn current_frame(&self) -> Option<&Frame>;
}

/// Clamp `t` into `[0, duration]`. NaN maps to 0.
pub fn clamp_timestamp(t: f64, duration: f64) -> f64 {
    if t.is_nan() {
        return 0.0;
    }
    t.clamp(0.0, duration.max(0.0))
}
