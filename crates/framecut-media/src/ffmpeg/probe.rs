// crates/framecut-media/src/ffmpeg/probe.rs
//
// In-process FFmpeg probing: duration and video dimensions.
//
// `probe_with_timeout` runs the probe through `helpers::timeout`, so a
// stalled demuxer turns into a Load error instead of hanging the job.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::media::Type;

use framecut_core::error::PipelineError;
use framecut_core::media_types::ClipMetadata;

use crate::helpers::timeout::with_timeout;

/// Duration (container first, then video stream) and display size.
pub fn probe_metadata(path: &Path) -> Result<ClipMetadata> {
    let ctx = input(path).with_context(|| format!("open {}", path.display()))?;

    let stream = ctx.streams().best(Type::Video)
        .ok_or_else(|| anyhow!("no video stream in {}", path.display()))?;

    let (width, height) = unsafe {
        let p = stream.parameters().as_ptr();
        ((*p).width as u32, (*p).height as u32)
    };
    if width == 0 || height == 0 {
        return Err(anyhow!("video stream has no dimensions"));
    }

    let mut duration = ctx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
    if !(duration > 0.0) {
        let tb = stream.time_base();
        duration = stream.duration() as f64 * tb.numerator() as f64 / tb.denominator() as f64;
    }
    if !(duration > 0.0) || !duration.is_finite() {
        return Err(anyhow!("duration unknown"));
    }

    tracing::debug!("[probe] {duration:.3}s {width}x{height} ← {}", path.display());
    Ok(ClipMetadata { duration, width, height })
}

/// `probe_metadata` bounded by `timeout`.
pub fn probe_with_timeout(path: PathBuf, timeout: Duration) -> Result<ClipMetadata, PipelineError> {
    with_timeout("probe", timeout, move || probe_metadata(&path))
}
