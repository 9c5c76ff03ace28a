// crates/framecut-media/src/ffmpeg/mod.rs
//
// FFmpeg-backed MediaBackend.

pub mod decode;
pub mod encode;
pub mod probe;

use anyhow::{Context, Result};

use framecut_core::error::PipelineError;
use framecut_core::media_types::Clip;
use framecut_core::settings::PipelineConfig;

use crate::backend::MediaBackend;
use crate::sink::CaptureSink;
use crate::source::FrameSource;

use self::decode::FfmpegFrameSource;
use self::encode::FfmpegSink;

pub struct FfmpegBackend;

impl FfmpegBackend {
    /// Initialise libav* and build the backend.
    pub fn new() -> Result<Self> {
        ffmpeg_the_third::init().context("FFmpeg init failed")?;
        Ok(Self)
    }
}

impl MediaBackend for FfmpegBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn open_source(
        &self,
        clip:   &Clip,
        config: &PipelineConfig,
    ) -> Result<Box<dyn FrameSource>, PipelineError> {
        Ok(Box::new(FfmpegFrameSource::new(clip, config)?))
    }

    fn open_sink(&self) -> Box<dyn CaptureSink> {
        Box::new(FfmpegSink::new())
    }
}
