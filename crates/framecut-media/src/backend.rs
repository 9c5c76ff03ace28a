// crates/framecut-media/src/backend.rs
//
// MediaBackend: the factory the orchestrator uses to get a FrameSource for a
// clip and a fresh CaptureSink per job. Both are created on the job thread.

use framecut_core::error::PipelineError;
use framecut_core::media_types::Clip;
use framecut_core::settings::PipelineConfig;

use crate::sink::CaptureSink;
use crate::source::FrameSource;

pub trait MediaBackend: Send + Sync {
    /// Short name for logs (`"ffmpeg"`, `"memory"`).
    fn name(&self) -> &'static str;

    /// Wrap `clip` in a decodable source. Cheap; no decoding happens until
    /// `load_metadata`.
    fn open_source(
        &self,
        clip:   &Clip,
        config: &PipelineConfig,
    ) -> Result<Box<dyn FrameSource>, PipelineError>;

    fn open_sink(&self) -> Box<dyn CaptureSink>;
}
