// crates/framecut-media/src/sink.rs
//
// CaptureSink: consumes capture samples, encodes them incrementally into a
// container and hands back the finished clip on stop.
//
// Container negotiation and the bitrate retry live here rather than in each
// sink so every backend behaves the same:
//
//   requested container supported?      → use it
//   else fallback (mp4 ↔ webm) supported? → use it, log at info
//   else                                 → PipelineError::UnsupportedFormat
//
//   start(config with bitrate) fails?    → retry once with bitrate: None
//   retry fails                          → PipelineError::Encode

use framecut_core::error::PipelineError;
use framecut_core::media_types::Clip;
use framecut_core::settings::{Container, ExportSettings};

use crate::surface::CaptureSample;

/// Everything a sink needs to open its encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub container:  Container,
    pub width:      u32,
    pub height:     u32,
    pub frame_rate: u32,
    /// Target bits per second. `None` lets the encoder pick its defaults.
    pub bitrate:    Option<u64>,
}

impl SinkConfig {
    pub fn from_settings(settings: &ExportSettings) -> Self {
        Self {
            container:  settings.format,
            width:      settings.resolution.width,
            height:     settings.resolution.height,
            frame_rate: settings.frame_rate,
            bitrate:    Some(settings.bitrate()),
        }
    }
}

/// Created and used on the job thread.
pub trait CaptureSink {
    /// Whether this sink can record into `container` at all.
    fn supports(&self, container: Container) -> bool;

    /// Open the encoder. Errors with `PipelineError::Encode` when the options
    /// are rejected.
    fn start(&mut self, config: &SinkConfig) -> Result<(), PipelineError>;

    /// Encode one sample.
    fn write(&mut self, sample: &CaptureSample) -> Result<(), PipelineError>;

    /// Flush and finalize. Stopping before any sample was written yields an
    /// empty clip with zero duration rather than an error.
    fn stop(&mut self) -> Result<Clip, PipelineError>;

    /// Throw away any partial output. Safe to call in any state.
    fn abort(&mut self);
}

/// Pick the container to record into.
pub fn negotiate_container(
    requested: Container,
    supports:  impl Fn(Container) -> bool,
) -> Result<Container, PipelineError> {
    if supports(requested) {
        return Ok(requested);
    }
    let fallback = requested.fallback();
    if supports(fallback) {
        tracing::info!("[sink] {requested} unsupported, falling back to {fallback}");
        return Ok(fallback);
    }
    Err(PipelineError::UnsupportedFormat {
        requested: requested.to_string(),
        tried:     format!("{requested}, {fallback}"),
    })
}

/// Negotiate the container and start `sink`, retrying once with encoder
/// defaults if the bitrate option is rejected. Returns the config the sink
/// actually started with.
pub fn start_negotiated(
    sink:   &mut dyn CaptureSink,
    config: SinkConfig,
) -> Result<SinkConfig, PipelineError> {
    let container = negotiate_container(config.container, |c| sink.supports(c))?;
    let config = SinkConfig { container, ..config };

    match sink.start(&config) {
        Ok(()) => Ok(config),
        Err(first) if config.bitrate.is_some() => {
            tracing::warn!("[sink] start rejected ({first}) — retrying with default encoder options");
            let retry = SinkConfig { bitrate: None, ..config };
            sink.start(&retry).map(|()| retry).map_err(|e| match e {
                PipelineError::Encode(_) => e,
                other => PipelineError::Encode(other.to_string()),
            })
        }
        Err(e) => Err(e),
    }
}
