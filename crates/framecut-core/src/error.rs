// crates/framecut-core/src/error.rs
//
// Error taxonomy shared by every pipeline stage.
//
// Display (`to_string()`) carries the internal diagnostic detail and is what
// gets logged. `user_message()` is the short, human-readable sentence a front
// end shows. It names WHAT failed (load, encode, format) without leaking
// backend detail like FFmpeg error codes.

use thiserror::Error;

/// Everything that can end a processing job early.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Input unreadable, corrupt, unsupported, or metadata probe timed out.
    #[error("load failed: {0}")]
    Load(String),

    /// Trim bounds rejected before the job started.
    #[error("invalid trim range {start:.3}s..{end:.3}s (clip duration {duration:.3}s)")]
    InvalidRange { start: f64, end: f64, duration: f64 },

    /// Neither the requested container nor the fallback is available.
    #[error("no usable container: requested {requested}, host supports none of {tried}")]
    UnsupportedFormat { requested: String, tried: String },

    /// Recorder/writer failure mid-stream.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Decode stalled or playback was refused by the host.
    #[error("playback failed: {0}")]
    Playback(String),
}

impl PipelineError {
    /// Human-readable one-liner suitable for a status banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::Load(_)                  => "Could not load the video. The file may be corrupt or in an unsupported format.",
            PipelineError::InvalidRange { .. }      => "The trim range is invalid: the end must be after the start and within the clip.",
            PipelineError::UnsupportedFormat { .. } => "Neither MP4 nor WebM recording is supported on this system.",
            PipelineError::Encode(_)                => "Export failed while encoding the video.",
            PipelineError::Playback(_)              => "The video could not be played back for processing.",
        }
    }

    /// Stable short tag, used in JSON output and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Load(_)                  => "load",
            PipelineError::InvalidRange { .. }      => "invalid_range",
            PipelineError::UnsupportedFormat { .. } => "unsupported_format",
            PipelineError::Encode(_)                => "encode",
            PipelineError::Playback(_)              => "playback",
        }
    }
}

/// Rejected export settings (malformed resolution string, zero fps, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("resolution must look like WIDTHxHEIGHT, got {0:?}")]
    MalformedResolution(String),

    #[error("resolution dimensions must be positive, got {width}x{height}")]
    ZeroResolution { width: u32, height: u32 },

    #[error("frame rate must be a positive integer, got {0}")]
    FrameRate(u32),

    #[error("quality must be in 1..=100, got {0}")]
    Quality(u8),

    #[error("unknown container {0:?} (expected mp4 or webm)")]
    Container(String),
}
