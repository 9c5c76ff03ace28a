// crates/framecut-core/src/lib.rs
//
// Pure data and pixel math. No FFmpeg, no threads.
//
//   filters      pixel filter engine + registry
//   settings     ExportSettings, TrimRange, Resolution, Container, PipelineConfig
//   job          job state machine and progress bands
//   media_types  Clip, Frame, JobEvent
//   store        caller-owned output handles
//   error        PipelineError taxonomy

pub mod error;
pub mod filters;
pub mod helpers;
pub mod job;
pub mod media_types;
pub mod settings;
pub mod store;

pub use error::{PipelineError, SettingsError};
pub use filters::{apply_filter, FilterId};
pub use job::{JobOptions, JobState};
pub use media_types::{Clip, ClipMetadata, Frame, JobEvent};
pub use settings::{Container, ExportSettings, FramePacing, PipelineConfig, Resolution, TrimRange};
