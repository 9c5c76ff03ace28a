// crates/framecut-media/src/lib.rs
//
// Everything that touches decoded media or threads. Callers talk to it through
// `EditorSession` / `MediaWorker` and receive `JobEvent`s over channels.
//
//   source / surface / sink   the three stage traits and the render surface
//   pipeline                  the per-job orchestrator
//   worker                    background job threads + JobHandle
//   session                   editor state on top of the worker
//   preview                   single filtered frame, PNG output
//   ffmpeg                    libav*-backed source and sink
//   memory                    generated source and recording sink

pub mod backend;
pub mod ffmpeg;
mod helpers;
pub mod memory;
pub mod pipeline;
pub mod preview;
pub mod session;
pub mod sink;
pub mod source;
pub mod surface;
pub mod worker;

pub use backend::MediaBackend;
pub use ffmpeg::FfmpegBackend;
pub use memory::MemoryBackend;
pub use pipeline::{JobOutcome, Pipeline};
pub use session::EditorSession;
pub use worker::{JobHandle, MediaWorker};
