// crates/framecut-core/src/media_types.rs
//
// Types that flow across the channel between framecut-media and its callers.
// Plain data only: no ffmpeg, no threads.

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::PipelineError;
use crate::job::JobState;

// ── Clip ──────────────────────────────────────────────────────────────────────

/// Encoded media payload plus what we learned about it.
///
/// The bytes sit behind an `Arc` so a clip can be handed to a job thread
/// without copying the file. `duration` stays `None` until metadata resolves.
#[derive(Clone, Debug)]
pub struct Clip {
    pub data:      Arc<Vec<u8>>,
    pub mime_type: String,
    pub duration:  Option<f64>,
}

impl Clip {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self { data: Arc::new(data), mime_type: mime_type.into(), duration: None }
    }

    /// Read a file and sniff its MIME type from the extension.
    ///
    /// Only `video/*` payloads are accepted.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let mime = mime_from_path(path);
        if !mime.starts_with("video/") {
            return Err(PipelineError::Load(format!(
                "{} is not a video file ({mime})", path.display()
            )));
        }
        let data = std::fs::read(path)
            .map_err(|e| PipelineError::Load(format!("read {}: {e}", path.display())))?;
        if data.is_empty() {
            return Err(PipelineError::Load(format!("{} is empty", path.display())));
        }
        Ok(Self::new(data, mime))
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File extension matching the MIME type, used when writing the clip out.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "video/webm"       => "webm",
            "video/quicktime"  => "mov",
            "video/x-matroska" => "mkv",
            "video/x-msvideo"  => "avi",
            "video/ogg"        => "ogv",
            _                  => "mp4",
        }
    }
}

/// Extension-based MIME sniffing. Unknown extensions map to
/// `application/octet-stream`, which `Clip::from_path` rejects.
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path.extension()
        .unwrap_or_default()
        .to_string_lossy()
        .to_lowercase();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm"        => "video/webm",
        "mov"         => "video/quicktime",
        "mkv"         => "video/x-matroska",
        "avi"         => "video/x-msvideo",
        "ogv"         => "video/ogg",
        "mp3" | "wav" | "aac" | "flac" | "ogg" | "m4a" => "audio/mpeg",
        _             => "application/octet-stream",
    }
}

/// What `FrameSource::load_metadata` resolves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipMetadata {
    pub duration: f64,
    pub width:    u32,
    pub height:   u32,
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// Packed RGBA pixels, no stride padding: `data.len() == width * height * 4`.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width:     u32,
    pub height:    u32,
    /// Source timestamp in seconds.
    pub timestamp: f64,
    pub data:      Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, timestamp: f64, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * 4,
            "Frame::new — buffer length {} does not match {}x{} RGBA",
            data.len(), width, height,
        );
        Self { width, height, timestamp, data }
    }

    /// Opaque black frame.
    pub fn black(width: u32, height: u32) -> Self {
        let mut data = vec![0u8; width as usize * height as usize * 4];
        data.chunks_exact_mut(4).for_each(|px| px[3] = 255);
        Self { width, height, timestamp: 0.0, data }
    }
}

// ── Job events ────────────────────────────────────────────────────────────────

/// Results sent from a job thread to whoever holds the job's handle.
///
/// Every variant carries the job id so a caller that started a newer job can
/// drop stale events from the previous one.
#[derive(Debug)]
pub enum JobEvent {
    Progress  { job_id: Uuid, percent: u8 },
    State     { job_id: Uuid, state: JobState },
    Done      { job_id: Uuid, clip: Clip },
    Failed    { job_id: Uuid, error: PipelineError },
    Cancelled { job_id: Uuid },
}

impl JobEvent {
    pub fn job_id(&self) -> Uuid {
        match self {
            JobEvent::Progress  { job_id, .. }
            | JobEvent::State   { job_id, .. }
            | JobEvent::Done    { job_id, .. }
            | JobEvent::Failed  { job_id, .. }
            | JobEvent::Cancelled { job_id } => *job_id,
        }
    }

    /// True for the last event a job ever sends.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Done { .. } | JobEvent::Failed { .. } | JobEvent::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn mime_sniffing_by_extension() {
        assert_eq!(mime_from_path(&PathBuf::from("a/b/clip.MP4")), "video/mp4");
        assert_eq!(mime_from_path(&PathBuf::from("clip.webm")), "video/webm");
        assert_eq!(mime_from_path(&PathBuf::from("song.mp3")), "audio/mpeg");
        assert_eq!(mime_from_path(&PathBuf::from("notes")), "application/octet-stream");
    }

    #[test]
    fn extension_follows_every_sniffed_video_type() {
        for ext in ["mp4", "webm", "mov", "mkv", "avi", "ogv"] {
            let path = PathBuf::from(format!("clip.{ext}"));
            let clip = Clip::new(vec![1], mime_from_path(&path));
            assert_eq!(clip.extension(), ext);
        }
    }

    #[test]
    fn from_path_rejects_non_video() {
        let err = Clip::from_path(&PathBuf::from("track.wav")).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn black_frame_is_opaque() {
        let f = Frame::black(3, 2);
        assert_eq!(f.data.len(), 24);
        assert!(f.data.chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn terminal_events() {
        let id = Uuid::new_v4();
        assert!(!JobEvent::Progress { job_id: id, percent: 50 }.is_terminal());
        assert!(JobEvent::Cancelled { job_id: id }.is_terminal());
        assert_eq!(JobEvent::Cancelled { job_id: id }.job_id(), id);
    }
}
