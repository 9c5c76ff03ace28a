// crates/framecut-media/src/session.rs
//
// EditorSession: the editing state a front end drives, minus any UI.
//
//   load_clip            probe metadata, reset trim to [0, duration]
//   set_trim_range       validated against the known duration
//   set_filter           select the filter for the next export
//   apply_filter         select a filter and start a job with it
//   set_export_settings  validated, replaced wholesale
//   process_video        snapshot the options and start a job
//   cancel_processing
//   poll / wait          drain job events into `status` and the output store
//
// A finished export goes into the session's OutputStore; the previous output
// handle is released when a new one replaces it.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use framecut_core::error::{PipelineError, SettingsError};
use framecut_core::filters::FilterId;
use framecut_core::job::{JobOptions, JobState};
use framecut_core::media_types::{Clip, ClipMetadata, JobEvent};
use framecut_core::settings::{ExportSettings, PipelineConfig, TrimRange};
use framecut_core::store::{OutputHandle, OutputStore};

use crate::backend::MediaBackend;
use crate::worker::{JobHandle, MediaWorker};

/// What a front end shows about the current job.
#[derive(Clone, Debug, PartialEq)]
pub struct JobStatus {
    pub job_id:   Option<Uuid>,
    pub state:    JobState,
    pub progress: u8,
    pub error:    Option<PipelineError>,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self { job_id: None, state: JobState::Idle, progress: 0, error: None }
    }
}

impl JobStatus {
    pub fn is_processing(&self) -> bool {
        self.job_id.is_some() && !self.state.is_terminal()
    }
}

pub struct EditorSession {
    worker:   MediaWorker,
    clip:     Option<Clip>,
    metadata: Option<ClipMetadata>,
    trim:     TrimRange,
    filter:   FilterId,
    settings: ExportSettings,
    store:    OutputStore,
    output:   Option<OutputHandle>,
    job:      Option<JobHandle>,
    status:   JobStatus,
}

impl EditorSession {
    pub fn new(backend: Arc<dyn MediaBackend>, config: PipelineConfig) -> Self {
        Self {
            worker:   MediaWorker::new(backend, config),
            clip:     None,
            metadata: None,
            trim:     TrimRange::new(0.0, 0.0),
            filter:   FilterId::None,
            settings: ExportSettings::default(),
            store:    OutputStore::new(),
            output:   None,
            job:      None,
            status:   JobStatus::default(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    pub fn metadata(&self) -> Option<ClipMetadata> {
        self.metadata
    }

    pub fn trim(&self) -> TrimRange {
        self.trim
    }

    pub fn filter(&self) -> FilterId {
        self.filter
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn output(&self) -> Option<&Clip> {
        self.output.and_then(|h| self.store.get(h))
    }

    pub fn output_handle(&self) -> Option<OutputHandle> {
        self.output
    }

    pub fn backend(&self) -> &dyn MediaBackend {
        self.worker.backend()
    }

    pub fn config(&self) -> &PipelineConfig {
        self.worker.config()
    }

    // ── Editing ───────────────────────────────────────────────────────────────

    /// Load a new clip: resolve its metadata, then cancel any running job,
    /// drop the previous output and reset the trim to the whole clip.
    ///
    /// When the new clip fails to load, the session keeps the previous clip
    /// together with its trim, job and output.
    pub fn load_clip(&mut self, clip: Clip) -> Result<ClipMetadata, PipelineError> {
        let mut source = self.worker.backend().open_source(&clip, self.worker.config())?;
        let metadata = source.load_metadata()?;

        self.cancel_processing();
        self.job = None;
        self.status = JobStatus::default();
        if let Some(h) = self.output.take() {
            self.store.release(h);
        }

        tracing::info!(
            "[session] loaded {} ({} bytes) — {:.3}s {}x{}",
            clip.mime_type, clip.len(), metadata.duration, metadata.width, metadata.height,
        );

        self.clip     = Some(clip.with_duration(metadata.duration));
        self.metadata = Some(metadata);
        self.trim     = TrimRange::full(metadata.duration);
        Ok(metadata)
    }

    pub fn set_trim_range(&mut self, start: f64, end: f64) -> Result<(), PipelineError> {
        let trim = TrimRange::new(start, end);
        if let Some(meta) = self.metadata {
            trim.validate(meta.duration)?;
        }
        self.trim = trim;
        Ok(())
    }

    pub fn set_filter(&mut self, filter: FilterId) {
        self.filter = filter;
    }

    /// Select `filter` and start processing with it, returning the new job's
    /// id. `none` is a no-op: the selection stays and no job starts.
    pub fn apply_filter(&mut self, filter: FilterId) -> Result<Option<Uuid>, PipelineError> {
        if filter.is_identity() {
            return Ok(None);
        }
        tracing::debug!("[session] filter → {filter}, processing");
        self.filter = filter;
        self.process_video().map(Some)
    }

    pub fn set_export_settings(&mut self, settings: ExportSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    // ── Processing ────────────────────────────────────────────────────────────

    /// Snapshot the current options and start a job. A job already running is
    /// cancelled by the worker.
    pub fn process_video(&mut self) -> Result<Uuid, PipelineError> {
        let clip = self.clip.clone()
            .ok_or_else(|| PipelineError::Load("no clip loaded".into()))?;
        if let Some(meta) = self.metadata {
            self.trim.validate(meta.duration)?;
        }

        let options = JobOptions {
            filter:   self.filter,
            trim:     self.trim,
            settings: self.settings.clone(),
        };
        let handle = self.worker.start_job(clip, options)?;
        let id = handle.id();
        self.job = Some(handle);
        self.status = JobStatus { job_id: Some(id), state: JobState::Idle, progress: 0, error: None };
        Ok(id)
    }

    pub fn cancel_processing(&mut self) {
        if let Some(job) = &self.job {
            job.cancel();
        }
    }

    /// Apply every pending event of the current job. Returns them.
    pub fn poll(&mut self) -> Vec<JobEvent> {
        let mut seen = Vec::new();
        while let Some(ev) = self.job.as_ref().and_then(JobHandle::try_event) {
            self.apply_event(&ev);
            seen.push(ev);
        }
        seen
    }

    /// Block until the current job ends or `timeout` passes without an event.
    /// Returns the final state when the job ended.
    pub fn wait(&mut self, timeout: Duration) -> Option<JobState> {
        loop {
            let ev = self.job.as_ref()?.next_event(timeout)?;
            self.apply_event(&ev);
            if ev.is_terminal() {
                return Some(self.status.state);
            }
        }
    }

    fn apply_event(&mut self, ev: &JobEvent) {
        if self.status.job_id != Some(ev.job_id()) {
            tracing::debug!("[session] dropping stale event for job {}", ev.job_id());
            return;
        }
        match ev {
            JobEvent::Progress { percent, .. } => {
                self.status.progress = self.status.progress.max(*percent);
            }
            JobEvent::State { state, .. } => self.status.state = *state,
            JobEvent::Done { clip, .. } => {
                self.output = Some(self.store.replace(self.output, clip.clone()));
                self.status.state = JobState::Complete;
            }
            JobEvent::Failed { error, .. } => {
                self.status.state = JobState::Failed;
                self.status.error = Some(error.clone());
            }
            JobEvent::Cancelled { .. } => self.status.state = JobState::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use framecut_core::settings::{Container, Resolution};

    use crate::memory::MemoryBackend;

    fn session() -> EditorSession {
        let backend = MemoryBackend::new(ClipMetadata { duration: 10.0, width: 16, height: 8 })
            .supporting(&[Container::Webm]);
        EditorSession::new(Arc::new(backend), PipelineConfig::default())
    }

    fn clip() -> Clip {
        Clip::new(vec![7; 32], "video/mp4")
    }

    #[test]
    fn defaults() {
        let s = session();
        assert_eq!(s.settings().resolution, Resolution::new(1280, 720));
        assert_eq!(s.settings().frame_rate, 30);
        assert_eq!(s.settings().format, Container::Mp4);
        assert_eq!(s.settings().quality, 80);
        assert_eq!(s.filter(), FilterId::None);
        assert!(!s.status().is_processing());
    }

    #[test]
    fn load_resets_trim_to_full_clip() {
        let mut s = session();
        s.load_clip(clip()).unwrap();
        assert_eq!(s.trim(), TrimRange::new(0.0, 10.0));
        assert_eq!(s.clip().and_then(|c| c.duration), Some(10.0));
    }

    #[test]
    fn trim_validated_against_duration() {
        let mut s = session();
        s.load_clip(clip()).unwrap();
        assert!(s.set_trim_range(2.0, 6.0).is_ok());
        assert!(matches!(s.set_trim_range(6.0, 2.0), Err(PipelineError::InvalidRange { .. })));
        assert!(matches!(s.set_trim_range(2.0, 12.0), Err(PipelineError::InvalidRange { .. })));
        assert_eq!(s.trim(), TrimRange::new(2.0, 6.0));
    }

    #[test]
    fn apply_none_is_noop() {
        let mut s = session();
        s.load_clip(clip()).unwrap();
        s.set_filter(FilterId::Vintage);
        assert_eq!(s.apply_filter(FilterId::None), Ok(None));
        assert_eq!(s.filter(), FilterId::Vintage);
        assert_eq!(s.status().job_id, None);
    }

    #[test]
    fn apply_filter_starts_a_job() {
        let mut s = session();
        s.load_clip(clip()).unwrap();
        s.set_trim_range(0.0, 0.5).unwrap();
        s.set_export_settings(ExportSettings { resolution: Resolution::new(8, 4), ..Default::default() })
            .unwrap();

        let id = s.apply_filter(FilterId::Sepia).unwrap().expect("a job id");
        assert_eq!(s.filter(), FilterId::Sepia);
        assert_eq!(s.status().job_id, Some(id));
        assert_eq!(s.wait(Duration::from_secs(10)), Some(JobState::Complete));
        assert!(s.output().is_some());
    }

    #[test]
    fn apply_filter_without_clip_fails() {
        let mut s = session();
        assert!(matches!(s.apply_filter(FilterId::Sepia), Err(PipelineError::Load(_))));
        assert_eq!(s.filter(), FilterId::Sepia);
    }

    #[test]
    fn failed_load_keeps_previous_clip_and_output() {
        let mut s = session();
        s.load_clip(clip()).unwrap();
        s.set_trim_range(1.0, 1.5).unwrap();
        s.set_export_settings(ExportSettings { resolution: Resolution::new(8, 4), ..Default::default() })
            .unwrap();
        s.process_video().unwrap();
        assert_eq!(s.wait(Duration::from_secs(10)), Some(JobState::Complete));
        let output = s.output_handle();

        let empty = Clip::new(Vec::new(), "video/mp4");
        assert!(matches!(s.load_clip(empty), Err(PipelineError::Load(_))));
        assert_eq!(s.trim(), TrimRange::new(1.0, 1.5));
        assert_eq!(s.clip().map(Clip::len), Some(32));
        assert_eq!(s.output_handle(), output);
        assert!(s.output().is_some());
        assert_eq!(s.status().state, JobState::Complete);
        assert_eq!(s.store.live(), 1);
    }

    #[test]
    fn bad_settings_rejected() {
        let mut s = session();
        let bad = ExportSettings { frame_rate: 0, ..Default::default() };
        assert!(s.set_export_settings(bad).is_err());
        assert_eq!(s.settings().frame_rate, 30);
    }

    #[test]
    fn process_without_clip_fails() {
        let mut s = session();
        assert!(matches!(s.process_video(), Err(PipelineError::Load(_))));
    }

    #[test]
    fn process_stores_output_and_replaces_previous() {
        let mut s = session();
        s.load_clip(clip()).unwrap();
        s.set_trim_range(2.0, 3.0).unwrap();
        s.set_export_settings(ExportSettings { resolution: Resolution::new(8, 4), ..Default::default() })
            .unwrap();

        s.process_video().unwrap();
        assert_eq!(s.wait(Duration::from_secs(10)), Some(JobState::Complete));
        assert_eq!(s.status().progress, 100);
        let first = s.output_handle().unwrap();
        // mp4 unsupported by this backend → webm fallback.
        assert_eq!(s.output().unwrap().mime_type, "video/webm");

        s.process_video().unwrap();
        assert_eq!(s.wait(Duration::from_secs(10)), Some(JobState::Complete));
        let second = s.output_handle().unwrap();
        assert_ne!(first, second);
        assert_eq!(s.store.live(), 1);
        assert_eq!(s.store.released(), 1);
    }
}
