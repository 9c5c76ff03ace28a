// crates/framecut-media/src/worker.rs
//
// MediaWorker: runs processing jobs on background threads.
//
// One std thread per job. Each job gets its own bounded event channel and its
// own cancel flag; both travel back to the caller in a `JobHandle`. The worker
// keeps only the current job's (id, flag) pair so that starting a new job can
// cancel the one still in flight. The superseded job's remaining events still
// carry its own id and land on its own channel, so they never mix with the
// new job's.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError};
use parking_lot::Mutex;
use uuid::Uuid;

use framecut_core::error::PipelineError;
use framecut_core::job::{JobOptions, ProcessingJob};
use framecut_core::media_types::{Clip, JobEvent};
use framecut_core::settings::PipelineConfig;

use crate::backend::MediaBackend;
use crate::pipeline::{JobOutcome, Pipeline};

/// Events per job are bounded by ~100 progress values plus a handful of state
/// changes, so this never applies backpressure in practice.
const EVENT_CAPACITY: usize = 256;

struct CurrentJob {
    id:     Uuid,
    cancel: Arc<AtomicBool>,
}

// ── JobHandle ─────────────────────────────────────────────────────────────────

/// Caller's side of one running job.
pub struct JobHandle {
    id:     Uuid,
    cancel: Arc<AtomicBool>,
    events: Receiver<JobEvent>,
    thread: Option<JoinHandle<JobOutcome>>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ask the job to stop at the next frame boundary. Idempotent.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    /// Next event without blocking.
    pub fn try_event(&self) -> Option<JobEvent> {
        match self.events.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Next event, waiting up to `timeout`.
    pub fn next_event(&self, timeout: Duration) -> Option<JobEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block until the job thread exits and return its outcome. Events not yet
    /// received are dropped with the handle.
    pub fn wait(mut self) -> JobOutcome {
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(outcome)) => outcome,
            Some(Err(_))      => JobOutcome::Failed(PipelineError::Encode("job thread panicked".into())),
            None              => JobOutcome::Failed(PipelineError::Encode("job already joined".into())),
        }
    }
}

// ── MediaWorker ───────────────────────────────────────────────────────────────

pub struct MediaWorker {
    backend:  Arc<dyn MediaBackend>,
    config:   PipelineConfig,
    current:  Arc<Mutex<Option<CurrentJob>>>,
    shutdown: Arc<AtomicBool>,
}

impl MediaWorker {
    pub fn new(backend: Arc<dyn MediaBackend>, config: PipelineConfig) -> Self {
        Self {
            backend,
            config,
            current:  Arc::new(Mutex::new(None)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn backend(&self) -> &dyn MediaBackend {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Id of the job currently running, if any.
    pub fn current_job(&self) -> Option<Uuid> {
        self.current.lock().as_ref().map(|j| j.id)
    }

    /// Spawn a job for `clip`. Any job still in flight is cancelled first.
    ///
    /// When the clip already carries its duration the trim range is checked
    /// here, and a bad range is returned without registering or spawning
    /// anything; the running job is left alone.
    pub fn start_job(&self, clip: Clip, options: JobOptions) -> Result<JobHandle, PipelineError> {
        if let Some(duration) = clip.duration {
            options.trim.validate(duration)?;
        }

        let job    = ProcessingJob::new(options);
        let job_id = job.id;
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = bounded(EVENT_CAPACITY);

        // Register before spawning so cancel_current never misses the new job.
        {
            let mut slot = self.current.lock();
            if let Some(prev) = slot.replace(CurrentJob { id: job_id, cancel: Arc::clone(&cancel) }) {
                tracing::info!("[worker] job {job_id} supersedes {} — cancelling it", prev.id);
                prev.cancel.store(true, Ordering::Relaxed);
            }
        }

        let backend  = Arc::clone(&self.backend);
        let config   = self.config.clone();
        let current  = Arc::clone(&self.current);
        let shutdown = Arc::clone(&self.shutdown);
        let flag     = Arc::clone(&cancel);
        let spawn_tx = tx.clone();

        let thread = thread::Builder::new()
            .name(format!("framecut-job-{}", &job_id.simple().to_string()[..8]))
            .spawn(move || {
                let outcome = if shutdown.load(Ordering::Relaxed) {
                    let error = PipelineError::Encode("worker shutting down".into());
                    let _ = tx.send(JobEvent::Failed { job_id, error: error.clone() });
                    JobOutcome::Failed(error)
                } else {
                    let emit = |ev: JobEvent| {
                        let _ = tx.send(ev);
                    };
                    Pipeline::new(backend.as_ref(), &config)
                        .run(job_id, &clip, &job.options, &flag, &emit)
                };

                // Clear the slot only if a newer job has not already taken it.
                let mut slot = current.lock();
                if slot.as_ref().is_some_and(|j| j.id == job_id) {
                    *slot = None;
                }
                outcome
            });

        let thread = match thread {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::error!("[worker] could not spawn job thread: {e}");
                let error = PipelineError::Encode(format!("spawn job thread: {e}"));
                let _ = spawn_tx.send(JobEvent::Failed { job_id, error });
                let mut slot = self.current.lock();
                if slot.as_ref().is_some_and(|j| j.id == job_id) {
                    *slot = None;
                }
                None
            }
        };

        Ok(JobHandle { id: job_id, cancel, events: rx, thread })
    }

    /// Cancel whatever job is current. Returns its id.
    pub fn cancel_current(&self) -> Option<Uuid> {
        let slot = self.current.lock();
        slot.as_ref().map(|j| {
            j.cancel.store(true, Ordering::Relaxed);
            j.id
        })
    }

    /// Cancel the running job and refuse new ones.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.cancel_current();
    }
}

impl Drop for MediaWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use framecut_core::filters::FilterId;
    use framecut_core::job::JobState;
    use framecut_core::media_types::ClipMetadata;
    use framecut_core::settings::{ExportSettings, FramePacing, Resolution, TrimRange};

    use crate::memory::MemoryBackend;

    fn worker(pacing: FramePacing) -> (MediaWorker, MemoryBackend) {
        let backend = MemoryBackend::new(ClipMetadata { duration: 10.0, width: 16, height: 8 });
        let config = PipelineConfig { pacing, ..Default::default() };
        (MediaWorker::new(Arc::new(backend.clone()), config), backend)
    }

    fn options(trim: TrimRange) -> JobOptions {
        JobOptions {
            filter:   FilterId::Grayscale,
            trim,
            settings: ExportSettings { resolution: Resolution::new(8, 4), ..Default::default() },
        }
    }

    fn clip() -> Clip {
        Clip::new(vec![1, 2, 3], "video/mp4")
    }

    #[test]
    fn job_runs_to_completion() {
        let (w, _) = worker(FramePacing::Unpaced);
        let handle = w.start_job(clip(), options(TrimRange::new(0.0, 1.0))).unwrap();
        let id = handle.id();

        let mut last = None;
        while let Some(ev) = handle.next_event(Duration::from_secs(10)) {
            assert_eq!(ev.job_id(), id);
            let done = ev.is_terminal();
            last = Some(ev);
            if done { break; }
        }
        assert!(matches!(last, Some(JobEvent::Done { .. })));
        assert_eq!(handle.wait().state(), JobState::Complete);
        assert_eq!(w.current_job(), None);
    }

    #[test]
    fn cancel_via_handle() {
        let (w, backend) = worker(FramePacing::Realtime);
        let handle = w.start_job(clip(), options(TrimRange::new(0.0, 4.0))).unwrap();

        // Wait until the frame loop is running, then cancel.
        while let Some(ev) = handle.next_event(Duration::from_secs(10)) {
            if matches!(ev, JobEvent::Progress { percent, .. } if percent >= 30) {
                break;
            }
        }
        handle.cancel();
        handle.cancel();
        assert!(matches!(handle.wait(), JobOutcome::Cancelled));
        assert!(backend.log().aborted);
    }

    #[test]
    fn new_job_cancels_previous() {
        let (w, _) = worker(FramePacing::Realtime);
        let first  = w.start_job(clip(), options(TrimRange::new(0.0, 5.0))).unwrap();
        let second = w.start_job(clip(), options(TrimRange::new(0.0, 0.2))).unwrap();
        assert_ne!(first.id(), second.id());
        assert!(first.is_cancel_requested());
        assert_eq!(w.current_job(), Some(second.id()));

        assert!(matches!(first.wait(), JobOutcome::Cancelled));
        assert!(matches!(second.wait(), JobOutcome::Complete(_)));
    }

    #[test]
    fn bad_range_on_known_duration_is_rejected_without_spawning() {
        let (w, _) = worker(FramePacing::Realtime);
        let running = w.start_job(clip(), options(TrimRange::new(0.0, 5.0))).unwrap();

        let res = w.start_job(clip().with_duration(10.0), options(TrimRange::new(6.0, 2.0)));
        assert!(matches!(res, Err(PipelineError::InvalidRange { start, end, duration })
            if (start, end, duration) == (6.0, 2.0, 10.0)));
        assert!(!running.is_cancel_requested());
        assert_eq!(w.current_job(), Some(running.id()));

        running.cancel();
        assert!(matches!(running.wait(), JobOutcome::Cancelled));
    }
}
