// crates/framecut-media/src/pipeline.rs
//
// The orchestrator: one blocking function that walks a job through
//
//   Idle → Initializing → Seeking → Recording → Finalizing → Complete
//
// driving FrameSource → RenderSurface → CaptureSink in lockstep across the
// trim range at the export frame rate. Meant to run on its own thread; the
// MediaWorker spawns one per job.
//
// Events:
//   Every state change is sent as JobEvent::State, every progress change as
//   JobEvent::Progress, and exactly one terminal event (Done / Failed /
//   Cancelled) ends the stream. Progress goes through ProgressTracker, so it
//   is monotonic, clamped per band, and 100 only ever comes from Complete.
//
// Ordering guarantees:
//   • When the clip already carries its duration, a bad trim range is
//     rejected before any state is entered: the only event is Failed.
//   • Otherwise the trim range is checked against the resolved duration
//     before the first progress value; a bad range fails with no progress.
//   • Cancel is polled at every phase boundary and every frame boundary.
//     A cancelled job aborts the sink and never reports 100.
//   • A seek that fails mid-loop is logged and the surface keeps the last
//     good frame, which the capture stream then repeats.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use uuid::Uuid;

use framecut_core::error::PipelineError;
use framecut_core::helpers::status::trim_info;
use framecut_core::job::{JobOptions, JobState, ProgressTracker};
use framecut_core::media_types::{Clip, JobEvent};
use framecut_core::settings::{FramePacing, PipelineConfig};

use crate::backend::MediaBackend;
use crate::sink::{start_negotiated, CaptureSink, SinkConfig};
use crate::source::FrameSource;
use crate::surface::RenderSurface;

/// How a job ended. Mirrors the terminal `JobEvent` that was emitted.
#[derive(Debug)]
pub enum JobOutcome {
    Complete(Clip),
    Cancelled,
    Failed(PipelineError),
}

impl JobOutcome {
    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Complete(_) => JobState::Complete,
            JobOutcome::Cancelled   => JobState::Cancelled,
            JobOutcome::Failed(_)   => JobState::Failed,
        }
    }
}

/// Internal short-circuit: everything that stops the happy path.
enum Stop {
    Cancelled,
    Failed(PipelineError),
}

impl From<PipelineError> for Stop {
    fn from(e: PipelineError) -> Self {
        Stop::Failed(e)
    }
}

pub struct Pipeline<'a> {
    backend: &'a dyn MediaBackend,
    config:  &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(backend: &'a dyn MediaBackend, config: &'a PipelineConfig) -> Self {
        Self { backend, config }
    }

    /// Run one job to completion. Blocking.
    ///
    /// `emit` receives every event, including the terminal one; the returned
    /// outcome repeats it for callers that only want the result.
    pub fn run(
        &self,
        job_id:  Uuid,
        clip:    &Clip,
        options: &JobOptions,
        cancel:  &AtomicBool,
        emit:    &dyn Fn(JobEvent),
    ) -> JobOutcome {
        if let Some(duration) = clip.duration {
            if let Err(e) = options.trim.validate(duration) {
                tracing::error!("[pipeline] job {job_id} rejected: {e}");
                emit(JobEvent::Failed { job_id, error: e.clone() });
                return JobOutcome::Failed(e);
            }
        }

        let mut run = Run {
            job_id,
            state:   JobState::Idle,
            emit,
            tracker: ProgressTracker::new(Box::new(move |percent: u8| {
                emit(JobEvent::Progress { job_id, percent })
            }) as Box<dyn FnMut(u8) + '_>),
            cancel,
            sink:    None,
        };

        tracing::info!(
            "[pipeline] job {job_id} start via {} — filter {}, {}, {}x{} @ {} fps {}",
            self.backend.name(),
            options.filter,
            trim_info(&options.trim),
            options.settings.resolution.width,
            options.settings.resolution.height,
            options.settings.frame_rate,
            options.settings.format,
        );

        let result = self.drive(&mut run, clip, options);
        let outcome = match result {
            Ok(clip) => {
                run.tracker.complete();
                run.transition(JobState::Complete);
                tracing::info!("[pipeline] job {job_id} complete — {} bytes", clip.len());
                JobOutcome::Complete(clip)
            }
            Err(Stop::Cancelled) => {
                run.abort_sink();
                run.transition(JobState::Cancelled);
                tracing::info!("[pipeline] job {job_id} cancelled");
                JobOutcome::Cancelled
            }
            Err(Stop::Failed(e)) => {
                run.abort_sink();
                run.transition(JobState::Failed);
                tracing::error!("[pipeline] job {job_id} failed: {e}");
                JobOutcome::Failed(e)
            }
        };

        emit(match &outcome {
            JobOutcome::Complete(clip) => JobEvent::Done { job_id, clip: clip.clone() },
            JobOutcome::Cancelled      => JobEvent::Cancelled { job_id },
            JobOutcome::Failed(e)      => JobEvent::Failed { job_id, error: e.clone() },
        });
        outcome
    }

    fn drive(&self, run: &mut Run<'_>, clip: &Clip, options: &JobOptions) -> Result<Clip, Stop> {
        let settings = &options.settings;
        let trim     = options.trim;

        // ── Initializing ──────────────────────────────────────────────────────
        run.transition(JobState::Initializing);
        run.check_cancel()?;

        settings.validate()
            .map_err(|e| PipelineError::Encode(format!("invalid export settings: {e}")))?;

        let mut source = self.backend.open_source(clip, self.config)?;
        let metadata = source.load_metadata()?;
        trim.validate(metadata.duration)?;
        run.check_cancel()?;

        run.progress(0);
        tracing::debug!(
            "[pipeline] metadata {:.3}s {}x{}",
            metadata.duration, metadata.width, metadata.height,
        );
        run.progress(5);

        let mut surface = RenderSurface::new(settings.resolution);
        run.progress(10);

        run.sink = Some(self.backend.open_sink());
        run.progress(15);
        run.check_cancel()?;

        // ── Seeking ───────────────────────────────────────────────────────────
        run.transition(JobState::Seeking);
        run.progress(20);
        source.seek(trim.start)?;
        run.render_current(source.as_ref(), &mut surface, options);
        run.check_cancel()?;

        // ── Recording ─────────────────────────────────────────────────────────
        run.transition(JobState::Recording);
        let sink_config = {
            let sink = run.sink_mut()?;
            start_negotiated(sink, SinkConfig::from_settings(settings))?
        };
        tracing::info!(
            "[pipeline] recording {} {}x{} @ {} fps, bitrate {:?}",
            sink_config.container, sink_config.width, sink_config.height,
            sink_config.frame_rate, sink_config.bitrate,
        );
        run.progress(25);

        let fps      = settings.frame_rate;
        let total    = trim.frame_count(fps);
        let interval = settings.frame_interval();
        let mut capture = surface.capture_stream(fps);

        for i in 0..total {
            run.check_cancel()?;
            let tick = Instant::now();

            // Frame 0 was rendered by the initial seek.
            if i > 0 {
                let t = trim.start + i as f64 / fps as f64;
                match source.seek(t) {
                    Ok(())  => run.render_current(source.as_ref(), &mut surface, options),
                    Err(e)  => tracing::warn!("[pipeline] frame {i} at {t:.3}s: {e} — reusing last frame"),
                }
            }

            let sample = capture.sample(&surface);
            run.sink_mut()?.write(&sample)?;
            run.tracker.frame(i + 1, total);

            match self.config.pacing {
                FramePacing::Realtime => {
                    let remaining = interval - tick.elapsed().as_secs_f64();
                    if remaining > 0.0 {
                        thread::sleep(std::time::Duration::from_secs_f64(remaining));
                    }
                }
                FramePacing::Unpaced => thread::yield_now(),
            }
        }
        if capture.repeated() > 0 {
            tracing::warn!(
                "[pipeline] {} of {} frames repeated the previous frame",
                capture.repeated(), total,
            );
        }
        run.check_cancel()?;

        // ── Finalizing ────────────────────────────────────────────────────────
        run.transition(JobState::Finalizing);
        run.progress(95);
        let mut sink = run.sink.take()
            .ok_or_else(|| PipelineError::Encode("sink missing at finalize".into()))?;
        let output = sink.stop()?;
        run.progress(98);

        let duration = output.duration.unwrap_or(total as f64 / fps as f64);
        tracing::debug!(
            "[pipeline] {} frames, {:.3}s of {} output",
            total, duration, sink_config.container,
        );
        Ok(output.with_duration(duration))
    }
}

/// Mutable per-job state threaded through `drive`.
struct Run<'e> {
    job_id:  Uuid,
    state:   JobState,
    emit:    &'e dyn Fn(JobEvent),
    tracker: ProgressTracker<Box<dyn FnMut(u8) + 'e>>,
    cancel:  &'e AtomicBool,
    sink:    Option<Box<dyn CaptureSink>>,
}

impl Run<'_> {
    fn transition(&mut self, next: JobState) {
        if !self.state.can_transition(next) {
            tracing::warn!("[pipeline] ignoring illegal transition {:?} → {:?}", self.state, next);
            return;
        }
        tracing::debug!("[pipeline] {} → {}", self.state.label(), next.label());
        self.state = next;
        if !next.is_terminal() {
            self.tracker.enter(next);
        }
        (self.emit)(JobEvent::State { job_id: self.job_id, state: next });
    }

    fn progress(&mut self, percent: u8) {
        self.tracker.report(percent);
    }

    fn check_cancel(&self) -> Result<(), Stop> {
        if self.cancel.load(Ordering::Relaxed) {
            Err(Stop::Cancelled)
        } else {
            Ok(())
        }
    }

    fn sink_mut(&mut self) -> Result<&mut (dyn CaptureSink + 'static), PipelineError> {
        self.sink.as_deref_mut()
            .ok_or_else(|| PipelineError::Encode("sink not open".into()))
    }

    fn render_current(&self, source: &dyn FrameSource, surface: &mut RenderSurface, options: &JobOptions) {
        match source.current_frame() {
            Some(frame) => surface.render_frame(frame, options.filter),
            None        => tracing::warn!("[pipeline] source has no decoded frame — keeping surface"),
        }
    }

    fn abort_sink(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    use framecut_core::filters::FilterId;
    use framecut_core::media_types::ClipMetadata;
    use framecut_core::settings::{Container, ExportSettings, Resolution, TrimRange};

    use crate::memory::MemoryBackend;

    fn backend() -> MemoryBackend {
        MemoryBackend::new(ClipMetadata { duration: 10.0, width: 16, height: 8 })
    }

    fn options(trim: TrimRange) -> JobOptions {
        JobOptions {
            filter:   FilterId::Sepia,
            trim,
            settings: ExportSettings {
                resolution: Resolution::new(8, 4),
                ..Default::default()
            },
        }
    }

    fn clip() -> Clip {
        Clip::new(vec![0u8; 16], "video/mp4")
    }

    fn run(backend: &MemoryBackend, opts: &JobOptions) -> (JobOutcome, Vec<JobEvent>) {
        run_clip(backend, &clip(), opts)
    }

    fn run_clip(backend: &MemoryBackend, clip: &Clip, opts: &JobOptions) -> (JobOutcome, Vec<JobEvent>) {
        let config = PipelineConfig::default();
        let events = Mutex::new(Vec::new());
        let cancel = AtomicBool::new(false);
        let outcome = Pipeline::new(backend, &config)
            .run(Uuid::new_v4(), clip, opts, &cancel, &|ev| events.lock().push(ev));
        (outcome, events.into_inner())
    }

    fn progress(events: &[JobEvent]) -> Vec<u8> {
        events.iter().filter_map(|e| match e {
            JobEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        }).collect()
    }

    fn states(events: &[JobEvent]) -> Vec<JobState> {
        events.iter().filter_map(|e| match e {
            JobEvent::State { state, .. } => Some(*state),
            _ => None,
        }).collect()
    }

    #[test]
    fn trim_two_to_six_records_120_frames() {
        let b = backend();
        let (outcome, events) = run(&b, &options(TrimRange::new(2.0, 6.0)));

        let JobOutcome::Complete(out) = outcome else { panic!("expected Complete") };
        assert!((out.duration.unwrap() - 4.0).abs() < 1e-9);

        let log = b.log();
        assert_eq!(log.samples, 120);
        // One initial seek plus one per subsequent frame.
        assert_eq!(log.seeks.len(), 120);
        assert_eq!(log.seeks[0], 2.0);
        assert!((log.seeks[119] - (2.0 + 119.0 / 30.0)).abs() < 1e-9);
        assert!(log.stopped && !log.aborted);

        let p = progress(&events);
        assert_eq!(p.first(), Some(&0));
        assert_eq!(p.last(), Some(&100));
        assert!(p.windows(2).all(|w| w[0] < w[1]), "{p:?}");
        assert!(p.contains(&98));
        assert!(matches!(events.last(), Some(JobEvent::Done { .. })));
    }

    #[test]
    fn state_sequence_on_success() {
        let (_, events) = run(&backend(), &options(TrimRange::new(0.0, 0.5)));
        use JobState::*;
        assert_eq!(states(&events), vec![Initializing, Seeking, Recording, Finalizing, Complete]);
    }

    #[test]
    fn invalid_range_fails_before_any_progress() {
        for trim in [TrimRange::new(6.0, 2.0), TrimRange::new(2.0, 11.0), TrimRange::new(3.0, 3.0)] {
            let b = backend();
            let (outcome, events) = run(&b, &options(trim));
            assert!(matches!(outcome, JobOutcome::Failed(PipelineError::InvalidRange { .. })));
            assert!(progress(&events).is_empty(), "{trim:?}");
            assert!(b.log().start_attempts.is_empty());
        }
    }

    #[test]
    fn known_duration_rejects_bad_range_before_any_state() {
        let b = backend();
        let (outcome, events) = run_clip(&b, &clip().with_duration(10.0), &options(TrimRange::new(6.0, 2.0)));
        assert!(matches!(outcome, JobOutcome::Failed(PipelineError::InvalidRange { .. })));
        assert!(states(&events).is_empty());
        assert!(progress(&events).is_empty());
        assert!(matches!(events.as_slice(), [JobEvent::Failed { error: PipelineError::InvalidRange { .. }, .. }]));
        assert!(b.log().start_attempts.is_empty());
    }

    #[test]
    fn falls_back_to_webm() {
        let b = backend().supporting(&[Container::Webm]);
        let (outcome, _) = run(&b, &options(TrimRange::new(0.0, 1.0)));
        let JobOutcome::Complete(out) = outcome else { panic!("expected Complete") };
        assert_eq!(out.mime_type, "video/webm");
    }

    #[test]
    fn no_container_is_unsupported_format() {
        let b = backend().supporting(&[]);
        let (outcome, events) = run(&b, &options(TrimRange::new(0.0, 1.0)));
        assert!(matches!(outcome, JobOutcome::Failed(PipelineError::UnsupportedFormat { .. })));
        assert!(!progress(&events).contains(&100));
        assert!(matches!(events.last(), Some(JobEvent::Failed { .. })));
    }

    #[test]
    fn rejected_bitrate_retries_with_defaults() {
        let b = backend().rejecting_bitrate();
        let (outcome, _) = run(&b, &options(TrimRange::new(0.0, 1.0)));
        assert!(matches!(outcome, JobOutcome::Complete(_)));
        let log = b.log();
        assert_eq!(log.start_attempts.len(), 2);
        assert_eq!(log.started.map(|c| c.bitrate), Some(None));
    }

    #[test]
    fn load_failure_is_reported() {
        let b = backend().failing_load("truncated header");
        let (outcome, events) = run(&b, &options(TrimRange::new(0.0, 1.0)));
        assert!(matches!(outcome, JobOutcome::Failed(PipelineError::Load(_))));
        assert!(progress(&events).is_empty());
    }

    #[test]
    fn mid_loop_seek_failure_repeats_last_frame() {
        let b = backend().failing_seeks([3, 4]);
        let (outcome, _) = run(&b, &options(TrimRange::new(0.0, 1.0)));
        assert!(matches!(outcome, JobOutcome::Complete(_)));
        let log = b.log();
        assert_eq!(log.samples, 30);
        assert_eq!(log.repeated, 2);
    }

    #[test]
    fn cancel_mid_loop_stops_without_100() {
        let b = backend();
        let config = PipelineConfig::default();
        let cancel = AtomicBool::new(false);
        let seen = Mutex::new(Vec::new());
        let outcome = Pipeline::new(&b, &config).run(
            Uuid::new_v4(),
            &clip(),
            &options(TrimRange::new(2.0, 6.0)),
            &cancel,
            &|ev| {
                if let JobEvent::Progress { percent, .. } = ev {
                    if percent >= 40 {
                        cancel.store(true, Ordering::Relaxed);
                    }
                    seen.lock().push(percent);
                }
            },
        );
        assert!(matches!(outcome, JobOutcome::Cancelled));
        let seen = seen.into_inner();
        assert!(!seen.contains(&100));
        assert_eq!(seen.last(), Some(&40));
        let log = b.log();
        assert!(log.aborted && !log.stopped);
        // 40% ≈ frame 26 of 120; cancel lands on the next frame boundary.
        assert!(log.samples < 40, "samples {}", log.samples);
    }

    #[test]
    fn cancel_before_start_emits_no_progress() {
        let b = backend();
        let config = PipelineConfig::default();
        let cancel = AtomicBool::new(true);
        let events = Mutex::new(Vec::new());
        let outcome = Pipeline::new(&b, &config).run(
            Uuid::new_v4(), &clip(), &options(TrimRange::new(0.0, 1.0)), &cancel,
            &|ev| events.lock().push(ev),
        );
        assert!(matches!(outcome, JobOutcome::Cancelled));
        let events = events.into_inner();
        assert!(progress(&events).is_empty());
        assert_eq!(states(&events), vec![JobState::Initializing, JobState::Cancelled]);
    }
}
