// crates/framecut-media/tests/export_scenarios.rs
//
// End-to-end export scenarios through EditorSession and MediaWorker on the
// in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use framecut_core::error::PipelineError;
use framecut_core::filters::FilterId;
use framecut_core::job::JobState;
use framecut_core::media_types::{Clip, ClipMetadata, JobEvent};
use framecut_core::settings::{Container, ExportSettings, FramePacing, PipelineConfig, Resolution};
use framecut_media::{EditorSession, MemoryBackend};

const WAIT: Duration = Duration::from_secs(20);

fn ten_second_clip() -> ClipMetadata {
    ClipMetadata { duration: 10.0, width: 32, height: 18 }
}

fn small_settings(format: Container) -> ExportSettings {
    ExportSettings {
        resolution: Resolution::new(16, 8),
        frame_rate: 30,
        format,
        quality:    80,
    }
}

fn session_with(backend: MemoryBackend, pacing: FramePacing) -> EditorSession {
    let config = PipelineConfig { pacing, ..Default::default() };
    EditorSession::new(Arc::new(backend), config)
}

fn progress_of(events: &[JobEvent]) -> Vec<u8> {
    events.iter().filter_map(|e| match e {
        JobEvent::Progress { percent, .. } => Some(*percent),
        _ => None,
    }).collect()
}

/// Drain events until a terminal one arrives.
fn collect(session: &mut EditorSession) -> Vec<JobEvent> {
    let mut all = Vec::new();
    let deadline = std::time::Instant::now() + WAIT;
    while std::time::Instant::now() < deadline {
        let batch = session.poll();
        let done = batch.iter().any(JobEvent::is_terminal);
        all.extend(batch);
        if done {
            return all;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    panic!("job did not finish within {WAIT:?}");
}

#[test]
fn sepia_trim_export_produces_four_seconds() {
    let backend = MemoryBackend::new(ten_second_clip());
    let mut s = session_with(backend.clone(), FramePacing::Unpaced);

    s.load_clip(Clip::new(vec![0u8; 64], "video/mp4")).unwrap();
    s.set_trim_range(2.0, 6.0).unwrap();
    s.set_filter(FilterId::Sepia);
    s.set_export_settings(small_settings(Container::Mp4)).unwrap();
    s.process_video().unwrap();

    let events = collect(&mut s);
    let p = progress_of(&events);
    assert_eq!(p.last(), Some(&100));
    assert!(p.windows(2).all(|w| w[0] <= w[1]), "{p:?}");
    assert_eq!(p.iter().filter(|&&v| v == 100).count(), 1);

    let out = s.output().expect("output stored");
    assert_eq!(out.mime_type, "video/mp4");
    assert!((out.duration.unwrap() - 4.0).abs() < 1e-6);
    assert_eq!(backend.log().samples, 120);
    assert_eq!(s.status().state, JobState::Complete);
}

#[test]
fn mp4_unavailable_falls_back_to_webm() {
    let backend = MemoryBackend::new(ten_second_clip()).supporting(&[Container::Webm]);
    let mut s = session_with(backend, FramePacing::Unpaced);
    s.load_clip(Clip::new(vec![1], "video/webm")).unwrap();
    s.set_trim_range(0.0, 1.0).unwrap();
    s.set_export_settings(small_settings(Container::Mp4)).unwrap();
    s.process_video().unwrap();

    assert_eq!(s.wait(WAIT), Some(JobState::Complete));
    assert_eq!(s.output().unwrap().mime_type, "video/webm");
    assert!(s.status().error.is_none());
}

#[test]
fn no_supported_container_fails() {
    let backend = MemoryBackend::new(ten_second_clip()).supporting(&[]);
    let mut s = session_with(backend, FramePacing::Unpaced);
    s.load_clip(Clip::new(vec![1], "video/mp4")).unwrap();
    s.set_trim_range(0.0, 1.0).unwrap();
    s.set_export_settings(small_settings(Container::Mp4)).unwrap();
    s.process_video().unwrap();

    let events = collect(&mut s);
    assert!(!progress_of(&events).contains(&100));
    assert_eq!(s.status().state, JobState::Failed);
    assert!(matches!(s.status().error, Some(PipelineError::UnsupportedFormat { .. })));
    assert!(s.output().is_none());
}

#[test]
fn cancel_during_recording() {
    let backend = MemoryBackend::new(ten_second_clip());
    let mut s = session_with(backend.clone(), FramePacing::Realtime);
    s.load_clip(Clip::new(vec![1], "video/mp4")).unwrap();
    s.set_trim_range(2.0, 6.0).unwrap();
    s.set_export_settings(small_settings(Container::Mp4)).unwrap();
    s.process_video().unwrap();

    // Wait for the frame loop to get going.
    let deadline = std::time::Instant::now() + WAIT;
    while s.status().progress < 30 {
        assert!(std::time::Instant::now() < deadline, "never reached the frame loop");
        s.poll();
        std::thread::sleep(Duration::from_millis(5));
    }
    s.cancel_processing();

    let events = collect(&mut s);
    assert!(matches!(events.last(), Some(JobEvent::Cancelled { .. })));
    assert!(!progress_of(&events).contains(&100));
    assert_eq!(s.status().state, JobState::Cancelled);
    assert!(s.status().progress < 100);
    assert!(s.output().is_none());

    let log = backend.log();
    assert!(log.aborted);
    assert!(log.samples < 120);
}

#[test]
fn invalid_trim_is_rejected_before_a_job_starts() {
    let mut s = session_with(MemoryBackend::new(ten_second_clip()), FramePacing::Unpaced);
    s.load_clip(Clip::new(vec![1], "video/mp4")).unwrap();
    assert!(matches!(s.set_trim_range(6.0, 2.0), Err(PipelineError::InvalidRange { .. })));
    assert!(matches!(s.set_trim_range(2.0, 10.5), Err(PipelineError::InvalidRange { .. })));
    assert!(s.status().job_id.is_none());
}

#[test]
fn restarting_supersedes_the_previous_job() {
    let backend = MemoryBackend::new(ten_second_clip());
    let mut s = session_with(backend, FramePacing::Realtime);
    s.load_clip(Clip::new(vec![1], "video/mp4")).unwrap();
    s.set_export_settings(small_settings(Container::Webm)).unwrap();

    s.set_trim_range(0.0, 8.0).unwrap();
    let first = s.process_video().unwrap();
    s.set_trim_range(0.0, 0.5).unwrap();
    let second = s.process_video().unwrap();
    assert_ne!(first, second);

    let events = collect(&mut s);
    assert!(events.iter().all(|e| e.job_id() == second));
    assert_eq!(s.status().state, JobState::Complete);
    assert_eq!(s.status().job_id, Some(second));
}
