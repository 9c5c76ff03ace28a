// crates/framecut-media/src/memory.rs
//
// In-memory backend: a generated frame source and a recording sink that never
// touch FFmpeg. Used by the orchestrator tests and by `framecut export
// --dry-run`.
//
// Everything the sink and source observe is appended to a shared `MemoryLog`
// so a caller can check seek timestamps, start attempts and sample counts
// after the job finishes.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use framecut_core::error::PipelineError;
use framecut_core::media_types::{Clip, ClipMetadata, Frame};
use framecut_core::settings::{Container, PipelineConfig};

use crate::backend::MediaBackend;
use crate::helpers::timeout::with_timeout;
use crate::sink::{CaptureSink, SinkConfig};
use crate::source::{clamp_timestamp, FrameSource};
use crate::surface::CaptureSample;

// ── Log ───────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct MemoryLog {
    /// Every seek target after clamping, in call order.
    pub seeks:          Vec<f64>,
    /// Every `start` call, including rejected ones.
    pub start_attempts: Vec<SinkConfig>,
    /// Config of the successful `start`, if any.
    pub started:        Option<SinkConfig>,
    pub samples:        u64,
    pub repeated:       u64,
    pub stopped:        bool,
    pub aborted:        bool,
}

type SharedLog = Arc<Mutex<MemoryLog>>;

// ── Backend ───────────────────────────────────────────────────────────────────

/// Builder-style in-memory backend.
///
/// ```
/// use framecut_core::media_types::ClipMetadata;
/// use framecut_core::settings::Container;
/// use framecut_media::memory::MemoryBackend;
///
/// let backend = MemoryBackend::new(ClipMetadata { duration: 10.0, width: 64, height: 36 })
///     .supporting(&[Container::Webm]);
/// assert!(backend.log().start_attempts.is_empty());
/// ```
#[derive(Clone)]
pub struct MemoryBackend {
    metadata:       ClipMetadata,
    supported:      Vec<Container>,
    reject_bitrate: bool,
    load_error:     Option<String>,
    load_stall:     Option<Duration>,
    seek_failures:  BTreeSet<usize>,
    log:            SharedLog,
}

impl MemoryBackend {
    pub fn new(metadata: ClipMetadata) -> Self {
        Self {
            metadata,
            supported:      Container::ALL.to_vec(),
            reject_bitrate: false,
            load_error:     None,
            load_stall:     None,
            seek_failures:  BTreeSet::new(),
            log:            SharedLog::default(),
        }
    }

    /// Restrict the containers the sink will accept.
    pub fn supporting(mut self, containers: &[Container]) -> Self {
        self.supported = containers.to_vec();
        self
    }

    /// Make `start` fail whenever a bitrate is requested.
    pub fn rejecting_bitrate(mut self) -> Self {
        self.reject_bitrate = true;
        self
    }

    /// Make `load_metadata` fail with `msg`.
    pub fn failing_load(mut self, msg: impl Into<String>) -> Self {
        self.load_error = Some(msg.into());
        self
    }

    /// Make `load_metadata` take `stall` to resolve. It still honours the
    /// configured metadata timeout, so a stall past it is a Load error.
    pub fn stalling_load(mut self, stall: Duration) -> Self {
        self.load_stall = Some(stall);
        self
    }

    /// Make the seeks with these zero-based call indices fail.
    pub fn failing_seeks(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.seek_failures.extend(indices);
        self
    }

    /// Snapshot of everything observed so far.
    pub fn log(&self) -> MemoryLog {
        self.log.lock().clone()
    }
}

impl MediaBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn open_source(
        &self,
        clip:   &Clip,
        config: &PipelineConfig,
    ) -> Result<Box<dyn FrameSource>, PipelineError> {
        if clip.is_empty() {
            return Err(PipelineError::Load("clip has no data".into()));
        }
        Ok(Box::new(SyntheticSource {
            metadata:      self.metadata,
            load_error:    self.load_error.clone(),
            load_stall:    self.load_stall,
            load_timeout:  config.metadata_timeout(),
            seek_failures: self.seek_failures.clone(),
            seek_calls:    0,
            current:       None,
            log:           Arc::clone(&self.log),
        }))
    }

    fn open_sink(&self) -> Box<dyn CaptureSink> {
        Box::new(MemorySink {
            supported:      self.supported.clone(),
            reject_bitrate: self.reject_bitrate,
            config:         None,
            bytes:          Vec::new(),
            samples:        0,
            log:            Arc::clone(&self.log),
        })
    }
}

// ── SyntheticSource ───────────────────────────────────────────────────────────

/// Generated frames: a red/green position gradient whose blue channel encodes
/// the timestamp, so every frame differs from its neighbours.
pub struct SyntheticSource {
    metadata:      ClipMetadata,
    load_error:    Option<String>,
    load_stall:    Option<Duration>,
    load_timeout:  Duration,
    seek_failures: BTreeSet<usize>,
    seek_calls:    usize,
    current:       Option<Frame>,
    log:           SharedLog,
}

impl SyntheticSource {
    /// Pixels the source produces for timestamp `t`.
    pub fn frame_at(metadata: &ClipMetadata, t: f64) -> Frame {
        let (w, h) = (metadata.width.max(1), metadata.height.max(1));
        let blue = ((t * 100.0) as u64 % 256) as u8;
        let (dx, dy) = ((w - 1).max(1), (h - 1).max(1));
        let mut data = Vec::with_capacity(w as usize * h as usize * 4);
        for y in 0..h {
            for x in 0..w {
                data.extend_from_slice(&[(x * 255 / dx) as u8, (y * 255 / dy) as u8, blue, 255]);
            }
        }
        Frame::new(w, h, t, data)
    }
}

impl FrameSource for SyntheticSource {
    fn load_metadata(&mut self) -> Result<ClipMetadata, PipelineError> {
        if let Some(msg) = &self.load_error {
            return Err(PipelineError::Load(msg.clone()));
        }
        match self.load_stall {
            Some(stall) => {
                let metadata = self.metadata;
                with_timeout("probe", self.load_timeout, move || {
                    std::thread::sleep(stall);
                    Ok(metadata)
                })
            }
            None => Ok(self.metadata),
        }
    }

    fn seek(&mut self, timestamp: f64) -> Result<(), PipelineError> {
        let call = self.seek_calls;
        self.seek_calls += 1;
        let t = clamp_timestamp(timestamp, self.metadata.duration);
        self.log.lock().seeks.push(t);

        if self.seek_failures.contains(&call) {
            return Err(PipelineError::Playback(format!("synthetic decode failure at {t:.3}s")));
        }
        self.current = Some(Self::frame_at(&self.metadata, t));
        Ok(())
    }

    fn current_frame(&self) -> Option<&Frame> {
        self.current.as_ref()
    }
}

// ── MemorySink ────────────────────────────────────────────────────────────────

/// Records samples into a compact byte log instead of encoding them.
///
/// Each sample contributes 12 bytes: its PTS (i64 LE) followed by a wrapping
/// byte-sum of its pixels (u32 LE).
pub struct MemorySink {
    supported:      Vec<Container>,
    reject_bitrate: bool,
    config:         Option<SinkConfig>,
    bytes:          Vec<u8>,
    samples:        u64,
    log:            SharedLog,
}

impl CaptureSink for MemorySink {
    fn supports(&self, container: Container) -> bool {
        self.supported.contains(&container)
    }

    fn start(&mut self, config: &SinkConfig) -> Result<(), PipelineError> {
        self.log.lock().start_attempts.push(*config);
        if !self.supports(config.container) {
            return Err(PipelineError::UnsupportedFormat {
                requested: config.container.to_string(),
                tried:     config.container.to_string(),
            });
        }
        if self.reject_bitrate && config.bitrate.is_some() {
            return Err(PipelineError::Encode("bitrate option rejected".into()));
        }
        self.config  = Some(*config);
        self.bytes   = Vec::new();
        self.samples = 0;
        self.log.lock().started = Some(*config);
        Ok(())
    }

    fn write(&mut self, sample: &CaptureSample) -> Result<(), PipelineError> {
        if self.config.is_none() {
            return Err(PipelineError::Encode("write before start".into()));
        }
        let sum = sample.data.iter().fold(0u32, |acc, &b| acc.wrapping_add(b as u32));
        self.bytes.extend_from_slice(&sample.pts.to_le_bytes());
        self.bytes.extend_from_slice(&sum.to_le_bytes());
        self.samples += 1;

        let mut log = self.log.lock();
        log.samples += 1;
        if sample.repeated {
            log.repeated += 1;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<Clip, PipelineError> {
        let config = self.config.take()
            .ok_or_else(|| PipelineError::Encode("stop before start".into()))?;
        let duration = self.samples as f64 / config.frame_rate.max(1) as f64;
        self.log.lock().stopped = true;
        Ok(Clip::new(std::mem::take(&mut self.bytes), config.container.mime_type())
            .with_duration(duration))
    }

    fn abort(&mut self) {
        self.config = None;
        self.bytes.clear();
        self.log.lock().aborted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn meta() -> ClipMetadata {
        ClipMetadata { duration: 10.0, width: 8, height: 4 }
    }

    fn sample(pts: i64) -> CaptureSample {
        CaptureSample {
            pts,
            frame_rate: 30,
            width:      1,
            height:     1,
            data:       Arc::new(vec![1, 2, 3, 255]),
            repeated:   false,
        }
    }

    #[test]
    fn stalled_load_past_the_timeout_is_a_load_error() {
        let backend = MemoryBackend::new(meta()).stalling_load(Duration::from_secs(3));
        let config = PipelineConfig { metadata_timeout_secs: 0.05, ..Default::default() };
        let mut src = backend.open_source(&Clip::new(vec![1], "video/mp4"), &config).unwrap();
        assert!(matches!(src.load_metadata(), Err(PipelineError::Load(_))));
    }

    #[test]
    fn short_stall_within_the_timeout_resolves() {
        let backend = MemoryBackend::new(meta()).stalling_load(Duration::from_millis(10));
        let mut src = backend
            .open_source(&Clip::new(vec![1], "video/mp4"), &PipelineConfig::default())
            .unwrap();
        assert_eq!(src.load_metadata().unwrap(), meta());
    }

    #[test]
    fn synthetic_frames_differ_over_time() {
        let a = SyntheticSource::frame_at(&meta(), 0.0);
        let b = SyntheticSource::frame_at(&meta(), 0.5);
        assert_eq!(a.data.len(), 8 * 4 * 4);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn seek_clamps_and_logs() {
        let backend = MemoryBackend::new(meta());
        let clip = Clip::new(vec![1], "video/mp4");
        let mut src = backend.open_source(&clip, &PipelineConfig::default()).unwrap();
        src.seek(42.0).unwrap();
        assert_eq!(src.current_frame().unwrap().timestamp, 10.0);
        assert_eq!(backend.log().seeks, vec![10.0]);
    }

    #[test]
    fn failed_seek_keeps_previous_frame() {
        let backend = MemoryBackend::new(meta()).failing_seeks([1]);
        let clip = Clip::new(vec![1], "video/mp4");
        let mut src = backend.open_source(&clip, &PipelineConfig::default()).unwrap();
        src.seek(1.0).unwrap();
        assert!(src.seek(2.0).is_err());
        assert_eq!(src.current_frame().unwrap().timestamp, 1.0);
    }

    #[test]
    fn empty_clip_is_a_load_error() {
        let backend = MemoryBackend::new(meta());
        let err = backend
            .open_source(&Clip::new(Vec::new(), "video/mp4"), &PipelineConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn sink_stop_without_samples_is_empty() {
        let backend = MemoryBackend::new(meta());
        let mut sink = backend.open_sink();
        let cfg = SinkConfig {
            container: Container::Webm, width: 8, height: 4, frame_rate: 30, bitrate: None,
        };
        sink.start(&cfg).unwrap();
        let clip = sink.stop().unwrap();
        assert!(clip.is_empty());
        assert_eq!(clip.duration, Some(0.0));
        assert_eq!(clip.mime_type, "video/webm");
    }

    #[test]
    fn sink_records_samples() {
        let backend = MemoryBackend::new(meta());
        let mut sink = backend.open_sink();
        let cfg = SinkConfig {
            container: Container::Mp4, width: 1, height: 1, frame_rate: 30, bitrate: Some(1),
        };
        sink.start(&cfg).unwrap();
        for pts in 0..3 {
            sink.write(&sample(pts)).unwrap();
        }
        let clip = sink.stop().unwrap();
        assert_eq!(clip.len(), 36);
        assert!((clip.duration.unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(backend.log().samples, 3);
    }

    #[test]
    fn sink_rejecting_bitrate() {
        let backend = MemoryBackend::new(meta()).rejecting_bitrate();
        let mut sink = backend.open_sink();
        let cfg = SinkConfig {
            container: Container::Mp4, width: 1, height: 1, frame_rate: 30, bitrate: Some(1),
        };
        assert!(matches!(sink.start(&cfg), Err(PipelineError::Encode(_))));
        assert!(sink.start(&SinkConfig { bitrate: None, ..cfg }).is_ok());
    }
}
