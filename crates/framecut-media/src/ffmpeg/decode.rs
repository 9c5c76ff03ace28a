// crates/framecut-media/src/ffmpeg/decode.rs
//
// FfmpegFrameSource: FrameSource over a clip decoded with libavcodec.
//
// The clip's bytes are written to a temp file once (libavformat wants a path)
// and a stateful LiveDecoder walks it forward. A seek reuses the open decoder
// when the target is ahead of it by less than REOPEN_JUMP_SECS; anything
// backward or further ahead re-opens the file and seeks to the keyframe
// before the target.
//
// "The frame at t" is the last frame whose PTS is ≤ t. The decoder keeps one
// frame of lookahead to know when to stop.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tempfile::NamedTempFile;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::{input, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;
use ffmpeg::Packet;

use framecut_core::error::PipelineError;
use framecut_core::media_types::{Clip, ClipMetadata, Frame};
use framecut_core::settings::PipelineConfig;

use crate::ffmpeg::probe::probe_with_timeout;
use crate::helpers::rgba::extract_rgba;
use crate::helpers::seek::seek_to_secs;
use crate::source::{clamp_timestamp, FrameSource};

/// Forward jumps longer than this re-open instead of decoding through.
const REOPEN_JUMP_SECS: f64 = 2.0;

/// Slack when comparing frame PTS against a seek target.
const PTS_EPSILON: f64 = 1e-6;

// ── LiveDecoder ───────────────────────────────────────────────────────────────

/// Stateful sequential decoder for one file, producing native-size RGBA.
pub struct LiveDecoder {
    ictx:      ffmpeg::format::context::Input,
    decoder:   ffmpeg::decoder::video::Video,
    scaler:    SwsContext,
    video_idx: usize,
    tb_num:    i32,
    tb_den:    i32,
    last_pts:  i64,
    out_w:     u32,
    out_h:     u32,
    eof:       bool,
    current:   Option<Frame>,
    ahead:     Option<Frame>,
}

impl LiveDecoder {
    /// Open `path` positioned at the keyframe before `timestamp`.
    pub fn open(path: &Path, timestamp: f64) -> Result<Self> {
        let mut ictx = input(path).with_context(|| format!("open {}", path.display()))?;
        let video_idx = ictx.streams().best(Type::Video)
            .ok_or_else(|| anyhow!("no video stream"))?
            .index();

        let (tb_num, tb_den) = {
            let stream = ictx.stream(video_idx).ok_or_else(|| anyhow!("stream gone"))?;
            let tb = stream.time_base();
            (tb.numerator(), tb.denominator())
        };

        seek_to_secs(&mut ictx, timestamp, "decode");

        // Second context for decoder params (avoids borrow conflict with ictx).
        let ictx2   = input(path)?;
        let stream2 = ictx2.stream(video_idx).ok_or_else(|| anyhow!("stream gone"))?;
        let dec_ctx = ffmpeg::codec::context::Context::from_parameters(stream2.parameters())?;
        let decoder = dec_ctx.decoder().video()?;

        let (out_w, out_h) = (decoder.width().max(1), decoder.height().max(1));
        let scaler = SwsContext::get(
            decoder.format(), decoder.width(), decoder.height(),
            Pixel::RGBA, out_w, out_h, Flags::BILINEAR,
        )?;

        Ok(Self {
            ictx, decoder, scaler, video_idx, tb_num, tb_den,
            last_pts: 0, out_w, out_h, eof: false, current: None, ahead: None,
        })
    }

    pub fn pts_to_secs(&self, pts: i64) -> f64 {
        pts as f64 * self.tb_num as f64 / self.tb_den.max(1) as f64
    }

    /// Timestamp of the frame currently held, if any.
    pub fn position(&self) -> Option<f64> {
        self.current.as_ref().map(|f| f.timestamp)
    }

    pub fn current(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    /// Advance until the held frame is the last one with PTS ≤ `t`.
    ///
    /// If the stream starts after `t`, the first frame is taken. At EOF the
    /// final frame stays current. Returns `false` if no frame was ever decoded.
    pub fn advance_to(&mut self, t: f64) -> bool {
        loop {
            if self.ahead.is_none() {
                self.ahead = self.next_frame();
            }
            match self.ahead.take() {
                Some(next) if next.timestamp <= t + PTS_EPSILON || self.current.is_none() => {
                    self.current = Some(next);
                }
                Some(next) => {
                    self.ahead = Some(next);
                    break;
                }
                None => break,
            }
        }
        self.current.is_some()
    }

    /// Decode the next frame sequentially. `None` at end of stream.
    fn next_frame(&mut self) -> Option<Frame> {
        let mut decoded = VideoFrame::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.pts().unwrap_or(self.last_pts + 1);
                self.last_pts = pts;
                let ts = self.pts_to_secs(pts);

                let mut out = VideoFrame::empty();
                if let Err(e) = self.scaler.run(&decoded, &mut out) {
                    tracing::warn!("[decode] scale failed at {ts:.3}s: {e}");
                    continue;
                }
                let data = extract_rgba(&out, self.out_w as usize, self.out_h as usize);
                return Some(Frame::new(self.out_w, self.out_h, ts, data));
            }
            if self.eof {
                return None;
            }
            match self.read_video_packet() {
                Some(packet) => {
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        tracing::debug!("[decode] send_packet: {e}");
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.eof = true;
                }
            }
        }
    }

    fn read_video_packet(&mut self) -> Option<Packet> {
        for (stream, packet) in self.ictx.packets().flatten() {
            if stream.index() == self.video_idx {
                return Some(packet);
            }
        }
        None
    }
}

// ── FfmpegFrameSource ─────────────────────────────────────────────────────────

pub struct FfmpegFrameSource {
    file:     NamedTempFile,
    timeout:  Duration,
    metadata: Option<ClipMetadata>,
    live:     Option<LiveDecoder>,
}

impl FfmpegFrameSource {
    /// Spill `clip` to a temp file with a matching extension.
    pub fn new(clip: &Clip, config: &PipelineConfig) -> Result<Self, PipelineError> {
        if clip.is_empty() {
            return Err(PipelineError::Load("clip has no data".into()));
        }
        let file = spill(clip).map_err(|e| PipelineError::Load(format!("{e:#}")))?;
        Ok(Self {
            file,
            timeout:  config.metadata_timeout(),
            metadata: None,
            live:     None,
        })
    }

    fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }
}

fn spill(clip: &Clip) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("framecut-src-")
        .suffix(&format!(".{}", clip.extension()))
        .tempfile()
        .context("create temp file")?;
    file.write_all(&clip.data).context("write clip to temp file")?;
    file.flush()?;
    Ok(file)
}

impl FrameSource for FfmpegFrameSource {
    fn load_metadata(&mut self) -> Result<ClipMetadata, PipelineError> {
        if let Some(meta) = self.metadata {
            return Ok(meta);
        }
        let meta = probe_with_timeout(self.path(), self.timeout)?;
        self.metadata = Some(meta);
        Ok(meta)
    }

    fn seek(&mut self, timestamp: f64) -> Result<(), PipelineError> {
        let meta = self.metadata
            .ok_or_else(|| PipelineError::Playback("seek before metadata".into()))?;
        let t = clamp_timestamp(timestamp, meta.duration);

        let reuse = self.live.as_ref()
            .and_then(LiveDecoder::position)
            .is_some_and(|pos| t >= pos && t - pos <= REOPEN_JUMP_SECS);

        if reuse {
            if let Some(live) = self.live.as_mut() {
                live.advance_to(t);
                return Ok(());
            }
        }

        // Keep the old decoder (and its current frame) unless the new one
        // actually lands on a frame.
        let mut fresh = LiveDecoder::open(&self.path(), t)
            .map_err(|e| PipelineError::Playback(format!("{e:#}")))?;
        if fresh.advance_to(t) {
            self.live = Some(fresh);
            Ok(())
        } else {
            Err(PipelineError::Playback(format!("no frame decoded at {t:.3}s")))
        }
    }

    fn current_frame(&self) -> Option<&Frame> {
        self.live.as_ref().and_then(LiveDecoder::current)
    }
}
