// crates/framecut-media/src/ffmpeg/encode.rs
//
// FfmpegSink: CaptureSink that records capture samples into an MP4 (H.264)
// or WebM (VP8, VP9 as a second choice) file, video only.
//
// Design:
//   • `start` opens the muxer on a temp file, builds the encoder, writes the
//     header. Rejected encoder options surface as PipelineError::Encode so the
//     caller can retry with defaults.
//   • `write` converts packed RGBA → YUV420P at the encoder size (dimensions
//     rounded down to even) and sends the frame with the sample's PTS.
//   • `stop` flushes the encoder, writes the trailer, reads the file back.
//   • `abort` drops everything; the temp directory goes with it.
//
// PTS strategy:
//   Samples arrive with a frame counter in 1/fps. Packets are rescaled from
//   that time base to whatever the muxer picked for the stream after
//   write_header.

use std::path::PathBuf;

use tempfile::TempDir;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::codec::{self, Id as CodecId};
use ffmpeg::encoder;
use ffmpeg::format::{output as open_output, Pixel};
use ffmpeg::software::scaling::{Context as ScaleCtx, Flags as ScaleFlags};
use ffmpeg::util::frame::video::Video as VideoFrame;
use ffmpeg::util::rational::Rational;
use ffmpeg::Packet;

use framecut_core::error::PipelineError;
use framecut_core::media_types::Clip;
use framecut_core::settings::Container;

use crate::helpers::rgba::{even, write_rgba};
use crate::sink::{CaptureSink, SinkConfig};
use crate::surface::CaptureSample;

/// Video codec for `container`, if this FFmpeg build has an encoder for it.
fn video_codec_id(container: Container) -> Option<CodecId> {
    let candidates: &[CodecId] = match container {
        Container::Mp4  => &[CodecId::H264],
        Container::Webm => &[CodecId::VP8, CodecId::VP9],
    };
    candidates.iter().copied().find(|&id| encoder::find(id).is_some())
}

fn enc_err(what: &str, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Encode(format!("{what}: {e}"))
}

// ── Recorder ──────────────────────────────────────────────────────────────────

/// One open recording.
struct Recorder {
    path:     PathBuf,
    config:   SinkConfig,
    octx:     ffmpeg::format::context::Output,
    encoder:  ffmpeg::encoder::video::Video,
    scaler:   ScaleCtx,
    rgba:     VideoFrame,
    frame_tb: Rational,
    ost_tb:   Rational,
    frames:   u64,
    /// Declared last so the file is closed before the directory goes.
    _dir:     TempDir,
}

impl Recorder {
    fn open(config: &SinkConfig) -> Result<Self, PipelineError> {
        let codec = video_codec_id(config.container)
            .and_then(encoder::find)
            .ok_or_else(|| PipelineError::UnsupportedFormat {
                requested: config.container.to_string(),
                tried:     config.container.to_string(),
            })?;

        let dir  = tempfile::tempdir().map_err(|e| enc_err("create temp dir", e))?;
        let path = dir.path().join(format!("recording.{}", config.container.extension()));

        let mut octx = open_output(&path)
            .map_err(|e| enc_err(&format!("open output '{}'", path.display()), e))?;

        let fps      = config.frame_rate.max(1) as i32;
        let frame_tb = Rational::new(1, fps);
        let (enc_w, enc_h) = (even(config.width), even(config.height));

        let mut ost = octx.add_stream(codec).map_err(|e| enc_err("add video stream", e))?;
        ost.set_time_base(frame_tb);

        let enc_ctx = codec::context::Context::new_with_codec(codec);
        let mut video_enc = enc_ctx.encoder().video()
            .map_err(|e| enc_err("create video encoder context", e))?;
        video_enc.set_width(enc_w);
        video_enc.set_height(enc_h);
        video_enc.set_format(Pixel::YUV420P);
        video_enc.set_time_base(frame_tb);
        video_enc.set_frame_rate(Some(Rational::new(fps, 1)));

        let mut opts = ffmpeg::Dictionary::new();
        match config.bitrate {
            Some(bps) => video_enc.set_bit_rate(bps as usize),
            None => {
                // Encoder defaults: constant quality instead of a bitrate target.
                video_enc.set_bit_rate(0);
                if config.container == Container::Mp4 {
                    opts.set("crf", "18");
                }
            }
        }
        if config.container == Container::Mp4 {
            opts.set("preset", "fast");
        }

        let mut video_encoder = video_enc.open_as_with(codec, opts)
            .map_err(|e| enc_err("open video encoder", e))?;

        // libavcodec resets sample_aspect_ratio during open.
        video_encoder.set_aspect_ratio(Rational::new(1, 1));

        // Encoder params → stream codecpar so the muxer knows size and format.
        unsafe {
            let ret = ffmpeg::ffi::avcodec_parameters_from_context(
                (**(*octx.as_mut_ptr()).streams.add(0)).codecpar,
                video_encoder.as_ptr() as *mut ffmpeg::ffi::AVCodecContext,
            );
            if ret < 0 {
                return Err(PipelineError::Encode(format!("avcodec_parameters_from_context failed: {ret}")));
            }
        }

        octx.write_header().map_err(|e| enc_err("write output header", e))?;
        let ost_tb = octx.stream(0)
            .map(|s| s.time_base())
            .ok_or_else(|| PipelineError::Encode("output stream vanished".into()))?;

        let scaler = ScaleCtx::get(
            Pixel::RGBA,    config.width, config.height,
            Pixel::YUV420P, enc_w,        enc_h,
            ScaleFlags::BILINEAR,
        ).map_err(|e| enc_err("create swscale context", e))?;

        tracing::debug!(
            "[sink] recording {} → {} ({enc_w}x{enc_h})",
            codec.name(), path.display(),
        );

        Ok(Self {
            path,
            config: *config,
            octx,
            encoder: video_encoder,
            scaler,
            rgba: VideoFrame::new(Pixel::RGBA, config.width, config.height),
            frame_tb,
            ost_tb,
            frames: 0,
            _dir: dir,
        })
    }

    fn write(&mut self, sample: &CaptureSample) -> Result<(), PipelineError> {
        if (sample.width, sample.height) != (self.config.width, self.config.height) {
            return Err(PipelineError::Encode(format!(
                "sample is {}x{}, recorder expects {}x{}",
                sample.width, sample.height, self.config.width, self.config.height,
            )));
        }
        write_rgba(&sample.data, &mut self.rgba, sample.width as usize, sample.height as usize);

        let mut yuv = VideoFrame::empty();
        self.scaler.run(&self.rgba, &mut yuv).map_err(|e| enc_err("scale video frame", e))?;
        yuv.set_pts(Some(sample.pts));

        self.encoder.send_frame(&yuv).map_err(|e| enc_err("send video frame to encoder", e))?;
        self.drain()?;
        self.frames += 1;
        Ok(())
    }

    fn drain(&mut self) -> Result<(), PipelineError> {
        let mut pkt = Packet::empty();
        while self.encoder.receive_packet(&mut pkt).is_ok() {
            pkt.set_stream(0);
            pkt.rescale_ts(self.frame_tb, self.ost_tb);
            pkt.write_interleaved(&mut self.octx).map_err(|e| enc_err("write video packet", e))?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Clip, PipelineError> {
        self.encoder.send_eof().map_err(|e| enc_err("send EOF to video encoder", e))?;
        self.drain()?;
        self.octx.write_trailer().map_err(|e| enc_err("write trailer", e))?;

        let bytes = std::fs::read(&self.path)
            .map_err(|e| enc_err(&format!("read back {}", self.path.display()), e))?;
        let duration = self.frames as f64 / self.config.frame_rate.max(1) as f64;
        tracing::info!(
            "[sink] finalized {} frames, {:.3}s, {} bytes",
            self.frames, duration, bytes.len(),
        );
        Ok(Clip::new(bytes, self.config.container.mime_type()).with_duration(duration))
    }
}

// ── FfmpegSink ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FfmpegSink {
    recorder: Option<Recorder>,
}

impl FfmpegSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureSink for FfmpegSink {
    fn supports(&self, container: Container) -> bool {
        video_codec_id(container).is_some()
    }

    fn start(&mut self, config: &SinkConfig) -> Result<(), PipelineError> {
        self.recorder = None;
        self.recorder = Some(Recorder::open(config)?);
        Ok(())
    }

    fn write(&mut self, sample: &CaptureSample) -> Result<(), PipelineError> {
        self.recorder.as_mut()
            .ok_or_else(|| PipelineError::Encode("write before start".into()))?
            .write(sample)
    }

    fn stop(&mut self) -> Result<Clip, PipelineError> {
        let rec = self.recorder.take()
            .ok_or_else(|| PipelineError::Encode("stop before start".into()))?;
        if rec.frames == 0 {
            tracing::warn!("[sink] stopped before any sample — empty output");
            return Ok(Clip::new(Vec::new(), rec.config.container.mime_type()).with_duration(0.0));
        }
        rec.finish()
    }

    fn abort(&mut self) {
        if self.recorder.take().is_some() {
            tracing::debug!("[sink] recording aborted, partial output discarded");
        }
    }
}
