// crates/framecut-core/src/settings.rs
//
// Export configuration: plain values, no runtime handles.
//
// ExportSettings is replaced wholesale on every change (never patched field by
// field from another thread), so a job takes a cheap clone as its snapshot and
// later edits cannot leak into a running export.
//
// The JSON shape uses camelCase keys so a settings file looks like:
//   { "resolution": "1280x720", "frameRate": 30, "format": "mp4", "quality": 80 }

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, SettingsError};

/// Bits per second at quality 100. Quality maps linearly onto [0, MAX_BITRATE].
pub const MAX_BITRATE: u64 = 8_000_000;

/// Default metadata probe timeout before a load is declared stalled.
pub const METADATA_TIMEOUT_SECS: f64 = 10.0;

// ── Container ─────────────────────────────────────────────────────────────────

/// Output container tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Webm,
}

impl Container {
    pub const ALL: [Container; 2] = [Container::Mp4, Container::Webm];

    pub fn mime_type(self) -> &'static str {
        match self {
            Container::Mp4  => "video/mp4",
            Container::Webm => "video/webm",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Container::Mp4  => "mp4",
            Container::Webm => "webm",
        }
    }

    /// The container to try when this one is unavailable on the host.
    ///
    /// WebM is the widely-supported target; a WebM request falls back to MP4
    /// so that the negotiation is symmetric.
    pub fn fallback(self) -> Container {
        match self {
            Container::Mp4  => Container::Webm,
            Container::Webm => Container::Mp4,
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Container {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4"  => Ok(Container::Mp4),
            "webm" => Ok(Container::Webm),
            _      => Err(SettingsError::Container(s.to_string())),
        }
    }
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Output frame size, written and parsed as `WIDTHxHEIGHT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width:  u32,
    pub height: u32,
}

impl Resolution {
    /// Presets offered by the export panel. Free-form `WxH` values are also
    /// accepted as long as they parse.
    pub const PRESETS: [(Resolution, &'static str); 4] = [
        (Resolution { width: 640,  height: 360  }, "360p"),
        (Resolution { width: 854,  height: 480  }, "480p"),
        (Resolution { width: 1280, height: 720  }, "720p"),
        (Resolution { width: 1920, height: 1080 }, "1080p"),
    ];

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bytes in one RGBA frame at this size.
    pub fn rgba_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Preset label (`"720p"`) or the raw `WxH` string for custom sizes.
    pub fn label(self) -> String {
        Self::PRESETS.iter()
            .find(|(r, _)| *r == self)
            .map(|(_, l)| l.to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SettingsError::MalformedResolution(s.to_string());
        let (w, h) = s.trim().split_once(|c: char| c == 'x' || c == 'X').ok_or_else(malformed)?;
        let width:  u32 = w.trim().parse().map_err(|_| malformed())?;
        let height: u32 = h.trim().parse().map_err(|_| malformed())?;
        if width == 0 || height == 0 {
            return Err(SettingsError::ZeroResolution { width, height });
        }
        Ok(Resolution { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = SettingsError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<Resolution> for String {
    fn from(r: Resolution) -> String { r.to_string() }
}

// ── ExportSettings ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    pub resolution: Resolution,
    pub frame_rate: u32,
    pub format:     Container,
    /// 1–100; maps linearly to bitrate.
    pub quality:    u8,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::new(1280, 720),
            frame_rate: 30,
            format:     Container::Mp4,
            quality:    80,
        }
    }
}

impl ExportSettings {
    /// Frame rates offered by the export panel; any positive integer is valid.
    pub const FRAME_RATES: [u32; 3] = [24, 30, 60];

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.frame_rate == 0 {
            return Err(SettingsError::FrameRate(self.frame_rate));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(SettingsError::Quality(self.quality));
        }
        Ok(())
    }

    /// `quality% × 8 Mbps`, floored to whole bits per second.
    ///
    /// ```
    /// use framecut_core::settings::ExportSettings;
    /// let s = ExportSettings { quality: 80, ..Default::default() };
    /// assert_eq!(s.bitrate(), 6_400_000);
    /// ```
    pub fn bitrate(&self) -> u64 {
        self.quality as u64 * MAX_BITRATE / 100
    }

    /// Nominal spacing between sampled frames, in seconds.
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.frame_rate.max(1) as f64
    }

    /// Read settings from a JSON file.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ── TrimRange ─────────────────────────────────────────────────────────────────

/// `[start, end]` window in seconds to keep in the output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end:   f64,
}

impl TrimRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// The whole clip, what a freshly loaded clip's trim is reset to.
    pub fn full(duration: f64) -> Self {
        Self { start: 0.0, end: duration }
    }

    pub fn len(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }

    /// Check `0 ≤ start < end ≤ duration`.
    pub fn validate(&self, duration: f64) -> Result<(), PipelineError> {
        let ok = self.start.is_finite()
            && self.end.is_finite()
            && self.start >= 0.0
            && self.start < self.end
            && self.end <= duration;
        if ok {
            Ok(())
        } else {
            Err(PipelineError::InvalidRange {
                start: self.start,
                end:   self.end,
                duration,
            })
        }
    }

    /// Number of frames sampled at `fps` across this range.
    ///
    /// Frames sit at `start + i / fps` for every `i` whose timestamp falls
    /// strictly before `end` (with a 1 ns tolerance so that 4.0 s at 30 fps
    /// is exactly 120 frames rather than 121 from float noise).
    pub fn frame_count(&self, fps: u32) -> u64 {
        let exact = self.len() * fps as f64;
        (exact - 1e-9).ceil().max(0.0) as u64
    }
}

// ── PipelineConfig ────────────────────────────────────────────────────────────

/// How the frame loop spaces its iterations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FramePacing {
    /// Sleep out the remainder of every frame interval, the live capture model.
    Realtime,
    /// Yield between frames but never sleep. Offline export default.
    #[default]
    Unpaced,
}

/// Runtime knobs that are not part of the exported file's shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub metadata_timeout_secs: f64,
    pub pacing:                FramePacing,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            metadata_timeout_secs: METADATA_TIMEOUT_SECS,
            pacing:                FramePacing::Unpaced,
        }
    }
}

impl PipelineConfig {
    /// Negative, NaN or infinite values (e.g. from a hand-edited settings
    /// file) fall back to METADATA_TIMEOUT_SECS.
    pub fn metadata_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.metadata_timeout_secs)
            .unwrap_or_else(|_| {
                tracing::warn!(
                    "[settings] metadata timeout {} is not a usable duration, using {METADATA_TIMEOUT_SECS}s",
                    self.metadata_timeout_secs,
                );
                Duration::from_secs_f64(METADATA_TIMEOUT_SECS)
            })
    }
}
