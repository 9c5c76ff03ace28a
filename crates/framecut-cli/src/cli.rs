// crates/framecut-cli/src/cli.rs
//
// Command-line surface. Flags given on the command line override the matching
// fields of a `--settings` JSON file, which in turn overrides the defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use framecut_core::filters::FilterId;
use framecut_core::settings::{Container, Resolution};

#[derive(Parser, Debug)]
#[command(name = "framecut", version, about = "Trim, filter and re-encode a single video clip")]
pub struct Cli {
    /// Debug-level logging (RUST_LOG still wins when set).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// No progress bar, errors only.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export a trimmed, filtered copy of a clip.
    Export(ExportArgs),
    /// Render one filtered frame to a PNG.
    Preview(PreviewArgs),
    /// Print a clip's duration and dimensions.
    Probe(ProbeArgs),
    /// List the available filters.
    Filters,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Input video file.
    pub input: PathBuf,

    /// Output file. Defaults to `<input>_framecut.<ext>` next to the input,
    /// with the extension of the container actually recorded.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON export settings, e.g. {"resolution":"1280x720","frameRate":30,"format":"mp4","quality":80}
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Output size as WIDTHxHEIGHT.
    #[arg(short, long)]
    pub resolution: Option<Resolution>,

    /// Output frames per second.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Output container: mp4 or webm.
    #[arg(short, long)]
    pub format: Option<Container>,

    /// 1-100, mapped linearly onto 0-8 Mbps.
    #[arg(long)]
    pub quality: Option<u8>,

    #[arg(long, value_parser = parse_filter, default_value = "none")]
    pub filter: FilterId,

    /// Trim start in seconds.
    #[arg(long)]
    pub start: Option<f64>,

    /// Trim end in seconds. Defaults to the clip's duration.
    #[arg(long)]
    pub end: Option<f64>,

    /// Pace the frame loop at the output frame rate.
    #[arg(long)]
    pub realtime: bool,

    /// Seconds to wait for metadata before giving up on the input.
    #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
    pub metadata_timeout: Option<f64>,

    /// Cancel the export after this many seconds.
    #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
    pub time_limit: Option<f64>,

    /// Run the pipeline against a generated clip of the input's length
    /// without decoding or encoding anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the result as one JSON object on stdout.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Input video file.
    pub input: PathBuf,

    /// PNG to write.
    #[arg(short, long, default_value = "preview.png")]
    pub output: PathBuf,

    /// Timestamp in seconds.
    #[arg(long, default_value_t = 0.0)]
    pub at: f64,

    #[arg(long, value_parser = parse_filter, default_value = "none")]
    pub filter: FilterId,

    /// Scale the frame to WIDTHxHEIGHT instead of the clip's own size.
    #[arg(short, long)]
    pub resolution: Option<Resolution>,

    /// Write a placeholder frame instead of failing when the clip can't load.
    #[arg(long)]
    pub placeholder: bool,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input video file.
    pub input: PathBuf,

    #[arg(long)]
    pub json: bool,
}

/// Strict filter tag parser: the library degrades unknown tags to identity,
/// the command line rejects them.
fn parse_filter(s: &str) -> Result<FilterId, String> {
    FilterId::lookup(s).ok_or_else(|| {
        let known: Vec<&str> = FilterId::ALL.iter().map(|f| f.as_str()).collect();
        format!("unknown filter {s:?} (expected one of: {})", known.join(", "))
    })
}

/// A finite, non-negative number of seconds.
fn parse_seconds(s: &str) -> Result<f64, String> {
    let secs: f64 = s.trim().parse().map_err(|_| format!("{s:?} is not a number of seconds"))?;
    if secs.is_finite() && secs >= 0.0 {
        Ok(secs)
    } else {
        Err(format!("{s:?} must be a finite, non-negative number of seconds"))
    }
}
