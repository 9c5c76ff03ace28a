// crates/framecut-cli/src/commands/export.rs
//
// `framecut export`: load → trim → filter → settings → process, driving the
// progress bar from the session's job events until the job ends.
//
// Settings precedence: defaults < --settings JSON < individual flags.
//
// --dry-run probes the real input for its metadata, then runs the whole
// pipeline on the in-memory backend: every state, seek and progress step
// happens, nothing is decoded or encoded and no file is written.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use console::style;

use framecut_core::helpers::status::trim_info;
use framecut_core::helpers::time::format_duration;
use framecut_core::job::JobState;
use framecut_core::media_types::Clip;
use framecut_core::settings::{ExportSettings, FramePacing, PipelineConfig, METADATA_TIMEOUT_SECS};
use framecut_media::ffmpeg::probe::probe_with_timeout;
use framecut_media::{EditorSession, FfmpegBackend, MediaBackend, MemoryBackend};

use crate::cli::ExportArgs;
use crate::helpers::format::{fit_label, human_bytes};
use crate::helpers::progress::ExportProgress;
use super::Outcome;

const POLL_INTERVAL: Duration = Duration::from_millis(40);
const PREFIX_CHARS:  usize    = 24;

// ── Settings ──────────────────────────────────────────────────────────────────

fn load_settings(path: Option<&Path>) -> Result<ExportSettings> {
    let Some(path) = path else {
        return Ok(ExportSettings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read settings {}", path.display()))?;
    ExportSettings::from_json(&text)
        .with_context(|| format!("parse settings {}", path.display()))
}

/// Flags given on the command line replace the matching settings fields.
fn apply_overrides(mut settings: ExportSettings, args: &ExportArgs) -> ExportSettings {
    if let Some(r) = args.resolution { settings.resolution = r; }
    if let Some(f) = args.fps        { settings.frame_rate = f; }
    if let Some(c) = args.format     { settings.format     = c; }
    if let Some(q) = args.quality    { settings.quality    = q; }
    settings
}

fn pipeline_config(args: &ExportArgs) -> PipelineConfig {
    PipelineConfig {
        metadata_timeout_secs: args.metadata_timeout.unwrap_or(METADATA_TIMEOUT_SECS),
        pacing: if args.realtime { FramePacing::Realtime } else { FramePacing::Unpaced },
    }
}

/// `<dir>/<stem>_framecut.<ext>` next to the input.
fn default_output_path(input: &Path, extension: &str) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("clip");
    input.with_file_name(format!("{stem}_framecut.{extension}"))
}

// ── Command ───────────────────────────────────────────────────────────────────

pub fn run(args: ExportArgs, quiet: bool) -> Result<Outcome> {
    let settings = apply_overrides(load_settings(args.settings.as_deref())?, &args);
    let config   = pipeline_config(&args);
    let clip     = Clip::from_path(&args.input)?;

    let ffmpeg = FfmpegBackend::new()?;
    let dry_run_backend = if args.dry_run {
        let meta = probe_with_timeout(args.input.clone(), config.metadata_timeout())?;
        Some(MemoryBackend::new(meta))
    } else {
        None
    };
    let backend: Arc<dyn MediaBackend> = match &dry_run_backend {
        Some(mem) => Arc::new(mem.clone()),
        None      => Arc::new(ffmpeg),
    };

    let mut session = EditorSession::new(backend, config);
    let meta = session.load_clip(clip)?;
    session.set_trim_range(args.start.unwrap_or(0.0), args.end.unwrap_or(meta.duration))?;
    session.set_filter(args.filter);
    session.set_export_settings(settings)?;

    let name = args.input.file_name().and_then(|n| n.to_str()).unwrap_or("input");
    if !quiet && !args.json {
        println!(
            "{} {} → {} {} @ {} fps, quality {}{}",
            style("Exporting").cyan().bold(),
            name,
            session.settings().format,
            session.settings().resolution.label(),
            session.settings().frame_rate,
            session.settings().quality,
            if args.dry_run { " (dry run)" } else { "" },
        );
        println!("  {}", style(trim_info(&session.trim())).dim());
    }

    let progress = ExportProgress::new(
        fit_label(name, PREFIX_CHARS),
        session.filter(),
        !quiet && !args.json,
    );
    let started = Instant::now();
    let limit   = args.time_limit.and_then(|s| Duration::try_from_secs_f64(s).ok());
    let mut cancel_sent = false;

    session.process_video()?;
    let state = loop {
        if let Some(limit) = limit {
            if !cancel_sent && started.elapsed() >= limit {
                tracing::warn!("[export] time limit of {limit:?} reached, cancelling");
                session.cancel_processing();
                cancel_sent = true;
            }
        }
        for ev in session.poll() {
            progress.on_event(&ev);
        }
        let state = session.status().state;
        if state.is_terminal() {
            break state;
        }
        std::thread::sleep(POLL_INTERVAL);
    };
    let elapsed = started.elapsed().as_secs_f64();

    match state {
        JobState::Complete => {
            progress.finish("Processing complete!");
            let out = session.output()
                .context("job completed without an output clip")?;
            let requested = session.settings().format;

            if let Some(mem) = &dry_run_backend {
                let log = mem.log();
                report(&args, quiet, serde_json::json!({
                    "status":      "complete",
                    "dryRun":      true,
                    "frames":      log.samples,
                    "repeated":    log.repeated,
                    "duration":    out.duration,
                    "elapsedSecs": elapsed,
                }), || format!(
                    "{} {} frames ({} repeated), {} of output in {:.1}s",
                    style("Dry run complete:").green().bold(),
                    log.samples, log.repeated,
                    format_duration(out.duration.unwrap_or(0.0)),
                    elapsed,
                ));
                return Ok(Outcome::Success);
            }

            let dest = args.output.clone()
                .unwrap_or_else(|| default_output_path(&args.input, out.extension()));
            if out.extension() != requested.extension() {
                tracing::warn!("[export] {requested} unavailable, recorded {} instead", out.mime_type);
            }
            std::fs::write(&dest, out.data.as_slice())
                .with_context(|| format!("write {}", dest.display()))?;

            report(&args, quiet, serde_json::json!({
                "status":      "complete",
                "output":      dest.display().to_string(),
                "mimeType":    out.mime_type,
                "duration":    out.duration,
                "bytes":       out.len(),
                "elapsedSecs": elapsed,
            }), || format!(
                "{} {} ({}, {}, {})",
                style("Saved").green().bold(),
                dest.display(),
                out.mime_type,
                format_duration(out.duration.unwrap_or(0.0)),
                human_bytes(out.len()),
            ));
            Ok(Outcome::Success)
        }
        JobState::Cancelled => {
            progress.abandon();
            let at = session.status().progress;
            report(&args, quiet, serde_json::json!({
                "status":   "cancelled",
                "progress": at,
            }), || format!("{} at {at}%", style("Export cancelled").yellow().bold()));
            Ok(Outcome::Cancelled)
        }
        _ => {
            progress.abandon();
            let status = session.status();
            match &status.error {
                Some(e) if args.json => println!("{}", serde_json::json!({
                    "status": "failed",
                    "error":  { "kind": e.kind(), "message": e.user_message(), "detail": e.to_string() },
                })),
                Some(e) => {
                    eprintln!("{} {}", style("Error:").red().bold(), e.user_message());
                    tracing::debug!("[export] {e}");
                }
                None => eprintln!("{} export failed", style("Error:").red().bold()),
            }
            Ok(Outcome::Failed)
        }
    }
}

/// JSON object on stdout with `--json`, otherwise one styled line unless quiet.
fn report(args: &ExportArgs, quiet: bool, json: serde_json::Value, line: impl FnOnce() -> String) {
    if args.json {
        println!("{json}");
    } else if !quiet {
        println!("{}", line());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    use framecut_core::settings::{Container, Resolution};

    use crate::cli::{Cli, Command};

    fn export_args(extra: &[&str]) -> ExportArgs {
        let argv = ["framecut", "export", "in.mp4"].into_iter().chain(extra.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Export(a) => a,
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn flags_override_only_what_they_name() {
        let base = ExportSettings { quality: 30, ..Default::default() };
        let s = apply_overrides(base, &export_args(&["--fps", "60", "--format", "webm"]));
        assert_eq!(s.frame_rate, 60);
        assert_eq!(s.format, Container::Webm);
        assert_eq!(s.quality, 30);
        assert_eq!(s.resolution, Resolution::new(1280, 720));
    }

    #[test]
    fn settings_file_is_read_then_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"resolution":"640x360","frameRate":24,"format":"webm","quality":55}"#,
        ).unwrap();

        let file = load_settings(Some(&path)).unwrap();
        assert_eq!(file.resolution, Resolution::new(640, 360));
        assert_eq!(file.frame_rate, 24);

        let s = apply_overrides(file, &export_args(&["--quality", "90"]));
        assert_eq!(s.quality, 90);
        assert_eq!(s.format, Container::Webm);
    }

    #[test]
    fn missing_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(Some(&dir.path().join("nope.json"))).is_err());
        assert_eq!(load_settings(None).unwrap(), ExportSettings::default());
    }

    #[test]
    fn config_follows_pacing_and_timeout_flags() {
        let c = pipeline_config(&export_args(&["--realtime", "--metadata-timeout", "2.5"]));
        assert_eq!(c.pacing, FramePacing::Realtime);
        assert_eq!(c.metadata_timeout_secs, 2.5);

        let c = pipeline_config(&export_args(&[]));
        assert_eq!(c, PipelineConfig::default());
    }

    #[test]
    fn default_output_sits_next_to_the_input() {
        let p = default_output_path(Path::new("/videos/holiday.mov"), "webm");
        assert_eq!(p, PathBuf::from("/videos/holiday_framecut.webm"));
    }
}
