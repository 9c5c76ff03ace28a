// crates/framecut-cli/src/commands/probe.rs

use anyhow::Result;
use console::style;

use framecut_core::helpers::time::format_duration;
use framecut_core::media_types::mime_from_path;
use framecut_core::settings::PipelineConfig;
use framecut_media::ffmpeg::probe::probe_with_timeout;
use framecut_media::FfmpegBackend;

use crate::cli::ProbeArgs;
use super::Outcome;

pub fn run(args: ProbeArgs) -> Result<Outcome> {
    FfmpegBackend::new()?;
    let timeout = PipelineConfig::default().metadata_timeout();

    let meta = match probe_with_timeout(args.input.clone(), timeout) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::debug!("[probe] {e}");
            if args.json {
                println!("{}", serde_json::json!({
                    "status": "failed",
                    "error":  { "kind": e.kind(), "message": e.user_message(), "detail": e.to_string() },
                }));
            } else {
                eprintln!("{} {}", style("Error:").red().bold(), e.user_message());
            }
            return Ok(Outcome::Failed);
        }
    };

    if args.json {
        println!("{}", serde_json::json!({
            "path":     args.input.display().to_string(),
            "mimeType": mime_from_path(&args.input),
            "duration": meta.duration,
            "width":    meta.width,
            "height":   meta.height,
        }));
    } else {
        println!("{}", style(args.input.display()).bold());
        println!("  duration  {} ({:.3}s)", format_duration(meta.duration), meta.duration);
        println!("  size      {}x{}", meta.width, meta.height);
        println!("  type      {}", mime_from_path(&args.input));
    }
    Ok(Outcome::Success)
}
