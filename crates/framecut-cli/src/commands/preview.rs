// crates/framecut-cli/src/commands/preview.rs

use anyhow::Result;
use console::style;

use framecut_core::media_types::Clip;
use framecut_core::settings::PipelineConfig;
use framecut_media::preview::{self, PLACEHOLDER_SIZE};
use framecut_media::FfmpegBackend;

use crate::cli::PreviewArgs;
use super::Outcome;

pub fn run(args: PreviewArgs) -> Result<Outcome> {
    let backend = FfmpegBackend::new()?;
    let config  = PipelineConfig::default();

    let frame = match Clip::from_path(&args.input) {
        Ok(clip) if args.placeholder => preview::preview_or_placeholder(
            &backend, &config, &clip, args.at, args.filter, args.resolution,
        ),
        Ok(clip) => match preview::render_preview(
            &backend, &config, &clip, args.at, args.filter, args.resolution,
        ) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("[preview] {e}");
                eprintln!("{} {}", style("Error:").red().bold(), e.user_message());
                return Ok(Outcome::Failed);
            }
        },
        Err(e) if args.placeholder => {
            tracing::warn!("[preview] {e} — writing placeholder");
            preview::placeholder(args.resolution.unwrap_or(PLACEHOLDER_SIZE))
        }
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            return Ok(Outcome::Failed);
        }
    };

    preview::write_png(&frame, &args.output)?;
    println!(
        "{} {} ({}x{} @ {:.3}s, filter {})",
        style("Preview saved").green().bold(),
        args.output.display(),
        frame.width, frame.height, frame.timestamp, args.filter,
    );
    Ok(Outcome::Success)
}
