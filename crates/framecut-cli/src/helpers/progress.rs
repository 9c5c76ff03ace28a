// crates/framecut-cli/src/helpers/progress.rs
//
// Terminal progress for one export, fed from the session's job events.
//
// The bar position is the job's percentage; the message is the same status
// line an editor front end would show under its progress bar.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use framecut_core::filters::FilterId;
use framecut_core::helpers::status::status_message;
use framecut_core::media_types::JobEvent;

const TEMPLATE: &str =
    "{spinner:.green} {prefix:.bold} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}% {msg}";

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

pub struct ExportProgress {
    bar:    ProgressBar,
    filter: FilterId,
}

impl ExportProgress {
    pub fn new(prefix: String, filter: FilterId, visible: bool) -> Self {
        let bar = if visible { ProgressBar::new(100) } else { ProgressBar::hidden() };
        bar.set_style(bar_style());
        bar.set_prefix(prefix);
        bar.set_message(status_message(0, filter));
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar, filter }
    }

    pub fn on_event(&self, event: &JobEvent) {
        if let JobEvent::Progress { percent, .. } = event {
            self.bar.set_position(*percent as u64);
            self.bar.set_message(status_message(*percent, self.filter));
        }
    }

    /// Leave the bar on screen with a final message.
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Remove the bar; the caller prints its own summary.
    pub fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}
