// crates/framecut-core/src/helpers/status.rs
//
// Human-readable status lines for a running export, keyed on progress.

use crate::filters::FilterId;
use crate::helpers::time::format_clock;
use crate::settings::TrimRange;

/// Status line for `progress` percent.
///
/// ```
/// use framecut_core::filters::FilterId;
/// use framecut_core::helpers::status::status_message;
/// assert_eq!(status_message(25, FilterId::Sepia), "Applying sepia filter and video settings...");
/// assert_eq!(status_message(100, FilterId::None), "Processing complete!");
/// ```
pub fn status_message(progress: u8, filter: FilterId) -> String {
    match progress {
        0..=19  => "Initializing video processing...".into(),
        20..=39 if !filter.is_identity() => format!("Applying {filter} filter and video settings..."),
        20..=39 => "Applying video settings...".into(),
        40..=59 => "Processing frames...".into(),
        60..=79 => "Encoding video with selected settings...".into(),
        80..=99 => "Finalizing video...".into(),
        _       => "Processing complete!".into(),
    }
}

/// `"Trimming from 00:02 to 00:06"`, appended to status lines.
pub fn trim_info(trim: &TrimRange) -> String {
    format!("Trimming from {} to {}", format_clock(trim.start), format_clock(trim.end))
}
