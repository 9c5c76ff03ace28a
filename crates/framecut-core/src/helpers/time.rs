// crates/framecut-core/src/helpers/time.rs
//
// Shared time-formatting utilities for status lines and the CLI.

/// Format seconds as `MM:SS`, the trim-range display format.
///
/// Non-finite input (a duration that never resolved) renders as `00:00`.
///
/// ```
/// use framecut_core::helpers::time::format_clock;
/// assert_eq!(format_clock(0.0),   "00:00");
/// assert_eq!(format_clock(61.9),  "01:01");
/// assert_eq!(format_clock(f64::NAN), "00:00");
/// ```
pub fn format_clock(s: f64) -> String {
    if !s.is_finite() || s < 0.0 {
        return "00:00".into();
    }
    let m  = (s / 60.0) as u64;
    let sc = (s % 60.0) as u64;
    format!("{m:02}:{sc:02}")
}

/// Format a duration in seconds as a compact human-readable string.
///
/// | Range         | Format       | Example   |
/// |---------------|--------------|-----------|
/// | ≥ 3600 s      | `H:MM:SS`    | `1:04:35` |
/// | ≥ 60 s        | `M:SS`       | `3:07`    |
/// | < 60 s        | `S.Xs`       | `4.2s`    |
///
/// ```
/// use framecut_core::helpers::time::format_duration;
/// assert_eq!(format_duration(4.2),    "4.2s");
/// assert_eq!(format_duration(187.0),  "3:07");
/// assert_eq!(format_duration(3875.0), "1:04:35");
/// ```
pub fn format_duration(secs: f64) -> String {
    if secs >= 3600.0 {
        format!(
            "{}:{:02}:{:02}",
            secs as u64 / 3600,
            (secs as u64 % 3600) / 60,
            secs as u64 % 60,
        )
    } else if secs >= 60.0 {
        format!("{}:{:02}", secs as u64 / 60, secs as u64 % 60)
    } else {
        format!("{secs:.1}s")
    }
}
