// crates/framecut-cli/src/helpers/format.rs
//
// Terminal string utilities that don't belong in framecut-core.
//
// Clock and duration formatting lives in framecut_core::helpers::time. This
// module only holds what is about fitting text into a terminal line.

/// Byte count as `"512 B"`, `"1.5 KiB"`, `"3.2 MiB"`, `"1.0 GiB"`.
pub fn human_bytes(n: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{n} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Clip `text` to at most `max_chars` characters, ending in "…" when
/// shortened. Used for file names in the progress bar prefix.
pub fn fit_label(text: &str, max_chars: usize) -> String {
    const ELLIPSIS: &str = "…";
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    // One slot goes to the ellipsis itself.
    let keep = max_chars - 1;
    text.chars().take(keep).collect::<String>() + ELLIPSIS
}
