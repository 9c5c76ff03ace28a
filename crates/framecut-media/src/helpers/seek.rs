// crates/framecut-media/src/helpers/seek.rs
//
// Seek helper wrapping avformat seek with soft-fail behaviour.
//
// `avformat_seek_file` fails on some containers that do not support random
// access, and on a freshly-opened context when asked for max_ts = 0. All
// seeks route through here; the caller decides whether a failure is fatal.

use ffmpeg_the_third as ffmpeg;

/// Seek `ictx` to the keyframe at or before `target_secs`.
///
/// Returns `true` if the seek succeeded or was skipped because the target is
/// the start of the file. Returns `false` on failure; the demuxer then decodes
/// from wherever it is and the caller's timestamp filter skips pre-roll.
///
/// A backward seek (`..=seek_ts`) is used because a forward one lands on the
/// next keyframe, which may be seconds past the target and would leave the
/// frames in between undecodable.
pub fn seek_to_secs(
    ictx:        &mut ffmpeg::format::context::Input,
    target_secs: f64,
    label:       &str,
) -> bool {
    if target_secs <= 0.0 {
        return true;
    }

    let seek_ts = (target_secs * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
    match ictx.seek(seek_ts, ..=seek_ts) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                "[seek] soft-fail in {label} at {target_secs:.3}s: {e} — decoding from current position"
            );
            false
        }
    }
}
