// crates/framecut-media/src/helpers/timeout.rs
//
// Bounded wait on a blocking call. The call runs on its own thread and the
// caller waits on a crossbeam channel; when the deadline passes first the
// thread is left to finish on its own and its result is dropped.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};

use framecut_core::error::PipelineError;

/// Run `f` on a helper thread named `framecut-{what}` and wait up to
/// `timeout` for it. Every failure, including the timeout, is a Load error.
pub fn with_timeout<T, F>(what: &str, timeout: Duration, f: F) -> Result<T, PipelineError>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    let (tx, rx) = bounded(1);
    thread::Builder::new()
        .name(format!("framecut-{what}"))
        .spawn(move || {
            let _ = tx.send(f());
        })
        .map_err(|e| PipelineError::Load(format!("spawn {what} thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e))    => Err(PipelineError::Load(format!("{e:#}"))),
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!("[{what}] no result after {:.1}s, giving up", timeout.as_secs_f64());
            Err(PipelineError::Load(format!(
                "metadata did not resolve within {:.1}s", timeout.as_secs_f64()
            )))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(PipelineError::Load(format!("{what} thread exited without a result")))
        }
    }
}
