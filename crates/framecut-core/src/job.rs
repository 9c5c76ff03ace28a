// crates/framecut-core/src/job.rs
//
// Job lifecycle: the state machine one export walks through and the progress
// bands each state owns.
//
//   Idle → Initializing → Seeking → Recording → Finalizing → Complete
//            │               │          │            │
//            └──── Cancelled / Failed (absorbing) ───┘
//
// Progress bands (integer percent, never decreasing within one job):
//
//   Initializing  0 ..= 19
//   Seeking      20 ..= 24
//   Recording    25 ..= 94   proportional to frames done / total frames
//   Finalizing   95 ..= 99
//   Complete     100         only reachable through `ProgressTracker::complete`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::filters::FilterId;
use crate::settings::{ExportSettings, TrimRange};

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Idle,
    Initializing,
    Seeking,
    Recording,
    Finalizing,
    Complete,
    Cancelled,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Complete | JobState::Cancelled | JobState::Failed)
    }

    /// Whether `self → next` is an edge of the state machine.
    pub fn can_transition(self, next: JobState) -> bool {
        use JobState::*;
        if self.is_terminal() {
            return false;
        }
        match next {
            Cancelled    => true,
            Failed       => true,
            Initializing => self == Idle,
            Seeking      => self == Initializing,
            Recording    => self == Seeking,
            Finalizing   => self == Recording,
            Complete     => self == Finalizing,
            Idle         => false,
        }
    }

    /// Inclusive progress band owned by this state.
    pub fn progress_band(self) -> (u8, u8) {
        match self {
            JobState::Idle | JobState::Initializing => (0, 19),
            JobState::Seeking                       => (20, 24),
            JobState::Recording                     => (25, 94),
            JobState::Finalizing                    => (95, 99),
            JobState::Complete                      => (100, 100),
            // Terminal failure states freeze progress where it was.
            JobState::Cancelled | JobState::Failed  => (0, 99),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobState::Idle         => "idle",
            JobState::Initializing => "initializing",
            JobState::Seeking      => "seeking",
            JobState::Recording    => "recording",
            JobState::Finalizing   => "finalizing",
            JobState::Complete     => "complete",
            JobState::Cancelled    => "cancelled",
            JobState::Failed       => "failed",
        }
    }
}

// ── Options snapshot ──────────────────────────────────────────────────────────

/// Everything a job reads from the editor, captured once at process start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    pub filter:   FilterId,
    pub trim:     TrimRange,
    pub settings: ExportSettings,
}

/// Transient record of one export.
#[derive(Clone, Debug)]
pub struct ProcessingJob {
    pub id:       Uuid,
    pub options:  JobOptions,
    pub progress: u8,
    pub state:    JobState,
}

impl ProcessingJob {
    pub fn new(options: JobOptions) -> Self {
        Self { id: Uuid::new_v4(), options, progress: 0, state: JobState::Idle }
    }
}

// ── Progress ──────────────────────────────────────────────────────────────────

/// Monotonic progress reporter.
///
/// Every value is clamped into the current state's band and never below the
/// last value emitted, so callers see a non-decreasing sequence no matter how
/// the pipeline calls it. Repeated values are suppressed.
pub struct ProgressTracker<F: FnMut(u8)> {
    state: JobState,
    last:  Option<u8>,
    sink:  F,
}

impl<F: FnMut(u8)> ProgressTracker<F> {
    pub fn new(sink: F) -> Self {
        Self { state: JobState::Idle, last: None, sink }
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }

    /// Move to `state`; the next report is clamped into its band.
    pub fn enter(&mut self, state: JobState) {
        self.state = state;
    }

    /// Report `percent`, clamped into the current band.
    pub fn report(&mut self, percent: u8) {
        let (lo, hi) = self.state.progress_band();
        let floor = self.last.unwrap_or(0);
        let v = percent.clamp(lo, hi).max(floor);
        if self.last != Some(v) {
            self.last = Some(v);
            (self.sink)(v);
        }
    }

    /// Frame-loop progress: 25 + done/total × 70, kept below 95.
    pub fn frame(&mut self, done: u64, total: u64) {
        let frac = if total == 0 { 1.0 } else { (done as f64 / total as f64).min(1.0) };
        let pct  = 25.0 + frac * 70.0;
        self.report((pct.floor() as u8).min(94));
    }

    /// Emit the terminal 100. The only way to get there.
    pub fn complete(&mut self) {
        self.state = JobState::Complete;
        self.report(100);
    }
}
