// crates/framecut-cli/src/commands/mod.rs
//
// One module per sub-command. Each returns an `Outcome` for the exit code;
// an `Err` is an unexpected failure outside the job itself (bad input path,
// unreadable settings file, FFmpeg init) and exits 1 as well.

pub mod export;
pub mod filters;
pub mod preview;
pub mod probe;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
    Cancelled,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success   => 0,
            Outcome::Failed    => 1,
            Outcome::Cancelled => 130,
        }
    }
}
