// crates/framecut-core/src/helpers/mod.rs
//
// Small formatting helpers shared by the media crate and the CLI.

pub mod status;
pub mod time;
