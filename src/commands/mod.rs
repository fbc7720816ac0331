// src/commands/mod.rs
//! Command handlers for the depsolve CLI

mod solve;

pub use solve::{cmd_completions, cmd_solve};
