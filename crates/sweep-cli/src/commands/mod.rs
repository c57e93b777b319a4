//! CLI command implementations for the sweep batch runner.

pub mod check;
pub mod policies;
pub mod run;
