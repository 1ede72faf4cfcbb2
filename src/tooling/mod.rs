//! Developer-facing tooling.

pub mod cli;
